//! Human-readable match reports

use std::fmt::{self, Write};

use venturematch_core::{CollectionKind, EntityRecord, RecordSchema};

use crate::rank::{RankedMatch, RankingResult, Strategy};

const THIN_RULE: &str = "-------------------------------------------------------------";
const THICK_RULE: &str = "================================================================";
const SCORE_CAPTION: &str = "Similarity";
const MISSING: &str = "N/A";

fn collection_noun(kind: CollectionKind) -> &'static str {
    match kind {
        CollectionKind::Jobs => "the job board",
        CollectionKind::Portfolio => "the portfolio",
    }
}

/// Render a ranking result as text
pub fn format_report(result: &RankingResult<'_>) -> String {
    result.to_string()
}

impl fmt::Display for RankingResult<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.strategy {
            Strategy::BestMatch => write_best(f, self),
            Strategy::Aggregate => write_aggregate(f, self),
        }
    }
}

fn write_best<W: Write>(out: &mut W, result: &RankingResult<'_>) -> fmt::Result {
    let reference = collection_noun(result.reference_schema.kind);
    writeln!(out, "\nTop Matches:\n")?;
    writeln!(out, "{THIN_RULE}")?;
    if result.is_empty() {
        writeln!(out, "No matches.")?;
        writeln!(out, "{THIN_RULE}")?;
        return Ok(());
    }

    for entry in &result.entries {
        writeln!(out, "Entry from {}: {}", collection_noun(result.query_schema.kind), entry.record.label(result.query_schema))?;
        writeln!(out, "Top Match from {reference}:")?;
        if let Some(m) = entry.matches.first() {
            write_fields(out, m.record, result.reference_schema, "    ", "    ")?;
        }
        writeln!(out, "Similarity Value: {:.4}", entry.score)?;
        writeln!(out, "{THIN_RULE}")?;
    }
    Ok(())
}

fn write_aggregate<W: Write>(out: &mut W, result: &RankingResult<'_>) -> fmt::Result {
    let reference = collection_noun(result.reference_schema.kind);
    writeln!(out, "Top Matches Aggregate:\n")?;
    writeln!(out, "{THICK_RULE}")?;
    if result.is_empty() {
        writeln!(out, "No matches.")?;
        writeln!(out, "{THIN_RULE}")?;
        return Ok(());
    }

    for entry in &result.entries {
        writeln!(out, "\nPotential match: {}", entry.record.label(result.query_schema))?;
        writeln!(out, "Aggregate Similarity: {:.4}", entry.score)?;
        writeln!(out, "Similar to the following entries in {reference}:")?;
        for m in &entry.matches {
            write_contributor(out, m, result.reference_schema)?;
        }
        writeln!(out, "{THIN_RULE}")?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_contributor<W: Write>(out: &mut W, m: &RankedMatch<'_>, schema: &RecordSchema) -> fmt::Result {
    let width = caption_width(schema);
    write_fields(out, m.record, schema, "    - ", "      ")?;
    writeln!(out, "      {:<width$}: {:.4}\n", SCORE_CAPTION, m.score)
}

/// Display fields aligned on the colon; `first` prefixes the first line,
/// `rest` the others.
fn write_fields<W: Write>(
    out: &mut W,
    record: &EntityRecord,
    schema: &RecordSchema,
    first: &str,
    rest: &str,
) -> fmt::Result {
    let width = caption_width(schema);
    for (i, (caption, field)) in schema.display_fields.iter().enumerate() {
        let prefix = if i == 0 { first } else { rest };
        let value = record.field(field).map(str::trim).unwrap_or(MISSING);
        writeln!(out, "{prefix}{caption:<width$}: {value}")?;
    }
    Ok(())
}

fn caption_width(schema: &RecordSchema) -> usize {
    schema
        .display_fields
        .iter()
        .map(|(caption, _)| caption.len())
        .chain(std::iter::once(SCORE_CAPTION.len()))
        .max()
        .unwrap_or(0)
}
