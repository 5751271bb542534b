//! Record schemas
//!
//! Each collection kind has a fixed schema naming which raw fields are
//! required, how they are composed into the composite text fed to the
//! embedding model, and which fields identify a record in reports.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The two entity collections the matcher knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    /// Job postings scraped from a forum thread (the query side)
    Jobs,
    /// Venture portfolio companies (the reference side)
    Portfolio,
}

impl CollectionKind {
    #[inline]
    pub fn schema(self) -> &'static RecordSchema {
        match self {
            CollectionKind::Jobs => &JOB_SCHEMA,
            CollectionKind::Portfolio => &PORTFOLIO_SCHEMA,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CollectionKind::Jobs => "jobs",
            CollectionKind::Portfolio => "portfolio",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jobs" | "job" | "hn" => Ok(CollectionKind::Jobs),
            "portfolio" | "companies" => Ok(CollectionKind::Portfolio),
            other => Err(format!("unknown collection kind: {other}")),
        }
    }
}

/// One labelled part of the composite text.
///
/// Field values inside a segment are joined with a single space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub label: &'static str,
    pub fields: &'static [&'static str],
}

/// Declarative description of a collection's record shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSchema {
    pub kind: CollectionKind,
    /// Composite-text segments, in output order
    pub segments: &'static [Segment],
    /// Field whose leading `|`-delimited part names the record in reports
    pub label_field: &'static str,
    /// (caption, field) pairs rendered when the record is a match
    pub display_fields: &'static [(&'static str, &'static str)],
}

pub static JOB_SCHEMA: RecordSchema = RecordSchema {
    kind: CollectionKind::Jobs,
    segments: &[
        Segment {
            label: "Title",
            fields: &["header"],
        },
        Segment {
            label: "Content",
            fields: &["description"],
        },
    ],
    label_field: "header",
    display_fields: &[("Title", "header")],
};

pub static PORTFOLIO_SCHEMA: RecordSchema = RecordSchema {
    kind: CollectionKind::Portfolio,
    segments: &[
        Segment {
            label: "Name",
            fields: &["name"],
        },
        Segment {
            label: "Sector",
            fields: &["sector", "sector_hover_card", "sector_company_page"],
        },
        Segment {
            label: "Introduction",
            fields: &["introduction_company_page"],
        },
        Segment {
            label: "Description",
            fields: &["description_company_page"],
        },
        Segment {
            label: "Location",
            fields: &["country"],
        },
    ],
    label_field: "name",
    display_fields: &[("Name", "name"), ("Country", "country"), ("Sector", "sector")],
};

const SEGMENT_DELIMITER: &str = "; ";

impl RecordSchema {
    /// All fields participating in the composite text, in schema order
    pub fn required_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.segments.iter().flat_map(|s| s.fields.iter().copied())
    }

    /// Build the composite text, e.g. `Title: ...; Content: ...`.
    ///
    /// Returns `Err(field)` naming the first required field that is absent
    /// or blank; no partial composite text is ever produced.
    pub fn compose(&self, fields: &BTreeMap<String, String>) -> Result<String, &'static str> {
        let mut parts = Vec::with_capacity(self.segments.len());
        for segment in self.segments {
            let mut values = Vec::with_capacity(segment.fields.len());
            for &field in segment.fields {
                match fields.get(field).map(|v| v.trim()) {
                    Some(v) if !v.is_empty() => values.push(v),
                    _ => return Err(field),
                }
            }
            parts.push(format!("{}: {}", segment.label, values.join(" ")));
        }
        Ok(parts.join(SEGMENT_DELIMITER))
    }
}
