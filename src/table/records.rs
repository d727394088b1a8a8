use std::fmt;

use super::Row;

/// A company to classify, read from the clients table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRecord {
    pub id: String,
    pub name: String,
}

impl ClientRecord {
    /// Returns `None` when `id` or `name` is absent or empty.
    pub fn from_row(row: &Row<'_>) -> Option<Self> {
        let (id, name) = id_and_name(row)?;
        Some(Self { id, name })
    }
}

/// One allowed industry category. `id` is empty when the table has none for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndustryRecord {
    pub id: String,
    pub name: String,
}

impl IndustryRecord {
    /// Returns `None` only when `name` is absent or empty.
    pub fn from_row(row: &Row<'_>) -> Option<Self> {
        let name = row.get("name").filter(|v| !v.is_empty())?;
        Some(Self {
            id: row.get("id").unwrap_or_default().to_string(),
            name: name.to_string(),
        })
    }
}

fn id_and_name(row: &Row<'_>) -> Option<(String, String)> {
    let id = row.get("id").filter(|v| !v.is_empty())?;
    let name = row.get("name").filter(|v| !v.is_empty())?;
    Some((id.to_string(), name.to_string()))
}

/// Classifier confidence on a 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Confidence(pub f64);

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 && self.0.abs() < 1e15 {
            write!(f, "{}", self.0 as i64)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub id: String,
    pub name: String,
    pub industry_id: String,
    pub industry: String,
    pub confidence: Confidence,
}
