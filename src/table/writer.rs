use std::fs;
use std::path::Path;

use csv::WriterBuilder;
use tracing::debug;

use super::{OutputRow, TableError};

/// Column set of the output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputLayout {
    /// `id,name,industry_id,industry,confidence`
    #[default]
    WithIndustryId,
    /// `id,name,industry,confidence`
    Plain,
}

impl OutputLayout {
    fn header(self) -> &'static [&'static str] {
        match self {
            OutputLayout::WithIndustryId => &["id", "name", "industry_id", "industry", "confidence"],
            OutputLayout::Plain => &["id", "name", "industry", "confidence"],
        }
    }

    fn fields(self, row: &OutputRow) -> Vec<String> {
        let confidence = row.confidence.to_string();
        match self {
            OutputLayout::WithIndustryId => vec![
                row.id.clone(),
                row.name.clone(),
                row.industry_id.clone(),
                row.industry.clone(),
                confidence,
            ],
            OutputLayout::Plain => vec![
                row.id.clone(),
                row.name.clone(),
                row.industry.clone(),
                confidence,
            ],
        }
    }
}

/// Serializes `rows` and overwrites `path` with the result.
pub fn write_output(path: &Path, rows: &[OutputRow], layout: OutputLayout) -> Result<(), TableError> {
    let bytes = render(rows, layout).map_err(|source| TableError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, bytes).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), rows = rows.len(), "output written");
    Ok(())
}

fn render(rows: &[OutputRow], layout: OutputLayout) -> Result<Vec<u8>, csv::Error> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(layout.header())?;
    for row in rows {
        writer.write_record(layout.fields(row))?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}
