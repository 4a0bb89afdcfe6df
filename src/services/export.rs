use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use tracing::info;

use crate::models::VitalsResult;

/// Placeholder body written for PDF exports
const MOCK_PDF_BODY: &str = "Mock PDF data...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

/// Document contents for `result` in `format`
pub fn render_vitals(result: &VitalsResult, format: ExportFormat) -> String {
    match format {
        ExportFormat::Csv => result.to_csv(),
        ExportFormat::Pdf => MOCK_PDF_BODY.to_string(),
    }
}

/// Write `result` to `vitals-<millis>.<ext>` inside `dir`
pub fn export_vitals(result: &VitalsResult, format: ExportFormat, dir: &Path) -> Result<PathBuf> {
    let file_name = format!("vitals-{}.{}", result.timestamp.timestamp_millis(), format.extension());
    let path = dir.join(file_name);

    fs::write(&path, render_vitals(result, format))
        .with_context(|| format!("Failed to write export: {}", path.display()))?;

    info!(path = %path.display(), content_type = format.content_type(), "vitals exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn reading() -> VitalsResult {
        VitalsResult::mock(Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap())
    }

    #[test]
    fn test_export_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_vitals(&reading(), ExportFormat::Csv, dir.path()).unwrap();

        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("csv"));
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "Date,Heart Rate,SpO2,Blood Pressure,Temperature\n2024-03-05 14:30:00,72,98,118/76,36.8"
        );
    }

    #[test]
    fn test_export_pdf_is_placeholder() {
        assert_eq!(render_vitals(&reading(), ExportFormat::Pdf), "Mock PDF data...");
        assert_eq!(ExportFormat::Pdf.content_type(), "application/pdf");
    }

    #[test]
    fn test_export_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(export_vitals(&reading(), ExportFormat::Csv, &missing).is_err());
    }
}
