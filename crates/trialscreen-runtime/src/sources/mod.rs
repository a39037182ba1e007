//! Record sources: RIS / RefMan exports and JSON arrays.

pub mod json;
pub mod ris;

use std::path::Path;

use thiserror::Error;
use trialscreen_core::Record;

/// Errors from reading records.
#[derive(Error, Debug)]
pub enum RecordSourceError {
    #[error("Failed to read records: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON records: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Load records from `path`. `.json` files are JSON arrays; anything else
/// is read as RIS.
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<Record>, RecordSourceError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;

    let records = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => json::parse(&content)?,
        _ => ris::parse(&content),
    };

    tracing::info!(path = %path.display(), records = records.len(), "records loaded");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_by_extension() {
        let dir = std::env::temp_dir().join(format!("trialscreen-sources-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let ris_path = dir.join("export.ris");
        std::fs::write(&ris_path, "TY  - JOUR\nTI  - Aspirin after MI\nER  -\n").unwrap();
        assert_eq!(load_records(&ris_path).unwrap()[0].title, "Aspirin after MI");

        let json_path = dir.join("records.JSON");
        std::fs::write(&json_path, r#"[{"title": "Statins after MI"}]"#).unwrap();
        assert_eq!(load_records(&json_path).unwrap()[0].title, "Statins after MI");

        assert!(matches!(
            load_records(dir.join("missing.ris")),
            Err(RecordSourceError::IoError(_))
        ));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
