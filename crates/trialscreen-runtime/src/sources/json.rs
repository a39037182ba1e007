//! JSON record reader: an array of record objects.
//!
//! Field names follow [`Record`]'s serde form (`abstract`, not
//! `abstract_text`); missing fields are empty.

use trialscreen_core::Record;

use super::RecordSourceError;

/// Parse a JSON array of records. Records without a title are dropped.
pub fn parse(content: &str) -> Result<Vec<Record>, RecordSourceError> {
    let records: Vec<Record> = serde_json::from_str(content)?;
    let total = records.len();
    let records: Vec<Record> = records
        .into_iter()
        .filter(|r| !r.title.trim().is_empty())
        .collect();

    if records.len() < total {
        tracing::debug!(dropped = total - records.len(), "untitled JSON records dropped");
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_array() {
        let json = r#"[
            {"title": "Ticagrelor in STEMI", "abstract": "Randomized.", "doi": "10.1000/x"},
            {"title": "", "abstract": "no title"},
            {"title": "Metoprolol after MI"}
        ]"#;
        let records = parse(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].abstract_text, "Randomized.");
        assert_eq!(records[0].doi, "10.1000/x");
        assert_eq!(records[1].abstract_text, "");
    }

    #[test]
    fn test_rejects_non_array() {
        assert!(matches!(
            parse(r#"{"title": "x"}"#),
            Err(RecordSourceError::JsonError(_))
        ));
    }
}
