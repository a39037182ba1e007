//! Flat result export.
//!
//! One row per screened record, columns in a fixed order. CSV output
//! follows RFC 4180 quoting; JSON Lines output is one object per line.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::types::{Decision, Record, ScreeningResult};

/// Column order of every export.
pub const COLUMNS: [&str; 10] = [
    "title", "abstract", "authors", "journal", "year", "doi", "pmid", "decision", "confidence",
    "reasoning",
];

/// Confidence at or above which a decision counts as high-confidence.
pub const HIGH_CONFIDENCE: f64 = 0.8;

/// A record joined with its result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub authors: String,
    pub journal: String,
    pub year: String,
    pub doi: String,
    pub pmid: String,
    pub decision: Decision,
    pub confidence: f64,
    pub reasoning: String,
}

impl ExportRow {
    pub fn new(record: &Record, result: &ScreeningResult) -> Self {
        Self {
            title: record.title.clone(),
            abstract_text: record.abstract_text.clone(),
            authors: record.authors.clone(),
            journal: record.journal.clone(),
            year: record.year.clone(),
            doi: record.doi.clone(),
            pmid: record.pmid.clone(),
            decision: result.decision,
            confidence: result.confidence,
            reasoning: result.reasoning.clone(),
        }
    }

    fn fields(&self) -> [String; 10] {
        [
            self.title.clone(),
            self.abstract_text.clone(),
            self.authors.clone(),
            self.journal.clone(),
            self.year.clone(),
            self.doi.clone(),
            self.pmid.clone(),
            self.decision.to_string(),
            format!("{:.2}", self.confidence),
            self.reasoning.clone(),
        ]
    }
}

/// Quote a CSV field when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_line(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| csv_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// Write rows as CSV with a header line. Lines end with CRLF.
pub fn write_csv<W: Write>(mut out: W, rows: &[ExportRow]) -> io::Result<()> {
    let header: Vec<String> = COLUMNS.iter().map(|c| c.to_string()).collect();
    write!(out, "{}\r\n", csv_line(&header))?;
    for row in rows {
        write!(out, "{}\r\n", csv_line(&row.fields()))?;
    }
    out.flush()
}

/// Write rows as JSON Lines.
pub fn write_jsonl<W: Write>(mut out: W, rows: &[ExportRow]) -> io::Result<()> {
    for row in rows {
        serde_json::to_writer(&mut out, row)?;
        out.write_all(b"\n")?;
    }
    out.flush()
}

/// Aggregate statistics over a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub include: usize,
    pub exclude: usize,
    pub maybe: usize,
    pub avg_confidence: f64,
    pub high_confidence: usize,
}

impl Summary {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a ScreeningResult>) -> Self {
        let mut summary = Summary::default();
        let mut confidence_sum = 0.0;

        for result in results {
            summary.total += 1;
            match result.decision {
                Decision::Include => summary.include += 1,
                Decision::Exclude => summary.exclude += 1,
                Decision::Maybe => summary.maybe += 1,
            }
            confidence_sum += result.confidence;
            if result.confidence >= HIGH_CONFIDENCE {
                summary.high_confidence += 1;
            }
        }

        if summary.total > 0 {
            summary.avg_confidence = confidence_sum / summary.total as f64;
        }
        summary
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Total screened:   {}", self.total)?;
        writeln!(f, "Include:          {}", self.include)?;
        writeln!(f, "Exclude:          {}", self.exclude)?;
        writeln!(f, "Maybe:            {}", self.maybe)?;
        writeln!(f, "Avg confidence:   {:.2}", self.avg_confidence)?;
        write!(f, "High confidence:  {}", self.high_confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(title: &str, result: ScreeningResult) -> ExportRow {
        ExportRow::new(&Record::new(title, "abstract").with_doi("10.1/x"), &result)
    }

    #[test]
    fn test_csv_quoting() {
        let rows = vec![row(
            "Aspirin, \"low dose\"\nafter MI",
            ScreeningResult::include(0.9, "ok"),
        )];
        let mut out = Vec::new();
        write_csv(&mut out, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();

        let mut lines = text.split("\r\n");
        assert_eq!(
            lines.next().unwrap(),
            "title,abstract,authors,journal,year,doi,pmid,decision,confidence,reasoning"
        );
        assert!(text.contains("\"Aspirin, \"\"low dose\"\"\nafter MI\",abstract,,,,10.1/x,,include,0.90,ok"));
    }

    #[test]
    fn test_jsonl_uses_abstract_key() {
        let rows = vec![
            row("First title here", ScreeningResult::exclude(0.95, "review")),
            row("Second title here", ScreeningResult::maybe(0.5, "error")),
        ];
        let mut out = Vec::new();
        write_jsonl(&mut out, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["abstract"], "abstract");
        assert_eq!(value["decision"], "exclude");
    }

    #[test]
    fn test_summary() {
        let results = vec![
            ScreeningResult::include(0.9, "a"),
            ScreeningResult::exclude(0.95, "b"),
            ScreeningResult::exclude(0.7, "c"),
            ScreeningResult::maybe(0.5, "d"),
        ];
        let summary = Summary::from_results(&results);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.include, 1);
        assert_eq!(summary.exclude, 2);
        assert_eq!(summary.maybe, 1);
        assert_eq!(summary.high_confidence, 2);
        assert!((summary.avg_confidence - 0.7625).abs() < 1e-9);
    }

    #[test]
    fn test_empty_summary() {
        let summary = Summary::from_results(&Vec::<ScreeningResult>::new());
        assert_eq!(summary.total, 0);
        assert_eq!(summary.avg_confidence, 0.0);
    }
}
