//! RIS / RefMan reader.
//!
//! ```text
//! TY  - JOUR
//! TI  - Ticagrelor versus clopidogrel in acute coronary syndromes
//! AU  - Wallentin, L
//! AU  - Becker, RC
//! AB  - We randomly assigned 18,624 patients...
//!       continuation lines are appended with a space
//! DO  - 10.1056/NEJMoa0904327
//! ER  -
//! ```
//!
//! A record starts at a `TY` line preceded by a blank line (or at the top
//! of the file). Unknown tags are ignored. Records without a title are
//! dropped.

use lazy_static::lazy_static;
use regex::Regex;
use trialscreen_core::Record;

lazy_static! {
    static ref FIELD: Regex = Regex::new(r"^([A-Z][A-Z0-9])\s*-\s*(.*)").unwrap();
    static ref RECORD_START: Regex = Regex::new(r"^TY\s+-").unwrap();
}

/// Parse every titled record in `content`.
pub fn parse(content: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut after_blank = true;

    for line in content.lines() {
        let trimmed = line.trim();
        if after_blank && RECORD_START.is_match(trimmed) && !current.is_empty() {
            records.extend(parse_record(&current));
            current.clear();
        }
        after_blank = trimmed.is_empty();
        current.push(line);
    }
    records.extend(parse_record(&current));

    tracing::debug!(records = records.len(), "RIS records parsed");
    records
}

/// One record from its lines; `None` without a title.
fn parse_record(lines: &[&str]) -> Option<Record> {
    let mut record = Record::default();
    let mut field: Option<(String, String)> = None;

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match FIELD.captures(line) {
            Some(caps) => {
                if let Some((tag, value)) = field.take() {
                    set_field(&mut record, &tag, &value);
                }
                field = Some((caps[1].to_string(), caps[2].to_string()));
            }
            None => match field.as_mut() {
                Some((_, value)) if !value.is_empty() => {
                    value.push(' ');
                    value.push_str(line);
                }
                Some((_, value)) => value.push_str(line),
                None => {}
            },
        }
    }
    if let Some((tag, value)) = field {
        set_field(&mut record, &tag, &value);
    }

    if record.title.is_empty() {
        None
    } else {
        Some(record)
    }
}

fn set_field(record: &mut Record, tag: &str, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }

    let slot = match tag {
        "TI" | "T1" => &mut record.title,
        "AB" | "N2" => &mut record.abstract_text,
        "JO" | "JF" | "JA" => &mut record.journal,
        "PY" | "Y1" => &mut record.year,
        "DO" => &mut record.doi,
        "AN" => &mut record.pmid,
        "AU" | "A1" => {
            if !record.authors.is_empty() {
                record.authors.push_str("; ");
            }
            record.authors.push_str(value);
            return;
        }
        _ => return,
    };
    *slot = value.to_string();
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
TY  - JOUR
TI  - Ticagrelor versus clopidogrel in patients with acute
      coronary syndromes
AU  - Wallentin, L
AU  - Becker, RC
JO  - N Engl J Med
PY  - 2009
AB  - We randomly assigned 18,624 patients.
DO  - 10.1056/NEJMoa0904327
AN  - 19717846
ER  -

TY  - JOUR
AB  - An untitled record is dropped.
ER  -


TY  - JOUR
T1  - Early metoprolol in STEMI
A1  - Ibanez, B
N2  - Patients were randomized.
Y1  - 2013
JF  - Circulation
ER  -
";

    #[test]
    fn test_parse_records() {
        let records = parse(SAMPLE);
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(
            first.title,
            "Ticagrelor versus clopidogrel in patients with acute coronary syndromes"
        );
        assert_eq!(first.authors, "Wallentin, L; Becker, RC");
        assert_eq!(first.journal, "N Engl J Med");
        assert_eq!(first.year, "2009");
        assert_eq!(first.doi, "10.1056/NEJMoa0904327");
        assert_eq!(first.pmid, "19717846");

        let second = &records[1];
        assert_eq!(second.title, "Early metoprolol in STEMI");
        assert_eq!(second.abstract_text, "Patients were randomized.");
        assert_eq!(second.journal, "Circulation");
        assert_eq!(second.year, "2013");
        assert_eq!(second.authors, "Ibanez, B");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").is_empty());
        assert!(parse("\n\n").is_empty());
    }

    #[test]
    fn test_windows_line_endings() {
        let records = parse("TY  - JOUR\r\nTI  - Aspirin after MI\r\nER  -\r\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Aspirin after MI");
    }
}
