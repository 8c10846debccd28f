//! CSV and JSON result writers.
//!
//! Each writer produces one flat file with a fixed column set. Rows arrive
//! already sorted; writers only serialize.

use crate::models::{AcceptedPaper, DecisionRow};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Write the accepted-papers CSV:
/// `(paper_number, title, authors, presentation_type)`.
pub fn write_accepted_csv(path: &Path, papers: &[AcceptedPaper]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    for paper in papers {
        writer.serialize(paper)?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write the decisions CSV: `(paper_number, decision, comment)`.
pub fn write_decisions_csv(path: &Path, rows: &[DecisionRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    for row in rows {
        writer.serialize(row)?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write the flagged low-score-accept CSV: a single `paper_number` column.
pub fn write_flagged_csv(path: &Path, paper_numbers: &[i64]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    writer.write_record(["paper_number"])?;
    for number in paper_numbers {
        writer.write_record([number.to_string()])?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write the profile-id -> submission-count map as JSON.
///
/// A `BTreeMap` keeps the keys sorted, so re-runs over the same data
/// produce byte-identical files.
pub fn write_author_counts_json(path: &Path, counts: &BTreeMap<String, usize>) -> Result<()> {
    let json = serde_json::to_string_pretty(counts).context("Failed to serialize author counts")?;

    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PresentationType;
    use tempfile::TempDir;

    #[test]
    fn test_write_accepted_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("accepted.csv");

        let papers = vec![
            AcceptedPaper {
                paper_number: 1,
                title: "A Study".to_string(),
                authors: "Jane Doe, John Roe".to_string(),
                presentation_type: PresentationType::Oral,
            },
            AcceptedPaper {
                paper_number: 2,
                title: "Another, With Comma".to_string(),
                authors: "Solo Author".to_string(),
                presentation_type: PresentationType::Unspecified,
            },
        ];

        write_accepted_csv(&path, &papers).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();

        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("paper_number,title,authors,presentation_type")
        );
        assert_eq!(lines.next(), Some("1,A Study,\"Jane Doe, John Roe\",Oral"));
        // Unspecified serializes as an empty cell.
        assert_eq!(
            lines.next(),
            Some("2,\"Another, With Comma\",Solo Author,")
        );
    }

    #[test]
    fn test_write_decisions_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("decisions.csv");

        let rows = vec![DecisionRow {
            paper_number: 7,
            decision: "Accept (Poster)".to_string(),
            comment: String::new(),
        }];

        write_decisions_csv(&path, &rows).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();

        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("paper_number,decision,comment"));
        assert_eq!(lines.next(), Some("7,Accept (Poster),"));
    }

    #[test]
    fn test_write_flagged_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flagged.csv");

        write_flagged_csv(&path, &[3, 11]).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "paper_number\n3\n11\n");
    }

    #[test]
    fn test_write_flagged_csv_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flagged.csv");

        write_flagged_csv(&path, &[]).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "paper_number\n");
    }

    #[test]
    fn test_write_author_counts_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("author_ids.json");

        let mut counts = BTreeMap::new();
        counts.insert("~Jane_Doe1".to_string(), 5);
        counts.insert("~Alan_Turing2".to_string(), 0);

        write_author_counts_json(&path, &counts).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();

        let parsed: BTreeMap<String, usize> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, counts);
        // BTreeMap serialization keeps keys sorted.
        assert!(content.find("~Alan_Turing2").unwrap() < content.find("~Jane_Doe1").unwrap());
    }
}
