//! JSONL records of recorded generator answers, for offline evaluation.
//!
//! Each non-blank line is one object: the sample fields (`claim`,
//! `paragraph`, `ground_truth`, ...) flattened together with the generator's
//! `final_answer` and optional `reasoning`, `raw` and `run` index.

use ace_core::GeneratorOutput;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::Path;

use crate::error::{PatentError, PatentResult};
use crate::sample::PatentSample;

/// One evaluated sample together with the answer it received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    #[serde(flatten)]
    pub sample: PatentSample,
    pub final_answer: String,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub raw: Map<String, Value>,
    /// Run (epoch) the answer belongs to; records without one form run 0.
    #[serde(default)]
    pub run: usize,
}

impl PredictionRecord {
    pub fn output(&self) -> GeneratorOutput {
        GeneratorOutput {
            reasoning: self.reasoning.clone(),
            final_answer: self.final_answer.clone(),
            bullet_ids: Vec::new(),
            raw: self.raw.clone(),
        }
    }
}

/// Parse JSONL records from a reader. Line numbers in errors are 1-based.
pub fn parse_records<R: BufRead>(reader: R) -> PatentResult<Vec<PredictionRecord>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut record: PredictionRecord =
            serde_json::from_str(&line).map_err(|e| PatentError::RecordParse {
                line: idx + 1,
                message: e.to_string(),
            })?;
        record.sample.ensure_question();
        records.push(record);
    }
    Ok(records)
}

/// Load JSONL records from a file.
pub fn load_records(path: &Path) -> PatentResult<Vec<PredictionRecord>> {
    let file = std::fs::File::open(path)?;
    let records = parse_records(std::io::BufReader::new(file))?;
    tracing::debug!(path = %path.display(), records = records.len(), "Loaded prediction records");
    Ok(records)
}

/// Group records by run index, runs in ascending order, file order kept within a run.
pub fn group_by_run(records: Vec<PredictionRecord>) -> BTreeMap<usize, Vec<PredictionRecord>> {
    let mut runs: BTreeMap<usize, Vec<PredictionRecord>> = BTreeMap::new();
    for record in records {
        runs.entry(record.run).or_default().push(record);
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TWO_RUNS: &str = r#"{"claim": "c1", "paragraph": "p1", "ground_truth": "X", "final_answer": "X", "raw": {"confidence": 0.9}, "run": 1}

{"claim": "c2", "paragraph": "p2", "ground_truth": "A", "final_answer": "X"}
{"claim": "c3", "paragraph": "p3", "ground_truth": "A", "final_answer": "A", "run": 1}
"#;

    #[test]
    fn test_parse_records() {
        let records = parse_records(Cursor::new(TWO_RUNS)).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].sample.claim, "c1");
        assert_eq!(records[0].run, 1);
        assert_eq!(records[0].output().raw.get("confidence"), Some(&Value::from(0.9)));
        assert_eq!(records[1].run, 0);
        assert_eq!(records[1].sample.question, "Claim: c2\n\nParagraph: p2");
    }

    #[test]
    fn test_parse_error_reports_line() {
        let input = "{\"claim\": \"c\", \"paragraph\": \"p\", \"final_answer\": \"X\"}\nnot json\n";
        let err = parse_records(Cursor::new(input)).unwrap_err();
        assert!(matches!(err, PatentError::RecordParse { line: 2, .. }));
    }

    #[test]
    fn test_missing_answer_is_parse_error() {
        let input = "{\"claim\": \"c\", \"paragraph\": \"p\"}\n";
        assert!(parse_records(Cursor::new(input)).is_err());
    }

    #[test]
    fn test_group_by_run() {
        let records = parse_records(Cursor::new(TWO_RUNS)).unwrap();
        let runs = group_by_run(records);
        let keys: Vec<usize> = runs.keys().copied().collect();
        assert_eq!(keys, vec![0, 1]);
        assert_eq!(runs[&1].len(), 2);
        assert_eq!(runs[&1][1].sample.claim, "c3");
    }

    #[test]
    fn test_load_records_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preds.jsonl");
        std::fs::write(&path, TWO_RUNS).unwrap();
        assert_eq!(load_records(&path).unwrap().len(), 3);
        assert!(matches!(
            load_records(&dir.path().join("missing.jsonl")),
            Err(PatentError::Io(_))
        ));
    }
}
