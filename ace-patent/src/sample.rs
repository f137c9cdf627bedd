//! Claim/paragraph sample record.

use ace_core::Sample;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One PATENTMATCH pair: a claim from a new application and a paragraph
/// from a prior-art document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatentSample {
    pub claim: String,
    pub paragraph: String,
    /// Expected classification, `"X"` (match) or `"A"` (no match).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ground_truth: Option<String>,
    /// Technical domain or case notes.
    #[serde(default)]
    pub context: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    /// Question text for the generic loop; derived from claim and paragraph when empty.
    #[serde(default)]
    pub question: String,
}

impl PatentSample {
    pub fn new(claim: impl Into<String>, paragraph: impl Into<String>) -> Self {
        let mut sample = Self {
            claim: claim.into(),
            paragraph: paragraph.into(),
            ..Default::default()
        };
        sample.ensure_question();
        sample
    }

    pub fn with_ground_truth(mut self, ground_truth: impl Into<String>) -> Self {
        self.ground_truth = Some(ground_truth.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Fill `question` from claim and paragraph if it is empty.
    pub fn ensure_question(&mut self) {
        if self.question.is_empty() {
            self.question = format!("Claim: {}\n\nParagraph: {}", self.claim, self.paragraph);
        }
    }

    /// Rebuild a patent sample from a generic one carrying `claim` and
    /// `paragraph` in its metadata. Missing entries become empty strings.
    pub fn from_sample(sample: &Sample) -> Self {
        let mut patent = Self {
            claim: sample.metadata_str("claim").unwrap_or_default().to_string(),
            paragraph: sample
                .metadata_str("paragraph")
                .unwrap_or_default()
                .to_string(),
            ground_truth: sample.ground_truth.clone(),
            context: sample.context.clone(),
            metadata: sample.metadata.clone(),
            question: sample.question.clone(),
        };
        patent.ensure_question();
        patent
    }
}

impl From<PatentSample> for Sample {
    fn from(mut patent: PatentSample) -> Self {
        patent.ensure_question();
        let mut metadata = patent.metadata;
        metadata.insert("claim".to_string(), Value::String(patent.claim));
        metadata.insert("paragraph".to_string(), Value::String(patent.paragraph));
        Sample {
            question: patent.question,
            context: patent.context,
            ground_truth: patent.ground_truth,
            metadata,
        }
    }
}
