//! Seam types shared between the adaptation loop and task adapters.
//!
//! The loop itself (generator, reflector, curator, playbook) lives outside
//! this workspace. A task adapter only sees a [`Sample`], the generator's
//! [`GeneratorOutput`] for it, and answers with an [`EnvironmentResult`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A single task instance handed to the generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub question: String,
    #[serde(default)]
    pub context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ground_truth: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl Sample {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Default::default()
        }
    }

    pub fn with_ground_truth(mut self, ground_truth: impl Into<String>) -> Self {
        self.ground_truth = Some(ground_truth.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Read a string-valued metadata entry.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

/// What the generator produced for a sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratorOutput {
    #[serde(default)]
    pub reasoning: String,
    pub final_answer: String,
    #[serde(default)]
    pub bullet_ids: Vec<String>,
    /// The parsed JSON object the model returned, including any extra keys
    /// such as `confidence` or `probabilities`.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub raw: Map<String, Value>,
}

impl GeneratorOutput {
    pub fn new(final_answer: impl Into<String>) -> Self {
        Self {
            final_answer: final_answer.into(),
            ..Default::default()
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    /// Attach a raw field, e.g. `("confidence", json!(0.9))`.
    pub fn with_raw(mut self, key: impl Into<String>, value: Value) -> Self {
        self.raw.insert(key.into(), value);
        self
    }
}

/// Feedback and metrics returned by a task environment for one sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentResult {
    pub feedback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ground_truth: Option<String>,
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
    /// Normalised prediction, when the environment could interpret one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl EnvironmentResult {
    pub fn new(feedback: impl Into<String>) -> Self {
        Self {
            feedback: feedback.into(),
            ..Default::default()
        }
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

/// A task-specific evaluator plugged into the adaptation loop.
///
/// Environments own their running state (metrics, history) and are driven
/// by one loop at a time, hence `&mut self`.
pub trait TaskEnvironment {
    /// The sample type this environment understands.
    type Sample;

    /// Failure raised for malformed samples or misconfiguration. A wrong or
    /// unparseable model answer is not an error; it is reported as feedback.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Evaluate one generator output against its sample.
    fn evaluate(
        &mut self,
        sample: &Self::Sample,
        output: &GeneratorOutput,
    ) -> Result<EnvironmentResult, Self::Error>;

    /// Human-readable name of the task.
    fn name(&self) -> &str;
}
