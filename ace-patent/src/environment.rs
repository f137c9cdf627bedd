//! PATENTMATCH task environment: turns a generator answer into feedback and metrics.

use ace_core::{EnvironmentResult, EvaluationConfig, GeneratorOutput, TaskEnvironment};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{MetricsError, PatentError, PatentResult};
use crate::label::Label;
use crate::metrics::{Metric, MetricStats, MetricsCalculator, MetricsSnapshot};
use crate::sample::PatentSample;

/// Evaluates whether the generator correctly judged if a prior-art paragraph
/// breaks the novelty of a claim.
///
/// Holds its own [`MetricsCalculator`]; every valid answer is recorded and the
/// cumulative metrics of the current run are returned with the feedback.
#[derive(Debug, Clone)]
pub struct PatentMatchEnvironment {
    calculator: MetricsCalculator,
    config: EvaluationConfig,
    invalid_predictions: usize,
}

impl Default for PatentMatchEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl PatentMatchEnvironment {
    pub fn new() -> Self {
        Self::with_config(EvaluationConfig::default())
    }

    pub fn with_config(config: EvaluationConfig) -> Self {
        Self {
            calculator: MetricsCalculator::with_config(&config),
            config,
            invalid_predictions: 0,
        }
    }

    /// Like [`Self::with_config`], rejecting floors outside `(0, 1)`.
    pub fn try_with_config(config: EvaluationConfig) -> PatentResult<Self> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    /// Read access to the running metrics.
    pub fn metrics(&self) -> &MetricsCalculator {
        &self.calculator
    }

    /// Metrics of the current run so far.
    pub fn current_metrics(&self) -> MetricsSnapshot {
        self.calculator.compute()
    }

    /// Close the current run: snapshot its metrics into the history and start afresh.
    pub fn end_run(&mut self) -> MetricsSnapshot {
        self.calculator.snapshot_and_reset()
    }

    /// Mean and standard deviation per metric across completed runs.
    pub fn aggregate_metrics(&self) -> Result<BTreeMap<Metric, MetricStats>, MetricsError> {
        self.calculator.aggregate()
    }

    /// Forget all outcomes and run history.
    pub fn reset_metrics(&mut self) {
        self.calculator.reset();
        self.calculator.clear_history();
        self.invalid_predictions = 0;
    }

    /// Answers that were neither `X` nor `A` since the last reset.
    pub fn invalid_predictions(&self) -> usize {
        self.invalid_predictions
    }

    /// Confidence in the predicted label, if the generator reported one.
    ///
    /// Scalar keys are tried first, then the per-label probability map. The
    /// first value that is a number in `[0, 1]` wins; unusable values are
    /// skipped.
    fn extract_confidence(&self, output: &GeneratorOutput, predicted: Label) -> Option<f64> {
        let scalars = self
            .config
            .confidence_keys
            .iter()
            .filter_map(|key| output.raw.get(key).map(|v| (key.as_str(), v)));

        let per_label = output
            .raw
            .get(&self.config.probabilities_key)
            .and_then(Value::as_object)
            .and_then(|map| {
                map.get(predicted.as_str())
                    .or_else(|| map.get(&predicted.as_str().to_ascii_lowercase()))
            })
            .map(|v| (self.config.probabilities_key.as_str(), v));

        scalars
            .chain(per_label)
            .find_map(|(source, value)| parse_probability(source, value))
    }
}

fn parse_probability(source: &str, value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(p) if (0.0..=1.0).contains(&p) => Some(p),
        _ => {
            tracing::warn!(key = source, value = %value, "Ignoring unusable confidence");
            None
        }
    }
}

fn feedback_for(predicted: Label, actual: Label) -> String {
    match (predicted, actual) {
        (Label::X, Label::X) => {
            "Correct: The paragraph does break novelty (X classification)".to_string()
        }
        (Label::A, Label::A) => {
            "Correct: The paragraph does not break novelty (A classification)".to_string()
        }
        (Label::X, Label::A) => "Incorrect: Classified as X (match) but should be A (no match). \
             The paragraph does not contain all key features of the claim."
            .to_string(),
        (Label::A, Label::X) => "Incorrect: Classified as A (no match) but should be X (match). \
             The paragraph actually describes the same invention and breaks novelty."
            .to_string(),
    }
}

impl TaskEnvironment for PatentMatchEnvironment {
    type Sample = PatentSample;
    type Error = PatentError;

    /// A ground truth outside `{X, A}` is a data error and fails the call.
    /// An answer outside `{X, A}` is a model error: it is reported in the
    /// feedback with `accuracy = 0, error = 1` and not recorded.
    fn evaluate(
        &mut self,
        sample: &PatentSample,
        output: &GeneratorOutput,
    ) -> PatentResult<EnvironmentResult> {
        let ground_truth_token = sample.ground_truth.as_deref().unwrap_or_default();
        let actual: Label = ground_truth_token.parse()?;
        let prediction_token = output.final_answer.trim().to_uppercase();

        let predicted: Label = match prediction_token.parse() {
            Ok(label) => label,
            Err(_) => {
                self.invalid_predictions += 1;
                tracing::warn!(
                    prediction = %prediction_token,
                    invalid = self.invalid_predictions,
                    "Generator returned an invalid classification"
                );
                let mut result = EnvironmentResult::new(format!(
                    "Invalid classification '{}'. Must be 'X' (match) or 'A' (no match).",
                    prediction_token
                ));
                result.ground_truth = Some(actual.to_string());
                result.metrics = BTreeMap::from([
                    ("accuracy".to_string(), 0.0),
                    ("error".to_string(), 1.0),
                ]);
                return Ok(result);
            }
        };

        let confidence = self.extract_confidence(output, predicted);
        self.calculator.record(predicted, actual, confidence)?;

        Ok(EnvironmentResult {
            feedback: feedback_for(predicted, actual),
            ground_truth: Some(actual.to_string()),
            metrics: self.calculator.compute().to_map(),
            prediction: Some(predicted.to_string()),
            confidence,
        })
    }

    fn name(&self) -> &str {
        "patentmatch"
    }
}
