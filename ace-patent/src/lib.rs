//! # ace-patent: PATENTMATCH task adapter
//!
//! Binary classification of claim / prior-art paragraph pairs for the ACE
//! adaptation loop. A paragraph is labelled `X` when it breaks the novelty of
//! the claim and `A` when it does not.
//!
//! - [`MetricsCalculator`]: accuracy, precision, recall, F1 and perplexity,
//!   with per-run snapshots and cross-run aggregation
//! - [`PatentMatchEnvironment`]: compares the generator's answer with the
//!   ground truth and produces feedback
//! - [`prompts`]: generator, reflector and curator templates
//! - [`records`]: JSONL loading for offline evaluation

pub mod environment;
pub mod error;
pub mod label;
pub mod metrics;
pub mod prompts;
pub mod records;
pub mod sample;

pub use environment::PatentMatchEnvironment;
pub use error::{MetricsError, PatentError, PatentResult};
pub use label::Label;
pub use metrics::{ConfusionCounts, Metric, MetricStats, MetricsCalculator, MetricsSnapshot};
pub use prompts::{PatentPrompts, PromptRole};
pub use records::{PredictionRecord, load_records};
pub use sample::PatentSample;
