//! Subcommand handlers.

use ace_core::{AceConfig, TaskEnvironment};
use ace_patent::prompts::{CuratorPromptContext, GeneratorPromptContext, ReflectorPromptContext};
use ace_patent::records::{PredictionRecord, group_by_run, load_records};
use ace_patent::{
    Metric, MetricStats, MetricsSnapshot, PatentMatchEnvironment, PatentPrompts, PatentResult,
    PatentSample, PromptRole,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use crate::Commands;

pub(crate) fn handle_command(command: Commands, config: &AceConfig) -> anyhow::Result<()> {
    match command {
        Commands::Evaluate { file, json } => {
            let records = load_records(&file)?;
            if records.is_empty() {
                anyhow::bail!("No records found in {}", file.display());
            }
            let report = build_report(records, config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render_report(&report));
            }
            Ok(())
        }
        Commands::Prompt {
            role,
            sample,
            playbook,
        } => {
            let sample = match sample {
                Some(path) => read_sample(&path)?,
                None => PatentSample::new("<claim>", "<paragraph>"),
            };
            let playbook = match playbook {
                Some(path) => std::fs::read_to_string(&path)?,
                None => "(empty playbook)".to_string(),
            };
            print!("{}", render_prompt(role, &sample, &playbook)?);
            Ok(())
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(config)?);
            Ok(())
        }
    }
}

/// Metrics of one evaluated run.
#[derive(Debug, Serialize)]
pub(crate) struct RunReport {
    pub run: usize,
    pub metrics: MetricsSnapshot,
    /// Answers that were neither `X` nor `A`.
    pub invalid_predictions: usize,
}

/// Per-run metrics plus cross-run statistics.
#[derive(Debug, Serialize)]
pub(crate) struct EvaluationReport {
    pub runs: Vec<RunReport>,
    pub aggregate: BTreeMap<Metric, MetricStats>,
}

/// Replay recorded answers through a fresh environment, one snapshot per run.
pub(crate) fn build_report(
    records: Vec<PredictionRecord>,
    config: &AceConfig,
) -> PatentResult<EvaluationReport> {
    let mut env = PatentMatchEnvironment::try_with_config(config.evaluation.clone())?;
    let mut runs = Vec::new();

    for (run, records) in group_by_run(records) {
        let invalid_before = env.invalid_predictions();
        for record in &records {
            env.evaluate(&record.sample, &record.output())?;
        }
        let metrics = env.end_run();
        runs.push(RunReport {
            run,
            metrics,
            invalid_predictions: env.invalid_predictions() - invalid_before,
        });
    }

    let aggregate = env.aggregate_metrics()?;
    tracing::info!(runs = runs.len(), "Evaluation complete");
    Ok(EvaluationReport { runs, aggregate })
}

fn fmt_value(v: f64) -> String {
    if v.is_finite() {
        format!("{:.4}", v)
    } else {
        "inf".to_string()
    }
}

pub(crate) fn render_report(report: &EvaluationReport) -> String {
    let mut out = String::new();
    for run in &report.runs {
        let m = &run.metrics;
        let _ = write!(out, "run {:<3} samples {:<5}", run.run, m.samples);
        for metric in Metric::ALL {
            let _ = write!(out, " {} {}", metric, fmt_value(m.get(metric)));
        }
        if run.invalid_predictions > 0 {
            let _ = write!(out, " invalid {}", run.invalid_predictions);
        }
        out.push('\n');
    }
    let _ = writeln!(out, "\naggregate over {} run(s)", report.runs.len());
    for (metric, stats) in &report.aggregate {
        let _ = writeln!(
            out,
            "  {:<11} mean {}  std {}",
            metric.as_str(),
            fmt_value(stats.mean),
            fmt_value(stats.std_dev)
        );
    }
    out
}

fn read_sample(path: &Path) -> anyhow::Result<PatentSample> {
    let text = std::fs::read_to_string(path)?;
    let mut sample: PatentSample = serde_json::from_str(&text)?;
    sample.ensure_question();
    Ok(sample)
}

pub(crate) fn render_prompt(
    role: PromptRole,
    sample: &PatentSample,
    playbook: &str,
) -> PatentResult<String> {
    let prompts = PatentPrompts::new()?;
    let text = match role {
        PromptRole::Generator => prompts.generator(&GeneratorPromptContext::for_sample(
            sample,
            playbook,
            "(none)",
        ))?,
        PromptRole::Reflector => prompts.reflector(&ReflectorPromptContext {
            claim: sample.claim.clone(),
            paragraph: sample.paragraph.clone(),
            ground_truth: sample.ground_truth.clone().unwrap_or_default(),
            playbook_excerpt: playbook.to_string(),
            ..Default::default()
        })?,
        PromptRole::Curator => prompts.curator(&CuratorPromptContext {
            playbook: playbook.to_string(),
            question_context: sample.question.clone(),
            ..Default::default()
        })?,
    };
    Ok(text)
}
