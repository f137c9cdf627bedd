//! Prompt templates for the PATENTMATCH generator, reflector and curator roles.

use ace_core::{PromptError, PromptRegistry};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::sample::PatentSample;

pub const PATENTMATCH_GENERATOR_PROMPT: &str = r#"You are an expert patent examiner assistant specialized in assessing novelty of patent claims.
Your task is to determine if a paragraph from prior art (existing patent) describes the same invention as a claim from a new patent application.

Playbook of strategies and known issues:
{{playbook}}

Recent reflection and lessons learned:
{{reflection}}

Claim (from new patent application):
{{claim}}

Paragraph (from prior art document):
{{paragraph}}

Additional context:
{{context}}

Instructions:
1. Carefully read both the claim and the paragraph
2. Identify key technical features in the claim
3. Check if ALL key features are present in the paragraph
4. Consider legal and semantic equivalence, not just keyword matching
5. Apply relevant strategies from the playbook
6. Make your classification decision

Classification labels:
- "X": The paragraph describes the SAME invention and breaks novelty (MATCH)
- "A": The paragraph is related background but does NOT break novelty (NO MATCH)

Respond with a compact JSON object:
{
  "reasoning": "<step-by-step analysis of claim features vs paragraph content>",
  "bullet_ids": ["<id1>", "<id2>", "..."],
  "final_answer": "X or A"
}
"#;

pub const PATENTMATCH_REFLECTOR_PROMPT: &str = r#"You are a senior patent examination reviewer analyzing the examiner's decision.
Use the playbook, reasoning, and feedback to identify mistakes and extract actionable insights.
Output must be a single valid JSON object. Do NOT include text outside the JSON.
Begin the response with `{` and end with `}`.

Claim:
{{claim}}

Paragraph:
{{paragraph}}

Examiner's reasoning:
{{reasoning}}

Examiner's classification: {{prediction}}
Ground truth (if available): {{ground_truth}}
Feedback: {{feedback}}

Playbook excerpts consulted:
{{playbook_excerpt}}

Analyze:
1. Was the classification correct?
2. Were all key technical features properly identified?
3. Did the examiner miss any critical similarities or differences?
4. Which playbook bullets helped or hindered the decision?
5. What insight can improve future patent examination?

Return JSON:
{
  "reasoning": "<your analysis>",
  "error_identification": "<what went wrong, if anything>",
  "root_cause_analysis": "<why the error occurred>",
  "correct_approach": "<what should be done for similar cases>",
  "key_insight": "<reusable lesson for patent examination>",
  "bullet_tags": [
    {"id": "<bullet-id>", "tag": "helpful|harmful|neutral"}
  ]
}
"#;

pub const PATENTMATCH_CURATOR_PROMPT: &str = r#"You are the curator of the patent examination playbook.
Merge the latest reflection into structured updates for the playbook.
Only add genuinely new strategies, common mistakes, or technical insights.
Do not regenerate the entire playbook.
Respond with a single valid JSON object only, with no extra text.

Training progress: {{progress}}
Playbook stats: {{stats}}

Recent reflection:
{{reflection}}

Current playbook:
{{playbook}}

Case context:
{{question_context}}

Instructions:
Focus on patent-specific strategies such as:
- Feature identification techniques
- Common misclassification patterns
- Legal/semantic equivalence rules
- Technical domain-specific guidance
- Verification checklists

Respond with JSON:
{
  "reasoning": "<how you decided on the updates>",
  "operations": [
    {
      "type": "ADD|UPDATE|TAG|REMOVE",
      "section": "<section name like 'feature_identification', 'common_errors', 'legal_principles'>",
      "content": "<bullet text>",
      "bullet_id": "<optional existing id>",
      "metadata": {"helpful": 1, "harmful": 0}
    }
  ]
}

If no updates are required, return an empty list for "operations".
"#;

/// The three ACE roles that have a PATENTMATCH prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptRole {
    Generator,
    Reflector,
    Curator,
}

impl PromptRole {
    pub const ALL: [PromptRole; 3] = [
        PromptRole::Generator,
        PromptRole::Reflector,
        PromptRole::Curator,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PromptRole::Generator => "generator",
            PromptRole::Reflector => "reflector",
            PromptRole::Curator => "curator",
        }
    }

    pub fn template(self) -> &'static str {
        match self {
            PromptRole::Generator => PATENTMATCH_GENERATOR_PROMPT,
            PromptRole::Reflector => PATENTMATCH_REFLECTOR_PROMPT,
            PromptRole::Curator => PATENTMATCH_CURATOR_PROMPT,
        }
    }
}

impl fmt::Display for PromptRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PromptRole::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown prompt role '{}'", s))
    }
}

/// Variables for the generator prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratorPromptContext {
    pub playbook: String,
    pub reflection: String,
    pub claim: String,
    pub paragraph: String,
    pub context: String,
}

impl GeneratorPromptContext {
    pub fn for_sample(
        sample: &PatentSample,
        playbook: impl Into<String>,
        reflection: impl Into<String>,
    ) -> Self {
        Self {
            playbook: playbook.into(),
            reflection: reflection.into(),
            claim: sample.claim.clone(),
            paragraph: sample.paragraph.clone(),
            context: sample.context.clone(),
        }
    }
}

/// Variables for the reflector prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReflectorPromptContext {
    pub claim: String,
    pub paragraph: String,
    pub reasoning: String,
    pub prediction: String,
    pub ground_truth: String,
    pub feedback: String,
    pub playbook_excerpt: String,
}

/// Variables for the curator prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CuratorPromptContext {
    pub progress: String,
    pub stats: String,
    pub reflection: String,
    pub playbook: String,
    pub question_context: String,
}

/// Registry preloaded with the three PATENTMATCH templates.
pub struct PatentPrompts {
    registry: PromptRegistry,
}

impl PatentPrompts {
    pub fn new() -> Result<Self, PromptError> {
        let mut registry = PromptRegistry::new();
        for role in PromptRole::ALL {
            registry.register(role.as_str(), role.template())?;
        }
        Ok(Self { registry })
    }

    pub fn generator(&self, ctx: &GeneratorPromptContext) -> Result<String, PromptError> {
        self.render(PromptRole::Generator, ctx)
    }

    pub fn reflector(&self, ctx: &ReflectorPromptContext) -> Result<String, PromptError> {
        self.render(PromptRole::Reflector, ctx)
    }

    pub fn curator(&self, ctx: &CuratorPromptContext) -> Result<String, PromptError> {
        self.render(PromptRole::Curator, ctx)
    }

    /// Render any role from an arbitrary serializable context.
    pub fn render<T: Serialize>(&self, role: PromptRole, ctx: &T) -> Result<String, PromptError> {
        self.registry.render(role.as_str(), ctx)
    }
}
