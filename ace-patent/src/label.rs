//! The two PATENTMATCH classes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MetricsError;

/// Classification of a prior-art paragraph against a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    /// The paragraph discloses every feature of the claim and breaks novelty.
    #[serde(rename = "X")]
    X,
    /// The paragraph is related background and does not break novelty.
    #[serde(rename = "A")]
    A,
}

impl Label {
    /// The class counted as positive for precision and recall.
    pub const POSITIVE: Label = Label::X;

    pub const ALL: [Label; 2] = [Label::X, Label::A];

    pub fn is_positive(self) -> bool {
        self == Self::POSITIVE
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::X => "X",
            Label::A => "A",
        }
    }

    /// Short human-readable meaning, as used in feedback text.
    pub fn meaning(self) -> &'static str {
        match self {
            Label::X => "match",
            Label::A => "no match",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = MetricsError;

    /// Surrounding whitespace and case are ignored; anything else is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        if token.eq_ignore_ascii_case("x") {
            Ok(Label::X)
        } else if token.eq_ignore_ascii_case("a") {
            Ok(Label::A)
        } else {
            Err(MetricsError::InvalidLabel {
                label: token.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_trimmed_and_case_insensitive() {
        assert_eq!(" x ".parse::<Label>(), Ok(Label::X));
        assert_eq!("A".parse::<Label>(), Ok(Label::A));
        assert_eq!("a\n".parse::<Label>(), Ok(Label::A));
    }

    #[test]
    fn test_parse_rejects_other_tokens() {
        for token in ["", "Y", "XA", "match", "P"] {
            assert_eq!(
                token.parse::<Label>(),
                Err(MetricsError::InvalidLabel {
                    label: token.to_string()
                })
            );
        }
    }

    #[test]
    fn test_positive_class() {
        assert!(Label::X.is_positive());
        assert!(!Label::A.is_positive());
        assert_eq!(Label::X.to_string(), "X");
    }

    #[test]
    fn test_serde_uses_single_letters() {
        assert_eq!(serde_json::to_string(&Label::A).unwrap(), "\"A\"");
        let label: Label = serde_json::from_str("\"X\"").unwrap();
        assert_eq!(label, Label::X);
    }
}
