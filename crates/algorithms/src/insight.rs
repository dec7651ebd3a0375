//! Offline one-line interpretation of a change percentage

use std::fmt;

use serde::Serialize;

/// How much of the scene changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSeverity {
    /// Below 5 %
    Minimal,
    /// 5 % up to 15 %
    Moderate,
    /// 15 % up to 30 %
    Significant,
    /// 30 % and above
    Dramatic,
}

impl ChangeSeverity {
    /// Classify a change percentage in [0, 100]
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage < 5.0 {
            ChangeSeverity::Minimal
        } else if percentage < 15.0 {
            ChangeSeverity::Moderate
        } else if percentage < 30.0 {
            ChangeSeverity::Significant
        } else {
            ChangeSeverity::Dramatic
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChangeSeverity::Minimal => "minimal",
            ChangeSeverity::Moderate => "moderate",
            ChangeSeverity::Significant => "significant",
            ChangeSeverity::Dramatic => "dramatic",
        }
    }

    /// Human-readable summary sentence
    pub fn description(&self) -> &'static str {
        match self {
            ChangeSeverity::Minimal => "Minimal changes detected. Area appears relatively stable.",
            ChangeSeverity::Moderate => {
                "Moderate changes observed. Worth investigating specific regions."
            }
            ChangeSeverity::Significant => {
                "Significant changes detected. Major transformations occurring."
            }
            ChangeSeverity::Dramatic => {
                "Dramatic changes identified. Substantial area modification detected."
            }
        }
    }
}

impl fmt::Display for ChangeSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
