//! Risk categories and their score breakpoints.

use serde::{Deserialize, Serialize};

/// Lower score bounds of the upper three categories.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakpoints {
    #[serde(default = "default_moderate")]
    pub moderate: f64,
    #[serde(default = "default_high")]
    pub high: f64,
    #[serde(default = "default_extreme")]
    pub extreme: f64,
}

fn default_moderate() -> f64 {
    25.0
}

fn default_high() -> f64 {
    50.0
}

fn default_extreme() -> f64 {
    75.0
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self {
            moderate: default_moderate(),
            high: default_high(),
            extreme: default_extreme(),
        }
    }
}

impl Breakpoints {
    /// Breakpoints must increase strictly and lie inside (0, 100).
    pub fn validate(&self) -> Result<(), String> {
        let ordered = 0.0 < self.moderate
            && self.moderate < self.high
            && self.high < self.extreme
            && self.extreme < 100.0;
        if !ordered {
            return Err(format!(
                "breakpoints must satisfy 0 < moderate < high < extreme < 100, got {}/{}/{}",
                self.moderate, self.high, self.extreme
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskCategory {
    Low,
    Moderate,
    High,
    Extreme,
}

impl RiskCategory {
    /// Category for a score in [0, 100]. A score equal to a breakpoint
    /// belongs to the higher category.
    pub fn from_score(score: f64, breakpoints: &Breakpoints) -> Self {
        if score >= breakpoints.extreme {
            RiskCategory::Extreme
        } else if score >= breakpoints.high {
            RiskCategory::High
        } else if score >= breakpoints.moderate {
            RiskCategory::Moderate
        } else {
            RiskCategory::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Low => "Low",
            RiskCategory::Moderate => "Moderate",
            RiskCategory::High => "High",
            RiskCategory::Extreme => "Extreme",
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
