use serde::{Deserialize, Serialize};

/// Configuration for evaluation behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Years a time zone evaluation looks past the requested window end
    pub observance_lookahead_years: u32,
    /// Limit on the candidates a single frequency period may expand to
    pub max_instances_per_period: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            observance_lookahead_years: 5,
            max_instances_per_period: 10_000,
        }
    }
}

impl EvaluationConfig {
    /// Look-ahead as the signed year count calendar arithmetic expects.
    pub(crate) fn lookahead_years(&self) -> i32 {
        i32::try_from(self.observance_lookahead_years).unwrap_or(i32::MAX)
    }
}
