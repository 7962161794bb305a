/// Lower boundary of the [`RiskLevel::Low`] tier.
pub const LOW_RISK_MIN_SCORE: f64 = 45.0;
/// Lower boundary of the [`RiskLevel::Medium`] tier.
pub const MEDIUM_RISK_MIN_SCORE: f64 = 30.0;

/// How distinguishable the output remains from the source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RiskLevel {
    /// Large fingerprint divergence.
    Low,
    /// Moderate divergence.
    Medium,
    /// Output still matches the source closely.
    High,
    /// Analysis could not be completed.
    Unknown,
}

impl RiskLevel {
    /// Classify a hash delta percentage. Boundaries are closed on the lower-risk side; a NaN
    /// score is [`RiskLevel::Unknown`].
    pub fn classify(score: f64) -> Self {
        if score.is_nan() {
            Self::Unknown
        } else if score >= LOW_RISK_MIN_SCORE {
            Self::Low
        } else if score >= MEDIUM_RISK_MIN_SCORE {
            Self::Medium
        } else {
            Self::High
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/analysis/risk.rs"]
mod tests;
