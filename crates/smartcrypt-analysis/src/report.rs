//! Threat analysis report payloads.
//!
//! The engine does not validate the semantic correctness of a report, only
//! that all four fields are present. A missing field is an analysis
//! failure, and failures substitute the fail-safe Critical report — the
//! system fails safe, not open.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Assessed threat level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatLevel {
    /// Whether this level warrants securing the file.
    pub fn is_elevated(self) -> bool {
        matches!(self, ThreatLevel::High | ThreatLevel::Critical)
    }
}

impl std::fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ThreatLevel::Low => "Low",
            ThreatLevel::Medium => "Medium",
            ThreatLevel::High => "High",
            ThreatLevel::Critical => "Critical",
        })
    }
}

impl std::str::FromStr for ThreatLevel {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(ThreatLevel::Low),
            "Medium" => Ok(ThreatLevel::Medium),
            "High" => Ok(ThreatLevel::High),
            "Critical" => Ok(ThreatLevel::Critical),
            other => Err(AnalysisError::MalformedReport(format!(
                "unknown threat level: {other:?}"
            ))),
        }
    }
}

/// A validated threat analysis report. All four fields are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatReport {
    pub threat_level: ThreatLevel,
    pub summary: String,
    pub potential_threats: Vec<String>,
    pub recommendations: Vec<String>,
}

impl ThreatReport {
    /// The fail-safe report substituted when analysis fails.
    pub fn failsafe() -> Self {
        Self {
            threat_level: ThreatLevel::Critical,
            summary: "The analysis could not be completed due to an API error.".into(),
            potential_threats: vec![
                "API communication failure.".into(),
                "Model may be unavailable.".into(),
            ],
            recommendations: vec![
                "Check the service logs for errors.".into(),
                "Try again later.".into(),
            ],
        }
    }
}

/// The collaborator's raw payload, before validation. Every field is
/// optional here; [`RawReport::validate`] enforces presence.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReport {
    pub threat_level: Option<String>,
    pub summary: Option<String>,
    pub potential_threats: Option<Vec<String>>,
    pub recommendations: Option<Vec<String>>,
}

impl RawReport {
    /// Validate that all four fields are present and well-formed.
    pub fn validate(self) -> Result<ThreatReport, AnalysisError> {
        let missing =
            |field: &str| AnalysisError::MalformedReport(format!("missing field: {field}"));

        let level: ThreatLevel = self
            .threat_level
            .ok_or_else(|| missing("threatLevel"))?
            .parse()?;

        Ok(ThreatReport {
            threat_level: level,
            summary: self.summary.ok_or_else(|| missing("summary"))?,
            potential_threats: self
                .potential_threats
                .ok_or_else(|| missing("potentialThreats"))?,
            recommendations: self
                .recommendations
                .ok_or_else(|| missing("recommendations"))?,
        })
    }
}

/// Parse and validate a collaborator's JSON payload.
pub fn parse_report(json: &str) -> Result<ThreatReport, AnalysisError> {
    let raw: RawReport = serde_json::from_str(json)
        .map_err(|e| AnalysisError::MalformedReport(e.to_string()))?;
    raw.validate()
}
