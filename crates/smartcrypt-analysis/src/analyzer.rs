//! Threat analyzer abstraction.
//!
//! The analyzer is an opaque external collaborator: given a filename, it
//! returns a report or fails. The engine awaits it once per analysis
//! request and owns cancellation; implementations may call out to a
//! language-model service, a rules engine, or anything else.

use async_trait::async_trait;

use crate::error::Result;
use crate::report::ThreatReport;

/// Analyzer trait for threat assessment.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait ThreatAnalyzer: Send + Sync {
    /// Analyze a filename and produce a report.
    ///
    /// Failures are recovered by the caller into the fail-safe Critical
    /// report; implementations should not substitute it themselves.
    async fn analyze(&self, filename: &str) -> Result<ThreatReport>;
}

/// A scripted in-memory analyzer for testing.
pub mod canned {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::error::AnalysisError;
    use crate::report::ThreatLevel;

    /// In-memory analyzer with per-filename scripted responses.
    ///
    /// Unscripted filenames get a default Low report. A filename can be
    /// scripted to fail, for exercising the fail-safe path, and a latency
    /// can be set to simulate a slow collaborator.
    pub struct CannedAnalyzer {
        responses: Mutex<HashMap<String, Script>>,
        latency: Mutex<std::time::Duration>,
    }

    enum Script {
        Report(ThreatReport),
        Fail(String),
    }

    impl CannedAnalyzer {
        /// Create an analyzer that answers every filename with the
        /// default Low report.
        pub fn new() -> Self {
            Self {
                responses: Mutex::new(HashMap::new()),
                latency: Mutex::new(std::time::Duration::ZERO),
            }
        }

        /// Delay every response by `latency`.
        pub fn set_latency(&self, latency: std::time::Duration) {
            *self.latency.lock().unwrap() = latency;
        }

        /// Script a report for a filename.
        pub fn script_report(&self, filename: &str, report: ThreatReport) {
            self.responses
                .lock()
                .unwrap()
                .insert(filename.to_owned(), Script::Report(report));
        }

        /// Script a failure for a filename.
        pub fn script_failure(&self, filename: &str, reason: &str) {
            self.responses
                .lock()
                .unwrap()
                .insert(filename.to_owned(), Script::Fail(reason.to_owned()));
        }

        fn default_report(filename: &str) -> ThreatReport {
            ThreatReport {
                threat_level: ThreatLevel::Low,
                summary: format!("No obvious risk indicators in {filename:?}."),
                potential_threats: vec![],
                recommendations: vec!["No action required.".into()],
            }
        }
    }

    impl Default for CannedAnalyzer {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl ThreatAnalyzer for CannedAnalyzer {
        async fn analyze(&self, filename: &str) -> Result<ThreatReport> {
            let latency = *self.latency.lock().unwrap();
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            let responses = self.responses.lock().unwrap();
            match responses.get(filename) {
                Some(Script::Report(report)) => Ok(report.clone()),
                Some(Script::Fail(reason)) => {
                    Err(AnalysisError::Unreachable(reason.clone()))
                }
                None => Ok(Self::default_report(filename)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::canned::CannedAnalyzer;
    use super::*;
    use crate::error::AnalysisError;
    use crate::report::ThreatLevel;

    #[tokio::test]
    async fn test_canned_default_is_low() {
        let analyzer = CannedAnalyzer::new();
        let report = analyzer.analyze("notes.txt").await.unwrap();
        assert_eq!(report.threat_level, ThreatLevel::Low);
    }

    #[tokio::test]
    async fn test_canned_scripted_report_and_failure() {
        let analyzer = CannedAnalyzer::new();
        analyzer.script_report(
            "patients.csv",
            ThreatReport {
                threat_level: ThreatLevel::High,
                summary: "Patient records.".into(),
                potential_threats: vec!["PHI exposure".into()],
                recommendations: vec!["Encrypt before sharing".into()],
            },
        );
        analyzer.script_failure("broken.bin", "timeout");

        let report = analyzer.analyze("patients.csv").await.unwrap();
        assert!(report.threat_level.is_elevated());

        let err = analyzer.analyze("broken.bin").await;
        assert!(matches!(err, Err(AnalysisError::Unreachable(_))));
    }
}
