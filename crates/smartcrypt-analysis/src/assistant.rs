//! Help-desk assistant abstraction.
//!
//! The assistant drafts an initial response to a user's support request.
//! The engine forwards the request, stores nothing from the exchange, and
//! notifies administrators regardless of the reply's content.

use async_trait::async_trait;

use crate::error::Result;

/// Assistant trait for the help-desk flow.
#[async_trait]
pub trait SupportAssistant: Send + Sync {
    /// Produce an initial response to a user's message.
    async fn respond(&self, message: &str) -> Result<String>;
}

/// A scripted in-memory assistant for testing.
pub mod canned {
    use std::sync::Mutex;

    use super::*;
    use crate::error::AnalysisError;

    /// In-memory assistant returning a fixed reply, or a scripted failure.
    pub struct CannedAssistant {
        reply: Mutex<Result<String>>,
    }

    impl CannedAssistant {
        /// Create an assistant that always answers with `reply`.
        pub fn new(reply: &str) -> Self {
            Self {
                reply: Mutex::new(Ok(reply.to_owned())),
            }
        }

        /// Make subsequent calls fail.
        pub fn fail_with(&self, reason: &str) {
            *self.reply.lock().unwrap() =
                Err(AnalysisError::Unreachable(reason.to_owned()));
        }
    }

    #[async_trait]
    impl SupportAssistant for CannedAssistant {
        async fn respond(&self, _message: &str) -> Result<String> {
            match &*self.reply.lock().unwrap() {
                Ok(reply) => Ok(reply.clone()),
                Err(AnalysisError::Unreachable(reason)) => {
                    Err(AnalysisError::Unreachable(reason.clone()))
                }
                Err(AnalysisError::MalformedReport(reason)) => {
                    Err(AnalysisError::MalformedReport(reason.clone()))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::canned::CannedAssistant;
    use super::*;
    use crate::error::AnalysisError;

    #[tokio::test]
    async fn test_canned_reply_and_failure() {
        let assistant = CannedAssistant::new("We are looking into it.");
        assert_eq!(
            assistant.respond("help").await.unwrap(),
            "We are looking into it."
        );

        assistant.fail_with("offline");
        assert!(matches!(
            assistant.respond("help").await,
            Err(AnalysisError::Unreachable(_))
        ));
    }
}
