use crate::error::SubmitError;
use crate::models::{VoteOutcome, VoteSubmission};
use async_trait::async_trait;
use log::info;

/// Sends a vote to wherever votes are recorded.
///
/// `Ok(VoteOutcome::Failure { .. })` is a business rejection (closed poll,
/// duplicate vote, ...). `Err` means the call itself failed.
#[async_trait]
pub trait VoteSubmitter: Send + Sync {
    async fn submit(&self, submission: &VoteSubmission) -> Result<VoteOutcome, SubmitError>;
}

/// Fire-and-forget route changes, used to send anonymous visitors to sign in.
pub trait Navigator: Send + Sync {
    fn redirect(&self, route: &str);
}

/// Navigator for the terminal front end: there is nowhere to go, so it logs.
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect(&self, route: &str) {
        info!("Redirecting to {}", route);
    }
}
