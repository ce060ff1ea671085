pub mod form;
pub mod ports;

pub use form::VoteForm;
pub use ports::{LogNavigator, Navigator, VoteSubmitter};

use crate::models::{AuthState, VoteOutcome, VoteSubmission};
use crate::tasks::ResultsReveal;
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

/// Shown when the submitter rejects a vote without saying why.
pub const UNKNOWN_ERROR_DETAIL: &str = "Unknown error occurred";
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred while submitting your vote";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    BusinessRejection,
    TransportFailure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBanner {
    pub kind: FailureKind,
    pub message: String,
    pub detail: String,
}

/// What the poll page is currently showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteStatus {
    Voting { error: Option<ErrorBanner> },
    Submitting { option_id: String },
    Voted { option_id: String },
    Results { option_id: String },
}

/// How a `submit_vote` call settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitResult {
    /// Auth provider has not settled yet; nothing happened.
    AuthPending,
    /// No signed-in user; the navigator was sent to the sign-in route.
    AuthRequired,
    /// Not in the voting state (e.g. a submission is already in flight).
    Ignored,
    Voted { vote_id: String },
    Rejected(ErrorBanner),
}

struct Inner {
    status: VoteStatus,
    draft: Option<String>,
    // Bumped whenever a pending reveal must no longer apply.
    epoch: u64,
    reveal: Option<ResultsReveal>,
}

impl Inner {
    fn cancel_reveal(&mut self) {
        self.epoch += 1;
        if let Some(reveal) = self.reveal.take() {
            reveal.cancel();
        }
    }
}

/// Drives one visit to a poll page: voting, submitting, the thank-you
/// screen and finally the results.
///
/// The controller owns all of its state; nothing survives it. State sits behind
/// a mutex that is never held across an await, so the scheduled reveal and
/// the page can both touch it.
pub struct VoteLifecycleController {
    poll_id: String,
    submitter: Arc<dyn VoteSubmitter>,
    navigator: Arc<dyn Navigator>,
    sign_in_route: String,
    results_delay: Duration,
    inner: Arc<Mutex<Inner>>,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Reopens the form if a submission future is dropped before it settles.
struct SubmittingGuard<'a> {
    inner: &'a Mutex<Inner>,
    armed: bool,
}

impl SubmittingGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = lock(self.inner);
        if matches!(inner.status, VoteStatus::Submitting { .. }) {
            warn!("Vote submission abandoned before it settled, reopening the form");
            inner.status = VoteStatus::Voting { error: None };
        }
    }
}

impl VoteLifecycleController {
    pub fn new(
        poll_id: &str,
        submitter: Arc<dyn VoteSubmitter>,
        navigator: Arc<dyn Navigator>,
        sign_in_route: &str,
        results_delay: Duration,
    ) -> Self {
        Self {
            poll_id: poll_id.to_string(),
            submitter,
            navigator,
            sign_in_route: sign_in_route.to_string(),
            results_delay,
            inner: Arc::new(Mutex::new(Inner {
                status: VoteStatus::Voting { error: None },
                draft: None,
                epoch: 0,
                reveal: None,
            })),
        }
    }

    pub fn status(&self) -> VoteStatus {
        lock(&self.inner).status.clone()
    }

    pub fn last_submitted_option(&self) -> Option<String> {
        match &lock(&self.inner).status {
            VoteStatus::Voted { option_id } | VoteStatus::Results { option_id } => Some(option_id.clone()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<ErrorBanner> {
        match &lock(&self.inner).status {
            VoteStatus::Voting { error } => error.clone(),
            _ => None,
        }
    }

    /// Remembers the option picked in the form. Only possible while voting.
    pub fn select_option(&self, option_id: &str) -> bool {
        let mut inner = lock(&self.inner);
        if !matches!(inner.status, VoteStatus::Voting { .. }) {
            return false;
        }
        inner.draft = Some(option_id.to_string());
        true
    }

    pub fn selected_option(&self) -> Option<String> {
        lock(&self.inner).draft.clone()
    }

    pub async fn submit_vote(&self, form: &VoteForm, auth: &AuthState) -> SubmitResult {
        if auth.loading {
            debug!("Ignoring vote for poll {} while auth is loading", self.poll_id);
            return SubmitResult::AuthPending;
        }
        let user = match &auth.current_user {
            Some(user) => user,
            None => {
                let route = format!("{}?callbackUrl=/polls/{}", self.sign_in_route, self.poll_id);
                info!("Anonymous vote attempt on poll {}, redirecting to sign in", self.poll_id);
                self.navigator.redirect(&route);
                return SubmitResult::AuthRequired;
            }
        };

        let submission = VoteSubmission::new(&self.poll_id, form.option_id(), &user.id);
        {
            let mut inner = lock(&self.inner);
            if !matches!(inner.status, VoteStatus::Voting { .. }) {
                warn!("Ignoring vote for poll {}: not in voting state", self.poll_id);
                return SubmitResult::Ignored;
            }
            inner.status = VoteStatus::Submitting {
                option_id: submission.option_id.clone(),
            };
        }

        info!(
            "Submitting vote: poll_id={}, option_id={}, voter_id={}",
            submission.poll_id, submission.option_id, submission.voter_id
        );
        let guard = SubmittingGuard {
            inner: &self.inner,
            armed: true,
        };
        let result = self.submitter.submit(&submission).await;
        guard.disarm();

        let mut inner = lock(&self.inner);
        match result {
            Ok(VoteOutcome::Success { vote_id }) => {
                info!("Vote {} recorded for poll {}", vote_id, self.poll_id);
                inner.status = VoteStatus::Voted {
                    option_id: submission.option_id,
                };
                inner.draft = None;
                self.schedule_reveal(&mut inner);
                SubmitResult::Voted { vote_id }
            }
            Ok(VoteOutcome::Failure { message, detail }) => {
                warn!("Vote rejected for poll {}: {}", self.poll_id, message);
                let banner = ErrorBanner {
                    kind: FailureKind::BusinessRejection,
                    message,
                    detail: detail.unwrap_or_else(|| UNKNOWN_ERROR_DETAIL.to_string()),
                };
                inner.status = VoteStatus::Voting {
                    error: Some(banner.clone()),
                };
                SubmitResult::Rejected(banner)
            }
            Err(e) => {
                error!("Vote submission failed for poll {}: {}", self.poll_id, e);
                let banner = ErrorBanner {
                    kind: FailureKind::TransportFailure,
                    message: UNEXPECTED_ERROR_MESSAGE.to_string(),
                    detail: e.to_string(),
                };
                inner.status = VoteStatus::Voting {
                    error: Some(banner.clone()),
                };
                SubmitResult::Rejected(banner)
            }
        }
    }

    fn schedule_reveal(&self, inner: &mut Inner) {
        inner.cancel_reveal();
        let epoch = inner.epoch;
        let state: Weak<Mutex<Inner>> = Arc::downgrade(&self.inner);
        let poll_id = self.poll_id.clone();

        inner.reveal = Some(ResultsReveal::schedule(self.results_delay, move || {
            let Some(state) = state.upgrade() else {
                return;
            };
            let mut inner = lock(&state);
            if inner.epoch != epoch {
                return;
            }
            if let VoteStatus::Voted { option_id } = &inner.status {
                debug!("Showing results for poll {}", poll_id);
                inner.status = VoteStatus::Results {
                    option_id: option_id.clone(),
                };
            }
        }));
    }

    /// Clears the displayed error and reopens the form. No-op without an error.
    pub fn retry(&self) -> bool {
        let mut inner = lock(&self.inner);
        match &inner.status {
            VoteStatus::Voting { error: Some(_) } => {
                inner.status = VoteStatus::Voting { error: None };
                true
            }
            _ => false,
        }
    }

    /// Starts over from an empty form. Refused while a submission is in flight.
    pub fn vote_again(&self) -> bool {
        let mut inner = lock(&self.inner);
        if matches!(inner.status, VoteStatus::Submitting { .. }) {
            warn!("Cannot vote again on poll {} while a vote is submitting", self.poll_id);
            return false;
        }
        inner.cancel_reveal();
        inner.status = VoteStatus::Voting { error: None };
        inner.draft = None;
        info!("Voting again on poll {}", self.poll_id);
        true
    }

    pub fn dismiss_error(&self) -> bool {
        let mut inner = lock(&self.inner);
        match &mut inner.status {
            VoteStatus::Voting { error } => error.take().is_some(),
            _ => false,
        }
    }

    /// Cancels the pending reveal. The page is going away.
    pub fn teardown(&self) {
        lock(&self.inner).cancel_reveal();
    }
}

impl Drop for VoteLifecycleController {
    fn drop(&mut self) {
        self.teardown();
    }
}
