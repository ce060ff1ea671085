use crate::config::Config;
use crate::db::Database;
use crate::lifecycle::{
    ErrorBanner, FailureKind, Navigator, SubmitResult, VoteForm, VoteLifecycleController, VoteStatus,
    VoteSubmitter,
};
use crate::models::{AuthState, Poll, User};
use crate::store::{MemoryPollStore, PollStore};
use crate::voting::{format_created_date, plurality};
use log::{error, info};
use std::sync::Arc;

/// One visit to a poll: the poll snapshot, who is signed in, and the vote lifecycle.
pub struct PollPage {
    poll: Poll,
    store: Arc<MemoryPollStore>,
    database: Arc<Database>,
    controller: VoteLifecycleController,
    auth: AuthState,
}

impl PollPage {
    /// Returns `None` when the store has no such poll.
    pub fn open(
        poll_id: &str,
        store: Arc<MemoryPollStore>,
        database: Arc<Database>,
        submitter: Arc<dyn VoteSubmitter>,
        navigator: Arc<dyn Navigator>,
        config: &Config,
    ) -> Option<Self> {
        let poll = store.lookup(poll_id)?;
        let controller = VoteLifecycleController::new(
            &poll.id,
            submitter,
            navigator,
            &config.sign_in_route,
            config.results_delay,
        );
        info!("Opened poll page for {}", poll.id);
        Some(Self {
            poll,
            store,
            database,
            controller,
            auth: AuthState::signed_out(),
        })
    }

    #[cfg(test)]
    pub fn poll(&self) -> &Poll {
        &self.poll
    }

    pub fn status(&self) -> VoteStatus {
        self.controller.status()
    }

    pub fn sign_in(&mut self, name: &str) -> String {
        let name = name.trim();
        if name.is_empty() {
            return "Usage: signin <name>".to_string();
        }
        self.auth = AuthState::signed_in(User {
            id: name.to_lowercase(),
            name: name.to_string(),
        });
        format!("Signed in as {}.", name)
    }

    pub fn sign_out(&mut self) -> String {
        self.auth = AuthState::signed_out();
        "Signed out.".to_string()
    }

    /// Maps a typed choice (option id or 1-based position) to an option id.
    fn resolve_option(&self, choice: &str) -> String {
        let choice = choice.trim();
        if self.poll.option(choice).is_some() {
            return choice.to_string();
        }
        choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.poll.options.get(i))
            .map(|option| option.id.clone())
            .unwrap_or_else(|| choice.to_string())
    }

    pub fn select(&mut self, choice: &str) -> String {
        let option_id = self.resolve_option(choice);
        let form = match VoteForm::parse(&self.poll, &option_id) {
            Ok(form) => form,
            Err(e) => return capitalize(&e.to_string()),
        };
        if !self.controller.select_option(form.option_id()) {
            return "You can only change your selection while voting.".to_string();
        }
        self.render()
    }

    /// Submits the given choice, or the current selection when `choice` is `None`.
    pub async fn vote(&mut self, choice: Option<&str>) -> String {
        let option_id = match choice {
            Some(choice) => self.resolve_option(choice),
            None => self.controller.selected_option().unwrap_or_default(),
        };
        let form = match VoteForm::parse(&self.poll, &option_id) {
            Ok(form) => form,
            Err(e) => return capitalize(&e.to_string()),
        };

        match self.controller.submit_vote(&form, &self.auth).await {
            SubmitResult::AuthPending => "Still checking your session, try again in a moment.".to_string(),
            SubmitResult::AuthRequired => "You need to sign in to vote. Use `signin <name>`.".to_string(),
            SubmitResult::Ignored => "A vote is already in progress.".to_string(),
            SubmitResult::Voted { .. } | SubmitResult::Rejected(_) => self.render(),
        }
    }

    /// Renders the current screen. Once the results are showing, the poll is
    /// reloaded first so the tallies include the visitor's vote.
    pub async fn show(&mut self) -> String {
        if matches!(self.controller.status(), VoteStatus::Results { .. }) {
            self.refresh().await;
        }
        self.render()
    }

    async fn refresh(&mut self) {
        match self.database.get_poll(&self.poll.id).await {
            Ok(Some(poll)) => {
                self.store.upsert(poll.clone());
                self.poll = poll;
            }
            Ok(None) => error!("Poll {} disappeared from the database", self.poll.id),
            Err(e) => error!("Failed to refresh poll {}: {}", self.poll.id, e),
        }
    }

    pub fn retry(&mut self) -> String {
        if self.controller.retry() {
            self.render()
        } else {
            "Nothing to retry.".to_string()
        }
    }

    pub fn dismiss(&mut self) -> String {
        if self.controller.dismiss_error() {
            self.render()
        } else {
            "No error to dismiss.".to_string()
        }
    }

    pub fn vote_again(&mut self) -> String {
        if self.controller.vote_again() {
            self.render()
        } else {
            "Please wait for your vote to finish submitting.".to_string()
        }
    }

    pub fn render(&self) -> String {
        match self.controller.status() {
            VoteStatus::Voting { .. } => self.render_form(self.controller.error().as_ref()),
            VoteStatus::Submitting { .. } => "Submitting your vote...".to_string(),
            VoteStatus::Voted { .. } => "Thank you for voting! Your vote has been recorded.".to_string(),
            VoteStatus::Results { .. } => {
                self.render_results(self.controller.last_submitted_option().as_deref())
            }
        }
    }

    fn render_form(&self, error: Option<&ErrorBanner>) -> String {
        let mut out = String::new();
        if let Some(banner) = error {
            let label = match banner.kind {
                FailureKind::BusinessRejection => "Vote not accepted",
                FailureKind::TransportFailure => "Error",
            };
            out.push_str(&format!("[{}] {}\n  {}\n", label, banner.message, banner.detail));
            out.push_str("  (type `retry` to try again or `dismiss` to hide this)\n\n");
        }

        out.push_str(&format!("**{}**\n", self.poll.question));
        if let Some(description) = &self.poll.description {
            out.push_str(description);
            out.push('\n');
        }
        out.push_str(&format!("Created {}\n\n", format_created_date(self.poll.created_at)));

        let selected = self.controller.selected_option();
        for (i, option) in self.poll.options.iter().enumerate() {
            let mark = if selected.as_deref() == Some(option.id.as_str()) { "(x)" } else { "( )" };
            out.push_str(&format!("{} {}. {} [{}]\n", mark, i + 1, option.text, option.id));
        }

        let who = match &self.auth.current_user {
            Some(user) => format!("Voting as {}.", user.name),
            None => "Sign in to vote.".to_string(),
        };
        out.push_str(&format!("\n{} Use `vote <number>` to cast your vote.", who));
        out
    }

    fn render_results(&self, your_vote: Option<&str>) -> String {
        let results = plurality::calculate_results(&self.poll, your_vote);
        let mut out = format!("**{}** results\nLeading: {}\n\n", self.poll.question, results.winner);
        for count in &results.raw_results {
            let bar = "#".repeat((count.percentage / 5) as usize);
            out.push_str(&format!("{}. {:>3}% {:<20} {}\n", count.rank, count.percentage, bar, count.option_text));
        }
        out.push('\n');
        out.push_str(&results.summary);
        out.push_str("\n\nType `again` to vote again.");
        out
    }

    pub fn close(&self) {
        self.controller.teardown();
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
