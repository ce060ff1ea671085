use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poll {
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub description: Option<String>,
    pub options: Vec<PollOption>,
    pub total_votes: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollOption {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub votes: u64,
}

/// One submit attempt, sent to the vote submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteSubmission {
    pub poll_id: String,
    pub option_id: String,
    pub voter_id: String,
}

/// What the submitter reports back for a structured (non-transport) result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteOutcome {
    Success { vote_id: String },
    Failure { message: String, detail: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
}

/// Snapshot of the authentication provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub current_user: Option<User>,
    pub loading: bool,
}

impl Poll {
    pub fn option(&self, option_id: &str) -> Option<&PollOption> {
        self.options.iter().find(|option| option.id == option_id)
    }

    /// A poll accepts votes while it is active and its end time (if any) is in the future.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.ends_at.map_or(true, |ends_at| ends_at > now)
    }
}

impl VoteSubmission {
    pub fn new(poll_id: &str, option_id: &str, voter_id: &str) -> Self {
        Self {
            poll_id: poll_id.to_string(),
            option_id: option_id.to_string(),
            voter_id: voter_id.to_string(),
        }
    }
}

impl AuthState {
    pub fn signed_in(user: User) -> Self {
        Self {
            current_user: Some(user),
            loading: false,
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }
}
