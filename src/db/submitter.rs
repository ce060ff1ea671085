use crate::db::Database;
use crate::error::{StoreError, SubmitError};
use crate::lifecycle::VoteSubmitter;
use crate::models::{VoteOutcome, VoteSubmission};
use async_trait::async_trait;
use chrono::Utc;
use log::{info, warn};
use std::sync::Arc;

/// Records votes in the local database, rejecting the ones the poll cannot accept.
pub struct DatabaseSubmitter {
    database: Arc<Database>,
}

impl DatabaseSubmitter {
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }
}

fn reject(message: &str, detail: String) -> VoteOutcome {
    VoteOutcome::Failure {
        message: message.to_string(),
        detail: Some(detail),
    }
}

#[async_trait]
impl VoteSubmitter for DatabaseSubmitter {
    async fn submit(&self, submission: &VoteSubmission) -> Result<VoteOutcome, SubmitError> {
        let poll = match self.database.get_poll(&submission.poll_id).await {
            Ok(Some(poll)) => poll,
            Ok(None) => {
                warn!("Vote for unknown poll {}", submission.poll_id);
                return Ok(reject(
                    "Poll not found",
                    format!("No poll with id {}", submission.poll_id),
                ));
            }
            Err(StoreError::Database(e)) => return Err(SubmitError::Database(e)),
            Err(e) => return Err(SubmitError::Unavailable(e.to_string())),
        };

        if !poll.is_open_at(Utc::now()) {
            if poll.is_active {
                info!("Poll {} passed its end time, closing it", poll.id);
                if let Err(e) = self.database.end_poll(&poll.id).await {
                    warn!("Failed to close poll {}: {}", poll.id, e);
                }
            }
            return Ok(reject(
                "This poll is closed",
                format!("Poll {} is no longer accepting votes", poll.id),
            ));
        }

        if poll.option(&submission.option_id).is_none() {
            return Ok(reject(
                "Invalid option",
                format!("Option {} is not part of poll {}", submission.option_id, poll.id),
            ));
        }

        let duplicate = reject(
            "You have already voted in this poll",
            format!("Voter {} already has a vote in poll {}", submission.voter_id, poll.id),
        );
        if self.database.has_voted(&poll.id, &submission.voter_id).await? {
            return Ok(duplicate);
        }

        match self.database.record_vote(submission).await {
            Ok(vote_id) => {
                info!("Stored vote {} for poll {}", vote_id, poll.id);
                Ok(VoteOutcome::Success { vote_id })
            }
            // Lost a race with another vote from the same voter
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(duplicate),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryPollStore;

    async fn submitter() -> (DatabaseSubmitter, Arc<Database>) {
        let db = Arc::new(Database::new("sqlite::memory:").await.unwrap());
        db.seed_polls(&MemoryPollStore::sample().unwrap().all())
            .await
            .unwrap();
        (DatabaseSubmitter::new(Arc::clone(&db)), db)
    }

    fn failure_message(outcome: VoteOutcome) -> String {
        match outcome {
            VoteOutcome::Failure { message, .. } => message,
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn accepts_first_vote() {
        let (submitter, db) = submitter().await;
        let outcome = submitter
            .submit(&VoteSubmission::new("1", "1d", "alice"))
            .await
            .unwrap();

        assert!(matches!(outcome, VoteOutcome::Success { .. }));
        assert_eq!(db.get_poll("1").await.unwrap().unwrap().option("1d").unwrap().votes, 16);
    }

    #[tokio::test]
    async fn rejects_second_vote_from_same_voter() {
        let (submitter, _db) = submitter().await;
        submitter.submit(&VoteSubmission::new("1", "1a", "alice")).await.unwrap();

        let outcome = submitter
            .submit(&VoteSubmission::new("1", "1b", "alice"))
            .await
            .unwrap();
        assert_eq!(failure_message(outcome), "You have already voted in this poll");
    }

    #[tokio::test]
    async fn rejects_closed_poll() {
        let (submitter, _db) = submitter().await;
        let outcome = submitter
            .submit(&VoteSubmission::new("3", "3a", "alice"))
            .await
            .unwrap();
        assert_eq!(failure_message(outcome), "This poll is closed");
    }

    #[tokio::test]
    async fn expired_poll_is_rejected_and_closed() {
        let (submitter, db) = submitter().await;
        let mut poll = db.get_poll("2").await.unwrap().unwrap();
        poll.id = "expired".to_string();
        poll.ends_at = Some(Utc::now() - chrono::Duration::minutes(5));
        db.create_poll(&poll).await.unwrap();

        let outcome = submitter
            .submit(&VoteSubmission::new("expired", "2a", "alice"))
            .await
            .unwrap();

        assert_eq!(failure_message(outcome), "This poll is closed");
        assert!(!db.get_poll("expired").await.unwrap().unwrap().is_active);
        assert!(!db.has_voted("expired", "alice").await.unwrap());
    }

    #[tokio::test]
    async fn rejects_option_from_another_poll() {
        let (submitter, _db) = submitter().await;
        let outcome = submitter
            .submit(&VoteSubmission::new("1", "2a", "alice"))
            .await
            .unwrap();
        assert_eq!(failure_message(outcome), "Invalid option");
    }

    #[tokio::test]
    async fn rejects_unknown_poll() {
        let (submitter, _db) = submitter().await;
        let outcome = submitter
            .submit(&VoteSubmission::new("99", "1a", "alice"))
            .await
            .unwrap();
        assert_eq!(failure_message(outcome), "Poll not found");
    }

    #[tokio::test]
    async fn closed_database_is_transport_failure() {
        let (submitter, db) = submitter().await;
        db.pool().close().await;

        let result = submitter.submit(&VoteSubmission::new("1", "1a", "alice")).await;
        assert!(matches!(result, Err(SubmitError::Database(_))));
    }
}
