mod submitter;

pub use submitter::DatabaseSubmitter;

use crate::error::StoreError;
use crate::models::{Poll, PollOption, VoteSubmission};
use chrono::{DateTime, Utc};
use log::info;
use sqlx::{migrate::MigrateDatabase, sqlite::{SqlitePool, SqlitePoolOptions}, Row, Sqlite};
use uuid::Uuid;

pub struct Database {
    pool: SqlitePool,
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::InvalidTimestamp(format!("{}: {}", raw, e)))
}

impl Database {
    pub async fn new(db_url: &str) -> Result<Self, StoreError> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            info!("Creating database at {}", db_url);
            Sqlite::create_database(db_url).await?;
        }

        // An in-memory database lives only as long as its single connection
        let in_memory = db_url.contains(":memory:");
        let options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = options.connect(db_url).await?;

        Self::init_schema(&pool).await?;

        Ok(Self { pool })
    }

    #[cfg(test)]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn init_schema(pool: &SqlitePool) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS polls (
                id TEXT PRIMARY KEY,
                question TEXT NOT NULL,
                description TEXT,
                created_at TEXT NOT NULL,
                ends_at TEXT,
                is_active BOOLEAN NOT NULL DEFAULT TRUE
            );
            "#,
        )
        .execute(pool)
        .await?;

        // base_votes carries tallies imported with the poll; recorded votes add to it
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS poll_options (
                id TEXT NOT NULL,
                poll_id TEXT NOT NULL,
                text TEXT NOT NULL,
                position INTEGER NOT NULL,
                base_votes INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (poll_id, id),
                FOREIGN KEY (poll_id) REFERENCES polls(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS votes (
                id TEXT PRIMARY KEY,
                poll_id TEXT NOT NULL,
                option_id TEXT NOT NULL,
                voter_id TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                UNIQUE (poll_id, voter_id),
                FOREIGN KEY (poll_id, option_id) REFERENCES poll_options(poll_id, id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn create_poll(&self, poll: &Poll) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO polls (id, question, description, created_at, ends_at, is_active)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&poll.id)
        .bind(&poll.question)
        .bind(&poll.description)
        .bind(poll.created_at.to_rfc3339())
        .bind(poll.ends_at.map(|dt| dt.to_rfc3339()))
        .bind(poll.is_active)
        .execute(&mut *tx)
        .await?;

        for (i, option) in poll.options.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO poll_options (id, poll_id, text, position, base_votes)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&option.id)
            .bind(&poll.id)
            .bind(&option.text)
            .bind(i as i64)
            .bind(option.votes as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Inserts each poll that is not stored yet. Returns how many were added.
    pub async fn seed_polls(&self, polls: &[Poll]) -> Result<usize, StoreError> {
        let mut added = 0;
        for poll in polls {
            if self.get_poll(&poll.id).await?.is_none() {
                self.create_poll(poll).await?;
                added += 1;
            }
        }
        if added > 0 {
            info!("Seeded {} poll(s)", added);
        }
        Ok(added)
    }

    pub async fn get_poll(&self, poll_id: &str) -> Result<Option<Poll>, StoreError> {
        let poll_row = sqlx::query(
            r#"
            SELECT id, question, description, created_at, ends_at, is_active
            FROM polls
            WHERE id = ?
            "#,
        )
        .bind(poll_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(poll_row) = poll_row else {
            return Ok(None);
        };

        let created_at = parse_timestamp(&poll_row.get::<String, _>("created_at"))?;
        let ends_at = match poll_row.get::<Option<String>, _>("ends_at") {
            Some(raw) => Some(parse_timestamp(&raw)?),
            None => None,
        };

        let options: Vec<PollOption> = sqlx::query(
            r#"
            SELECT o.id, o.text, o.base_votes + COUNT(v.id) AS votes
            FROM poll_options o
            LEFT JOIN votes v ON v.poll_id = o.poll_id AND v.option_id = o.id
            WHERE o.poll_id = ?
            GROUP BY o.poll_id, o.id
            ORDER BY o.position
            "#,
        )
        .bind(poll_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| PollOption {
            id: row.get::<String, _>("id"),
            text: row.get::<String, _>("text"),
            votes: row.get::<i64, _>("votes").max(0) as u64,
        })
        .collect();

        let total_votes = options.iter().map(|o| o.votes).sum();

        Ok(Some(Poll {
            id: poll_row.get("id"),
            question: poll_row.get("question"),
            description: poll_row.get("description"),
            options,
            total_votes,
            created_at,
            ends_at,
            is_active: poll_row.get::<bool, _>("is_active"),
        }))
    }

    pub async fn list_polls(&self) -> Result<Vec<Poll>, StoreError> {
        let ids: Vec<String> = sqlx::query("SELECT id FROM polls ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|row| row.get::<String, _>("id"))
            .collect();

        let mut polls = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(poll) = self.get_poll(&id).await? {
                polls.push(poll);
            }
        }
        Ok(polls)
    }

    pub async fn has_voted(&self, poll_id: &str, voter_id: &str) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM votes WHERE poll_id = ? AND voter_id = ?")
            .bind(poll_id)
            .bind(voter_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Stores a vote and returns its id. Fails with a unique violation if the
    /// voter already voted in this poll.
    pub async fn record_vote(&self, submission: &VoteSubmission) -> Result<String, sqlx::Error> {
        let vote_id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO votes (id, poll_id, option_id, voter_id, timestamp)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&vote_id)
        .bind(&submission.poll_id)
        .bind(&submission.option_id)
        .bind(&submission.voter_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(vote_id)
    }

    // End a poll (set is_active = false)
    pub async fn end_poll(&self, poll_id: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE polls
            SET is_active = FALSE
            WHERE id = ? AND is_active = TRUE
            "#,
        )
        .bind(poll_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryPollStore;

    async fn seeded() -> Database {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let polls = MemoryPollStore::sample().unwrap().all();
        db.seed_polls(&polls).await.unwrap();
        db
    }

    #[tokio::test]
    async fn round_trips_seeded_poll() {
        let db = seeded().await;
        let poll = db.get_poll("1").await.unwrap().unwrap();

        assert_eq!(poll.question, "What is your favorite programming language?");
        assert_eq!(poll.options.len(), 4);
        assert_eq!(poll.options[0].id, "1a");
        assert_eq!(poll.options[0].votes, 42);
        assert_eq!(poll.total_votes, 130);
        assert!(poll.is_active);
        assert!(poll.description.is_some());
    }

    #[tokio::test]
    async fn seeding_twice_adds_nothing() {
        let db = seeded().await;
        let polls = MemoryPollStore::sample().unwrap().all();
        assert_eq!(db.seed_polls(&polls).await.unwrap(), 0);
        assert_eq!(db.list_polls().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn recorded_vote_adds_to_tally() {
        let db = seeded().await;
        let submission = VoteSubmission::new("2", "2b", "alice");

        let vote_id = db.record_vote(&submission).await.unwrap();
        assert!(!vote_id.is_empty());
        assert!(db.has_voted("2", "alice").await.unwrap());
        assert!(!db.has_voted("2", "bob").await.unwrap());

        let poll = db.get_poll("2").await.unwrap().unwrap();
        assert_eq!(poll.option("2b").unwrap().votes, 20);
        assert_eq!(poll.total_votes, 73);
    }

    #[tokio::test]
    async fn duplicate_vote_is_unique_violation() {
        let db = seeded().await;
        db.record_vote(&VoteSubmission::new("1", "1a", "alice")).await.unwrap();

        let err = db
            .record_vote(&VoteSubmission::new("1", "1b", "alice"))
            .await
            .unwrap_err();
        let is_unique = matches!(&err, sqlx::Error::Database(e) if e.is_unique_violation());
        assert!(is_unique, "unexpected error: {}", err);
    }

    #[tokio::test]
    async fn end_poll_marks_inactive() {
        let db = seeded().await;
        db.end_poll("1").await.unwrap();
        assert!(!db.get_poll("1").await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn unknown_poll_is_none() {
        let db = seeded().await;
        assert!(db.get_poll("nope").await.unwrap().is_none());
    }
}
