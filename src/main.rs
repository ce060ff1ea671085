mod config;
mod db;
mod error;
mod handlers;
mod lifecycle;
mod models;
mod store;
mod tasks;
mod voting;

use config::Config;
use db::{Database, DatabaseSubmitter};
use handlers::{Flow, PollPage};
use lifecycle::LogNavigator;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use store::MemoryPollStore;
use tokio::io::{AsyncBufReadExt, BufReader};

const STATUS_CHECK_MILLIS: u64 = 100;

#[tokio::main]
async fn main() {
    // Initialize logging
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return;
        }
    };

    let store = match MemoryPollStore::sample() {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Failed to load sample polls: {}", e);
            return;
        }
    };

    // Initialize database
    let database = match Database::new(&config.database_url).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return;
        }
    };

    if let Err(e) = sync_store(&database, &store).await {
        error!("Failed to load polls from the database: {}", e);
        return;
    }

    let poll_id = match config.poll_id.clone().or_else(|| store.all().first().map(|p| p.id.clone())) {
        Some(id) => id,
        None => {
            error!("No polls available");
            return;
        }
    };

    let submitter = Arc::new(DatabaseSubmitter::new(Arc::clone(&database)));
    let mut page = match PollPage::open(
        &poll_id,
        Arc::clone(&store),
        Arc::clone(&database),
        submitter,
        Arc::new(LogNavigator),
        &config,
    ) {
        Some(page) => page,
        None => {
            println!("Poll {} not found.", poll_id);
            return;
        }
    };

    if let Some(voter) = &config.voter_id {
        info!("{}", page.sign_in(voter));
    }

    println!("{}\n\nType `help` for commands.", page.render());
    run(&mut page).await;
    info!("Leaving poll {}", poll_id);
}

/// Seeds the database with the sample polls, then refreshes the in-memory
/// snapshots so they include votes recorded in earlier sessions.
async fn sync_store(database: &Database, store: &MemoryPollStore) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    database.seed_polls(&store.all()).await?;
    for poll in database.list_polls().await? {
        store.upsert(poll);
    }
    Ok(())
}

async fn run(page: &mut PollPage) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_millis(STATUS_CHECK_MILLIS));
    let mut last_status = page.status();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        page.close();
                        break;
                    }
                    Err(e) => {
                        error!("Failed to read input: {}", e);
                        page.close();
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                let Some(command) = handlers::parse_command(&line) else {
                    warn!("Unknown command: {}", line.trim());
                    println!("Unknown command. Type `help` for a list.");
                    continue;
                };
                match handlers::handle_command(page, command).await {
                    Flow::Continue(reply) => println!("{}", reply),
                    Flow::Quit => break,
                }
                last_status = page.status();
            }
            _ = ticker.tick() => {
                // The thank-you screen flips to results on its own
                let status = page.status();
                if status != last_status {
                    println!("{}", page.show().await);
                    last_status = status;
                }
            }
        }
    }
}
