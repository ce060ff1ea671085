pub mod percentage;
pub mod plurality;

pub use percentage::{format_created_date, percentage_of, rank_options};

// Generic structure for poll results
#[derive(Debug, Clone)]
pub struct PollResults {
    pub winner: String,        // Text of the leading option
    pub summary: String,       // Detailed results as formatted text
    pub raw_results: Vec<VoteCount>, // Ranked counts for all options
}

// Structure to hold vote counts
#[derive(Debug, Clone, serde::Serialize)]
pub struct VoteCount {
    pub option_id: String,
    pub option_text: String,
    pub votes: u64,
    pub percentage: u32,
    pub rank: usize,
    pub is_your_vote: bool,
}
