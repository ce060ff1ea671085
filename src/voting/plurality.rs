use crate::models::Poll;
use crate::voting::{percentage_of, rank_options, PollResults, VoteCount};

/// Builds the results view for a single-choice poll from its stored counts.
///
/// `your_vote` marks the option the current visitor just voted for.
pub fn calculate_results(poll: &Poll, your_vote: Option<&str>) -> PollResults {
    let ranked = rank_options(&poll.options);

    let raw_results: Vec<VoteCount> = ranked
        .iter()
        .enumerate()
        .map(|(i, option)| VoteCount {
            option_id: option.id.clone(),
            option_text: option.text.clone(),
            votes: option.votes,
            percentage: percentage_of(option.votes, poll.total_votes),
            rank: i + 1,
            is_your_vote: your_vote == Some(option.id.as_str()),
        })
        .collect();

    // No votes cast, or nothing to vote on
    let Some(winner) = raw_results.first().filter(|_| poll.total_votes > 0) else {
        return PollResults {
            winner: "No votes were cast".to_string(),
            summary: "No votes were cast in this poll.".to_string(),
            raw_results,
        };
    };
    let mut summary = String::new();

    for count in &raw_results {
        let marker = if count.is_your_vote { " (your vote)" } else { "" };
        let line = if count.option_id == winner.option_id {
            format!("**{}**: {} votes ({}%){}", count.option_text, count.votes, count.percentage, marker)
        } else {
            format!("{}: {} votes ({}%){}", count.option_text, count.votes, count.percentage, marker)
        };
        summary.push_str(&line);
        summary.push('\n');
    }

    let noun = if poll.total_votes == 1 { "vote" } else { "votes" };
    summary.push_str(&format!("\n{} {} cast.", poll.total_votes, noun));

    PollResults {
        winner: winner.option_text.clone(),
        summary,
        raw_results,
    }
}
