use crate::models::PollOption;
use chrono::{DateTime, Utc};

/// Share of `total_votes` held by `option_votes`, as a whole percent.
///
/// Rounds half away from zero (12.5% -> 13%). Returns 0 when no votes were
/// cast. Counts larger than the total are not clamped.
pub fn percentage_of(option_votes: u64, total_votes: u64) -> u32 {
    if total_votes == 0 {
        return 0;
    }
    let numerator = option_votes as u128 * 200 + total_votes as u128;
    let rounded = numerator / (total_votes as u128 * 2);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

/// Options ordered by vote count, highest first. Ties keep their poll order.
pub fn rank_options(options: &[PollOption]) -> Vec<&PollOption> {
    let mut ranked: Vec<&PollOption> = options.iter().collect();
    // sort_by is stable
    ranked.sort_by(|a, b| b.votes.cmp(&a.votes));
    ranked
}

pub fn format_created_date(created_at: DateTime<Utc>) -> String {
    created_at.format("%B %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn option(id: &str, votes: u64) -> PollOption {
        PollOption {
            id: id.to_string(),
            text: id.to_uppercase(),
            votes,
        }
    }

    #[test]
    fn zero_total_is_zero_percent() {
        for votes in [0, 1, 7, 1_000] {
            assert_eq!(percentage_of(votes, 0), 0);
        }
    }

    #[test]
    fn percentages_stay_within_bounds() {
        for total in 1..=40u64 {
            for votes in 0..=total {
                let pct = percentage_of(votes, total);
                assert!(pct <= 100, "{}/{} gave {}", votes, total, pct);
            }
        }
        assert_eq!(percentage_of(0, 9), 0);
        assert_eq!(percentage_of(9, 9), 100);
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(percentage_of(1, 8), 13); // 12.5
        assert_eq!(percentage_of(1, 3), 33);
        assert_eq!(percentage_of(2, 3), 67);
        assert_eq!(percentage_of(7, 10), 70);
    }

    #[test]
    fn ranking_is_stable_for_ties() {
        let options = vec![option("a", 5), option("b", 5), option("c", 3)];
        let ids: Vec<&str> = rank_options(&options).iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn ranking_orders_by_votes_without_mutating_input() {
        let options = vec![option("o1", 3), option("o2", 7)];
        let ranked = rank_options(&options);
        assert_eq!(ranked[0].id, "o2");
        assert_eq!(ranked[1].id, "o1");
        assert_eq!(options[0].id, "o1");
    }

    #[test]
    fn created_date_is_human_readable() {
        let created = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();
        let formatted = format_created_date(created);
        assert!(!formatted.is_empty());
        assert_eq!(formatted, "March 5, 2024");
    }
}
