use crate::error::FormError;
use crate::models::Poll;

/// A validated vote form: the selected option is known to belong to the poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteForm {
    option_id: String,
}

impl VoteForm {
    pub fn parse(poll: &Poll, raw_option_id: &str) -> Result<Self, FormError> {
        let option_id = raw_option_id.trim();
        if option_id.is_empty() {
            return Err(FormError::MissingOption);
        }
        if poll.option(option_id).is_none() {
            return Err(FormError::UnknownOption(option_id.to_string()));
        }
        Ok(Self {
            option_id: option_id.to_string(),
        })
    }

    pub fn option_id(&self) -> &str {
        &self.option_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PollOption;
    use chrono::Utc;

    fn poll() -> Poll {
        Poll {
            id: "p1".to_string(),
            question: "Lunch?".to_string(),
            description: None,
            options: vec![
                PollOption { id: "o1".to_string(), text: "Pizza".to_string(), votes: 0 },
                PollOption { id: "o2".to_string(), text: "Sushi".to_string(), votes: 0 },
            ],
            total_votes: 0,
            created_at: Utc::now(),
            ends_at: None,
            is_active: true,
        }
    }

    #[test]
    fn accepts_known_option() {
        let form = VoteForm::parse(&poll(), " o2 ").unwrap();
        assert_eq!(form.option_id(), "o2");
    }

    #[test]
    fn rejects_blank_selection() {
        assert_eq!(VoteForm::parse(&poll(), "   "), Err(FormError::MissingOption));
    }

    #[test]
    fn rejects_foreign_option() {
        assert_eq!(
            VoteForm::parse(&poll(), "o9"),
            Err(FormError::UnknownOption("o9".to_string()))
        );
    }
}
