mod vote;

pub use vote::PollPage;

use log::info;

pub const HELP: &str = "\
Commands:
  select <n|id>   pick an option without voting yet
  vote [n|id]     vote for an option (or the selected one)
  retry           clear the error and try again
  dismiss         hide the error message
  again           vote again from the results screen
  show            show the current screen
  signin <name>   sign in
  signout         sign out
  help            show this help
  quit            leave the poll";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Select(String),
    Vote(Option<String>),
    Retry,
    Dismiss,
    Again,
    Show,
    SignIn(String),
    SignOut,
    Help,
    Quit,
}

/// What the terminal loop should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue(String),
    Quit,
}

// Parses one input line; `None` for blank or unknown input
pub fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.trim().splitn(2, char::is_whitespace);
    let name = parts.next()?.to_lowercase();
    let arg = parts
        .next()
        .map(str::trim)
        .filter(|arg| !arg.is_empty())
        .map(str::to_string);

    match (name.as_str(), arg) {
        ("select", Some(arg)) => Some(Command::Select(arg)),
        ("vote", arg) => Some(Command::Vote(arg)),
        ("retry", None) => Some(Command::Retry),
        ("dismiss", None) => Some(Command::Dismiss),
        ("again", None) => Some(Command::Again),
        ("show" | "results", None) => Some(Command::Show),
        ("signin", Some(arg)) => Some(Command::SignIn(arg)),
        ("signout", None) => Some(Command::SignOut),
        ("help" | "?", None) => Some(Command::Help),
        ("quit" | "exit", None) => Some(Command::Quit),
        _ => None,
    }
}

pub async fn handle_command(page: &mut PollPage, command: Command) -> Flow {
    info!("Received command: {:?}", command);
    let reply = match command {
        Command::Select(choice) => page.select(&choice),
        Command::Vote(choice) => page.vote(choice.as_deref()).await,
        Command::Retry => page.retry(),
        Command::Dismiss => page.dismiss(),
        Command::Again => page.vote_again(),
        Command::Show => page.show().await,
        Command::SignIn(name) => page.sign_in(&name),
        Command::SignOut => page.sign_out(),
        Command::Help => HELP.to_string(),
        Command::Quit => {
            page.close();
            return Flow::Quit;
        }
    };
    Flow::Continue(reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(parse_command("vote 2"), Some(Command::Vote(Some("2".to_string()))));
        assert_eq!(parse_command("  VOTE  "), Some(Command::Vote(None)));
        assert_eq!(parse_command("select 1b"), Some(Command::Select("1b".to_string())));
        assert_eq!(
            parse_command("signin Grace Hopper"),
            Some(Command::SignIn("Grace Hopper".to_string()))
        );
    }

    #[test]
    fn parses_bare_commands() {
        assert_eq!(parse_command("retry"), Some(Command::Retry));
        assert_eq!(parse_command("dismiss"), Some(Command::Dismiss));
        assert_eq!(parse_command("again"), Some(Command::Again));
        assert_eq!(parse_command("results"), Some(Command::Show));
        assert_eq!(parse_command("exit"), Some(Command::Quit));
    }

    #[test]
    fn rejects_unknown_or_malformed_input() {
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("select"), None);
        assert_eq!(parse_command("signin   "), None);
        assert_eq!(parse_command("retry now"), None);
        assert_eq!(parse_command("dance"), None);
    }
}
