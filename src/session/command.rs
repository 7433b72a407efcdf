//! Console command parsing.

use chrono::NaiveDate;

use crate::error::{Result, RouteScoutError};

/// One parsed input line. The verb is case-insensitive; arguments keep
/// their original casing.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Quit,
    From(String),
    To(String),
    Date(String),
    ShowConfig,
    Search,
    Unknown(String),
}

impl Command {
    /// Parse a trimmed, non-empty input line.
    pub fn parse(line: &str) -> Self {
        let mut parts = line.splitn(2, char::is_whitespace);
        let verb = parts.next().unwrap_or_default().to_lowercase();
        let rest = parts.next().unwrap_or_default().trim().to_string();

        match verb.as_str() {
            "help" => Self::Help,
            "exit" | "quit" => Self::Quit,
            "from" => Self::From(rest),
            "to" => Self::To(rest),
            "date" => Self::Date(rest),
            "config" => Self::ShowConfig,
            "search" => Self::Search,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

/// A date argument must be a real calendar date in `YYYY-MM-DD` form.
pub fn validate_date(raw: &str) -> Result<()> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| RouteScoutError::Validation(format!("'{raw}' is not a valid YYYY-MM-DD date")))
}

pub const HELP_TEXT: &str = "\
Available commands:
  help               - show this help
  from <city>        - set the departure city
  to <city>          - set the arrival city
  date <YYYY-MM-DD>  - set the travel date
  config             - show the current settings
  search             - look up routes
  quit               - leave the program";
