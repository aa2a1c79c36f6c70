use std::convert::TryFrom;
use std::path::PathBuf;

use humantime::parse_duration;
use structopt::StructOpt;

use crate::model::{ListType, TaskId};

#[derive(Debug, StructOpt)]
pub enum Command {
    /// Add tasks, one per line. Reads standard input when no title is given.
    Add {
        /// The task titles.
        #[structopt()]
        titles: Vec<String>,

        /// Time for each new task (45m, 1h30m or plain minutes). Defaults to 15 minutes.
        #[structopt(short, long, parse(try_from_str = parse_minutes))]
        time: Option<i64>,

        /// Put the tasks in this list (today or backlog) instead of letting the daily limit decide.
        #[structopt(short, long)]
        list: Option<ListType>,

        /// Treat the input as a dictated transcript: one task per sentence.
        #[structopt(long)]
        transcript: bool,
    },
    /// Change the time of a task.
    Time {
        #[structopt()]
        id: TaskId,

        /// The new time (45m, 1h30m or plain minutes).
        #[structopt(parse(try_from_str = parse_minutes))]
        time: i64,
    },
    /// Move a task to today or to the backlog.
    Move {
        #[structopt()]
        id: TaskId,

        /// today or backlog
        #[structopt()]
        list: ListType,
    },
    /// Remove a task.
    Rm {
        #[structopt()]
        id: TaskId,
    },
    /// Remove all your tasks.
    Clear,
    /// List today's tasks and the backlog.
    List {
        /// Print as JSON.
        #[structopt(long)]
        json: bool,
    },
    /// Show the daily limit, or change it.
    Limit {
        /// The new limit (4h, 90m or plain minutes).
        #[structopt(parse(try_from_str = parse_minutes))]
        limit: Option<i64>,

        /// Print as JSON.
        #[structopt(long)]
        json: bool,
    },
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "Timebox",
    about = "A daily planner that fits your tasks into the time you have."
)]
pub struct CommandLineArgs {
    #[structopt(subcommand)]
    pub action: Command,

    /// Use a different journal file.
    #[structopt(parse(from_os_str), short, long, env = "TIMEBOX_JOURNAL")]
    pub journal_file: Option<PathBuf>,

    /// Plan as this owner instead of the one stored on this machine.
    #[structopt(short, long, env = "TIMEBOX_OWNER")]
    pub owner: Option<String>,

    /// Keep everything in memory. Nothing is saved.
    #[structopt(long)]
    pub memory: bool,

    /// Log what is going on.
    #[structopt(short, long)]
    pub verbose: bool,
}

/// Parse a number of minutes, either plain ("90") or as a humantime
/// duration ("1h 30m"). Durations must be whole minutes.
pub fn parse_minutes(src: &str) -> Result<i64, String> {
    let src = src.trim();
    if let Ok(minutes) = src.parse::<i64>() {
        return Ok(minutes);
    }

    let duration = parse_duration(src).map_err(|err| err.to_string())?;
    if duration.as_secs() % 60 != 0 || duration.subsec_nanos() != 0 {
        return Err(format!("'{}' is not a whole number of minutes", src));
    }
    i64::try_from(duration.as_secs() / 60).map_err(|_| format!("'{}' is too long", src))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_minutes() {
        assert_eq!(parse_minutes("90").unwrap(), 90);
        assert_eq!(parse_minutes(" 0 ").unwrap(), 0);
    }

    #[test]
    fn test_parse_humantime() {
        assert_eq!(parse_minutes("45m").unwrap(), 45);
        assert_eq!(parse_minutes("1h 30m").unwrap(), 90);
        assert_eq!(parse_minutes("4h").unwrap(), 240);
    }

    #[test]
    fn test_parse_rejects_partial_minutes() {
        assert!(parse_minutes("90s").is_err());
        assert!(parse_minutes("soon").is_err());
    }

    #[test]
    fn test_add_command_line() {
        let args = CommandLineArgs::from_iter(&[
            "timebox", "--owner", "user_1", "add", "a", "b", "--time", "30m", "--list", "backlog",
        ]);
        assert_eq!(args.owner.as_deref(), Some("user_1"));
        match args.action {
            Command::Add {
                titles,
                time,
                list,
                transcript,
            } => {
                assert_eq!(titles, vec!["a", "b"]);
                assert_eq!(time, Some(30));
                assert_eq!(list, Some(ListType::Backlog));
                assert!(!transcript);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_move_rejects_unknown_list() {
        let result = CommandLineArgs::from_iter_safe(&["timebox", "move", "3", "someday"]);
        assert!(result.is_err());
    }
}
