use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::task::{Color, Status};

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "planner",
    version,
    about = "Planner: kanban board with per-task time tracking and calendar views",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    #[arg(long = "data")]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create a task
    Add {
        title: String,
        #[arg(long = "desc", default_value = "")]
        description: String,
        #[arg(long = "due")]
        due: Option<NaiveDate>,
        #[arg(long = "color", default_value = "yellow")]
        color: Color,
    },
    /// Edit fields of an existing task
    Modify {
        id: String,
        #[arg(long = "title")]
        title: Option<String>,
        #[arg(long = "desc")]
        description: Option<String>,
        #[arg(long = "due", conflicts_with = "clear_due")]
        due: Option<NaiveDate>,
        #[arg(long = "clear-due")]
        clear_due: bool,
        #[arg(long = "color")]
        color: Option<Color>,
        #[arg(long = "status")]
        status: Option<Status>,
    },
    /// Delete a task
    Delete { id: String },
    /// List all tasks in creation order
    List,
    /// Show one task in full
    Info { id: String },
    /// Start the timer on a task
    Start { id: String },
    /// Pause the active timer
    Pause { id: String },
    /// Stop the active timer and mark the task done
    Stop { id: String },
    /// Show the kanban board
    Board,
    /// Move a task to another board column
    Move {
        id: String,
        status: Status,
    },
    /// Show the week view
    Week {
        /// Weeks relative to the current one
        #[arg(long = "offset", default_value_t = 0)]
        offset: i64,
    },
    /// Show the month view
    Month {
        /// Months relative to the current one
        #[arg(long = "offset", default_value_t = 0)]
        offset: i32,
    },
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}
