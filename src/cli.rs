//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Inboxstat - charts and statistics for exported messaging archives
///
/// Reads a folder of per-contact JSON message logs and renders charts of who
/// you talk to, when, and how much.
///
/// Examples:
///   inboxstat top -n 15
///   inboxstat activity --bins 50 --no-cumulative --eq-y
///   inboxstat interaction --username "Jane Doe"
///   inboxstat -m ./export/messages/inbox monthly --start 2019-10-01
///   inboxstat --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Analysis to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .inboxstat.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Folder holding one sub-folder per contact
    #[arg(short, long, value_name = "DIR", env = "INBOXSTAT_MESSAGES", global = true)]
    pub messages_folder: Option<PathBuf>,

    /// File name of the chart, written inside the images directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub output: Option<String>,

    /// Directory charts are written to
    #[arg(long, value_name = "DIR", global = true)]
    pub images_dir: Option<PathBuf>,

    /// Number of contacts to show
    #[arg(short = 'n', long, value_name = "N", global = true)]
    pub count: Option<usize>,

    /// Also export the computed data as JSON
    #[arg(long, value_name = "FILE", global = true)]
    pub json: Option<PathBuf>,

    /// Interpret dates and timestamps in UTC instead of local time
    #[arg(long, global = true)]
    pub utc: bool,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .inboxstat.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Available analyses.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Pie chart of the most messaged contacts
    Top,

    /// Message histograms of the top contacts over a date window
    Activity(ActivityArgs),

    /// Distribution of messages over the hours of the day
    DaySchedule {
        /// Give every plot the same y-axis
        #[arg(long)]
        eq_y: bool,
    },

    /// Most contacted person for every 30-day window
    Monthly(WindowArgs),

    /// Top contacts per year and how their rank changed
    Evolution {
        /// First year to show (default: first year with messages)
        #[arg(long, value_name = "YEAR")]
        first_year: Option<i32>,

        /// Last year to show (default: last year with messages)
        #[arg(long, value_name = "YEAR")]
        last_year: Option<i32>,
    },

    /// Messages per member of a group chat
    GroupChat {
        /// Folder name of the group chat
        #[arg(long, value_name = "FOLDER")]
        chat: Option<String>,
    },

    /// Ratio of received to sent messages for the top contacts
    Interaction {
        /// Your own name as it appears as sender
        #[arg(short, long, value_name = "NAME", env = "INBOXSTAT_USERNAME")]
        username: Option<String>,
    },
}

/// Options of the activity histograms.
#[derive(clap::Args, Debug, Clone, PartialEq)]
pub struct ActivityArgs {
    /// Number of bucket boundaries of the histogram
    #[arg(long, value_name = "COUNT")]
    pub bins: Option<usize>,

    /// Plot the running total instead of per-bucket counts
    #[arg(long, conflicts_with = "no_cumulative")]
    pub cumulative: bool,

    /// Plot per-bucket counts
    #[arg(long, conflicts_with = "cumulative")]
    pub no_cumulative: bool,

    /// Give every plot the same y-axis
    #[arg(long)]
    pub eq_y: bool,

    #[command(flatten)]
    pub window: WindowArgs,
}

/// Date window options.
#[derive(clap::Args, Debug, Clone, Default, PartialEq)]
pub struct WindowArgs {
    /// First day of the window (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub start: Option<NaiveDate>,

    /// Last day of the window (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub end: Option<NaiveDate>,
}

impl Command {
    /// Chart file name used when none is configured.
    pub fn default_output(&self) -> &'static str {
        match self {
            Command::Top => "top_n.svg",
            Command::Activity(_) => "activity.svg",
            Command::DaySchedule { .. } => "day_schedule.svg",
            Command::Monthly(_) => "monthly.svg",
            Command::Evolution { .. } => "activity_over_the_years.svg",
            Command::GroupChat { .. } => "groupchat.svg",
            Command::Interaction { .. } => "interaction.svg",
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        let Some(ref command) = self.command else {
            return Err("A command is required. Run with --help to list them".to_string());
        };

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.count == Some(0) {
            return Err("Number of contacts must be at least 1".to_string());
        }

        match command {
            Command::Activity(activity) => {
                if let Some(bins) = activity.bins {
                    if bins < 2 {
                        return Err("Bins must be at least 2".to_string());
                    }
                }
                activity.window.validate()?;
            }
            Command::Monthly(window) => window.validate()?,
            Command::Evolution {
                first_year: Some(first),
                last_year: Some(last),
            } if first > last => {
                return Err("First year must not be after last year".to_string());
            }
            _ => {}
        }

        // Validate messages folder if provided
        if let Some(ref folder) = self.messages_folder {
            if !folder.is_dir() {
                return Err(format!(
                    "Messages folder is not a directory: {}",
                    folder.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `verbose_by_default` comes from the configuration file; `--quiet` wins over both.
    pub fn log_level(&self, verbose_by_default: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || verbose_by_default {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

impl WindowArgs {
    fn validate(&self) -> Result<(), String> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start >= end {
                return Err("Window start must be before its end".to_string());
            }
        }
        Ok(())
    }
}
