//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.inboxstat.toml` files.

use crate::analysis::group_chat::DEFAULT_ADMIN_CUTOFF;
use crate::analysis::{DateWindow, TimeBasis};
use crate::cli::{Args, Command};
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".inboxstat.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Archive settings.
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Plot settings.
    #[serde(default)]
    pub plot: PlotConfig,

    /// Date window settings.
    #[serde(default)]
    pub window: WindowConfig,

    /// Year range of the evolution chart.
    #[serde(default)]
    pub evolution: EvolutionConfig,
}

/// General application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Chart file name. Each command has its own default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Directory charts are written to.
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: None,
            images_dir: default_images_dir(),
            verbose: false,
        }
    }
}

fn default_images_dir() -> PathBuf {
    PathBuf::from("images")
}

/// Where the export lives and who the user is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Folder holding one sub-folder per contact.
    #[serde(default = "default_messages_folder")]
    pub messages_folder: PathBuf,

    /// The user's own sender name.
    #[serde(default)]
    pub username: String,

    /// Folder name of the group chat to analyse.
    #[serde(default)]
    pub group_chat: String,

    /// Split concatenated names on capitals (`JaneDoe` becomes `Jane Doe`).
    #[serde(default = "default_true")]
    pub split_names: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            messages_folder: default_messages_folder(),
            username: String::new(),
            group_chat: String::new(),
            split_names: true,
        }
    }
}

fn default_messages_folder() -> PathBuf {
    PathBuf::from("messages/inbox")
}

fn default_true() -> bool {
    true
}

/// Chart settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotConfig {
    /// Number of contacts to plot.
    #[serde(default = "default_count")]
    pub count: usize,

    /// Make all y-axes the same height.
    #[serde(default)]
    pub eq_y: bool,

    /// Plot running totals instead of per-bucket counts.
    #[serde(default = "default_true")]
    pub cumulative: bool,

    /// Number of bucket boundaries of the activity histograms.
    #[serde(default = "default_bins")]
    pub bins: usize,

    /// Share of the top sender's count marking the group chat admin line.
    #[serde(default = "default_admin_cutoff")]
    pub admin_cutoff: f64,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            count: default_count(),
            eq_y: false,
            cumulative: true,
            bins: default_bins(),
            admin_cutoff: default_admin_cutoff(),
        }
    }
}

fn default_count() -> usize {
    10
}

fn default_bins() -> usize {
    100
}

fn default_admin_cutoff() -> f64 {
    DEFAULT_ADMIN_CUTOFF
}

/// Date window of the time based analyses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// First day of the window.
    #[serde(default = "default_start")]
    pub start: NaiveDate,

    /// Last day of the window.
    #[serde(default = "default_end")]
    pub end: NaiveDate,

    /// Interpret dates and timestamps in UTC instead of local time.
    #[serde(default)]
    pub utc: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            start: default_start(),
            end: default_end(),
            utc: false,
        }
    }
}

fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 9, 1).unwrap_or_default()
}

fn default_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 8, 20).unwrap_or_default()
}

impl WindowConfig {
    pub fn basis(&self) -> TimeBasis {
        TimeBasis::from_utc_flag(self.utc)
    }

    /// The configured window in epoch milliseconds.
    pub fn date_window(&self) -> Result<DateWindow> {
        DateWindow::from_dates(self.start, self.end, self.basis())
            .context("Invalid date window")
    }
}

/// Years shown by the evolution chart. Unset bounds follow the data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvolutionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_year: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_year: Option<i32>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load `.inboxstat.toml` from a directory.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only values given on the command line override the file.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref folder) = args.messages_folder {
            self.archive.messages_folder = folder.clone();
        }
        if let Some(ref output) = args.output {
            self.general.output = Some(output.clone());
        }
        if let Some(ref dir) = args.images_dir {
            self.general.images_dir = dir.clone();
        }
        if let Some(count) = args.count {
            self.plot.count = count;
        }
        if args.utc {
            self.window.utc = true;
        }
        if args.verbose {
            self.general.verbose = true;
        }

        match &args.command {
            Some(Command::Activity(activity)) => {
                if let Some(bins) = activity.bins {
                    self.plot.bins = bins;
                }
                if activity.cumulative {
                    self.plot.cumulative = true;
                } else if activity.no_cumulative {
                    self.plot.cumulative = false;
                }
                if activity.eq_y {
                    self.plot.eq_y = true;
                }
                self.merge_window(activity.window.start, activity.window.end);
            }
            Some(Command::DaySchedule { eq_y }) => {
                if *eq_y {
                    self.plot.eq_y = true;
                }
            }
            Some(Command::Monthly(window)) => self.merge_window(window.start, window.end),
            Some(Command::Evolution {
                first_year,
                last_year,
            }) => {
                if first_year.is_some() {
                    self.evolution.first_year = *first_year;
                }
                if last_year.is_some() {
                    self.evolution.last_year = *last_year;
                }
            }
            Some(Command::GroupChat { chat: Some(chat) }) => {
                self.archive.group_chat = chat.clone();
            }
            Some(Command::Interaction {
                username: Some(username),
            }) => {
                self.archive.username = username.clone();
            }
            _ => {}
        }
    }

    fn merge_window(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        if let Some(start) = start {
            self.window.start = start;
        }
        if let Some(end) = end {
            self.window.end = end;
        }
    }

    /// Check values that serde cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        if self.plot.count == 0 {
            bail!("plot.count must be at least 1");
        }
        if self.plot.bins < 2 {
            bail!("plot.bins must be at least 2");
        }
        if !(0.0..=1.0).contains(&self.plot.admin_cutoff) {
            bail!("plot.admin_cutoff must be between 0.0 and 1.0");
        }
        if self.window.start >= self.window.end {
            bail!(
                "window.start ({}) must be before window.end ({})",
                self.window.start,
                self.window.end
            );
        }
        if let (Some(first), Some(last)) = (self.evolution.first_year, self.evolution.last_year) {
            if first > last {
                bail!("evolution.first_year must not be after evolution.last_year");
            }
        }
        Ok(())
    }

    /// Chart file name for a command.
    pub fn output_for(&self, command: &Command) -> String {
        self.general
            .output
            .clone()
            .unwrap_or_else(|| command.default_output().to_string())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{ActivityArgs, WindowArgs};
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.plot.count, 10);
        assert_eq!(config.plot.bins, 100);
        assert!(config.plot.cumulative);
        assert_eq!(config.archive.messages_folder, PathBuf::from("messages/inbox"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "mine.svg"
verbose = true

[archive]
messages_folder = "export/inbox"
username = "Jane Doe"

[plot]
count = 4
eq_y = true
bins = 20

[window]
start = "2018-01-01"
end = "2019-01-01"
utc = true
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output.as_deref(), Some("mine.svg"));
        assert!(config.general.verbose);
        assert_eq!(config.archive.messages_folder, PathBuf::from("export/inbox"));
        assert_eq!(config.archive.username, "Jane Doe");
        assert!(config.archive.split_names);
        assert_eq!(config.plot.count, 4);
        assert!(config.plot.eq_y);
        assert!(config.plot.cumulative);
        assert_eq!(config.plot.bins, 20);
        assert_eq!(config.window.start, NaiveDate::from_ymd_opt(2018, 1, 1).unwrap());
        assert_eq!(config.window.basis(), TimeBasis::Utc);
        assert_eq!(config.evolution, EvolutionConfig::default());
    }

    #[test]
    fn test_default_toml_round_trips() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[archive]"));
        assert!(toml_str.contains("[plot]"));
        assert!(toml_str.contains("[window]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_cli_overrides_file() {
        let args = Args::try_parse_from([
            "inboxstat", "-n", "3", "--utc", "activity", "--no-cumulative", "--end", "2021-01-01",
        ])
        .unwrap();

        let mut config = Config::default();
        config.merge_with_args(&args);

        assert_eq!(config.plot.count, 3);
        assert!(!config.plot.cumulative);
        assert!(config.window.utc);
        assert_eq!(config.window.end, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
        assert_eq!(config.window.start, default_start());
    }

    #[test]
    fn test_output_for_command() {
        let mut config = Config::default();
        let command = Command::Activity(ActivityArgs {
            bins: None,
            cumulative: false,
            no_cumulative: false,
            eq_y: false,
            window: WindowArgs::default(),
        });
        assert_eq!(config.output_for(&command), "activity.svg");

        config.general.output = Some("custom.svg".to_string());
        assert_eq!(config.output_for(&command), "custom.svg");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.plot.bins = 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.window.end = config.window.start;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.evolution.first_year = Some(2020);
        config.evolution.last_year = Some(2010);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        assert!(Config::load_from_dir(temp.path()).unwrap().is_none());

        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "[plot]\ncount = 7\n").unwrap();
        let config = Config::load_from_dir(temp.path()).unwrap().unwrap();
        assert_eq!(config.plot.count, 7);
    }

    #[test]
    fn test_load_from_dir_rejects_malformed_file() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "[plot]\ncount = \"ten\"\nbins = 1\n").unwrap();
        assert!(Config::load_from_dir(temp.path()).is_err());
    }
}
