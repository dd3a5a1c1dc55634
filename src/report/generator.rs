//! Console summaries and JSON export.
//!
//! This module turns analysis results into the line-oriented summaries
//! printed at the end of each command, and serializes them for `--json`.

use crate::analysis::{
    GroupChatStats, InteractionFactor, SkippedContact, TimeBasis, TopN, WindowLeader, YearRanking,
};
use crate::config::Config;
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

/// Generate the "settings used" header printed before an analysis.
pub fn generate_settings_summary(config: &Config, command_name: &str) -> String {
    let mut section = String::new();

    section.push_str(&format!("{}\n", "Settings used:".green()));
    let rows = [
        ("command", command_name.to_string()),
        (
            "messages_folder",
            config.archive.messages_folder.display().to_string(),
        ),
        ("n", config.plot.count.to_string()),
        ("eq_y", config.plot.eq_y.to_string()),
        ("cumulative", config.plot.cumulative.to_string()),
        ("bins", config.plot.bins.to_string()),
        (
            "window",
            format!("{} - {}", config.window.start, config.window.end),
        ),
        ("utc", config.window.utc.to_string()),
    ];
    for (key, value) in rows {
        section.push_str(&format!("{}: {}\n", key, value.magenta()));
    }
    section.push_str("-----\n");

    section
}

/// Generate the ranked list of top contacts.
pub fn generate_top_summary(top: &TopN) -> String {
    let mut section = String::new();
    let total = top.total();

    section.push_str(&format!(
        "Top {} most messaged contacts:\n",
        top.entries.len().to_string().red()
    ));
    for (i, entry) in top.entries.iter().enumerate() {
        section.push_str(&format!(
            "{:>3}. {}: {} ({})\n",
            i + 1,
            entry.name.yellow(),
            entry.count.to_string().cyan(),
            percentage(entry.count, total)
        ));
    }
    if top.others > 0 {
        section.push_str(&format!(
            "     {}: {} ({})\n",
            "Others".yellow(),
            top.others.to_string().cyan(),
            percentage(top.others, total)
        ));
    }

    section
}

/// Generate one line per fixed window naming its leading contact.
pub fn generate_monthly_summary(leaders: &[WindowLeader], basis: TimeBasis) -> String {
    let mut section = String::new();

    for leader in leaders {
        let start = basis.format(leader.window.start_ms, "%Y-%m");
        let end = basis.format(leader.window.end_ms, "%Y-%m");
        match &leader.leader {
            Some(ranked) => section.push_str(&format!(
                "Top contact for ({} - {}) is: {}, with {} messages\n",
                start,
                end,
                ranked.name.yellow(),
                ranked.count.to_string().cyan()
            )),
            None => section.push_str(&format!(
                "No messages between {} and {}\n",
                start, end
            )),
        }
    }

    section
}

/// Generate one line per contact with its interaction factor.
pub fn generate_interaction_summary(factors: &[InteractionFactor], username: &str) -> String {
    let mut section = String::new();

    for entry in factors {
        let value = match entry.factor {
            Some(factor) => factor.to_string().cyan().to_string(),
            None => format!("undefined ({} never wrote to them)", username)
                .red()
                .to_string(),
        };
        section.push_str(&format!(
            "Interaction factor for {} = {}\n",
            entry.exchange.contact.yellow(),
            value
        ));
    }

    section
}

/// Generate the per-year ranking listing.
pub fn generate_evolution_summary(rankings: &[YearRanking]) -> String {
    let mut section = String::new();

    for ranking in rankings {
        section.push_str(&format!("{}\n", ranking.year.to_string().green()));
        if ranking.entries.is_empty() {
            section.push_str("  (no messages)\n");
        }
        for (i, entry) in ranking.entries.iter().enumerate() {
            section.push_str(&format!(
                "  {:>2}. {}: {} [{:?}]\n",
                i + 1,
                entry.name.yellow(),
                entry.count,
                entry.change
            ));
        }
    }

    section
}

/// Generate the sender ranking of a group chat.
pub fn generate_group_chat_summary(stats: &GroupChatStats) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "Group chat {} ({} participants)\n",
        stats.chat.yellow(),
        stats.participants.len()
    ));
    for sender in &stats.senders {
        let marker = if sender.count as f64 >= stats.admin_cutoff {
            "*"
        } else {
            " "
        };
        section.push_str(&format!(
            "{} {}: {}\n",
            marker,
            sender.name,
            sender.count.to_string().cyan()
        ));
    }
    section.push_str(&format!(
        "Admin cut-off: {:.1} messages (* = above)\n",
        stats.admin_cutoff
    ));

    section
}

/// Generate the report of contacts left out of the analysis.
pub fn generate_skipped_report(skipped: &[SkippedContact]) -> String {
    if skipped.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str(&format!(
        "{}\n",
        format!("Skipped {} contact(s):", skipped.len()).red()
    ));
    for entry in skipped {
        section.push_str(&format!("  - {}: {}\n", entry.contact, entry.reason));
    }

    section
}

fn percentage(part: usize, total: usize) -> String {
    if total == 0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", part as f64 * 100.0 / total as f64)
}

/// Generate a JSON export of any analysis result.
pub fn generate_json_report<T: Serialize>(report: &T) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write a JSON export to a file.
pub fn write_json_report<T: Serialize>(report: &T, path: &Path) -> Result<()> {
    let content = generate_json_report(report)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write JSON export to {}", path.display()))
}
