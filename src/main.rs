//! Inboxstat - charts and statistics for exported messaging archives
//!
//! A CLI tool that walks a folder of per-contact JSON message logs and
//! renders SVG charts of who you talk to, when, and how much.
//!
//! Exit codes:
//!   0 - Success (skipped contacts are reported but do not fail the run)
//!   1 - Runtime error (missing archive, invalid config, chart write failure, etc.)

mod analysis;
mod archive;
mod cli;
mod config;
mod models;
mod names;
mod report;

use analysis::{Aggregator, SkippedContact, THIRTY_DAYS_MS};
use anyhow::{bail, Context, Result};
use archive::FsArchive;
use cli::{Args, Command};
use config::{Config, CONFIG_FILE_NAME};
use models::ContactId;
use names::{CamelCaseSplitter, DisplayNameFormatter, StemOnly};
use report::chart::{self, Bar};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    // Load configuration before logging so the file can raise verbosity
    let (config, source) = match load_config(&args, Path::new(".")) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(args.log_level(config.general.verbose));

    info!("Inboxstat v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match source {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    if let Err(e) = run(&args, config) {
        error!("Run failed: {:#}", e);
        eprintln!("\nError: {:#}", e);
        std::process::exit(1);
    }
}

/// Handle --init-config: generate a default .inboxstat.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        bail!("{} already exists. Remove it first or edit it manually.", CONFIG_FILE_NAME);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to set your username, messages folder, date window and more.");
    Ok(())
}

/// Initialize logging. `RUST_LOG` directives take precedence over `level`.
fn init_logging(level: Level) {
    let filter = log_filter(level, std::env::var("RUST_LOG").ok().as_deref());

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

fn log_filter(level: Level, directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::default().add_directive(LevelFilter::from_level(level).into()))
}

/// Apply CLI overrides to the configuration and run the selected command.
fn run(args: &Args, mut config: Config) -> Result<()> {
    let start_time = Instant::now();

    let Some(command) = args.command.clone() else {
        bail!("No command given");
    };

    config.merge_with_args(args);
    config.validate()?;

    if !args.quiet {
        print!("{}", report::generate_settings_summary(&config, command_name(&command)));
    }

    let archive = FsArchive::open(config.archive.messages_folder.clone())?;
    info!("Reading archive at {}", archive.root().display());

    let formatter: Box<dyn DisplayNameFormatter> = if config.archive.split_names {
        Box::new(CamelCaseSplitter)
    } else {
        Box::new(StemOnly)
    };
    let aggregator = Aggregator::new(&archive, formatter.as_ref()).with_progress(!args.quiet);

    let output = chart::prepare_output(&config.general.images_dir, &config.output_for(&command))?;
    let ctx = RunContext {
        config: &config,
        aggregator: &aggregator,
        archive: &archive,
        output: &output,
        json: args.json.as_deref(),
    };

    let skipped = match &command {
        Command::Top => run_top(&ctx)?,
        Command::Activity(_) => run_activity(&ctx)?,
        Command::DaySchedule { .. } => run_day_schedule(&ctx)?,
        Command::Monthly(_) => run_monthly(&ctx)?,
        Command::Evolution { .. } => run_evolution(&ctx)?,
        Command::GroupChat { .. } => run_group_chat(&ctx)?,
        Command::Interaction { .. } => run_interaction(&ctx)?,
    };

    print!("{}", report::generate_skipped_report(&skipped));
    if !args.quiet {
        println!(
            "\nChart saved to {} ({:.1}s)",
            output.display(),
            start_time.elapsed().as_secs_f64()
        );
    }

    Ok(())
}

/// Everything a command needs to run.
struct RunContext<'a> {
    config: &'a Config,
    aggregator: &'a Aggregator<'a>,
    archive: &'a FsArchive,
    output: &'a Path,
    json: Option<&'a Path>,
}

impl RunContext<'_> {
    /// Write the computed data when --json was given.
    fn export<T: Serialize>(&self, data: &T) -> Result<()> {
        if let Some(path) = self.json {
            report::write_json_report(data, path)?;
            info!("JSON export written to {}", path.display());
        }
        Ok(())
    }

    /// Folder names of the N most messaged contacts, plus the skipped contacts.
    fn top_contacts(&self) -> Result<(Vec<ContactId>, Vec<SkippedContact>)> {
        let counts = self.aggregator.count_interactions()?;
        let top = analysis::top_n(&counts.entries, self.config.plot.count);
        let ids = top.entries.iter().map(|r| ContactId::new(r.name.as_str())).collect();
        Ok((ids, counts.skipped))
    }
}

fn run_top(ctx: &RunContext<'_>) -> Result<Vec<SkippedContact>> {
    let counts = ctx.aggregator.count_interactions()?;
    info!("{} messages across {} contacts", counts.total(), counts.entries.len());
    let top = analysis::top_n(&counts.entries, ctx.config.plot.count)
        .relabel(|raw| ctx.aggregator.display_name(&ContactId::new(raw)));

    let title = format!("Top {} most messaged contacts", top.entries.len());
    chart::pie_chart(ctx.output, &title, &top)?;
    println!("{}", report::generate_top_summary(&top));
    ctx.export(&top)?;

    Ok(counts.skipped)
}

fn run_activity(ctx: &RunContext<'_>) -> Result<Vec<SkippedContact>> {
    let (ids, mut skipped) = ctx.top_contacts()?;
    let ranked = ctx.aggregator.collect_ranked_messages(&ids);
    skipped.extend(ranked.skipped);

    let plot = &ctx.config.plot;
    let window = ctx.config.window.date_window()?;
    let activity = analysis::activity_series(&ranked.contacts, &window, plot.bins, plot.cumulative)?;
    for name in &activity.inactive {
        warn!("{} has no messages between {} and {}", name, ctx.config.window.start, ctx.config.window.end);
    }

    chart::activity_grid(ctx.output, &activity, ctx.config.window.basis(), plot.eq_y)?;
    ctx.export(&activity)?;

    Ok(skipped)
}

fn run_day_schedule(ctx: &RunContext<'_>) -> Result<Vec<SkippedContact>> {
    let (ids, mut skipped) = ctx.top_contacts()?;
    let ranked = ctx.aggregator.collect_ranked_messages(&ids);
    skipped.extend(ranked.skipped);

    let schedules = analysis::day_schedules(&ranked.contacts, ctx.config.window.basis());
    chart::day_schedule_grid(ctx.output, &schedules, ctx.config.plot.eq_y)?;
    ctx.export(&schedules)?;

    Ok(skipped)
}

fn run_monthly(ctx: &RunContext<'_>) -> Result<Vec<SkippedContact>> {
    let messages = ctx.aggregator.collect_messages()?;
    let windows = ctx.config.window.date_window()?.fixed_windows(THIRTY_DAYS_MS);
    let leaders = analysis::window_leaders(&messages.entries, &windows);

    println!("{}", report::generate_monthly_summary(&leaders, ctx.config.window.basis()));

    let basis = ctx.config.window.basis();
    let bars: Vec<Bar> = leaders
        .iter()
        .map(|l| Bar {
            label: match &l.leader {
                Some(r) => format!("{} {}", basis.format(l.window.start_ms, "%Y-%m"), r.name),
                None => basis.format(l.window.start_ms, "%Y-%m"),
            },
            value: l.leader.as_ref().map(|r| r.count as f64).unwrap_or(0.0),
        })
        .collect();
    chart::bar_chart(ctx.output, "Top contact per 30 days", "# messages", &bars)?;
    ctx.export(&leaders)?;

    Ok(messages.skipped)
}

fn run_evolution(ctx: &RunContext<'_>) -> Result<Vec<SkippedContact>> {
    let basis = ctx.config.window.basis();
    let messages = ctx.aggregator.collect_messages()?;

    let Some(span) = analysis::year_span(&messages.entries, basis) else {
        warn!("No messages found, nothing to rank");
        chart::evolution_chart(ctx.output, &[])?;
        return Ok(messages.skipped);
    };
    let first = ctx.config.evolution.first_year.unwrap_or(*span.start());
    let last = ctx.config.evolution.last_year.unwrap_or(*span.end());
    if first > last {
        bail!("No years to show between {} and {}", first, last);
    }

    let rankings = analysis::yearly_evolution(&messages.entries, first..=last, ctx.config.plot.count, basis);
    chart::evolution_chart(ctx.output, &rankings)?;
    print!("{}", report::generate_evolution_summary(&rankings));
    ctx.export(&rankings)?;

    Ok(messages.skipped)
}

fn run_group_chat(ctx: &RunContext<'_>) -> Result<Vec<SkippedContact>> {
    let chat = ctx.config.archive.group_chat.trim();
    if chat.is_empty() {
        bail!("No group chat given. Use --chat or set archive.group_chat");
    }

    let stats = analysis::group_chat_stats(ctx.archive, &ContactId::new(chat), ctx.config.plot.admin_cutoff)
        .with_context(|| format!("Failed to read group chat {}", chat))?;
    debug!("{} sender(s) at or above the admin cut-off", stats.above_cutoff().count());

    chart::group_chat_chart(ctx.output, &stats)?;
    print!("{}", report::generate_group_chat_summary(&stats));
    ctx.export(&stats)?;

    Ok(Vec::new())
}

fn run_interaction(ctx: &RunContext<'_>) -> Result<Vec<SkippedContact>> {
    let username = ctx.config.archive.username.trim();
    if username.is_empty() {
        bail!("No username given. Use --username or set archive.username");
    }

    let (ids, mut skipped) = ctx.top_contacts()?;
    let ranked = ctx.aggregator.collect_ranked_messages(&ids);
    skipped.extend(ranked.skipped);

    let factors = analysis::interaction_factors(&ranked.contacts, username);
    print!("{}", report::generate_interaction_summary(&factors, username));

    let bars: Vec<Bar> = factors
        .iter()
        .filter_map(|f| {
            f.factor.map(|value| Bar {
                label: f.exchange.contact.clone(),
                value,
            })
        })
        .collect();
    chart::bar_chart(ctx.output, "Interaction factor (received / sent)", "factor", &bars)?;
    ctx.export(&factors)?;

    Ok(skipped)
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Top => "top",
        Command::Activity(_) => "activity",
        Command::DaySchedule { .. } => "day-schedule",
        Command::Monthly(_) => "monthly",
        Command::Evolution { .. } => "evolution",
        Command::GroupChat { .. } => "group-chat",
        Command::Interaction { .. } => "interaction",
    }
}

/// Load configuration from `--config`, else from `.inboxstat.toml` in `dir`, else defaults.
///
/// Also returns the file the configuration came from. A file that exists but
/// cannot be read or parsed is an error.
fn load_config(args: &Args, dir: &Path) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Ok((Config::load(config_path)?, Some(config_path.clone())));
    }

    // Try default location
    match Config::load_from_dir(dir)? {
        Some(config) => Ok((config, Some(dir.join(CONFIG_FILE_NAME)))),
        None => Ok((Config::default(), None)),
    }
}
