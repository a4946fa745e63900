use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tolerance_core::advice::{
    effectiveness_advice, safety_guidelines, tolerance_suggestions, ToleranceLevel,
};
use tolerance_core::history::subject_records;
use tolerance_core::insights::TrendStatus;
use tolerance_core::profile::MIN_EVENTS_FOR_TREND;
use tolerance_core::wal::read_events;
use tolerance_core::*;

const EVENT_LOG: &str = "events.jsonl";

#[derive(Parser)]
#[command(name = "tolr")]
#[command(about = "Consumption tolerance tracking and dose guidance", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Subject to act on (defaults to the configured id)
    #[arg(long, global = true)]
    subject: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a consumption session
    Log {
        /// Amount of active compound
        #[arg(long, allow_negative_numbers = true)]
        amount: f64,

        /// smoking, vaping, edibles, tinctures, dabbing or topicals
        #[arg(long)]
        method: String,

        /// indica, sativa, hybrid or a custom tag
        #[arg(long, default_value = "hybrid")]
        category: String,

        /// Effect rating from 1 to 10
        #[arg(long)]
        rating: u8,

        /// Duration of effects in hours
        #[arg(long, default_value_t = 2.0, allow_negative_numbers = true)]
        duration: f64,

        /// When the session happened (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<String>,
    },

    /// Recommend a dose for a target intensity
    Predict {
        /// microdose, light, moderate, strong or very_strong
        #[arg(long, default_value = "moderate")]
        effects: String,

        /// Preferred consumption method
        #[arg(long)]
        method: Option<String>,

        /// Preferred strain category
        #[arg(long)]
        category: Option<String>,
    },

    /// Show tolerance analysis (default)
    Tolerance,

    /// Suggest a tolerance break
    Break,

    /// Export logged sessions to CSV
    Export {
        /// Output file
        #[arg(long)]
        out: PathBuf,

        /// Include every subject, not just the selected one
        #[arg(long)]
        all_subjects: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tolerance_core::logging::init(cli.verbose);

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let subject = cli
        .subject
        .unwrap_or_else(|| config.subject.default_id.clone());
    let log_path = data_dir.join(EVENT_LOG);
    tracing::debug!("Using event log {:?} for subject {}", log_path, subject);

    match cli.command {
        Some(Commands::Log {
            amount,
            method,
            category,
            rating,
            duration,
            at,
        }) => {
            let occurred_at = match at {
                Some(ref s) => parse_timestamp(s)?,
                None => Utc::now(),
            };
            let event = ConsumptionEvent::new(
                occurred_at,
                amount,
                method.parse()?,
                category.parse()?,
                rating,
                duration,
            );
            cmd_log(&log_path, &subject, event, &config)
        }
        Some(Commands::Predict {
            effects,
            method,
            category,
        }) => cmd_predict(&log_path, &subject, &effects, method, category, &config),
        Some(Commands::Tolerance) | None => cmd_tolerance(&log_path, &subject, &config),
        Some(Commands::Break) => cmd_break(&log_path, &subject, &config),
        Some(Commands::Export { out, all_subjects }) => {
            cmd_export(&log_path, &subject, &out, all_subjects)
        }
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Other(format!("Invalid timestamp '{}': {}", s, e)))
}

fn cmd_log(log_path: &Path, subject: &str, event: ConsumptionEvent, config: &Config) -> Result<()> {
    let (mut engine, _) = load_engine(log_path, &config.engine)?;

    // Validate through the engine before anything reaches the log
    engine.record_event(subject, event.clone())?;

    let mut sink = JsonlSink::new(log_path);
    sink.append(&LoggedEvent::new(subject, event))?;

    let tolerance = engine.current_tolerance(subject, Utc::now());
    let tracked = engine.profile(subject).map(|p| p.len()).unwrap_or(0);

    println!("\n✓ Session logged!");
    println!(
        "  Tolerance: {:.1}x ({})",
        tolerance,
        ToleranceLevel::from_multiplier(tolerance).description()
    );
    println!("  Sessions tracked: {}", tracked);
    Ok(())
}

fn cmd_predict(
    log_path: &Path,
    subject: &str,
    effects: &str,
    method: Option<String>,
    category: Option<String>,
    config: &Config,
) -> Result<()> {
    let (mut engine, _) = load_engine(log_path, &config.engine)?;

    let target = IntensityTier::parse_or_moderate(effects);

    let method = method.as_ref().and_then(|m| match m.parse::<Method>() {
        Ok(method) => Some(method),
        Err(_) => {
            eprintln!("Unknown method: {}. Using default selection.", m);
            None
        }
    });

    let category = category.as_ref().and_then(|c| match c.parse::<Category>() {
        Ok(category) => Some(category),
        Err(_) => {
            eprintln!("Empty category. Using default selection.");
            None
        }
    });

    let rec = engine.recommend(subject, target, method, category, Utc::now())?;
    display_recommendation(&rec, &config.display.dose_unit);
    Ok(())
}

fn cmd_tolerance(log_path: &Path, subject: &str, config: &Config) -> Result<()> {
    let (engine, _) = load_engine(log_path, &config.engine)?;
    let now = Utc::now();
    let unit = &config.display.dose_unit;

    let tolerance = engine.current_tolerance(subject, now);
    let history: Vec<&ConsumptionEvent> = engine
        .profile(subject)
        .map(|p| p.history().iter().collect())
        .unwrap_or_default();

    print_banner("TOLERANCE ANALYSIS");
    println!("  Current: {:.1}x baseline", tolerance);
    println!(
        "  Level: {}",
        ToleranceLevel::from_multiplier(tolerance).description()
    );
    println!("  Data points: {}", history.len());

    if history.len() >= MIN_EVENTS_FOR_TREND {
        let trend = engine.tolerance_trend(subject);
        let direction = if trend > 0.0 {
            "Increasing"
        } else if trend < 0.0 {
            "Decreasing"
        } else {
            "Stable"
        };
        println!("  Trend: {} ({:+.1} {}/week)", direction, trend, unit);
    }

    if let Some(analysis) = engine.effectiveness(subject, now) {
        let status = match analysis.status {
            TrendStatus::Increasing => "Tolerance increasing",
            TrendStatus::SlightIncrease => "Slight tolerance increase",
            TrendStatus::Improving => "Effectiveness improving",
            TrendStatus::Stable => "Stable",
        };
        println!();
        println!("  Effectiveness ({} days): {}", analysis.days_with_data, status);
        println!(
            "    Rating {:.1} → {:.1}, dosage {:+.0}%",
            analysis.early_effectiveness, analysis.recent_effectiveness, analysis.dosage_change_pct
        );
        for line in effectiveness_advice(&analysis) {
            println!("    • {}", line);
        }
    }

    println!();
    println!("  Tips:");
    for tip in tolerance_suggestions(tolerance, &history) {
        println!("    • {}", tip);
    }

    let efficiency = engine.method_efficiency(subject);
    if !efficiency.is_empty() {
        println!();
        println!("  Method efficiency:");
        for entry in efficiency {
            println!(
                "    {}: {:.2} ({} sessions)",
                entry.method.label(),
                entry.score,
                entry.sessions
            );
        }
    }

    println!();
    Ok(())
}

fn cmd_break(log_path: &Path, subject: &str, config: &Config) -> Result<()> {
    let (engine, _) = load_engine(log_path, &config.engine)?;
    let plan = engine.break_plan(subject, Utc::now());

    print_banner("TOLERANCE BREAK");
    println!(
        "  Suggested: {} days ({} break)",
        plan.suggested_days,
        plan.intensity.as_str()
    );
    println!(
        "  Average daily use: {:.1} {}",
        plan.avg_daily_dose, config.display.dose_unit
    );
    println!("  Sessions per day: {:.1}", plan.sessions_per_day);
    println!();
    Ok(())
}

fn cmd_export(log_path: &Path, subject: &str, out: &Path, all_subjects: bool) -> Result<()> {
    let records = read_events(log_path)?;

    let count = if all_subjects {
        export_csv(&records, out)?
    } else {
        export_csv(subject_records(&records, subject), out)?
    };

    println!("✓ Exported {} sessions", count);
    println!("  CSV: {}", out.display());
    Ok(())
}

fn print_banner(title: &str) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", title);
    println!("╰─────────────────────────────────────────╯");
    println!();
}

fn display_recommendation(rec: &Recommendation, unit: &str) {
    print_banner(&format!("{} DOSE", rec.target.label().to_uppercase()));
    println!("  {:.1}{} via {}", rec.dose, unit, rec.method.label());
    println!("  Strain: {}", rec.category.label());
    println!("  Timing: {}", rec.timing_hint);
    println!("  Confidence: {:.0}%", rec.confidence * 100.0);
    println!("  Tolerance: {:.1}x", rec.tolerance);
    println!();
    println!("  {}", rec.explanation);
    println!();
    println!("  Safety:");
    for tip in safety_guidelines(rec.dose, rec.method) {
        println!("    • {}", tip);
    }
    println!();
}
