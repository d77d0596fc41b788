mod common;
mod runtime;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use railway_core::EngineSettings;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;
use tokio::task::LocalSet;

use common::reports::{ScenarioResult, generate_console_report, generate_json_report};
use common::scenario::{SCENARIO_KEYS, ScenarioCtx, get_scenario, list_scenarios};
use common::split_csv;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "railway-tester", version)]
#[command(about = "Runs scripted tour scenarios against a simulated page")]
struct Args {
    /// Scenarios to run (comma-separated, or `all`)
    #[arg(long, default_value = "all")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report to instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Wait after scrolling an off-screen station into view
    #[arg(long, default_value_t = EngineSettings::default().settle_ms)]
    settle_ms: u32,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();
    let start_time = Instant::now();
    let keys = expand_scenarios(&args.scenarios);
    let ctx = ScenarioCtx {
        settings: EngineSettings {
            settle_ms: args.settle_ms,
            ..EngineSettings::default()
        },
        verbose: args.verbose,
    };

    let results = LocalSet::new()
        .run_until(run_scenarios(&keys, &ctx))
        .await;

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }
    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:20} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🚂 Railway Scenario Tester".bright_cyan().bold());
    println!("{}", "==========================".cyan());
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
        for key in SCENARIO_KEYS {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push((*key).to_string());
            }
        }
    }
    scenarios
}

async fn run_scenarios(keys: &[String], ctx: &ScenarioCtx) -> Vec<ScenarioResult> {
    let mut results = Vec::new();
    for key in keys {
        let scenario = match get_scenario(key) {
            Ok(scenario) => scenario,
            Err(err) => {
                eprintln!("⚠️  {}", err.to_string().yellow());
                continue;
            }
        };
        if ctx.verbose {
            println!("🧪 {}", scenario.name().bright_white());
        }
        let started = Instant::now();
        let outcome = scenario.run(ctx).await;
        let duration = started.elapsed();
        match &outcome {
            Ok(()) => log::info!("{key} passed in {duration:?}"),
            Err(err) => log::warn!("{key} failed: {err:#}"),
        }
        results.push(ScenarioResult::from_outcome(
            key,
            scenario.name(),
            &outcome,
            duration,
        ));
    }
    results
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report {
        ReportFormat::Json => generate_json_report(output_target.writer(), results)?,
        ReportFormat::Console => {
            if results.is_empty() {
                writeln!(output_target.writer(), "No scenarios executed.")?;
            } else {
                generate_console_report(output_target.writer(), results, start_time.elapsed())?;
            }
            writeln!(output_target.writer())?;
            writeln!(
                output_target.writer(),
                "🏁 Total time: {:?}",
                start_time.elapsed()
            )?;
        }
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}
