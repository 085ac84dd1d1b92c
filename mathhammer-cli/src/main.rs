mod profile;
mod query;
mod reports;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use std::fs::{self, File};
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;

use mathhammer_engine::modifiers::VOCABULARY;
use mathhammer_engine::{Engine, EngineConfig, ProfileSet, TargetCatalog, TokenPolicy};
use profile::AttackArgs;

#[derive(Debug, Parser)]
#[command(name = "mathhammer", version)]
#[command(about = "Exact damage distributions for tabletop wargame attacks")]
struct Args {
    /// JSON file describing one or more profiles
    #[arg(long, conflicts_with = "query")]
    profile: Option<PathBuf>,

    /// Form state as a URL query string (e.g. `t_1=4&sv_1=3&sh_1_1=2d6`)
    #[arg(long)]
    query: Option<String>,

    #[command(flatten)]
    attack: AttackArgs,

    /// Drop trailing cumulative entries below this probability
    #[arg(long)]
    tail_threshold: Option<f64>,

    /// Fail on modifier tokens outside the vocabulary instead of dropping them
    #[arg(long)]
    strict: bool,

    /// List the modifier vocabulary and exit
    #[arg(long)]
    list_modifiers: bool,

    /// List bundled target profiles and exit
    #[arg(long)]
    list_targets: bool,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Include per-stage distributions in the console report
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list(&args)? {
        return Ok(());
    }

    let mut set = load_profiles(&args)?;
    if let Some(tail_threshold) = args.tail_threshold {
        set.config.tail_threshold = tail_threshold;
    }
    let engine = Engine::new(set.config).context("invalid engine configuration")?;
    let policy = if args.strict {
        TokenPolicy::Strict
    } else {
        TokenPolicy::Lenient
    };
    let reports = engine.compute_profiles(&set, policy)?;
    for report in &reports {
        for token in &report.results.rejected {
            eprintln!(
                "⚠️  {}: ignored modifier {}",
                report.results.name,
                token.yellow()
            );
        }
    }

    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report.as_str() {
        "json" => reports::generate_json_report(&mut output_target, &reports)?,
        "markdown" => reports::generate_markdown_report(&mut output_target, &reports)?,
        "csv" => reports::generate_csv_report(&mut output_target, &reports)?,
        _ => reports::generate_console_report(&mut output_target, &reports, args.verbose)?,
    }
    output_target.flush_inner()?;
    Ok(())
}

fn load_profiles(args: &Args) -> Result<ProfileSet> {
    if let Some(path) = &args.profile {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        return ProfileSet::from_json(&json)
            .with_context(|| format!("failed to parse {}", path.display()));
    }
    if let Some(raw) = &args.query {
        let set = query::parse_query(raw)?;
        if set.profiles.is_empty() {
            bail!("query string names no profiles");
        }
        return Ok(set);
    }
    Ok(ProfileSet {
        config: EngineConfig::default(),
        profiles: vec![args.attack.to_profile()],
    })
}

fn maybe_list(args: &Args) -> Result<bool> {
    if !args.list_modifiers && !args.list_targets {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    if args.list_modifiers {
        writeln!(output_target.writer(), "Available modifiers:")?;
        for (token, description) in VOCABULARY {
            writeln!(output_target.writer(), "  {token:40} - {description}")?;
        }
    }
    if args.list_targets {
        writeln!(output_target.writer(), "Available targets:")?;
        for preset in TargetCatalog::default_catalog() {
            let unit = preset.unit;
            writeln!(
                output_target.writer(),
                "  {:20} T{} {}+ save, {}++ invuln, {}+++ fnp, {}W - {}",
                preset.id,
                unit.toughness,
                unit.save,
                unit.invuln,
                unit.fnp,
                unit.wounds,
                preset.name
            )?;
        }
    }
    output_target.flush_inner()?;
    Ok(true)
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

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
