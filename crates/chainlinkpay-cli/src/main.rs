mod display;
mod draft;

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chainlinkpay_contracts::{
    FingerprintAlgorithm, IntegrityChecker, UnverifiablePolicy, registry,
};
use chainlinkpay_core::{TemplateId, TemplateInput};
use chainlinkpay_intent::MapperConfig;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::draft::{Drafted, Pipeline, parse_assignments};

#[derive(Parser)]
#[command(name = "chainlinkpay", version)]
#[command(about = "Draft Clarity payment contracts from plain-language requests")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Output format
    #[arg(long, global = true, default_value = "pretty", value_enum)]
    format: OutputFormat,

    /// Fingerprint algorithm for the template integrity gate
    #[arg(long, global = true, env = "CHAINLINKPAY_INTEGRITY_ALGORITHM", default_value = "sha256")]
    algorithm: FingerprintAlgorithm,

    /// What to do when a template's integrity cannot be checked: trust or reject
    #[arg(long, global = true, env = "CHAINLINKPAY_ON_UNVERIFIABLE", default_value = "trust")]
    on_unverifiable: UnverifiablePolicy,

    /// JSON array of templates replacing built-ins of the same id, each with
    /// its expected `fingerprints`
    #[arg(long, global = true, env = "CHAINLINKPAY_TEMPLATES")]
    templates: Option<PathBuf>,

    /// Blocks per day when converting day-based periods
    #[arg(long, global = true, env = "CHAINLINKPAY_BLOCKS_PER_DAY", default_value_t = 144)]
    blocks_per_day: u64,

    /// Exit non-zero on validation errors or when no template matches
    #[arg(long, global = true)]
    strict: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Extract parameters from text and map them to a template
    Interpret {
        text: String,
    },

    /// Fill a template and validate the result
    Generate {
        /// ESCROW, SPLIT or SUBSCRIPTION
        #[arg(short, long)]
        template: TemplateId,

        /// Placeholder value as key=value (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Seed placeholder values from a plain-language request
        #[arg(long)]
        from_text: Option<String>,
    },

    /// Interpret, generate and validate in one step
    Draft {
        text: String,

        /// Placeholder value as key=value (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },

    /// Validate Clarity source (reads stdin if no file is given)
    Validate {
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// List registered templates with their integrity status
    Templates {
        /// Print one template's placeholders and source
        #[arg(long)]
        show: Option<TemplateId>,
    },

    /// Print both fingerprints of a source (reads stdin if no file is given)
    Fingerprint {
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Run one command. `Ok(false)` means it completed but should exit non-zero:
/// a draft could not be generated, or `--strict` found a validation error or
/// an unmatched request.
fn run(cli: &Cli) -> anyhow::Result<bool> {
    let pipeline = build_pipeline(cli)?;

    match &cli.command {
        Command::Interpret { text } => {
            let intent = pipeline.interpret(text);
            match cli.format {
                OutputFormat::Json => print_json(&intent)?,
                OutputFormat::Pretty => display::print_intent(&intent),
            }
            Ok(true)
        }
        Command::Generate {
            template,
            set,
            from_text,
        } => {
            let mut input = match from_text {
                Some(text) => pipeline.interpret(text).to_template_input(),
                None => TemplateInput::new(),
            };
            input.extend(parse_assignments(set)?);
            let draft = pipeline.generate(*template, &input)?;
            match cli.format {
                OutputFormat::Json => print_json(&draft)?,
                OutputFormat::Pretty => display::print_draft(&draft),
            }
            Ok(!(cli.strict && draft.has_errors()))
        }
        Command::Draft { text, set } => {
            let outcome = pipeline.draft(text, parse_assignments(set)?);
            match cli.format {
                OutputFormat::Json => print_json(&outcome)?,
                OutputFormat::Pretty => display::print_outcome(&outcome),
            }
            Ok(match &outcome.drafted {
                Drafted::Failed { .. } => false,
                Drafted::NoTemplate => !cli.strict,
                Drafted::Generated { draft } => !(cli.strict && draft.has_errors()),
            })
        }
        Command::Validate { file } => {
            let source = read_input(file.as_ref())?;
            let issues = chainlinkpay_contracts::validate_clarity_source(&source);
            match cli.format {
                OutputFormat::Json => print_json(&issues)?,
                OutputFormat::Pretty => display::print_issues(&issues),
            }
            Ok(!(cli.strict && issues.iter().any(|i| i.is_error())))
        }
        Command::Templates { show: Some(id) } => {
            let template = pipeline
                .registry()
                .get(*id)
                .with_context(|| format!("no template registered for {id}"))?;
            match cli.format {
                OutputFormat::Json => print_json(template)?,
                OutputFormat::Pretty => display::print_template(template),
            }
            Ok(true)
        }
        Command::Templates { show: None } => {
            let summaries = pipeline.registry().describe(pipeline.checker());
            match cli.format {
                OutputFormat::Json => print_json(&summaries)?,
                OutputFormat::Pretty => display::print_summaries(&summaries),
            }
            Ok(true)
        }
        Command::Fingerprint { file } => {
            let source = read_input(file.as_ref())?;
            let fingerprints: Vec<(&str, String)> =
                [FingerprintAlgorithm::Sha256, FingerprintAlgorithm::Rolling32]
                    .into_iter()
                    .map(|alg| (alg.as_str(), alg.fingerprint(&source)))
                    .collect();
            match cli.format {
                OutputFormat::Json => {
                    let map: std::collections::BTreeMap<_, _> =
                        fingerprints.into_iter().collect();
                    print_json(&map)?
                }
                OutputFormat::Pretty => display::print_fingerprints(&fingerprints),
            }
            Ok(true)
        }
    }
}

fn build_pipeline(cli: &Cli) -> anyhow::Result<Pipeline> {
    let checker = IntegrityChecker::builtin(cli.algorithm).with_policy(cli.on_unverifiable);
    let mapper = MapperConfig {
        blocks_per_day: cli.blocks_per_day,
        ..MapperConfig::default()
    };
    let pipeline = Pipeline::new(registry().clone(), checker, mapper);
    match &cli.templates {
        Some(path) => pipeline.with_template_overrides(path),
        None => Ok(pipeline),
    }
}

fn read_input(file: Option<&PathBuf>) -> anyhow::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            Ok(buf)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
