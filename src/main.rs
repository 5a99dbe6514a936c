use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use ldforge_core::types::{OrgConfig, PageClassification, Rule, Severity};
use ldforge_core::url_utils::normalize_origin;
use ldforge_core::{canonicalize, check_charter, parse_graph, select_rule, to_pretty_string, validate};
use serde_json::Value as JsonValue;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const APP_NAME: &str = "ldforge";
const VERSION: &str = env!("CARGO_PKG_VERSION");

struct CanonicalizeOptions {
    graph: PathBuf,
    html: Option<PathBuf>,
    classification: PathBuf,
    origin: Option<String>,
    org: Option<PathBuf>,
}

struct ValidateOptions {
    graph: PathBuf,
    origin: Option<String>,
}

struct SelectRuleOptions {
    classification: PathBuf,
    rules: PathBuf,
}

enum CliCommand {
    Canonicalize(CanonicalizeOptions),
    Validate(ValidateOptions),
    SelectRule(SelectRuleOptions),
    Help,
    Version,
}

fn parse_arguments(args: &[String]) -> Result<CliCommand> {
    let Some(subcommand) = args.first() else {
        return Ok(CliCommand::Help);
    };

    if matches!(subcommand.as_str(), "-h" | "--help" | "help") {
        return Ok(CliCommand::Help);
    }
    if matches!(subcommand.as_str(), "-v" | "--version") {
        return Ok(CliCommand::Version);
    }

    let rest = &args[1..];
    match subcommand.as_str() {
        "canonicalize" => parse_canonicalize(rest),
        "validate" => parse_validate(rest),
        "select-rule" => parse_select_rule(rest),
        other => Err(anyhow!("unknown subcommand: {other}")),
    }
}

/// Consume the value following a `--flag`, erroring when it is missing
fn flag_value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str> {
    args.get(i + 1)
        .map(|s| s.as_str())
        .ok_or_else(|| anyhow!("{flag} requires a value"))
}

fn parse_canonicalize(args: &[String]) -> Result<CliCommand> {
    let mut graph: Option<PathBuf> = None;
    let mut html: Option<PathBuf> = None;
    let mut classification: Option<PathBuf> = None;
    let mut origin: Option<String> = None;
    let mut org: Option<PathBuf> = None;
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => return Ok(CliCommand::Help),
            "--graph" => {
                graph = Some(PathBuf::from(flag_value(args, i, "--graph")?));
                i += 2;
            }
            "--html" => {
                html = Some(PathBuf::from(flag_value(args, i, "--html")?));
                i += 2;
            }
            "--classification" => {
                classification = Some(PathBuf::from(flag_value(args, i, "--classification")?));
                i += 2;
            }
            "--origin" => {
                origin = Some(flag_value(args, i, "--origin")?.to_string());
                i += 2;
            }
            "--org" => {
                org = Some(PathBuf::from(flag_value(args, i, "--org")?));
                i += 2;
            }
            other => return Err(anyhow!("unknown argument: {other}")),
        }
    }

    let graph = graph.ok_or_else(|| anyhow!("missing --graph <file>"))?;
    let classification =
        classification.ok_or_else(|| anyhow!("missing --classification <file>"))?;

    Ok(CliCommand::Canonicalize(CanonicalizeOptions {
        graph,
        html,
        classification,
        origin,
        org,
    }))
}

fn parse_validate(args: &[String]) -> Result<CliCommand> {
    let mut graph: Option<PathBuf> = None;
    let mut origin: Option<String> = None;
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => return Ok(CliCommand::Help),
            "--graph" => {
                graph = Some(PathBuf::from(flag_value(args, i, "--graph")?));
                i += 2;
            }
            "--origin" => {
                origin = Some(flag_value(args, i, "--origin")?.to_string());
                i += 2;
            }
            other => return Err(anyhow!("unknown argument: {other}")),
        }
    }

    let graph = graph.ok_or_else(|| anyhow!("missing --graph <file>"))?;
    Ok(CliCommand::Validate(ValidateOptions { graph, origin }))
}

fn parse_select_rule(args: &[String]) -> Result<CliCommand> {
    let mut classification: Option<PathBuf> = None;
    let mut rules: Option<PathBuf> = None;
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => return Ok(CliCommand::Help),
            "--classification" => {
                classification = Some(PathBuf::from(flag_value(args, i, "--classification")?));
                i += 2;
            }
            "--rules" => {
                rules = Some(PathBuf::from(flag_value(args, i, "--rules")?));
                i += 2;
            }
            other => return Err(anyhow!("unknown argument: {other}")),
        }
    }

    let classification =
        classification.ok_or_else(|| anyhow!("missing --classification <file>"))?;
    let rules = rules.ok_or_else(|| anyhow!("missing --rules <file>"))?;
    Ok(CliCommand::SelectRule(SelectRuleOptions {
        classification,
        rules,
    }))
}

fn print_help() {
    println!("{APP_NAME} — structured-data canonicalization toolkit");
    println!("Usage: {APP_NAME} <COMMAND> [OPTIONS]\n");
    println!("Commands:");
    println!("  canonicalize   Canonicalize a draft JSON-LD graph");
    println!("      --graph <file>           Draft graph JSON (required)");
    println!("      --classification <file>  Page classification JSON (required)");
    println!("      --html <file>            Rendered page markup for image resolution");
    println!("      --origin <url>           Canonical origin, defaults to the org URL");
    println!("      --org <file>             Organization config JSON, defaults built in");
    println!("  validate       Validate a graph without modifying it");
    println!("      --graph <file>           Graph JSON (required)");
    println!("      --origin <url>           Origin for membership warnings");
    println!("  select-rule    Pick the most specific generation rule");
    println!("      --classification <file>  Page classification JSON (required)");
    println!("      --rules <file>           Rule set JSON array (required)");
    println!("\nOptions:");
    println!("  -v, --version  Show version information");
    println!("  -h, --help     Show this help message");
}

fn print_version() {
    println!("{APP_NAME} {VERSION}");
}

/// Fallback configuration baked into the binary, for quick local runs
fn default_org_config() -> OrgConfig {
    OrgConfig {
        name: "Glen Ardach Distillery".to_string(),
        url: "https://www.glenardach.example/".to_string(),
        description: "Independent highland distillery, est. 1897.".to_string(),
        logo_url: "https://www.glenardach.example/img/site-logo.png".to_string(),
        same_as: Vec::new(),
        founding_year: 1897,
        founder: "A. Ardach".to_string(),
        street_address: "1 Distillery Lane".to_string(),
        address_locality: "Glen Ardach".to_string(),
        postal_code: "AB12 3CD".to_string(),
        address_country: "GB".to_string(),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf, what: &str) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {} file {}", what, path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {} file {}", what, path.display()))
}

fn run_canonicalize(options: &CanonicalizeOptions) -> Result<ExitCode> {
    let raw_graph = fs::read_to_string(&options.graph)
        .with_context(|| format!("failed to read graph file {}", options.graph.display()))?;
    let draft = parse_graph(&raw_graph)
        .with_context(|| format!("draft graph {} is unusable", options.graph.display()))?;

    let classification: PageClassification =
        read_json(&options.classification, "classification")?;
    let org = match &options.org {
        Some(path) => read_json::<OrgConfig>(path, "organization config")?,
        None => default_org_config(),
    };

    let html = match &options.html {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read HTML file {}", path.display()))?,
        None => String::new(),
    };

    let origin = options
        .origin
        .clone()
        .unwrap_or_else(|| normalize_origin(&org.url));
    debug!(%origin, "canonicalizing draft graph");

    let canonical = canonicalize(&draft, &classification, &html, &org, &origin);
    println!("{}", to_pretty_string(&canonical)?);

    let report = validate(&serde_json::to_value(&canonical)?, Some(&origin));
    for issue in &report.issues {
        let tag = match issue.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        eprintln!("{tag}[{}]: {}", issue.category, issue.message);
    }
    for warning in check_charter(&canonical, &classification) {
        eprintln!("charter: {warning}");
    }

    if report.valid {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn run_validate(options: &ValidateOptions) -> Result<ExitCode> {
    let raw = fs::read_to_string(&options.graph)
        .with_context(|| format!("failed to read graph file {}", options.graph.display()))?;
    let value: JsonValue = serde_json::from_str(&raw)
        .with_context(|| format!("graph file {} is not JSON", options.graph.display()))?;

    let report = validate(&value, options.origin.as_deref());
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.valid {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn run_select_rule(options: &SelectRuleOptions) -> Result<ExitCode> {
    let classification: PageClassification =
        read_json(&options.classification, "classification")?;
    let rules: Vec<Rule> = read_json(&options.rules, "rules")?;

    match select_rule(&classification, &rules) {
        Some(rule) => {
            println!("{}", serde_json::to_string_pretty(rule)?);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("no rule matches the supplied classification");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let raw_args = env::args().skip(1).collect::<Vec<_>>();
    match parse_arguments(&raw_args)? {
        CliCommand::Canonicalize(options) => run_canonicalize(&options),
        CliCommand::Validate(options) => run_validate(&options),
        CliCommand::SelectRule(options) => run_select_rule(&options),
        CliCommand::Help => {
            print_help();
            Ok(ExitCode::SUCCESS)
        }
        CliCommand::Version => {
            print_version();
            Ok(ExitCode::SUCCESS)
        }
    }
}
