//! ossa-validate - thin CLI over the compliance engine
//!
//! Commands: validate, extension, contract, extensions, rules
//! Results go to stdout, logs to stderr.
//! Exit codes: 0 valid, 2 invalid, 1 usage or configuration error.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use ossa_compliance::{
    render, Engine, EngineError, Manifest, OutputFormat, SubjectType, ValidationContext,
    ValidationOptions,
};

#[derive(Parser)]
#[command(name = "ossa-validate")]
#[command(about = "Validate OSSA manifests and compute a compliance score")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Debug logging (overridden by OSSA_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a manifest
    Validate {
        /// Manifest file (JSON)
        #[arg(short, long)]
        manifest: PathBuf,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Detailed)]
        format: OutputFormat,

        /// Options file (JSON); flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long)]
        strict: bool,

        #[arg(long)]
        include_drafts: bool,

        #[arg(long)]
        skip_optional: bool,
    },

    /// Run a single extension validator
    Extension {
        /// Extension name, e.g. cursor
        #[arg(short, long)]
        name: String,

        /// Manifest file (JSON)
        #[arg(short, long)]
        manifest: PathBuf,
    },

    /// Validate an OpenAPI contract document
    Contract {
        /// OpenAPI document (JSON)
        #[arg(short, long)]
        document: PathBuf,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Detailed)]
        format: OutputFormat,

        #[arg(long)]
        strict: bool,
    },

    /// List registered extension validators
    Extensions,

    /// List built-in structural rules
    Rules,
}

fn init_tracing(verbose: bool, json: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("OSSA_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read_json(path: &Path) -> Result<serde_json::Value, EngineError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn fail(error: impl std::fmt::Display) -> ExitCode {
    let output = serde_json::json!({"valid": false, "error": error.to_string()});
    println!("{}", output);
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let engine = match Engine::with_builtin() {
        Ok(e) => e,
        Err(e) => return fail(e),
    };

    match cli.command {
        Commands::Validate {
            manifest,
            format,
            config,
            strict,
            include_drafts,
            skip_optional,
        } => {
            let options = match config {
                Some(path) => match ValidationOptions::from_json_file(&path) {
                    Ok(o) => o,
                    Err(e) => return fail(e),
                },
                None => ValidationOptions::default(),
            };
            let options = ValidationOptions {
                strict: options.strict || strict,
                include_drafts: options.include_drafts || include_drafts,
                skip_optional: options.skip_optional || skip_optional,
                ..options
            };

            let result = match read_json(&manifest).and_then(|v| engine.validate_value(v, options)) {
                Ok(r) => r,
                Err(e) => return fail(e),
            };
            match render(&result, format) {
                Ok(text) => {
                    print!("{}", text);
                    ExitCode::from(result.exit_code())
                }
                Err(e) => fail(e),
            }
        }

        Commands::Extension { name, manifest } => {
            let report = read_json(&manifest)
                .and_then(Manifest::from_value)
                .and_then(|m| engine.validate_extension(&name, &m));
            match report {
                Ok(report) => {
                    let valid = report.valid();
                    let output = serde_json::json!({
                        "extension": name,
                        "valid": valid,
                        "errors": report.errors,
                        "warnings": report.warnings,
                    });
                    match serde_json::to_string_pretty(&output) {
                        Ok(text) => println!("{}", text),
                        Err(e) => return fail(e),
                    }
                    if valid {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::from(2)
                    }
                }
                Err(e) => fail(e),
            }
        }

        Commands::Contract {
            document,
            format,
            strict,
        } => {
            let doc = match read_json(&document) {
                Ok(d) => d,
                Err(e) => return fail(e),
            };
            let version = doc
                .get("openapi")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string();
            let ctx = ValidationContext::new(
                SubjectType::ApiContract,
                version,
                ValidationOptions::default().with_strict(strict),
            );
            match engine
                .validate_contract(&doc, &ctx)
                .and_then(|r| Ok((render(&r, format)?, r.exit_code())))
            {
                Ok((text, code)) => {
                    print!("{}", text);
                    ExitCode::from(code)
                }
                Err(e) => fail(e),
            }
        }

        Commands::Extensions => {
            let listing: Vec<_> = engine
                .registry()
                .iter()
                .map(|v| {
                    serde_json::json!({
                        "name": v.name(),
                        "scope": v.scope().to_string(),
                        "description": v.description(),
                        "experimental": v.experimental(),
                        "checks": v.field_checks().len(),
                    })
                })
                .collect();
            match serde_json::to_string_pretty(&listing) {
                Ok(text) => {
                    println!("{}", text);
                    ExitCode::SUCCESS
                }
                Err(e) => fail(e),
            }
        }

        Commands::Rules => {
            for rule in engine.structural().rules() {
                println!(
                    "{:<20} {:<10} {:<8} {:<9} {}",
                    rule.name(),
                    rule.scope().to_string(),
                    rule.severity().to_string(),
                    if rule.mandatory() { "mandatory" } else { "optional" },
                    rule.description()
                );
            }
            ExitCode::SUCCESS
        }
    }
}
