//! Arc Anatomy - command line tool
//!
//! `validate` runs the schema and pre-flight checks over a data directory;
//! `generate` builds one anatomy graph and prints it as JSON.

use arc_anatomy::anatomy::{AnatomyGenerator, SlotGraphBuilder};
use arc_anatomy::blueprints::AnatomyRegistry;
use arc_anatomy::core::{set_config, AnatomyConfig, Result};
use arc_anatomy::loader::load_directory;
use arc_anatomy::validation::{PreflightValidator, Stage, ValidationReport};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "arc-anatomy")]
#[command(about = "Generate and validate procedural anatomy graphs")]
struct Args {
    /// Generation config (TOML); defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ReportFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check documents without generating anything
    Validate {
        /// Data directory with blueprints/, templates/, recipes/ and parts/
        #[arg(long)]
        data: PathBuf,

        /// Only pre-flight this blueprint
        #[arg(long)]
        blueprint: Option<String>,

        /// Only pre-flight this recipe
        #[arg(long)]
        recipe: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },
    /// Generate one graph and print it as JSON
    Generate {
        #[arg(long)]
        data: PathBuf,

        #[arg(long)]
        blueprint: String,

        #[arg(long)]
        recipe: String,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("arc_anatomy=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Some(path) = &args.config {
        let config = AnatomyConfig::load(path)?;
        if let Err(msg) = config.validate() {
            tracing::error!("invalid config {}: {}", path.display(), msg);
            std::process::exit(2);
        }
        if set_config(config).is_err() {
            tracing::warn!("config already initialised; ignoring {}", path.display());
        }
    }
    let config = arc_anatomy::core::config();

    match args.command {
        Command::Validate {
            data,
            blueprint,
            recipe,
            format,
        } => {
            let (registry, schema_report) = load_directory(&data, config)?;
            let preflight = preflight_all(&registry, blueprint.as_deref(), recipe.as_deref(), config);

            let ok = schema_report.is_valid() && preflight.is_valid();
            if format == ReportFormat::Json {
                let reports = [&schema_report, &preflight];
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                print!("{}", schema_report);
                print!("{}", preflight);
            }
            if !ok {
                std::process::exit(1);
            }
        }
        Command::Generate {
            data,
            blueprint,
            recipe,
            pretty,
        } => {
            let (registry, schema_report) = load_directory(&data, config)?;
            for finding in schema_report.errors.iter().chain(&schema_report.warnings) {
                tracing::warn!("{}", finding);
            }

            match AnatomyGenerator::with_config(&registry, config).generate(&blueprint, &recipe) {
                Ok(graph) => {
                    let json = if pretty {
                        serde_json::to_string_pretty(&graph)?
                    } else {
                        serde_json::to_string(&graph)?
                    };
                    println!("{}", json);
                }
                Err(err) => {
                    tracing::error!(class = %err.class(), "{}", err);
                    if let Some(report) = err.report() {
                        eprint!("{}", report);
                    }
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

/// Pre-flight every selected blueprint against its recipes. A blueprint with
/// no recipes still gets its skeleton built.
fn preflight_all(
    registry: &AnatomyRegistry,
    blueprint: Option<&str>,
    recipe: Option<&str>,
    config: &AnatomyConfig,
) -> ValidationReport {
    let mut report = ValidationReport::new(Stage::PreFlight);
    let validator = PreflightValidator::new(config);

    let blueprint_ids: Vec<&str> = match blueprint {
        Some(id) => vec![id],
        None => registry.blueprint_ids(),
    };

    for id in blueprint_ids {
        let subject = format!("blueprint '{}'", id);
        let bp = match registry.get_blueprint(id) {
            Ok(bp) => bp,
            Err(err) => {
                report.absorb(&err, &subject);
                continue;
            }
        };
        let template = registry.template_for(bp);

        let recipes: Vec<_> = match recipe {
            Some(recipe_id) => match registry.get_recipe(recipe_id) {
                Ok(r) => vec![r],
                Err(err) => {
                    report.absorb(&err, &subject);
                    continue;
                }
            },
            None => registry.recipes_for(id).collect(),
        };

        if recipes.is_empty() {
            if let Err(err) = SlotGraphBuilder::new(config).build(bp, template) {
                report.absorb(&err, &subject);
            }
            continue;
        }
        for r in recipes {
            report.merge(validator.validate(bp, template, r, registry.catalog()));
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_format_is_checked() {
        let args = Args::try_parse_from(["arc-anatomy", "validate", "--data", "data", "--format", "json"]).unwrap();
        match args.command {
            Command::Validate { format, .. } => assert_eq!(format, ReportFormat::Json),
            other => panic!("Expected validate, got {:?}", other),
        }

        let args = Args::try_parse_from(["arc-anatomy", "validate", "--data", "data"]).unwrap();
        assert!(matches!(args.command, Command::Validate { format: ReportFormat::Text, .. }));

        assert!(Args::try_parse_from(["arc-anatomy", "validate", "--data", "data", "--format", "jsno"]).is_err());
    }
}
