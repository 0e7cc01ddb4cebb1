//! Controlled-vocabulary identifier CLI
//!
//! Parses, builds and generates configurations for climate-archive
//! identifiers.
//!
//! # Usage
//!
//! ```bash
//! # Parse one or more dataset identifiers
//! cv_cli parse wcrp:cmip6 dataset CMIP6.FAFMIP.IPSL.IPSL-CM6A-LR.amip.r1i1p1f1.Amon.abs550aer.gm
//!
//! # Build a filename from terms and a time range
//! cv_cli build wcrp:cmip5 filename --term wcrp:cmip5:variable:tas ... --value time_range=185001-198912
//!
//! # Compile a scope's template into a configuration document
//! cv_cli generate wcrp:cmip5 filename --out parsers/
//! ```

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::process::ExitCode;

use cv_parser::{
    Archive, ConfigStore, FileConfigStore, IdentifierEngine, IdentifierError, IdentifierType,
    LayeredStore, MatchedTerm, Matcher, Namespace, ScopeTemplateStore, Strictness,
    TemplateCompiler, VirtualTerm, VocabularyLookup,
};

#[derive(Parser)]
#[command(name = "cv_cli")]
#[command(version = "0.1.0")]
#[command(about = "Parse and build controlled-vocabulary identifiers")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory of JSON authority documents
    #[arg(long, global = true, env = "CV_ARCHIVE_DIR", default_value = "archive")]
    archive: PathBuf,

    /// Directory of parser configuration documents; scope templates are
    /// compiled on the fly when absent or when a document is missing
    #[arg(long, global = true, env = "CV_PARSER_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', global = true, default_value = "text", value_enum)]
    format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse identifiers and print the matched terms of each
    Parse {
        /// Scope namespace, e.g. wcrp:cmip6
        scope: String,
        /// dataset, directory or filename
        identifier_type: String,
        identifiers: Vec<String>,
        /// Matching strictness, 0 (canonical only) to 4 (case-insensitive)
        #[arg(long, short, default_value_t = 2)]
        strictness: u8,
    },

    /// Build an identifier from term namespaces and expression values
    Build {
        scope: String,
        identifier_type: String,
        /// Term namespace (authority:scope:collection:term), repeatable
        #[arg(long = "term", short)]
        terms: Vec<String>,
        /// Expression slot value as placeholder=value, repeatable
        #[arg(long = "value", short)]
        values: Vec<String>,
    },

    /// Compile a scope's template into a parser configuration document
    Generate {
        scope: String,
        identifier_type: String,
        /// Write under this configuration root instead of printing
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

// =============================================================================
// MAIN
// =============================================================================

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = cli.format;

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            if format == OutputFormat::Json {
                println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
            } else {
                eprintln!("{}: {:#}", "error".red().bold(), e);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let archive = Archive::from_dir(&cli.archive)
        .with_context(|| format!("loading archive from {}", cli.archive.display()))?;
    let store: Box<dyn ConfigStore + '_> = match &cli.config_dir {
        Some(dir) => Box::new(LayeredStore::new(
            FileConfigStore::new(dir),
            ScopeTemplateStore::new(&archive),
        )),
        None => Box::new(ScopeTemplateStore::new(&archive)),
    };
    let engine = IdentifierEngine::new(&archive, store);

    match cli.command {
        Commands::Parse {
            scope,
            identifier_type,
            identifiers,
            strictness,
        } => cmd_parse(&engine, &scope, &identifier_type, &identifiers, strictness, cli.format),
        Commands::Build {
            scope,
            identifier_type,
            terms,
            values,
        } => cmd_build(&engine, &scope, &identifier_type, &terms, &values, cli.format),
        Commands::Generate {
            scope,
            identifier_type,
            out,
        } => cmd_generate(&archive, &scope, &identifier_type, out, cli.format),
    }
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

type Engine<'a> = IdentifierEngine<&'a Archive, Box<dyn ConfigStore + 'a>>;

fn cmd_parse(
    engine: &Engine<'_>,
    scope: &str,
    identifier_type: &str,
    identifiers: &[String],
    strictness: u8,
    format: OutputFormat,
) -> Result<ExitCode> {
    let identifier_type = parse_identifier_type(identifier_type)?;
    let strictness = Strictness::try_from(strictness)?;
    if identifiers.is_empty() {
        bail!("no identifiers given");
    }

    let results = engine.parse_identifier_each(scope, identifier_type, identifiers, strictness);
    let failed = results.iter().filter(|r| r.is_err()).count();

    match format {
        OutputFormat::Json => {
            let items: Vec<_> = identifiers
                .iter()
                .zip(&results)
                .map(|(identifier, result)| match result {
                    Ok(terms) => serde_json::json!({
                        "identifier": identifier,
                        "valid": true,
                        "terms": terms,
                    }),
                    Err(e) => serde_json::json!({
                        "identifier": identifier,
                        "valid": false,
                        "error": e.to_string(),
                        "element_index": e.element_index(),
                    }),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        OutputFormat::Text => {
            for (identifier, result) in identifiers.iter().zip(&results) {
                match result {
                    Ok(terms) => {
                        println!("{} {}", "OK".green(), identifier);
                        for term in terms {
                            println!("  {}", term);
                        }
                    }
                    Err(e) => println!("{} {}\n  {}", "FAIL".red(), identifier, e),
                }
            }
            println!("{} valid, {} invalid", identifiers.len() - failed, failed);
        }
    }

    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_build(
    engine: &Engine<'_>,
    scope: &str,
    identifier_type: &str,
    terms: &[String],
    values: &[String],
    format: OutputFormat,
) -> Result<ExitCode> {
    let identifier_type = parse_identifier_type(identifier_type)?;
    let terms = terms
        .iter()
        .map(|namespace| resolve_term(engine.vocabulary(), namespace))
        .collect::<Result<BTreeSet<_>>>()?;
    let values = values
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| anyhow!("expected placeholder=value, got '{}'", pair))
        })
        .collect::<Result<BTreeMap<_, _>>>()?;

    let identifier = engine.build_identifier(scope, identifier_type, &terms, &values)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "identifier": identifier })),
        OutputFormat::Text => println!("{}", identifier),
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_generate(
    archive: &Archive,
    scope: &str,
    identifier_type: &str,
    out: Option<PathBuf>,
    format: OutputFormat,
) -> Result<ExitCode> {
    let identifier_type = parse_identifier_type(identifier_type)?;
    let node = archive
        .scope(scope)
        .ok_or_else(|| IdentifierError::UnknownScope(scope.to_string()))?;
    let raw = TemplateCompiler::compile_scope(node, identifier_type)?.ok_or_else(|| {
        IdentifierError::ConfigurationNotFound {
            scope: node.namespace().to_string(),
            identifier_type,
        }
    })?;

    match out {
        Some(root) => {
            let path = FileConfigStore::new(root).write(&raw)?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::json!({ "written": path.display().to_string() }))
                }
                OutputFormat::Text => println!("{} {}", "Wrote".green(), path.display()),
            }
        }
        None => println!("{}", serde_json::to_string_pretty(&raw)?),
    }
    Ok(ExitCode::SUCCESS)
}

// =============================================================================
// HELPERS
// =============================================================================

fn parse_identifier_type(value: &str) -> Result<IdentifierType> {
    value
        .parse::<IdentifierType>()
        .map_err(|e| IdentifierError::from(e).into())
}

/// A vocabulary term, or a name accepted by a virtual collection
fn resolve_term(archive: &Archive, namespace: &str) -> Result<MatchedTerm> {
    if let Some(term) = archive.term(namespace) {
        return Ok(MatchedTerm::from(term.clone()));
    }

    let parsed = Namespace::parse(namespace)?;
    let collection = parsed
        .parent()
        .and_then(|parent| archive.collection(&parent.to_string()))
        .filter(|c| c.is_virtual())
        .ok_or_else(|| anyhow!("term '{}' not found", namespace))?;

    // Namespace parsing lower-cases segments; match the name as typed
    let name = namespace.rsplit(':').next().unwrap_or_default().trim();
    if !Matcher::new()
        .is_matched(collection, name, Strictness::default())
        .is_match()
    {
        bail!(
            "'{}' is not accepted by virtual collection '{}'",
            name,
            collection.namespace()
        );
    }
    Ok(MatchedTerm::from(VirtualTerm::new(
        collection.namespace().clone(),
        name,
    )))
}
