//! colevo CLI: manage schema versions and convert player records.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use colevo_convert::ConversionEngine;
use colevo_core::config::EngineConfig;
use colevo_core::player::{player_schema, PLAYER_SCHEMA_VERSION};
use colevo_core::record::Record;
use colevo_core::schema::Schema;
use colevo_exec::WorkerPool;
use colevo_schema::{compare_schemas, ChangeKind, EvolutionAnalyzer, Registry, SchemaValidator};

#[derive(Parser)]
#[command(name = "colevo")]
#[command(about = "Columnar conversion and schema evolution for player records", long_about = None)]
struct Cli {
    /// YAML engine configuration (environment and flags override it)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Schema document directory (overrides config)
    #[arg(long, global = true)]
    schema_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register the built-in player schema as version 1 if absent
    Init,

    /// Register a schema document as a new version
    Register {
        /// Version number to register under
        #[arg(short, long)]
        version: u32,

        /// Path to a schema JSON file (`{"fields": [...]}`)
        #[arg(short, long)]
        schema: PathBuf,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// List registered versions
    History,

    /// Compare two schemas (version numbers or schema file paths)
    Diff { old: String, new: String },

    /// Plan a migration between two registered versions
    Plan {
        #[arg(long)]
        from: u32,

        #[arg(long)]
        to: u32,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert JSON-lines records to a table and report column statistics
    Convert {
        /// Path to a file with one JSON record per line
        #[arg(short, long)]
        input: PathBuf,

        /// Schema version to convert against (default: current)
        #[arg(short, long)]
        version: Option<u32>,
    },

    /// Check a schema file against the required fields and the current version
    Validate {
        #[arg(short, long)]
        schema: PathBuf,
    },
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        if let Some(core) = e.downcast_ref::<colevo_core::error::Error>() {
            for hint in core.suggestions() {
                eprintln!("  hint: {}", hint);
            }
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = load_config(cli.config.as_deref(), cli.schema_dir)?;
    tracing::debug!(schema_dir = %config.schema_dir.display(), "configuration loaded");

    match cli.command {
        Commands::Init => {
            let registry = Registry::from_config(&config)?;
            if registry.bootstrap(PLAYER_SCHEMA_VERSION, &player_schema())? {
                println!("✓ Registered player schema as version {}", PLAYER_SCHEMA_VERSION);
            } else {
                println!("Version {} already registered", PLAYER_SCHEMA_VERSION);
            }
        }
        Commands::Register {
            version,
            schema,
            description,
        } => {
            let registry = Registry::from_config(&config)?;
            let schema = read_schema(&schema)?;
            match description {
                Some(desc) => registry.register_with_description(version, &schema, desc)?,
                None => registry.register(version, &schema)?,
            }
            println!("✓ Registered version {} ({} fields)", version, schema.len());
            println!("  Digest: {}", schema.digest());
        }
        Commands::History => {
            let registry = Registry::from_config(&config)?;
            let history = registry.history();
            if history.is_empty() {
                println!("No schema versions registered in {}", config.schema_dir.display());
            }
            for v in history {
                println!(
                    "v{:<4} {:>3} fields  {}  {}",
                    v.version,
                    v.schema.len(),
                    v.created_at.to_rfc3339(),
                    v.description
                );
            }
        }
        Commands::Diff { old, new } => {
            let registry = Arc::new(Registry::from_config(&config)?);
            let old = resolve_schema(&registry, &old)?;
            let new = resolve_schema(&registry, &new)?;
            let analyzer = EvolutionAnalyzer::from_config(Arc::clone(&registry), &config);
            let evolution = analyzer.diff(&old, &new)?;

            println!("Schema Diff (v{} -> v{})", evolution.from_version, evolution.to_version);
            println!("======================");
            let comparison = compare_schemas(&old, &new);
            for change in &comparison.changes {
                let marker = match change.kind {
                    ChangeKind::Added => '+',
                    ChangeKind::Removed => '-',
                    ChangeKind::Modified => '~',
                };
                println!("  {} {}: {}", marker, change.field_name, change.description);
            }
            if comparison.changes.is_empty() {
                println!("  (no changes)");
            }
            println!();
            println!(
                "Compatible: {}",
                if evolution.compatible { "yes" } else { "no" }
            );
        }
        Commands::Plan { from, to, json } => {
            let registry = Arc::new(Registry::from_config(&config)?);
            let analyzer = EvolutionAnalyzer::from_config(registry, &config);
            let plan = analyzer.plan_migration(from, to)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
                return Ok(());
            }

            println!("Migration Plan v{} -> v{}", plan.from_version, plan.to_version);
            println!("======================");
            for (i, step) in plan.steps.iter().enumerate() {
                println!(
                    "  {}. {:<14} {}{}{}",
                    i + 1,
                    step.step_type,
                    step.description,
                    if step.required { "" } else { " (optional)" },
                    if step.reversible { "" } else { " [irreversible]" }
                );
            }
            if plan.is_empty() {
                println!("  (nothing to do)");
            }
            println!();
            println!("Reversible: {}", if plan.reversible { "yes" } else { "no" });
            println!("Estimated duration: {}s", plan.estimated_duration.as_secs());
        }
        Commands::Convert { input, version } => {
            let registry = Registry::from_config(&config)?;
            let schema = match version {
                Some(v) => registry.by_version(v)?,
                None => registry.current()?,
            };
            let records = read_records(&input)?;

            let engine = ConversionEngine::from_config(&config);
            let table = Arc::new(engine.to_table(&records, &schema)?);
            println!(
                "✓ Converted {} records into {} columns",
                table.num_rows(),
                table.num_columns()
            );

            let pool = WorkerPool::from_config(&config)?;
            let stats = pool.submit_stats(Arc::clone(&table))?.wait()?;
            for field in schema.fields() {
                let Some(col) = stats.get(&field.name) else {
                    continue;
                };
                let bound = |v: &Option<colevo_core::record::Scalar>| {
                    v.as_ref().map(|s| s.render()).unwrap_or_else(|| "-".into())
                };
                println!(
                    "  {:<24} {:<10} nulls={:<6} min={:<12} max={}",
                    field.name,
                    field.data_type,
                    col.null_count,
                    bound(&col.min),
                    bound(&col.max)
                );
            }
            pool.shutdown();
        }
        Commands::Validate { schema } => {
            let schema = read_schema(&schema)?;
            SchemaValidator::from_config(&config).validate(&schema)?;
            println!("✓ Schema has every required field");

            let registry = Registry::from_config(&config)?;
            if let Some(current) = registry.current_version() {
                let current_schema = registry.by_version(current)?;
                registry
                    .validator()
                    .validate_compatibility(&current_schema, &schema)?;
                println!("✓ Backward compatible with version {}", current);
            }
        }
    }

    Ok(())
}

/// Defaults, then the YAML file, then `COLEVO_*` variables, then flags.
fn load_config(path: Option<&Path>, schema_dir: Option<PathBuf>) -> CliResult<EngineConfig> {
    let mut config = match path {
        Some(path) => serde_yaml::from_str::<EngineConfig>(&fs::read_to_string(path)?)?,
        None => EngineConfig::default(),
    };
    config.apply_env();
    if let Some(dir) = schema_dir {
        config.schema_dir = dir;
    }
    config.validate()?;
    Ok(config)
}

fn read_schema(path: &Path) -> CliResult<Schema> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// A version number resolves through the registry; anything else is a file.
fn resolve_schema(registry: &Registry, arg: &str) -> CliResult<Schema> {
    let version = arg.strip_prefix('v').unwrap_or(arg);
    match version.parse::<u32>() {
        Ok(v) => Ok(registry.by_version(v)?.as_ref().clone()),
        Err(_) => read_schema(Path::new(arg)),
    }
}

fn read_records(path: &Path) -> CliResult<Vec<Record>> {
    let content = fs::read_to_string(path)?;
    let mut records = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value: serde_json::Value = serde_json::from_str(line)
            .map_err(|e| format!("{}:{}: {}", path.display(), line_no + 1, e))?;
        records.push(Record::from_json(&value)?);
    }
    Ok(records)
}
