//! Command handlers.

use crate::commands::SchemaTarget;
use crate::config::{CliConfig, OutputFormat};
use console::style;
use gantry_core::pipeline::PipelineConfigs;
use gantry_core::ports::ModificationLookup;
use gantry_core::revision::MaterialRevisions;
use gantry_history::{HistorySnapshot, MemoryHistory};
use gantry_scheduler::dag::DagBuilder;
use gantry_scheduler::{DependencyResolver, FanInGraph};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Validate a pipeline configuration.
pub fn validate(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let configs = PipelineConfigs::from_file(path)?;
    let dag = DagBuilder::new().build(&configs)?;

    println!(
        "{} {} pipelines in {} are valid",
        style("✓").green(),
        configs.pipelines.len(),
        path.display()
    );

    for node in dag.topological_order()? {
        let fan_in = if dag.has_fan_in(&node.name) {
            style(" (fan-in)").cyan().to_string()
        } else {
            String::new()
        };
        println!(
            "    - {} ({} materials, {} stages){}",
            node.name,
            node.definition.materials.len(),
            node.definition.stages.len(),
            fan_in
        );
    }

    Ok(())
}

pub struct ResolveArgs {
    pub pipelines: PathBuf,
    pub history: PathBuf,
    pub pipeline: String,
    pub given: Option<PathBuf>,
    pub max_backtrack: Option<usize>,
    pub batch_size: Option<usize>,
    pub report: bool,
    pub output: Option<OutputFormat>,
}

/// Resolve the revisions of a pipeline against a recorded history.
pub fn resolve(config: &CliConfig, args: ResolveArgs) -> Result<(), Box<dyn std::error::Error>> {
    let configs = PipelineConfigs::from_file(&args.pipelines)?;
    let snapshot = HistorySnapshot::from_file(&args.history)?;
    let history = Arc::new(MemoryHistory::from_snapshot(&snapshot, &configs)?);
    let fanin = config.fanin(args.max_backtrack, args.batch_size)?;
    debug!(
        pipeline = %args.pipeline,
        max_back_track_limit = fanin.max_back_track_limit,
        batch_size = fanin.revision_batch_size,
        "Resolving revisions"
    );
    let resolver = DependencyResolver::from_store(history.clone(), fanin);

    let revisions = if args.report {
        match resolver.revisions_for_reporting(&configs, &args.pipeline)? {
            Some(revisions) => revisions,
            None => {
                println!(
                    "{} {} has no upstream dependencies",
                    style("i").blue(),
                    style(&args.pipeline).bold()
                );
                return Ok(());
            }
        }
    } else {
        let given = match &args.given {
            Some(path) => load_revisions(path)?,
            None => {
                let pipeline = configs
                    .pipeline(&args.pipeline)
                    .ok_or_else(|| format!("Pipeline not found: {}", args.pipeline))?;
                history.latest_modifications(&pipeline.materials)?
            }
        };
        resolver.revisions_based_on_dependencies(&given, &configs, &args.pipeline)?
    };

    match args.output.unwrap_or(config.output_format) {
        OutputFormat::Table => print_table(&args.pipeline, &configs, &revisions)?,
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&revisions)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&revisions)?),
    }
    Ok(())
}

fn load_revisions(path: &Path) -> Result<MaterialRevisions, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(serde_json::from_str(&content)?),
        _ => Ok(serde_yaml::from_str(&content)?),
    }
}

fn print_table(
    pipeline: &str,
    configs: &PipelineConfigs,
    revisions: &MaterialRevisions,
) -> Result<(), Box<dyn std::error::Error>> {
    let graph = FanInGraph::build(configs, pipeline)?;
    println!(
        "{} Revisions for {} ({} upstream dependencies)",
        style("▶").cyan(),
        style(pipeline).bold(),
        graph.dependency_children().len()
    );

    let width = revisions
        .iter()
        .map(|revision| revision.material.to_string().len())
        .max()
        .unwrap_or(0);
    for revision in revisions {
        let latest = revision
            .latest_modification()
            .map(|m| m.revision.as_str())
            .unwrap_or("(none)");
        println!(
            "  {:<width$}  {}  {}",
            revision.material.to_string(),
            style(latest).green(),
            style(format!("{} modifications", revision.modifications.len())).dim(),
        );
    }
    Ok(())
}

/// Print a JSON schema.
pub fn schema(target: SchemaTarget) -> Result<(), Box<dyn std::error::Error>> {
    let schema = match target {
        SchemaTarget::Pipelines => schemars::schema_for!(PipelineConfigs),
        SchemaTarget::History => schemars::schema_for!(HistorySnapshot),
        SchemaTarget::Fanin => schemars::schema_for!(gantry_scheduler::FaninConfig),
    };
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

/// Show configuration.
pub fn show_config(config: &CliConfig) -> Result<(), Box<dyn std::error::Error>> {
    let not_set = || "(not set)".to_string();
    println!("Current configuration:");
    println!("  output_format: {:?}", config.output_format);
    println!(
        "  fanin_config: {}",
        config
            .fanin_config
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(not_set)
    );
    println!(
        "  max_back_track_limit: {}",
        config
            .max_back_track_limit
            .map(|n| n.to_string())
            .unwrap_or_else(not_set)
    );
    println!(
        "  revision_batch_size: {}",
        config
            .revision_batch_size
            .map(|n| n.to_string())
            .unwrap_or_else(not_set)
    );

    if let Ok(path) = CliConfig::config_path() {
        println!("\nConfig file: {}", path.display());
    }

    Ok(())
}

/// Set configuration.
pub fn set_config(key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = CliConfig::load().unwrap_or_default();
    config.set(key, value)?;
    config.save()?;

    println!("{} Set {} = {}", style("✓").green(), key, value);
    Ok(())
}
