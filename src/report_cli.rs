//! report subcommands - load, analyze, export

use anyhow::Context;
use arch::{AnalyzerConfig, RelationshipAnalyzer, ReportAssembler, ReportKind};
use archimate::ModelLoader;
use clap::Subcommand;
use export::{write_report, Destination, ExporterRegistry};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Analyze a model and export a report
    Report {
        /// Model in the Open Group exchange format (.xml); native Archi .archimate files are not supported
        path: PathBuf,
        /// Report kind (served-processes, unserved-processes, component-processes, coverage)
        #[arg(short, long, default_value = "unserved-processes")]
        report: ReportKind,
        /// Output format (see `formats`)
        #[arg(short, long, default_value = "console")]
        format: String,
        /// Directory for timestamped report files
        #[arg(long, default_value = "reports")]
        output_dir: PathBuf,
        /// Output file (overrides --output-dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Skip elements and relationships missing required attributes, and relationships to skipped elements
        #[arg(long)]
        lenient: bool,
        /// Analyzer config (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Treat component -> process serving as a closed path
        #[arg(long)]
        direct_serving: bool,
    },
    /// Show model statistics
    Stats {
        /// Model in the Open Group exchange format (.xml)
        path: PathBuf,
        /// Skip malformed elements instead of failing
        #[arg(long)]
        lenient: bool,
        /// JSON output
        #[arg(long)]
        json: bool,
    },
    /// List available output formats
    Formats,
}

struct ReportArgs {
    path: PathBuf,
    report: ReportKind,
    format: String,
    output_dir: PathBuf,
    output: Option<PathBuf>,
    lenient: bool,
    config: Option<PathBuf>,
    direct_serving: bool,
}

pub fn run(cmd: ReportCommands) -> anyhow::Result<()> {
    match cmd {
        ReportCommands::Report {
            path,
            report,
            format,
            output_dir,
            output,
            lenient,
            config,
            direct_serving,
        } => cmd_report(ReportArgs {
            path,
            report,
            format,
            output_dir,
            output,
            lenient,
            config,
            direct_serving,
        }),
        ReportCommands::Stats { path, lenient, json } => cmd_stats(&path, lenient, json),
        ReportCommands::Formats => cmd_formats(),
    }
}

fn cmd_report(args: ReportArgs) -> anyhow::Result<()> {
    let registry = ExporterRegistry::builtin().context("invalid exporter registry")?;
    let exporter = registry.get(&args.format)?;

    let kind = args.report;

    let config = load_config(args.config.as_deref(), args.direct_serving)?;

    let graph = ModelLoader::new()
        .with_lenient(args.lenient)
        .load_file(&args.path)
        .with_context(|| format!("failed to load model {}", args.path.display()))?;

    let analysis = RelationshipAnalyzer::new()
        .with_config(config)
        .analyze(&graph)
        .context("analysis failed")?;

    let table = ReportAssembler::new()
        .assemble(kind, &analysis)
        .context("failed to assemble report")?;

    let destination = match args.output {
        Some(file) => Destination::File(file),
        None if exporter.interactive => Destination::Stdout,
        None => Destination::Directory {
            dir: args.output_dir,
            stem: kind.as_str().to_string(),
        },
    };

    let now = chrono::Local::now().naive_local();
    let written = write_report(exporter, &table, &destination, now)
        .context("failed to export report")?;

    if let Some(path) = written {
        println!("Saved to: {}", path.display());
    }

    Ok(())
}

/// 配置文件 (或默认值) -> 环境变量 -> 命令行开关
fn load_config(path: Option<&Path>, direct_serving: bool) -> anyhow::Result<AnalyzerConfig> {
    let config = match path {
        Some(path) => AnalyzerConfig::load(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => AnalyzerConfig::default(),
    };
    let mut config = config.with_env();
    if direct_serving {
        config = config.with_direct_component_serving(true);
    }
    config.validate()?;
    tracing::debug!("Analyzer config: {:?}", config);
    Ok(config)
}

#[derive(Serialize)]
struct StatsOutput {
    path: String,
    elements: usize,
    relationships: usize,
    elements_by_type: BTreeMap<String, usize>,
    relationships_by_kind: BTreeMap<String, usize>,
}

fn cmd_stats(path: &Path, lenient: bool, json: bool) -> anyhow::Result<()> {
    let graph = ModelLoader::new()
        .with_lenient(lenient)
        .load_file(path)
        .with_context(|| format!("failed to load model {}", path.display()))?;

    let stats = graph.stats();
    let mut relationships_by_kind: BTreeMap<String, usize> = BTreeMap::new();
    for rel in graph.relationships() {
        *relationships_by_kind.entry(rel.kind.to_string()).or_default() += 1;
    }

    let output = StatsOutput {
        path: path.display().to_string(),
        elements: stats.elements,
        relationships: stats.relationships,
        elements_by_type: stats.elements_by_type,
        relationships_by_kind,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Model: {}", output.path);
    println!("Elements: {}", output.elements);
    for (element_type, count) in &output.elements_by_type {
        println!("  {}: {}", element_type, count);
    }
    println!("Relationships: {}", output.relationships);
    for (kind, count) in &output.relationships_by_kind {
        println!("  {}: {}", kind, count);
    }
    Ok(())
}

fn cmd_formats() -> anyhow::Result<()> {
    let registry = ExporterRegistry::builtin()?;
    for exporter in registry.iter() {
        let target = if exporter.interactive { "terminal" } else { "file" };
        println!(
            "{:<10} .{:<5} {:<9} {}",
            exporter.id, exporter.extension, target, exporter.description
        );
    }
    Ok(())
}
