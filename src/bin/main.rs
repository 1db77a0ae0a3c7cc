//! erdprobe CLI - derive an ERD from mapper templates
//!
//! Usage:
//!   erdprobe run <catalog.toml> [--config <erdprobe.toml>] [--sql-out <file>] [--diagram-out <file>]
//!   erdprobe joins <dump.sql>
//!   erdprobe probe <expression>
//!
//! Examples:
//!   erdprobe run mappers.toml --diagram-out erd.dot
//!   erdprobe joins /tmp/dump.sql | dot -Tsvg > erd.svg
//!   erdprobe probe 'user.name != null && age > 18'

use clap::{Parser, Subcommand};
use erdprobe::batch::{write_sql_dump, Batch};
use erdprobe::catalog::Catalog;
use erdprobe::config::Settings;
use erdprobe::graph::{to_dot, AssociationGraph, DiagramSink, DotSink};
use erdprobe::join::JoinFinder;
use erdprobe::probe::Prober;
use erdprobe::sql::{split_statements, SqlParserProvider};
use erdprobe::value::Bindings;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "erdprobe")]
#[command(about = "erdprobe - Reverse-engineer an ERD from dynamic SQL mapper templates")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every statement of a catalog and derive the diagram
    Run {
        /// Path to the catalog (.toml or .json)
        catalog: PathBuf,

        /// Settings file (defaults to the usual search locations)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Where to write the rendered SELECT statements
        #[arg(long)]
        sql_out: Option<PathBuf>,

        /// Where to write the Graphviz diagram
        #[arg(long)]
        diagram_out: Option<PathBuf>,
    },

    /// Infer joins from a SQL dump and print the diagram
    Joins {
        /// File with one statement per `;`-terminated line
        file: PathBuf,

        /// Settings file (defaults to the usual search locations)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Probe one test expression and print the bindings that satisfy it
    Probe {
        /// The test expression, e.g. `name != null and age > 18`
        expression: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "erdprobe=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            catalog,
            config,
            sql_out,
            diagram_out,
        } => cmd_run(catalog, config, sql_out, diagram_out),
        Commands::Joins { file, config } => cmd_joins(file, config),
        Commands::Probe { expression } => cmd_probe(&expression),
    }
}

fn load_settings(config: Option<&Path>) -> Option<Settings> {
    let loaded = match config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    match loaded {
        Ok(settings) => Some(settings),
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            None
        }
    }
}

fn cmd_run(
    catalog: PathBuf,
    config: Option<PathBuf>,
    sql_out: Option<PathBuf>,
    diagram_out: Option<PathBuf>,
) -> ExitCode {
    let Some(settings) = load_settings(config.as_deref()) else {
        return ExitCode::FAILURE;
    };

    let catalog = match Catalog::from_file(&catalog) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading catalog '{}': {}", catalog.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let report = match Batch::new(&settings).run(&catalog) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Batch error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let sql_path = match sql_out.map(Ok).unwrap_or_else(|| settings.output.sql_path()) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let diagram_path = match diagram_out
        .map(Ok)
        .unwrap_or_else(|| settings.output.diagram_path())
    {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let written = File::create(&sql_path)
        .and_then(|file| write_sql_dump(&report, BufWriter::new(file)))
        .and_then(|()| File::create(&diagram_path))
        .and_then(|file| DotSink::new(BufWriter::new(file)).write_diagram(&report.diagram));
    if let Err(e) = written {
        eprintln!("Error writing output: {}", e);
        return ExitCode::FAILURE;
    }

    println!(
        "Rendered {} statements ({} skipped), inferred {} matches across {} tables",
        report.rendered.len(),
        report.skipped.len(),
        report.matches.len(),
        report.diagram.nodes.len()
    );
    println!("  SQL:     {}", sql_path.display());
    println!("  Diagram: {}", diagram_path.display());
    ExitCode::SUCCESS
}

fn cmd_joins(file: PathBuf, config: Option<PathBuf>) -> ExitCode {
    let Some(settings) = load_settings(config.as_deref()) else {
        return ExitCode::FAILURE;
    };

    let source = match fs::read_to_string(&file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let provider = SqlParserProvider::new(settings.sql.dialect);
    let matches = JoinFinder::new(&provider).analyse_all(split_statements(&source));
    let graph = AssociationGraph::from_matches(&matches);
    print!("{}", to_dot(&graph.diagram()));
    ExitCode::SUCCESS
}

fn cmd_probe(expression: &str) -> ExitCode {
    let Some(settings) = load_settings(None) else {
        return ExitCode::FAILURE;
    };

    let mut bindings = Bindings::new();
    if let Err(e) = Prober::new(&settings.probe).probe_source(expression, &mut bindings) {
        eprintln!("Parse error: {}", e);
        return ExitCode::FAILURE;
    }

    match serde_json::to_string_pretty(&bindings.to_json(&settings.probe.non_null_marker)) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Serialization error: {}", e);
            ExitCode::FAILURE
        }
    }
}
