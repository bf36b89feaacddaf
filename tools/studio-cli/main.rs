use clap::{Parser, Subcommand};
use studio_graph::graph::{self, GraphIndex, PortRole};
use studio_graph::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Inspect and edit exported Studio experiment files
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Optional path to a JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the modules and edges of an experiment
    Inspect { experiment: PathBuf },
    /// Check node ids and edge endpoints
    Validate { experiment: PathBuf },
    /// Set a parameter on every module with the given comment
    SetParam {
        experiment: PathBuf,
        comment: String,
        parameter: String,
        value: String,
        /// Write the result here instead of overwriting the input
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Feed the destination module's first input from the source module's first output
    Rewire {
        experiment: PathBuf,
        source: String,
        destination: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Append an empty module node
    AddModule {
        experiment: PathBuf,
        node_id: String,
        #[arg(long)]
        comment: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => StudioConfig::from_file(path).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to load config '{}': {}", path.display(), e))
        }),
        None => StudioConfig::default(),
    };

    match cli.command {
        Command::Inspect { experiment } => inspect(&load(&experiment)),
        Command::Validate { experiment } => validate(&load(&experiment)),
        Command::SetParam {
            experiment,
            comment,
            parameter,
            value,
            output,
        } => edit(
            experiment,
            output,
            Mutation::set_parameter(comment, parameter, value),
            &config,
        ),
        Command::Rewire {
            experiment,
            source,
            destination,
            output,
        } => edit(
            experiment,
            output,
            Mutation::rewire_edge(source, destination),
            &config,
        ),
        Command::AddModule {
            experiment,
            node_id,
            comment,
            output,
        } => edit(
            experiment,
            output,
            Mutation::AddModule { node_id, comment },
            &config,
        ),
    }
}

fn load(path: &Path) -> ExperimentDocument {
    let raw = fs::read_to_string(path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read experiment file '{}': {}",
            path.display(),
            e
        ))
    });
    graph::parse(&raw).unwrap_or_else(|e| exit_with_error(&e.to_string()))
}

fn inspect(document: &ExperimentDocument) {
    let index = GraphIndex::build(&document.graph);
    println!("Modules ({}):", document.graph.module_nodes.len());
    for (position, node) in document.graph.module_nodes.iter().enumerate() {
        let first_in = index
            .first_port(position, PortRole::Input)
            .map(|p| p.compound_id())
            .unwrap_or_else(|| "-".to_string());
        let first_out = index
            .first_port(position, PortRole::Output)
            .map(|p| p.compound_id())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<40} {:<24} params={:<3} in={:<40} out={}",
            node.id,
            node.comment().unwrap_or("<none>"),
            node.parameters().len(),
            first_in,
            first_out
        );
    }

    println!("\nEdges ({}):", document.graph.edges.len());
    for edge in &document.graph.edges {
        println!(
            "  {} -> {}",
            edge.source_output_port_id, edge.destination_input_port_id
        );
    }
}

fn validate(document: &ExperimentDocument) {
    let issues = graph::validate(document);
    if issues.is_empty() {
        println!("Graph is consistent.");
        return;
    }
    for issue in &issues {
        println!("  - {}", issue);
    }
    exit_with_error(&format!("Found {} graph issues.", issues.len()));
}

fn edit(input: PathBuf, output: Option<PathBuf>, mutation: Mutation, config: &StudioConfig) {
    let mut document = load(&input);
    let outcome = mutation
        .apply(&mut document, &config.mutation)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    let serialized = graph::serialize(&document).unwrap_or_else(|e| exit_with_error(&e.to_string()));

    let target = output.unwrap_or(input);
    fs::write(&target, serialized).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to write '{}': {}", target.display(), e))
    });
    println!(
        "{}{} change(s) written to '{}'",
        mutation.tag(),
        outcome.changes(),
        target.display()
    );
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
