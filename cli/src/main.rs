use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use xsd_openapi_core::{
    all_roots, analyze, convert, to_openapi, ConvertOptions, DiagnosticsMode, OpenApiOptions,
    RootRef, TypeGraph,
};

#[derive(Parser)]
#[command(name = "xsd-openapi")]
#[command(about = "Convert a resolved XML Schema type graph into OpenAPI component schemas")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a type graph to an OpenAPI document
    Convert {
        /// Input type graph file (JSON)
        input: PathBuf,

        /// Output file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Root to convert, as `type:Name` or `element:Name` (repeatable;
        /// defaults to every named type and global element)
        #[arg(long = "root", value_name = "ROOT")]
        roots: Vec<RootRef>,

        /// Max nesting depth of type translation
        #[arg(long, default_value_t = 128)]
        max_depth: usize,

        /// Record per-type failures as diagnostics instead of aborting
        #[arg(long)]
        collect_diagnostics: bool,

        /// Write the schema registry itself instead of an OpenAPI document
        #[arg(long)]
        raw: bool,

        /// OpenAPI `info.title` (derived from the target namespace by default)
        #[arg(long)]
        title: Option<String>,

        /// OpenAPI `info.version`
        #[arg(long, default_value = "1.0.0")]
        api_version: String,

        /// OpenAPI `info.description`
        #[arg(long)]
        description: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },

    /// Convert every type in collect mode and report diagnostics
    Check {
        /// Input type graph file (JSON)
        input: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },

    /// Summarize what a type graph declares
    Info {
        /// Input type graph file (JSON)
        input: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    /// Indented JSON
    Pretty,
    /// Single-line JSON
    Compact,
    Yaml,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for the document
    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Convert {
            input,
            output,
            roots,
            max_depth,
            collect_diagnostics,
            raw,
            title,
            api_version,
            description,
            format,
        } => {
            let graph = read_graph(&input)?;
            let roots = if roots.is_empty() {
                all_roots(&graph)
            } else {
                roots
            };

            let options = ConvertOptions {
                max_depth,
                diagnostics: if collect_diagnostics {
                    DiagnosticsMode::Collect
                } else {
                    DiagnosticsMode::FailFast
                },
                ..ConvertOptions::default()
            };

            let result = convert(&graph, &roots, &options)
                .map_err(|e| anyhow::Error::from(e).context("Conversion failed"))?;

            for diagnostic in &result.diagnostics {
                eprintln!(
                    "Warning: {} ({}): {}",
                    diagnostic.schema, diagnostic.path, diagnostic.message
                );
            }

            if raw {
                write_output(&result.document, output.as_deref(), format)?;
            } else {
                let openapi_options = OpenApiOptions {
                    title,
                    version: api_version,
                    description,
                    ..OpenApiOptions::default()
                };
                let document = to_openapi(&result.document, &openapi_options);
                write_output(&document, output.as_deref(), format)?;
            }
        }
        Commands::Check { input, format } => {
            let graph = read_graph(&input)?;
            let options = ConvertOptions {
                diagnostics: DiagnosticsMode::Collect,
                ..ConvertOptions::default()
            };
            let result = convert(&graph, &all_roots(&graph), &options)
                .map_err(|e| anyhow::Error::from(e).context("Conversion failed"))?;

            write_output(&result.diagnostics, None, format)?;
            if !result.diagnostics.is_empty() {
                anyhow::bail!(
                    "{} type(s) could not be translated",
                    result.diagnostics.len()
                );
            }
        }
        Commands::Info { input, format } => {
            let graph = read_graph(&input)?;
            write_output(&analyze(&graph), None, format)?;
        }
    }

    Ok(())
}

fn read_graph(input: &Path) -> Result<TypeGraph> {
    let file = File::open(input)
        .with_context(|| format!("Failed to open input file: {}", input.display()))?;
    let reader = BufReader::new(file);
    let graph: TypeGraph = serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse type graph from: {}", input.display()))?;
    tracing::debug!(
        types = graph.types().count(),
        elements = graph.elements().count(),
        "loaded type graph"
    );
    Ok(graph)
}

fn write_output<T: serde::Serialize>(
    val: &T,
    path: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let mut writer: Box<dyn Write> = if let Some(p) = path {
        let file = File::create(p)
            .with_context(|| format!("Failed to create output file: {}", p.display()))?;
        Box::new(BufWriter::new(file))
    } else {
        Box::new(BufWriter::new(io::stdout()))
    };

    match format {
        OutputFormat::Pretty => {
            serde_json::to_writer_pretty(&mut writer, val).context("Failed to write JSON")?;
            writeln!(writer).context("Failed to write trailing newline")?;
        }
        OutputFormat::Compact => {
            serde_json::to_writer(&mut writer, val).context("Failed to write JSON")?;
            writeln!(writer).context("Failed to write trailing newline")?;
        }
        // serde_yaml ends the document with a newline itself
        OutputFormat::Yaml => {
            serde_yaml::to_writer(&mut writer, val).context("Failed to write YAML")?;
        }
    }

    writer.flush().context("Failed to flush output")?;

    Ok(())
}
