//! xmlsift CLI - extract values from XML documents into flat JSON maps
//!
//! Reads XML documents from files or stdin and prints the output maps
//! produced by the configured path expressions.

use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

use xmlsift::serialization::{JsonArrayWriter, NdjsonWriter};
use xmlsift::{TransformConfig, XmlExtractor};

#[derive(Parser)]
#[command(name = "xmlsift")]
#[command(version, about = "Extract values from XML documents into flat JSON maps", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform an XML document into a JSON map
    Transform {
        /// Path to the transform YAML configuration
        #[arg(short, long, default_value = "xmlsift.yaml")]
        config: PathBuf,

        /// XML input files (reads stdin when omitted); several files
        /// produce a JSON array
        #[arg(short, long)]
        input: Vec<PathBuf>,

        /// Pretty-print the JSON output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Validate a configuration and show how each path expression parses
    Validate {
        /// Path to the transform YAML configuration
        #[arg(short, long, default_value = "xmlsift.yaml")]
        config: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Transform { config, input, pretty } => transform(config, input, pretty),
        Commands::Validate { config } => validate_config(config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn load_extractor(config: &Path) -> Result<XmlExtractor, String> {
    let config = TransformConfig::load_from_file(config)
        .map_err(|e| format!("Failed to load {}: {}", config.display(), e))?;

    XmlExtractor::from_config(&config).map_err(|e| e.to_string())
}

fn read_input(path: Option<&Path>) -> Result<String, String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e)),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("Failed to read stdin: {}", e))?;
            Ok(buf)
        }
    }
}

/// Transform XML documents and print the results
fn transform(config: PathBuf, inputs: Vec<PathBuf>, pretty: bool) -> Result<(), String> {
    let extractor = load_extractor(&config)?;
    let stdout = std::io::stdout();

    if inputs.len() > 1 {
        let mut writer = JsonArrayWriter::new(stdout.lock(), pretty).map_err(|e| e.to_string())?;
        for path in &inputs {
            let xml = read_input(Some(path))?;
            let output = extractor
                .transform(&xml)
                .map_err(|e| format!("{}: {}", path.display(), e))?;
            writer.write(&output).map_err(|e| e.to_string())?;
        }
        writer.finish().map_err(|e| e.to_string())?;
        println!();
        tracing::debug!("Transformed {} documents", inputs.len());
        return Ok(());
    }

    let xml = read_input(inputs.first().map(PathBuf::as_path))?;
    let output = extractor.transform(&xml).map_err(|e| e.to_string())?;
    tracing::debug!("Produced {} output keys", output.len());

    if pretty {
        let json = serde_json::to_string_pretty(&output)
            .map_err(|e| format!("Failed to serialize output: {}", e))?;
        println!("{}", json);
    } else {
        let mut writer = NdjsonWriter::new(stdout.lock());
        writer.write(&output).map_err(|e| e.to_string())?;
        writer.flush().map_err(|e| e.to_string())?;
    }

    Ok(())
}

/// Validate a configuration file
fn validate_config(config: PathBuf) -> Result<(), String> {
    println!("🔍 Validating {}...", config.display());

    let extractor = load_extractor(&config)?;

    println!("  ✓ Delimiter: {}", extractor.delimiter().as_str());
    println!("  ✓ XML payload key: {}", extractor.xml_map_key());

    for spec in extractor.specs() {
        println!("  ✓ {}", spec);
        println!("      lookup:  {}", spec.lookup_path);
        println!("      output:  {}", spec.output_id);
        if let Some(filter) = &spec.filter {
            println!("      filter:  {}", filter.as_str());
        }
        if let Some(extract) = &spec.extract {
            println!("      extract: {}", extract.as_str());
        }
    }

    println!("✅ {} path expressions are valid!", extractor.specs().len());

    Ok(())
}
