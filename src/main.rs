//! vfile - Inspect files through virtual resources.
//!
//! Usage:
//!   vfile inspect FILE [-c COLLECTION]...   Show resource summary
//!   vfile cat FILE                          Stream content to stdout
//!   vfile tree FILE [-c COLLECTION]...      Print the provenance tree
//!   vfile --help                            Show help

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};

use vfile_core::{SourceMetadata, StatInfo, StreamFactory};
use vfile_resource::{Resource, ResourceOptions};

#[derive(Parser)]
#[command(
    name = "vfile",
    version,
    about = "Inspect files through virtual resources",
    long_about = "vfile wraps files from disk in virtual resources whose content is \
                  read lazily from a stream factory, and reports what the resource \
                  sees."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show a summary of the resource built for a file
    Inspect {
        /// File to wrap
        file: PathBuf,

        /// Virtual path (defaults to "/" followed by the file name)
        #[arg(short = 'p', long)]
        virtual_path: Option<String>,

        /// Collections the resource was located through, outermost first
        #[arg(short, long = "collection")]
        collections: Vec<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Stream the content of a file through a resource
    Cat {
        /// File to wrap
        file: PathBuf,
    },

    /// Print the provenance tree as JSON
    Tree {
        /// File to wrap
        file: PathBuf,

        /// Virtual path (defaults to "/" followed by the file name)
        #[arg(short = 'p', long)]
        virtual_path: Option<String>,

        /// Collections the resource was located through, outermost first
        #[arg(short, long = "collection")]
        collections: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    match cli.command {
        Command::Inspect {
            file,
            virtual_path,
            collections,
            format,
        } => {
            run_inspect(&file, virtual_path, &collections, format).await?;
        }
        Command::Cat { file } => {
            run_cat(&file).await?;
        }
        Command::Tree {
            file,
            virtual_path,
            collections,
        } => {
            let resource = open_resource(&file, virtual_path, &collections)?;
            println!("{}", serde_json::to_string_pretty(&resource.get_path_tree())?);
        }
    }

    Ok(())
}

/// Build a resource backed by a file on disk.
fn open_resource(
    file: &Path,
    virtual_path: Option<String>,
    collections: &[String],
) -> Result<Resource> {
    let file = file.canonicalize().context("Invalid path")?;
    let metadata = std::fs::metadata(&file).context("Failed to read metadata")?;
    let virtual_path = virtual_path.unwrap_or_else(|| default_virtual_path(&file));

    let mut options = ResourceOptions::new(virtual_path)
        .with_stat_info(StatInfo::from_metadata(&metadata))
        .with_source(SourceMetadata::new("fs").with_fs_path(&file).shared());
    if metadata.is_file() {
        options = options.with_stream_factory(StreamFactory::from_file(&file));
    }

    let mut resource = Resource::new(options).context("Failed to create resource")?;
    for collection in collections {
        resource.push_collection(collection.as_str());
    }
    Ok(resource)
}

/// Show a resource summary.
async fn run_inspect(
    file: &Path,
    virtual_path: Option<String>,
    collections: &[String],
    format: OutputFormat,
) -> Result<()> {
    let resource = open_resource(file, virtual_path, collections)?;
    let size = resource.get_size().await.context("Failed to read content")?;
    let stat = resource.get_stat_info();
    let modified = resource.get_source().is_some_and(|source| source.is_modified());

    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", "─".repeat(60));
            println!(" {} ({})", resource.get_path(), resource.get_name());
            println!("{}", "─".repeat(60));
            println!(" Kind:       {}", stat.kind);
            println!(" Size:       {} (content {})", format_size(stat.size), format_size(size));
            println!(" Mode:       {:o}", stat.mode);
            println!(" Modified:   {}", stat.timestamps.modified.to_rfc3339());
            println!(" Changed:    {}", if modified { "yes" } else { "no" });
            if !resource.get_collections().is_empty() {
                let trail: Vec<&str> = resource.get_collections().iter().map(|c| c.as_str()).collect();
                println!(" Found via:  {}", trail.join(" > "));
            }
            println!();
        }
        OutputFormat::Json => {
            let summary = serde_json::json!({
                "path": resource.get_path(),
                "name": resource.get_name(),
                "size": size,
                "stat": stat,
                "modified": modified,
                "tree": resource.get_path_tree(),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

/// Stream file content to stdout through a resource.
async fn run_cat(file: &Path) -> Result<()> {
    let resource = open_resource(file, None, &[])?;
    let mut reader = resource.get_reader().context("Failed to open content")?;
    let mut stdout = tokio::io::stdout();
    tokio::io::copy(&mut reader, &mut stdout)
        .await
        .context("Failed to stream content")?;
    Ok(())
}

/// Virtual path for a file: its name below the root.
fn default_virtual_path(file: &Path) -> String {
    let name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("/{name}")
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
