use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tablecfg::{
    ClusterDirectory, ClusterSnapshot, IdentifierFormat, SharedMetadata, TableConfigBackend,
    TableConfigCoordinator, TableConfigHandle, TableId,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tablecfg-tool")]
#[command(about = "Inspect and edit table placement in a cluster snapshot")]
struct Cli {
    /// Cluster snapshot file (directory, tables metadata and engine config)
    #[arg(long, global = true, default_value = "cluster.json")]
    state: PathBuf,

    /// Override the snapshot's identifier format (`name` or `uuid`)
    #[arg(long, global = true)]
    format: Option<IdentifierFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print one table's row, or every row when no id is given
    Read {
        #[arg(long)]
        id: Option<String>,
    },
    /// Create (without --id) or replace (with --id) a table's row
    Write {
        #[arg(long)]
        id: Option<String>,
        /// Row document as JSON
        #[arg(long)]
        doc: String,
    },
    /// Delete a table
    Delete {
        #[arg(long)]
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut snapshot = ClusterSnapshot::load(&cli.state)
        .with_context(|| format!("Failed to load snapshot '{}'", cli.state.display()))?;
    if let Some(format) = cli.format {
        snapshot.config.identifier_format = format;
    }

    let directory = Arc::new(ClusterDirectory::from_snapshot(snapshot.directory.clone()));
    let tables = SharedMetadata::new(snapshot.tables.clone());
    let backend = TableConfigBackend::new(tables.clone(), directory, snapshot.config.clone());
    let coordinator = TableConfigCoordinator::spawn(backend);
    let handle = coordinator.handle();
    let cancel = CancellationToken::new();

    let mutated = match cli.command {
        Command::Read { id } => {
            read(&handle, id, &cancel).await?;
            false
        }
        Command::Write { id, doc } => {
            write(&handle, id, &doc, &cancel).await?;
            true
        }
        Command::Delete { id } => {
            handle
                .write_row(Value::String(id.clone()), false, None, &cancel)
                .await
                .with_context(|| format!("Failed to delete table '{}'", id))?;
            println!("Deleted table {}", id);
            true
        }
    };
    coordinator.stop().await?;

    if mutated {
        snapshot.tables = tables.get()?;
        save(&snapshot, &cli.state)?;
    }
    Ok(())
}

async fn read(
    handle: &TableConfigHandle,
    id: Option<String>,
    cancel: &CancellationToken,
) -> Result<()> {
    match id {
        Some(id) => {
            let row = handle
                .read_row(Value::String(id.clone()), cancel)
                .await?
                .ok_or_else(|| anyhow!("No table with id '{}'", id))?;
            println!("{}", serde_json::to_string_pretty(&row)?);
        }
        None => {
            let rows = handle.read_all_rows(cancel).await?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }
    Ok(())
}

async fn write(
    handle: &TableConfigHandle,
    id: Option<String>,
    doc: &str,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut row: Value = serde_json::from_str(doc).context("--doc is not valid JSON")?;
    let (key, autogenerated) = match id {
        Some(id) => (id, false),
        None => (TableId::new_v4().to_string(), true),
    };
    let fields = row
        .as_object_mut()
        .ok_or_else(|| anyhow!("--doc must be a JSON object"))?;
    fields
        .entry("id")
        .or_insert_with(|| Value::String(key.clone()));
    if fields.get("id") != Some(&Value::String(key.clone())) {
        return Err(anyhow!("The `id` in --doc must match --id"));
    }

    let stored = handle
        .write_row(Value::String(key), autogenerated, Some(row), cancel)
        .await?
        .ok_or_else(|| anyhow!("write returned no row"))?;
    println!("{}", serde_json::to_string_pretty(&stored)?);
    Ok(())
}

fn save(snapshot: &ClusterSnapshot, path: &Path) -> Result<()> {
    snapshot
        .save(path)
        .with_context(|| format!("Failed to write snapshot '{}'", path.display()))
}
