//! Maintenance commands for the trip reference tables.

#![warn(clippy::all, clippy::pedantic)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};
use tripdata_common::config::StoreConfig;
use tripdata_common::report::{AttractionReport, HotelReport, TransportReport};
use tripdata_common::source_data;
use tripdata_common::store_api::{Direction, RemoteStore, RestStore};
use tripdata_common::sync::Synchronizer;
use tripdata_common::verify::Verifier;
use tripdata_common::{CLIENT_VERSION, Row, SyncError};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace a reference table with the bundled source list, then print it back
    Sync {
        #[arg(value_enum)]
        target: SyncTarget,
    },
    /// Print the rows of a table
    Verify {
        table: String,

        /// Column to sort by
        #[arg(long)]
        order_by: Option<String>,

        /// Sort descending instead of ascending
        #[arg(long, requires = "order_by")]
        desc: bool,

        /// Print at most this many rows
        #[arg(long)]
        limit: Option<usize>,

        /// Only print these columns (comma separated)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },
    /// Ask the store how many rows a table holds
    Count { table: String },
    /// Print summary statistics for a table
    Report {
        #[arg(value_enum)]
        target: ReportTarget,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum SyncTarget {
    Hotels,
    Transport,
    All,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ReportTarget {
    Hotels,
    Transport,
    Attractions,
}

fn print_rows(rows: &[Row]) {
    for (i, row) in rows.iter().enumerate() {
        match serde_json::to_string(row) {
            Ok(line) => println!("#{:<3} {line}", i + 1),
            Err(e) => println!("#{:<3} <unprintable row: {e}>", i + 1),
        }
    }
}

/// Synchronize one table and read it back in a stable order.
fn sync_table(
    store: &dyn RemoteStore,
    synchronizer: &Synchronizer,
    source: &[Row],
    order_column: &str,
) -> Result<()> {
    let table = synchronizer.table();
    let result = synchronizer
        .run(store, source)
        .with_context(|| format!("Could not synchronize table {table}"))?;
    println!(
        "{table}: {} rows before, {}/{} rows inserted.",
        result.previous_count, result.inserted_count, result.requested_count
    );

    let rows = Verifier::new(table)
        .order_by(order_column, Direction::Ascending)
        .fetch(store)
        .with_context(|| format!("Synchronized table {table} but could not read it back"))?;
    println!("{table} now holds {} rows:", rows.len());
    print_rows(&rows);
    Ok(())
}

fn run(command: &Command, store: &dyn RemoteStore) -> Result<()> {
    match command {
        Command::Sync { target } => {
            if matches!(target, SyncTarget::Hotels | SyncTarget::All) {
                let source = source_data::hotels()?;
                sync_table(store, &Synchronizer::hotels(), &source, "name")?;
            }
            if matches!(target, SyncTarget::Transport | SyncTarget::All) {
                let source = source_data::transport()?;
                sync_table(store, &Synchronizer::transport(), &source, "cost_per_day")?;
            }
        }
        Command::Verify {
            table,
            order_by,
            desc,
            limit,
            columns,
        } => {
            let mut verifier = Verifier::new(table.as_str()).columns(columns.as_slice());
            if let Some(column) = order_by {
                let direction = if *desc {
                    Direction::Descending
                } else {
                    Direction::Ascending
                };
                verifier = verifier.order_by(column.as_str(), direction);
            }
            if let Some(limit) = limit {
                verifier = verifier.limit(*limit);
            }
            let rows = verifier
                .fetch(store)
                .with_context(|| format!("Could not read table {table}"))?;
            println!("{table}: {} rows", rows.len());
            print_rows(&rows);
        }
        Command::Count { table } => {
            let count = Verifier::new(table.as_str())
                .count(store)
                .with_context(|| format!("Could not count table {table}"))?;
            println!("{table}: {count} rows");
        }
        Command::Report { target } => match target {
            ReportTarget::Hotels => print!("{}", HotelReport::load(store)?),
            ReportTarget::Transport => print!("{}", TransportReport::load(store)?),
            ReportTarget::Attractions => print!("{}", AttractionReport::load(store)?),
        },
    }
    Ok(())
}

/// Name the step a failed run stopped at, and whether it left a table empty.
fn describe_failure(e: &anyhow::Error) -> (&'static str, bool) {
    let sync_error = e
        .chain()
        .find_map(|cause| cause.downcast_ref::<SyncError>());
    (
        sync_error.map_or("unknown", SyncError::step),
        sync_error.is_some_and(SyncError::left_table_empty),
    )
}

fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Set up logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Configuration must be complete before anything touches the network
    let store = match StoreConfig::from_env().and_then(|config| RestStore::new(&config)) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    info!(
        "Tripdata admin v{CLIENT_VERSION} using store at {}.",
        store.base_url()
    );

    if let Err(e) = run(&cli.command, &store) {
        let (step, left_table_empty) = describe_failure(&e);
        error!("Run failed at the {step} step: {e:#}");
        if left_table_empty {
            error!("The target table was cleared before the failure and is now empty.");
        }
    }
}
