//! oxide-embed CLI
//!
//! Command-line tool for parsing and resolving resource embedding queries.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use oxide_embed::config::load_catalog;
use oxide_embed::report;
use oxide_embed_core::Resolver;

/// Parse and resolve resource embedding queries against a schema catalog.
#[derive(Parser)]
#[command(name = "oxide-embed")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Schema catalog (JSON document).
    #[arg(short, long, env = "OXIDE_EMBED_CATALOG", default_value = "catalog.json")]
    catalog: PathBuf,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a query and print the embedding tree as JSON.
    Resolve {
        /// Table the query is rooted at.
        table: String,

        /// Select list, e.g. `id,users!inner(username)`.
        query: String,

        /// Print the JSON on a single line.
        #[arg(long)]
        compact: bool,

        /// Exit with a failure status if any node failed to resolve.
        #[arg(long)]
        deny_errors: bool,
    },

    /// Parse a query and print its canonical form.
    Parse {
        /// Select list.
        query: String,
    },

    /// Print the tokens of a query, one per line.
    Tokens {
        /// Select list.
        query: String,
    },

    /// List the foreign keys that can embed one table inside another.
    Relationships {
        /// Enclosing table.
        from: String,

        /// Embedded table.
        to: String,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Parse { query } => {
            let parsed = report::parse(&query);
            println!("{}", parsed.canonical);
            if !parsed.errors.is_empty() {
                for error in &parsed.errors {
                    eprintln!("error: {error}");
                }
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Tokens { query } => {
            for row in report::tokens(&query) {
                println!("{:>4}..{:<4} {:<28} {}", row.start, row.end, row.kind, row.text);
            }
        }

        Commands::Resolve {
            table,
            query,
            compact,
            deny_errors,
        } => {
            let catalog = load_catalog(&cli.catalog)?;
            let tree = Resolver::new(&catalog).resolve_str(&table, &query)?;
            println!("{}", report::tree_json(&tree, compact)?);

            let errors = tree.errors();
            if !errors.is_empty() {
                info!("{} item(s) could not be resolved.", errors.len());
                if deny_errors {
                    return Ok(ExitCode::FAILURE);
                }
            }
        }

        Commands::Relationships { from, to } => {
            let catalog = load_catalog(&cli.catalog)?;
            let resolver = Resolver::new(&catalog);
            let rows = report::relationships(&resolver, &from, &to);

            if rows.is_empty() {
                info!("No foreign key connects '{}' and '{}'.", from, to);
            } else {
                println!("\nRelationships from {from} to {to}:");
                println!("{:-<60}", "");
                for row in &rows {
                    println!(" {}", report::format_row(row));
                }
                println!();
                if rows.len() > 1 {
                    info!("Embedding '{}' needs a hint: {}!<columnName>", to, to);
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
