//! Stockload CLI - bulk inventory CSV reconciliation
//!
//! # Main Commands
//!
//! ```bash
//! stockload serve                   # Start HTTP server (port 3000)
//! stockload check input.csv        # Dry-run an import and print the report
//! stockload template               # Print a blank import template
//! ```

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use stockload::{
    import, template, CallerIdentity, ImportOptions, MemoryStore, DEFAULT_MAX_ROWS,
    PERM_MANAGE_INVENTORY, PERM_VIEW_REPORTS,
};

#[derive(Parser)]
#[command(name = "stockload")]
#[command(about = "Bulk inventory CSV import, validation, and export", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a CSV against a scratch store and print the report
    Check {
        /// Input CSV file
        input: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Maximum data rows accepted
        #[arg(long, default_value_t = DEFAULT_MAX_ROWS)]
        max_rows: usize,
    },

    /// Print a blank import template
    Template {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            input,
            delimiter,
            max_rows,
        } => cmd_check(&input, delimiter, max_rows),

        Commands::Template { output } => cmd_template(output.as_deref()),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Scratch store with the reference names the template ships with, so a
/// template-shaped file checks cleanly out of the box.
fn scratch_store() -> (MemoryStore, CallerIdentity) {
    let store = MemoryStore::new();
    let main = store.add_location("Main Store");
    store.add_category("General");
    store.add_supplier("Acme Supplies");

    let caller = CallerIdentity::new("admin")
        .with_permission(PERM_MANAGE_INVENTORY)
        .with_permission(PERM_VIEW_REPORTS)
        .with_default_location(main);

    (store, caller)
}

fn cmd_check(
    input: &Path,
    delimiter: Option<char>,
    max_rows: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Checking: {}", input.display());

    let bytes = fs::read(input)?;
    let (store, caller) = scratch_store();
    let options = ImportOptions { max_rows, delimiter };

    let report = import(&store, &caller, &bytes, &options)?;

    eprintln!("   Encoding: {}", report.encoding_used);
    eprintln!("   Created: {}", report.imported_count);
    eprintln!("   Updated: {}", report.updated_count);

    if !report.errors.is_empty() {
        eprintln!("\n{} rows rejected:", report.errors.len());
        for err in report.errors.iter().take(20) {
            eprintln!("   - {}", err);
        }
        if report.errors.len() > 20 {
            eprintln!("   ... and {} more", report.errors.len() - 20);
        }
    }

    eprintln!("\n{}", report.message);

    if !report.success || !report.errors.is_empty() {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_template(output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = template();
    match output {
        Some(p) => {
            fs::write(p, &bytes)?;
            eprintln!("Template written to: {}", p.display());
        }
        None => {
            print!("{}", String::from_utf8_lossy(&bytes));
        }
    }
    Ok(())
}

async fn cmd_serve(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let (store, caller) = scratch_store();
    let state = stockload::server::AppState {
        store: Arc::new(store),
        caller,
        options: ImportOptions::default(),
    };
    stockload::server::start_server(port, state).await
}
