//! Datastores CLI
//!
//! Command-line interface for editing collections and reconciling the
//! packaging layout

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use datastores_core::logging_facility::{init, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "datastores")]
#[command(about = "Datastores - hierarchical content collections and bundle layout", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Workspace file holding all collections
    #[arg(long, global = true, default_value = "datastores.json")]
    pub workspace: PathBuf,

    /// TOML file with `[reconciler]` settings and `[[kinds]]` definitions
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON on stderr
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Collection operations
    Collection(commands::collection::CollectionArgs),
    /// Element operations within a collection
    Element(commands::element::ElementArgs),
    /// Print collection hierarchies
    Tree(commands::tree::TreeArgs),
    /// Diff the desired packaging layout against the persisted one
    Analyze(commands::reconcile::AnalyzeArgs),
    /// Apply the diff to the persisted layout
    Fix(commands::reconcile::ReconcileArgs),
}

fn main() {
    let cli = Cli::parse();

    init(if cli.global.log_json {
        Profile::Production
    } else {
        Profile::Development
    });

    let result = match cli.command {
        Commands::Collection(args) => commands::collection::execute(args, &cli.global),
        Commands::Element(args) => commands::element::execute(args, &cli.global),
        Commands::Tree(args) => commands::tree::execute(args, &cli.global),
        Commands::Analyze(args) => commands::reconcile::execute_analyze(args, &cli.global),
        Commands::Fix(args) => commands::reconcile::execute_fix(args, &cli.global),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
