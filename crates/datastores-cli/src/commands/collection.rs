//! Collection commands
//!
//! Usage: datastores collection add <NAME> --type <TYPE> [--content-id <ID>] [--runtime]
//!        datastores collection list

use clap::{Args, Subcommand};
use datastores_core::Collection;

use super::{CommandResult, Session};
use crate::GlobalArgs;

#[derive(Debug, Args)]
pub struct CollectionArgs {
    #[command(subcommand)]
    pub command: CollectionCommand,
}

#[derive(Debug, Subcommand)]
pub enum CollectionCommand {
    /// Create an empty collection
    Add(AddArgs),
    /// List collections in the workspace
    List,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Display name
    pub name: String,

    /// Collection kind; labels the collection's own asset
    #[arg(long = "type")]
    pub type_name: String,

    /// Content id of the collection's own asset
    #[arg(long)]
    pub content_id: Option<String>,

    /// Package this collection for runtime use
    #[arg(long)]
    pub runtime: bool,
}

/// Execute collection command
pub fn execute(args: CollectionArgs, global: &GlobalArgs) -> CommandResult {
    match args.command {
        CollectionCommand::Add(add_args) => execute_add(add_args, global),
        CollectionCommand::List => execute_list(global),
    }
}

fn execute_add(args: AddArgs, global: &GlobalArgs) -> CommandResult {
    let mut session = Session::open(global)?;

    let mut collection = Collection::create(&mut session.ctx.ids, args.name, args.type_name)?
        .with_runtime_supported(args.runtime);
    if let Some(content_id) = args.content_id {
        collection = collection.with_content_id(content_id);
    }
    let id = collection.id;
    session.workspace.collections.push(collection);
    session.save()?;

    println!("{}", id);
    Ok(())
}

fn execute_list(global: &GlobalArgs) -> CommandResult {
    let session = Session::open(global)?;
    for collection in &session.workspace.collections {
        println!(
            "{}\t{}\t{}\t{} elements{}",
            collection.id,
            collection.display_name,
            collection.type_name,
            collection.store().len(),
            if collection.runtime_supported {
                "\truntime"
            } else {
                ""
            }
        );
    }
    Ok(())
}
