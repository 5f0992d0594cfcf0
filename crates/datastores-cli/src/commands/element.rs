//! Element commands
//!
//! Usage: datastores element add <COLLECTION> <NAME> [--parent <ID>] [--kind <TAG>] [--asset <CONTENT_ID>]...
//!        datastores element delete <ID>
//!        datastores element move <ID> [--parent <ID>] [--index <N>]
//!        datastores element rename <ID> <NAME>
//!        datastores element set <ID> --kind <TAG> [--asset <CONTENT_ID>]...
//!
//! Omitting `--parent` means the top level of the collection.

use clap::{Args, Subcommand};
use datastores_core::model::{BundleAssetConfig, ElementPayload};
use datastores_core::StableId;

use super::{parse_id, CommandResult, Session};
use crate::GlobalArgs;

#[derive(Debug, Args)]
pub struct ElementArgs {
    #[command(subcommand)]
    pub command: ElementCommand,
}

#[derive(Debug, Subcommand)]
pub enum ElementCommand {
    /// Add an element to a collection
    Add(AddArgs),
    /// Delete an element and its whole subtree
    Delete(DeleteArgs),
    /// Re-parent an element within its collection
    Move(MoveArgs),
    /// Change an element's display name
    Rename(RenameArgs),
    /// Replace an element's kind and bundle assets
    Set(SetArgs),
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Collection id
    pub collection: String,

    /// Display name
    pub name: String,

    /// Parent element id (default: top level)
    #[arg(long)]
    pub parent: Option<String>,

    /// Registered element kind tag
    #[arg(long, default_value = "folder")]
    pub kind: String,

    /// Content id the element bundles; repeatable
    #[arg(long = "asset")]
    pub assets: Vec<String>,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    pub id: String,
}

#[derive(Debug, Args)]
pub struct MoveArgs {
    pub id: String,

    /// New parent element id (default: top level)
    #[arg(long)]
    pub parent: Option<String>,

    /// Position among the new siblings; out of range appends
    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    pub index: i64,
}

#[derive(Debug, Args)]
pub struct RenameArgs {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    pub id: String,

    /// Registered element kind tag
    #[arg(long)]
    pub kind: String,

    /// Content id the element bundles; repeatable, replaces the current list
    #[arg(long = "asset")]
    pub assets: Vec<String>,
}

/// Execute element command
pub fn execute(args: ElementArgs, global: &GlobalArgs) -> CommandResult {
    match args.command {
        ElementCommand::Add(add_args) => execute_add(add_args, global),
        ElementCommand::Delete(delete_args) => execute_delete(delete_args, global),
        ElementCommand::Move(move_args) => execute_move(move_args, global),
        ElementCommand::Rename(rename_args) => execute_rename(rename_args, global),
        ElementCommand::Set(set_args) => execute_set(set_args, global),
    }
}

fn parse_parent(parent: Option<&str>) -> Result<StableId, Box<dyn std::error::Error>> {
    parent.map_or(Ok(StableId::INVALID), parse_id)
}

fn build_payload(
    session: &Session,
    kind: &str,
    assets: Vec<String>,
) -> Result<ElementPayload, Box<dyn std::error::Error>> {
    let mut payload = session.ctx.kinds.payload_for(kind)?;
    for asset in assets {
        payload = payload.with_asset(BundleAssetConfig::new(asset));
    }
    Ok(payload)
}

fn execute_add(args: AddArgs, global: &GlobalArgs) -> CommandResult {
    let mut session = Session::open(global)?;
    let collection_id = parse_id(&args.collection)?;
    let parent = parse_parent(args.parent.as_deref())?;
    let payload = build_payload(&session, &args.kind, args.assets)?;

    let Session { workspace, ctx, .. } = &mut session;
    let collection = workspace
        .collection_mut(collection_id)
        .ok_or_else(|| format!("collection {} not found", collection_id))?;
    let id = collection.add_element(&mut ctx.ids, args.name, payload, parent)?;
    session.save()?;

    println!("{}", id);
    Ok(())
}

fn execute_delete(args: DeleteArgs, global: &GlobalArgs) -> CommandResult {
    let mut session = Session::open(global)?;
    let id = parse_id(&args.id)?;
    let owner = session.owner_of(id)?;

    let Session { workspace, ctx, .. } = &mut session;
    let removed = workspace
        .collection_mut(owner)
        .ok_or_else(|| format!("collection {} not found", owner))?
        .delete_element(&mut ctx.ids, id)?;
    session.save()?;

    println!("Deleted {} element(s)", removed.len());
    Ok(())
}

fn execute_move(args: MoveArgs, global: &GlobalArgs) -> CommandResult {
    let mut session = Session::open(global)?;
    let id = parse_id(&args.id)?;
    let parent = parse_parent(args.parent.as_deref())?;
    let owner = session.owner_of(id)?;
    if !parent.is_invalid() && session.owner_of(parent)? != owner {
        return Err(format!(
            "{} and {} belong to different collections; delete and re-add instead",
            id, parent
        )
        .into());
    }

    session
        .workspace
        .collection_mut(owner)
        .ok_or_else(|| format!("collection {} not found", owner))?
        .move_element(id, parent, args.index)?;
    session.save()?;

    println!("Moved {}", id);
    Ok(())
}

fn execute_rename(args: RenameArgs, global: &GlobalArgs) -> CommandResult {
    let mut session = Session::open(global)?;
    let id = parse_id(&args.id)?;
    let owner = session.owner_of(id)?;

    session
        .workspace
        .collection_mut(owner)
        .ok_or_else(|| format!("collection {} not found", owner))?
        .rename_element(id, args.name)?;
    session.save()?;

    println!("Renamed {}", id);
    Ok(())
}

fn execute_set(args: SetArgs, global: &GlobalArgs) -> CommandResult {
    let mut session = Session::open(global)?;
    let id = parse_id(&args.id)?;
    let owner = session.owner_of(id)?;
    let payload = build_payload(&session, &args.kind, args.assets)?;
    let asset_count = payload.bundle_assets.len();

    session
        .workspace
        .collection_mut(owner)
        .ok_or_else(|| format!("collection {} not found", owner))?
        .set_payload(id, payload)?;
    session.save()?;

    println!("Updated {} ({} asset(s))", id, asset_count);
    Ok(())
}
