//! Tree command
//!
//! Usage: datastores tree [<COLLECTION>]

use clap::Args;
use datastores_core::TreeNode;

use super::{parse_id, CommandResult, Session};
use crate::GlobalArgs;

#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Collection id (default: every collection)
    pub collection: Option<String>,
}

/// Execute tree command
pub fn execute(args: TreeArgs, global: &GlobalArgs) -> CommandResult {
    let mut session = Session::open(global)?;
    let only = args.collection.as_deref().map(parse_id).transpose()?;

    let mut out = String::new();
    for collection in &mut session.workspace.collections {
        if only.is_some_and(|id| id != collection.id) {
            continue;
        }
        out.push_str(&format!(
            "{} ({}) [{}]\n",
            collection.display_name, collection.id, collection.type_name
        ));
        for root in collection.get_roots() {
            render_node(root, 1, &mut out);
        }
    }

    if let Some(id) = only {
        if out.is_empty() {
            return Err(format!("collection {} not found", id).into());
        }
    }
    print!("{}", out);
    Ok(())
}

fn render_node(node: &TreeNode, depth: usize, out: &mut String) {
    out.push_str(&format!(
        "{}- {} ({}) {}\n",
        "  ".repeat(depth),
        node.element.display_name,
        node.id(),
        node.element.payload.kind.tag()
    ));
    for child in &node.children {
        render_node(child, depth + 1, out);
    }
}
