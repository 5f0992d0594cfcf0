//! Command implementations and the session they share

pub mod collection;
pub mod element;
pub mod reconcile;
pub mod tree;

use std::fs;
use std::path::PathBuf;

use datastores_core::registry::{ElementKindDef, KindRegistry};
use datastores_core::{EditorContext, ReconcilerConfig, StableId};
use datastores_store::workspace::load_or_default;
use datastores_store::{save_workspace, WorkspaceFile};
use serde::Deserialize;

use crate::GlobalArgs;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Contents of the `--config` file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub reconciler: ReconcilerConfig,
    pub kinds: Vec<ElementKindDef>,
}

impl CliConfig {
    pub fn load(path: Option<&PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .map_err(|e| format!("cannot read config {}: {}", path.display(), e))?;
        let config: CliConfig = toml::from_str(&text)
            .map_err(|e| format!("invalid config {}: {}", path.display(), e))?;
        config.reconciler.validate()?;
        Ok(config)
    }

    /// Built-in kinds plus every kind declared in the file
    pub fn kind_registry(&self) -> Result<KindRegistry, Box<dyn std::error::Error>> {
        let mut registry = KindRegistry::with_builtin_kinds();
        for def in &self.kinds {
            registry.register(def.clone())?;
        }
        Ok(registry)
    }
}

/// Loaded workspace plus the editor context built over it
pub struct Session {
    path: PathBuf,
    pub workspace: WorkspaceFile,
    pub ctx: EditorContext,
    pub config: CliConfig,
}

impl Session {
    pub fn open(global: &GlobalArgs) -> Result<Self, Box<dyn std::error::Error>> {
        let config = CliConfig::load(global.config.as_ref())?;
        let workspace = load_or_default(&global.workspace)?;

        let mut ctx = EditorContext::new(config.kind_registry()?);
        let report = ctx.init(&workspace.collections);
        if report.duplicates > 0 {
            tracing::warn!(
                duplicates = report.duplicates,
                "Workspace contains duplicate ids"
            );
        }

        Ok(Self {
            path: global.workspace.clone(),
            workspace,
            ctx,
            config,
        })
    }

    pub fn save(&mut self) -> CommandResult {
        save_workspace(&self.path, &mut self.workspace)?;
        Ok(())
    }

    /// Collection owning element `id`
    pub fn owner_of(&self, id: StableId) -> Result<StableId, Box<dyn std::error::Error>> {
        self.workspace
            .owner_of(id)
            .ok_or_else(|| format!("element {} not found in any collection", id).into())
    }
}

/// Parse an id given as `ID-xxxxxx` or its bare encoding
pub fn parse_id(text: &str) -> Result<StableId, Box<dyn std::error::Error>> {
    Ok(text.parse::<StableId>()?)
}
