//! Subcommand implementations and the session they share

pub mod classify;
pub mod maintain;
pub mod status;
pub mod territory;

use anyhow::{Context, Result};
use fieldwork::prelude::*;
use fieldwork::load_options;
use fieldwork_memory::MemoryStore;
use std::path::PathBuf;

pub struct SessionArgs {
    pub fixture: PathBuf,
    pub config: Option<PathBuf>,
    pub congregation: String,
    pub user: String,
    pub role: String,
    pub dry_run: bool,
}

/// Fixture-backed store plus the policy of the acting user
pub struct Session {
    pub store: MemoryStore,
    pub config: EngineConfig,
    pub congregation: String,
    pub policy: Policy,
    fixture: PathBuf,
    dry_run: bool,
}

impl Session {
    pub async fn open(args: SessionArgs) -> Result<Self> {
        let config = match &args.config {
            Some(path) => EngineConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => EngineConfig::default(),
        };

        let store = MemoryStore::load_fixture(&args.fixture)
            .with_context(|| format!("Failed to load fixture {}", args.fixture.display()))?;

        let options = load_options(&store, &args.congregation)
            .await
            .context("Failed to load household types")?;
        let policy = Policy::from_config(&config, args.user, &args.role, options);

        tracing::debug!(
            congregation = %args.congregation,
            role = policy.role().as_str(),
            options = policy.options().len(),
            "Session opened"
        );

        Ok(Self {
            store,
            config,
            congregation: args.congregation,
            policy,
            fixture: args.fixture,
            dry_run: args.dry_run,
        })
    }

    pub fn store_handle(&self) -> Arc<dyn DocumentStore> {
        Arc::new(self.store.clone())
    }

    pub fn maintenance(&self) -> Result<MapMaintenance> {
        let mutator = BatchMutator::from_config(self.store_handle(), &self.config)
            .context("Invalid engine configuration")?;
        Ok(MapMaintenance::new(mutator, self.congregation.clone()))
    }

    /// Only administrators may change data.
    pub fn require_admin(&self) -> Result<()> {
        if !self.policy.is_from_admin() {
            anyhow::bail!(
                "role '{}' cannot modify data",
                self.policy.role().as_str()
            );
        }
        Ok(())
    }

    /// Write the store back to the fixture unless this is a dry run.
    pub fn persist(&self) -> Result<()> {
        if self.dry_run {
            println!("(dry run: {} not modified)", self.fixture.display());
            return Ok(());
        }
        self.store
            .save_fixture(&self.fixture)
            .with_context(|| format!("Failed to write fixture {}", self.fixture.display()))
    }
}
