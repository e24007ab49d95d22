// ============================================================
// Layer 2 — InitConfigUseCase
// ============================================================
// Writes a model config for the given input widths so later
// commands rebuild the same architecture.

use anyhow::Result;
use std::path::PathBuf;

use crate::infra::config_store::ConfigStore;
use crate::ml::model::CrystalGraphConvNetConfig;

pub struct InitConfigUseCase {
    model_dir: PathBuf,
    config:    CrystalGraphConvNetConfig,
}

impl InitConfigUseCase {
    pub fn new(model_dir: impl Into<PathBuf>, config: CrystalGraphConvNetConfig) -> Self {
        Self { model_dir: model_dir.into(), config }
    }

    /// Returns the path of the written file.
    pub fn execute(&self) -> Result<PathBuf> {
        let store = ConfigStore::new(&self.model_dir);
        store.save(&self.config)?;
        tracing::info!("Model config written to '{}'", store.path().display());
        Ok(store.path())
    }
}
