// ============================================================
// Layer 6 — Model Config Store
// ============================================================
// Persists the model hyperparameters as JSON so any later run
// can rebuild exactly the same architecture.
//
//   <dir>/model_config.json

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::ml::model::CrystalGraphConvNetConfig;

const CONFIG_FILE: &str = "model_config.json";

/// Reads and writes `model_config.json` inside one directory.
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Full path of the config file.
    pub fn path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    /// Write the config, creating the directory if needed.
    pub fn save(&self, cfg: &CrystalGraphConvNetConfig) -> Result<()> {
        cfg.check()?;
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let path = self.path();
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved model config to '{}'", path.display());
        Ok(())
    }

    /// Read the config back and re-check it.
    pub fn load(&self) -> Result<CrystalGraphConvNetConfig> {
        let path = self.path();
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. Run 'init-config' first.",
                path.display()
            )
        })?;
        let cfg: CrystalGraphConvNetConfig = serde_json::from_str(&json)
            .with_context(|| format!("Malformed model config '{}'", path.display()))?;
        cfg.check()
            .with_context(|| format!("Invalid model config '{}'", path.display()))?;
        Ok(cfg)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("model"));
        let cfg   = CrystalGraphConvNetConfig::new(92, 41)
            .with_n_h(2)
            .with_classification(true);

        store.save(&cfg).unwrap();
        let back = store.load().unwrap();
        assert_eq!(back.orig_atom_fea_len, 92);
        assert_eq!(back.nbr_fea_len, 41);
        assert_eq!(back.n_h, 2);
        assert!(back.classification);
        assert!(back.attention);
    }

    #[test]
    fn test_load_without_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigStore::new(dir.path()).load().unwrap_err();
        assert!(format!("{err:#}").contains("init-config"));
    }

    #[test]
    fn test_invalid_config_not_saved() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        assert!(store.save(&CrystalGraphConvNetConfig::new(0, 4)).is_err());
        assert!(!store.path().exists());
    }
}
