// ============================================================
// Layer 4 — Crystal Graph Loader
// ============================================================
// Reads pre-built crystal graphs from JSON.
//
// Two layouts are accepted:
//   graphs.json          one file holding an array of graphs
//   graphs/              a directory of *.json files, one graph each
//
// In directory mode a malformed file is skipped with a warning;
// in single-file mode any parse error is fatal.

use anyhow::{bail, Context, Result};
use std::{fs, path::{Path, PathBuf}};

use crate::domain::crystal_graph::CrystalGraph;
use crate::domain::traits::GraphSource;

/// Reads crystal graphs from a JSON array file or a directory of `*.json` files.
pub struct JsonGraphLoader {
    path: PathBuf,
}

impl JsonGraphLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl GraphSource for JsonGraphLoader {
    fn load_all(&self) -> Result<Vec<CrystalGraph>> {
        if self.path.is_dir() {
            return load_dir(&self.path);
        }
        if !self.path.exists() {
            bail!("Graph file '{}' does not exist", self.path.display());
        }

        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read '{}'", self.path.display()))?;
        let graphs: Vec<CrystalGraph> = serde_json::from_str(&json)
            .with_context(|| format!("'{}' is not a JSON array of crystal graphs", self.path.display()))?;

        tracing::info!("Loaded {} crystal graphs from '{}'", graphs.len(), self.path.display());
        Ok(graphs)
    }
}

fn load_dir(dir: &Path) -> Result<Vec<CrystalGraph>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Cannot read directory '{}'", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    // read_dir order is platform dependent
    paths.sort();

    let mut graphs = Vec::with_capacity(paths.len());
    for path in paths {
        match load_single(&path) {
            Ok(g) => {
                tracing::debug!("Loaded: {} ({} atoms)", g.id, g.num_atoms());
                graphs.push(g);
            }
            Err(e) => tracing::warn!("Skipping '{}': {:#}", path.display(), e),
        }
    }

    tracing::info!("Loaded {} crystal graphs from '{}'", graphs.len(), dir.display());
    Ok(graphs)
}

fn load_single(path: &Path) -> Result<CrystalGraph> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    Ok(serde_json::from_str(&json)?)
}
