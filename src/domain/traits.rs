// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The model only ever sees collated tensors; where the crystal
// graphs come from is somebody else's business. Anything that
// can hand over a list of graphs implements GraphSource:
//
//   - JsonGraphLoader → reads a JSON array from disk
//   - an in-memory Vec<CrystalGraph> (tests, embedding callers)

use anyhow::Result;
use crate::domain::crystal_graph::CrystalGraph;

/// Any component that can provide crystal graphs.
pub trait GraphSource {
    fn load_all(&self) -> Result<Vec<CrystalGraph>>;
}

impl GraphSource for Vec<CrystalGraph> {
    fn load_all(&self) -> Result<Vec<CrystalGraph>> {
        Ok(self.clone())
    }
}
