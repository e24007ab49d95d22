// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// From serialized crystal graphs to model-ready tensors:
//
//   graphs.json / graphs/*.json
//       │
//       ▼
//   JsonGraphLoader   → Vec<CrystalGraph>
//       │
//       ▼
//   CrystalBatcher    → CrystalGraphBatch (+ Targets)
//       │
//       ▼
//   CrystalGraphConvNet::forward
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads crystal graphs from JSON files
pub mod loader;

/// Collates graphs into tensor batches
pub mod batcher;

#[cfg(test)]
pub(crate) mod fixtures;
