// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence that doesn't belong to any one
// business layer:
//
//   config_store.rs — saves/loads the model hyperparameters
//                     as JSON so every command rebuilds the
//                     same architecture.
//
// Reference: Burn Book §5 (Records and Checkpointing)

/// Model config persistence
pub mod config_store;
