// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Each use case wires the other layers together for one CLI
// command.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination

// Write a model config to disk
pub mod init_config_use_case;

// Rebuild the model from its config and summarise it
pub mod describe_use_case;

// Validate graphs and run one inference pass
pub mod check_use_case;
