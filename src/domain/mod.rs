// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits describing crystal graphs.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Tensor shapes are checked here, on plain vectors, so that the
// ML layer can assume well-formed input.

/// A crystal structure graph and its validation errors
pub mod crystal_graph;

/// Core abstractions (traits) that other layers implement
pub mod traits;
