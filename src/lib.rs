//! Crystal graph convolutional network (CGCNN) with neighbour
//! self-attention, built on Burn.
//!
//! The network consumes collated crystal graphs
//! ([`data::batcher::CrystalGraphBatch`]) and returns one row per
//! crystal: a scalar property for regression, or two class
//! log-probabilities for classification.

#![recursion_limit = "256"]

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod infra;
pub mod ml;

pub use data::batcher::{CrystalBatcher, CrystalGraphBatch, Targets};
pub use domain::crystal_graph::{CrystalGraph, GraphError};
pub use ml::model::{pooling, CrystalGraphConvNet, CrystalGraphConvNetConfig};
