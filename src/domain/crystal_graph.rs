// ============================================================
// Layer 3 — Crystal Graph Domain Type
// ============================================================
// One crystal as a graph: atoms are nodes, each atom keeps a
// fixed-size list of its M nearest neighbours, and every
// (atom, neighbour) edge carries a bond feature vector.
//
//   atom_fea     n × orig_atom_fea_len
//   nbr_fea      n × M × nbr_fea_len
//   nbr_fea_idx  n × M        (indices local to this crystal)
//
// Building these arrays from a structure file (neighbour search,
// Gaussian distance expansion) happens upstream; this type only
// carries and checks the result.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a crystal graph (or a batch of them) cannot be fed to the model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("crystal '{id}' has no atoms")]
    NoAtoms { id: String },

    #[error("crystal '{id}': atom {atom} has {found} features, expected {expected}")]
    AtomFeatureWidth { id: String, atom: usize, found: usize, expected: usize },

    #[error("crystal '{id}': atom {atom} has no neighbours")]
    NoNeighbours { id: String, atom: usize },

    #[error("crystal '{id}': atom {atom} has {found} neighbours, expected {expected}")]
    NeighbourCount { id: String, atom: usize, found: usize, expected: usize },

    #[error("crystal '{id}': atom {atom} has {found} bond feature rows, expected {expected}")]
    BondRowCount { id: String, atom: usize, found: usize, expected: usize },

    #[error("crystal '{id}': bond ({atom}, {slot}) has {found} features, expected {expected}")]
    BondFeatureWidth { id: String, atom: usize, slot: usize, found: usize, expected: usize },

    #[error("crystal '{id}': neighbour index {index} of atom {atom} is out of range for {atoms} atoms")]
    NeighbourOutOfRange { id: String, atom: usize, index: usize, atoms: usize },

    #[error("crystal '{id}' has no target value")]
    MissingTarget { id: String },

    #[error("cannot build a batch from zero crystals")]
    EmptyBatch,

    #[error("crystal '{id}' has {found} neighbours per atom but the batch uses {expected}")]
    BatchNeighbourCount { id: String, found: usize, expected: usize },

    #[error("classification target {target} of crystal '{id}' is not a class index")]
    InvalidClass { id: String, target: f32 },

    #[error("batch tensors disagree: {0}")]
    Shape(String),

    #[error("pooling index lists cover {covered} atoms but the batch has {atoms}")]
    PoolingCoverage { covered: usize, atoms: usize },

    #[error("crystal {crystal} has an empty pooling index list")]
    EmptyCrystal { crystal: usize },
}

/// A single crystal graph with optional regression / class target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrystalGraph {
    /// Identifier carried through for reporting (e.g. a materials id)
    pub id: String,

    /// [n_atoms][orig_atom_fea_len]
    pub atom_fea: Vec<Vec<f32>>,

    /// [n_atoms][M][nbr_fea_len] bond features
    pub nbr_fea: Vec<Vec<Vec<f32>>>,

    /// [n_atoms][M] neighbour atom indices, local to this crystal
    pub nbr_fea_idx: Vec<Vec<usize>>,

    /// Property value for regression, or class index (0.0 / 1.0)
    /// for classification.
    #[serde(default)]
    pub target: Option<f32>,
}

impl CrystalGraph {
    pub fn new(
        id:          impl Into<String>,
        atom_fea:    Vec<Vec<f32>>,
        nbr_fea:     Vec<Vec<Vec<f32>>>,
        nbr_fea_idx: Vec<Vec<usize>>,
    ) -> Self {
        Self { id: id.into(), atom_fea, nbr_fea, nbr_fea_idx, target: None }
    }

    pub fn with_target(mut self, target: f32) -> Self {
        self.target = Some(target);
        self
    }

    pub fn num_atoms(&self) -> usize {
        self.atom_fea.len()
    }

    /// Neighbours per atom, taken from the first atom.
    /// Only meaningful after `validate` succeeded.
    pub fn max_neighbours(&self) -> usize {
        self.nbr_fea_idx.first().map_or(0, Vec::len)
    }

    /// Check every shape and index against the expected feature widths.
    pub fn validate(
        &self,
        orig_atom_fea_len: usize,
        nbr_fea_len:       usize,
    ) -> Result<(), GraphError> {
        let n = self.num_atoms();
        if n == 0 {
            return Err(GraphError::NoAtoms { id: self.id.clone() });
        }

        for (atom, row) in self.atom_fea.iter().enumerate() {
            if row.len() != orig_atom_fea_len {
                return Err(GraphError::AtomFeatureWidth {
                    id: self.id.clone(), atom, found: row.len(), expected: orig_atom_fea_len,
                });
            }
        }

        if self.nbr_fea_idx.len() != n {
            return Err(GraphError::Shape(format!(
                "crystal '{}' has {} neighbour lists for {} atoms",
                self.id, self.nbr_fea_idx.len(), n
            )));
        }
        if self.nbr_fea.len() != n {
            return Err(GraphError::Shape(format!(
                "crystal '{}' has {} bond feature blocks for {} atoms",
                self.id, self.nbr_fea.len(), n
            )));
        }

        let m = self.max_neighbours();
        for (atom, (idx_row, bond_rows)) in self.nbr_fea_idx.iter().zip(&self.nbr_fea).enumerate() {
            if idx_row.is_empty() {
                return Err(GraphError::NoNeighbours { id: self.id.clone(), atom });
            }
            if idx_row.len() != m {
                return Err(GraphError::NeighbourCount {
                    id: self.id.clone(), atom, found: idx_row.len(), expected: m,
                });
            }
            if bond_rows.len() != m {
                return Err(GraphError::BondRowCount {
                    id: self.id.clone(), atom, found: bond_rows.len(), expected: m,
                });
            }
            for (slot, bond) in bond_rows.iter().enumerate() {
                if bond.len() != nbr_fea_len {
                    return Err(GraphError::BondFeatureWidth {
                        id: self.id.clone(), atom, slot, found: bond.len(), expected: nbr_fea_len,
                    });
                }
            }
            if let Some(&index) = idx_row.iter().find(|&&j| j >= n) {
                return Err(GraphError::NeighbourOutOfRange {
                    id: self.id.clone(), atom, index, atoms: n,
                });
            }
        }

        Ok(())
    }

    /// The target, or `MissingTarget` when the graph has none.
    pub fn require_target(&self) -> Result<f32, GraphError> {
        self.target.ok_or_else(|| GraphError::MissingTarget { id: self.id.clone() })
    }
}
