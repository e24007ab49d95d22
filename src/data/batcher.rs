// ============================================================
// Layer 4 — Crystal Graph Batcher
// ============================================================
// Collates several crystal graphs into one disjoint "super graph"
// the model can run in a single forward pass.
//
//   crystal 0: atoms 0..n0          nbr idx unchanged
//   crystal 1: atoms n0..n0+n1      nbr idx + n0
//   crystal 2: ...                  nbr idx + n0 + n1
//
//   atom_fea          [N, orig]     rows concatenated
//   nbr_fea           [N, M, B]     rows concatenated
//   nbr_fea_idx       [N, M]        offset by running atom count
//   crystal_atom_idx  N0 × [n_i]    the rows each crystal owns
//
// Every graph must use the same neighbour count M.
//
// Reference: Burn Book §4 (Batcher)

use burn::prelude::*;

use crate::domain::crystal_graph::{CrystalGraph, GraphError};

// ─── CrystalGraphBatch ───────────────────────────────────────────────────────
/// Tensors for one model forward pass.
///
/// Only obtainable through `CrystalBatcher::batch` or the checked
/// `CrystalGraphBatch::new`, so the model can rely on consistent shapes
/// and on `crystal_atom_idx` covering exactly N atoms.
#[derive(Debug, Clone)]
pub struct CrystalGraphBatch<B: Backend> {
    atom_fea:         Tensor<B, 2>,
    nbr_fea:          Tensor<B, 3>,
    nbr_fea_idx:      Tensor<B, 2, Int>,
    crystal_atom_idx: Vec<Tensor<B, 1, Int>>,
}

impl<B: Backend> CrystalGraphBatch<B> {
    /// Wrap tensors built elsewhere after checking shapes and index ranges.
    pub fn new(
        atom_fea:         Tensor<B, 2>,
        nbr_fea:          Tensor<B, 3>,
        nbr_fea_idx:      Tensor<B, 2, Int>,
        crystal_atom_idx: Vec<Tensor<B, 1, Int>>,
    ) -> Result<Self, GraphError> {
        let [n, _]        = atom_fea.dims();
        let [n_bond, m, _] = nbr_fea.dims();
        let [n_idx, m_idx] = nbr_fea_idx.dims();

        if n == 0 {
            return Err(GraphError::Shape("atom_fea has no rows".into()));
        }
        if n_bond != n || n_idx != n {
            return Err(GraphError::Shape(format!(
                "atom_fea has {n} rows, nbr_fea {n_bond}, nbr_fea_idx {n_idx}"
            )));
        }
        if m == 0 || m_idx != m {
            return Err(GraphError::Shape(format!(
                "nbr_fea has {m} neighbour slots, nbr_fea_idx {m_idx}"
            )));
        }
        if crystal_atom_idx.is_empty() {
            return Err(GraphError::EmptyBatch);
        }

        let mut covered = 0;
        for (crystal, idx) in crystal_atom_idx.iter().enumerate() {
            let [len] = idx.dims();
            if len == 0 {
                return Err(GraphError::EmptyCrystal { crystal });
            }
            covered += len;
        }
        if covered != n {
            return Err(GraphError::PoolingCoverage { covered, atoms: n });
        }

        check_index_range(nbr_fea_idx.clone().flatten::<1>(0, 1), n, "nbr_fea_idx")?;
        check_index_range(Tensor::cat(crystal_atom_idx.clone(), 0), n, "crystal_atom_idx")?;

        Ok(Self { atom_fea, nbr_fea, nbr_fea_idx, crystal_atom_idx })
    }

    /// N, total atoms across all crystals.
    pub fn num_atoms(&self) -> usize {
        self.atom_fea.dims()[0]
    }

    /// M, neighbour slots per atom.
    pub fn num_neighbours(&self) -> usize {
        self.nbr_fea_idx.dims()[1]
    }

    /// N0, crystals in the batch.
    pub fn num_crystals(&self) -> usize {
        self.crystal_atom_idx.len()
    }

    /// (atom_fea, nbr_fea, nbr_fea_idx, crystal_atom_idx)
    pub fn into_parts(
        self,
    ) -> (Tensor<B, 2>, Tensor<B, 3>, Tensor<B, 2, Int>, Vec<Tensor<B, 1, Int>>) {
        (self.atom_fea, self.nbr_fea, self.nbr_fea_idx, self.crystal_atom_idx)
    }
}

/// Every value of `idx` must address one of `atoms` rows.
fn check_index_range<B: Backend>(
    idx:   Tensor<B, 1, Int>,
    atoms: usize,
    name:  &str,
) -> Result<(), GraphError> {
    let min: i64 = idx.clone().min().into_scalar().elem();
    let max: i64 = idx.max().into_scalar().elem();
    if min < 0 || max >= atoms as i64 {
        return Err(GraphError::Shape(format!(
            "{name} values span [{min}, {max}] but only {atoms} atoms exist"
        )));
    }
    Ok(())
}

// ─── Targets ──────────────────────────────────────────────────────────────────
/// Ground truth for one batch, in the form the matching head expects.
#[derive(Debug, Clone)]
pub enum Targets<B: Backend> {
    /// [N0, 1] property values
    Regression(Tensor<B, 2>),
    /// [N0] class indices (0 or 1)
    Classification(Tensor<B, 1, Int>),
}

// ─── CrystalBatcher ───────────────────────────────────────────────────────────
/// Holds the target device so tensors are created on the correct GPU/CPU.
#[derive(Clone, Debug)]
pub struct CrystalBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> CrystalBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// Collate crystal graphs into a single batch.
    ///
    /// Feature widths are taken from the first graph; every graph is
    /// validated against them before any tensor is built.
    pub fn batch(&self, graphs: &[CrystalGraph]) -> Result<CrystalGraphBatch<B>, GraphError> {
        let first = graphs.first().ok_or(GraphError::EmptyBatch)?;
        let orig_len = first
            .atom_fea
            .first()
            .map(Vec::len)
            .ok_or_else(|| GraphError::NoAtoms { id: first.id.clone() })?;
        let nbr_len = first
            .nbr_fea
            .first()
            .and_then(|rows| rows.first())
            .map_or(0, Vec::len);

        for g in graphs {
            g.validate(orig_len, nbr_len)?;
        }
        let m = first.max_neighbours();
        if let Some(g) = graphs.iter().find(|g| g.max_neighbours() != m) {
            return Err(GraphError::BatchNeighbourCount {
                id: g.id.clone(), found: g.max_neighbours(), expected: m,
            });
        }

        let n: usize = graphs.iter().map(CrystalGraph::num_atoms).sum();

        let mut atom_flat = Vec::with_capacity(n * orig_len);
        let mut nbr_flat  = Vec::with_capacity(n * m * nbr_len);
        let mut idx_flat  = Vec::with_capacity(n * m);
        let mut crystal_atom_idx = Vec::with_capacity(graphs.len());

        let mut base = 0usize;
        for g in graphs {
            atom_flat.extend(g.atom_fea.iter().flatten().copied());
            nbr_flat.extend(g.nbr_fea.iter().flatten().flatten().copied());
            idx_flat.extend(g.nbr_fea_idx.iter().flatten().map(|&j| (j + base) as i32));

            let end = base + g.num_atoms();
            crystal_atom_idx.push(Tensor::<B, 1, Int>::arange(base as i64..end as i64, &self.device));
            base = end;
        }

        let atom_fea = Tensor::<B, 1>::from_floats(atom_flat.as_slice(), &self.device)
            .reshape([n, orig_len]);
        let nbr_fea = Tensor::<B, 1>::from_floats(nbr_flat.as_slice(), &self.device)
            .reshape([n, m, nbr_len]);
        let nbr_fea_idx = Tensor::<B, 1, Int>::from_ints(idx_flat.as_slice(), &self.device)
            .reshape([n, m]);

        tracing::debug!(
            "Collated {} crystals: {} atoms, {} neighbours each",
            graphs.len(), n, m,
        );

        Ok(CrystalGraphBatch { atom_fea, nbr_fea, nbr_fea_idx, crystal_atom_idx })
    }

    /// [N0, 1] regression targets in crystal order.
    pub fn regression_targets(&self, graphs: &[CrystalGraph]) -> Result<Targets<B>, GraphError> {
        let values = graphs
            .iter()
            .map(CrystalGraph::require_target)
            .collect::<Result<Vec<f32>, _>>()?;
        let t = Tensor::<B, 1>::from_floats(values.as_slice(), &self.device)
            .reshape([graphs.len(), 1]);
        Ok(Targets::Regression(t))
    }

    /// [N0] class indices; targets must be exactly 0.0 or 1.0.
    pub fn class_targets(&self, graphs: &[CrystalGraph]) -> Result<Targets<B>, GraphError> {
        let mut classes = Vec::with_capacity(graphs.len());
        for g in graphs {
            let target = g.require_target()?;
            if target != 0.0 && target != 1.0 {
                return Err(GraphError::InvalidClass { id: g.id.clone(), target });
            }
            classes.push(target as i32);
        }
        let t = Tensor::<B, 1, Int>::from_ints(classes.as_slice(), &self.device);
        Ok(Targets::Classification(t))
    }
}
