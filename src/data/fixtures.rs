// Seeded random crystal graphs for unit tests.

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::domain::crystal_graph::CrystalGraph;

/// `count` graphs of 2..=6 atoms, each atom with `m` random neighbours.
/// Targets alternate 0.0 / 1.0 so the same set serves both heads.
pub fn random_graphs(
    count:    usize,
    orig_len: usize,
    nbr_len:  usize,
    m:        usize,
    seed:     u64,
) -> Vec<CrystalGraph> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|c| {
            let n = rng.gen_range(2..=6);
            let atom_fea = (0..n)
                .map(|_| (0..orig_len).map(|_| rng.gen_range(-1.0f32..1.0)).collect())
                .collect();
            let nbr_fea = (0..n)
                .map(|_| {
                    (0..m)
                        .map(|_| (0..nbr_len).map(|_| rng.gen_range(0.0f32..1.0)).collect())
                        .collect()
                })
                .collect();
            let nbr_fea_idx = (0..n)
                .map(|_| (0..m).map(|_| rng.gen_range(0..n)).collect())
                .collect();
            CrystalGraph::new(format!("crystal-{c}"), atom_fea, nbr_fea, nbr_fea_idx)
                .with_target((c % 2) as f32)
        })
        .collect()
}
