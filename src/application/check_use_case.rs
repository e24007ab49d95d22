// ============================================================
// Layer 2 — CheckUseCase
// ============================================================
// Dry-runs a set of crystal graphs through a freshly built model:
//
//   Step 1: Load the model config           (Layer 6 - infra)
//   Step 2: Load graphs from JSON           (Layer 4 - data)
//   Step 3: Validate against config widths  (Layer 3 - domain)
//   Step 4: Collate into batches            (Layer 4 - data)
//   Step 5: Inference forward pass          (Layer 5 - ml)
//
// Weights are freshly initialised, so the numbers only prove the
// data is well-formed and flows end to end.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use crate::data::{batcher::CrystalBatcher, loader::JsonGraphLoader};
use crate::domain::traits::GraphSource;
use crate::infra::config_store::ConfigStore;
use crate::ml::model::CrystalGraphConvNet;

type InferBackend = burn::backend::NdArray;

/// One model output row per crystal.
#[derive(Debug, Clone, PartialEq)]
pub struct CrystalPrediction {
    pub id: String,
    /// Regression: the predicted value. Classification: class probabilities.
    pub output: Vec<f32>,
}

pub struct CheckUseCase {
    model_dir:  PathBuf,
    graphs:     PathBuf,
    batch_size: usize,
}

impl CheckUseCase {
    pub fn new(model_dir: impl Into<PathBuf>, graphs: impl Into<PathBuf>, batch_size: usize) -> Self {
        Self { model_dir: model_dir.into(), graphs: graphs.into(), batch_size: batch_size.max(1) }
    }

    /// One prediction per graph, in input order.
    pub fn execute(&self) -> Result<Vec<CrystalPrediction>> {
        let cfg    = ConfigStore::new(&self.model_dir).load()?;
        let graphs = JsonGraphLoader::new(&self.graphs).load_all()?;
        if graphs.is_empty() {
            bail!("No crystal graphs found in '{}'", self.graphs.display());
        }

        for g in &graphs {
            g.validate(cfg.orig_atom_fea_len, cfg.nbr_fea_len)
                .with_context(|| format!("Graph '{}' does not fit the model config", g.id))?;
        }

        let device  = burn::backend::ndarray::NdArrayDevice::default();
        let model: CrystalGraphConvNet<InferBackend> = cfg.init(&device);
        let batcher = CrystalBatcher::<InferBackend>::new(device);

        let width = cfg.output_len();
        let mut predictions = Vec::with_capacity(graphs.len());

        for chunk in graphs.chunks(self.batch_size) {
            let batch  = batcher.batch(chunk)?;
            let output = model.forward(batch);
            let output = if cfg.classification { output.exp() } else { output };
            let values = output
                .into_data()
                .to_vec::<f32>()
                .map_err(|e| anyhow::anyhow!("Cannot read model output: {e:?}"))?;

            predictions.extend(chunk.iter().zip(values.chunks(width)).map(|(g, row)| {
                CrystalPrediction { id: g.id.clone(), output: row.to_vec() }
            }));
        }

        tracing::info!("Checked {} crystals", predictions.len());
        Ok(predictions)
    }
}
