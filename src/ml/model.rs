// ============================================================
// Layer 5 — Crystal Graph Convolutional Network
// ============================================================
// atoms ──embedding──▶ [N, F] ──ConvLayer × n_conv──▶ [N, F]
//       ──mean pool per crystal──▶ [N0, F]
//       ──softplus → conv_to_fc → softplus──▶ [N0, H]
//       ──(dropout, classification only)
//       ──(Linear → softplus) × (n_h − 1)
//       ──fc_out──▶ [N0, 1]  regression
//                   [N0, 2]  classification (log-probabilities)

use anyhow::{bail, Result};
use burn::{
    nn::{
        loss::{MseLoss, Reduction},
        Dropout, DropoutConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::log_softmax,
};

use crate::data::batcher::{CrystalGraphBatch, Targets};
use crate::ml::activation::softplus;
use crate::ml::conv::{ConvLayer, ConvLayerConfig};

// #[derive(Config)] brings Clone and serde impls of its own.
#[derive(Config, Debug)]
pub struct CrystalGraphConvNetConfig {
    /// Width of the raw atom feature vectors
    pub orig_atom_fea_len: usize,
    /// Width of the bond feature vectors
    pub nbr_fea_len: usize,
    /// Hidden atom feature width inside the conv stack
    #[config(default = 64)]
    pub atom_fea_len: usize,
    #[config(default = 3)]
    pub n_conv: usize,
    /// Hidden width after pooling
    #[config(default = 128)]
    pub h_fea_len: usize,
    /// Number of hidden layers after pooling, counting conv_to_fc
    #[config(default = 1)]
    pub n_h: usize,
    #[config(default = false)]
    pub classification: bool,
    #[config(default = true)]
    pub attention: bool,
    #[config(default = 4)]
    pub attention_expansion: usize,
    #[config(default = 0.2)]
    pub attention_dropout: f64,
    #[config(default = 0.5)]
    pub classification_dropout: f64,
}

impl CrystalGraphConvNetConfig {
    /// Reject hyperparameters no model can be built from.
    pub fn check(&self) -> Result<()> {
        let widths = [
            ("orig_atom_fea_len", self.orig_atom_fea_len),
            ("nbr_fea_len", self.nbr_fea_len),
            ("atom_fea_len", self.atom_fea_len),
            ("h_fea_len", self.h_fea_len),
            ("n_h", self.n_h),
            ("attention_expansion", self.attention_expansion),
        ];
        for (name, value) in widths {
            if value == 0 {
                bail!("{name} must be at least 1");
            }
        }
        for (name, p) in [
            ("attention_dropout", self.attention_dropout),
            ("classification_dropout", self.classification_dropout),
        ] {
            if !(0.0..1.0).contains(&p) {
                bail!("{name} must be in [0, 1), got {p}");
            }
        }
        Ok(())
    }

    /// The config every conv layer of this network is built from.
    pub fn conv_config(&self) -> ConvLayerConfig {
        ConvLayerConfig::new(self.atom_fea_len, self.nbr_fea_len)
            .with_attention(self.attention)
            .with_attention_expansion(self.attention_expansion)
            .with_attention_dropout(self.attention_dropout)
    }

    /// Width of the output row per crystal: 1 for regression, 2 for classification.
    pub fn output_len(&self) -> usize {
        if self.classification { 2 } else { 1 }
    }

    /// Build a freshly initialised network on `device`.
    pub fn init<B: Backend>(&self, device: &B::Device) -> CrystalGraphConvNet<B> {
        let conv_cfg = self.conv_config();
        let convs: Vec<ConvLayer<B>> = (0..self.n_conv)
            .map(|_| conv_cfg.init(device))
            .collect();
        let fcs: Vec<Linear<B>> = (1..self.n_h)
            .map(|_| LinearConfig::new(self.h_fea_len, self.h_fea_len).init(device))
            .collect();
        let dropout = self
            .classification
            .then(|| DropoutConfig::new(self.classification_dropout).init());

        let model = CrystalGraphConvNet {
            embedding:  LinearConfig::new(self.orig_atom_fea_len, self.atom_fea_len).init(device),
            convs,
            conv_to_fc: LinearConfig::new(self.atom_fea_len, self.h_fea_len).init(device),
            fcs,
            fc_out:     LinearConfig::new(self.h_fea_len, self.output_len()).init(device),
            dropout,
            classification: self.classification,
        };
        tracing::info!(
            "CGCNN ready: {} conv layers (attention={}), {} trainable parameters",
            self.n_conv, self.attention, model.num_trainable_params(),
        );
        model
    }
}

/// Embedding, conv stack, per-crystal pooling and the output head.
#[derive(Module, Debug)]
pub struct CrystalGraphConvNet<B: Backend> {
    pub embedding:  Linear<B>,
    pub convs:      Vec<ConvLayer<B>>,
    pub conv_to_fc: Linear<B>,
    pub fcs:        Vec<Linear<B>>,
    pub fc_out:     Linear<B>,
    pub dropout:    Option<Dropout>,
    pub classification: bool,
}

impl<B: Backend> CrystalGraphConvNet<B> {
    /// → [N0, 1] property predictions, or [N0, 2] class log-probabilities
    pub fn forward(&self, batch: CrystalGraphBatch<B>) -> Tensor<B, 2> {
        let (atom_fea, nbr_fea, nbr_fea_idx, crystal_atom_idx) = batch.into_parts();

        let atom_fea = self.atom_features(atom_fea, nbr_fea, nbr_fea_idx);
        let crys_fea = pooling(atom_fea, &crystal_atom_idx);

        let crys_fea = softplus(self.conv_to_fc.forward(softplus(crys_fea)));
        let crys_fea = match &self.dropout {
            Some(dropout) => dropout.forward(crys_fea),
            None => crys_fea,
        };
        let crys_fea = self
            .fcs
            .iter()
            .fold(crys_fea, |h, fc| softplus(fc.forward(h)));

        let out = self.fc_out.forward(crys_fea);
        if self.classification {
            log_softmax(out, 1)
        } else {
            out
        }
    }

    /// Weights and biases only. Burn's `num_params` also counts the
    /// BatchNorm running mean and variance, which are never trained.
    pub fn num_trainable_params(&self) -> usize {
        let running: usize = self.convs.iter().map(ConvLayer::num_running_stats).sum();
        self.num_params() - running
    }

    /// Embedding followed by the conv stack: per-atom features [N, F].
    pub fn atom_features(
        &self,
        atom_fea:    Tensor<B, 2>,
        nbr_fea:     Tensor<B, 3>,
        nbr_fea_idx: Tensor<B, 2, Int>,
    ) -> Tensor<B, 2> {
        self.convs.iter().fold(self.embedding.forward(atom_fea), |x, conv| {
            conv.forward(x, nbr_fea.clone(), nbr_fea_idx.clone())
        })
    }

    /// Loss = MSE for regression, mean negative log-likelihood for classification.
    pub fn forward_loss(
        &self,
        batch:   CrystalGraphBatch<B>,
        targets: Targets<B>,
    ) -> Result<(Tensor<B, 1>, Tensor<B, 2>)> {
        let n_crystals = batch.num_crystals();
        let output = self.forward(batch);

        let loss = match (self.classification, targets) {
            (false, Targets::Regression(t)) => {
                MseLoss::new().forward(output.clone(), t, Reduction::Mean)
            }
            (true, Targets::Classification(t)) => output
                .clone()
                .gather(1, t.reshape([n_crystals, 1]))
                .mean()
                .neg(),
            (true, Targets::Regression(_)) => {
                bail!("classification model needs class index targets")
            }
            (false, Targets::Classification(_)) => {
                bail!("regression model needs float targets")
            }
        };
        Ok((loss, output))
    }
}

/// Mean of the atom rows listed for each crystal, stacked in crystal order.
///
/// atom_fea: [N, F], crystal_atom_idx: N0 index lists → [N0, F]
pub fn pooling<B: Backend>(
    atom_fea:         Tensor<B, 2>,
    crystal_atom_idx: &[Tensor<B, 1, Int>],
) -> Tensor<B, 2> {
    let pooled: Vec<Tensor<B, 2>> = crystal_atom_idx
        .iter()
        .map(|idx| atom_fea.clone().select(0, idx.clone()).mean_dim(0))
        .collect();
    Tensor::cat(pooled, 0)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray};
    use burn::module::AutodiffModule;

    use crate::data::batcher::CrystalBatcher;
    use crate::data::fixtures::random_graphs;

    type TestBackend = NdArray;

    const ORIG: usize = 6;
    const NBR: usize = 5;

    fn small_config() -> CrystalGraphConvNetConfig {
        CrystalGraphConvNetConfig::new(ORIG, NBR)
            .with_atom_fea_len(8)
            .with_h_fea_len(16)
            .with_n_conv(2)
    }

    fn to_vec(t: Tensor<TestBackend, 2>) -> Vec<f32> {
        t.into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let cfg = CrystalGraphConvNetConfig::new(92, 41);
        assert_eq!(cfg.atom_fea_len, 64);
        assert_eq!(cfg.n_conv, 3);
        assert_eq!(cfg.h_fea_len, 128);
        assert_eq!(cfg.n_h, 1);
        assert!(!cfg.classification);
        assert!(cfg.attention);
        assert_eq!(cfg.conv_config().gate_in_len(), 256);
        assert!(cfg.check().is_ok());
    }

    #[test]
    fn test_config_check_rejects_bad_values() {
        assert!(small_config().with_n_h(0).check().is_err());
        assert!(small_config().with_atom_fea_len(0).check().is_err());
        assert!(small_config().with_classification_dropout(1.0).check().is_err());
    }

    #[test]
    fn test_pooling_averages_listed_atoms() {
        let device = NdArrayDevice::default();
        let atoms = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0], [4, 2]),
            &device,
        );
        let idx = vec![
            Tensor::<TestBackend, 1, Int>::from_ints([0, 1, 2], &device),
            Tensor::<TestBackend, 1, Int>::from_ints([3], &device),
        ];
        let pooled = pooling(atoms, &idx);
        assert_eq!(pooled.dims(), [2, 2]);
        assert_eq!(to_vec(pooled), vec![3.0, 4.0, 7.0, 8.0]);
    }

    #[test]
    fn test_pooling_accepts_non_contiguous_lists() {
        let device = NdArrayDevice::default();
        let atoms = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![0.0f32, 10.0, 20.0, 30.0], [4, 1]),
            &device,
        );
        let idx = vec![
            Tensor::<TestBackend, 1, Int>::from_ints([3, 0], &device),
            Tensor::<TestBackend, 1, Int>::from_ints([1, 2], &device),
        ];
        assert_eq!(to_vec(pooling(atoms, &idx)), vec![15.0, 15.0]);
    }

    #[test]
    fn test_trainable_count_leaves_out_running_stats() {
        let device = NdArrayDevice::default();
        let model  = small_config().init::<TestBackend>(&device);
        // two conv layers, each with bn1 over 2F and bn2 over F channels
        let running = 2 * (2 * (2 * 8) + 2 * 8);
        assert_eq!(model.num_params() - model.num_trainable_params(), running);
    }

    #[test]
    fn test_huge_raw_features_stay_finite() {
        let device = NdArrayDevice::default();
        let mut graphs = random_graphs(2, ORIG, NBR, 3, 6);
        for g in &mut graphs {
            for row in &mut g.atom_fea {
                row.iter_mut().for_each(|v| *v *= 1.0e3);
            }
        }
        let batch = CrystalBatcher::<TestBackend>::new(device.clone()).batch(&graphs).unwrap();
        let model = small_config().init::<TestBackend>(&device);
        assert!(to_vec(model.forward(batch)).iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_regression_output_shape() {
        let device  = NdArrayDevice::default();
        let graphs  = random_graphs(3, ORIG, NBR, 4, 11);
        let batch   = CrystalBatcher::<TestBackend>::new(device.clone()).batch(&graphs).unwrap();
        let model   = small_config().init::<TestBackend>(&device);
        assert_eq!(model.forward(batch).dims(), [3, 1]);
    }

    #[test]
    fn test_classification_outputs_log_probabilities() {
        let device = NdArrayDevice::default();
        let graphs = random_graphs(4, ORIG, NBR, 4, 5);
        let batch  = CrystalBatcher::<TestBackend>::new(device.clone()).batch(&graphs).unwrap();
        let model  = small_config()
            .with_classification(true)
            .init::<TestBackend>(&device);
        assert!(model.dropout.is_some());

        let out = model.forward(batch);
        assert_eq!(out.dims(), [4, 2]);
        for p in to_vec(out.exp().sum_dim(1)) {
            assert!((p - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_hidden_layers_follow_n_h() {
        let device = NdArrayDevice::default();
        let model  = small_config().with_n_h(3).init::<TestBackend>(&device);
        assert_eq!(model.fcs.len(), 2);
        assert_eq!(model.convs.len(), 2);

        let graphs = random_graphs(2, ORIG, NBR, 3, 2);
        let batch  = CrystalBatcher::<TestBackend>::new(device.clone()).batch(&graphs).unwrap();
        assert_eq!(model.forward(batch).dims(), [2, 1]);
    }

    #[test]
    fn test_without_attention_matches_plain_cgcnn_shapes() {
        let device = NdArrayDevice::default();
        let model  = small_config().with_attention(false).init::<TestBackend>(&device);
        assert!(model.convs.iter().all(|c| c.attention.is_none()));

        let graphs = random_graphs(2, ORIG, NBR, 3, 9);
        let batch  = CrystalBatcher::<TestBackend>::new(device.clone()).batch(&graphs).unwrap();
        assert_eq!(model.forward(batch).dims(), [2, 1]);
    }

    #[test]
    fn test_prediction_independent_of_batch_order() {
        let device  = NdArrayDevice::default();
        let model   = small_config().init::<TestBackend>(&device);
        let batcher = CrystalBatcher::<TestBackend>::new(device.clone());

        let graphs   = random_graphs(3, ORIG, NBR, 4, 21);
        let reversed: Vec<_> = graphs.iter().rev().cloned().collect();

        let a = to_vec(model.forward(batcher.batch(&graphs).unwrap()));
        let b = to_vec(model.forward(batcher.batch(&reversed).unwrap()));
        for (i, v) in a.iter().enumerate() {
            assert!((v - b[2 - i]).abs() < 1e-4);
        }
    }

    #[test]
    fn test_regression_loss_and_gradients() {
        type Ad = Autodiff<NdArray>;
        let device  = NdArrayDevice::default();
        let graphs  = random_graphs(3, ORIG, NBR, 4, 3);
        let batcher = CrystalBatcher::<Ad>::new(device.clone());
        let batch   = batcher.batch(&graphs).unwrap();
        let targets = batcher.regression_targets(&graphs).unwrap();
        let model   = small_config().init::<Ad>(&device);

        let (loss, output) = model.forward_loss(batch, targets).unwrap();
        assert_eq!(output.dims(), [3, 1]);
        let loss_val: f32 = loss.clone().into_scalar().elem();
        assert!(loss_val >= 0.0 && loss_val.is_finite());

        let grads = loss.backward();
        assert!(model.embedding.weight.val().grad(&grads).is_some());
        assert!(model.fc_out.weight.val().grad(&grads).is_some());
    }

    #[test]
    fn test_classification_loss_is_nll() {
        let device  = NdArrayDevice::default();
        let graphs  = random_graphs(4, ORIG, NBR, 3, 8);
        let batcher = CrystalBatcher::<TestBackend>::new(device.clone());
        let model   = small_config().with_classification(true).init::<TestBackend>(&device);

        let targets = batcher.class_targets(&graphs).unwrap();
        let (loss, output) = model
            .forward_loss(batcher.batch(&graphs).unwrap(), targets)
            .unwrap();

        let log_probs = to_vec(output);
        let expected: f32 = graphs
            .iter()
            .enumerate()
            .map(|(i, g)| -log_probs[i * 2 + g.target.unwrap() as usize])
            .sum::<f32>()
            / graphs.len() as f32;
        let loss_val: f32 = loss.into_scalar().elem();
        assert!((loss_val - expected).abs() < 1e-5);
    }

    #[test]
    fn test_loss_rejects_mismatched_targets() {
        let device  = NdArrayDevice::default();
        let graphs  = random_graphs(2, ORIG, NBR, 3, 4);
        let batcher = CrystalBatcher::<TestBackend>::new(device.clone());
        let model   = small_config().init::<TestBackend>(&device);

        let targets = batcher.class_targets(&graphs).unwrap();
        assert!(model.forward_loss(batcher.batch(&graphs).unwrap(), targets).is_err());
    }

    #[test]
    fn test_valid_model_is_deterministic() {
        type Ad = Autodiff<NdArray>;
        let device = NdArrayDevice::default();
        let model  = small_config()
            .with_classification(true)
            .init::<Ad>(&device)
            .valid();

        let graphs  = random_graphs(3, ORIG, NBR, 4, 17);
        let batcher = CrystalBatcher::<TestBackend>::new(device.clone());
        let a = to_vec(model.forward(batcher.batch(&graphs).unwrap()));
        let b = to_vec(model.forward(batcher.batch(&graphs).unwrap()));
        assert_eq!(a, b);
    }
}
