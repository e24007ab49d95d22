// ============================================================
// Layer 5 — Graph Convolution with Neighbour Attention
// ============================================================
// One message-passing step over the crystal graph.
//
// For atom i and neighbour slot k (neighbour j = idx[i, k]):
//
//   z_ik     = [ v_i ‖ v_j ‖ u_ik ]                 (2F + B)
//   z_i·     = SelfAttention(z_i·)                  (4F, optional)
//   g_ik     = BN1( z_ik · W + b )                  (2F)
//   filter   = σ(g_ik[..F]),  core = softplus(g_ik[F..])
//   v_i'     = softplus( v_i + BN2( Σ_k filter ⊙ core ) )
//
// With attention disabled the gate projection reads z_ik
// directly, which is the original CGCNN convolution.
//
// Neighbour index padding is not masked: whatever index the
// caller supplies is gathered as a real neighbour.
//
// Reference: Xie & Grossman (2018) Crystal Graph Convolutional
//            Neural Networks, Eq. 5

use burn::{
    nn::{BatchNorm, BatchNormConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::sigmoid,
};

use crate::ml::activation::softplus;
use crate::ml::attention::{SelfAttention, SelfAttentionConfig};

#[derive(Config, Debug)]
pub struct ConvLayerConfig {
    pub atom_fea_len: usize,
    pub nbr_fea_len:  usize,
    #[config(default = true)]
    pub attention: bool,
    /// Attention output width as a multiple of atom_fea_len
    #[config(default = 4)]
    pub attention_expansion: usize,
    #[config(default = 0.2)]
    pub attention_dropout: f64,
}

impl ConvLayerConfig {
    /// Width of the concatenated [self ‖ neighbour ‖ bond] edge vector.
    pub fn edge_fea_len(&self) -> usize {
        2 * self.atom_fea_len + self.nbr_fea_len
    }

    /// Input width of the gating projection.
    pub fn gate_in_len(&self) -> usize {
        if self.attention {
            self.attention_expansion * self.atom_fea_len
        } else {
            self.edge_fea_len()
        }
    }

    /// Build one conv layer; the attention block exists only when `attention` is set.
    pub fn init<B: Backend>(&self, device: &B::Device) -> ConvLayer<B> {
        let f = self.atom_fea_len;
        let attention: Option<SelfAttention<B>> = self.attention.then(|| {
            SelfAttentionConfig::new(self.edge_fea_len(), f, self.attention_expansion * f)
                .with_dropout(self.attention_dropout)
                .init(device)
        });
        ConvLayer {
            attention,
            fc_full: LinearConfig::new(self.gate_in_len(), 2 * f).init(device),
            bn1:     BatchNormConfig::new(2 * f).init(device),
            bn2:     BatchNormConfig::new(f).init(device),
            atom_fea_len: f,
        }
    }
}

/// One attention-gated message-passing step; keeps the atom width F.
#[derive(Module, Debug)]
pub struct ConvLayer<B: Backend> {
    pub attention:    Option<SelfAttention<B>>,
    pub fc_full:      Linear<B>,
    pub bn1:          BatchNorm<B>,
    pub bn2:          BatchNorm<B>,
    pub atom_fea_len: usize,
}

impl<B: Backend> ConvLayer<B> {
    /// atom_in:     [N, F]      atom hidden features
    /// nbr_fea:     [N, M, B]   bond features
    /// nbr_fea_idx: [N, M]      neighbour atom indices into atom_in
    /// → [N, F]
    pub fn forward(
        &self,
        atom_in:     Tensor<B, 2>,
        nbr_fea:     Tensor<B, 3>,
        nbr_fea_idx: Tensor<B, 2, Int>,
    ) -> Tensor<B, 2> {
        let [n, m] = nbr_fea_idx.dims();
        let f = self.atom_fea_len;

        let atom_nbr = atom_in
            .clone()
            .select(0, nbr_fea_idx.reshape([n * m]))
            .reshape([n, m, f]);
        let atom_self = atom_in.clone().unsqueeze_dim::<3>(1).repeat_dim(1, m);
        let edges = Tensor::cat(vec![atom_self, atom_nbr, nbr_fea], 2);

        let edges = match &self.attention {
            Some(attention) => attention.forward(edges),
            None => edges,
        };

        // BatchNorm expects channels on axis 1, so fold the neighbour axis into the batch.
        let gated = self.fc_full.forward(edges);
        let gated = self.bn1
            .forward(gated.reshape([n * m, 2 * f]))
            .reshape([n, m, 2 * f]);

        let filter = sigmoid(gated.clone().narrow(2, 0, f));
        let core   = softplus(gated.narrow(2, f, f));
        let summed = (filter * core).sum_dim(1).reshape([n, f]);
        let summed = self.bn2.forward(summed);

        softplus(atom_in + summed)
    }

    /// BatchNorm running mean and variance entries: 2·2F for bn1, 2·F for bn2.
    pub fn num_running_stats(&self) -> usize {
        6 * self.atom_fea_len
    }
}
