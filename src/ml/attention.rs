// ============================================================
// Layer 5 — Neighbour Self-Attention
// ============================================================
// Scaled dot-product attention over the M neighbour slots of a
// single atom. Input is the per-edge feature tensor built by the
// conv layer, [N, M, input]; each atom's M slots attend to each
// other and never to another atom's slots.
//
//   K, Q, V  = x·Wk, x·Wq, x·Wv           [N, M, A]
//   weights  = softmax(K·Qᵀ / √A)         [N, M, M]
//   out      = dropout((weights·V)·Wo)    [N, M, output]
//
// All four projections are bias-free.
//
// Reference: Vaswani et al. (2017) Attention Is All You Need

use burn::{
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::softmax,
};

#[derive(Config, Debug)]
pub struct SelfAttentionConfig {
    pub input_size:     usize,
    pub attention_size: usize,
    pub output_size:    usize,
    #[config(default = 0.2)]
    pub dropout:        f64,
}

impl SelfAttentionConfig {
    /// Build the four bias-free projections and the output dropout.
    pub fn init<B: Backend>(&self, device: &B::Device) -> SelfAttention<B> {
        let projection = |d_out: usize| -> Linear<B> {
            LinearConfig::new(self.input_size, d_out)
                .with_bias(false)
                .init(device)
        };
        SelfAttention {
            key:     projection(self.attention_size),
            query:   projection(self.attention_size),
            value:   projection(self.attention_size),
            output:  LinearConfig::new(self.attention_size, self.output_size)
                .with_bias(false)
                .init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            attention_size: self.attention_size,
        }
    }
}

/// Attention across the neighbour slots of each atom, applied per atom.
#[derive(Module, Debug)]
pub struct SelfAttention<B: Backend> {
    pub key:     Linear<B>,
    pub query:   Linear<B>,
    pub value:   Linear<B>,
    pub output:  Linear<B>,
    pub dropout: Dropout,
    pub attention_size: usize,
}

impl<B: Backend> SelfAttention<B> {
    /// x: [N, M, input] → [N, M, output]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let values  = self.value.forward(x.clone());
        let weights = self.attention_weights(x);
        let context = weights.matmul(values);
        self.dropout.forward(self.output.forward(context))
    }

    /// Row-stochastic attention matrix per atom: [N, M, M].
    /// Entry (i, j) is how much neighbour slot i draws from slot j.
    pub fn attention_weights(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let keys    = self.key.forward(x.clone());
        let queries = self.query.forward(x);
        let scale   = (self.attention_size as f64).sqrt();
        let scores  = keys.matmul(queries.swap_dims(1, 2)).div_scalar(scale);
        softmax(scores, 2)
    }
}
