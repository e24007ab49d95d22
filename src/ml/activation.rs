// ============================================================
// Layer 5 — Thresholded Softplus
// ============================================================
//   softplus(x) = ln(1 + eˣ)   for x ≤ 20
//               = x            for x > 20
//
// Burn's own softplus evaluates eˣ unguarded and turns into inf
// from x ≈ 89 upward. The input is clamped before the exponent,
// so neither the value nor its gradient ever sees inf.

use burn::{prelude::*, tensor::activation};

/// Above this, ln(1 + eˣ) equals x to f32 precision.
pub const SOFTPLUS_THRESHOLD: f64 = 20.0;

/// Element-wise softplus (β = 1) that is linear above the threshold.
pub fn softplus<B: Backend, const D: usize>(x: Tensor<B, D>) -> Tensor<B, D> {
    let linear = x.clone().greater_elem(SOFTPLUS_THRESHOLD);
    activation::softplus(x.clone().clamp_max(SOFTPLUS_THRESHOLD), 1.0).mask_where(linear, x)
}
