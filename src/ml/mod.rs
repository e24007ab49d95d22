// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All network definitions live here, generic over the Burn
// Backend so the same code runs on NdArray (CPU), Wgpu, or
// Autodiff<…> for training.
//
//   activation.rs — softplus that turns linear above x = 20
//
//   attention.rs — scaled dot-product self-attention over
//                  one atom's neighbour slots
//
//   conv.rs      — graph convolution: gather neighbours,
//                  (attend), gate with sigmoid ⊙ softplus,
//                  sum over neighbours, residual softplus
//
//   model.rs     — embedding → conv stack → mean pooling
//                  per crystal → feed-forward head
//
// Reference: Burn Book §3 (Building Blocks)
//            Xie & Grossman (2018) CGCNN

/// Overflow-safe softplus
pub mod activation;

/// Neighbour self-attention
pub mod attention;

/// Attention-gated crystal graph convolution
pub mod conv;

/// Full network, pooling and loss
pub mod model;
