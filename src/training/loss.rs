//! Categorical cross-entropy on one-hot targets

use burn::{
    nn::loss::CrossEntropyLossConfig,
    tensor::{backend::Backend, Int, Tensor},
};

/// Mean categorical cross-entropy between `softmax(logits)` and one-hot `targets`
///
/// Each target row holds a single 1 at the true category, so the hot index
/// is recovered and handed to Burn's cross-entropy on logits.
/// Returns a single-element tensor.
pub fn categorical_cross_entropy<B: Backend>(
    logits: Tensor<B, 2>,
    targets: Tensor<B, 2>,
) -> Tensor<B, 1> {
    let [batch_size, _] = targets.dims();
    let classes: Tensor<B, 1, Int> = targets.argmax(1).reshape([batch_size]);

    CrossEntropyLossConfig::new()
        .init(&logits.device())
        .forward(logits, classes)
}
