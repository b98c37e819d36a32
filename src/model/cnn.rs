//! CNN Model Architecture for Traffic Sign Classification
//!
//! Three convolution blocks (32 -> 64 -> 128 filters) followed by a dense
//! classifier head with dropout. Convolutions use valid padding, so a 30x30
//! input shrinks to a 2x2x128 feature map before flattening.

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        Dropout, DropoutConfig, Linear, LinearConfig, Relu,
    },
    tensor::{activation::softmax, backend::Backend, Tensor},
};

/// Convolution kernel size used by every block
pub const KERNEL_SIZE: usize = 3;

/// Number of convolution blocks
pub const NUM_BLOCKS: usize = 3;

/// Spatial size of one side after the three conv (valid) + pool blocks
pub fn feature_map_size(side: usize) -> usize {
    (0..NUM_BLOCKS).fold(side, |size, _| size.saturating_sub(KERNEL_SIZE - 1) / 2)
}

/// Configuration for the TrafficNet CNN model
#[derive(Config, Debug)]
pub struct TrafficNetConfig {
    /// Number of output categories
    pub num_categories: usize,

    /// Input image width
    pub input_width: usize,

    /// Input image height
    pub input_height: usize,

    /// Number of input channels (3 for RGB)
    #[config(default = "3")]
    pub in_channels: usize,

    /// Filters of the first block; doubled by each following block
    #[config(default = "32")]
    pub base_filters: usize,

    /// Units of the hidden dense layer
    #[config(default = "256")]
    pub hidden_units: usize,

    /// Dropout rate applied after the hidden layer
    #[config(default = "0.5")]
    pub dropout_rate: f64,
}

impl TrafficNetConfig {
    /// Filters produced by the last block
    pub fn last_filters(&self) -> usize {
        self.base_filters * 4
    }

    /// Length of the flattened feature vector fed to the dense head
    pub fn flattened_features(&self) -> usize {
        self.last_filters()
            * feature_map_size(self.input_width)
            * feature_map_size(self.input_height)
    }
}

/// Conv2d (valid) -> ReLU -> MaxPool 2x2
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    pub conv: Conv2d<B>,
    pub relu: Relu,
    pub pool: MaxPool2d,
}

impl<B: Backend> ConvBlock<B> {
    /// Create a new convolutional block
    pub fn new(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        let conv = Conv2dConfig::new([in_channels, out_channels], [KERNEL_SIZE, KERNEL_SIZE])
            .init(device);
        let pool = MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init();

        Self {
            conv,
            relu: Relu::new(),
            pool,
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.relu.forward(x);
        self.pool.forward(x)
    }
}

/// Traffic sign classifier
#[derive(Module, Debug)]
pub struct TrafficNet<B: Backend> {
    pub block1: ConvBlock<B>,
    pub block2: ConvBlock<B>,
    pub block3: ConvBlock<B>,

    pub fc1: Linear<B>,
    pub dropout: Dropout,
    pub fc_out: Linear<B>,

    num_categories: usize,
}

impl<B: Backend> TrafficNet<B> {
    /// Create a freshly initialised network
    pub fn new(config: &TrafficNetConfig, device: &B::Device) -> Self {
        let base = config.base_filters;

        let block1 = ConvBlock::new(config.in_channels, base, device); // 30 -> 14
        let block2 = ConvBlock::new(base, base * 2, device); // 14 -> 6
        let block3 = ConvBlock::new(base * 2, base * 4, device); // 6 -> 2

        let fc1 = LinearConfig::new(config.flattened_features(), config.hidden_units).init(device);
        let dropout = DropoutConfig::new(config.dropout_rate).init();
        let fc_out = LinearConfig::new(config.hidden_units, config.num_categories).init(device);

        Self {
            block1,
            block2,
            block3,
            fc1,
            dropout,
            fc_out,
            num_categories: config.num_categories,
        }
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `x` - Input tensor of shape [batch_size, 3, height, width]
    ///
    /// # Returns
    /// * Logits tensor of shape [batch_size, num_categories]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.block1.forward(x);
        let x = self.block2.forward(x);
        let x = self.block3.forward(x);

        // [B, C, H, W] -> [B, C*H*W]
        let [batch_size, channels, height, width] = x.dims();
        let x = x.reshape([batch_size, channels * height * width]);

        let x = self.fc1.forward(x);
        let x = Relu::new().forward(x);
        let x = self.dropout.forward(x);
        self.fc_out.forward(x)
    }

    /// Forward pass returning class probabilities
    pub fn forward_softmax(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        softmax(self.forward(x), 1)
    }

    /// Number of output categories
    pub fn num_categories(&self) -> usize {
        self.num_categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::Distribution;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_feature_map_size() {
        assert_eq!(feature_map_size(30), 2);
        assert_eq!(feature_map_size(32), 2);
        assert_eq!(feature_map_size(64), 6);
        assert_eq!(feature_map_size(12), 0);
        assert_eq!(feature_map_size(0), 0);
    }

    #[test]
    fn test_flattened_features() {
        let config = TrafficNetConfig::new(43, 30, 30);
        assert_eq!(config.last_filters(), 128);
        assert_eq!(config.flattened_features(), 128 * 2 * 2);
    }

    #[test]
    fn test_output_shape() {
        let device = Default::default();
        let config = TrafficNetConfig::new(43, 30, 30);
        let model = TrafficNet::<TestBackend>::new(&config, &device);

        let input = Tensor::<TestBackend, 4>::zeros([2, 3, 30, 30], &device);
        let output = model.forward(input);

        assert_eq!(output.dims(), [2, 43]);
        assert_eq!(model.num_categories(), 43);
    }

    #[test]
    fn test_softmax_rows_sum_to_one() {
        let device = Default::default();
        let config = TrafficNetConfig::new(43, 30, 30);
        let model = TrafficNet::<TestBackend>::new(&config, &device);

        let input =
            Tensor::<TestBackend, 4>::random([4, 3, 30, 30], Distribution::Uniform(0.0, 1.0), &device);
        let probs = model.forward_softmax(input);
        assert_eq!(probs.dims(), [4, 43]);

        let values = probs
            .into_data()
            .convert::<f32>()
            .into_vec::<f32>()
            .expect("probabilities");
        for row in values.chunks(43) {
            let sum: f32 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-4, "row sums to {sum}");
            assert!(row.iter().all(|p| *p >= 0.0));
        }
    }

    #[test]
    fn test_non_square_input() {
        let device = Default::default();
        let config = TrafficNetConfig::new(7, 40, 30);
        let model = TrafficNet::<TestBackend>::new(&config, &device);

        let input = Tensor::<TestBackend, 4>::zeros([1, 3, 30, 40], &device);
        assert_eq!(model.forward(input).dims(), [1, 7]);
    }
}
