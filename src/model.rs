use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig},
        Dropout, DropoutConfig, Linear, LinearConfig, Relu,
    },
    prelude::*,
};

const CONV1_CHANNELS: usize = 8;
const CONV2_CHANNELS: usize = 16;
const POOL_SIZE: usize = 8;

#[derive(Config, Debug)]
pub struct DigitClassifierConfig {
    #[config(default = 10)]
    pub num_classes: usize,
    #[config(default = 512)]
    pub hidden_size: usize,
    #[config(default = "0.5")]
    pub dropout: f64,
    #[config(default = 28)]
    pub height: usize,
    #[config(default = 28)]
    pub width: usize,
}

/// Small convolutional classifier for single channel digit images.
#[derive(Module, Debug)]
pub struct DigitClassifier<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    pool: AdaptiveAvgPool2d,
    dropout: Dropout,
    linear1: Linear<B>,
    linear2: Linear<B>,
    activation: Relu,
    height: usize,
    width: usize,
    num_classes: usize,
}

impl DigitClassifierConfig {
    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> DigitClassifier<B> {
        DigitClassifier {
            conv1: Conv2dConfig::new([1, CONV1_CHANNELS], [3, 3]).init(device),
            conv2: Conv2dConfig::new([CONV1_CHANNELS, CONV2_CHANNELS], [3, 3]).init(device),
            pool: AdaptiveAvgPool2dConfig::new([POOL_SIZE, POOL_SIZE]).init(),
            activation: Relu::new(),
            linear1: LinearConfig::new(CONV2_CHANNELS * POOL_SIZE * POOL_SIZE, self.hidden_size)
                .init(device),
            linear2: LinearConfig::new(self.hidden_size, self.num_classes).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            height: self.height,
            width: self.width,
            num_classes: self.num_classes,
        }
    }
}

impl<B: Backend> DigitClassifier<B> {
    /// The input signature of the model: `[batch, height, width, channels]`.
    ///
    /// Inference always runs on a single image, so the batch dimension is 1.
    pub fn input_shape(&self) -> [usize; 4] {
        [1, self.height, self.width, 1]
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// # Shapes
    ///   - Images [batch_size, height, width, 1]
    ///   - Output [batch_size, num_classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let [batch_size, _height, _width, _channels] = images.dims();

        // Channels last to channels first.
        let x = images.permute([0, 3, 1, 2]);

        let x = self.conv1.forward(x); // [batch_size, 8, _, _]
        let x = self.dropout.forward(x);
        let x = self.conv2.forward(x); // [batch_size, 16, _, _]
        let x = self.dropout.forward(x);
        let x = self.activation.forward(x);

        let x = self.pool.forward(x); // [batch_size, 16, 8, 8]
        let x = x.reshape([batch_size, CONV2_CHANNELS * POOL_SIZE * POOL_SIZE]);
        let x = self.linear1.forward(x);
        let x = self.dropout.forward(x);
        let x = self.activation.forward(x);

        self.linear2.forward(x) // [batch_size, num_classes]
    }
}
