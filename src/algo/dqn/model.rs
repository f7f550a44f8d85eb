use burn::{
    prelude::*,
    tensor::{activation::relu, backend::AutodiffBackend},
};
use nn::{
    conv::{Conv2d, Conv2dConfig},
    pool::{MaxPool2d, MaxPool2dConfig},
    Dropout, DropoutConfig, Linear, LinearConfig,
};

use super::DQNModel;

/// The convolutional Q network for the Blob grid world
///
/// Two conv + pool + dropout stages over the 3-channel field image, flattened
/// into a dense head producing one value per action. With a 10x10 field the two
/// valid 3x3 convolutions and 2x2 poolings reduce the spatial extent to 1x1.
#[derive(Module, Debug)]
pub struct BlobNet<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    pool: MaxPool2d,
    dropout: Dropout,
    fc1: Linear<B>,
    fc2: Linear<B>,
}

#[derive(Config, Debug)]
pub struct BlobNetConfig {
    num_actions: usize,
    #[config(default = 256)]
    conv_channels: usize,
    #[config(default = 64)]
    hidden_size: usize,
}

impl BlobNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> BlobNet<B> {
        BlobNet {
            conv1: Conv2dConfig::new([3, self.conv_channels], [3, 3]).init(device),
            conv2: Conv2dConfig::new([self.conv_channels, self.conv_channels], [3, 3]).init(device),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            dropout: DropoutConfig::new(0.2).init(),
            fc1: LinearConfig::new(self.conv_channels, self.hidden_size).init(device),
            fc2: LinearConfig::new(self.hidden_size, self.num_actions).init(device),
        }
    }
}

impl<B: AutodiffBackend> DQNModel<B, 4> for BlobNet<B> {
    fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.dropout.forward(self.pool.forward(relu(self.conv1.forward(input))));
        let x = self.dropout.forward(self.pool.forward(relu(self.conv2.forward(x))));
        let x = x.flatten::<2>(1, 3);
        let x = self.fc1.forward(x);
        self.fc2.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray};
    use once_cell::sync::Lazy;

    use crate::{
        env::ToTensor,
        gym::blob::{BlobAction, BlobImage},
    };

    use super::*;

    type TB = Autodiff<NdArray>;

    static DEVICE: Lazy<NdArrayDevice> = Lazy::new(NdArrayDevice::default);

    #[test]
    fn forward_produces_one_value_per_action() {
        let model = BlobNetConfig::new(BlobAction::Stay as usize + 1).init::<TB>(&*DEVICE);
        let states: Vec<BlobImage<10>> = vec![[[[0.5; 10]; 10]; 3], [[[0.0; 10]; 10]; 3]];
        let output = model.forward(states.to_tensor(&*DEVICE));
        assert_eq!(output.dims(), [2, 9]);
    }
}
