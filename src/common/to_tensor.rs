//! Turns observations and actions into burn tensors for model code.

use burn::prelude::*;
use burn::tensor::TensorData;

use crate::env::arcade::Framebuffer;

pub trait ToTensorF<const D: usize>: Clone {
    fn to_tensor<B: Backend>(self, device: &B::Device) -> Tensor<B, D>;
}

impl ToTensorF<1> for f32 {
    fn to_tensor<B: Backend>(self, device: &<B as Backend>::Device) -> Tensor<B, 1> {
        Tensor::from_floats([self], device)
    }
}

impl ToTensorF<1> for Vec<f32> {
    fn to_tensor<B: Backend>(self, device: &<B as Backend>::Device) -> Tensor<B, 1> {
        let n = self.len();

        Tensor::from_data(
            TensorData::new(self, [n]).convert::<B::FloatElem>(),
            device,
        )
    }
}

impl ToTensorF<2> for Vec<Vec<f32>> {
    fn to_tensor<B: Backend>(self, device: &<B as Backend>::Device) -> Tensor<B, 2> {
        let n0 = self.len();
        let n1 = self.first().map_or(0, Vec::len);
        let data: Vec<f32> = self.concat();

        Tensor::from_data(
            TensorData::new(data, [n0, n1]).convert::<B::FloatElem>(),
            device,
        )
    }
}

/// A frame as a `[height, width, channel]` tensor of raw 0..=255 intensities.
impl ToTensorF<3> for Framebuffer {
    fn to_tensor<B: Backend>(self, device: &<B as Backend>::Device) -> Tensor<B, 3> {
        let data: Vec<f32> = self.into_bytes().into_iter().map(f32::from).collect();
        let shape = [Framebuffer::HEIGHT, Framebuffer::WIDTH, Framebuffer::CHANNELS];

        Tensor::from_data(
            TensorData::new(data, shape).convert::<B::FloatElem>(),
            device,
        )
    }
}

pub trait ToTensorI<const D: usize>: Clone {
    fn to_tensor<B: Backend>(self, device: &B::Device) -> Tensor<B, D, Int>;
}

impl ToTensorI<1> for usize {
    fn to_tensor<B: Backend>(self, device: &<B as Backend>::Device) -> Tensor<B, 1, Int> {
        Tensor::from_ints([self as i32], device)
    }
}

impl ToTensorI<1> for Vec<usize> {
    fn to_tensor<B: Backend>(self, device: &<B as Backend>::Device) -> Tensor<B, 1, Int> {
        let n = self.len();
        let data: Vec<i64> = self.into_iter().map(|x| x as i64).collect();

        Tensor::from_data(TensorData::new(data, [n]).convert::<B::IntElem>(), device)
    }
}

pub trait ToTensorB<const D: usize>: Clone {
    fn to_tensor<B: Backend>(self, device: &B::Device) -> Tensor<B, D, Bool>;
}

impl ToTensorB<1> for bool {
    fn to_tensor<B: Backend>(self, device: &<B as Backend>::Device) -> Tensor<B, 1, Bool> {
        Tensor::from_data(TensorData::new(vec![self], [1]), device)
    }
}

impl ToTensorB<1> for Vec<bool> {
    fn to_tensor<B: Backend>(self, device: &<B as Backend>::Device) -> Tensor<B, 1, Bool> {
        let n = self.len();

        Tensor::from_data(TensorData::new(self, [n]), device)
    }
}
