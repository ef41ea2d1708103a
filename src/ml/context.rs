// ============================================================
// Layer 5 — Execution Context
// ============================================================
// The device every tensor lives on plus the seed for the
// backend RNG (used by dropout). Created once, owned by the
// controller, dropped with it. Nothing in the crate keeps a
// global device.

use burn::prelude::*;

#[cfg(feature = "wgpu")]
pub type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

#[cfg(not(feature = "wgpu"))]
pub type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;

#[derive(Debug, Clone)]
pub struct ExecutionContext<B: Backend> {
    device: B::Device,
    seed:   u64,
}

impl<B: Backend> ExecutionContext<B> {
    pub fn new(device: B::Device, seed: u64) -> Self {
        let context = Self { device, seed };
        context.reseed();
        tracing::info!("Execution context on {:?} (seed {})", context.device, seed);
        context
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Put the backend RNG back at this context's seed.
    pub fn reseed(&self) {
        B::seed(self.seed);
    }
}
