// ============================================================
// Layer 5 — Parameter Initialisers
// ============================================================
// Burn's Initializer enum has no truncated normal, so it is
// sampled on the host and wrapped into a Param.
//
// Truncated normal: draw from N(mean, std²) and redraw any value
// that lands more than two standard deviations from the mean.

use burn::{module::Param, prelude::*};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Sample a `[rows, cols]` tensor from a truncated normal distribution.
pub fn truncated_normal<B: Backend, R: Rng>(
    shape:  [usize; 2],
    mean:   f64,
    std:    f64,
    rng:    &mut R,
    device: &B::Device,
) -> Tensor<B, 2> {
    let [rows, cols] = shape;
    let values = sample_truncated(rows * cols, mean, std, rng);
    Tensor::<B, 1>::from_floats(values.as_slice(), device).reshape([rows, cols])
}

/// Same as [`truncated_normal`], wrapped as a trainable parameter.
pub fn truncated_normal_param<B: Backend, R: Rng>(
    shape:  [usize; 2],
    mean:   f64,
    std:    f64,
    rng:    &mut R,
    device: &B::Device,
) -> Param<Tensor<B, 2>> {
    Param::from_tensor(truncated_normal(shape, mean, std, rng, device))
}

fn sample_truncated<R: Rng>(count: usize, mean: f64, std: f64, rng: &mut R) -> Vec<f32> {
    // negative or NaN std degenerates to a constant
    let Ok(normal) = Normal::new(mean, std) else {
        return vec![mean as f32; count];
    };
    let bound = 2.0 * std;
    (0..count)
        .map(|_| loop {
            let x = normal.sample(rng);
            if (x - mean).abs() <= bound {
                break x as f32;
            }
        })
        .collect()
}
