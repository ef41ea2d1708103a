use burn::data::dataset::Dataset;

use crate::domain::sample::{Batch, ClassifySample};
use crate::domain::traits::BatchIter;
#[cfg(test)]
use crate::domain::{sample::Mode, traits::BatchSource};

pub struct ClassifyDataset {
    samples: Vec<ClassifySample>,
}

impl ClassifyDataset {
    pub fn new(samples: Vec<ClassifySample>) -> Self { Self { samples } }

    /// Consume the dataset and group it into batches of `batch_size`, in order.
    /// The final batch keeps whatever is left over.
    pub fn into_batches<'a>(self, batch_size: usize) -> BatchIter<'a> {
        let batch_size = batch_size.max(1);
        let mut samples = self.samples.into_iter().peekable();
        Box::new(std::iter::from_fn(move || {
            samples.peek()?;
            Some(Ok(Batch::new(samples.by_ref().take(batch_size).collect())))
        }))
    }
}

impl Dataset<ClassifySample> for ClassifyDataset {
    fn get(&self, index: usize) -> Option<ClassifySample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

/// Serves pre-built train and test samples from memory.
#[cfg(test)]
pub struct InMemorySource {
    train:      Vec<ClassifySample>,
    test:       Vec<ClassifySample>,
    batch_size: usize,
}

#[cfg(test)]
impl InMemorySource {
    pub fn new(train: Vec<ClassifySample>, test: Vec<ClassifySample>, batch_size: usize) -> Self {
        Self { train, test, batch_size }
    }
}

#[cfg(test)]
impl BatchSource for InMemorySource {
    fn batches(&self, mode: Mode) -> anyhow::Result<BatchIter<'_>> {
        let samples = match mode {
            Mode::Train => self.train.clone(),
            Mode::Test  => self.test.clone(),
        };
        Ok(ClassifyDataset::new(samples).into_batches(self.batch_size))
    }
}
