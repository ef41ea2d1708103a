// ============================================================
// Layer 4 — TSV Corpus Loader
// ============================================================
// Reads integer-encoded classification data from a directory:
//
//   <data_dir>/train.tsv
//   <data_dir>/test.tsv
//
// One sample per line:  <label>\t<id> <id> <id> ...
//
//   1	12 7 431 9
//   0	88 3
//
// Blank lines are skipped. Anything else that does not parse is
// an error naming the file and line: a silently dropped sample
// would change what the model is trained on.
//
// Each call to `batches` re-reads the file, so every epoch gets
// a fresh pass. Training samples can optionally be shuffled per
// pass with a seeded RNG (Fisher-Yates via SliceRandom).

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::data::dataset::ClassifyDataset;
use crate::domain::sample::{ClassifySample, Mode};
use crate::domain::traits::{BatchIter, BatchSource};

pub struct TsvCorpus {
    dir:         PathBuf,
    batch_size:  usize,
    max_seq_len: Option<usize>,
    shuffle:     bool,
    seed:        u64,
    /// Number of training passes served so far; varies the shuffle per epoch
    passes:      Cell<u64>,
}

impl TsvCorpus {
    pub fn new(dir: impl Into<PathBuf>, batch_size: usize) -> Self {
        Self {
            dir: dir.into(),
            batch_size,
            max_seq_len: None,
            shuffle: false,
            seed: 42,
            passes: Cell::new(0),
        }
    }

    /// Truncate every sequence to at most `max_seq_len` ids.
    pub fn with_max_seq_len(mut self, max_seq_len: Option<usize>) -> Self {
        self.max_seq_len = max_seq_len;
        self
    }

    /// Shuffle training samples on every pass, reproducibly from `seed`.
    pub fn with_shuffle(mut self, shuffle: bool, seed: u64) -> Self {
        self.shuffle = shuffle;
        self.seed    = seed;
        self
    }

    pub fn path_for(&self, mode: Mode) -> PathBuf {
        self.dir.join(format!("{}.tsv", mode.as_str()))
    }

    /// Read and parse every sample of one split.
    pub fn load(&self, mode: Mode) -> Result<Vec<ClassifySample>> {
        let path = self.path_for(mode);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read data file '{}'", path.display()))?;

        let mut samples = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let mut sample = parse_line(line)
                .with_context(|| format!("{}:{}", path.display(), index + 1))?;
            if let Some(max) = self.max_seq_len {
                sample.token_ids.truncate(max);
            }
            samples.push(sample);
        }

        tracing::debug!("Loaded {} {} samples from '{}'", samples.len(), mode.as_str(), path.display());
        Ok(samples)
    }
}

impl BatchSource for TsvCorpus {
    fn batches(&self, mode: Mode) -> Result<BatchIter<'_>> {
        let mut samples = self.load(mode)?;

        if self.shuffle && mode == Mode::Train {
            let pass = self.passes.get();
            self.passes.set(pass + 1);
            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(pass));
            samples.shuffle(&mut rng);
        }

        Ok(ClassifyDataset::new(samples).into_batches(self.batch_size))
    }
}

/// Parse `label<TAB>id id id` into a sample.
fn parse_line(line: &str) -> Result<ClassifySample> {
    let Some((label, ids)) = line.split_once('\t') else {
        bail!("expected '<label>\\t<ids>', found no tab separator");
    };

    let label: usize = label
        .trim()
        .parse()
        .with_context(|| format!("invalid label '{}'", label.trim()))?;

    Ok(ClassifySample::new(parse_ids(ids)?, label))
}

/// Parse whitespace-separated token ids.
fn parse_ids(ids: &str) -> Result<Vec<u32>> {
    ids.split_whitespace()
        .map(|tok| {
            tok.parse::<u32>()
                .with_context(|| format!("invalid token id '{tok}'"))
        })
        .collect()
}

/// Read an unlabeled file with one `id id id` row per line, for prediction.
/// Blank lines are skipped; optional truncation as in `TsvCorpus`.
pub fn read_id_rows(path: impl AsRef<Path>, max_seq_len: Option<usize>) -> Result<Vec<Vec<u32>>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read input file '{}'", path.display()))?;

    let mut rows = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut row = parse_ids(line)
            .with_context(|| format!("{}:{}", path.display(), index + 1))?;
        if let Some(max) = max_seq_len {
            row.truncate(max);
        }
        rows.push(row);
    }
    Ok(rows)
}
