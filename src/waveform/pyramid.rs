use std::sync::Arc;

/// Hierarchical min/max summary for fast waveform drawing.
///
/// Level 0 holds the min/max of each adjacent sample pair, every further
/// level merges adjacent cells of the one below. A cell on level `k` covers
/// the aligned block of `2^(k+1)` samples starting at `index << (k+1)`.
#[derive(Clone, Debug, Default)]
pub struct WaveformPyramid {
    samples: Arc<[f32]>,
    levels: Vec<Vec<(f32, f32)>>,
}

fn merge(a: (f32, f32), b: (f32, f32)) -> (f32, f32) {
    (a.0.min(b.0), a.1.max(b.1))
}

impl WaveformPyramid {
    pub fn build(samples: Arc<[f32]>) -> Self {
        let mut levels: Vec<Vec<(f32, f32)>> = Vec::new();
        if samples.len() >= 2 {
            let base: Vec<(f32, f32)> = samples
                .chunks_exact(2)
                .map(|p| (p[0].min(p[1]), p[0].max(p[1])))
                .collect();
            levels.push(base);
            while let Some(prev) = levels.last() {
                if prev.len() < 2 {
                    break;
                }
                let next = prev.chunks_exact(2).map(|c| merge(c[0], c[1])).collect();
                levels.push(next);
            }
        }
        Self { samples, levels }
    }

    pub fn levels(&self) -> usize {
        self.levels.len()
    }

    /// Min and max over `[start, end)`.
    ///
    /// An empty range gives the single sample at `start`; a range reaching
    /// outside the waveform gives `(0.0, 0.0)`.
    pub fn query(&self, start: i64, end: i64) -> (f32, f32) {
        let n = self.samples.len() as i64;
        if end <= start {
            return if start >= 0 && start < n {
                let s = self.samples[start as usize];
                (s, s)
            } else {
                (0.0, 0.0)
            };
        }
        if start < 0 || end > n {
            return (0.0, 0.0);
        }
        self.range(start as usize, end as usize)
    }

    fn range(&self, start: usize, end: usize) -> (f32, f32) {
        if end - start == 1 {
            let s = self.samples[start];
            return (s, s);
        }

        // biggest aligned block that fits entirely inside the range
        let mut shift = usize::BITS - 1 - (end - start).leading_zeros();
        loop {
            let block = 1usize << shift;
            let first = start.div_ceil(block) * block;
            if first + block <= end {
                let cell = if shift == 0 {
                    let s = self.samples[first];
                    (s, s)
                } else {
                    self.cell(shift, first)
                };
                let mut acc = cell;
                if first > start {
                    acc = merge(acc, self.range(start, first));
                }
                if first + block < end {
                    acc = merge(acc, self.range(first + block, end));
                }
                return acc;
            }
            shift -= 1;
        }
    }

    fn cell(&self, shift: u32, first: usize) -> (f32, f32) {
        self.levels
            .get(shift as usize - 1)
            .and_then(|level| level.get(first >> shift))
            .copied()
            .unwrap_or_else(|| self.scan(first, first + (1 << shift)))
    }

    fn scan(&self, start: usize, end: usize) -> (f32, f32) {
        self.samples[start..end]
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |acc, &s| (acc.0.min(s), acc.1.max(s)))
    }
}
