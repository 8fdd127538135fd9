use std::collections::BTreeMap;
use std::sync::Arc;

use crate::params::EngineParams;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct GrainSpan {
    len: usize,
    drift: i64, // len - target grain size
}

/// A view of one grain inside the waveform.
#[derive(Clone, Copy, Debug)]
pub struct Grain<'a> {
    pub start: usize,
    pub samples: &'a [f32],
    pub drift: i64,
}

/// Contiguous zero-crossing aligned grains, keyed by start sample.
#[derive(Clone, Debug, Default)]
pub struct GrainTable {
    samples: Arc<[f32]>,
    spans: BTreeMap<usize, GrainSpan>,
}

// `look` negative samples ending at idx, then `look` non-negative ones
fn is_zero_crossing(samples: &[f32], idx: usize, look: usize) -> bool {
    if idx < look || idx + look + 1 >= samples.len() {
        return false;
    }
    (0..look).all(|j| samples[idx - j] < 0.0 && samples[idx + 1 + j] >= 0.0)
}

impl GrainTable {
    /// Cuts the waveform into grains of roughly `grain_size` samples.
    ///
    /// Each boundary is the zero crossing nearest to `start + grain_size`,
    /// searched outward in both directions with the strict look-around. When
    /// that fails a forward scan from `start + 1.5 * grain_size` accepts the
    /// first crossing under the loose look-around. A tail too short to hold
    /// another grain is left uncovered.
    pub fn segment(samples: Arc<[f32]>, params: &EngineParams) -> Self {
        let n = samples.len();
        let target = params.grain_size.max(1);
        let mut spans = BTreeMap::new();
        let mut start = 0usize;

        while n > target + 1 && start < n - target - 1 {
            let centre = start + target;
            let nearest = (0..target)
                .map(|i| if i % 2 == 0 { centre + i / 2 } else { centre - i / 2 })
                .find(|&idx| is_zero_crossing(&samples, idx, params.look_around));

            let boundary = nearest.or_else(|| {
                let loose = (start + target + target / 2..n.saturating_sub(1))
                    .find(|&idx| is_zero_crossing(&samples, idx, params.loose_look_around));
                match loose {
                    Some(idx) => log::debug!("no clean crossing near {centre}, loose crossing at {idx}"),
                    None => log::debug!("no crossing after {start}, {} samples left uncovered", n - start),
                }
                loose
            });

            let Some(end) = boundary else {
                break;
            };
            let len = end - start;
            let drift = len as i64 - target as i64;
            log::trace!("grain at {start}: {len} samples, drift {drift}");
            spans.insert(start, GrainSpan { len, drift });
            start = end;
        }

        log::debug!("segmented {n} samples into {} grains", spans.len());
        Self { samples, spans }
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// End of the last grain; samples past this are never played.
    pub fn covered_len(&self) -> usize {
        self.spans
            .iter()
            .next_back()
            .map_or(0, |(&start, span)| start + span.len)
    }

    fn view(&self, start: usize, span: &GrainSpan) -> Grain<'_> {
        Grain {
            start,
            samples: &self.samples[start..start + span.len],
            drift: span.drift,
        }
    }

    /// The grain containing `sample`, or the first grain after it.
    ///
    /// Negative positions resolve to the first grain; positions past the
    /// last grain resolve to nothing.
    pub fn grain_at(&self, sample: i64) -> Option<Grain<'_>> {
        if sample >= 0 {
            let pos = sample as usize;
            if let Some((&start, span)) = self.spans.range(..=pos).next_back() {
                if pos < start + span.len {
                    return Some(self.view(start, span));
                }
            }
        }
        let from = sample.max(0) as usize;
        self.spans
            .range(from..)
            .next()
            .map(|(&start, span)| self.view(start, span))
    }

    pub fn iter(&self) -> impl Iterator<Item = Grain<'_>> {
        self.spans.iter().map(|(&start, span)| self.view(start, span))
    }
}
