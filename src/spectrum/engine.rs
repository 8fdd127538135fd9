use std::collections::{HashSet, VecDeque};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use lru::LruCache;
use parking_lot::Mutex;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::params::SpectrumParams;

/// Sample range `[start, end)` a spectrum is computed for.
pub type SpectrumKey = (i64, i64);

/// Windowed FFT magnitude analysis of one sample range.
///
/// The window is `fft_size` samples long and ends at the range end. Samples
/// inside the range are taken as-is; earlier ones are attenuated
/// exponentially with their distance from the range start, and positions
/// outside the waveform read as silence.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    preroll_decay: f32,
}

impl SpectrumAnalyzer {
    pub fn new(params: &SpectrumParams) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(params.fft_size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        Self {
            fft,
            buffer: vec![Complex::new(0.0, 0.0); params.fft_size],
            scratch,
            preroll_decay: params.preroll_decay,
        }
    }

    pub fn fft_size(&self) -> usize {
        self.buffer.len()
    }

    /// Magnitudes of the lower half of the bins, normalized by the FFT size.
    pub fn analyze(&mut self, samples: &[f32], start: i64, end: i64) -> Vec<f32> {
        let size = self.buffer.len();
        let n = samples.len() as i64;
        let window_start = end - size as i64;

        for (slot, i) in self.buffer.iter_mut().zip(window_start..end) {
            let value = if i < 0 || i >= n {
                0.0
            } else if i >= start {
                samples[i as usize]
            } else {
                (-self.preroll_decay * (start - i) as f32).exp() * samples[i as usize]
            };
            *slot = Complex::new(value, 0.0);
        }

        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        let norm = 1.0 / size as f32;
        self.buffer[..size / 2].iter().map(|c| c.norm() * norm).collect()
    }
}

struct State {
    cache: LruCache<SpectrumKey, Vec<f32>>, // empty vec = not computed yet
    pending: HashSet<SpectrumKey>,
    queue: VecDeque<SpectrumKey>,
}

impl State {
    fn next_job(&mut self) -> Option<SpectrumKey> {
        // keys cancelled by eviction stay in the queue but not in `pending`
        while let Some(key) = self.queue.pop_front() {
            if self.pending.remove(&key) {
                return Some(key);
            }
        }
        None
    }
}

struct Shared {
    state: Mutex<State>,
    running: AtomicBool,
}

/// Background spectrum computation with an LRU result cache.
///
/// `request_spectrum` never blocks on analysis: a miss schedules a job for
/// the worker thread and returns an empty spectrum until it is done.
pub struct SpectrumEngine {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl SpectrumEngine {
    pub fn new(samples: Arc<[f32]>, params: SpectrumParams) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                cache: LruCache::new(NonZeroUsize::new(params.cache_capacity).unwrap_or(NonZeroUsize::MIN)),
                pending: HashSet::new(),
                queue: VecDeque::new(),
            }),
            running: AtomicBool::new(true),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = std::thread::Builder::new()
            .name("spectrum".into())
            .spawn(move || run_worker(worker_shared, samples, params));
        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("failed to start spectrum worker: {e}");
                None
            }
        };

        Self { shared, worker }
    }

    /// Cached magnitudes for `[start, end)`, or an empty vec while pending.
    pub fn request_spectrum(&self, start: i64, end: i64) -> Vec<f32> {
        let key = (start, end);
        let mut state = self.shared.state.lock();
        if let Some(spectrum) = state.cache.get(&key) {
            return spectrum.clone();
        }

        if let Some((evicted, _)) = state.cache.push(key, Vec::new()) {
            state.pending.remove(&evicted);
        }
        state.pending.insert(key);
        state.queue.push_back(key);
        Vec::new()
    }

    pub fn pending_jobs(&self) -> usize {
        self.shared.state.lock().pending.len()
    }

    pub fn cached(&self) -> usize {
        self.shared.state.lock().cache.len()
    }
}

impl Drop for SpectrumEngine {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run_worker(shared: Arc<Shared>, samples: Arc<[f32]>, params: SpectrumParams) {
    let mut analyzer = SpectrumAnalyzer::new(&params);
    log::debug!("spectrum worker started (fft size {})", analyzer.fft_size());

    while shared.running.load(Ordering::Acquire) {
        let job = shared.state.lock().next_job();
        let Some((start, end)) = job else {
            std::thread::sleep(params.poll_interval);
            continue;
        };

        // the lock is not held while analyzing
        let spectrum = analyzer.analyze(&samples, start, end);

        let mut state = shared.state.lock();
        // evicted while we were busy: drop the result
        if let Some(slot) = state.cache.peek_mut(&(start, end)) {
            *slot = spectrum;
        }
    }
    log::debug!("spectrum worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn params(capacity: usize) -> SpectrumParams {
        SpectrumParams {
            fft_size: 1024,
            cache_capacity: capacity,
            poll_interval: Duration::from_millis(5),
            ..SpectrumParams::default()
        }
    }

    fn sine(freq: f32, len: usize) -> Arc<[f32]> {
        (0..len)
            .map(|i| (std::f32::consts::TAU * freq * i as f32 / 44100.0).sin())
            .collect()
    }

    fn wait_for(engine: &SpectrumEngine, start: i64, end: i64) -> Vec<f32> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let spectrum = engine.request_spectrum(start, end);
            if !spectrum.is_empty() || Instant::now() > deadline {
                return spectrum;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_cached_matches_direct() {
        let samples = sine(1000.0, 20_000);
        let engine = SpectrumEngine::new(samples.clone(), params(16));

        assert!(engine.request_spectrum(4000, 4100).is_empty());
        let cached = wait_for(&engine, 4000, 4100);
        let direct = SpectrumAnalyzer::new(&params(16)).analyze(&samples, 4000, 4100);

        assert_eq!(cached.len(), 512);
        assert_eq!(cached, direct);
    }

    #[test]
    fn test_peak_at_tone_bin() {
        let samples = sine(44100.0 / 1024.0 * 40.0, 8192);
        let spectrum = SpectrumAnalyzer::new(&params(1)).analyze(&samples, 0, 4096);

        let peak = spectrum
            .iter()
            .enumerate()
            .fold((0, 0.0f32), |best, (i, &m)| if m > best.1 { (i, m) } else { best });
        assert_eq!(peak.0, 40);
    }

    #[test]
    fn test_out_of_range_is_silent() {
        let samples = sine(440.0, 1000);
        let spectrum = SpectrumAnalyzer::new(&params(1)).analyze(&samples, 50_000, 50_100);
        assert!(spectrum.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_eviction_cancels_jobs() {
        let samples = sine(440.0, 20_000);
        let engine = SpectrumEngine::new(samples, params(2));

        // all three requested in one go; the first is evicted by the third
        engine.request_spectrum(0, 100);
        engine.request_spectrum(100, 200);
        engine.request_spectrum(200, 300);
        assert_eq!(engine.cached(), 2);
        assert!(engine.pending_jobs() <= 2);

        assert!(!wait_for(&engine, 200, 300).is_empty());
        assert!(engine.cached() <= 2);
    }

    #[test]
    fn test_touch_protects_from_eviction() {
        let samples = sine(440.0, 20_000);
        let engine = SpectrumEngine::new(samples, params(2));

        let a = wait_for(&engine, 0, 100);
        let _ = wait_for(&engine, 100, 200);
        // touching `a` makes (100, 200) the eviction candidate
        assert_eq!(engine.request_spectrum(0, 100), a);
        let _ = wait_for(&engine, 200, 300);

        assert_eq!(engine.request_spectrum(0, 100), a);
        assert!(engine.request_spectrum(100, 200).is_empty());
    }
}
