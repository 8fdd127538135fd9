use std::num::NonZeroUsize;

use lru::LruCache;

use super::engine::SpectrumEngine;

pub type Texel = [u8; 3];

// uploaded while the spectrum is still being computed
const PLACEHOLDER_TEXELS: usize = 16;

/// Somewhere to keep one column of spectrogram texels.
pub trait TextureBackend {
    type Handle: Clone;

    fn allocate(&mut self) -> Self::Handle;
    fn upload(&mut self, handle: &Self::Handle, texels: &[Texel]);
}

/// Texels kept in plain memory, one row per handle.
#[derive(Debug, Default)]
pub struct MemoryTextures {
    columns: Vec<Vec<Texel>>,
}

impl MemoryTextures {
    pub fn texels(&self, handle: usize) -> &[Texel] {
        self.columns.get(handle).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl TextureBackend for MemoryTextures {
    type Handle = usize;

    fn allocate(&mut self) -> usize {
        self.columns.push(Vec::new());
        self.columns.len() - 1
    }

    fn upload(&mut self, handle: &usize, texels: &[Texel]) {
        if let Some(column) = self.columns.get_mut(*handle) {
            column.clear();
            column.extend_from_slice(texels);
        }
    }
}

#[derive(Debug)]
struct Entry<H> {
    handle: H,
    dirty: bool,
}

/// Per-pixel-column spectrogram textures keyed by quantized time.
///
/// A column key is `floor(time * width / range_time)`, so panning reuses
/// columns while zooming starts over. Backend handles are recycled from the
/// least recently used column once the cache is full, and handles of
/// forgotten columns are kept for reuse, so the backend never sees more than
/// `capacity` allocations.
pub struct TextureCache<B: TextureBackend> {
    backend: B,
    entries: LruCache<i64, Entry<B::Handle>>,
    spare: Vec<B::Handle>,
    width: u32,
    range_time: f64,
    sample_rate: u32,
    gain: f32,
    texels: Vec<Texel>,
}

impl<B: TextureBackend> TextureCache<B> {
    pub fn new(backend: B, capacity: usize, sample_rate: u32, gain: f32) -> Self {
        Self {
            backend,
            entries: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
            spare: Vec::new(),
            width: 1,
            range_time: 1.0,
            sample_rate,
            gain,
            texels: Vec::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Changing the zoom or column count invalidates every key.
    pub fn set_view(&mut self, width: u32, range_time: f64) {
        let width = width.max(1);
        if width != self.width || range_time != self.range_time {
            self.width = width;
            self.range_time = range_time;
            self.clear();
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        if sample_rate != self.sample_rate {
            self.sample_rate = sample_rate;
            self.clear();
        }
    }

    pub fn set_gain(&mut self, gain: f32) {
        if gain != self.gain {
            self.gain = gain;
            self.invalidate();
        }
    }

    /// Forgets every column. Their handles go back to the spare list.
    pub fn clear(&mut self) {
        while let Some((_, entry)) = self.entries.pop_lru() {
            self.spare.push(entry.handle);
        }
    }

    /// Marks every column for re-upload on its next use.
    pub fn invalidate(&mut self) {
        for (_, entry) in self.entries.iter_mut() {
            entry.dirty = true;
        }
    }

    pub fn column_key(&self, time: f64) -> i64 {
        (time * self.width as f64 / self.range_time).floor() as i64
    }

    /// Handle for the column at `time`, populating it when new or dirty.
    ///
    /// `time_to_sample` maps warped time to source samples, which is how
    /// stretched regions end up showing the right spectrum.
    pub fn get_texture(
        &mut self,
        time: f64,
        spectra: &SpectrumEngine,
        time_to_sample: impl FnMut(f64) -> i64,
    ) -> B::Handle {
        let key = self.column_key(time);

        let cached = self.entries.get(&key).map(|entry| (entry.handle.clone(), entry.dirty));
        let (handle, dirty) = match cached {
            Some(found) => found,
            None => {
                let handle = self.take_handle();
                self.entries.push(key, Entry { handle: handle.clone(), dirty: true });
                (handle, true)
            }
        };

        if dirty {
            let ready = self.populate(key, spectra, time_to_sample);
            self.backend.upload(&handle, &self.texels);
            if let Some(entry) = self.entries.peek_mut(&key) {
                // keep polling until the worker delivers
                entry.dirty = !ready;
            }
        }
        handle
    }

    // recycle the lru column when full, then spares, then the backend
    fn take_handle(&mut self) -> B::Handle {
        if self.entries.len() >= self.entries.cap().get() {
            if let Some((_, old)) = self.entries.pop_lru() {
                return old.handle;
            }
        }
        match self.spare.pop() {
            Some(handle) => handle,
            None => self.backend.allocate(),
        }
    }

    // Fills `self.texels` for column `key`; false while the spectrum is pending.
    fn populate(&mut self, key: i64, spectra: &SpectrumEngine, mut time_to_sample: impl FnMut(f64) -> i64) -> bool {
        let start = key as f64 * self.range_time / self.width as f64;
        let pixel = (4.0 / self.sample_rate.max(1) as f64).max(self.range_time / self.width as f64);
        let spectrum = spectra.request_spectrum(time_to_sample(start), time_to_sample(start + pixel));

        self.texels.clear();
        if spectrum.is_empty() {
            self.texels.resize(PLACEHOLDER_TEXELS, [0, 0, 0]);
            return false;
        }
        let gain = self.gain;
        self.texels.extend(spectrum.iter().map(|&m| {
            let grey = (m * gain).clamp(0.0, 255.0) as u8;
            [grey, grey, grey]
        }));
        true
    }
}
