pub mod engine;
pub mod texture_cache;

pub use engine::{SpectrumAnalyzer, SpectrumEngine, SpectrumKey};
pub use texture_cache::{MemoryTextures, Texel, TextureBackend, TextureCache};
