pub mod audio;
pub mod audio_api;
pub mod cli;
pub mod loader;
pub mod mapper;
pub mod middle;
pub mod params;
pub mod pipeline;
pub mod session;
pub mod shared;
pub mod spectrum;
pub mod tui;
pub mod waveform;
