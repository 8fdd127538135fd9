//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::params::Params;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "pitchwarp")]
#[command(about = "Stretch time and bend pitch of a recording with timeline markers", long_about = None)]
pub struct Args {
    /// Audio file (.wav) or project (.pitchwarp) to open
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Render the warped result to this wav file and exit
    #[arg(long, value_name = "WAV")]
    pub export: Option<PathBuf>,

    /// Save the opened file as a project at this path and exit
    #[arg(long, value_name = "PATH")]
    pub save_project: Option<PathBuf>,

    /// Run without opening an audio device
    #[arg(long)]
    pub no_audio: bool,

    /// Session sample rate when no audio device decides it (Hz)
    #[arg(long, value_name = "HZ", default_value = "44100")]
    pub sample_rate: u32,

    /// Spectrogram brightness, 0 to 100
    #[arg(long, value_name = "LEVEL")]
    pub brightness: Option<f32>,

    /// Tempo of the beat grid (beats per minute)
    #[arg(long, value_name = "BPM")]
    pub tempo: Option<f32>,
}

impl Args {
    /// True when the run should not start the terminal ui
    pub fn is_headless(&self) -> bool {
        self.export.is_some() || self.save_project.is_some()
    }

    /// Fold command-line overrides into the tuning parameters
    pub fn params(&self) -> Params {
        let mut params = Params::default();
        if let Some(brightness) = self.brightness {
            params.view.brightness = brightness.clamp(0.0, 100.0);
        }
        if let Some(tempo) = self.tempo {
            params.view.tempo = tempo;
        }
        params
    }
}
