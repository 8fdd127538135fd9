// on-disk project document: the audio itself plus everything the user edited

use serde::{Deserialize, Serialize};

use crate::mapper::Marker;

pub const FORMAT_VERSION: u32 = 1;
pub const PROJECT_EXTENSION: &str = "pitchwarp";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub format_version: u32,
    pub waveform_samples: Vec<f32>,
    pub sample_rate: u32,
    pub brightness: f32,
    pub markers: Vec<Marker>,
    pub tempo: f32,
}

impl ProjectFile {
    pub fn new(waveform_samples: Vec<f32>, sample_rate: u32, markers: Vec<Marker>, brightness: f32, tempo: f32) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            waveform_samples,
            sample_rate,
            brightness,
            markers,
            tempo,
        }
    }
}
