//! State shared between the UI thread and the audio callback.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::audio::engine::{self, PlayState, Player};
use crate::audio::grain::GrainTable;
use crate::audio_api::PlaybackEvent;
use crate::mapper::{Marker, TimeMap};
use crate::params::EngineParams;
use crate::waveform::Waveform;

pub type SharedSession = Arc<Mutex<Session>>;

/// Everything the audio callback reads: the time map, the grains and the
/// playback state. The UI mutates it under the same lock.
#[derive(Debug)]
pub struct Session {
    pub map: TimeMap,
    pub grains: GrainTable,
    pub player: Player,
}

impl Session {
    pub fn new(waveform: &Waveform, markers: Vec<Marker>, params: &EngineParams) -> Self {
        let mut map = TimeMap::new(waveform.sample_rate, waveform.len());
        map.set_markers(markers);
        Self {
            map,
            grains: GrainTable::segment(waveform.samples.clone(), params),
            player: Player::new(params.clone()),
        }
    }

    pub fn empty(sample_rate: u32, params: &EngineParams) -> Self {
        Self::new(&Waveform::empty(sample_rate), Vec::new(), params)
    }

    pub fn shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    pub fn render(&mut self, out: &mut [f32]) -> Option<PlaybackEvent> {
        self.player.render(&mut self.map, &self.grains, out)
    }

    pub fn toggle_play(&mut self) -> PlayState {
        self.player.toggle_play()
    }

    pub fn duration(&mut self) -> f64 {
        self.map.duration()
    }
}

/// Renders the warped timeline from a copy of the map and grains, so the
/// audio callback never waits on the lock for the length of an export.
pub fn render_detached(session: &SharedSession, limit: Option<usize>) -> Vec<f32> {
    let (mut map, grains) = {
        let session = session.lock();
        (session.map.clone(), session.grains.clone())
    };
    engine::render_offline(&mut map, &grains, limit)
}
