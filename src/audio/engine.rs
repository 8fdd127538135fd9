use super::grain::GrainTable;
use super::resample::Resampler;
use crate::audio_api::PlaybackEvent;
use crate::mapper::TimeMap;
use crate::params::EngineParams;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayState {
    Stopped,
    Playing,
}

/// Real-time playback state: warped-time cursor plus the audio already
/// synthesized ahead of it.
#[derive(Debug)]
pub struct Player {
    params: EngineParams,
    state: PlayState,
    cursor: f64,
    resampler: Resampler,
    rest: Vec<f32>, // synthesized but not yet delivered, starts at `cursor`
}

impl Player {
    pub fn new(params: EngineParams) -> Self {
        // room for a few grains so the callback rarely allocates
        let rest = Vec::with_capacity(params.grain_size * 8);
        Self {
            params,
            state: PlayState::Stopped,
            cursor: 0.0,
            resampler: Resampler::default(),
            rest,
        }
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    /// Moves the cursor, dropping any audio synthesized for the old position.
    pub fn set_cursor(&mut self, cursor: f64) {
        self.cursor = cursor;
        self.rest.clear();
        self.resampler.reset();
    }

    pub fn toggle_play(&mut self) -> PlayState {
        self.state = match self.state {
            PlayState::Playing => PlayState::Stopped,
            PlayState::Stopped => {
                self.rest.clear();
                self.resampler.reset();
                PlayState::Playing
            }
        };
        self.state
    }

    pub fn stop(&mut self) {
        self.state = PlayState::Stopped;
    }

    /// Fills `out` with the next block of mono audio.
    ///
    /// Returns an event whenever the block was rendered in the stopped state so
    /// the host can pause its stream.
    pub fn render(&mut self, map: &mut TimeMap, grains: &GrainTable, out: &mut [f32]) -> Option<PlaybackEvent> {
        if self.state == PlayState::Playing && (self.cursor < 0.0 || self.cursor >= map.duration()) {
            log::debug!("cursor {:.3}s left the material, stopping", self.cursor);
            self.state = PlayState::Stopped;
        }
        if self.state == PlayState::Stopped {
            self.fade_out(out);
            return Some(PlaybackEvent::Stopped { cursor: self.cursor });
        }

        let sample_rate = map.sample_rate().max(1) as f64;
        let wanted = out.len() + self.params.grain_size;
        let mut synth_cursor = self.cursor + self.rest.len() as f64 / sample_rate;
        let mut exhausted = false;
        while self.rest.len() < wanted {
            match self.resampler.process(map, grains, synth_cursor, &mut self.rest) {
                Some(dt) => synth_cursor += dt,
                None => {
                    exhausted = true;
                    break;
                }
            }
        }

        let n = self.rest.len().min(out.len());
        out[..n].copy_from_slice(&self.rest[..n]);
        out[n..].fill(0.0);
        self.rest.drain(..n);
        self.cursor += n as f64 / sample_rate;

        if exhausted && n < out.len() {
            self.state = PlayState::Stopped;
            return Some(PlaybackEvent::Stopped { cursor: self.cursor });
        }
        None
    }

    // silence, with a short ramp over whatever was left in the carry-over buffer
    fn fade_out(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        let n = self.params.stop_fade.min(self.rest.len()).min(out.len());
        for (i, (o, s)) in out.iter_mut().zip(&self.rest).take(n).enumerate() {
            *o = s * (1.0 - i as f32 / n as f32);
        }
        self.rest.clear();
        self.resampler.reset();
    }
}

/// Renders the whole warped timeline from the start, independent of any
/// real-time player.
///
/// The result ends where playback ends, at the map's `duration()`, or after
/// `limit` samples. A tail the grains do not cover reads as silence.
pub fn render_offline(map: &mut TimeMap, grains: &GrainTable, limit: Option<usize>) -> Vec<f32> {
    let sample_rate = map.sample_rate().max(1) as f64;
    let mut end = (map.duration().max(0.0) * sample_rate).round() as usize;
    if let Some(limit) = limit {
        end = end.min(limit);
    }

    let mut resampler = Resampler::default();
    let mut out = Vec::with_capacity(end);
    let mut cursor = 0.0;
    while out.len() < end {
        match resampler.process(map, grains, cursor, &mut out) {
            Some(dt) => cursor += dt,
            None => break,
        }
    }
    out.resize(end, 0.0);
    out
}
