//! Marker-driven mapping between sample index, wall-clock time and pitch bend.
//!
//! The waveform is cut into segments at each marker. A segment's time length is
//! its sample length divided by the sample rate plus the right marker's `d_time`;
//! positions inside a segment are mapped linearly. Pitch bend is interpolated
//! between neighbouring markers and ramps back to zero after the last one.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// keeps floor() from landing one sample short on exact boundaries
const SAMPLE_EPSILON: f64 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub sample: i64,     // anchor in the unwarped sample domain
    pub note: f64,       // display pitch before bend
    pub d_time: f64,     // seconds added to the segment ending here
    pub pitch_bend: f64, // semitones
}

#[derive(Clone, Copy, Debug)]
struct Segment {
    start_sample: i64,
    start_time: f64,
    start_bend: f64,
    end_sample: i64,
    end_time: f64,
    end_bend: f64,
}

// where the walk ended up when no segment matched
#[derive(Clone, Copy, Debug)]
struct Tail {
    sample: i64,
    time: f64,
    bend: f64,
}

#[derive(Clone, Debug)]
pub struct TimeMap {
    markers: Vec<Marker>,
    sample_rate: u32,
    num_samples: usize,
    sample_to_time_memo: HashMap<i64, f64>,
    time_to_sample_memo: HashMap<i64, i64>,
    pitch_bend_memo: HashMap<i64, f64>,
}

impl TimeMap {
    pub fn new(sample_rate: u32, num_samples: usize) -> Self {
        Self {
            markers: Vec::new(),
            sample_rate,
            num_samples,
            sample_to_time_memo: HashMap::new(),
            time_to_sample_memo: HashMap::new(),
            pitch_bend_memo: HashMap::new(),
        }
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn set_markers(&mut self, mut markers: Vec<Marker>) {
        markers.sort_by_key(|m| m.sample);
        self.markers = markers;
        self.invalidate();
    }

    /// Inserts a marker keeping the list sorted; returns its index.
    pub fn add_marker(&mut self, marker: Marker) -> usize {
        // after any existing marker with the same sample
        let idx = self.markers.partition_point(|m| m.sample <= marker.sample);
        self.markers.insert(idx, marker);
        self.invalidate();
        idx
    }

    /// Applies `edit` to the marker at `idx` and re-sorts; returns the marker's new index.
    pub fn update_marker(&mut self, idx: usize, edit: impl FnOnce(&mut Marker)) -> Option<usize> {
        let mut marker = *self.markers.get(idx)?;
        edit(&mut marker);
        self.markers.remove(idx);
        let new_idx = self.markers.partition_point(|m| m.sample <= marker.sample);
        self.markers.insert(new_idx, marker);
        self.invalidate();
        Some(new_idx)
    }

    pub fn remove_marker(&mut self, idx: usize) -> Option<Marker> {
        if idx >= self.markers.len() {
            return None;
        }
        let removed = self.markers.remove(idx);
        self.invalidate();
        Some(removed)
    }

    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        if self.sample_rate != sample_rate {
            self.sample_rate = sample_rate;
            self.invalidate();
        }
    }

    pub fn set_num_samples(&mut self, num_samples: usize) {
        if self.num_samples != num_samples {
            self.num_samples = num_samples;
            self.invalidate();
        }
    }

    fn invalidate(&mut self) {
        self.sample_to_time_memo.clear();
        self.time_to_sample_memo.clear();
        self.pitch_bend_memo.clear();
    }

    #[cfg(test)]
    fn memo_len(&self) -> usize {
        self.sample_to_time_memo.len() + self.time_to_sample_memo.len() + self.pitch_bend_memo.len()
    }

    fn rate(&self) -> f64 {
        self.sample_rate.max(1) as f64
    }

    fn time_key(&self, time: f64) -> i64 {
        (time * self.rate() + SAMPLE_EPSILON).floor() as i64
    }

    // Walk segments left to right, returning the first one `hit` accepts.
    fn find_segment(&self, hit: impl Fn(&Segment) -> bool) -> Result<Segment, Tail> {
        let rate = self.rate();
        let mut tail = Tail {
            sample: 0,
            time: 0.0,
            bend: 0.0,
        };
        for marker in &self.markers {
            let segment = Segment {
                start_sample: tail.sample,
                start_time: tail.time,
                start_bend: tail.bend,
                end_sample: marker.sample,
                end_time: tail.time
                    + (marker.sample - tail.sample) as f64 / rate
                    + marker.d_time,
                end_bend: marker.pitch_bend,
            };
            if hit(&segment) {
                return Ok(segment);
            }
            tail = Tail {
                sample: segment.end_sample,
                time: segment.end_time,
                bend: segment.end_bend,
            };
        }
        Err(tail)
    }

    pub fn sample_to_time(&mut self, sample: i64) -> f64 {
        if sample <= 0 {
            return sample as f64 / self.rate();
        }
        if let Some(&time) = self.sample_to_time_memo.get(&sample) {
            return time;
        }

        // zero-width segments can never match, so no division by zero below
        let time = match self.find_segment(|s| sample > s.start_sample && sample <= s.end_sample) {
            Ok(s) => {
                s.start_time
                    + (sample - s.start_sample) as f64 * (s.end_time - s.start_time)
                        / (s.end_sample - s.start_sample) as f64
            }
            Err(tail) => tail.time + (sample - tail.sample) as f64 / self.rate(),
        };
        self.sample_to_time_memo.insert(sample, time);
        time
    }

    pub fn time_to_sample(&mut self, time: f64) -> i64 {
        if time <= 0.0 {
            // truncates toward zero, unlike the floored keys above it
            return (time * self.rate()) as i64;
        }
        let key = self.time_key(time);
        if let Some(&sample) = self.time_to_sample_memo.get(&key) {
            return sample;
        }

        let position = match self.find_segment(|s| time > s.start_time && time <= s.end_time) {
            Ok(s) => {
                s.start_sample as f64
                    + (time - s.start_time) * (s.end_sample - s.start_sample) as f64
                        / (s.end_time - s.start_time)
            }
            Err(tail) => tail.sample as f64 + (time - tail.time) * self.rate(),
        };
        let sample = (position + SAMPLE_EPSILON).floor() as i64;
        self.time_to_sample_memo.insert(key, sample);
        sample
    }

    pub fn time_to_pitch_bend(&mut self, time: f64) -> f64 {
        if time <= 0.0 {
            return 0.0;
        }
        let key = self.time_key(time);
        if let Some(&bend) = self.pitch_bend_memo.get(&key) {
            return bend;
        }

        let bend = match self.find_segment(|s| time > s.start_time && time <= s.end_time) {
            Ok(s) => {
                s.start_bend
                    + (time - s.start_time) * (s.end_bend - s.start_bend) / (s.end_time - s.start_time)
            }
            Err(tail) => {
                // taper from the last marker's bend down to 0 at the end of the file
                let duration = self.duration();
                if time > duration || duration <= tail.time {
                    0.0
                } else {
                    tail.bend + (time - tail.time) * (0.0 - tail.bend) / (duration - tail.time)
                }
            }
        };
        self.pitch_bend_memo.insert(key, bend);
        bend
    }

    /// Warped time of the last sample.
    pub fn duration(&mut self) -> f64 {
        self.sample_to_time(self.num_samples as i64 - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 44100;

    fn marker(sample: i64, d_time: f64, pitch_bend: f64) -> Marker {
        Marker {
            sample,
            note: 60.0,
            d_time,
            pitch_bend,
        }
    }

    #[test]
    fn test_round_trip_without_markers() {
        let mut map = TimeMap::new(RATE, 2 * RATE as usize);

        for s in (0..2 * RATE as i64).step_by(977) {
            let t = map.sample_to_time(s);
            assert!((map.time_to_sample(t) - s).abs() <= 1, "sample {s}");
        }

        for i in 0..200 {
            let t = i as f64 * 0.0099;
            let s = map.time_to_sample(t);
            assert!((map.sample_to_time(s) - t).abs() <= 1.0 / RATE as f64, "time {t}");
        }
    }

    #[test]
    fn test_negative_inputs_are_linear() {
        let mut map = TimeMap::new(RATE, RATE as usize);
        map.set_markers(vec![marker(1000, 1.0, 3.0)]);

        assert_eq!(map.sample_to_time(-(RATE as i64)), -1.0);
        assert_eq!(map.time_to_sample(-0.5), -(RATE as i64) / 2);
        assert_eq!(map.time_to_sample(-1e-5), 0);
        assert_eq!(map.time_to_sample(-1.5 / RATE as f64), -1);
        assert_eq!(map.time_to_pitch_bend(-1.0), 0.0);
    }

    #[test]
    fn test_stretch_segment() {
        let mut map = TimeMap::new(RATE, 2 * RATE as usize);
        map.set_markers(vec![marker(RATE as i64, 0.5, 0.0)]);

        // first second of audio now lasts 1.5s
        assert!((map.sample_to_time(RATE as i64) - 1.5).abs() < 1e-9);
        assert!((map.sample_to_time(RATE as i64 / 2) - 0.75).abs() < 1e-9);
        assert_eq!(map.time_to_sample(0.75), RATE as i64 / 2);

        // everything after the marker is shifted by the stretch
        assert!((map.sample_to_time(RATE as i64 + 4410) - 1.6).abs() < 1e-9);
        assert_eq!(map.time_to_sample(1.6), RATE as i64 + 4410);

        assert!((map.duration() - (1.5 + (RATE as f64 - 1.0) / RATE as f64)).abs() < 1e-9);
    }

    #[test]
    fn test_round_trip_at_markers() {
        let mut map = TimeMap::new(RATE, 4 * RATE as usize);
        map.set_markers(vec![
            marker(30_000, 0.25, 2.0),
            marker(70_000, -0.2, -1.0),
            marker(120_000, 0.0, 0.5),
        ]);

        for m in map.markers().to_vec() {
            let t = map.sample_to_time(m.sample);
            assert!((map.time_to_sample(t) - m.sample).abs() <= 1);
        }
        // before the first marker and after the last one
        for s in [1_000, 29_000, 130_000, 170_000] {
            let t = map.sample_to_time(s);
            assert!((map.time_to_sample(t) - s).abs() <= 1, "sample {s}");
        }
    }

    #[test]
    fn test_pitch_bend_continuous_at_markers() {
        let mut map = TimeMap::new(RATE, 4 * RATE as usize);
        map.set_markers(vec![
            marker(30_000, 0.1, 2.0),
            marker(70_000, 0.3, -3.0),
            marker(120_000, -0.1, 1.5),
        ]);

        let eps = 1e-3;
        for m in map.markers().to_vec() {
            let t = map.sample_to_time(m.sample);
            let left = map.time_to_pitch_bend(t - eps);
            let at = map.time_to_pitch_bend(t);
            let right = map.time_to_pitch_bend(t + eps);
            assert!((at - m.pitch_bend).abs() < 1e-6);
            assert!((left - right).abs() < 0.05, "jump at marker {}", m.sample);
        }
    }

    #[test]
    fn test_pitch_bend_tapers_after_last_marker() {
        let mut map = TimeMap::new(RATE, 2 * RATE as usize);
        map.set_markers(vec![marker(RATE as i64, 0.0, 4.0)]);

        let duration = map.duration();
        let halfway = (1.0 + duration) / 2.0;
        assert!((map.time_to_pitch_bend(1.0) - 4.0).abs() < 1e-6);
        assert!((map.time_to_pitch_bend(halfway) - 2.0).abs() < 1e-3);
        assert!(map.time_to_pitch_bend(duration).abs() < 1e-6);
        assert_eq!(map.time_to_pitch_bend(duration + 1.0), 0.0);

        // ramps up from 0 at the start
        assert!((map.time_to_pitch_bend(0.5) - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_duplicate_markers_do_not_divide_by_zero() {
        let mut map = TimeMap::new(RATE, 2 * RATE as usize);
        map.set_markers(vec![
            marker(20_000, 0.0, 1.0),
            marker(20_000, 0.0, 5.0),
            marker(40_000, -1.0, 2.0), // negative time width
        ]);

        let mut last = i64::MIN;
        for i in 0..400 {
            let t = i as f64 * 0.005;
            let s = map.time_to_sample(t);
            assert!(s >= 0 && s < 3 * RATE as i64, "time {t} -> {s}");
            last = last.max(s);
            assert!(map.time_to_pitch_bend(t).is_finite());
        }
        assert!(last > 40_000);
        for s in (0..2 * RATE as i64).step_by(1000) {
            assert!(map.sample_to_time(s).is_finite());
        }
    }

    #[test]
    fn test_marker_edits_keep_order_and_clear_memo() {
        let mut map = TimeMap::new(RATE, RATE as usize);
        map.add_marker(marker(5000, 0.0, 0.0));
        map.add_marker(marker(1000, 0.0, 0.0));
        let idx = map.add_marker(marker(3000, 0.0, 0.0));
        assert_eq!(idx, 1);

        let _ = map.sample_to_time(2000);
        let _ = map.time_to_sample(0.1);
        assert!(map.memo_len() > 0);

        let moved = map.update_marker(0, |m| m.sample = 9000);
        assert_eq!(moved, Some(2));
        assert_eq!(map.memo_len(), 0);
        let samples: Vec<i64> = map.markers().iter().map(|m| m.sample).collect();
        assert_eq!(samples, vec![3000, 5000, 9000]);

        assert!(map.remove_marker(7).is_none());
        assert_eq!(map.remove_marker(1).map(|m| m.sample), Some(5000));
    }

    #[test]
    fn test_memo_cleared_on_rate_change() {
        let mut map = TimeMap::new(RATE, RATE as usize);
        assert!((map.sample_to_time(RATE as i64) - 1.0).abs() < 1e-9);
        map.set_sample_rate(RATE / 2);
        assert!((map.sample_to_time(RATE as i64) - 2.0).abs() < 1e-9);
    }
}
