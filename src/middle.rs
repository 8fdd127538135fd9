// the middle layer: owns everything the ui shows and turns input into edits
// of the shared session. the tui only reads from here and draws.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::audio::PlayState;
use crate::loader::sample_loader::{self, LoadError};
use crate::mapper::Marker;
use crate::params::{brightness_to_gain, Params};
use crate::pipeline::export;
use crate::pipeline::persistence::{self, ProjectError};
use crate::pipeline::project::{ProjectFile, PROJECT_EXTENSION};
use crate::session::{self, Session, SharedSession};
use crate::spectrum::{MemoryTextures, SpectrumEngine, Texel, TextureCache};
use crate::waveform::{Waveform, WaveformPyramid};

const MIN_RANGE_TIME: f64 = 0.05;
const MIN_RANGE_NOTE: f64 = 10.0;
const MAX_NOTE: f64 = 127.0;
const MARKER_HIT_PX: f64 = 1.5;

/// Visible window, in warped seconds and display notes.
///
/// Coordinates are in "pixels": one per spectrogram column horizontally and
/// one per half terminal row vertically, row 0 at the top.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    pub start_time: f64,
    pub range_time: f64,
    pub start_note: f64,
    pub range_note: f64,
    pub width: u16,
    pub height: u16,
    pub follow: bool,
}

impl ViewState {
    fn new(params: &Params) -> Self {
        Self {
            start_time: 0.0,
            range_time: params.view.range_time,
            start_note: params.view.start_note,
            range_note: params.view.range_note,
            width: 1,
            height: 1,
            follow: false,
        }
    }

    pub fn col_to_time(&self, col: f64) -> f64 {
        self.start_time + col * self.range_time / self.width.max(1) as f64
    }

    pub fn time_to_col(&self, time: f64) -> f64 {
        (time - self.start_time) * self.width.max(1) as f64 / self.range_time
    }

    pub fn row_to_note(&self, row: f64) -> f64 {
        let h = self.height.max(1) as f64;
        self.start_note + (h - row - 0.5) * self.range_note / h
    }

    pub fn note_to_row(&self, note: f64) -> f64 {
        let h = self.height.max(1) as f64;
        h - 0.5 - (note - self.start_note) * h / self.range_note
    }
}

/// Where to draw one marker: the stem runs from the unstretched position
/// (time minus `d_time`, unbent note) to the effective one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerGlyph {
    pub from_col: f64,
    pub from_row: f64,
    pub col: f64,
    pub row: f64,
    pub selected: bool,
}

pub struct Editor {
    session: SharedSession,
    params: Params,
    sample_rate: u32,
    waveform: Waveform,
    pyramid: WaveformPyramid,
    spectra: SpectrumEngine,
    textures: TextureCache<MemoryTextures>,
    view: ViewState,
    brightness: f32,
    tempo: f32,
    selected: Option<usize>,
    columns: Vec<(f32, f32)>, // waveform strip, one entry per column
    source_path: Option<PathBuf>,
    project_path: Option<PathBuf>,
    status: String,
}

impl Editor {
    pub fn new(session: SharedSession, sample_rate: u32, params: Params) -> Self {
        let waveform = Waveform::empty(sample_rate);
        let brightness = params.view.brightness;
        Self {
            session,
            sample_rate,
            pyramid: WaveformPyramid::build(waveform.samples.clone()),
            spectra: SpectrumEngine::new(waveform.samples.clone(), params.spectrum.clone()),
            textures: TextureCache::new(
                MemoryTextures::default(),
                params.view.texture_capacity,
                sample_rate,
                brightness_to_gain(brightness),
            ),
            view: ViewState::new(&params),
            brightness,
            tempo: params.view.tempo,
            selected: None,
            columns: Vec::new(),
            source_path: None,
            project_path: None,
            status: String::from("open a .wav or .pitchwarp file to start"),
            waveform,
            params,
        }
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_loaded(&self) -> bool {
        self.waveform.len() >= 2
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    pub fn tempo(&self) -> f32 {
        self.tempo
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn title(&self) -> String {
        self.project_path
            .as_deref()
            .or(self.source_path.as_deref())
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("untitled"))
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status = msg.into();
    }

    // ── Files ─────────────────────────────────────────────────────

    /// Opens a project or imports audio depending on the extension.
    pub fn open(&mut self, path: &Path) -> anyhow::Result<()> {
        let result = if persistence::is_project_path(path) {
            self.load_project(path).map_err(anyhow::Error::from)
        } else {
            self.import_audio(path).map_err(anyhow::Error::from)
        };
        match &result {
            Ok(()) => self.set_status(format!("opened {}", path.display())),
            Err(e) => {
                log::error!("failed to open {}: {e}", path.display());
                self.set_status(format!("open failed: {e}"));
            }
        }
        result.with_context(|| format!("failed to open {}", path.display()))
    }

    pub fn import_audio(&mut self, path: &Path) -> Result<(), LoadError> {
        let waveform = sample_loader::load(path, self.sample_rate)?;
        self.install(waveform, Vec::new());
        self.source_path = Some(path.to_path_buf());
        self.project_path = None;
        Ok(())
    }

    pub fn load_project(&mut self, path: &Path) -> Result<(), ProjectError> {
        let project = persistence::load_project(path)?;
        let ratio = self.sample_rate as f64 / project.sample_rate.max(1) as f64;
        let markers = project
            .markers
            .into_iter()
            .map(|m| Marker {
                sample: (m.sample as f64 * ratio).round() as i64,
                ..m
            })
            .collect();
        let waveform = Waveform::new(project.waveform_samples, project.sample_rate);

        self.install(waveform, markers);
        self.set_brightness(project.brightness);
        self.tempo = project.tempo;
        self.source_path = None;
        self.project_path = Some(path.to_path_buf());
        log::info!("loaded project {}", path.display());
        Ok(())
    }

    // Swap in new material. Everything derived from the old waveform goes.
    fn install(&mut self, waveform: Waveform, markers: Vec<Marker>) {
        let waveform = waveform.resampled(self.sample_rate);
        let session = Session::new(&waveform, markers, &self.params.engine);
        *self.session.lock() = session;

        self.pyramid = WaveformPyramid::build(waveform.samples.clone());
        self.spectra = SpectrumEngine::new(waveform.samples.clone(), self.params.spectrum.clone());
        self.textures.clear();
        self.columns.clear();
        self.selected = None;

        let (width, height) = (self.view.width, self.view.height);
        self.view = ViewState::new(&self.params);
        self.view.width = width;
        self.view.height = height;
        self.waveform = waveform;
    }

    pub fn project_file(&self) -> ProjectFile {
        ProjectFile::new(
            self.waveform.samples.to_vec(),
            self.sample_rate,
            self.markers(),
            self.brightness,
            self.tempo,
        )
    }

    /// Saves to `path`, or to wherever the project was last saved or loaded.
    pub fn save_project(&mut self, path: Option<&Path>) -> anyhow::Result<PathBuf> {
        let target = match (path, &self.project_path, &self.source_path) {
            (Some(path), _, _) => path.to_path_buf(),
            (None, Some(project), _) => project.clone(),
            (None, None, Some(source)) => source.with_extension(PROJECT_EXTENSION),
            (None, None, None) => anyhow::bail!("nothing to save"),
        };
        let written = persistence::save_project(&target, &self.project_file())
            .with_context(|| format!("failed to save {}", target.display()))?;

        log::info!("saved project {}", written.display());
        self.set_status(format!("saved {}", written.display()));
        self.project_path = Some(written.clone());
        Ok(written)
    }

    pub fn default_export_path(&self) -> PathBuf {
        let base = self
            .project_path
            .as_deref()
            .or(self.source_path.as_deref())
            .unwrap_or_else(|| Path::new("untitled"));
        let stem = base.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        base.with_file_name(format!("{stem}-warped.wav"))
    }

    /// Stops playback and writes the whole warped timeline as 16-bit mono WAV.
    pub fn export_wav(&mut self, path: &Path) -> anyhow::Result<usize> {
        self.session.lock().player.stop();
        let pcm = self.render_offline();
        export::write_wav(path, &pcm, self.sample_rate)
            .with_context(|| format!("failed to export {}", path.display()))?;
        self.set_status(format!("exported {:.2}s to {}", pcm.len() as f64 / self.sample_rate as f64, path.display()));
        Ok(pcm.len())
    }

    pub fn render_offline(&self) -> Vec<f32> {
        session::render_detached(&self.session, None)
    }

    // ── Transport ─────────────────────────────────────────────────

    pub fn toggle_play(&mut self) -> PlayState {
        if !self.is_loaded() {
            return PlayState::Stopped;
        }
        self.session.lock().toggle_play()
    }

    pub fn is_playing(&self) -> bool {
        self.session.lock().player.is_playing()
    }

    pub fn cursor(&self) -> f64 {
        self.session.lock().player.cursor()
    }

    pub fn duration(&self) -> f64 {
        self.session.lock().duration()
    }

    fn move_cursor(&mut self, time: f64) {
        let mut session = self.session.lock();
        let duration = session.duration().max(0.0);
        session.player.set_cursor(time.clamp(0.0, duration));
    }

    pub fn cursor_left(&mut self) {
        if !self.is_loaded() {
            return;
        }
        self.view.follow = false;
        let step = self.view.range_time / self.view.width.max(1) as f64;
        self.move_cursor(self.cursor() - step);
    }

    pub fn cursor_right(&mut self) {
        if !self.is_loaded() {
            return;
        }
        self.view.follow = false;
        let step = self.view.range_time / self.view.width.max(1) as f64;
        self.move_cursor(self.cursor() + step);
    }

    /// Puts the cursor under waveform column `col`.
    pub fn scrub(&mut self, col: u16) {
        if !self.is_loaded() {
            return;
        }
        self.view.follow = false;
        self.move_cursor(self.view.col_to_time(col as f64));
    }

    // ── Markers ───────────────────────────────────────────────────

    pub fn markers(&self) -> Vec<Marker> {
        self.session.lock().map.markers().to_vec()
    }

    pub fn selected_marker(&self) -> Option<Marker> {
        let idx = self.selected?;
        self.session.lock().map.markers().get(idx).copied()
    }

    fn marker_changed(&mut self) {
        self.columns.clear();
        self.textures.invalidate();
    }

    fn marker_at(&self, col: f64, row: f64) -> Option<usize> {
        let mut session = self.session.lock();
        let markers = session.map.markers().to_vec();
        markers.iter().position(|m| {
            let x = self.view.time_to_col(session.map.sample_to_time(m.sample));
            let y = self.view.note_to_row(m.note + m.pitch_bend);
            (x - col).abs() < MARKER_HIT_PX && (y - row).abs() < MARKER_HIT_PX
        })
    }

    /// Selects the marker under the pointer, or adds one there.
    ///
    /// A new marker takes the pitch bend already in effect at that time so
    /// adding it leaves the bend curve unchanged.
    pub fn pointer_down(&mut self, col: u16, row: u16) {
        if !self.is_loaded() {
            return;
        }
        let (col, row) = (col as f64 + 0.5, row as f64 + 0.5);
        if let Some(idx) = self.marker_at(col, row) {
            log::debug!("selected marker {idx}");
            self.selected = Some(idx);
            return;
        }

        let time = self.view.col_to_time(col);
        let note = self.view.row_to_note(row);
        let idx = {
            let mut session = self.session.lock();
            let sample = session.map.time_to_sample(time);
            let pitch_bend = session.map.time_to_pitch_bend(time);
            session.map.add_marker(Marker {
                sample,
                note: note - pitch_bend,
                d_time: 0.0,
                pitch_bend,
            })
        };
        log::debug!("added marker {idx} at {time:.3}s");
        self.selected = Some(idx);
        self.marker_changed();
    }

    /// Dragging the selected marker stretches time horizontally and bends
    /// pitch vertically.
    pub fn pointer_drag(&mut self, dcol: i32, drow: i32) {
        let dt = dcol as f64 * self.view.range_time / self.view.width.max(1) as f64;
        let dbend = -(drow as f64) * self.view.range_note / self.view.height.max(1) as f64;
        self.edit_selected(|m| {
            m.d_time += dt;
            m.pitch_bend += dbend;
        });
    }

    pub fn remove_marker_at(&mut self, col: u16, row: u16) {
        if let Some(idx) = self.marker_at(col as f64 + 0.5, row as f64 + 0.5) {
            self.remove_marker(idx);
        }
    }

    pub fn delete_selected(&mut self) {
        if let Some(idx) = self.selected {
            self.remove_marker(idx);
        }
    }

    fn remove_marker(&mut self, idx: usize) {
        let removed = self.session.lock().map.remove_marker(idx);
        if removed.is_some() {
            self.selected = None;
            self.marker_changed();
        }
    }

    pub fn select_next_marker(&mut self) {
        let count = self.session.lock().map.markers().len();
        self.selected = match (self.selected, count) {
            (_, 0) => None,
            (Some(idx), _) => Some((idx + 1) % count),
            (None, _) => Some(0),
        };
    }

    pub fn nudge_time(&mut self, dt: f64) {
        self.edit_selected(|m| m.d_time += dt);
    }

    pub fn nudge_bend(&mut self, semitones: f64) {
        self.edit_selected(|m| m.pitch_bend += semitones);
    }

    pub fn reset_time(&mut self) {
        self.edit_selected(|m| m.d_time = 0.0);
    }

    pub fn reset_bend(&mut self) {
        self.edit_selected(|m| m.pitch_bend = 0.0);
    }

    fn edit_selected(&mut self, edit: impl FnOnce(&mut Marker)) {
        let Some(idx) = self.selected else {
            return;
        };
        let moved = self.session.lock().map.update_marker(idx, edit);
        if moved.is_some() {
            self.selected = moved;
            self.marker_changed();
        }
    }

    pub fn marker_glyphs(&self) -> Vec<MarkerGlyph> {
        let mut session = self.session.lock();
        let markers = session.map.markers().to_vec();
        markers
            .iter()
            .enumerate()
            .map(|(idx, m)| {
                let time = session.map.sample_to_time(m.sample);
                MarkerGlyph {
                    from_col: self.view.time_to_col(time - m.d_time),
                    from_row: self.view.note_to_row(m.note),
                    col: self.view.time_to_col(time),
                    row: self.view.note_to_row(m.note + m.pitch_bend),
                    selected: self.selected == Some(idx),
                }
            })
            .collect()
    }

    // ── View ──────────────────────────────────────────────────────

    pub fn set_viewport(&mut self, width: u16, height: u16) {
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) != (self.view.width, self.view.height) {
            self.view.width = width;
            self.view.height = height;
            self.columns.clear();
        }
    }

    fn material_secs(&self) -> f64 {
        self.waveform.len() as f64 / self.sample_rate.max(1) as f64
    }

    fn clamp_start_time(&mut self) {
        let left = -0.5 * self.view.range_time;
        let right = (self.material_secs() - 0.5 * self.view.range_time).max(0.0);
        self.view.start_time = self.view.start_time.clamp(left, right);
    }

    /// Zooms around the cursor when it is visible, else around the centre.
    pub fn zoom_time(&mut self, factor: f64) {
        let cursor = self.cursor();
        let view_end = self.view.start_time + self.view.range_time;
        let anchor = if (self.view.start_time..view_end).contains(&cursor) {
            cursor
        } else {
            self.view.start_time + 0.5 * self.view.range_time
        };
        let max_range = (2.0 * self.material_secs()).max(self.params.view.range_time);
        let range = (self.view.range_time * factor).clamp(MIN_RANGE_TIME, max_range);

        self.view.start_time = anchor - (anchor - self.view.start_time) * range / self.view.range_time;
        self.view.range_time = range;
        self.view.follow = false;
        self.clamp_start_time();
        self.columns.clear();
    }

    pub fn pan_time(&mut self, cols: i32) {
        self.view.start_time += cols as f64 * self.view.range_time / self.view.width.max(1) as f64;
        self.view.follow = false;
        self.clamp_start_time();
        self.columns.clear();
    }

    pub fn pan_note(&mut self, semitones: f64) {
        let top = MAX_NOTE - self.view.range_note;
        self.view.start_note = (self.view.start_note + semitones).clamp(0.0, top.max(0.0));
    }

    pub fn zoom_note(&mut self, factor: f64) {
        let centre = self.view.start_note + 0.5 * self.view.range_note;
        let range = (self.view.range_note * factor).clamp(MIN_RANGE_NOTE, MAX_NOTE);
        self.view.range_note = range;
        self.view.start_note = (centre - 0.5 * range).clamp(0.0, MAX_NOTE - range);
    }

    pub fn toggle_follow(&mut self) {
        self.view.follow = !self.view.follow;
    }

    pub fn set_brightness(&mut self, brightness: f32) {
        self.brightness = brightness.clamp(0.0, 100.0);
        self.textures.set_gain(brightness_to_gain(self.brightness));
    }

    pub fn adjust_brightness(&mut self, delta: f32) {
        self.set_brightness(self.brightness + delta);
    }

    pub fn adjust_tempo(&mut self, delta: f32) {
        self.tempo = (self.tempo + delta).clamp(30.0, 250.0);
    }

    /// Per-frame update: while following, glide the view so the cursor sits
    /// a fifth of the way in.
    pub fn tick(&mut self) {
        if !self.is_loaded() {
            return;
        }
        let (cursor, playing) = {
            let session = self.session.lock();
            (session.player.cursor(), session.player.is_playing())
        };
        if playing && cursor > self.view.start_time + self.view.range_time {
            self.view.follow = true;
        }
        if !self.view.follow {
            return;
        }

        let desired = cursor - self.view.range_time / 5.0;
        let gap = desired - self.view.start_time;
        let start = if gap.abs() > 4.0 * 1024.0 / self.sample_rate as f64 {
            self.view.start_time + gap * 0.2
        } else {
            desired
        };
        if start != self.view.start_time {
            self.view.start_time = start;
            self.columns.clear();
        }
    }

    // ── Drawing support ───────────────────────────────────────────

    /// Min/max of the source samples under each view column.
    pub fn waveform_columns(&mut self) -> &[(f32, f32)] {
        let width = self.view.width as usize;
        if self.columns.len() != width {
            let mut session = self.session.lock();
            let columns: Vec<(f32, f32)> = (0..width)
                .map(|x| {
                    let left = session.map.time_to_sample(self.view.col_to_time(x as f64));
                    let right = session.map.time_to_sample(self.view.col_to_time(x as f64 + 1.0));
                    self.pyramid.query(left, right)
                })
                .collect();
            drop(session);
            self.columns = columns;
        }
        &self.columns
    }

    /// Spectrogram texels for view column `col`, low frequencies first.
    pub fn spectrogram_column(&mut self, col: u16) -> &[Texel] {
        self.textures.set_view(self.view.width as u32, self.view.range_time);
        let time = self.view.col_to_time(col as f64);
        let session = &self.session;
        let handle = self
            .textures
            .get_texture(time, &self.spectra, |t| session.lock().map.time_to_sample(t));
        self.textures.backend().texels(handle)
    }

    pub fn pitch_bend_at(&self, time: f64) -> f64 {
        self.session.lock().map.time_to_pitch_bend(time)
    }

    pub fn pending_spectra(&self) -> usize {
        self.spectra.pending_jobs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SpectrumParams;
    use std::time::Duration;

    const RATE: u32 = 44100;

    fn editor() -> Editor {
        let params = Params {
            spectrum: SpectrumParams {
                fft_size: 1024,
                poll_interval: Duration::from_millis(5),
                ..SpectrumParams::default()
            },
            ..Params::default()
        };
        let session = Session::empty(RATE, &params.engine).shared();
        let mut editor = Editor::new(session, RATE, params);
        editor.set_viewport(100, 60);
        editor
    }

    fn loaded_editor() -> Editor {
        let mut editor = editor();
        let samples: Vec<f32> = (0..2 * RATE as usize)
            .map(|i| (std::f32::consts::TAU * 440.0 * i as f32 / RATE as f32).sin())
            .collect();
        editor.install(Waveform::new(samples, RATE), Vec::new());
        editor
    }

    #[test]
    fn test_view_coordinates_invert() {
        let editor = editor();
        let view = editor.view();
        assert!((view.time_to_col(view.col_to_time(37.0)) - 37.0).abs() < 1e-9);
        assert!((view.note_to_row(view.row_to_note(12.5)) - 12.5).abs() < 1e-9);
        // top row is the highest note
        assert!(view.row_to_note(0.0) > view.row_to_note(59.0));
    }

    #[test]
    fn test_click_adds_then_selects_marker() {
        let mut editor = loaded_editor();
        editor.pointer_down(10, 20);
        assert_eq!(editor.markers().len(), 1);
        assert_eq!(editor.selected, Some(0));

        // clicking the same spot selects instead of adding
        editor.selected = None;
        editor.pointer_down(10, 20);
        assert_eq!(editor.markers().len(), 1);
        assert_eq!(editor.selected, Some(0));

        let marker = editor.markers()[0];
        let expected_time = editor.view().col_to_time(10.5);
        let sample_time = marker.sample as f64 / RATE as f64;
        assert!((sample_time - expected_time).abs() < 1.0 / RATE as f64 + 1e-9);
    }

    #[test]
    fn test_drag_stretches_and_bends() {
        let mut editor = loaded_editor();
        editor.pointer_down(10, 30);
        let before = editor.duration();

        editor.pointer_drag(10, -6);
        let marker = editor.selected_marker().expect("selected");
        assert!((marker.d_time - 10.0 * 10.0 / 100.0).abs() < 1e-9);
        assert!((marker.pitch_bend - 6.0 * 60.0 / 60.0).abs() < 1e-9);
        assert!((editor.duration() - before - 1.0).abs() < 1e-6);

        editor.reset_time();
        editor.reset_bend();
        let marker = editor.selected_marker().expect("selected");
        assert_eq!((marker.d_time, marker.pitch_bend), (0.0, 0.0));
    }

    #[test]
    fn test_delete_marker() {
        let mut editor = loaded_editor();
        editor.pointer_down(10, 10);
        editor.pointer_down(60, 40);
        assert_eq!(editor.markers().len(), 2);

        editor.remove_marker_at(10, 10);
        assert_eq!(editor.markers().len(), 1);
        assert_eq!(editor.selected, None);

        editor.select_next_marker();
        editor.delete_selected();
        assert!(editor.markers().is_empty());
    }

    #[test]
    fn test_nothing_happens_without_material() {
        let mut editor = editor();
        editor.pointer_down(10, 10);
        assert!(editor.markers().is_empty());
        assert_eq!(editor.toggle_play(), PlayState::Stopped);
        assert!(editor.save_project(None).is_err());
    }

    #[test]
    fn test_project_round_trip_through_editor() {
        let mut editor = loaded_editor();
        editor.pointer_down(40, 25);
        editor.nudge_time(0.25);
        editor.set_brightness(70.0);
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("project");

        let written = editor.save_project(Some(&path)).expect("save");
        let saved_markers = editor.markers();

        let mut other = self::editor();
        other.load_project(&written).expect("load");
        assert_eq!(other.markers(), saved_markers);
        assert_eq!(other.brightness(), 70.0);
        assert_eq!(other.waveform.len(), 2 * RATE as usize);
    }

    #[test]
    fn test_failed_load_leaves_state() {
        let mut editor = loaded_editor();
        editor.pointer_down(40, 25);
        let markers = editor.markers();

        let dir = tempfile::tempdir().expect("tempdir");

        // complete project, only the version is from the future
        let mut future = editor.project_file();
        future.format_version = 99;
        future.waveform_samples.truncate(10);
        let path = dir.path().join("future.pitchwarp");
        std::fs::write(&path, serde_json::to_string(&future).expect("json")).expect("write");

        let err = editor.open(&path).expect_err("newer format must be refused");
        assert!(matches!(
            err.downcast_ref::<ProjectError>(),
            Some(ProjectError::Version { found: 99, .. })
        ));

        let garbage = dir.path().join("broken.pitchwarp");
        std::fs::write(&garbage, "{\"format_version\": 1}").expect("write");
        assert!(editor.open(&garbage).is_err());
        assert!(editor.open(Path::new("/no/such/file.wav")).is_err());

        assert_eq!(editor.markers(), markers);
        assert_eq!(editor.waveform.len(), 2 * RATE as usize);
    }

    #[test]
    fn test_export_renders_warped_length() {
        let mut editor = loaded_editor();
        editor.pointer_down(10, 30);
        editor.nudge_time(0.5);
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("export.wav");

        let written = editor.export_wav(&path).expect("export");
        let reader = hound::WavReader::open(&path).expect("open");
        assert_eq!(reader.len() as usize, written);
        // 2 s of material stretched by half a second
        assert_eq!(written, 2 * RATE as usize - 1 + RATE as usize / 2);
    }

    #[test]
    fn test_zoom_and_pan_stay_in_limits() {
        let mut editor = loaded_editor();
        for _ in 0..50 {
            editor.zoom_time(0.5);
        }
        assert!(editor.view().range_time >= MIN_RANGE_TIME);
        for _ in 0..50 {
            editor.zoom_time(2.0);
        }
        assert!(editor.view().range_time <= 10.0 + 1e-9);

        editor.pan_time(-10_000);
        assert!(editor.view().start_time >= -0.5 * editor.view().range_time - 1e-9);

        editor.zoom_note(0.1);
        assert_eq!(editor.view().range_note, MIN_RANGE_NOTE);
        editor.pan_note(1000.0);
        assert!(editor.view().start_note + editor.view().range_note <= MAX_NOTE + 1e-9);
    }

    #[test]
    fn test_waveform_columns_match_width() {
        let mut editor = loaded_editor();
        let columns = editor.waveform_columns().to_vec();
        assert_eq!(columns.len(), 100);
        // 10s window over 2s of audio: the first column has signal, the last is past the end
        assert!(columns[0].1 > 0.5);
        assert_eq!(columns[99], (0.0, 0.0));
    }

    #[test]
    fn test_follow_glides_toward_cursor() {
        let mut editor = loaded_editor();
        editor.zoom_time(0.1);
        editor.session.lock().player.set_cursor(1.5);
        editor.toggle_follow();

        let start = editor.view().start_time;
        editor.tick();
        let desired = 1.5 - editor.view().range_time / 5.0;
        let moved = editor.view().start_time;
        assert!((moved - start - (desired - start) * 0.2).abs() < 1e-9);
    }
}
