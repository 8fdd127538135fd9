use std::time::Duration;

use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use pitchwarp::audio::{self, AudioHandle, PlayState};
use pitchwarp::audio_api::PlaybackEvent;
use pitchwarp::cli::Args;
use pitchwarp::middle::Editor;
use pitchwarp::session::Session;
use pitchwarp::shared::InputEvent;
use pitchwarp::tui;

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    let params = args.params();
    params.spectrum.validate().map_err(anyhow::Error::msg)?;

    // material is resampled to whatever the device runs at
    let want_audio = !args.no_audio && !args.is_headless();
    let sample_rate = if want_audio {
        audio::default_sample_rate().unwrap_or(args.sample_rate)
    } else {
        args.sample_rate
    };
    log::info!("session rate {sample_rate} Hz");

    let session = Session::empty(sample_rate, &params.engine).shared();
    let audio = if want_audio {
        match audio::start_audio(session.clone()) {
            Ok(handle) => {
                if handle.sample_rate() != sample_rate {
                    log::warn!("device runs at {} Hz, session at {sample_rate} Hz", handle.sample_rate());
                }
                Some(handle)
            }
            Err(e) => {
                log::warn!("running without audio: {e:#}");
                None
            }
        }
    } else {
        None
    };

    let mut editor = Editor::new(session, sample_rate, params);
    if let Some(path) = &args.file {
        let opened = editor.open(path);
        if args.is_headless() {
            opened?;
        }
    }

    if args.is_headless() {
        return run_headless(&args, &mut editor);
    }
    run_tui(&mut editor, audio.as_ref())
}

fn run_headless(args: &Args, editor: &mut Editor) -> anyhow::Result<()> {
    if !editor.is_loaded() {
        anyhow::bail!("nothing to process, pass an audio file or project");
    }
    if let Some(path) = &args.save_project {
        let written = editor.save_project(Some(path))?;
        println!("saved {}", written.display());
    }
    if let Some(path) = &args.export {
        let samples = editor.export_wav(path)?;
        println!("exported {} samples to {}", samples, path.display());
    }
    Ok(())
}

fn run_tui(editor: &mut Editor, audio: Option<&AudioHandle>) -> anyhow::Result<()> {
    terminal::enable_raw_mode()?;
    let _ = crossterm::execute!(std::io::stdout(), EnableMouseCapture);
    let _guard = RawModeGuard; // auto drops when out of scope

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let tick_rate = Duration::from_millis(16); // ~60fps
    let mut tui_state = tui::mode::TuiState::default();

    loop {
        term.draw(|frame| {
            tui::view::render(frame, frame.area(), editor, &mut tui_state);
        })?;

        let events = tui::input::poll_input(tick_rate, &mut tui_state)?;
        for event in events {
            if event == InputEvent::Quit {
                if let Some(audio) = audio {
                    audio.pause(true);
                }
                return Ok(());
            }
            handle_input(editor, audio, event);
        }

        // the callback reports end of material; pause unless play was hit again since
        while let Some(PlaybackEvent::Stopped { cursor }) = audio.and_then(AudioHandle::poll_event) {
            log::debug!("playback stopped at {cursor:.3}s");
            if !editor.is_playing() {
                if let Some(audio) = audio {
                    audio.pause(true);
                }
            }
        }

        editor.tick();
    }
}

fn handle_input(editor: &mut Editor, audio: Option<&AudioHandle>, event: InputEvent) {
    match event {
        InputEvent::TogglePlay => {
            // stopping fades out in the callback, which then reports Stopped
            if editor.toggle_play() == PlayState::Playing {
                if let Some(audio) = audio {
                    audio.pause(false);
                }
            }
        }
        InputEvent::CursorLeft => editor.cursor_left(),
        InputEvent::CursorRight => editor.cursor_right(),
        InputEvent::ToggleFollow => editor.toggle_follow(),
        InputEvent::Scrub { col } => editor.scrub(col),

        InputEvent::PointerDown { col, row } => editor.pointer_down(col, row),
        InputEvent::PointerDrag { dcol, drow } => editor.pointer_drag(dcol, drow),
        InputEvent::RemoveMarker { col, row } => editor.remove_marker_at(col, row),
        InputEvent::SelectNextMarker => editor.select_next_marker(),
        InputEvent::NudgeTime(dt) => editor.nudge_time(dt),
        InputEvent::NudgeBend(semitones) => editor.nudge_bend(semitones),
        InputEvent::ResetMarker => {
            editor.reset_time();
            editor.reset_bend();
        }
        InputEvent::DeleteSelected => editor.delete_selected(),

        InputEvent::PanTime(cols) => editor.pan_time(cols),
        InputEvent::PanNote(semitones) => editor.pan_note(semitones),
        InputEvent::ZoomTime(factor) => editor.zoom_time(factor),
        InputEvent::ZoomNote(factor) => editor.zoom_note(factor),
        InputEvent::Brightness(delta) => editor.adjust_brightness(delta),
        InputEvent::Tempo(delta) => editor.adjust_tempo(delta),

        InputEvent::Save => {
            if let Err(e) = editor.save_project(None) {
                log::error!("{e:#}");
                editor.set_status(format!("save failed: {e}"));
            }
        }
        InputEvent::Export => {
            let path = editor.default_export_path();
            if let Err(e) = editor.export_wav(&path) {
                log::error!("{e:#}");
                editor.set_status(format!("export failed: {e}"));
            }
        }

        InputEvent::Quit => {}
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::execute!(std::io::stdout(), DisableMouseCapture);
        let _ = terminal::disable_raw_mode();
    }
}
