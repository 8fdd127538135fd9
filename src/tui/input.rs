use std::time::Duration;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use crate::shared::InputEvent;
use super::mode::TuiState;

const TIME_STEP: f64 = 0.1; // seconds per [ ]
const BEND_STEP: f64 = 0.1; // semitones per - =
const PAN_COLS: i32 = 8;
const ZOOM_STEP: f64 = 1.25;

// poll for input from tui, resolves keys and mouse gestures
// into semantic input events for the editor to handle
pub fn poll_input(timeout: Duration, ts: &mut TuiState) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => Ok(handle_key(key.code)),
        Event::Mouse(mouse) => Ok(handle_mouse(mouse, ts)),
        _ => Ok(vec![]),
    }
}

fn handle_key(code: KeyCode) -> Vec<InputEvent> {
    match code {
        KeyCode::Esc | KeyCode::Char('q') => vec![InputEvent::Quit],
        KeyCode::Char(' ') => vec![InputEvent::TogglePlay],
        KeyCode::Left => vec![InputEvent::CursorLeft],
        KeyCode::Right => vec![InputEvent::CursorRight],
        KeyCode::Char('f') => vec![InputEvent::ToggleFollow],

        // selected marker
        KeyCode::Tab => vec![InputEvent::SelectNextMarker],
        KeyCode::Char('[') => vec![InputEvent::NudgeTime(-TIME_STEP)],
        KeyCode::Char(']') => vec![InputEvent::NudgeTime(TIME_STEP)],
        KeyCode::Char('-') => vec![InputEvent::NudgeBend(-BEND_STEP)],
        KeyCode::Char('=') => vec![InputEvent::NudgeBend(BEND_STEP)],
        KeyCode::Char('_') => vec![InputEvent::NudgeBend(-1.0)],
        KeyCode::Char('+') => vec![InputEvent::NudgeBend(1.0)],
        KeyCode::Char('0') => vec![InputEvent::ResetMarker],
        KeyCode::Char('x') | KeyCode::Delete => vec![InputEvent::DeleteSelected],

        // view, lowercase = down/in and shifted = up/out
        KeyCode::Char('h') => vec![InputEvent::PanTime(-PAN_COLS)],
        KeyCode::Char('l') => vec![InputEvent::PanTime(PAN_COLS)],
        KeyCode::Char('j') => vec![InputEvent::PanNote(-1.0)],
        KeyCode::Char('k') => vec![InputEvent::PanNote(1.0)],
        KeyCode::Char('z') => vec![InputEvent::ZoomTime(1.0 / ZOOM_STEP)],
        KeyCode::Char('Z') => vec![InputEvent::ZoomTime(ZOOM_STEP)],
        KeyCode::Char('n') => vec![InputEvent::ZoomNote(1.0 / ZOOM_STEP)],
        KeyCode::Char('N') => vec![InputEvent::ZoomNote(ZOOM_STEP)],
        KeyCode::Char('b') => vec![InputEvent::Brightness(-2.0)],
        KeyCode::Char('B') => vec![InputEvent::Brightness(2.0)],
        KeyCode::Char('t') => vec![InputEvent::Tempo(-1.0)],
        KeyCode::Char('T') => vec![InputEvent::Tempo(1.0)],

        KeyCode::Char('s') => vec![InputEvent::Save],
        KeyCode::Char('e') => vec![InputEvent::Export],

        _ => vec![],
    }
}

// resolve mouse gestures against last frame's layout
fn handle_mouse(mouse: MouseEvent, ts: &mut TuiState) -> Vec<InputEvent> {
    let (column, row) = (mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(col) = ts.waveform_column(column, row) {
                return vec![InputEvent::Scrub { col }];
            }
            match ts.spectrum_pixel(column, row) {
                Some((col, row)) => {
                    ts.drag_from = Some((col, row));
                    vec![InputEvent::PointerDown { col, row }]
                }
                None => vec![],
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            if let Some(col) = ts.waveform_column(column, row) {
                return vec![InputEvent::Scrub { col }];
            }
            let (Some(from), Some(to)) = (ts.drag_from, ts.spectrum_pixel(column, row)) else {
                return vec![];
            };
            ts.drag_from = Some(to);
            let dcol = to.0 as i32 - from.0 as i32;
            let drow = to.1 as i32 - from.1 as i32;
            if dcol == 0 && drow == 0 {
                return vec![];
            }
            vec![InputEvent::PointerDrag { dcol, drow }]
        }
        MouseEventKind::Up(MouseButton::Left) => {
            ts.drag_from = None;
            vec![]
        }
        MouseEventKind::Down(MouseButton::Right) => match ts.spectrum_pixel(column, row) {
            Some((col, row)) => vec![InputEvent::RemoveMarker { col, row }],
            None => vec![],
        },
        MouseEventKind::ScrollUp => vec![InputEvent::ZoomTime(1.0 / ZOOM_STEP)],
        MouseEventKind::ScrollDown => vec![InputEvent::ZoomTime(ZOOM_STEP)],
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use ratatui::layout::Rect;

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn layout() -> TuiState {
        TuiState {
            waveform_area: Rect::new(0, 1, 80, 4),
            spectrum_area: Rect::new(0, 5, 80, 20),
            drag_from: None,
        }
    }

    #[test]
    fn test_keys() {
        assert_eq!(handle_key(KeyCode::Char(' ')), vec![InputEvent::TogglePlay]);
        assert_eq!(handle_key(KeyCode::Char(']')), vec![InputEvent::NudgeTime(TIME_STEP)]);
        assert_eq!(handle_key(KeyCode::Char('?')), vec![]);
    }

    #[test]
    fn test_click_and_drag() {
        let mut ts = layout();
        let down = handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 10, 6), &mut ts);
        assert_eq!(down, vec![InputEvent::PointerDown { col: 10, row: 3 }]);

        let drag = handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 13, 5), &mut ts);
        assert_eq!(drag, vec![InputEvent::PointerDrag { dcol: 3, drow: -2 }]);

        handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 13, 5), &mut ts);
        assert_eq!(ts.drag_from, None);
    }

    #[test]
    fn test_waveform_click_scrubs() {
        let mut ts = layout();
        let events = handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 42, 2), &mut ts);
        assert_eq!(events, vec![InputEvent::Scrub { col: 42 }]);
        assert_eq!(ts.drag_from, None);
    }
}
