use crate::middle::{Editor, MarkerGlyph, ViewState};
use crate::spectrum::Texel;
use super::mode::TuiState;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

const WAVEFORM_ROWS: u16 = 5;
const HELP: &str = "space play  click add/select  drag stretch/bend  [ ] time  - = bend  0 reset  x delete  h/l j/k pan  z/Z n/N zoom  s save  e export  q quit";

pub fn render(frame: &mut Frame, area: Rect, editor: &mut Editor, ts: &mut TuiState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status
            Constraint::Length(WAVEFORM_ROWS),
            Constraint::Min(4), // spectrogram
            Constraint::Length(1), // help
        ])
        .split(area);

    ts.waveform_area = sections[1];
    ts.spectrum_area = sections[2];
    editor.set_viewport(sections[2].width, sections[2].height * 2);

    draw_status(frame, sections[0], editor);
    draw_waveform(frame, sections[1], editor);
    draw_spectrogram(frame, sections[2], editor);
    draw_markers(frame, sections[2], &editor.marker_glyphs());
    draw_cursor(frame, sections[1], sections[2], editor);
    frame.render_widget(
        Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray)),
        sections[3],
    );
}

fn draw_status(frame: &mut Frame, area: Rect, editor: &Editor) {
    let transport = if editor.is_playing() { "▶" } else { "■" };
    let mut spans = vec![
        Span::styled(editor.title(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(
            "  {} {:.2}/{:.2}s  bri {:.0}  {:.0} bpm",
            transport,
            editor.cursor(),
            editor.duration(),
            editor.brightness(),
            editor.tempo(),
        )),
    ];
    if editor.view().follow {
        spans.push(Span::styled("  follow", Style::default().fg(Color::Green)));
    }
    if let Some(m) = editor.selected_marker() {
        spans.push(Span::styled(
            format!("  marker dt {:+.2}s bend {:+.2}", m.d_time, m.pitch_bend),
            Style::default().fg(Color::Yellow),
        ));
    }
    let pending = editor.pending_spectra();
    if pending > 0 {
        spans.push(Span::styled(format!("  fft {}", pending), Style::default().fg(Color::DarkGray)));
    }
    spans.push(Span::raw(format!("  {}", editor.status())));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_waveform(frame: &mut Frame, area: Rect, editor: &mut Editor) {
    let columns = editor.waveform_columns().to_vec();
    let buf = frame.buffer_mut();
    let rows = area.height as f32;
    for (x, &(lo, hi)) in columns.iter().enumerate().take(area.width as usize) {
        for y in 0..area.height {
            // the amplitude band this cell covers, top row = +1
            let top = 1.0 - 2.0 * y as f32 / rows;
            let bottom = 1.0 - 2.0 * (y + 1) as f32 / rows;
            if hi < bottom || lo > top {
                continue;
            }
            if let Some(cell) = buf.cell_mut((area.x + x as u16, area.y + y)) {
                cell.set_char('█').set_fg(Color::Cyan);
            }
        }
    }
}

fn draw_spectrogram(frame: &mut Frame, area: Rect, editor: &mut Editor) {
    let view = editor.view().clone();
    let sample_rate = editor.sample_rate();
    let tempo = editor.tempo();
    for x in 0..area.width {
        let time = view.col_to_time(x as f64);
        let bend = editor.pitch_bend_at(time);
        let tint = beat_tint(&view, tempo, x);
        let texels = editor.spectrogram_column(x);
        let buf = frame.buffer_mut();
        for y in 0..area.height {
            let upper = texel_at(texels, &view, sample_rate, (2 * y) as f64, bend);
            let lower = texel_at(texels, &view, sample_rate, (2 * y + 1) as f64, bend);
            if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
                cell.set_char('▀')
                    .set_fg(to_color(upper, tint))
                    .set_bg(to_color(lower, tint));
            }
        }
    }
}

// the texel shown at pixel row `row`, undoing the local pitch bend
fn texel_at(texels: &[Texel], view: &ViewState, sample_rate: u32, row: f64, bend: f64) -> Texel {
    let freq = note_to_freq(view.row_to_note(row) - bend);
    let nyquist = sample_rate as f64 / 2.0;
    let idx = (freq / nyquist * texels.len() as f64) as usize;
    texels.get(idx).copied().unwrap_or([0, 0, 0])
}

pub fn note_to_freq(note: f64) -> f64 {
    55.0 * 2f64.powf((note - 24.0) / 12.0)
}

// 0 off the grid, 1 on a beat, 2 on a bar line
fn beat_tint(view: &ViewState, tempo: f32, col: u16) -> u8 {
    let beat = 60.0 / tempo.max(1.0) as f64;
    let t0 = view.col_to_time(col as f64);
    let t1 = view.col_to_time(col as f64 + 1.0);
    let first = (t0 / beat).ceil() as i64;
    if first as f64 * beat >= t1 {
        return 0;
    }
    if first.rem_euclid(4) == 0 { 2 } else { 1 }
}

fn to_color(texel: Texel, tint: u8) -> Color {
    let [r, g, b] = texel;
    let add = 18 * tint;
    Color::Rgb(r.saturating_add(add / 2), g.saturating_add(add / 2), b.saturating_add(add))
}

fn draw_markers(frame: &mut Frame, area: Rect, glyphs: &[MarkerGlyph]) {
    let buf = frame.buffer_mut();
    let mut put = |col: f64, row: f64, ch: char, color: Color| {
        if col < 0.0 || row < 0.0 {
            return;
        }
        let (x, y) = (col as u16, (row / 2.0) as u16);
        if x >= area.width || y >= area.height {
            return;
        }
        if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
            cell.set_char(ch).set_fg(color);
        }
    };

    for g in glyphs {
        let color = if g.selected { Color::LightRed } else { Color::Yellow };
        // stem from the unwarped position
        let steps = ((g.col - g.from_col).abs().max((g.row - g.from_row).abs() / 2.0)).ceil() as usize;
        for i in 1..steps {
            let f = i as f64 / steps as f64;
            put(
                g.from_col + (g.col - g.from_col) * f,
                g.from_row + (g.row - g.from_row) * f,
                '·',
                Color::Gray,
            );
        }
        if steps > 0 {
            put(g.from_col, g.from_row, '○', Color::Gray);
        }
        put(g.col, g.row, '●', color);
    }
}

fn draw_cursor(frame: &mut Frame, waveform: Rect, spectrum: Rect, editor: &Editor) {
    let col = editor.view().time_to_col(editor.cursor());
    if col < 0.0 || col >= spectrum.width as f64 {
        return;
    }
    let buf = frame.buffer_mut();
    for area in [waveform, spectrum] {
        for y in area.y..area.y + area.height {
            if let Some(cell) = buf.cell_mut((area.x + col as u16, y)) {
                cell.set_char('│').set_fg(Color::White);
            }
        }
    }
}
