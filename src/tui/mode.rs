use ratatui::layout::Rect;

// state local to tui: where things were drawn last frame, so mouse
// positions can be resolved into editor coordinates, plus the drag in progress
#[derive(Clone, Debug, Default)]
pub struct TuiState {
    // synced from the view every frame
    pub waveform_area: Rect,
    pub spectrum_area: Rect,
    // last pointer position while the left button is held (editor pixels)
    pub drag_from: Option<(u16, u16)>,
}

impl TuiState {
    // terminal cell -> spectrogram pixel, None outside the area
    pub fn spectrum_pixel(&self, column: u16, row: u16) -> Option<(u16, u16)> {
        let area = self.spectrum_area;
        if column < area.x || column >= area.x + area.width || row < area.y || row >= area.y + area.height {
            return None;
        }
        // each cell holds two pixel rows; aim at the centre
        Some((column - area.x, (row - area.y) * 2 + 1))
    }

    pub fn waveform_column(&self, column: u16, row: u16) -> Option<u16> {
        let area = self.waveform_area;
        if column < area.x || column >= area.x + area.width || row < area.y || row >= area.y + area.height {
            return None;
        }
        Some(column - area.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixels_relative_to_area() {
        let state = TuiState {
            waveform_area: Rect::new(0, 1, 80, 5),
            spectrum_area: Rect::new(2, 6, 78, 20),
            drag_from: None,
        };
        assert_eq!(state.spectrum_pixel(2, 6), Some((0, 1)));
        assert_eq!(state.spectrum_pixel(10, 8), Some((8, 5)));
        assert_eq!(state.spectrum_pixel(1, 8), None);
        assert_eq!(state.spectrum_pixel(10, 26), None);
        assert_eq!(state.waveform_column(5, 3), Some(5));
        assert_eq!(state.waveform_column(5, 6), None);
    }
}
