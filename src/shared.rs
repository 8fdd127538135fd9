// The input plan:
//
// Transport:
//   Space         //  TogglePlay
//   Left / Right  //  CursorLeft / CursorRight (one column)
//   f             //  ToggleFollow
//
// Mouse, spectrogram area:
//   left click    //  PointerDown: select the marker under the pointer, or add one
//   left drag     //  PointerDrag: stretch time (x) and bend pitch (y) of the selection
//   right click   //  RemoveMarker under the pointer
// Mouse, waveform strip:
//   left click    //  Scrub
//
// Selected marker:
//   Tab           //  SelectNextMarker
//   [ / ]         //  NudgeTime(-0.1 or 0.1 s)
//   - / =         //  NudgeBend(-0.1 or 0.1 semitones)
//   _ / +         //  NudgeBend(-1 or 1 semitone)
//   0             //  ResetTime + ResetBend
//   x / Delete    //  DeleteSelected
//
// View:
//   h / l         //  PanTime (left / right)
//   j / k         //  PanNote (down / up)
//   z / Z         //  ZoomTime (in / out)
//   n / N         //  ZoomNote (in / out)
//   b / B         //  Brightness (down / up)
//   t / T         //  Tempo (down / up)
//
// Files:
//   s             //  Save
//   e             //  Export
//
// Quit:
//   Esc / q       //  Quit
//
// Mouse coordinates are already relative to the area they landed in and in
// editor pixels (one per column, two per terminal row).

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    // transport
    TogglePlay,
    CursorLeft,
    CursorRight,
    ToggleFollow,
    Scrub { col: u16 },

    // markers
    PointerDown { col: u16, row: u16 },
    PointerDrag { dcol: i32, drow: i32 },
    RemoveMarker { col: u16, row: u16 },
    SelectNextMarker,
    NudgeTime(f64),
    NudgeBend(f64),
    ResetMarker,
    DeleteSelected,

    // view
    PanTime(i32),
    PanNote(f64),
    ZoomTime(f64),
    ZoomNote(f64),
    Brightness(f32),
    Tempo(f32),

    // files
    Save,
    Export,

    Quit,
}
