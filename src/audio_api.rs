// Messages from the audio callback back to the UI thread.
// Control flows the other way through the shared session lock.

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlaybackEvent {
    // rendered a block while stopped; the stream can be paused
    Stopped { cursor: f64 },
}
