/// Events emitted by the controller during input processing and updates.
/// The presentation layer consumes these for sound and logging.

use crate::sim::controller::GameMode;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    ModeChanged { from: GameMode, to: GameMode },
    ImageChanged { index: usize },
    RevealStarted,
    RevealPaused,
    RevealRestarted,
    RevealCompleted,
    DurationChanged { secs: f32 },
}
