//! Movement Input
//!
//! Directional intents sent by clients. An intent is a request only;
//! the world decides how much of it is applied.

use serde::{Serialize, Deserialize};

/// Which arrow keys are held this frame.
///
/// All four fields are required on the wire; a payload missing one is
/// rejected by the decoder rather than defaulted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementIntent {
    /// Move toward `y = 0`
    pub up: bool,
    /// Move toward the bottom edge
    pub down: bool,
    /// Move toward `x = 0`
    pub left: bool,
    /// Move toward the right edge
    pub right: bool,
}

impl MovementIntent {
    /// No keys held.
    pub const IDLE: Self = Self {
        up: false,
        down: false,
        left: false,
        right: false,
    };

    /// Check if no direction is requested.
    #[inline]
    pub fn is_idle(&self) -> bool {
        *self == Self::IDLE
    }

    /// Per-axis steps in application order: up, down, left, right.
    ///
    /// Each step is checked against the arena on its own, so opposing
    /// keys cancel only when both steps are accepted.
    pub fn steps(self, speed: f64) -> impl Iterator<Item = (f64, f64)> {
        [
            (self.up, (0.0, -speed)),
            (self.down, (0.0, speed)),
            (self.left, (-speed, 0.0)),
            (self.right, (speed, 0.0)),
        ]
        .into_iter()
        .filter_map(|(held, delta)| held.then_some(delta))
    }
}
