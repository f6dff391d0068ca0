use plaza_common::{Direction, Facing};
use std::str::FromStr;

/// The single movement command derived from the held keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Move { direction: Direction, fast: bool },
    Stop,
}

impl Intent {
    /// Facing to predict locally before the server confirms, if moving.
    pub fn facing(self) -> Option<Facing> {
        match self {
            Intent::Move { direction, .. } => Some(direction.facing()),
            Intent::Stop => None,
        }
    }
}

/// A change in keyboard state, already mapped from physical keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Press(Direction),
    Release(Direction),
    /// Edge of the fast-mode modifier key.
    ToggleFast,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseInputError {
    #[error("unknown direction {0:?}")]
    UnknownDirection(String),
    #[error("unrecognized input {0:?}, expected +DIR, -DIR or fast")]
    Unrecognized(String),
}

/// Text form used by the CLI: `+up` presses, `-up` releases, `fast` toggles.
impl FromStr for InputEvent {
    type Err = ParseInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "fast" {
            return Ok(InputEvent::ToggleFast);
        }
        let (press, name) = if let Some(rest) = s.strip_prefix('+') {
            (true, rest)
        } else if let Some(rest) = s.strip_prefix('-') {
            (false, rest)
        } else {
            return Err(ParseInputError::Unrecognized(s.to_owned()));
        };
        let direction =
            Direction::parse(name).ok_or_else(|| ParseInputError::UnknownDirection(name.to_owned()))?;
        Ok(if press {
            InputEvent::Press(direction)
        } else {
            InputEvent::Release(direction)
        })
    }
}

/// Set of currently held directions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeldDirections {
    held: [bool; 4],
}

impl HeldDirections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a direction held or released. Returns true if the set changed.
    pub fn set(&mut self, direction: Direction, held: bool) -> bool {
        let slot = &mut self.held[index(direction)];
        let changed = *slot != held;
        *slot = held;
        changed
    }

    pub fn is_held(&self, direction: Direction) -> bool {
        self.held[index(direction)]
    }

    pub fn is_empty(&self) -> bool {
        !self.held.iter().any(|d| *d)
    }
}

impl FromIterator<Direction> for HeldDirections {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let mut held = Self::new();
        for d in iter {
            held.set(d, true);
        }
        held
    }
}

const fn index(direction: Direction) -> usize {
    match direction {
        Direction::Up => 0,
        Direction::Down => 1,
        Direction::Left => 2,
        Direction::Right => 3,
    }
}

/// Pick the one direction to send: up, then down, then left, then right.
pub fn reduce(held: &HeldDirections) -> Option<Direction> {
    Direction::PRIORITY
        .into_iter()
        .find(|d| held.is_held(*d))
}

/// Tracks held keys and the fast-mode flag, producing intents on change.
#[derive(Debug, Clone, Default)]
pub struct IntentReducer {
    held: HeldDirections,
    fast: bool,
}

impl IntentReducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fast(&self) -> bool {
        self.fast
    }

    pub fn held(&self) -> &HeldDirections {
        &self.held
    }

    /// The intent for the current key state.
    pub fn current(&self) -> Intent {
        match reduce(&self.held) {
            Some(direction) => Intent::Move {
                direction,
                fast: self.fast,
            },
            None => Intent::Stop,
        }
    }

    /// Apply one input event. Returns the intent to send, if any.
    pub fn apply(&mut self, event: InputEvent) -> Option<Intent> {
        match event {
            InputEvent::Press(d) => self.change(d, true),
            InputEvent::Release(d) => self.change(d, false),
            InputEvent::ToggleFast => {
                self.fast = !self.fast;
                tracing::debug!(fast = self.fast, "fast mode toggled");
                // Re-send only when moving so the server sees the new pace.
                match self.current() {
                    Intent::Stop => None,
                    moving => Some(moving),
                }
            }
        }
    }

    /// Release every held key, e.g. on focus loss.
    pub fn release_all(&mut self) -> Option<Intent> {
        if self.held.is_empty() {
            return None;
        }
        self.held = HeldDirections::new();
        Some(Intent::Stop)
    }

    fn change(&mut self, direction: Direction, held: bool) -> Option<Intent> {
        if !self.held.set(direction, held) {
            return None;
        }
        Some(self.current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(direction: Direction) -> Intent {
        Intent::Move {
            direction,
            fast: false,
        }
    }

    #[test]
    fn tie_break_prefers_up_then_down() {
        let held: HeldDirections = [Direction::Up, Direction::Left].into_iter().collect();
        assert_eq!(reduce(&held), Some(Direction::Up));

        let held: HeldDirections = [Direction::Left, Direction::Down].into_iter().collect();
        assert_eq!(reduce(&held), Some(Direction::Down));

        let held: HeldDirections = [Direction::Right, Direction::Left].into_iter().collect();
        assert_eq!(reduce(&held), Some(Direction::Left));

        assert_eq!(reduce(&HeldDirections::new()), None);
    }

    #[test]
    fn held_set_tracks_each_direction() {
        let mut held = HeldDirections::new();
        assert!(held.set(Direction::Down, true));
        assert!(!held.set(Direction::Down, true));
        assert!(held.is_held(Direction::Down));
        assert!(!held.is_held(Direction::Up));
        assert!(held.set(Direction::Down, false));
        assert!(held.is_empty());
    }

    #[test]
    fn every_change_yields_one_intent() {
        let mut r = IntentReducer::new();
        assert_eq!(r.apply(InputEvent::Press(Direction::Left)), Some(mv(Direction::Left)));
        // Holding a second key still sends one message for the change.
        assert_eq!(r.apply(InputEvent::Press(Direction::Right)), Some(mv(Direction::Left)));
        assert_eq!(r.apply(InputEvent::Release(Direction::Left)), Some(mv(Direction::Right)));
        assert_eq!(r.apply(InputEvent::Release(Direction::Right)), Some(Intent::Stop));
    }

    #[test]
    fn repeated_key_state_is_silent() {
        let mut r = IntentReducer::new();
        r.apply(InputEvent::Press(Direction::Up));
        assert_eq!(r.apply(InputEvent::Press(Direction::Up)), None);
        assert_eq!(r.apply(InputEvent::Release(Direction::Down)), None);
    }

    #[test]
    fn fast_toggle_resends_only_while_moving() {
        let mut r = IntentReducer::new();
        assert_eq!(r.apply(InputEvent::ToggleFast), None);
        assert!(r.is_fast());
        assert_eq!(
            r.apply(InputEvent::Press(Direction::Down)),
            Some(Intent::Move {
                direction: Direction::Down,
                fast: true
            })
        );
        assert_eq!(r.apply(InputEvent::ToggleFast), Some(mv(Direction::Down)));
    }

    #[test]
    fn release_all_stops_once() {
        let mut r = IntentReducer::new();
        r.apply(InputEvent::Press(Direction::Up));
        assert_eq!(r.release_all(), Some(Intent::Stop));
        assert_eq!(r.release_all(), None);
    }

    #[test]
    fn intent_facing_prediction() {
        assert_eq!(mv(Direction::Left).facing(), Some(Facing::West));
        assert_eq!(mv(Direction::Up).facing(), Some(Facing::North));
        assert_eq!(Intent::Stop.facing(), None);
    }

    #[test]
    fn parse_input_lines() {
        assert_eq!("+up".parse(), Ok(InputEvent::Press(Direction::Up)));
        assert_eq!(" -left ".parse(), Ok(InputEvent::Release(Direction::Left)));
        assert_eq!("fast".parse(), Ok(InputEvent::ToggleFast));
        assert_eq!(
            "+north".parse::<InputEvent>(),
            Err(ParseInputError::UnknownDirection("north".into()))
        );
        assert!("jump".parse::<InputEvent>().is_err());
    }
}
