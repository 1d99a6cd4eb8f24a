//! Event source records and line state values.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Position of one source inside the immutable registry.
///
/// This is the per-call context handed to the interrupt controller and the
/// value carried by the handoff slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceId(pub usize);

impl SourceId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for SourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque platform number of a physical input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineId(pub u32);

impl Display for LineId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "line{}", self.0)
    }
}

/// Opaque platform number of the interrupt channel bound to a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TriggerId(pub u32);

impl Display for TriggerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "irq{}", self.0)
    }
}

/// Application-level meaning of a line, using input-subsystem key numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub const UP: KeyCode = KeyCode(103);
    pub const DOWN: KeyCode = KeyCode(108);
}

impl Display for KeyCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One monitored input line and its identifying metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSource {
    /// Human-readable identifier, also used as the owner label in logs.
    pub name: &'static str,
    pub line: LineId,
    pub trigger: TriggerId,
    pub code: KeyCode,
}

impl EventSource {
    pub const fn new(name: &'static str, line: LineId, trigger: TriggerId, code: KeyCode) -> Self {
        Self {
            name,
            line,
            trigger,
            code,
        }
    }
}

/// Electrical value of a line at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineLevel {
    Low,
    High,
}

impl LineLevel {
    pub fn is_high(self) -> bool {
        matches!(self, Self::High)
    }
}

/// Button interpretation of a line level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonState {
    Pressed,
    Released,
}

impl ButtonState {
    /// Buttons are wired active-low: a pulled-up line reads high at rest.
    pub fn from_level(level: LineLevel) -> Self {
        if level.is_high() {
            Self::Released
        } else {
            Self::Pressed
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pressed => "pressed",
            Self::Released => "released",
        }
    }
}

impl Display for ButtonState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{ButtonState, KeyCode, LineLevel};

    #[test]
    fn low_level_reads_as_pressed() {
        assert_eq!(ButtonState::from_level(LineLevel::Low), ButtonState::Pressed);
        assert_eq!(
            ButtonState::from_level(LineLevel::High),
            ButtonState::Released
        );
    }

    #[test]
    fn key_codes_match_input_subsystem_numbers() {
        assert_eq!(KeyCode::UP.0, 103);
        assert_eq!(KeyCode::DOWN.0, 108);
    }
}
