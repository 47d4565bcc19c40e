//! Face direction and axis types.

use serde::{Deserialize, Serialize};

/// A cardinal face of a model element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Down,
    Up,
    North,
    South,
    West,
    East,
}

impl Direction {
    /// Parse a face name (case-insensitive). Non-cardinal names such as
    /// "side" or "top" return None.
    pub fn from_name(s: &str) -> Option<Self> {
        let direction = match s.to_ascii_lowercase().as_str() {
            "down" | "bottom" => Direction::Down,
            "up" => Direction::Up,
            "north" => Direction::North,
            "south" => Direction::South,
            "west" => Direction::West,
            "east" => Direction::East,
            _ => return None,
        };
        Some(direction)
    }

    /// Face UV `[u1, v1, u2, v2]` in 0-16 space for an element spanning
    /// `from`..`to`, used when the face declares none.
    pub fn default_uv(&self, from: [f32; 3], to: [f32; 3]) -> [f32; 4] {
        const MAX: f32 = 16.0;
        match self {
            Direction::North => [to[0], MAX - to[1], from[0], MAX - from[1]],
            Direction::South => [from[0], MAX - to[1], to[0], MAX - from[1]],
            Direction::East | Direction::West => [from[2], MAX - to[1], to[2], MAX - from[1]],
            Direction::Up => [from[0], from[2], to[0], to[2]],
            Direction::Down => [to[0], from[2], from[0], to[2]],
        }
    }
}

/// Rotation axis of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}
