//! Connections between the edges of two maps.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::registry::{DataKind, Entity};

/// A map edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// Accepts `N`, `North` (any case) or the numpad digits `8/6/2/4`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "N" | "NORTH" | "8" => Some(Direction::North),
            "E" | "EAST" | "6" => Some(Direction::East),
            "S" | "SOUTH" | "2" => Some(Direction::South),
            "W" | "WEST" | "4" => Some(Direction::West),
            _ => None,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// Single letter form used when writing.
    pub fn letter(self) -> &'static str {
        match self {
            Direction::North => "N",
            Direction::East => "E",
            Direction::South => "S",
            Direction::West => "W",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::North => "North",
            Direction::East => "East",
            Direction::South => "South",
            Direction::West => "West",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Two maps joined along opposite edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapConnection {
    /// Position in the source file.
    pub index: u32,
    pub map1: u32,
    pub edge1: Direction,
    pub offset1: i32,
    pub map2: u32,
    pub edge2: Direction,
    pub offset2: i32,
}

impl Entity for MapConnection {
    type Key = u32;
    const KIND: DataKind = DataKind::MapConnection;

    fn key(&self) -> u32 {
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parse() {
        assert_eq!(Direction::parse("n"), Some(Direction::North));
        assert_eq!(Direction::parse("West"), Some(Direction::West));
        assert_eq!(Direction::parse("2"), Some(Direction::South));
        assert_eq!(Direction::parse("up"), None);
        assert_eq!(Direction::East.opposite(), Direction::West);
    }
}
