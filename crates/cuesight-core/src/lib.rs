pub mod scene;
pub mod settings;
pub mod variants;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use scene::{Scene, SceneError};
pub use settings::{AiSettings, Overrides};
pub use variants::{BallSpec, VariantSpec};

// --- Types (matching the UI's wire format) ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BallKind {
    White,
    Yellow,
    Red,
}

impl BallKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BallKind::White => "white",
            BallKind::Yellow => "yellow",
            BallKind::Red => "red",
        }
    }

    pub fn parse(s: &str) -> Option<BallKind> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" => Some(BallKind::White),
            "yellow" => Some(BallKind::Yellow),
            "red" => Some(BallKind::Red),
            _ => None,
        }
    }

    /// Only the players' balls can be struck; reds are always object balls.
    pub fn is_cue_capable(self) -> bool {
        matches!(self, BallKind::White | BallKind::Yellow)
    }

    pub fn default_label(self) -> &'static str {
        match self {
            BallKind::White => "White",
            BallKind::Yellow => "Yellow",
            BallKind::Red => "Red",
        }
    }
}

impl fmt::Display for BallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameVariant {
    #[default]
    ThreeCushion,
    FourBall,
}

impl GameVariant {
    pub const ALL: [GameVariant; 2] = [GameVariant::ThreeCushion, GameVariant::FourBall];

    pub fn id(self) -> &'static str {
        match self {
            GameVariant::ThreeCushion => "three_cushion",
            GameVariant::FourBall => "four_ball",
        }
    }

    pub fn spec(self) -> &'static VariantSpec {
        variants::lookup(self)
    }
}

impl fmt::Display for GameVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }
}

/// Playing surface in pixel coordinates, origin at the top-left corner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Table {
    pub width: u32,
    pub height: u32,
}

impl Table {
    pub const STANDARD: Table = Table {
        width: 800,
        height: 400,
    };

    pub fn clamp_x(&self, x: f64) -> f64 {
        clamp(x, 0.0, f64::from(self.width))
    }

    pub fn clamp_y(&self, y: f64) -> f64 {
        clamp(y, 0.0, f64::from(self.height))
    }

    /// Clamps each axis independently to its own bound.
    pub fn clamp(&self, pos: Position) -> Position {
        Position::new(self.clamp_x(pos.x), self.clamp_y(pos.y))
    }

    pub fn contains(&self, pos: Position) -> bool {
        (0.0..=f64::from(self.width)).contains(&pos.x)
            && (0.0..=f64::from(self.height)).contains(&pos.y)
    }
}

impl Default for Table {
    fn default() -> Self {
        Table::STANDARD
    }
}

// NaN collapses to the lower bound so nothing unrenderable leaves the table.
fn clamp(v: f64, min: f64, max: f64) -> f64 {
    if v.is_nan() {
        min
    } else {
        v.max(min).min(max)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct BallId(pub u32);

impl fmt::Display for BallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ball-{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ball {
    pub id: BallId,
    #[serde(rename = "type")]
    pub kind: BallKind,
    pub position: Position,
    pub label: String,
}
