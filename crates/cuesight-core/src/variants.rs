//! Built-in game variants: default layout and table theme for each.

use serde::Serialize;

use crate::{BallKind, GameVariant, Position};

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct BallSpec {
    #[serde(rename = "type")]
    pub kind: BallKind,
    pub label: &'static str,
    pub x: f64,
    pub y: f64,
}

impl BallSpec {
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantSpec {
    pub id: GameVariant,
    pub name: &'static str,
    pub table_color: &'static str,
    pub max_balls: usize,
    /// One-line scoring rule, quoted in the analysis prompt.
    pub rules: &'static str,
    #[serde(rename = "balls")]
    pub layout: &'static [BallSpec],
}

static THREE_CUSHION: VariantSpec = VariantSpec {
    id: GameVariant::ThreeCushion,
    name: "3-Cushion",
    table_color: "#1a472a",
    max_balls: 3,
    rules: "The cue ball must contact both object balls and touch at least three cushions \
before it contacts the second object ball.",
    layout: &[
        BallSpec { kind: BallKind::White, label: "White", x: 200.0, y: 200.0 },
        BallSpec { kind: BallKind::Yellow, label: "Yellow", x: 600.0, y: 200.0 },
        BallSpec { kind: BallKind::Red, label: "Red", x: 400.0, y: 200.0 },
    ],
};

static FOUR_BALL: VariantSpec = VariantSpec {
    id: GameVariant::FourBall,
    name: "4-Ball",
    table_color: "#003366",
    max_balls: 4,
    rules: "The cue ball must contact both red balls without touching the opponent's ball.",
    layout: &[
        BallSpec { kind: BallKind::White, label: "White", x: 200.0, y: 200.0 },
        BallSpec { kind: BallKind::Yellow, label: "Yellow", x: 600.0, y: 200.0 },
        BallSpec { kind: BallKind::Red, label: "Red 1", x: 350.0, y: 150.0 },
        BallSpec { kind: BallKind::Red, label: "Red 2", x: 450.0, y: 250.0 },
    ],
};

pub fn lookup(variant: GameVariant) -> &'static VariantSpec {
    match variant {
        GameVariant::ThreeCushion => &THREE_CUSHION,
        GameVariant::FourBall => &FOUR_BALL,
    }
}

pub fn all() -> impl Iterator<Item = &'static VariantSpec> {
    GameVariant::ALL.into_iter().map(lookup)
}
