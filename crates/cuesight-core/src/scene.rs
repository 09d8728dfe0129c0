use thiserror::Error;

use crate::{variants, Ball, BallId, BallKind, GameVariant, Position, Table};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    #[error("the {variant} table holds at most {capacity} balls")]
    TableFull {
        variant: GameVariant,
        capacity: usize,
    },
    #[error("no ball with id {0}")]
    UnknownBall(BallId),
    #[error("'{0}' does not name a white or yellow ball on the table")]
    InvalidCueBall(String),
}

/// Table plus ball placement for one UI session.
///
/// Every mutation clamps positions into the table, so a ball can never sit
/// outside `[0, width] x [0, height]`.
#[derive(Debug, Clone)]
pub struct Scene {
    table: Table,
    variant: GameVariant,
    balls: Vec<Ball>,
    cue_ball: Option<BallId>,
    next_id: u32,
}

impl Scene {
    /// Fresh scene holding a copy of the variant's default layout, with the
    /// first white ball designated as cue.
    pub fn new(variant: GameVariant) -> Self {
        let mut scene = Scene::empty(variant);
        for spec in variants::lookup(variant).layout {
            scene.push(spec.kind, spec.position(), spec.label.to_string());
        }
        scene.cue_ball = scene
            .balls
            .iter()
            .find(|b| b.kind == BallKind::White)
            .map(|b| b.id);
        scene
    }

    pub fn empty(variant: GameVariant) -> Self {
        Scene {
            table: Table::STANDARD,
            variant,
            balls: Vec::new(),
            cue_ball: None,
            next_id: 1,
        }
    }

    /// Rebuild a scene from a client-supplied layout. Positions are clamped;
    /// exceeding the variant's capacity is an error. No cue ball is designated.
    pub fn restore<I>(variant: GameVariant, balls: I) -> Result<Self, SceneError>
    where
        I: IntoIterator<Item = (BallKind, Position, Option<String>)>,
    {
        let mut scene = Scene::empty(variant);
        for (kind, position, label) in balls {
            scene.place_ball(kind, position, label)?;
        }
        Ok(scene)
    }

    pub fn table(&self) -> Table {
        self.table
    }

    pub fn variant(&self) -> GameVariant {
        self.variant
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    pub fn ball(&self, id: BallId) -> Option<&Ball> {
        self.balls.iter().find(|b| b.id == id)
    }

    pub fn capacity(&self) -> usize {
        self.variant.spec().max_balls
    }

    pub fn cue_ball(&self) -> Option<&Ball> {
        self.cue_ball.and_then(|id| self.ball(id))
    }

    pub fn place_ball(
        &mut self,
        kind: BallKind,
        position: Position,
        label: Option<String>,
    ) -> Result<BallId, SceneError> {
        if self.balls.len() >= self.capacity() {
            return Err(SceneError::TableFull {
                variant: self.variant,
                capacity: self.capacity(),
            });
        }
        let label = label
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| kind.default_label().to_string());
        Ok(self.push(kind, position, label))
    }

    pub fn move_ball(&mut self, id: BallId, position: Position) -> Result<(), SceneError> {
        let table = self.table;
        let ball = self
            .balls
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(SceneError::UnknownBall(id))?;
        ball.position = table.clamp(position);
        Ok(())
    }

    /// Removing the cue ball leaves the scene without one until the user
    /// picks another.
    pub fn remove_ball(&mut self, id: BallId) -> Result<Ball, SceneError> {
        let index = self
            .balls
            .iter()
            .position(|b| b.id == id)
            .ok_or(SceneError::UnknownBall(id))?;
        if self.cue_ball == Some(id) {
            self.cue_ball = None;
        }
        Ok(self.balls.remove(index))
    }

    pub fn set_cue_ball(&mut self, id: BallId) -> Result<(), SceneError> {
        let ball = self.ball(id).ok_or(SceneError::UnknownBall(id))?;
        if !ball.kind.is_cue_capable() {
            return Err(SceneError::InvalidCueBall(ball.label.clone()));
        }
        self.cue_ball = Some(id);
        Ok(())
    }

    /// Designate the cue ball by the identifier the UI sends: a ball type
    /// ("white", "yellow") picks the first ball of that type, otherwise the
    /// identifier is matched against labels.
    pub fn designate_cue(&mut self, ident: &str) -> Result<BallId, SceneError> {
        let by_kind = BallKind::parse(ident)
            .and_then(|kind| self.balls.iter().find(|b| b.kind == kind));
        let ball = by_kind
            .or_else(|| self.balls.iter().find(|b| b.label == ident))
            .or_else(|| {
                self.balls
                    .iter()
                    .find(|b| b.label.eq_ignore_ascii_case(ident.trim()))
            })
            .filter(|b| b.kind.is_cue_capable())
            .ok_or_else(|| SceneError::InvalidCueBall(ident.to_string()))?;
        let id = ball.id;
        self.cue_ball = Some(id);
        Ok(id)
    }

    fn push(&mut self, kind: BallKind, position: Position, label: String) -> BallId {
        let id = BallId(self.next_id);
        self.next_id += 1;
        self.balls.push(Ball {
            id,
            kind,
            position: self.table.clamp(position),
            label,
        });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_scene_copies_the_variant_layout() {
        let scene = Scene::new(GameVariant::FourBall);
        assert_eq!(scene.balls().len(), 4);
        assert_eq!(scene.cue_ball().map(|b| b.kind), Some(BallKind::White));
        assert_eq!(scene.balls()[3].label, "Red 2");
        assert_eq!(scene.balls()[3].position, Position::new(450.0, 250.0));
    }

    #[test]
    fn placement_and_moves_stay_on_the_table() {
        let mut scene = Scene::empty(GameVariant::ThreeCushion);
        let id = scene
            .place_ball(BallKind::Red, Position::new(-20.0, 900.0), None)
            .unwrap();
        assert_eq!(scene.ball(id).unwrap().position, Position::new(0.0, 400.0));
        assert_eq!(scene.ball(id).unwrap().label, "Red");

        scene.move_ball(id, Position::new(1000.0, 120.5)).unwrap();
        assert_eq!(scene.ball(id).unwrap().position, Position::new(800.0, 120.5));
    }

    #[test]
    fn capacity_is_enforced() {
        let mut scene = Scene::new(GameVariant::ThreeCushion);
        let err = scene
            .place_ball(BallKind::Red, Position::new(10.0, 10.0), None)
            .unwrap_err();
        assert_eq!(
            err,
            SceneError::TableFull {
                variant: GameVariant::ThreeCushion,
                capacity: 3
            }
        );
    }

    #[test]
    fn removing_the_cue_ball_clears_the_designation() {
        let mut scene = Scene::new(GameVariant::ThreeCushion);
        let cue = scene.cue_ball().unwrap().id;
        let removed = scene.remove_ball(cue).unwrap();
        assert_eq!(removed.kind, BallKind::White);
        assert!(scene.cue_ball().is_none());
        assert_eq!(scene.remove_ball(cue), Err(SceneError::UnknownBall(cue)));
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let mut scene = Scene::new(GameVariant::ThreeCushion);
        let last = scene.balls()[2].id;
        scene.remove_ball(last).unwrap();
        let id = scene
            .place_ball(BallKind::Red, Position::new(1.0, 1.0), None)
            .unwrap();
        assert_ne!(id, last);
    }

    #[test]
    fn designate_cue_by_kind_then_label() {
        let mut scene = Scene::new(GameVariant::ThreeCushion);
        let yellow = scene.designate_cue("yellow").unwrap();
        assert_eq!(scene.ball(yellow).unwrap().kind, BallKind::Yellow);

        let white = scene.designate_cue("White").unwrap();
        assert_eq!(scene.cue_ball().unwrap().id, white);
    }

    #[test]
    fn red_or_missing_balls_cannot_be_cue() {
        let mut scene = Scene::new(GameVariant::FourBall);
        assert_eq!(
            scene.designate_cue("red"),
            Err(SceneError::InvalidCueBall("red".into()))
        );
        assert!(scene.designate_cue("Red 1").is_err());
        assert!(scene.designate_cue("green").is_err());

        let red = scene.balls()[2].id;
        assert!(matches!(
            scene.set_cue_ball(red),
            Err(SceneError::InvalidCueBall(_))
        ));
        // a failed designation keeps the previous cue ball
        assert_eq!(scene.cue_ball().map(|b| b.kind), Some(BallKind::White));
    }

    #[test]
    fn restore_rejects_overfull_layouts() {
        let five = (0..5).map(|i| (BallKind::Red, Position::new(f64::from(i) * 10.0, 5.0), None));
        assert!(matches!(
            Scene::restore(GameVariant::FourBall, five),
            Err(SceneError::TableFull { capacity: 4, .. })
        ));
    }
}
