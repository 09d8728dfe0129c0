use serde::Deserialize;

use cuesight_core::{Ball, BallKind, GameVariant, Position, Scene};

use crate::{AnalysisError, AnalysisRequest, BallDescriptor};

/// Body of `POST /api/analyze`, as sent by the UI.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzePayload {
    pub cue_ball: String,
    pub game_type: GameVariant,
    #[serde(default)]
    pub balls: Vec<BallInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BallInput {
    #[serde(rename = "type")]
    pub kind: BallKind,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub label: Option<String>,
}

impl AnalyzePayload {
    /// Rebuild the client's scene and designate its cue ball.
    pub fn into_scene(self) -> Result<Scene, AnalysisError> {
        let balls = self
            .balls
            .into_iter()
            .map(|b| (b.kind, Position::new(b.x, b.y), b.label));
        let mut scene = Scene::restore(self.game_type, balls)?;
        scene.designate_cue(&self.cue_ball)?;
        Ok(scene)
    }
}

/// Snapshot the scene for the model, rounding every coordinate.
pub fn build_request(scene: &Scene) -> Result<AnalysisRequest, AnalysisError> {
    let cue = scene
        .cue_ball()
        .ok_or_else(|| AnalysisError::InvalidCueBall("no cue ball selected".into()))?;
    if !cue.kind.is_cue_capable() {
        return Err(AnalysisError::InvalidCueBall(cue.label.clone()));
    }

    Ok(AnalysisRequest {
        cue_ball: describe(cue),
        game_type: scene.variant(),
        balls: scene.balls().iter().map(describe).collect(),
    })
}

fn describe(ball: &Ball) -> BallDescriptor {
    BallDescriptor {
        kind: ball.kind,
        x: ball.position.x.round() as i64,
        y: ball.position.y.round() as i64,
        label: ball.label.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_coordinates_to_nearest_integer() {
        let mut scene = Scene::empty(GameVariant::ThreeCushion);
        let white = scene
            .place_ball(BallKind::White, Position::new(199.6, 200.4), None)
            .unwrap();
        scene
            .place_ball(BallKind::Red, Position::new(10.5, 0.49), Some("Red".into()))
            .unwrap();
        scene.set_cue_ball(white).unwrap();

        let request = build_request(&scene).unwrap();
        assert_eq!(
            request.cue_ball,
            BallDescriptor {
                kind: BallKind::White,
                x: 200,
                y: 200,
                label: "White".into()
            }
        );
        assert_eq!((request.balls[1].x, request.balls[1].y), (11, 0));
        assert_eq!(request.game_type, GameVariant::ThreeCushion);
    }

    #[test]
    fn preserves_ball_order() {
        let scene = Scene::new(GameVariant::FourBall);
        let request = build_request(&scene).unwrap();
        let labels: Vec<&str> = request.balls.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, ["White", "Yellow", "Red 1", "Red 2"]);
    }

    #[test]
    fn rejects_scene_without_cue_ball() {
        let mut scene = Scene::new(GameVariant::ThreeCushion);
        let cue = scene.cue_ball().unwrap().id;
        scene.remove_ball(cue).unwrap();
        assert!(matches!(
            build_request(&scene),
            Err(AnalysisError::InvalidCueBall(_))
        ));
    }

    #[test]
    fn payload_becomes_scene_with_designated_cue() {
        let payload: AnalyzePayload = serde_json::from_value(serde_json::json!({
            "cueBall": "yellow",
            "gameType": "four_ball",
            "balls": [
                {"type": "white", "x": 200, "y": 200, "label": "White"},
                {"type": "yellow", "x": 900.2, "y": 200, "label": "Yellow"},
                {"type": "red", "x": 350, "y": 150, "label": "Red 1"}
            ]
        }))
        .unwrap();

        let scene = payload.into_scene().unwrap();
        let cue = scene.cue_ball().unwrap();
        assert_eq!(cue.kind, BallKind::Yellow);
        assert_eq!(cue.position, Position::new(800.0, 200.0));
        assert_eq!(scene.variant(), GameVariant::FourBall);
    }

    #[test]
    fn payload_with_unknown_cue_is_rejected() {
        let payload: AnalyzePayload = serde_json::from_value(serde_json::json!({
            "cueBall": "yellow",
            "gameType": "three_cushion",
            "balls": [{"type": "white", "x": 1, "y": 1, "label": "White"}]
        }))
        .unwrap();
        assert_eq!(
            payload.into_scene().unwrap_err(),
            AnalysisError::InvalidCueBall("yellow".into())
        );
    }

    #[test]
    fn payload_over_capacity_is_invalid_scene() {
        let balls: Vec<_> = (0..4)
            .map(|i| serde_json::json!({"type": "red", "x": i * 10, "y": 5}))
            .collect();
        let payload: AnalyzePayload = serde_json::from_value(serde_json::json!({
            "cueBall": "white",
            "gameType": "three_cushion",
            "balls": balls
        }))
        .unwrap();
        assert!(matches!(
            payload.into_scene(),
            Err(AnalysisError::InvalidScene(_))
        ));
    }
}
