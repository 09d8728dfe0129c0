use cuesight_core::{GameVariant, Scene};

use crate::{analyze, build_request, AnalysisError, AnalysisResult, Generate};

/// Per-user state: the scene being edited and the latest analysis overlay.
///
/// `analyze` borrows the session mutably, so one session never has two model
/// calls in flight.
#[derive(Debug, Clone)]
pub struct Session {
    scene: Scene,
    analysis: Option<AnalysisResult>,
}

impl Session {
    pub fn new(variant: GameVariant) -> Self {
        Session::with_scene(Scene::new(variant))
    }

    pub fn with_scene(scene: Scene) -> Self {
        Session {
            scene,
            analysis: None,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.analysis.as_ref()
    }

    /// Replace the scene with the variant's default layout and drop the overlay.
    pub fn select_variant(&mut self, variant: GameVariant) {
        self.scene = Scene::new(variant);
        self.analysis = None;
    }

    /// Analyze the current scene. The previous overlay is replaced either by
    /// the new result or by a failure placeholder; the scene is untouched.
    pub async fn analyze<G>(&mut self, generator: &G) -> Result<&AnalysisResult, AnalysisError>
    where
        G: Generate + ?Sized,
    {
        let table = self.scene.table();
        let outcome = match build_request(&self.scene) {
            Ok(request) => analyze(&request, table, generator).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(result) => Ok(&*self.analysis.insert(result)),
            Err(e) => {
                tracing::warn!(kind = e.kind(), "analysis failed: {e}");
                self.analysis = Some(AnalysisResult::failed(&e));
                Err(e)
            }
        }
    }
}
