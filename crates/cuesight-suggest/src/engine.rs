use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::ChatMessage;
use tokio::sync::RwLock;

use cuesight_core::{AiSettings, Overrides};

use crate::{AnalysisError, Generate, Prompt};

fn map_backend(provider: &str) -> Result<LLMBackend, String> {
    match provider {
        "openai" => Ok(LLMBackend::OpenAI),
        "anthropic" => Ok(LLMBackend::Anthropic),
        "google" => Ok(LLMBackend::Google),
        "ollama" => Ok(LLMBackend::Ollama),
        "groq" => Ok(LLMBackend::Groq),
        "mistral" => Ok(LLMBackend::Mistral),
        "deepseek" => Ok(LLMBackend::DeepSeek),
        other => Err(format!("unknown provider: {other}")),
    }
}

/// One chat turn against the configured provider: the coaching preamble as
/// the system prompt, the scene as the user message.
pub async fn generate(settings: &AiSettings, prompt: &Prompt) -> Result<String, String> {
    let backend = map_backend(&settings.provider)?;

    let mut builder = LLMBuilder::new()
        .backend(backend)
        .model(&settings.model)
        .system(&prompt.system);

    if !settings.api_key.is_empty() {
        builder = builder.api_key(&settings.api_key);
    }

    let llm = builder
        .build()
        .map_err(|e| format!("build {} client: {e}", settings.provider))?;

    let messages = vec![ChatMessage::user().content(&prompt.user).build()];

    let reply = llm
        .chat(&messages)
        .await
        .map_err(|e| format!("{} chat: {e}", settings.provider))?;

    match reply.text() {
        Some(text) if !text.trim().is_empty() => Ok(text),
        Some(_) => Err("model returned an empty reply".to_string()),
        None => Err("model returned no text".to_string()),
    }
}

/// A single provider call with fixed settings.
struct Provider(AiSettings);

#[async_trait]
impl Generate for Provider {
    async fn generate(&self, prompt: &Prompt) -> Result<String, AnalysisError> {
        generate(&self.0, prompt).await.map_err(|e| {
            tracing::error!("model call failed: {e}");
            AnalysisError::TransportFailure(e)
        })
    }
}

/// Bounds any generator by a deadline; running out of time is a
/// `TransportFailure`. There is no retry.
pub struct Timeout<G> {
    inner: G,
    limit: Duration,
}

impl<G> Timeout<G> {
    pub fn new(inner: G, limit: Duration) -> Self {
        Timeout { inner, limit }
    }
}

#[async_trait]
impl<G: Generate> Generate for Timeout<G> {
    async fn generate(&self, prompt: &Prompt) -> Result<String, AnalysisError> {
        match tokio::time::timeout(self.limit, self.inner.generate(prompt)).await {
            Ok(reply) => reply,
            Err(_) => {
                tracing::error!("model call timed out after {}s", self.limit.as_secs());
                Err(AnalysisError::TransportFailure(format!(
                    "timed out after {}s",
                    self.limit.as_secs()
                )))
            }
        }
    }
}

/// Model client that reads the shared settings at call time, so saved
/// settings apply to the next analysis without a restart.
#[derive(Clone)]
pub struct LlmGenerator {
    settings: Arc<RwLock<AiSettings>>,
    overrides: Overrides,
}

impl LlmGenerator {
    pub fn new(settings: Arc<RwLock<AiSettings>>, overrides: Overrides) -> Self {
        LlmGenerator {
            settings,
            overrides,
        }
    }
}

#[async_trait]
impl Generate for LlmGenerator {
    async fn generate(&self, prompt: &Prompt) -> Result<String, AnalysisError> {
        let stored = self.settings.read().await.clone();
        let settings = self.overrides.apply(stored);
        if !settings.is_configured() {
            return Err(AnalysisError::TransportFailure(
                "AI provider is not configured".to_string(),
            ));
        }

        tracing::info!(provider = %settings.provider, model = %settings.model, "calling model");

        let limit = settings.timeout();
        Timeout::new(Provider(settings), limit).generate(prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn prompt() -> Prompt {
        Prompt {
            system: "coach".into(),
            user: "scene".into(),
        }
    }

    /// Replies only after `delay`.
    struct Slow {
        delay: Duration,
        finished: AtomicUsize,
    }

    #[async_trait]
    impl Generate for Slow {
        async fn generate(&self, _prompt: &Prompt) -> Result<String, AnalysisError> {
            tokio::time::sleep(self.delay).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(r#"{"text":"late","path":[]}"#.to_string())
        }
    }

    #[test]
    fn maps_known_providers() {
        assert!(matches!(map_backend("google"), Ok(LLMBackend::Google)));
        assert!(matches!(map_backend("ollama"), Ok(LLMBackend::Ollama)));
        assert_eq!(
            map_backend("palm").err().as_deref(),
            Some("unknown provider: palm")
        );
    }

    #[tokio::test]
    async fn unconfigured_settings_fail_without_a_network_call() {
        let generator = LlmGenerator::new(
            Arc::new(RwLock::new(AiSettings::default())),
            Overrides::default(),
        );
        let err = generator.generate(&prompt()).await.unwrap_err();
        assert_eq!(
            err,
            AnalysisError::TransportFailure("AI provider is not configured".into())
        );
    }

    #[tokio::test]
    async fn unknown_provider_is_a_transport_failure() {
        let settings = AiSettings {
            provider: "palm".into(),
            api_key: "key".into(),
            ..AiSettings::default()
        };
        let generator = LlmGenerator::new(Arc::new(RwLock::new(settings)), Overrides::default());
        assert!(matches!(
            generator.generate(&prompt()).await,
            Err(AnalysisError::TransportFailure(msg)) if msg == "unknown provider: palm"
        ));
    }

    #[tokio::test]
    async fn env_overrides_reach_the_call() {
        let stored = Arc::new(RwLock::new(AiSettings::default()));
        let overrides = Overrides::from_pairs([
            ("GEMINI_API_KEY", "env-key"),
            ("CUESIGHT_PROVIDER", "palm"),
        ]);
        let generator = LlmGenerator::new(stored.clone(), overrides);

        // configured via the env key, then rejected for the overridden provider
        assert!(matches!(
            generator.generate(&prompt()).await,
            Err(AnalysisError::TransportFailure(msg)) if msg == "unknown provider: palm"
        ));
        assert!(stored.read().await.api_key.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_generator_times_out() {
        let bounded = Timeout::new(
            Slow {
                delay: Duration::from_secs(60),
                finished: AtomicUsize::new(0),
            },
            Duration::from_secs(5),
        );

        let err = bounded.generate(&prompt()).await.unwrap_err();

        assert_eq!(err, AnalysisError::TransportFailure("timed out after 5s".into()));
        assert_eq!(bounded.inner.finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn fast_generator_passes_through() {
        let bounded = Timeout::new(
            Slow {
                delay: Duration::from_secs(1),
                finished: AtomicUsize::new(0),
            },
            Duration::from_secs(5),
        );
        assert!(bounded.generate(&prompt()).await.unwrap().contains("late"));
    }
}
