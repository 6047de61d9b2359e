//! Yes/no/unsure classification of confirmation answers
//!
//! Visitors answer confirmations in free form ("응", "싫어요", "잘 모르겠어요"),
//! so the primary classifier asks the model with a few-shot prompt and
//! greedy decoding. Classification never fails: unparseable output, backend
//! errors and timeouts all become [`Judgment::Unsure`], which the dialogue
//! turns into a reprompt.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use kiosk_config::{GenerationParams, PromptsConfig};
use kiosk_core::Judgment;
use kiosk_llm::{LlmBackend, Message};

/// Classifies a confirmation answer
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Judgment;

    /// Liveness of whatever backs the classifier
    async fn is_available(&self) -> bool {
        true
    }
}

/// Map raw model output to a judgment
///
/// A negative label wins when both appear, so "긍정이 아니라 부정" reads
/// as negative.
pub fn parse_judgment(output: &str) -> Judgment {
    let output = output.trim().to_lowercase();

    if output.contains("부정") || output.contains("negative") {
        Judgment::Negative
    } else if output.contains("긍정") || output.contains("positive") {
        Judgment::Positive
    } else {
        Judgment::Unsure
    }
}

/// Few-shot prompted model classifier
pub struct LlmIntentClassifier {
    backend: Arc<dyn LlmBackend>,
    prompts: PromptsConfig,
    params: GenerationParams,
    timeout: Duration,
}

impl LlmIntentClassifier {
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        prompts: PromptsConfig,
        params: GenerationParams,
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            prompts,
            params,
            timeout,
        }
    }
}

#[async_trait]
impl IntentClassifier for LlmIntentClassifier {
    async fn classify(&self, text: &str) -> Judgment {
        let messages = [Message::user(self.prompts.classifier_prompt(text))];

        match tokio::time::timeout(self.timeout, self.backend.generate(&messages, &self.params)).await
        {
            Ok(Ok(result)) => {
                let judgment = parse_judgment(&result.text);
                tracing::debug!(answer = text, output = %result.text, %judgment, "Classified answer");
                judgment
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Classifier generation failed, treating answer as unsure");
                Judgment::Unsure
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Classifier timed out, treating answer as unsure"
                );
                Judgment::Unsure
            }
        }
    }

    async fn is_available(&self) -> bool {
        self.backend.is_available().await
    }
}

const UNSURE_WORDS: &[&str] = &["모르", "글쎄", "잘 몰"];
const NEGATIVE_WORDS: &[&str] = &["아니", "아뇨", "싫", "틀려", "틀렸", "안 맞", "아냐", "no"];
const POSITIVE_WORDS: &[&str] = &[
    "네", "예", "응", "맞", "좋아", "그래", "해줘", "해 줘", "해주세요", "해 주세요", "yes",
];

/// Keyword classifier for offline operation
///
/// Checks uncertainty first, then negation, then assent, so that
/// "안 맞아요" is negative even though it contains "맞".
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn judge(&self, text: &str) -> Judgment {
        let text = text.trim().to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| text.contains(w));

        if text.is_empty() || has(UNSURE_WORDS) {
            Judgment::Unsure
        } else if has(NEGATIVE_WORDS) {
            Judgment::Negative
        } else if has(POSITIVE_WORDS) {
            Judgment::Positive
        } else {
            Judgment::Unsure
        }
    }
}

#[async_trait]
impl IntentClassifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Judgment {
        self.judge(text)
    }
}

/// Classifier replaying queued judgments, then [`Judgment::Unsure`]
///
/// Clones share the queue, so a test can keep a handle after moving one
/// into an engine.
#[derive(Debug, Clone, Default)]
pub struct ScriptedClassifier {
    queue: Arc<Mutex<VecDeque<Judgment>>>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl ScriptedClassifier {
    pub fn new<I>(judgments: I) -> Self
    where
        I: IntoIterator<Item = Judgment>,
    {
        Self {
            queue: Arc::new(Mutex::new(judgments.into_iter().collect())),
            seen: Arc::default(),
        }
    }

    /// Texts classified so far
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl IntentClassifier for ScriptedClassifier {
    async fn classify(&self, text: &str) -> Judgment {
        self.seen.lock().push(text.to_string());
        self.queue.lock().pop_front().unwrap_or(Judgment::Unsure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_llm::{LlmError, ScriptedBackend};

    fn llm_classifier(backend: ScriptedBackend, timeout: Duration) -> LlmIntentClassifier {
        LlmIntentClassifier::new(
            Arc::new(backend),
            PromptsConfig::default(),
            GenerationParams::deterministic(),
            timeout,
        )
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!(parse_judgment("긍정"), Judgment::Positive);
        assert_eq!(parse_judgment(" A: 부정\n"), Judgment::Negative);
        assert_eq!(parse_judgment("모르겠음"), Judgment::Unsure);
        assert_eq!(parse_judgment("Positive"), Judgment::Positive);
    }

    #[test]
    fn test_parse_garbage_is_unsure() {
        assert_eq!(parse_judgment(""), Judgment::Unsure);
        assert_eq!(parse_judgment("Q: 네 → A:"), Judgment::Unsure);
        assert_eq!(parse_judgment("🙂🙂"), Judgment::Unsure);
    }

    #[test]
    fn test_parse_negative_wins() {
        assert_eq!(parse_judgment("긍정이 아니라 부정"), Judgment::Negative);
    }

    #[tokio::test]
    async fn test_llm_classifier_uses_few_shot_prompt() {
        let backend = ScriptedBackend::with_replies(["긍정"]);
        let classifier = llm_classifier(backend.clone(), Duration::from_secs(1));

        assert_eq!(classifier.classify("응 맞아").await, Judgment::Positive);

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0][0].content.ends_with("Q: 응 맞아\nA:"));
    }

    #[tokio::test]
    async fn test_llm_failure_is_unsure() {
        let backend = ScriptedBackend::new();
        backend.push_error(LlmError::Network("connection refused".into()));
        let classifier = llm_classifier(backend, Duration::from_secs(1));

        assert_eq!(classifier.classify("네").await, Judgment::Unsure);
    }

    #[tokio::test]
    async fn test_llm_timeout_is_unsure() {
        let backend = ScriptedBackend::with_replies(["긍정"]).with_delay(Duration::from_millis(200));
        let classifier = llm_classifier(backend, Duration::from_millis(10));

        assert_eq!(classifier.classify("네").await, Judgment::Unsure);
    }

    #[test]
    fn test_keyword_classifier() {
        let k = KeywordClassifier::new();
        assert_eq!(k.judge("네"), Judgment::Positive);
        assert_eq!(k.judge("응 해줘"), Judgment::Positive);
        assert_eq!(k.judge("아니요"), Judgment::Negative);
        assert_eq!(k.judge("안 맞아요"), Judgment::Negative);
        assert_eq!(k.judge("싫어"), Judgment::Negative);
        assert_eq!(k.judge("잘 모르겠어요"), Judgment::Unsure);
        assert_eq!(k.judge("음..."), Judgment::Unsure);
        assert_eq!(k.judge(""), Judgment::Unsure);
    }

    #[tokio::test]
    async fn test_scripted_classifier_drains_then_unsure() {
        let classifier = ScriptedClassifier::new([Judgment::Negative]);
        assert_eq!(classifier.classify("a").await, Judgment::Negative);
        assert_eq!(classifier.classify("b").await, Judgment::Unsure);
        assert_eq!(classifier.seen(), vec!["a", "b"]);
    }
}
