//! Deterministic generation doubles.
//!
//! Used to exercise extraction and the stage cascade without a live model.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::llm::{GenerationParams, Generator};

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(String),
}

struct Rule {
    prefix: String,
    replies: VecDeque<Reply>,
}

/// A recorded call to a [`ScriptedGenerator`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorCall {
    pub prompt: String,
    pub params: GenerationParams,
}

/// Replies by prompt prefix.
///
/// The first rule whose prefix matches the prompt answers. A rule with
/// several replies hands them out in order and repeats its last one.
/// Prompts matching no rule get an empty string. Tracks how many calls
/// overlap so tests can check concurrency without timing.
#[derive(Default, Clone)]
pub struct ScriptedGenerator {
    rules: Arc<Mutex<Vec<Rule>>>,
    calls: Arc<Mutex<Vec<GeneratorCall>>>,
    delay: Option<Duration>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, prefix: impl Into<String>, reply: impl Into<String>) -> Self {
        self.push(prefix.into(), Reply::Text(reply.into()));
        self
    }

    pub fn with_failure(self, prefix: impl Into<String>, message: impl Into<String>) -> Self {
        self.push(prefix.into(), Reply::Fail(message.into()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn push(&self, prefix: String, reply: Reply) {
        let mut rules = self.rules.lock().unwrap();
        match rules.iter_mut().find(|r| r.prefix == prefix) {
            Some(rule) => rule.replies.push_back(reply),
            None => rules.push(Rule {
                prefix,
                replies: VecDeque::from([reply]),
            }),
        }
    }

    /// All calls made so far, in call order.
    pub fn calls(&self) -> Vec<GeneratorCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of calls that were running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn prompts_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|c| c.prompt)
            .filter(|p| p.starts_with(prefix))
            .collect()
    }

    fn next_reply(&self, prompt: &str) -> Reply {
        let mut rules = self.rules.lock().unwrap();
        let Some(rule) = rules.iter_mut().find(|r| prompt.starts_with(&r.prefix)) else {
            return Reply::Text(String::new());
        };
        if rule.replies.len() > 1 {
            rule.replies.pop_front().unwrap_or(Reply::Text(String::new()))
        } else {
            rule.replies.front().cloned().unwrap_or(Reply::Text(String::new()))
        }
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        self.calls.lock().unwrap().push(GeneratorCall {
            prompt: prompt.to_string(),
            params: *params,
        });

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.next_reply(prompt) {
            Reply::Text(text) => Ok(text),
            Reply::Fail(message) => anyhow::bail!(message),
        }
    }
}

/// Every call fails, as if the model server were down.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingGenerator;

#[async_trait]
impl Generator for FailingGenerator {
    async fn generate(&self, _prompt: &str, _params: &GenerationParams) -> Result<String> {
        anyhow::bail!("generation service unavailable")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_in_order_then_repeat() {
        let generator = ScriptedGenerator::new()
            .with_reply("extract: ", "{\"a\": true}")
            .with_reply("extract: ", "{}");
        let params = GenerationParams::extract();

        assert_eq!(generator.generate("extract: x", &params).await.unwrap(), "{\"a\": true}");
        assert_eq!(generator.generate("extract: y", &params).await.unwrap(), "{}");
        assert_eq!(generator.generate("extract: z", &params).await.unwrap(), "{}");
        assert_eq!(generator.generate("faq: {}", &params).await.unwrap(), "");
        assert_eq!(generator.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let generator = ScriptedGenerator::new().with_failure("compare: ", "boom");
        let result = generator.generate("compare: {}", &GenerationParams::compare()).await;
        assert_eq!(result.unwrap_err().to_string(), "boom");
    }

    #[tokio::test]
    async fn test_tracks_overlapping_calls() {
        let generator = ScriptedGenerator::new().with_delay(Duration::from_millis(20));
        let params = GenerationParams::compare();

        generator.generate("a", &params).await.unwrap();
        generator.generate("b", &params).await.unwrap();
        assert_eq!(generator.max_in_flight(), 1);

        let (first, second, third) = tokio::join!(
            generator.generate("c", &params),
            generator.generate("d", &params),
            generator.generate("e", &params),
        );
        assert!(first.is_ok() && second.is_ok() && third.is_ok());
        assert_eq!(generator.max_in_flight(), 3);
    }
}
