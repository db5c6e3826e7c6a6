//! Mock chatter for tests

use crate::error::LlmResult;
use crate::traits::Chatter;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Chatter that echoes a canned answer and records prompts
#[derive(Default)]
pub struct MockChatter {
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    answer: String,
}

impl MockChatter {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            answer: answer.into(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Chatter for MockChatter {
    async fn complete(&self, prompt: &str) -> LlmResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.prompts.lock() {
            guard.push(prompt.to_string());
        }
        Ok(self.answer.clone())
    }

    fn model_name(&self) -> &str {
        "mock-chat-model"
    }
}
