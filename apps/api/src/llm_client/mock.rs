//! Scripted `LlmBackend` for tests.
//!
//! Replies are consumed in order. A call with no scripted reply left panics,
//! which is how tests assert that a backend is NOT called.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{GenerationRequest, LlmBackend, LlmError};

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Failure { status: u16, message: String },
}

#[derive(Debug, Clone)]
pub struct MockBackend {
    name: &'static str,
    available: bool,
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    calls: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl MockBackend {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            available: true,
            replies: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(MockReply::Text(text.into()));
        self
    }

    /// A provider outage (503).
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.with_api_error(503, message)
    }

    pub fn with_api_error(self, status: u16, message: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(MockReply::Failure {
            status,
            message: message.into(),
        });
        self
    }

    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_available(&self, _request: &GenerationRequest) -> bool {
        self.available
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(request.clone());
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Failure { status, message }) => Err(LlmError::Api { status, message }),
            None => panic!(
                "MockBackend '{}' received an unexpected call: {:?}",
                self.name, request.prompt
            ),
        }
    }
}
