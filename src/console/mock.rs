//! Scripted in-memory transport for the console tests.

use crate::common::{Transport, TransportError};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Request {
    pub path: String,
    /// `None` for reads.
    pub body: Option<Value>,
}

/// Answers each path with the queued outcomes in order; the last one repeats.
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    replies: Mutex<HashMap<String, VecDeque<Result<Value, TransportError>>>>,
    requests: Mutex<Vec<Request>>,
}

impl MockTransport {
    pub fn reply(&self, path: &str, outcome: Result<Value, TransportError>) {
        self.replies
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(outcome);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .count()
    }

    fn answer(&self, path: &str, body: Option<Value>) -> Result<Value, TransportError> {
        self.requests.lock().unwrap().push(Request {
            path: path.to_string(),
            body,
        });

        let mut replies = self.replies.lock().unwrap();
        match replies.get_mut(path) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| Err(TransportError::Network(format!("no reply for {path}")))),
            None => Err(TransportError::Network(format!("no reply for {path}"))),
        }
    }
}

impl Transport for MockTransport {
    async fn read(&self, path: &str) -> Result<Value, TransportError> {
        self.answer(path, None)
    }

    async fn write(&self, path: &str, body: Value) -> Result<Value, TransportError> {
        self.answer(path, Some(body))
    }
}
