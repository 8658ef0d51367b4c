//! Scripted transports for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tplus_fetch::{HttpError, SessionTransport, TransportFactory, TransportResponse};

use crate::endpoints::SUCCESS_HEADER;

/// A login response the portal would send for valid credentials.
pub fn accepted_login() -> TransportResponse {
    TransportResponse::new(200, "<html>welcome</html>").with_header(SUCCESS_HEADER, "ko-KR")
}

/// A login response without the success header.
pub fn rejected_login() -> TransportResponse {
    TransportResponse::new(200, "<html>login failed</html>")
}

/// One request a scripted session saw.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub session: usize,
    pub url: String,
    pub query: Vec<(String, String)>,
}

enum Step {
    Respond(TransportResponse),
    Fail(String),
}

#[derive(Default)]
struct Script {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<RecordedRequest>>,
    sessions: AtomicUsize,
    delay: Mutex<Option<Duration>>,
}

/// Replies to requests in order, across all sessions it opens.
#[derive(Clone, Default)]
pub struct ScriptedTransports {
    script: Arc<Script>,
}

impl ScriptedTransports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, response: TransportResponse) -> Self {
        self.push(Step::Respond(response));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.push(Step::Fail(message.to_string()));
        self
    }

    /// Every request sleeps this long before answering.
    pub fn delay(self, delay: Duration) -> Self {
        *self.script.delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn factory(&self) -> Arc<dyn TransportFactory> {
        Arc::new(self.clone())
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.script.requests.lock().unwrap().clone()
    }

    fn push(&self, step: Step) {
        self.script.steps.lock().unwrap().push_back(step);
    }
}

impl TransportFactory for ScriptedTransports {
    fn open(&self) -> Result<Box<dyn SessionTransport>, HttpError> {
        let session = self.script.sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            id: session,
            script: Arc::clone(&self.script),
        }))
    }
}

struct ScriptedSession {
    id: usize,
    script: Arc<Script>,
}

#[async_trait]
impl SessionTransport for ScriptedSession {
    async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<TransportResponse, HttpError> {
        self.script.requests.lock().unwrap().push(RecordedRequest {
            session: self.id,
            url: url.to_string(),
            query: query
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        });

        let delay = *self.script.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let step = self.script.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Respond(response)) => Ok(response),
            Some(Step::Fail(message)) => Err(HttpError::Body(message)),
            None => Err(HttpError::Body("no scripted response".to_string())),
        }
    }
}
