#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use claude_web_api::events::PartialResponse;
use claude_web_api::transport::ByteStream;
use claude_web_api::{
    ClaudeWebClient, ClaudeWebConfig, ClaudeWebError, ModelCache, PartialResponseReceiver,
    Transport, TransportRequest, TransportResponse,
};
use tokio::sync::mpsc;

pub const ORG_ID: &str = "org-1";
pub const CONV_ID: &str = "conv-1";
pub const TEST_BASE_URL: &str = "http://claude.test/api";

pub enum Scripted {
    Respond { status: u16, chunks: Vec<Vec<u8>> },
    Body { status: u16, body: ByteStream },
    Fail(String),
}

pub fn json(status: u16, body: &str) -> Scripted {
    Scripted::Respond {
        status,
        chunks: vec![body.as_bytes().to_vec()],
    }
}

pub fn sse(frames: &[&str]) -> Scripted {
    let mut body = String::new();
    for frame in frames {
        body.push_str("data: ");
        body.push_str(frame);
        body.push_str("\n\n");
    }
    Scripted::Respond {
        status: 200,
        chunks: vec![body.into_bytes()],
    }
}

pub fn chunks(status: u16, parts: &[&str]) -> Scripted {
    Scripted::Respond {
        status,
        chunks: parts.iter().map(|part| part.as_bytes().to_vec()).collect(),
    }
}

pub fn invalid_model() -> Scripted {
    json(
        400,
        r#"{"error":{"type":"invalid_request_error","message":"Invalid model"}}"#,
    )
}

/// Scripts answering organization lookup and conversation creation.
pub fn resolution() -> Vec<Scripted> {
    vec![
        json(200, &format!(r#"[{{"uuid":"{ORG_ID}","name":"Personal"}}]"#)),
        json(200, &format!(r#"{{"uuid":"{CONV_ID}","name":""}}"#)),
    ]
}

pub type BodySender = mpsc::UnboundedSender<Result<Bytes, ClaudeWebError>>;

/// Body stream whose chunks the test pushes by hand.
pub fn channel_body() -> (BodySender, ByteStream) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let stream = futures_util::stream::unfold(receiver, |mut receiver| async move {
        receiver.recv().await.map(|item| (item, receiver))
    });
    (sender, Box::pin(stream))
}

pub fn frame(json: &str) -> Result<Bytes, ClaudeWebError> {
    Ok(Bytes::from(format!("data: {json}\n")))
}

pub struct ScriptedTransport {
    scripts: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn new(scripts: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        lock_unpoisoned(&self.requests).clone()
    }

    pub fn request_count(&self) -> usize {
        lock_unpoisoned(&self.requests).len()
    }

    pub fn posted_models(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter(|request| request.url.ends_with("/append_message"))
            .filter_map(|request| request.body.as_ref())
            .filter_map(|body| body["completion"]["model"].as_str().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, ClaudeWebError> {
        let description = format!("{} {}", request.method, request.url);
        lock_unpoisoned(&self.requests).push(request);

        let script = lock_unpoisoned(&self.scripts).pop_front();
        match script {
            Some(Scripted::Respond { status, chunks }) => {
                let items: Vec<Result<Bytes, ClaudeWebError>> =
                    chunks.into_iter().map(|chunk| Ok(Bytes::from(chunk))).collect();
                Ok(TransportResponse::new(
                    status,
                    Box::pin(futures_util::stream::iter(items)),
                ))
            }
            Some(Scripted::Body { status, body }) => Ok(TransportResponse::new(status, body)),
            Some(Scripted::Fail(message)) => Err(ClaudeWebError::Transport(message)),
            None => panic!("unexpected request: {description}"),
        }
    }
}

pub fn test_config() -> ClaudeWebConfig {
    ClaudeWebConfig::new()
        .with_base_url(TEST_BASE_URL)
        .with_fingerprint("test-fingerprint")
}

pub fn client_with(
    config: ClaudeWebConfig,
    transport: &Arc<ScriptedTransport>,
) -> (ClaudeWebClient, Arc<ModelCache>) {
    let models = Arc::new(ModelCache::new());
    let client = ClaudeWebClient::with_transport(config, Arc::clone(transport) as Arc<dyn Transport>)
        .with_model_cache(Arc::clone(&models));
    (client, models)
}

/// Drain a reply channel until it closes.
pub async fn collect(mut receiver: PartialResponseReceiver) -> Vec<PartialResponse> {
    tokio::time::timeout(Duration::from_secs(5), async move {
        let mut out = Vec::new();
        while let Some(item) = receiver.recv().await {
            out.push(item);
        }
        out
    })
    .await
    .expect("reply stream should close")
}

pub fn texts(responses: &[PartialResponse]) -> Vec<String> {
    responses
        .iter()
        .filter_map(|response| response.text().map(str::to_string))
        .collect()
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
