#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io::Read as _;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::Value;

pub const VIDEO_ID: &str = "dQw4w9WgXcQ";
pub const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

pub const SUMMARY: &str = "The presenter explains how ownership keeps memory safe without a \
garbage collector. Borrowing lets functions read data without taking it over. Lifetimes \
tie references to the values they point at. The talk ends with tips for fighting the \
borrow checker less often.";

#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn json(status: u16, value: Value) -> Self {
        Self {
            status,
            body: value.to_string(),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_owned(),
        }
    }

    pub fn summary(text: &str) -> Self {
        Self::json(200, serde_json::json!([{ "summary_text": text }]))
    }

    pub fn inference_error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub body: String,
}

impl RecordedRequest {
    pub fn path(&self) -> &str {
        self.url.split('?').next().unwrap_or_default()
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("request body is json")
    }
}

/// A local HTTP server answering every request through `handler`.
pub struct Stub {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Stub {
    pub fn spawn(mut handler: impl FnMut(&RecordedRequest) -> Reply + Send + 'static) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start stub server");
        let base_url = format!("http://{}", server.server_addr());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                let entry = RecordedRequest {
                    method: request.method().to_string(),
                    url: request.url().to_owned(),
                    body,
                };
                let reply = handler(&entry);
                recorded.lock().unwrap().push(entry);

                let header =
                    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                        .expect("build header");
                let response = tiny_http::Response::from_string(reply.body)
                    .with_status_code(reply.status)
                    .with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, prefix: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|req| req.path().starts_with(prefix))
            .collect()
    }

    pub fn youtube_api_base(&self) -> String {
        format!("{}/youtube/v3", self.base_url)
    }
}

impl Drop for Stub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Canned behavior for the metadata, captions and inference providers served
/// from one stub.
#[derive(Debug, Clone)]
pub struct Providers {
    pub metadata: Reply,
    pub captions: Reply,
    /// Per-model replies consumed in order; `inference_default` afterwards.
    pub inference: HashMap<String, VecDeque<Reply>>,
    pub inference_default: Reply,
}

impl Default for Providers {
    fn default() -> Self {
        Self {
            metadata: Reply::json(200, video_list(&video_item(VIDEO_ID, "Ownership in Rust", &words(40)))),
            captions: Reply::text(404, ""),
            inference: HashMap::new(),
            inference_default: Reply::summary(SUMMARY),
        }
    }
}

impl Providers {
    pub fn script(mut self, model: &str, replies: Vec<Reply>) -> Self {
        self.inference.insert(model.to_owned(), replies.into());
        self
    }

    pub fn spawn(self) -> Stub {
        let Providers {
            metadata,
            captions,
            mut inference,
            inference_default,
        } = self;
        Stub::spawn(move |req| {
            let path = req.path();
            if path.starts_with("/youtube/v3/videos") {
                metadata.clone()
            } else if path.starts_with("/api/timedtext") {
                captions.clone()
            } else if let Some(model) = path.strip_prefix("/models/") {
                inference
                    .get_mut(model)
                    .and_then(VecDeque::pop_front)
                    .unwrap_or_else(|| inference_default.clone())
            } else {
                Reply::text(404, "not found")
            }
        })
    }
}

pub fn words(count: usize) -> String {
    const VOCAB: [&str; 8] = [
        "ownership", "borrowing", "lifetimes", "traits", "memory", "safety", "compiler", "rust",
    ];
    (0..count)
        .map(|i| VOCAB[i % VOCAB.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn video_item(id: &str, title: &str, description: &str) -> Value {
    serde_json::json!({
        "id": id,
        "snippet": {
            "title": title,
            "description": description,
            "channelTitle": "Systems Channel",
            "publishedAt": "2024-03-05T12:00:00Z",
            "tags": ["rust", "memory"],
            "defaultAudioLanguage": "en",
            "thumbnails": {
                "medium": { "url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/mqdefault.jpg" }
            }
        },
        "contentDetails": { "duration": "PT12M5S" },
        "statistics": { "viewCount": "1234567", "likeCount": "890", "commentCount": "12" }
    })
}

pub fn video_list(item: &Value) -> Value {
    serde_json::json!({ "items": [item] })
}

pub fn captions_json3(lines: &[&str]) -> Value {
    let events: Vec<Value> = lines
        .iter()
        .enumerate()
        .map(|(idx, line)| {
            serde_json::json!({
                "tStartMs": idx * 2000,
                "dDurationMs": 2000,
                "segs": [{ "utf8": line }]
            })
        })
        .collect();
    serde_json::json!({ "events": events })
}
