//! In-process stand-in for a HARP Gradio app
//!
//! Enabled for downstream crates' tests through the `test-support` feature.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How non-cancel jobs behave once submitted
#[derive(Debug, Clone, Copy)]
pub enum JobBehavior {
    Complete,
    /// Like `Complete`, but controls arrive as a Python dict literal
    PythonControls,
    Hang,
    Error,
}

/// What the service has seen so far
#[derive(Debug, Default)]
pub struct ServiceState {
    calls: Mutex<Vec<(String, Value)>>,
    uploads: Mutex<usize>,
    requests: Mutex<usize>,
    api_url: Mutex<String>,
}

impl ServiceState {
    /// Submitted `data` arrays for one endpoint, in order
    pub fn calls(&self, name: &str) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(endpoint, _)| endpoint == name)
            .map(|(_, data)| data.clone())
            .collect()
    }

    pub fn upload_count(&self) -> usize {
        *self.uploads.lock().unwrap()
    }

    /// Every request the service answered
    pub fn request_count(&self) -> usize {
        *self.requests.lock().unwrap()
    }

    fn record_request(&self) {
        *self.requests.lock().unwrap() += 1;
    }
}

#[derive(Clone)]
struct AppState {
    state: Arc<ServiceState>,
    behavior: JobBehavior,
}

pub struct MockService {
    pub url: String,
    pub state: Arc<ServiceState>,
}

impl MockService {
    pub async fn start(behavior: JobBehavior) -> Self {
        Self::start_with_prefix(behavior, "").await
    }

    pub async fn start_with_prefix(behavior: JobBehavior, prefix: &str) -> Self {
        let state = Arc::new(ServiceState::default());
        let api = Router::new()
            .route("/info", get(info))
            .route("/upload", post(upload))
            .route("/call/{name}", post(call))
            .route("/call/{name}/{event_id}", get(stream))
            .route("/download/{name}", get(download))
            .with_state(AppState {
                state: Arc::clone(&state),
                behavior,
            });
        let app = if prefix.is_empty() {
            api
        } else {
            Router::new().nest(prefix, api)
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        *state.api_url.lock().unwrap() = format!("{}{}", url, prefix);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { url, state }
    }
}

pub fn controls_payload() -> Value {
    json!({
        "ctrls": [
            {"ctrl_type": "audio_in", "label": "Input Audio"},
            {"ctrl_type": "slider", "label": "Pitch Shift", "minimum": -24, "maximum": 24, "step": 1, "value": 0}
        ],
        "card": {
            "name": "Mock Pitch Shifter",
            "description": "Shifts the pitch of the input",
            "author": "HARP",
            "tags": ["test"],
            "midi_in": false,
            "midi_out": false
        }
    })
}

/// `controls_payload()` as the `repr` of a Python dict
fn python_controls() -> String {
    concat!(
        "{'ctrls': [{'ctrl_type': 'audio_in', 'label': 'Input Audio'}, ",
        "{'ctrl_type': 'slider', 'label': 'Pitch Shift', 'minimum': -24, 'maximum': 24, 'step': 1, 'value': 0}], ",
        "'card': {'name': 'Mock Pitch Shifter', 'description': 'Shifts the pitch of the input', ",
        "'author': 'HARP', 'tags': ['test'], 'midi_in': False, 'midi_out': False}}"
    )
    .to_string()
}

async fn info(State(app): State<AppState>) -> Json<Value> {
    app.state.record_request();
    Json(json!({
        "named_endpoints": {
            "/controls": {"parameters": [], "returns": []},
            "/process": {
                "parameters": [
                    {
                        "label": "Input Audio",
                        "parameter_name": "input_audio",
                        "component": "Audio",
                        "python_type": {"type": "filepath", "description": ""}
                    },
                    {
                        "label": "Pitch Shift",
                        "parameter_name": "pitch_shift",
                        "component": "Slider",
                        "python_type": {"type": "float", "description": "numeric value between -24 and 24"}
                    }
                ],
                "returns": []
            },
            "/cancel": {"parameters": [], "returns": []}
        },
        "unnamed_endpoints": {}
    }))
}

async fn upload(State(app): State<AppState>, _body: Bytes) -> Json<Value> {
    app.state.record_request();
    *app.state.uploads.lock().unwrap() += 1;
    Json(json!(["/tmp/gradio/upload/input.wav"]))
}

async fn call(
    State(app): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    app.state.record_request();
    app.state
        .calls
        .lock()
        .unwrap()
        .push((name.clone(), body["data"].clone()));
    Json(json!({"event_id": format!("{}-event", name)}))
}

async fn stream(
    State(app): State<AppState>,
    Path((name, _event_id)): Path<(String, String)>,
) -> impl IntoResponse {
    app.state.record_request();
    let body = match (name.as_str(), app.behavior) {
        ("cancel", _) => sse_complete(json!([null])),
        (_, JobBehavior::Hang) => {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            String::new()
        }
        (_, JobBehavior::Error) => "event: error\ndata: \"model exploded\"\n\n".to_string(),
        ("controls", JobBehavior::Complete) => sse_complete(json!([controls_payload()])),
        ("controls", JobBehavior::PythonControls) => sse_complete(json!([python_controls()])),
        (_, JobBehavior::Complete | JobBehavior::PythonControls) => {
            let api_url = app.state.api_url.lock().unwrap().clone();
            sse_complete(json!([{
                "path": "/tmp/gradio/out/out.wav",
                "url": format!("{}/download/out.wav", api_url),
                "orig_name": "out.wav",
                "meta": {"_type": "gradio.FileData"}
            }]))
        }
    };
    ([(header::CONTENT_TYPE, "text/event-stream")], body)
}

fn sse_complete(data: Value) -> String {
    format!(
        "event: heartbeat\ndata: null\n\nevent: generating\ndata: null\n\nevent: complete\ndata: {}\n\n",
        data
    )
}

async fn download(State(app): State<AppState>, Path(_name): Path<String>) -> Vec<u8> {
    app.state.record_request();
    b"processed-audio".to_vec()
}
