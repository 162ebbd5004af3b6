//! Local axum servers standing in for the Graph and `OpenAI` APIs.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use axum::extract::{Form, FromRequest, Multipart, Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use campaign_launcher::config::DEFAULT_GRAPH_API_VERSION;

/// Multipart file part received by an upload endpoint.
#[derive(Debug, Clone)]
pub struct ReceivedFile {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub len: usize,
}

/// One request received by the mock Graph API.
#[derive(Debug, Clone)]
pub struct Recorded {
    /// Path below the version segment, e.g. `act_1/campaigns`.
    pub path: String,
    /// Query and form parameters merged.
    pub params: HashMap<String, String>,
    pub file: Option<ReceivedFile>,
}

impl Recorded {
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Parse a JSON-encoded form parameter.
    #[must_use]
    pub fn json_param(&self, key: &str) -> Value {
        self.param(key)
            .map(|raw| serde_json::from_str(raw).expect("JSON parameter"))
            .unwrap_or(Value::Null)
    }
}

#[derive(Default)]
struct GraphState {
    requests: Mutex<Vec<Recorded>>,
    video_statuses: Mutex<VecDeque<String>>,
    failures: Mutex<HashMap<String, (u16, Value)>>,
    next_id: Mutex<u64>,
}

impl GraphState {
    fn record(&self, recorded: Recorded) {
        self.requests.lock().expect("requests lock").push(recorded);
    }

    fn next_id(&self) -> u64 {
        let mut next = self.next_id.lock().expect("id lock");
        *next += 1;
        *next
    }

    fn scripted_failure(&self, edge: &str) -> Option<Response> {
        let failures = self.failures.lock().expect("failures lock");
        let (status, body) = failures.get(edge)?;
        let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST);
        Some((status, Json(body.clone())).into_response())
    }
}

/// Mock Graph API serving account listing, uploads, video status and every
/// creation edge.
#[derive(Clone)]
pub struct MockGraph {
    state: Arc<GraphState>,
    base_url: String,
}

impl MockGraph {
    pub async fn start() -> Self {
        let state = Arc::new(GraphState::default());
        let version = DEFAULT_GRAPH_API_VERSION;
        let router = Router::new()
            .route(&format!("/{version}/me/adaccounts"), get(ad_accounts))
            .route(&format!("/{version}/{{object}}"), get(object_status))
            .route(&format!("/{version}/{{account}}/{{edge}}"), post(create_edge))
            .with_state(state.clone());

        Self {
            state,
            base_url: serve(router).await,
        }
    }

    /// Scheme and host to put in `GraphConfig::base_url`.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Video states returned by successive status checks; `ready` once
    /// exhausted.
    pub fn script_video_statuses(&self, statuses: &[&str]) {
        let mut queue = self.state.video_statuses.lock().expect("status lock");
        queue.extend(statuses.iter().map(ToString::to_string));
    }

    /// Answer every POST to `edge` (e.g. `campaigns`) with this payload.
    pub fn fail_edge(&self, edge: &str, status: u16, body: Value) {
        self.state
            .failures
            .lock()
            .expect("failures lock")
            .insert(edge.to_string(), (status, body));
    }

    #[must_use]
    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().expect("requests lock").clone()
    }

    /// Requests whose path ends with `suffix`.
    #[must_use]
    pub fn requests_to(&self, suffix: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.ends_with(suffix))
            .collect()
    }
}

async fn ad_accounts(
    State(state): State<Arc<GraphState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.record(Recorded {
        path: "me/adaccounts".to_string(),
        params,
        file: None,
    });
    Json(json!({
        "data": [
            {"account_id": "111", "name": "Tienda Principal", "currency": "COP"},
            {"account_id": "222", "name": "Respaldo", "currency": "USD"},
            {"account_id": "not-a-number", "name": "Broken"},
        ]
    }))
}

async fn object_status(
    State(state): State<Arc<GraphState>>,
    Path(object): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.record(Recorded {
        path: object.clone(),
        params,
        file: None,
    });
    let status = state
        .video_statuses
        .lock()
        .expect("status lock")
        .pop_front()
        .unwrap_or_else(|| "ready".to_string());
    Json(json!({
        "id": object,
        "status": {"video_status": status},
        "picture": format!("https://cdn.example.com/{object}.jpg"),
    }))
}

async fn create_edge(
    State(state): State<Arc<GraphState>>,
    Path((account, edge)): Path<(String, String)>,
    request: Request,
) -> Response {
    let mut params = Query::<HashMap<String, String>>::try_from_uri(request.uri())
        .map(|Query(q)| q)
        .unwrap_or_default();
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    let mut file = None;
    if is_multipart {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .expect("multipart body");
        while let Ok(Some(field)) = multipart.next_field().await {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(ToString::to_string);
            let content_type = field.content_type().map(ToString::to_string);
            let data = field.bytes().await.expect("field bytes");
            if file_name.is_some() {
                file = Some(ReceivedFile {
                    field: name,
                    file_name,
                    content_type,
                    len: data.len(),
                });
            } else {
                params.insert(name, String::from_utf8_lossy(&data).into_owned());
            }
        }
    } else {
        let Form(form) = Form::<Vec<(String, String)>>::from_request(request, &())
            .await
            .expect("form body");
        params.extend(form);
    }

    let uploaded_name = file
        .as_ref()
        .and_then(|f| f.file_name.clone())
        .unwrap_or_else(|| "remote".to_string());
    state.record(Recorded {
        path: format!("{account}/{edge}"),
        params,
        file,
    });

    if let Some(response) = state.scripted_failure(&edge) {
        return response;
    }

    let n = state.next_id();
    let body = match edge.as_str() {
        "adimages" => {
            let mut images = serde_json::Map::new();
            images.insert(uploaded_name, json!({"hash": format!("hash-{account}-{n}")}));
            json!({ "images": images })
        }
        "advideos" => json!({"id": format!("video-{n}")}),
        _ => json!({"id": format!("{edge}-{n}")}),
    };
    Json(body).into_response()
}

/// One request received by the mock `OpenAI` API.
#[derive(Debug, Clone)]
pub struct ReceivedCompletion {
    pub authorization: Option<String>,
    pub body: Value,
}

struct OpenAiState {
    status: StatusCode,
    response: Value,
    requests: Mutex<Vec<ReceivedCompletion>>,
}

/// Mock chat completions endpoint returning one fixed answer.
#[derive(Clone)]
pub struct MockOpenAi {
    state: Arc<OpenAiState>,
    base_url: String,
}

impl MockOpenAi {
    /// Answer every completion with `content` as the assistant message.
    pub async fn answering(content: &str) -> Self {
        Self::start(
            StatusCode::OK,
            json!({"choices": [{"message": {"role": "assistant", "content": content}}]}),
        )
        .await
    }

    /// Answer every request with an arbitrary status and body.
    pub async fn start(status: StatusCode, response: Value) -> Self {
        let state = Arc::new(OpenAiState {
            status,
            response,
            requests: Mutex::new(Vec::new()),
        });
        let router = Router::new()
            .route("/v1/chat/completions", post(chat_completion))
            .with_state(state.clone());
        let root = serve(router).await;

        Self {
            state,
            base_url: format!("{root}/v1"),
        }
    }

    /// Value for `OpenAIConfig::base_url`.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn requests(&self) -> Vec<ReceivedCompletion> {
        self.state.requests.lock().expect("requests lock").clone()
    }
}

async fn chat_completion(
    State(state): State<Arc<OpenAiState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state
        .requests
        .lock()
        .expect("requests lock")
        .push(ReceivedCompletion {
            authorization: headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string),
            body,
        });
    (state.status, Json(state.response.clone())).into_response()
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let addr = listener.local_addr().expect("mock server address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock server");
    });
    format!("http://{addr}")
}
