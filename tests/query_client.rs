//! End-to-end submissions against a stub `/data` backend.
//!
//! Run with: `cargo test --test query_client`

#![allow(clippy::panic, missing_docs)]

use std::time::Duration;

use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::routing::get;
use serde_json::json;
use tokio::sync::mpsc;

use imgserve_client::client::{FormBinding, QueryClient, QueryConnection, QueryState};
use imgserve_client::dom::Document;
use imgserve_client::endpoint::Endpoint;
use imgserve_client::error::ClientError;
use imgserve_client::page;
use imgserve_client::render::{RenderOutcome, Renderer};

const FALLBACK: &str = "https://placeholder.example/not-found.jpg";

/// What the stub does after reading the request frame.
#[derive(Debug, Clone)]
enum Reply {
    /// Send this JSON text, then wait for the client to close.
    Json(String),
    /// Send these bytes as a binary frame, then wait for the client to close.
    Binary(Vec<u8>),
    /// Close without replying.
    Close,
    /// Never reply.
    Silent,
}

struct Stub {
    endpoint: Endpoint,
    requests: mpsc::UnboundedReceiver<String>,
}

impl Stub {
    async fn next_request(&mut self) -> serde_json::Value {
        let Ok(Some(text)) =
            tokio::time::timeout(Duration::from_secs(5), self.requests.recv()).await
        else {
            panic!("stub received no request");
        };
        let Ok(value) = serde_json::from_str(&text) else {
            panic!("request is not JSON: {text}");
        };
        value
    }
}

async fn serve_once(mut socket: WebSocket, reply: Reply, tx: mpsc::UnboundedSender<String>) {
    let Some(Ok(Message::Text(text))) = socket.recv().await else {
        return;
    };
    let _ = tx.send(text.as_str().to_string());
    let frame = match reply {
        Reply::Json(body) => Message::text(body),
        Reply::Binary(bytes) => Message::Binary(bytes.into()),
        Reply::Close => {
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
        Reply::Silent => {
            tokio::time::sleep(Duration::from_secs(30)).await;
            return;
        }
    };
    if socket.send(frame).await.is_err() {
        return;
    }
    while let Some(Ok(msg)) = socket.recv().await {
        if matches!(msg, Message::Close(_)) {
            break;
        }
    }
}

async fn start_stub(reply: Reply) -> Stub {
    let (tx, requests) = mpsc::unbounded_channel();
    let app = Router::new().route(
        "/data",
        get(move |ws: WebSocketUpgrade| {
            let reply = reply.clone();
            let tx = tx.clone();
            async move { ws.on_upgrade(move |socket| serve_once(socket, reply, tx)) }
        }),
    );

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind stub listener");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("stub address");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let Ok(endpoint) = Endpoint::parse(&format!("ws://{addr}/data")) else {
        panic!("stub endpoint");
    };
    Stub { endpoint, requests }
}

fn client_for(stub: &Stub) -> QueryClient {
    QueryClient::new(stub.endpoint.clone(), Renderer::new(FALLBACK, 6))
}

fn src_of(document: &Document, element_id: &str) -> Option<String> {
    let node = document.get_element_by_id(element_id)?;
    document.attribute(node, "src").map(str::to_string)
}

fn is_hidden(document: &Document, element_id: &str) -> bool {
    let Some(node) = document.get_element_by_id(element_id) else {
        panic!("missing #{element_id}");
    };
    document.is_hidden(node)
}

#[tokio::test]
async fn get_sends_form_fields_and_renders_data_url() {
    let body = json!({"status": 200, "found": {"image_bytes": "iVBORw0KGgo="}}).to_string();
    let mut stub = start_stub(Reply::Json(body)).await;
    let client = client_for(&stub);

    let mut document = page::search_form("a1");
    page::fill(&mut document, "a1", &[("get", "red"), ("experiment", "exp1")]);
    let form = FormBinding::colorgram("a1");

    let Ok(submission) = client.submit_query(&mut document, &form).await else {
        panic!("submission should succeed");
    };

    assert_eq!(
        stub.next_request().await,
        json!({"action": "get", "get": "red", "experiment": "exp1"})
    );
    assert_eq!(
        submission.request.to_json().unwrap_or_default(),
        r#"{"action":"get","get":"red","experiment":"exp1"}"#
    );
    assert_eq!(submission.outcome, RenderOutcome::Rendered);
    assert_eq!(
        submission.history,
        vec![
            QueryState::Idle,
            QueryState::Connecting,
            QueryState::AwaitingResponse,
            QueryState::Rendered,
            QueryState::Closed,
        ]
    );
    assert_eq!(
        src_of(&document, "colorgram-a1").as_deref(),
        Some("data:image/png;base64,iVBORw0KGgo=")
    );
    assert!(is_hidden(&document, "selector-a1"));
    assert!(is_hidden(&document, "loading-a1"));
}

#[tokio::test]
async fn non_200_get_shows_fallback_image() {
    let body = json!({
        "status": 404,
        "message": "no colorgram for search term",
        "query": "utopia",
        "experiment": "concreteness"
    })
    .to_string();
    let stub = start_stub(Reply::Json(body)).await;
    let client = client_for(&stub);

    let mut document = page::search_form("a1");
    page::fill(&mut document, "a1", &[("get", "utopia"), ("experiment", "concreteness")]);

    let Ok(submission) = client
        .submit_query(&mut document, &FormBinding::colorgram("a1"))
        .await
    else {
        panic!("non-200 is rendered, not an error");
    };

    assert_eq!(submission.outcome, RenderOutcome::ErrorRendered);
    assert_eq!(submission.history.last(), Some(&QueryState::Closed));
    assert!(submission.history.contains(&QueryState::ErrorRendered));
    assert_eq!(src_of(&document, "colorgram-a1").as_deref(), Some(FALLBACK));
    assert!(!is_hidden(&document, "selector-a1"));
}

#[tokio::test]
async fn list_image_urls_sends_filter_and_paginates() {
    let mut urls: Vec<String> = (0..13).map(|i| format!("https://img.example/{i}.png")).collect();
    urls.push("https://img.example/4.png".to_string());
    let body = json!({"status": 200, "image_urls": urls}).to_string();
    let mut stub = start_stub(Reply::Json(body)).await;
    let client = client_for(&stub);

    let mut document = page::gallery_page("g1", &["image_id", "query"]);
    page::fill(&mut document, "g1", &[("image_id", " 000dc9fa41fb56b826345029012ca249 ")]);
    let form = FormBinding::gallery("g1", ["image_id", "query"]);

    let Ok(submission) = client.submit_query(&mut document, &form).await else {
        panic!("submission should succeed");
    };
    assert_eq!(submission.outcome, RenderOutcome::Rendered);
    assert_eq!(
        stub.next_request().await,
        json!({
            "action": "list_image_urls",
            "filter": [{"term": {"image_id": "000dc9fa41fb56b826345029012ca249"}}]
        })
    );

    let Ok(gallery) = document.require("gallery-g1") else {
        panic!("gallery element");
    };
    let columns = document.children(gallery);
    assert_eq!(columns.len(), 3);
    let rendered: usize = columns.iter().map(|c| document.children(*c).len()).sum();
    assert_eq!(rendered, 13);
}

#[tokio::test]
async fn list_experiments_fills_picker() {
    let body = json!({"status": 200, "experiments": ["concreteness", "top-100-wikipedia"]}).to_string();
    let mut stub = start_stub(Reply::Json(body)).await;
    let client = client_for(&stub);

    let mut document = page::experiment_picker("p1");
    let Ok(submission) = client
        .submit_query(&mut document, &FormBinding::experiments("p1"))
        .await
    else {
        panic!("submission should succeed");
    };
    assert_eq!(submission.outcome, RenderOutcome::Rendered);
    assert_eq!(stub.next_request().await, json!({"action": "list_experiments"}));

    let Ok(select) = document.require("experiments-p1") else {
        panic!("picker select");
    };
    assert_eq!(document.children(select).len(), 2);
}

#[tokio::test]
async fn close_without_reply_keeps_spinner() {
    let stub = start_stub(Reply::Close).await;
    let client = client_for(&stub);

    let mut document = page::search_form("a1");
    page::fill(&mut document, "a1", &[("get", "red"), ("experiment", "exp1")]);

    let result = client
        .submit_query(&mut document, &FormBinding::colorgram("a1"))
        .await;
    assert!(matches!(result, Err(ClientError::ClosedBeforeResponse)));
    assert!(!is_hidden(&document, "loading-a1"));
    assert!(src_of(&document, "colorgram-a1").is_none());
}

#[tokio::test]
async fn silent_backend_times_out_when_configured() {
    let stub = start_stub(Reply::Silent).await;
    let client = client_for(&stub).with_response_timeout(Duration::from_millis(200));

    let mut document = page::experiment_picker("p1");
    let result = client
        .submit_query(&mut document, &FormBinding::experiments("p1"))
        .await;
    assert!(matches!(result, Err(ClientError::Timeout { .. })));
    assert!(!is_hidden(&document, "loading-p1"));
}

#[tokio::test]
async fn unreachable_backend_is_a_connect_error() {
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind probe listener");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("probe address");
    };
    drop(listener);

    let Ok(endpoint) = Endpoint::parse(&format!("ws://{addr}/data")) else {
        panic!("endpoint");
    };
    let client = QueryClient::new(endpoint, Renderer::new(FALLBACK, 6));
    let mut document = page::experiment_picker("p1");
    let result = client
        .submit_query(&mut document, &FormBinding::experiments("p1"))
        .await;
    assert!(matches!(result, Err(ClientError::Connect { .. })));
}

#[tokio::test]
async fn missing_input_fails_before_connecting() {
    let mut stub = start_stub(Reply::Close).await;
    let client = client_for(&stub);

    let mut document = page::search_form("a1");
    let result = client
        .submit_query(&mut document, &FormBinding::colorgram("zz"))
        .await;
    assert!(matches!(result, Err(ClientError::MissingElement(id)) if id == "get-zz"));
    assert!(stub.requests.try_recv().is_err());
}

#[tokio::test]
async fn binary_json_reply_is_rendered() {
    let body = json!({"status": 200, "experiments": ["concreteness"]}).to_string();
    let stub = start_stub(Reply::Binary(body.into_bytes())).await;
    let client = client_for(&stub);

    let mut document = page::experiment_picker("p1");
    let Ok(submission) = client
        .submit_query(&mut document, &FormBinding::experiments("p1"))
        .await
    else {
        panic!("binary JSON frame should render");
    };
    assert_eq!(submission.outcome, RenderOutcome::Rendered);

    let Ok(select) = document.require("experiments-p1") else {
        panic!("picker select");
    };
    assert_eq!(document.children(select).len(), 1);
}

#[tokio::test]
async fn binary_reply_that_is_not_utf8_is_malformed() {
    let stub = start_stub(Reply::Binary(vec![0xff, 0xfe, 0x7b])).await;
    let client = client_for(&stub);

    let mut document = page::experiment_picker("p1");
    let result = client
        .submit_query(&mut document, &FormBinding::experiments("p1"))
        .await;
    assert!(matches!(result, Err(ClientError::MalformedResponse(_))));
    assert!(!is_hidden(&document, "loading-p1"));
}

#[tokio::test]
async fn failed_tls_handshake_is_a_connect_error() {
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind plain listener");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("listener address");
    };
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            drop(stream);
        }
    });

    let Ok(endpoint) = Endpoint::parse(&format!("wss://{addr}/data")) else {
        panic!("endpoint");
    };
    let opened = tokio::spawn(async move { QueryConnection::open(&endpoint).await.map(drop) });
    let Ok(Ok(result)) = tokio::time::timeout(Duration::from_secs(5), opened).await else {
        panic!("opening a wss endpoint must return, not hang or panic");
    };
    assert!(matches!(result, Err(ClientError::Connect { .. })));
}
