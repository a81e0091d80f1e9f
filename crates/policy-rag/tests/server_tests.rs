//! HTTP surface over a pipeline with deterministic providers

mod common;

use serde_json::{json, Value};
use std::sync::Arc;

use common::{config_in, write_faq_corpus, CountingLlm, HashEmbedder};
use policy_rag::server::RagServer;
use policy_rag::{RagConfig, RagPipeline, CANNOT_CONFIRM_MESSAGE};

struct TestServer {
    base: String,
    client: reqwest::Client,
    _dir: tempfile::TempDir,
}

async fn spawn(configure: impl FnOnce(&mut RagConfig)) -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    configure(&mut config);
    write_faq_corpus(&config);

    let pipeline = RagPipeline::new(config, HashEmbedder::new(), CountingLlm::new())
        .await
        .unwrap();
    let router = RagServer::with_pipeline(Arc::new(pipeline)).router();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestServer {
        base: format!("http://{}", addr),
        client: reqwest::Client::new(),
        _dir: dir,
    }
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

#[tokio::test]
async fn health_and_info() {
    let server = spawn(|_| {}).await;

    let health: Value = server.client.get(server.url("/health")).send().await.unwrap().json().await.unwrap();
    assert_eq!(health["status"], "ok");

    let info: Value = server.client.get(server.url("/api/info")).send().await.unwrap().json().await.unwrap();
    assert_eq!(info["name"], "policy-rag");
    assert_eq!(info["index"]["chunks"], 2);
    assert_eq!(info["index"]["embedding_model"], "hash-bow");
}

#[tokio::test]
async fn query_returns_cited_answer() {
    let server = spawn(|_| {}).await;

    let response = server
        .client
        .post(server.url("/api/query"))
        .json(&json!({ "question": "When can CPF members withdraw their savings?", "summarize": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["grounded"], true);
    assert_eq!(body["citations"][0], "faq1.md");
    assert_eq!(body["evidence"][0]["source"], "faq1.md");
    assert_eq!(body["mentioned_citations"], json!(["faq1.md"]));
    assert!(body["summary"].is_string());
    assert!(body["export_text"]
        .as_str()
        .unwrap()
        .starts_with("Question: When can CPF members withdraw their savings?"));
}

#[tokio::test]
async fn query_without_evidence_cannot_confirm() {
    let server = spawn(|_| {}).await;

    let body: Value = server
        .client
        .post(server.url("/api/query"))
        .json(&json!({ "question": "Anything?", "top_k": 0 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["grounded"], false);
    assert_eq!(body["answer"], CANNOT_CONFIRM_MESSAGE);
    assert_eq!(body["citations"], json!([]));
}

#[tokio::test]
async fn blank_question_is_rejected() {
    let server = spawn(|_| {}).await;
    let response = server
        .client
        .post(server.url("/api/query"))
        .json(&json!({ "question": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn refresh_requires_admin_password() {
    let server = spawn(|_| {}).await;

    let denied = server.client.post(server.url("/api/refresh")).send().await.unwrap();
    assert_eq!(denied.status(), 401);

    let wrong = server
        .client
        .post(server.url("/api/refresh"))
        .header("x-admin-password", "guess")
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), 401);

    let allowed = server
        .client
        .post(server.url("/api/refresh"))
        .header("x-admin-password", "admin-secret")
        .send()
        .await
        .unwrap();
    assert_eq!(allowed.status(), 200);
    let report: Value = allowed.json().await.unwrap();
    assert_eq!(report["documents"], 2);
}

#[tokio::test]
async fn app_password_gates_queries_when_set() {
    let server = spawn(|config| config.security.app_password = Some("member".to_string())).await;

    let denied = server.client.get(server.url("/api/documents")).send().await.unwrap();
    assert_eq!(denied.status(), 401);

    let listed: Value = server
        .client
        .get(server.url("/api/documents"))
        .header("x-app-password", "member")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["total"], 2);
    assert_eq!(listed["documents"][0]["name"], "faq1.md");
    assert_eq!(listed["documents"][0]["folder"], "sample_docs");
}

#[tokio::test]
async fn queries_are_open_without_app_password() {
    let server = spawn(|config| config.security.app_password = None).await;

    let listed = server.client.get(server.url("/api/documents")).send().await.unwrap();
    assert_eq!(listed.status(), 200);

    let answered = server
        .client
        .post(server.url("/api/query"))
        .json(&json!({ "question": "When can CPF members withdraw their savings?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(answered.status(), 200);

    // the admin tier stays closed either way
    let refresh = server.client.post(server.url("/api/refresh")).send().await.unwrap();
    assert_eq!(refresh.status(), 401);
}

#[tokio::test]
async fn upload_saves_and_refreshes() {
    let server = spawn(|_| {}).await;

    let boundary = "policy-rag-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"housing.md\"\r\n\
Content-Type: text/markdown\r\n\r\nHousing grants help first-time buyers.\r\n\
--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"notes.docx\"\r\n\
Content-Type: application/octet-stream\r\n\r\nbinary\r\n--{b}--\r\n",
        b = boundary
    );

    let response = server
        .client
        .post(server.url("/api/documents?refresh=true"))
        .header("x-admin-password", "admin-secret")
        .header("content-type", format!("multipart/form-data; boundary={}", boundary))
        .body(body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let result: Value = response.json().await.unwrap();
    assert_eq!(result["saved"], json!(["housing.md"]));
    assert_eq!(result["errors"][0]["filename"], "notes.docx");
    assert_eq!(result["refresh"]["documents"], 3);

    let answer: Value = server
        .client
        .post(server.url("/api/query"))
        .json(&json!({ "question": "housing grants for buyers", "top_k": 1 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(answer["citations"], json!(["housing.md"]));
}
