//! Integration tests for the send form and job API, against a scripted page.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use {
    async_trait::async_trait,
    tokio::{net::TcpListener, sync::Notify},
    whatsend_browser::{BrowserError, PageDriver, Result, SessionLauncher, StorageState, WaitState},
    whatsend_config::{TimeoutsConfig, UiConfig, WhatsAppConfig},
    whatsend_web::{AppState, build_app},
    whatsend_whatsapp::Sender,
};

/// A logged-in page that knows a single contact.
struct FakePage {
    gate: Option<Arc<Notify>>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl PageDriver for FakePage {
    async fn goto(&self, _url: &str, _timeout_ms: u64) -> Result<()> {
        if let Some(ref gate) = self.gate {
            gate.notified().await;
        }
        Ok(())
    }

    async fn wait_for(&self, _selector: &str, _state: WaitState, _timeout_ms: u64) -> Result<()> {
        Ok(())
    }

    async fn click(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        if selector.starts_with("span[title=") && selector != r#"span[title="Guilherme"]"# {
            return Err(BrowserError::timeout(selector, timeout_ms));
        }
        Ok(())
    }

    async fn fill(&self, _selector: &str, _text: &str, _timeout_ms: u64) -> Result<()> {
        Ok(())
    }

    async fn screenshot(&self, _selector: &str) -> Result<Vec<u8>> {
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    async fn storage_state(&self) -> Result<StorageState> {
        Ok(StorageState::default())
    }

    async fn close(&mut self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct FakeLauncher {
    gate: Option<Arc<Notify>>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl SessionLauncher for FakeLauncher {
    async fn launch(&self, _state: Option<&StorageState>) -> Result<Box<dyn PageDriver>> {
        Ok(Box::new(FakePage {
            gate: self.gate.clone(),
            closes: Arc::clone(&self.closes),
        }))
    }
}

struct TestServer {
    addr: SocketAddr,
    closes: Arc<AtomicUsize>,
    _dir: tempfile::TempDir,
}

async fn start_server(gate: Option<Arc<Notify>>) -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let config = WhatsAppConfig {
        state_path: dir
            .path()
            .join("whatsapp_state.json")
            .to_string_lossy()
            .into_owned(),
        timeouts: TimeoutsConfig {
            search_settle_ms: 0,
            linger_ms: 0,
            ..TimeoutsConfig::default()
        },
        ..WhatsAppConfig::default()
    };
    let launcher = Arc::new(FakeLauncher {
        gate,
        ..FakeLauncher::default()
    });
    let closes = Arc::clone(&launcher.closes);

    let ui = UiConfig {
        default_contact: "Guilherme".into(),
        ..UiConfig::default()
    };
    let state = AppState::new(Sender::new(config, launcher), ui, 4);
    let app = build_app(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer {
        addr,
        closes,
        _dir: dir,
    }
}

async fn post_json(addr: SocketAddr, body: serde_json::Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("http://{addr}/api/send"))
        .json(&body)
        .send()
        .await
        .unwrap()
}

/// Poll a job until it leaves the running state.
async fn wait_for_job(addr: SocketAddr, id: &str) -> serde_json::Value {
    for _ in 0..200 {
        let job: serde_json::Value = reqwest::get(format!("http://{addr}/api/jobs/{id}"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if job["state"] != "running" {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("job {id} never finished");
}

fn messages(job: &serde_json::Value, level: &str) -> Vec<String> {
    job["statuses"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| s["level"] == level)
        .map(|s| s["message"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn index_renders_form_with_headers() {
    let server = start_server(None).await;
    let resp = reqwest::get(format!("http://{}/", server.addr))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let csp = resp.headers()["content-security-policy"]
        .to_str()
        .unwrap()
        .to_string();
    assert!(csp.contains("'nonce-"));
    assert_eq!(resp.headers()["cache-control"], "no-cache, no-store");

    let html = resp.text().await.unwrap();
    assert!(html.contains(r#"value="Guilherme""#));
    assert!(html.contains("Send message"));
}

#[tokio::test]
async fn health_reports_version() {
    let server = start_server(None).await;
    let body: serde_json::Value = reqwest::get(format!("http://{}/health", server.addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn blank_fields_are_rejected_with_warning() {
    let server = start_server(None).await;

    let resp = post_json(
        server.addr,
        serde_json::json!({ "contact": "   ", "message": "hi" }),
    )
    .await;
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["level"], "warning");
    assert_eq!(body["error"], "fill in the contact name and the message");

    let resp = reqwest::Client::new()
        .post(format!("http://{}/api/send", server.addr))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("contact=Guilherme&message=")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(server.closes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn send_job_succeeds_and_reports_statuses() {
    let server = start_server(None).await;

    let resp = post_json(
        server.addr,
        serde_json::json!({ "contact": "Guilherme", "message": "hello 🚀" }),
    )
    .await;
    assert_eq!(resp.status(), 202);
    let body: serde_json::Value = resp.json().await.unwrap();
    let id = body["job_id"].as_str().unwrap().to_string();

    let job = wait_for_job(server.addr, &id).await;
    assert_eq!(job["state"], "succeeded");
    assert!(job["qr_code"].is_null());
    assert_eq!(job["report"]["login"], "already_logged_in");
    assert_eq!(messages(&job, "success").last().unwrap(), "message sent to \"Guilherme\"");
    assert_eq!(
        messages(&job, "info").last().unwrap(),
        "automation finished, browser closed"
    );
    assert_eq!(server.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn form_body_is_accepted() {
    let server = start_server(None).await;
    let resp = reqwest::Client::new()
        .post(format!("http://{}/api/send", server.addr))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("contact=Guilherme&message=hi%20there")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 202);
}

#[tokio::test]
async fn unknown_contact_fails_the_job() {
    let server = start_server(None).await;

    let body: serde_json::Value = post_json(
        server.addr,
        serde_json::json!({ "contact": "Nobody", "message": "hi" }),
    )
    .await
    .json()
    .await
    .unwrap();
    let job = wait_for_job(server.addr, body["job_id"].as_str().unwrap()).await;

    assert_eq!(job["state"], "failed");
    assert_eq!(messages(&job, "error"), vec![
        "could not find the contact 'Nobody', check that the name is correct"
    ]);
    assert_eq!(server.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn second_send_while_running_conflicts() {
    let gate = Arc::new(Notify::new());
    let server = start_server(Some(Arc::clone(&gate))).await;
    let payload = serde_json::json!({ "contact": "Guilherme", "message": "hi" });

    let first = post_json(server.addr, payload.clone()).await;
    assert_eq!(first.status(), 202);
    let first: serde_json::Value = first.json().await.unwrap();

    let second = post_json(server.addr, payload).await;
    assert_eq!(second.status(), 409);
    let second: serde_json::Value = second.json().await.unwrap();
    assert_eq!(second["job_id"], first["job_id"]);

    gate.notify_one();
    let job = wait_for_job(server.addr, first["job_id"].as_str().unwrap()).await;
    assert_eq!(job["state"], "succeeded");
}

#[tokio::test]
async fn unknown_job_is_404() {
    let server = start_server(None).await;
    let resp = reqwest::get(format!("http://{}/api/jobs/does-not-exist", server.addr))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
