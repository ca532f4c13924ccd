use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    #[allow(dead_code)]
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Memory store keeps the suite independent of a running PostgreSQL
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_finance-intake"));
        cmd.args(["serve", "--memory"])
            .env("PORT", port.to_string())
            .env("APP_ENV", "development")
            .env("SECURITY_BCRYPT_COST", "4")
            .env_remove("FINANCE_INTAKE_PORT")
            .env_remove("WEBHOOK_URL")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self {
            port,
            base_url,
            child,
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Register a fresh user and return its bearer token
#[allow(dead_code)]
pub async fn register(server: &TestServer, client: &reqwest::Client) -> Result<String> {
    let username = format!("user_{}", &uuid::Uuid::new_v4().simple().to_string()[..12]);

    let res = client
        .post(server.url("/auth/register"))
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "integration-password"
        }))
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED,
        "registration failed with {}",
        res.status()
    );

    let body: Value = res.json().await?;
    body["token"]
        .as_str()
        .map(str::to_string)
        .context("registration response has no token")
}
