mod retry;

pub use retry::{with_retries, Exhausted, RetryPolicy};

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use til_types::{RenderConfig, RenderFailure, Renderer, Result, TilError};

const USER_AGENT: &str = concat!("til-index/", env!("CARGO_PKG_VERSION"));

// ── HttpRenderer ───────────────────────────────────────────────────────────

/// Renders Markdown through a GitHub-style `POST /markdown` endpoint.
pub struct HttpRenderer {
    client: Client,
    endpoint: String,
    mode: String,
    token: Option<String>,
    policy: RetryPolicy,
}

impl HttpRenderer {
    /// Builds the client and picks up the bearer token from the configured
    /// environment variable.
    pub fn new(config: &RenderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TilError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            mode: config.mode.clone(),
            token: config.token(),
            policy: RetryPolicy::from_config(config),
        })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn request(&self, text: &str) -> RequestBuilder {
        let body = serde_json::json!({
            "mode": self.mode,
            "text": text,
        });
        let request = self.client.post(&self.endpoint).json(&body);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// One POST. Anything but 200 is a failed attempt described by its status
    /// line and headers.
    fn attempt(&self, text: &str) -> std::result::Result<String, String> {
        let response = self.request(text).send().map_err(|e| e.to_string())?;
        if response.status() == StatusCode::OK {
            return response.text().map_err(|e| e.to_string());
        }
        Err(describe(&response))
    }
}

fn describe(response: &Response) -> String {
    let headers: Vec<String> = response
        .headers()
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value.to_str().unwrap_or("<binary>")))
        .collect();
    format!("{} {{{}}}", response.status(), headers.join(", "))
}

impl Renderer for HttpRenderer {
    fn render(&self, text: &str) -> std::result::Result<String, RenderFailure> {
        with_retries(&self.policy, std::thread::sleep, |_| self.attempt(text)).map_err(|e| {
            RenderFailure {
                attempts: e.attempts,
                last: e.last,
            }
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
