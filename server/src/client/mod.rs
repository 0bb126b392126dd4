//! Admin client for a running server
//!
//! Wraps the dashboard routes (`/auth`, `/app/v1`) so users, teams, apps
//! and API keys can be provisioned from a shell.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde_json::{Value, json};

use crate::core::cli::{AppCommands, ClientCommands, KeyCommands, TeamCommands};
use crate::core::constants::ENV_CLI_SESSION;

const CLIENT_TIMEOUT_SECS: u64 = 30;

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, session: Option<&str>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(CLIENT_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session: session.map(str::to_string),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn session(&self) -> Result<&str> {
        match self.session.as_deref() {
            Some(token) if !token.is_empty() => Ok(token),
            _ => bail!(
                "No session token. Run `sign-in` and export {}",
                ENV_CLI_SESSION
            ),
        }
    }

    async fn post(&self, path: &str, body: Value, authed: bool) -> Result<Value> {
        let mut request = self.http.post(self.url(path)).json(&body);
        if authed {
            request = request.bearer_auth(self.session()?);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("POST {} failed", path))?;
        read_body(response).await
    }

    async fn get(&self, path: &str) -> Result<Value> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(self.session()?)
            .send()
            .await
            .with_context(|| format!("GET {} failed", path))?;
        read_body(response).await
    }

    pub async fn register(&self, name: &str, password: &str) -> Result<i64> {
        let body = self
            .post(
                "/auth/register",
                json!({ "name": name, "password": password }),
                false,
            )
            .await?;
        id_field(&body)
    }

    pub async fn sign_in(&self, name: &str, password: &str) -> Result<String> {
        let body = self
            .post(
                "/auth/sign-in",
                json!({ "username": name, "password": password }),
                false,
            )
            .await?;
        str_field(&body, "sessionId")
    }

    pub async fn create_team(&self, name: &str) -> Result<i64> {
        let body = self
            .post("/app/v1/teams", json!({ "name": name }), true)
            .await?;
        id_field(&body)
    }

    /// Returns `(id, name)` pairs
    pub async fn list_teams(&self) -> Result<Vec<(i64, String)>> {
        let body = self.get("/app/v1/teams").await?;
        let teams = body["teams"]
            .as_array()
            .context("Response has no teams list")?;

        teams
            .iter()
            .map(|team| Ok((id_field(team)?, str_field(team, "name")?)))
            .collect()
    }

    pub async fn create_app(&self, name: &str, team_id: i64) -> Result<i64> {
        let body = self
            .post(
                "/app/v1/apps",
                json!({ "name": name, "teamId": team_id }),
                true,
            )
            .await?;
        id_field(&body)
    }

    pub async fn create_key(&self, app_id: i64) -> Result<String> {
        let body = self
            .post(&format!("/app/v1/apps/{}/keys", app_id), json!({}), true)
            .await?;
        str_field(&body, "key")
    }
}

/// Turn a non-2xx response into an error carrying the server's message
async fn read_body(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let text = response.text().await.context("Failed to read response")?;
    let body: Value = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };

    if !status.is_success() {
        let message = body["message"]
            .as_str()
            .or_else(|| body.as_str())
            .unwrap_or("no message");
        bail!("Server returned {}: {}", status, message);
    }
    Ok(body)
}

fn id_field(body: &Value) -> Result<i64> {
    body["id"].as_i64().context("Response has no id")
}

fn str_field(body: &Value, field: &str) -> Result<String> {
    body[field]
        .as_str()
        .map(str::to_string)
        .with_context(|| format!("Response has no {}", field))
}

/// Execute one client subcommand and print its result
pub async fn run(url: &str, session: Option<&str>, command: ClientCommands) -> Result<()> {
    let client = ApiClient::new(url, session)?;

    match command {
        ClientCommands::Register { name, password } => {
            let id = client.register(&name, &password).await?;
            println!("User created: id {}", id);
        }
        ClientCommands::SignIn { name, password } => {
            let token = client.sign_in(&name, &password).await?;
            println!("{}", token);
            println!();
            println!("export {}={}", ENV_CLI_SESSION, token);
        }
        ClientCommands::Team { command } => match command {
            TeamCommands::Create { name } => {
                let id = client.create_team(&name).await?;
                println!("Team created: id {}", id);
            }
            TeamCommands::List => {
                let teams = client.list_teams().await?;
                if teams.is_empty() {
                    println!("No teams");
                }
                for (id, name) in teams {
                    println!("{:>6}  {}", id, name);
                }
            }
        },
        ClientCommands::App { command } => match command {
            AppCommands::Create { name, team_id } => {
                let id = client.create_app(&name, team_id).await?;
                println!("Application created: id {}", id);
            }
        },
        ClientCommands::Key { command } => match command {
            KeyCommands::Create { app_id } => {
                let key = client.create_key(app_id).await?;
                println!("{}", key);
                eprintln!("Store this key now; the server keeps only its digest.");
            }
        },
    }

    Ok(())
}
