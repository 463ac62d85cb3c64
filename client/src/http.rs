use std::future::Future;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::{RequestBuilder, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use skirmish_protocol::{
    Ack, EndBattleRequest, LocalizedName, ProtocolError, StartBattleRequest, StartBattleResponse,
    SwitchRequest, TurnRequest, TurnResult, decode,
};

use crate::BattleApi;
use crate::config::ApiConfig;
use crate::error::{ApiError, should_retry};

/// Battle API over HTTP/JSON
#[derive(Debug, Clone)]
pub struct HttpBattleApi {
    http: reqwest::Client,
    config: ApiConfig,
}

impl HttpBattleApi {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    async fn post<B, T>(&self, operation: &'static str, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.http.post(self.config.endpoint(path)).json(body);
        self.send(operation, request).await
    }

    /// Send a request and decode its JSON body, bounded by the configured
    /// timeout
    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T> {
        let timeout = self.config.request_timeout;
        let exchange = async {
            let response = request.send().await.map_err(ApiError::Http)?;
            let status = response.status();
            let body = response.text().await.map_err(ApiError::Http)?;
            Ok::<_, ApiError>((status, body))
        };

        let (status, body) = tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| ApiError::Timeout {
                operation,
                after: timeout,
            })??;

        if !status.is_success() {
            tracing::warn!(
                operation,
                status = status.as_u16(),
                "Battle API returned an error status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        decode(&body).with_context(|| format!("Failed to decode {} response", operation))
    }

    /// Run an idempotent call, retrying transient failures
    async fn with_retry<T, F, Fut>(&self, operation: &'static str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let policy = &self.config.retry;
        let mut attempt = 1;

        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < policy.max_attempts && should_retry(&e) => {
                    tracing::warn!(
                        operation,
                        attempt = attempt,
                        max_attempts = policy.max_attempts,
                        error = %e,
                        "Battle API call failed, retrying"
                    );
                    tokio::time::sleep(policy.delay_after(attempt)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn ensure_acknowledged(ack: Ack) -> Result<()> {
    if ack.success {
        Ok(())
    } else {
        bail!(ProtocolError::Server(
            ack.message.unwrap_or_else(|| "request refused".to_string())
        ))
    }
}

impl BattleApi for HttpBattleApi {
    async fn start_battle(&self, request: &StartBattleRequest) -> Result<StartBattleResponse> {
        tracing::debug!(battle_type = %request.battle_type, "Starting battle");
        self.post("start battle", "battle/start", request)
            .await
            .context("Failed to start battle")
    }

    async fn take_turn(&self, request: &TurnRequest) -> Result<TurnResult> {
        tracing::debug!(battle_id = %request.battle_id, move_name = %request.move_name, "Submitting turn");
        self.post("take turn", "battle/turn", request)
            .await
            .context("Failed to submit move")
    }

    async fn switch_combatant(&self, request: &SwitchRequest) -> Result<()> {
        let ack: Ack = self
            .post("switch", "battle/switch", request)
            .await
            .context("Failed to switch combatant")?;
        ensure_acknowledged(ack)
    }

    async fn end_battle(&self, request: &EndBattleRequest) -> Result<()> {
        let ack: Ack = self
            .with_retry("end battle", || self.post("end battle", "battle/end", request))
            .await
            .context("Failed to end battle")?;
        ensure_acknowledged(ack)
    }

    async fn move_name(&self, key: &str, locale: &str) -> Result<String> {
        let mut url = Url::parse(&self.config.endpoint("moves"))
            .with_context(|| format!("Invalid API base URL {}", self.config.base_url))?;
        url.path_segments_mut()
            .map_err(|()| anyhow!("API base URL {} cannot take a path", self.config.base_url))?
            .pop_if_empty()
            .push(key)
            .push("name");

        let name: LocalizedName = self
            .with_retry("move name", || {
                let request = self
                    .http
                    .get(url.clone())
                    .query(&[("lang", locale)]);
                self.send("move name", request)
            })
            .await
            .with_context(|| format!("Failed to localize move {}", key))?;
        Ok(name.name)
    }
}
