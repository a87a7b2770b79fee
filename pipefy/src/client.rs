//! Cliente HTTP para a API GraphQL do Pipefy

use crate::error::{PipefyError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client as HttpClient;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

/// Marcador de página HTML devolvida por proxy/gateway em rate-limit.
/// A API nunca responde HTML em operação normal.
const HTML_DOCTYPE_MARKER: &str = "DOCTYPE html";

/// Configuração imutável do cliente (carregada uma vez na construção)
#[derive(Clone, Debug)]
pub struct PipefyConfig {
    /// Endpoint GraphQL (único para queries e mutations)
    pub api_url: String,
    /// Token enviado como header `Authorization`
    pub api_token: String,
    /// Número máximo de tentativas por chamada
    pub max_retries: u32,
    /// Pausa fixa entre tentativas
    pub retry_delay: Duration,
    /// Timeout por tentativa
    pub timeout: Duration,
}

impl PipefyConfig {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_url: "https://api.pipefy.com/graphql".to_string(),
            api_token: api_token.into(),
            max_retries: 3,
            retry_delay: Duration::from_secs(5),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Cliente para a API do Pipefy
///
/// Toda operação vira um POST `{"query": "..."}` no endpoint configurado.
/// Sem estado mutável compartilhado: cada instância carrega apenas a
/// configuração e o pool de conexões do reqwest.
#[derive(Clone, Debug)]
pub struct PipefyClient {
    http_client: HttpClient,
    config: PipefyConfig,
}

impl PipefyClient {
    /// Cria um novo cliente Pipefy
    ///
    /// # Timeouts
    ///
    /// - Por tentativa: `config.timeout` (default 30s)
    /// - Connect: 5s
    pub fn new(config: PipefyConfig) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| {
                PipefyError::Config(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn config(&self) -> &PipefyConfig {
        &self.config
    }

    /// Cliente HTTP compartilhado (usado pelo pipeline de anexos para o
    /// download de URLs remotas e o PUT no presigned upload).
    pub(crate) fn http(&self) -> &HttpClient {
        &self.http_client
    }

    /// Executa uma query/mutation GraphQL com retry limitado.
    ///
    /// Headers extras têm precedência sobre os headers base em caso de
    /// conflito. Qualquer falha de uma tentativa (rede, corpo não-JSON,
    /// envelope de erro, status != 200) entra no loop de retry com pausa
    /// fixa; esgotadas as tentativas, o último erro observado é retornado.
    pub async fn execute(
        &self,
        query: &str,
        extra_headers: Option<&HashMap<String, String>>,
    ) -> Result<Value> {
        tracing::debug!("query: {}", query);

        let attempts = self.config.max_retries.max(1);
        let mut last_error = PipefyError::Config("no request attempt was made".to_string());

        for attempt in 1..=attempts {
            match self.attempt(query, extra_headers).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::warn!(
                        "Tentativa {}/{} falhou: {}. Aguardando {:?} para nova tentativa",
                        attempt,
                        attempts,
                        e,
                        self.config.retry_delay
                    );
                    last_error = e;

                    if attempt < attempts {
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                }
            }
        }

        Err(last_error)
    }

    /// Uma tentativa: envia o POST, decodifica e classifica a resposta.
    async fn attempt(
        &self,
        query: &str,
        extra_headers: Option<&HashMap<String, String>>,
    ) -> Result<Value> {
        let response = self
            .http_client
            .post(&self.config.api_url)
            .headers(self.build_headers(extra_headers))
            .json(&json!({ "query": query }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        // Página HTML de rate-limit chega antes de qualquer decodificação
        if body.contains(HTML_DOCTYPE_MARKER) {
            return Err(PipefyError::Api(
                "Error Http 429 - Too Many Requests".to_string(),
            ));
        }

        let decoded: Value = serde_json::from_str(&body).map_err(|_| {
            tracing::warn!("response: {}", body);
            PipefyError::Api(body.clone())
        })?;

        if let Some(error) = decoded.get("error") {
            let message = decoded
                .get("error_description")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            tracing::warn!("response: {}", error);
            return Err(PipefyError::Api(message));
        }

        if let Some(errors) = decoded.get("errors").and_then(Value::as_array) {
            if let Some(first) = errors.first() {
                let message = first
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| first.to_string());
                tracing::warn!("response: {}", message);
                return Err(PipefyError::Api(message));
            }
        }

        if status != reqwest::StatusCode::OK {
            return Err(PipefyError::Api(format!(
                "unexpected status {} from Pipefy API",
                status.as_u16()
            )));
        }

        Ok(decoded)
    }

    /// Headers base (content-type + authorization) com extras por cima.
    fn build_headers(&self, extra: Option<&HashMap<String, String>>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Ok(auth) = HeaderValue::from_str(&self.config.api_token) {
            headers.insert(AUTHORIZATION, auth);
        }

        if let Some(extra) = extra {
            for (name, value) in extra {
                match (
                    HeaderName::from_bytes(name.as_bytes()),
                    HeaderValue::from_str(value),
                ) {
                    (Ok(name), Ok(value)) => {
                        headers.insert(name, value);
                    }
                    _ => {
                        tracing::warn!("Header extra inválido ignorado: {}", name);
                    }
                }
            }
        }

        headers
    }
}
