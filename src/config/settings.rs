use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub pipefy: PipefySettings,
    pub function: FunctionSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PipefySettings {
    pub api_url: String,
    pub api_token: String,
    /// Número de tentativas de reconexão por chamada
    pub max_retries: u32,
    /// Pausa fixa entre tentativas, em segundos
    pub retry_delay_secs: u64,
    /// Timeout por tentativa, em segundos
    pub timeout_secs: u64,
}

/// Metadados de deploy usados apenas no envelope de resposta do webhook
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FunctionSettings {
    pub name: String,
    pub version: String,
    pub deploy_hour_minutes: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            // Arquivo de configuração base
            .add_source(File::with_name("config/default").required(false))
            // Arquivo específico do ambiente
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false));

        // Adicionar variáveis de ambiente específicas
        if let Ok(token) = std::env::var("PIPEFY_API_TOKEN") {
            builder = builder.set_override("pipefy.api_token", token)?;
        }
        if let Ok(api_url) = std::env::var("PIPEFY_API_URL") {
            builder = builder.set_override("pipefy.api_url", api_url)?;
        }

        builder = builder.add_source(Environment::with_prefix("PIPEFY_WEBHOOK").separator("__"));

        let s = builder.build()?;

        s.try_deserialize()
    }

    /// Configuração do cliente Pipefy derivada das settings carregadas
    pub fn pipefy_config(&self) -> pipefy::PipefyConfig {
        pipefy::PipefyConfig::new(self.pipefy.api_token.clone())
            .with_api_url(self.pipefy.api_url.clone())
            .with_retries(
                self.pipefy.max_retries,
                Duration::from_secs(self.pipefy.retry_delay_secs),
            )
            .with_timeout(Duration::from_secs(self.pipefy.timeout_secs))
    }
}
