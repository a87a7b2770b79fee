/// Main Application: webhook de regra de negócio -> Pipefy
///
/// Arquitetura:
/// - POST /main recebe o evento (trigger de cloud function ou HTTP local)
/// - A camada de regra de negócio valida o evento (ponto de extensão)
/// - O crate local pipefy/ conversa com a API GraphQL (retry limitado,
///   extração de campos, pipeline de anexos com presigned upload)
///
/// A resposta externa é sempre HTTP 200; falha viaja no envelope
/// regra-negocio {code, message}.
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use pipefy_webhook_middleware::{config, handlers, utils, AppState};

use config::Settings;
use handlers::{handle_main, health_check};
use utils::{logging::*, AppError};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Carregar variáveis de ambiente do arquivo .env (se existir)
    if dotenvy::dotenv().is_err() {
        // Em produção não existe .env - variáveis vêm do ambiente
        tracing::debug!("Arquivo .env não encontrado - usando variáveis de ambiente do sistema");
    }

    // Inicializar tracing
    tracing_subscriber::fmt::init();

    // Carregar configurações
    let settings = Settings::new()
        .map_err(|e| AppError::ConfigError(format!("Failed to load settings: {}", e)))?;

    log_config_loaded(&std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string()));

    // Cliente Pipefy com a configuração imutável carregada acima
    let pipefy_client = pipefy::PipefyClient::new(settings.pipefy_config())
        .map_err(|e| AppError::ConfigError(format!("Failed to create Pipefy client: {}", e)))?;
    log_info("Cliente Pipefy configurado a partir das settings");

    let app_state = Arc::new(AppState {
        settings: settings.clone(),
        pipefy: pipefy_client,
    });

    let app = Router::new()
        .route("/health", get(health_check))
        // Entry point do webhook (equivalente à invocação da cloud function)
        .route("/main", post(handle_main))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Em Cloud Run, usar a variável de ambiente PORT
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(settings.server.port);
    let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    log_server_startup(port);
    log_server_ready(port);

    // Graceful shutdown com signal handling
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log_info("🛑 Server shut down gracefully");
    Ok(())
}

/// Signal handler para graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log_info("🛑 Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            log_info("🛑 Received SIGTERM, shutting down gracefully...");
        }
    }
}
