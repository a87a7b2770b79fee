//! Handler do endpoint `POST /main`
//!
//! O contrato da borda é sempre responder HTTP 200; sucesso ou falha da
//! regra de negócio viaja apenas nos campos `regra-negocio.code` e
//! `regra-negocio.message` do envelope, junto com os metadados de deploy.

use axum::extract::State;
use axum::response::Json;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::time::Instant;

use crate::config::Settings;
use crate::services::regra_negocio;
use crate::utils::logging::*;
use crate::AppState;

pub async fn handle_main(State(state): State<Arc<AppState>>, body: String) -> Json<Value> {
    let start_time = Instant::now();
    log_request_received("/main", "POST");

    let (code, message) = match serde_json::from_str::<Value>(&body) {
        Ok(request) => match regra_negocio::run(&state, &request).await {
            Ok(()) => (200, "success".to_string()),
            Err(e) => {
                log_error(&format!("regra de negócio falhou: {}", e));
                (500, e.to_string())
            }
        },
        Err(e) => {
            log_warning(&format!("payload inválido no webhook: {}", e));
            (500, format!("Invalid JSON payload: {}", e))
        }
    };

    let processing_time = start_time.elapsed().as_millis() as u64;
    log_request_processed("/main", 200, processing_time);

    Json(response_envelope(&state.settings, code, &message))
}

/// Monta o envelope de resposta do webhook (sempre HTTP 200 por fora).
fn response_envelope(settings: &Settings, code: u16, message: &str) -> Value {
    json!({
        "gcp-function": {
            "name": settings.function.name,
            "version": settings.function.version,
            "deploy_hour_minutes": settings.function.deploy_hour_minutes
        },
        "regra-negocio": {
            "code": code,
            "message": message
        }
    })
}
