//! Camada de regra de negócio acionada pelo webhook
//!
//! O conjunto de validações ainda não foi mapeado pelo time de negócio;
//! este módulo recebe o evento, registra o payload e mantém o ponto de
//! extensão (`AppError::RegraNegocio`) para quando as regras existirem.

use crate::utils::AppResult;
use crate::AppState;
use serde_json::Value;

/// Executa as regras de negócio para o evento recebido pelo webhook.
///
/// Falhas de regra devem ser sinalizadas com `AppError::RegraNegocio`,
/// que o handler converte no campo `regra-negocio.message` do envelope.
pub async fn run(_state: &AppState, request: &Value) -> AppResult<()> {
    tracing::info!("request: {}", request);

    // TODO: Adicionar regras de negócio
    //
    // Exemplo de validação de entrada Pipefy:
    //
    // let card_action = request["data"]["action"].as_str().unwrap_or_default();
    // if card_action != "card.create" {
    //     return Err(AppError::RegraNegocio(
    //         format!("Webhook {} não mapeado", card_action),
    //     ));
    // }
    //
    // Exemplo de consulta de card e recuperação de valor:
    //
    // let card = _state.pipefy.card(64386929, None, None).await?;
    // let tipo = pipefy::fields::field_value_by_id(&card, "tipo_de_solicita_o", false);

    Ok(())
}
