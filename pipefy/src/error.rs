//! Tipos de erro do cliente Pipefy

use thiserror::Error;

/// Erros retornados pelo cliente da API do Pipefy
#[derive(Error, Debug)]
pub enum PipefyError {
    /// Falha reportada pela API (envelope de erro, status != 200, página
    /// de rate-limit). Sujeita ao loop de retry do transporte.
    #[error("Pipefy API error: {0}")]
    Api(String),

    /// Requisição de lote de anexos malformada. Nunca é retentada.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Erro de configuração do cliente
    #[error("Configuration error: {0}")]
    Config(String),

    /// Erro de rede/HTTP da camada reqwest
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Corpo de resposta que não decodifica como JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Erro de I/O durante staging de anexos
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipefyError>;
