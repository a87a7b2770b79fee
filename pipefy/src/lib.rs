//! Cliente da API GraphQL do Pipefy
//!
//! Este crate fornece uma interface tipada para interagir com a API do
//! Pipefy, cobrindo o fluxo usado pela integração via webhook:
//!
//! - Construção de queries/mutations GraphQL a partir de parâmetros
//!   estruturados (literais de objeto com chaves sem aspas)
//! - Execução HTTP com retry limitado e classificação de erros da API
//! - Extração de valores de campos de cards e registros de tabela
//! - Pipeline de anexos: staging (base64/url/local), presigned upload
//!   para o blob storage e atualização do campo de anexo do card
//!
//! # API GraphQL
//!
//! Toda a comunicação acontece por um único endpoint POST recebendo
//! `{"query": "..."}` com header `Authorization` portando o token.
//!
//! # Exemplo Básico
//!
//! ```rust,ignore
//! use pipefy::{PipefyClient, PipefyConfig};
//!
//! #[tokio::main]
//! async fn main() -> pipefy::Result<()> {
//!     // IMPORTANTE: Ler de variáveis de ambiente (NUNCA hardcode!)
//!     let token = std::env::var("PIPEFY_API_TOKEN")
//!         .expect("PIPEFY_API_TOKEN não configurado");
//!
//!     let client = PipefyClient::new(PipefyConfig::new(token))?;
//!     let card = client.card(64386929, None, None).await?;
//!
//!     let valor = pipefy::fields::field_value_by_id(&card, "tipo_de_solicita_o", false);
//!     println!("{:?}", valor);
//!     Ok(())
//! }
//! ```

pub mod attachments;
pub mod cards;
pub mod client;
pub mod error;
pub mod fields;
pub mod pipes;
pub mod query;
pub mod tables;

// Re-exports principais
pub use attachments::{AttachmentBatch, AttachmentItem, AttachmentSource};
pub use client::{PipefyClient, PipefyConfig};
pub use error::{PipefyError, Result};
pub use fields::FieldValue;
