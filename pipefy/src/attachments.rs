//! Pipeline de anexos: staging, presigned upload e atualização do campo
//!
//! Cada item do lote descreve um arquivo com origem mista:
//!
//! | tipo     | staging                          | presigned upload |
//! |----------|----------------------------------|------------------|
//! | `base64` | decodifica para arquivo scratch  | sim              |
//! | `url`    | baixa via HTTP para scratch      | sim              |
//! | `local`  | lê arquivo existente em disco    | sim              |
//! | `pipefy` | nenhum (data já é a URL hospedada)| não             |
//! | outro    | nenhum, referência resultante vazia| não            |
//!
//! O lote é processado sequencialmente; qualquer falha de staging ou
//! upload aborta o lote inteiro antes da mutation de atualização do campo
//! (nenhum commit parcial). Arquivos scratch são removidos em todos os
//! caminhos de saída.

use crate::client::PipefyClient;
use crate::error::{PipefyError, Result};
use crate::fields::unwrap_data;
use crate::query;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;

/// Origem dos bytes de um anexo
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentSource {
    Base64,
    Url,
    Local,
    /// Arquivo já hospedado no blob storage do Pipefy
    Pipefy,
    /// Tipo não reconhecido; não gera upload e a referência fica vazia
    Other(String),
}

impl AttachmentSource {
    fn parse(kind: &str) -> Self {
        match kind {
            "base64" => AttachmentSource::Base64,
            "url" => AttachmentSource::Url,
            "local" => AttachmentSource::Local,
            "pipefy" => AttachmentSource::Pipefy,
            other => AttachmentSource::Other(other.to_string()),
        }
    }

    /// Tipos que precisam de presigned upload antes de referenciar o arquivo
    pub fn requires_upload(&self) -> bool {
        matches!(
            self,
            AttachmentSource::Base64 | AttachmentSource::Url | AttachmentSource::Local
        )
    }
}

/// Um anexo do lote: origem, dado cru (path, URL ou blob base64) e nome
/// do arquivo com extensão
#[derive(Debug, Clone)]
pub struct AttachmentItem {
    pub source: AttachmentSource,
    pub data: String,
    pub filename: String,
}

/// Lote validado de anexos destinado a um campo de um card
#[derive(Debug, Clone)]
pub struct AttachmentBatch {
    pub organization_id: i64,
    pub card_id: i64,
    pub field_id: String,
    pub attachment: Vec<AttachmentItem>,
}

impl AttachmentBatch {
    /// Valida o formato do payload antes de qualquer atividade de rede.
    ///
    /// Regras (mesmas coerções do schema original): organization_id e
    /// card_id coercíveis para inteiro, field_id string, lista de anexos
    /// não vazia e cada item com type/data/filename strings. Falha de
    /// validação registra o payload ofensivo no log e nunca é retentada.
    pub fn from_value(data: &Value) -> Result<Self> {
        let result = Self::parse(data);
        if let Err(e) = &result {
            tracing::error!(
                "updateAttachmentFilesToCard error: data: {}, erro: {}",
                data,
                e
            );
        }
        result
    }

    fn parse(data: &Value) -> Result<Self> {
        let organization_id = coerce_int(data.get("organization_id"), "organization_id")?;
        let card_id = coerce_int(data.get("card_id"), "card_id")?;
        let field_id = data
            .get("field_id")
            .and_then(Value::as_str)
            .ok_or_else(|| PipefyError::Validation("field_id must be a string".to_string()))?
            .to_string();

        let raw_items = data
            .get("attachment")
            .and_then(Value::as_array)
            .ok_or_else(|| PipefyError::Validation("attachment must be a list".to_string()))?;

        if raw_items.is_empty() {
            return Err(PipefyError::Validation(
                "attachment length equal to zero".to_string(),
            ));
        }

        let mut attachment = Vec::with_capacity(raw_items.len());
        for raw in raw_items {
            let kind = require_str(raw, "type")?;
            let item_data = require_str(raw, "data")?;
            let filename = require_str(raw, "filename")?;
            attachment.push(AttachmentItem {
                source: AttachmentSource::parse(&kind),
                data: item_data,
                filename,
            });
        }

        Ok(Self {
            organization_id,
            card_id,
            field_id,
            attachment,
        })
    }
}

fn coerce_int(value: Option<&Value>, name: &str) -> Result<i64> {
    match value {
        Some(Value::Number(n)) => n.as_i64().ok_or_else(|| {
            PipefyError::Validation(format!("{} must be coercible to integer", name))
        }),
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| {
            PipefyError::Validation(format!("{} must be coercible to integer", name))
        }),
        _ => Err(PipefyError::Validation(format!(
            "{} must be coercible to integer",
            name
        ))),
    }
}

fn require_str(item: &Value, key: &str) -> Result<String> {
    item.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            PipefyError::Validation(format!("attachment item missing string field '{}'", key))
        })
}

/// Deriva o path canônico de storage a partir da URL resolvida.
///
/// O path começa no marcador `/orgs/` (preferido) ou `/uploads/` e vai
/// até o primeiro `?` ou o fim da string. Sem marcador presente, sobra a
/// URL inteira menos a query string.
pub fn canonical_storage_path(url: &str) -> String {
    let start = url
        .find("/orgs/")
        .or_else(|| url.find("/uploads/"))
        .unwrap_or(0);
    let end = url.find('?').unwrap_or(url.len());
    if start >= end {
        return String::new();
    }
    url[start..end].to_string()
}

/// Decodifica um blob base64 tolerando quebras de linha e espaços (blobs
/// no formato MIME chegam quebrados em linhas de 76 colunas).
fn decode_base64_blob(data: &str, filename: &str) -> Result<Vec<u8>> {
    let compact: Vec<u8> = data
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    BASE64.decode(&compact).map_err(|e| {
        PipefyError::Validation(format!("invalid base64 data for '{}': {}", filename, e))
    })
}

/// Materializa bytes num arquivo scratch e lê de volta para upload.
/// O arquivo é removido no drop, inclusive nos caminhos de erro.
fn stage_bytes(raw: &[u8]) -> Result<Vec<u8>> {
    let mut scratch = NamedTempFile::new()?;
    scratch.write_all(raw)?;
    scratch.flush()?;
    let staged = std::fs::read(scratch.path())?;
    Ok(staged)
}

impl PipefyClient {
    /// Solicita uma URL de upload pré-assinada para a organização/arquivo.
    pub async fn create_presigned_url(
        &self,
        organization_id: i64,
        filename: &str,
        response_fields: Option<&str>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<Value> {
        let response_fields = response_fields.unwrap_or("url");
        let graphql = format!(
            "mutation {{ createPresignedUrl(input: {{ \
                organizationId: {organization_id}, \
                fileName: {filename} \
            }}) {{ {response_fields} }} }}",
            organization_id = organization_id,
            filename = query::scalar(&Value::String(filename.to_string())),
            response_fields = response_fields,
        );
        let response = self.execute(&graphql, headers).await?;
        Ok(unwrap_data(&response, &["createPresignedUrl"]).clone())
    }

    /// PUT dos bytes na URL pré-assinada; sucesso é estritamente HTTP 200.
    pub(crate) async fn upload_to_presigned_url(&self, url: &str, data: Vec<u8>) -> Result<()> {
        let status = self.http().put(url).body(data).send().await?.status();
        if status != reqwest::StatusCode::OK {
            return Err(PipefyError::Api(format!(
                "upload to presigned URL failed with status {}",
                status.as_u16()
            )));
        }
        Ok(())
    }

    /// Anexa uma lista de arquivos a um campo de anexo de um card.
    ///
    /// Para cada item que exige upload: staging dos bytes, presigned URL,
    /// PUT no blob storage e derivação do path canônico. Ao final, uma
    /// única mutation `updateCardField` grava a lista ordenada de paths.
    /// Qualquer falha aborta o lote antes dessa mutation.
    pub async fn update_attachment_files_to_card(&self, data: &Value) -> Result<Value> {
        let batch = AttachmentBatch::from_value(data)?;

        let mut paths = Vec::with_capacity(batch.attachment.len());

        for item in &batch.attachment {
            let resolved_url = self.resolve_attachment(&batch, item).await?;
            paths.push(Value::String(canonical_storage_path(&resolved_url)));
        }

        self.update_card_field(
            batch.card_id,
            &batch.field_id,
            &Value::Array(paths),
            None,
            None,
        )
        .await
    }

    /// Resolve a URL remota de um anexo, fazendo o upload quando o tipo exige.
    async fn resolve_attachment(
        &self,
        batch: &AttachmentBatch,
        item: &AttachmentItem,
    ) -> Result<String> {
        let staged = match &item.source {
            AttachmentSource::Base64 => {
                let decoded = decode_base64_blob(&item.data, &item.filename)?;
                Some(stage_bytes(&decoded)?)
            }
            AttachmentSource::Url => {
                let downloaded = self
                    .http()
                    .get(&item.data)
                    .send()
                    .await?
                    .error_for_status()?
                    .bytes()
                    .await?;
                Some(stage_bytes(&downloaded)?)
            }
            AttachmentSource::Local => Some(tokio::fs::read(&item.data).await?),
            AttachmentSource::Pipefy => None,
            AttachmentSource::Other(kind) => {
                tracing::warn!(
                    "Tipo de anexo não reconhecido '{}' para '{}'; referência vazia",
                    kind,
                    item.filename
                );
                return Ok(String::new());
            }
        };

        match staged {
            Some(bytes) => {
                let presigned = self
                    .create_presigned_url(batch.organization_id, &item.filename, None, None)
                    .await?;
                let url = presigned
                    .get("url")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        PipefyError::Api(
                            "createPresignedUrl response missing 'url'".to_string(),
                        )
                    })?
                    .to_string();
                self.upload_to_presigned_url(&url, bytes).await?;
                Ok(url)
            }
            // data já é a URL hospedada
            None => Ok(item.data.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_batch() -> Value {
        json!({
            "organization_id": 99999,
            "card_id": 99999999,
            "field_id": "anexo",
            "attachment": [
                {"type": "base64", "data": "AAAA", "filename": "image.jpg"},
                {"type": "pipefy", "data": "https://host/uploads/abc/x.pdf", "filename": "x.pdf"}
            ]
        })
    }

    #[test]
    fn test_batch_validation_ok() {
        let batch = AttachmentBatch::from_value(&valid_batch()).unwrap();
        assert_eq!(batch.organization_id, 99999);
        assert_eq!(batch.card_id, 99999999);
        assert_eq!(batch.field_id, "anexo");
        assert_eq!(batch.attachment.len(), 2);
        assert_eq!(batch.attachment[0].source, AttachmentSource::Base64);
        assert_eq!(batch.attachment[1].source, AttachmentSource::Pipefy);
    }

    #[test]
    fn test_batch_ids_coerced_from_strings() {
        let mut data = valid_batch();
        data["organization_id"] = json!("999");
        data["card_id"] = json!(" 123 ");
        let batch = AttachmentBatch::from_value(&data).unwrap();
        assert_eq!(batch.organization_id, 999);
        assert_eq!(batch.card_id, 123);
    }

    #[test]
    fn test_empty_attachment_list_rejected() {
        let mut data = valid_batch();
        data["attachment"] = json!([]);
        let err = AttachmentBatch::from_value(&data).unwrap_err();
        assert!(matches!(err, PipefyError::Validation(_)));
        assert!(err.to_string().contains("length equal to zero"));
    }

    #[test]
    fn test_non_coercible_id_rejected() {
        let mut data = valid_batch();
        data["card_id"] = json!("abc");
        assert!(matches!(
            AttachmentBatch::from_value(&data),
            Err(PipefyError::Validation(_))
        ));
    }

    #[test]
    fn test_item_missing_filename_rejected() {
        let mut data = valid_batch();
        data["attachment"] = json!([{"type": "url", "data": "https://x/y.png"}]);
        assert!(matches!(
            AttachmentBatch::from_value(&data),
            Err(PipefyError::Validation(_))
        ));
    }

    #[test]
    fn test_unknown_source_requires_no_upload() {
        assert!(!AttachmentSource::parse("aws").requires_upload());
        assert!(!AttachmentSource::parse("pipefy").requires_upload());
        assert!(AttachmentSource::parse("base64").requires_upload());
        assert!(AttachmentSource::parse("local").requires_upload());
        assert!(AttachmentSource::parse("url").requires_upload());
    }

    #[test]
    fn test_canonical_path_uploads_marker_strips_query() {
        assert_eq!(
            canonical_storage_path("https://host/uploads/abc?sig=1"),
            "/uploads/abc"
        );
    }

    #[test]
    fn test_canonical_path_orgs_marker_preferred() {
        assert_eq!(
            canonical_storage_path("https://host/orgs/99/uploads/abc?X-Amz-Signature=zz"),
            "/orgs/99/uploads/abc"
        );
    }

    #[test]
    fn test_canonical_path_without_query_string() {
        assert_eq!(
            canonical_storage_path("https://host/uploads/dbfd2e82/ANEXO_TESTE_2.pdf"),
            "/uploads/dbfd2e82/ANEXO_TESTE_2.pdf"
        );
    }

    #[test]
    fn test_canonical_path_empty_url() {
        assert_eq!(canonical_storage_path(""), "");
    }

    #[test]
    fn test_base64_blob_with_mime_line_breaks() {
        // "hello" quebrado em linhas, como sai de base64.encodebytes
        let blob = "aGVs\nbG8=\n";
        assert_eq!(decode_base64_blob(blob, "a.txt").unwrap(), b"hello");
    }

    #[test]
    fn test_base64_blob_invalid_payload_rejected() {
        let err = decode_base64_blob("isto não é base64!", "a.txt").unwrap_err();
        assert!(matches!(err, PipefyError::Validation(_)));
        assert!(err.to_string().contains("a.txt"));
    }

    #[test]
    fn test_stage_bytes_roundtrip() {
        let staged = stage_bytes(b"conteudo do anexo").unwrap();
        assert_eq!(staged, b"conteudo do anexo");
    }
}
