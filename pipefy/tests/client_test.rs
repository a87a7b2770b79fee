//! Testes de integração do transporte e do pipeline de anexos
//!
//! Usa httpmock como endpoint GraphQL e como blob storage do presigned
//! upload, sem tocar a API real.

use httpmock::prelude::*;
use pipefy::{PipefyClient, PipefyConfig, PipefyError};
use serde_json::json;
use std::time::Duration;

fn test_client(server: &MockServer, max_retries: u32) -> PipefyClient {
    let config = PipefyConfig::new("Bearer test-token")
        .with_api_url(server.url("/graphql"))
        .with_retries(max_retries, Duration::from_millis(5))
        .with_timeout(Duration::from_secs(2));
    PipefyClient::new(config).expect("client")
}

#[tokio::test]
async fn success_short_circuits_remaining_attempts() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(200).json_body(json!({
            "data": { "card": { "title": "Reembolso", "fields": [] } }
        }));
    });

    let client = test_client(&server, 3);
    let card = client.card(64386929, None, None).await.unwrap();

    assert_eq!(card["title"], "Reembolso");
    // resposta válida na primeira tentativa: sem retry
    mock.assert_hits(1);
}

#[tokio::test]
async fn errors_list_reports_first_message() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(200).json_body(json!({
            "errors": [
                { "message": "not found" },
                { "message": "second" }
            ]
        }));
    });

    let client = test_client(&server, 1);
    let err = client.card(1, None, None).await.unwrap_err();

    match err {
        PipefyError::Api(msg) => assert_eq!(msg, "not found"),
        other => panic!("esperava PipefyError::Api, veio {:?}", other),
    }
}

#[tokio::test]
async fn top_level_error_key_uses_description() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(200).json_body(json!({
            "error": "invalid_token",
            "error_description": "The access token is invalid"
        }));
    });

    let client = test_client(&server, 1);
    let err = client.pipe(7370321, None, None).await.unwrap_err();
    assert!(err.to_string().contains("The access token is invalid"));
}

#[tokio::test]
async fn html_doctype_classified_as_too_many_requests_and_retried() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(429)
            .header("content-type", "text/html")
            .body("<!DOCTYPE html><html><body>Rate limited</body></html>");
    });

    let client = test_client(&server, 2);
    let err = client.card(1, None, None).await.unwrap_err();

    match err {
        PipefyError::Api(msg) => assert_eq!(msg, "Error Http 429 - Too Many Requests"),
        other => panic!("esperava PipefyError::Api, veio {:?}", other),
    }
    // a classificação entra no caminho de retry, não no de sucesso
    mock.assert_hits(2);
}

#[tokio::test]
async fn non_json_body_is_a_failure_subject_to_retry() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(200).body("mensagem que nao é json");
    });

    let client = test_client(&server, 3);
    let err = client.card(1, None, None).await.unwrap_err();

    assert!(err.to_string().contains("nao é json"));
    mock.assert_hits(3);
}

#[tokio::test]
async fn retry_exhaustion_returns_last_error() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(500).json_body(json!({ "message": "internal" }));
    });

    let client = test_client(&server, 3);
    let err = client.card(1, None, None).await.unwrap_err();

    // contrato corrigido: esgotadas as tentativas, o último erro volta ao
    // chamador em vez de cair silenciosamente para fora do loop
    assert!(err.to_string().contains("unexpected status 500"));
    mock.assert_hits(3);
}

#[tokio::test]
async fn attachment_batch_end_to_end() {
    let server = MockServer::start();

    // presigned upload aponta de volta para o mock server
    let presigned_url = server.url("/orgs/77/uploads/image.jpg?X-Amz-Signature=abc");

    let presign_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .body_contains("createPresignedUrl");
        then.status(200).json_body(json!({
            "data": { "createPresignedUrl": { "url": presigned_url } }
        }));
    });

    let put_mock = server.mock(|when, then| {
        when.method(PUT).path("/orgs/77/uploads/image.jpg");
        then.status(200);
    });

    // a mutation final deve carregar a lista de paths canônicos na ordem
    // de entrada do lote (base64 primeiro, pipefy depois)
    let update_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .body_contains("updateCardField")
            .body_contains(r#"[\"/orgs/77/uploads/image.jpg\",\"/uploads/abc\"]"#);
        then.status(200).json_body(json!({
            "data": { "updateCardField": { "success": true, "card": { "id": 99999999 } } }
        }));
    });

    let client = test_client(&server, 1);

    // "hello" em base64 + um arquivo já hospedado no Pipefy
    let batch = json!({
        "organization_id": 77,
        "card_id": 99999999,
        "field_id": "anexo",
        "attachment": [
            { "type": "base64", "data": "aGVsbG8=", "filename": "image.jpg" },
            { "type": "pipefy", "data": "https://host/uploads/abc?sig=1", "filename": "abc.pdf" }
        ]
    });

    let result = client.update_attachment_files_to_card(&batch).await.unwrap();
    assert_eq!(result["success"], true);

    // um presigned + um PUT para o item base64; nenhum para o item pipefy
    presign_mock.assert_hits(1);
    put_mock.assert_hits(1);
    // exatamente uma mutation de atualização do campo
    update_mock.assert_hits(1);
}

#[tokio::test]
async fn url_attachment_downloads_then_uploads_staged_bytes() {
    let server = MockServer::start();

    // o mock server serve o arquivo remoto e recebe o presigned PUT
    let download_mock = server.mock(|when, then| {
        when.method(GET).path("/files/relatorio.pdf");
        then.status(200).body("conteudo remoto");
    });

    let presigned_url = server.url("/orgs/5/uploads/relatorio.pdf?sig=x");
    let presign_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .body_contains("createPresignedUrl");
        then.status(200).json_body(json!({
            "data": { "createPresignedUrl": { "url": presigned_url } }
        }));
    });

    // o PUT deve carregar exatamente os bytes baixados
    let put_mock = server.mock(|when, then| {
        when.method(PUT)
            .path("/orgs/5/uploads/relatorio.pdf")
            .body("conteudo remoto");
        then.status(200);
    });

    let update_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .body_contains("updateCardField")
            .body_contains(r#"[\"/orgs/5/uploads/relatorio.pdf\"]"#);
        then.status(200).json_body(json!({
            "data": { "updateCardField": { "success": true } }
        }));
    });

    let client = test_client(&server, 1);
    let batch = json!({
        "organization_id": 5,
        "card_id": 10,
        "field_id": "anexo",
        "attachment": [
            { "type": "url", "data": server.url("/files/relatorio.pdf"), "filename": "relatorio.pdf" }
        ]
    });

    let result = client.update_attachment_files_to_card(&batch).await.unwrap();
    assert_eq!(result["success"], true);

    download_mock.assert_hits(1);
    presign_mock.assert_hits(1);
    put_mock.assert_hits(1);
    update_mock.assert_hits(1);
}

#[tokio::test]
async fn local_attachment_reads_file_from_disk() {
    use std::io::Write;

    let server = MockServer::start();

    let mut local_file = tempfile::NamedTempFile::new().unwrap();
    local_file.write_all(b"conteudo em disco").unwrap();
    local_file.flush().unwrap();
    let local_path = local_file.path().to_str().unwrap().to_string();

    let presigned_url = server.url("/uploads/nota.pdf?sig=1");
    server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .body_contains("createPresignedUrl");
        then.status(200).json_body(json!({
            "data": { "createPresignedUrl": { "url": presigned_url } }
        }));
    });

    let put_mock = server.mock(|when, then| {
        when.method(PUT).path("/uploads/nota.pdf").body("conteudo em disco");
        then.status(200);
    });

    let update_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .body_contains("updateCardField")
            .body_contains(r#"[\"/uploads/nota.pdf\"]"#);
        then.status(200).json_body(json!({
            "data": { "updateCardField": { "success": true } }
        }));
    });

    let client = test_client(&server, 1);
    let batch = json!({
        "organization_id": 5,
        "card_id": 10,
        "field_id": "anexo",
        "attachment": [
            { "type": "local", "data": local_path, "filename": "nota.pdf" }
        ]
    });

    let result = client.update_attachment_files_to_card(&batch).await.unwrap();
    assert_eq!(result["success"], true);

    put_mock.assert_hits(1);
    update_mock.assert_hits(1);
}

#[tokio::test]
async fn empty_attachment_list_fails_before_any_network_call() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(200).json_body(json!({ "data": {} }));
    });

    let client = test_client(&server, 1);
    let batch = json!({
        "organization_id": 1,
        "card_id": 2,
        "field_id": "anexo",
        "attachment": []
    });

    let err = client.update_attachment_files_to_card(&batch).await.unwrap_err();
    assert!(matches!(err, PipefyError::Validation(_)));
    mock.assert_hits(0);
}

#[tokio::test]
async fn failed_upload_aborts_batch_before_field_update() {
    let server = MockServer::start();

    let presigned_url = server.url("/uploads/doc.pdf?sig=1");
    server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .body_contains("createPresignedUrl");
        then.status(200).json_body(json!({
            "data": { "createPresignedUrl": { "url": presigned_url } }
        }));
    });

    // blob storage recusa o PUT: sucesso é estritamente 200
    server.mock(|when, then| {
        when.method(PUT).path("/uploads/doc.pdf");
        then.status(403);
    });

    let update_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .body_contains("updateCardField");
        then.status(200).json_body(json!({ "data": {} }));
    });

    let client = test_client(&server, 1);
    let batch = json!({
        "organization_id": 1,
        "card_id": 2,
        "field_id": "anexo",
        "attachment": [
            { "type": "base64", "data": "aGVsbG8=", "filename": "doc.pdf" }
        ]
    });

    let err = client.update_attachment_files_to_card(&batch).await.unwrap_err();
    assert!(err.to_string().contains("403"));
    // nenhum commit parcial do campo
    update_mock.assert_hits(0);
}
