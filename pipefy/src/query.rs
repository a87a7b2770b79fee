//! Construção de literais GraphQL a partir de valores estruturados
//!
//! A API do Pipefy recebe o documento GraphQL como texto puro, então os
//! argumentos precisam ser renderizados no formato da linguagem de query:
//!
//! - Escalares seguem a codificação JSON (strings com escape, números,
//!   `true`/`false`/`null`)
//! - Objetos de input usam chaves SEM aspas (diferente de JSON), com os
//!   valores string mantendo as aspas; a renderização é recursiva para
//!   objetos aninhados e listas de objetos
//! - Listas de identificadores são juntadas por vírgula, não serializadas
//!   como array JSON
//!
//! Nenhuma função aqui falha: entrada estruturalmente estranha produz uma
//! query sintaticamente inválida que o servidor reporta como erro.

use serde_json::Value;

/// Renderiza um escalar como literal GraphQL (codificação JSON).
///
/// Strings ganham aspas e escape, números/booleanos saem como literais e
/// `Value::Null` vira `null`.
pub fn scalar(value: &Value) -> String {
    // Display de Value produz JSON compacto com escape correto
    value.to_string()
}

/// Renderiza um literal de objeto de input GraphQL.
///
/// Chaves de objeto saem sem aspas em qualquer profundidade; valores
/// string mantêm as aspas. Arrays e objetos aninhados são percorridos
/// recursivamente.
pub fn object(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let fields: Vec<String> = map
                .iter()
                .map(|(key, val)| format!("{}: {}", key, object(val)))
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(object).collect();
            format!("[{}]", rendered.join(", "))
        }
        other => other.to_string(),
    }
}

/// Renderiza uma lista de objetos de input: `[ {...}, {...} ]`
pub fn object_list(items: &[Value]) -> String {
    let rendered: Vec<String> = items.iter().map(object).collect();
    format!("[ {} ]", rendered.join(", "))
}

/// Renderiza uma lista de identificadores como escalares separados por
/// vírgula (sintaxe de lista do GraphQL, não um array JSON).
pub fn id_list(ids: &[Value]) -> String {
    ids.iter()
        .map(scalar)
        .collect::<Vec<String>>()
        .join(", ")
}

/// Renderiza um escalar opcional; ausência vira `null`.
pub fn opt_scalar(value: Option<&str>) -> String {
    match value {
        Some(v) => scalar(&Value::String(v.to_string())),
        None => "null".to_string(),
    }
}
