//! Normalização de respostas e extração de valores de campos
//!
//! A API devolve payloads com formato diferente por operação; este módulo
//! concentra a descida segura no envelope `data` e a leitura de campos de
//! cards (`fields`) e registros de tabela (`record_fields`).

use serde::Deserialize;
use serde_json::Value;

/// Tipos de campo cujo valor autoritativo vem em `array_value`
const ARRAY_BEARING_TYPES: [&str; 5] = [
    "connector",
    "attachment",
    "label_select",
    "checklist_vertical",
    "assignee_select",
];

static NULL: Value = Value::Null;

/// Desce `response["data"][op][...]` sem nunca falhar: qualquer nível
/// ausente retorna `Value::Null`, que os chamadores tratam como vazio.
///
/// O sentinela é sempre `null`, não um default tipado por operação;
/// `cards` num envelope vazio devolve `null`, não `[]`. Chamadores que
/// esperam lista devem passar por `Value::as_array` antes de iterar.
pub fn unwrap_data<'a>(response: &'a Value, path: &[&str]) -> &'a Value {
    let mut current = response.get("data").unwrap_or(&NULL);
    for key in path {
        current = current.get(key).unwrap_or(&NULL);
    }
    current
}

/// Referência ao campo dentro de uma entrada (`field { id type }`)
#[derive(Debug, Clone, Deserialize)]
pub struct FieldRef {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Uma entrada da lista de campos de um card ou registro de tabela
#[derive(Debug, Clone, Deserialize)]
pub struct FieldEntry {
    pub field: FieldRef,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub array_value: Option<Value>,
}

impl FieldEntry {
    fn is_array_bearing(&self) -> bool {
        self.field
            .kind
            .as_deref()
            .map(|kind| ARRAY_BEARING_TYPES.contains(&kind))
            .unwrap_or(false)
    }
}

/// Valor extraído de um campo, já na representação autoritativa
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Valor escalar (trim aplicado); campo ausente ou vazio vira `""`
    Text(String),
    /// Conteúdo de `array_value` para tipos array-bearing
    Items(Value),
    /// Escalar interpretado como JSON quando a forma array foi pedida
    Parsed(Value),
}

impl FieldValue {
    pub fn empty() -> Self {
        FieldValue::Text(String::new())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.is_empty())
    }
}

/// Extrai o valor de um campo pelo identificador.
///
/// O payload pode ser um card (container `fields`) ou um registro de
/// tabela (container `record_fields`). Regras:
///
/// - valor escalar `null` conta como string vazia; caso contrário recebe
///   trim de espaços nas bordas
/// - tipos array-bearing (connector, attachment, label_select,
///   checklist_vertical, assignee_select) retornam o `array_value` quando
///   a forma array não foi pedida explicitamente
/// - com `want_array`, o escalar é interpretado como JSON; se o texto não
///   for JSON válido o escalar cru é retornado
/// - campo ausente ou valor vazio resulta em `FieldValue::Text("")`
///
/// Se o mesmo `field_id` aparecer mais de uma vez (não deveria ocorrer),
/// a última ocorrência vence: a iteração não para no primeiro match.
pub fn field_value_by_id(payload: &Value, field_id: &str, want_array: bool) -> FieldValue {
    let container = payload
        .get("fields")
        .or_else(|| payload.get("record_fields"))
        .and_then(Value::as_array);

    let entries = match container {
        Some(entries) => entries,
        None => return FieldValue::empty(),
    };

    let mut result = FieldValue::empty();

    for raw in entries {
        let entry: FieldEntry = match serde_json::from_value(raw.clone()) {
            Ok(entry) => entry,
            Err(_) => continue,
        };

        if entry.field.id != field_id {
            continue;
        }

        let scalar = entry
            .value
            .as_deref()
            .map(str::trim)
            .unwrap_or("")
            .to_string();

        if entry.is_array_bearing() && !want_array {
            result = FieldValue::Items(
                entry.array_value.clone().unwrap_or(Value::Array(vec![])),
            );
        } else if scalar.is_empty() {
            continue;
        } else if want_array {
            result = match serde_json::from_str(&scalar) {
                Ok(parsed) => FieldValue::Parsed(parsed),
                Err(_) => FieldValue::Text(scalar),
            };
        } else {
            result = FieldValue::Text(scalar);
        }
    }

    result
}
