//! Operações de tabelas e registros de tabela
//!
//! Registros de tabela são estruturalmente parecidos com cards, mas o
//! container de campos se chama `record_fields` (ver `fields`).

use crate::client::PipefyClient;
use crate::error::Result;
use crate::fields::unwrap_data;
use crate::query;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;

const TABLE_RECORDS_RESPONSE_FIELDS: &str = "edges { node { id title created_at \
    status {id name} record_fields {array_value value field {id type}}}}";

const TABLE_RECORD_RESPONSE_FIELDS: &str = "assignees { id name } created_at \
    created_by { id name } due_date finished_at id labels { id name } \
    parent_relations { name source_type } record_fields { array_value \
    field {id} date_value datetime_value filled_at float_value name required \
    updated_at value } summary { title value } table { id } title updated_at url";

impl PipefyClient {
    /// Lista tabelas pelos identificadores.
    pub async fn tables(
        &self,
        ids: &[Value],
        response_fields: Option<&str>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<Value> {
        let response_fields = response_fields.unwrap_or("id name url");
        let graphql = format!(
            "{{ tables(ids: [{ids}]) {{ {response_fields} }} }}",
            ids = query::id_list(ids),
            response_fields = response_fields,
        );
        let response = self.execute(&graphql, headers).await?;
        Ok(unwrap_data(&response, &["tables"]).clone())
    }

    /// Busca uma tabela pelo identificador (alfanumérico).
    pub async fn table(
        &self,
        table_id: &str,
        response_fields: Option<&str>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<Value> {
        let response_fields = response_fields.unwrap_or("id name url table_records_count");
        let graphql = format!(
            "{{ table(id: {table_id}) {{ {response_fields} }} }}",
            table_id = query::scalar(&Value::String(table_id.to_string())),
            response_fields = response_fields,
        );
        let response = self.execute(&graphql, headers).await?;
        Ok(unwrap_data(&response, &["table"]).clone())
    }

    /// Lista registros de uma tabela, com busca opcional.
    ///
    /// A seleção default inclui `record_fields` completo para permitir a
    /// extração de valores por field_id.
    pub async fn table_records(
        &self,
        table_id: &str,
        count: u32,
        search: &Value,
        response_fields: Option<&str>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<Value> {
        let response_fields = response_fields.unwrap_or(TABLE_RECORDS_RESPONSE_FIELDS);
        let graphql = format!(
            "{{ table_records(table_id: {table_id}, first: {count}, search: {search}) \
                {{ {response_fields} }} }}",
            table_id = query::scalar(&Value::String(table_id.to_string())),
            count = count,
            search = query::object(search),
            response_fields = response_fields,
        );
        let response = self.execute(&graphql, headers).await?;
        Ok(unwrap_data(&response, &["table_records"]).clone())
    }

    /// Busca um registro de tabela pelo identificador.
    pub async fn table_record(
        &self,
        record_id: &str,
        response_fields: Option<&str>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<Value> {
        let response_fields = response_fields.unwrap_or(TABLE_RECORD_RESPONSE_FIELDS);
        let graphql = format!(
            "{{ table_record(id: {record_id}) {{ {response_fields} }} }}",
            record_id = query::scalar(&Value::String(record_id.to_string())),
            response_fields = response_fields,
        );
        let response = self.execute(&graphql, headers).await?;
        Ok(unwrap_data(&response, &["table_record"]).clone())
    }

    /// Cria um registro de tabela.
    pub async fn create_table_record(
        &self,
        table_id: &str,
        title: Option<&str>,
        due_date: Option<DateTime<Utc>>,
        fields_attributes: &[Value],
        response_fields: Option<&str>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<Value> {
        let response_fields = response_fields
            .unwrap_or("table_record { id title due_date record_fields { name value } }");
        let title = title
            .map(|t| format!("title: {}", query::scalar(&Value::String(t.to_string()))))
            .unwrap_or_default();
        let due_date = due_date
            .map(|d| format!("due_date: {}", d.format("%Y-%m-%dT%H:%M:%S+00:00")))
            .unwrap_or_default();
        let graphql = format!(
            "mutation {{ createTableRecord(input: {{ \
                table_id: {table_id} \
                {title} \
                {due_date} \
                fields_attributes: {fields_attributes} \
            }}) {{ {response_fields} }} }}",
            table_id = query::scalar(&Value::String(table_id.to_string())),
            title = title,
            due_date = due_date,
            fields_attributes = query::object_list(fields_attributes),
            response_fields = response_fields,
        );
        let response = self.execute(&graphql, headers).await?;
        Ok(unwrap_data(&response, &["createTableRecord", "table_record"]).clone())
    }

    /// Define o valor de um campo de um registro de tabela.
    pub async fn set_table_record_field_value(
        &self,
        table_record_id: &str,
        field_id: &str,
        value: &Value,
        response_fields: Option<&str>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<Value> {
        let response_fields = response_fields
            .unwrap_or("table_record { id title } table_record_field { value }");
        let graphql = format!(
            "mutation {{ setTableRecordFieldValue(input: {{ \
                table_record_id: {table_record_id} \
                field_id: {field_id} \
                value: {value} \
            }}) {{ {response_fields} }} }}",
            table_record_id = query::scalar(&Value::String(table_record_id.to_string())),
            field_id = query::scalar(&Value::String(field_id.to_string())),
            value = query::scalar(value),
            response_fields = response_fields,
        );
        let response = self.execute(&graphql, headers).await?;
        Ok(unwrap_data(&response, &["setTableRecordFieldValue"]).clone())
    }

    /// Remove um registro de tabela.
    pub async fn delete_table_record(
        &self,
        record_id: &str,
        response_fields: Option<&str>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<Value> {
        let response_fields = response_fields.unwrap_or("success");
        let graphql = format!(
            "mutation {{ deleteTableRecord(input: {{ id: {record_id} }}) {{ {response_fields} }} }}",
            record_id = query::scalar(&Value::String(record_id.to_string())),
            response_fields = response_fields,
        );
        let response = self.execute(&graphql, headers).await?;
        Ok(unwrap_data(&response, &["deleteTableRecord"]).clone())
    }
}
