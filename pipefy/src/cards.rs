//! Operações de cards e comentários

use crate::client::PipefyClient;
use crate::error::Result;
use crate::fields::unwrap_data;
use crate::query;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;

/// Seleção default com a lista de campos completa (id/type/value/array_value),
/// usada pela extração de valores por field_id
const CARDS_RESPONSE_FIELDS: &str = "edges { node { id title assignees { id name email } \
    comments { text } comments_count current_phase { id name } done due_date \
    fields { field{id type} name value array_value} labels { id name } \
    phases_history { phase { id name } firstTimeIn lastTimeOut } url } }";

const CARD_RESPONSE_FIELDS: &str = "title assignees { id name email } comments { id } \
    comments_count current_phase { id name } pipe { id name } done due_date \
    fields { field{id type} name value array_value } labels { id name } \
    phases_history { phase { id name } firstTimeIn lastTimeOut } url";

impl PipefyClient {
    /// Lista cards de um pipe, com busca opcional.
    pub async fn cards(
        &self,
        pipe_id: i64,
        count: u32,
        search: &Value,
        response_fields: Option<&str>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<Value> {
        let response_fields = response_fields.unwrap_or(CARDS_RESPONSE_FIELDS);
        let graphql = format!(
            "{{ cards(pipe_id: {pipe_id}, first: {count}, search: {search}) {{ {response_fields} }} }}",
            pipe_id = pipe_id,
            count = count,
            search = query::object(search),
            response_fields = response_fields,
        );
        let response = self.execute(&graphql, headers).await?;
        Ok(unwrap_data(&response, &["cards"]).clone())
    }

    /// Busca um card pelo identificador.
    pub async fn card(
        &self,
        card_id: i64,
        response_fields: Option<&str>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<Value> {
        let response_fields = response_fields.unwrap_or(CARD_RESPONSE_FIELDS);
        let graphql = format!(
            "{{ card(id: {card_id}) {{ {response_fields} }} }}",
            card_id = card_id,
            response_fields = response_fields,
        );
        let response = self.execute(&graphql, headers).await?;
        Ok(unwrap_data(&response, &["card"]).clone())
    }

    /// Cria um card no pipe informado.
    ///
    /// `fields_attributes` é renderizado como literal de objeto GraphQL
    /// (chaves sem aspas); `parent_ids` como lista de escalares.
    pub async fn create_card(
        &self,
        pipe_id: i64,
        fields_attributes: &Value,
        parent_ids: &[Value],
        response_fields: Option<&str>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<Value> {
        let response_fields = response_fields.unwrap_or("card { id title }");
        let graphql = format!(
            "mutation {{ createCard(input: {{ \
                pipe_id: {pipe_id} \
                fields_attributes: {fields_attributes} \
                parent_ids: [ {parent_ids} ] \
            }}) {{ {response_fields} }} }}",
            pipe_id = pipe_id,
            fields_attributes = query::object(fields_attributes),
            parent_ids = query::id_list(parent_ids),
            response_fields = response_fields,
        );
        let response = self.execute(&graphql, headers).await?;
        Ok(unwrap_data(&response, &["createCard", "card"]).clone())
    }

    /// Atualiza título, prazo, responsáveis e labels de um card.
    pub async fn update_card(
        &self,
        card_id: i64,
        title: Option<&str>,
        due_date: Option<DateTime<Utc>>,
        assignee_ids: &[Value],
        label_ids: &[Value],
        response_fields: Option<&str>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<Value> {
        let response_fields = response_fields.unwrap_or("card { id title }");
        let due_date = due_date
            .map(|d| d.format("%Y-%m-%dT%H:%M:%S+00:00").to_string())
            .unwrap_or_else(|| "null".to_string());
        let graphql = format!(
            "mutation {{ updateCard(input: {{ \
                id: {card_id} \
                title: {title} \
                due_date: {due_date} \
                assignee_ids: [ {assignee_ids} ] \
                label_ids: [ {label_ids} ] \
            }}) {{ {response_fields} }} }}",
            card_id = card_id,
            title = query::opt_scalar(title),
            due_date = due_date,
            assignee_ids = query::id_list(assignee_ids),
            label_ids = query::id_list(label_ids),
            response_fields = response_fields,
        );
        let response = self.execute(&graphql, headers).await?;
        Ok(unwrap_data(&response, &["updateCard", "card"]).clone())
    }

    /// Remove um card; em caso de sucesso a API responde `success: true`.
    pub async fn delete_card(
        &self,
        card_id: i64,
        response_fields: Option<&str>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<Value> {
        let response_fields = response_fields.unwrap_or("success");
        let graphql = format!(
            "mutation {{ deleteCard(input: {{ id: {card_id} }}) {{ {response_fields} }} }}",
            card_id = card_id,
            response_fields = response_fields,
        );
        let response = self.execute(&graphql, headers).await?;
        Ok(unwrap_data(&response, &["deleteCard"]).clone())
    }

    /// Move um card para outra fase do pipe.
    pub async fn move_card_to_phase(
        &self,
        card_id: i64,
        destination_phase_id: i64,
        response_fields: Option<&str>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<Value> {
        let response_fields = response_fields.unwrap_or("card{ id current_phase { name } }");
        let graphql = format!(
            "mutation {{ moveCardToPhase(input: {{ \
                card_id: {card_id} \
                destination_phase_id: {destination_phase_id} \
            }}) {{ {response_fields} }} }}",
            card_id = card_id,
            destination_phase_id = destination_phase_id,
            response_fields = response_fields,
        );
        let response = self.execute(&graphql, headers).await?;
        Ok(unwrap_data(&response, &["moveCardToPhase", "card"]).clone())
    }

    /// Atualiza o valor de um campo do card.
    ///
    /// `new_value` aceita escalar ou lista (o pipeline de anexos passa a
    /// lista ordenada de paths canônicos por aqui).
    pub async fn update_card_field(
        &self,
        card_id: i64,
        field_id: &str,
        new_value: &Value,
        response_fields: Option<&str>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<Value> {
        let response_fields = response_fields.unwrap_or("card{ id }");
        let graphql = format!(
            "mutation {{ updateCardField(input: {{ \
                card_id: {card_id} \
                field_id: {field_id} \
                new_value: {new_value} \
            }}) {{success {response_fields} }} }}",
            card_id = card_id,
            field_id = query::scalar(&Value::String(field_id.to_string())),
            new_value = query::scalar(new_value),
            response_fields = response_fields,
        );
        let response = self.execute(&graphql, headers).await?;
        let result = unwrap_data(&response, &["updateCardField"]).clone();
        tracing::info!("Resposta Pipefy atualização de campo: {}", result);
        Ok(result)
    }

    /// Cria um comentário em um card.
    pub async fn create_comment(
        &self,
        card_id: i64,
        text: &str,
        response_fields: Option<&str>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<Value> {
        let response_fields = response_fields.unwrap_or("comment { id text }");
        let graphql = format!(
            "mutation {{ createComment(input: {{ \
                card_id: {card_id} \
                text: {text} \
            }}) {{ {response_fields} }} }}",
            card_id = card_id,
            text = query::scalar(&Value::String(text.to_string())),
            response_fields = response_fields,
        );
        let response = self.execute(&graphql, headers).await?;
        Ok(unwrap_data(&response, &["createComment", "comment"]).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_card_selection_carries_field_ids() {
        // a extração por field_id depende de field{id type} na seleção
        assert!(CARD_RESPONSE_FIELDS.contains("field{id type}"));
        assert!(CARDS_RESPONSE_FIELDS.contains("array_value"));
    }

    #[test]
    fn test_search_object_rendered_without_quoted_keys() {
        let search = json!({"title": "2200100080203574801"});
        let rendered = query::object(&search);
        assert_eq!(rendered, "{title: \"2200100080203574801\"}");
    }
}
