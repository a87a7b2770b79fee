//! Operações de pipes e fases

use crate::client::PipefyClient;
use crate::error::Result;
use crate::fields::unwrap_data;
use crate::query;
use serde_json::Value;
use std::collections::HashMap;

const PIPES_RESPONSE_FIELDS: &str =
    "id name phases { name cards (first: 5) { edges { node { id title } } } }";

const PIPE_RESPONSE_FIELDS: &str = "id name start_form_fields { label id } \
    labels { name id } phases { name fields { label id } \
    cards(first: 5) { edges { node { id, title } } } }";

const PHASE_CARDS_RESPONSE_FIELDS: &str = "edges { node { id title assignees { id name email } \
    comments { text } comments_count current_phase { id name } done due_date \
    fields { field{id type} name value array_value} labels { id name } \
    phases_history { phase { id name } firstTimeIn lastTimeOut } url } }";

impl PipefyClient {
    /// Lista pipes pelos identificadores.
    pub async fn pipes(
        &self,
        ids: &[Value],
        response_fields: Option<&str>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<Value> {
        let response_fields = response_fields.unwrap_or(PIPES_RESPONSE_FIELDS);
        let graphql = format!(
            "{{ pipes (ids: [{ids}]) {{ {response_fields} }} }}",
            ids = query::id_list(ids),
            response_fields = response_fields,
        );
        let response = self.execute(&graphql, headers).await?;
        Ok(unwrap_data(&response, &["pipes"]).clone())
    }

    /// Busca um pipe pelo identificador.
    pub async fn pipe(
        &self,
        pipe_id: i64,
        response_fields: Option<&str>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<Value> {
        let response_fields = response_fields.unwrap_or(PIPE_RESPONSE_FIELDS);
        let graphql = format!(
            "{{ pipe (id: {pipe_id}) {{ {response_fields} }} }}",
            pipe_id = pipe_id,
            response_fields = response_fields,
        );
        let response = self.execute(&graphql, headers).await?;
        Ok(unwrap_data(&response, &["pipe"]).clone())
    }

    /// Busca uma fase e seus cards, com busca opcional por título.
    pub async fn phase(
        &self,
        phase_id: i64,
        count: u32,
        search: &Value,
        response_fields: Option<&str>,
        response_card_fields: Option<&str>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<Value> {
        let response_fields = response_fields.unwrap_or("id name cards_count");
        let response_card_fields = response_card_fields.unwrap_or(PHASE_CARDS_RESPONSE_FIELDS);
        let graphql = format!(
            "{{ phase(id: {phase_id} ) {{ {response_fields} \
                cards(first:{count}, search: {search}) {{ {response_card_fields} }} }} }}",
            phase_id = phase_id,
            count = count,
            search = query::object(search),
            response_fields = response_fields,
            response_card_fields = response_card_fields,
        );
        let response = self.execute(&graphql, headers).await?;
        Ok(unwrap_data(&response, &["phase"]).clone())
    }

    /// Remove um pipe; em caso de sucesso a API responde `success: true`.
    pub async fn delete_pipe(
        &self,
        pipe_id: i64,
        response_fields: Option<&str>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<Value> {
        let response_fields = response_fields.unwrap_or("success");
        let graphql = format!(
            "mutation {{ deletePipe(input: {{ id: {pipe_id} }}) {{ {response_fields} }} }}",
            pipe_id = pipe_id,
            response_fields = response_fields,
        );
        let response = self.execute(&graphql, headers).await?;
        Ok(unwrap_data(&response, &["deletePipe"]).clone())
    }
}
