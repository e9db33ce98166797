// src/models/clientes.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

// Mapeia o CREATE TYPE status_cliente do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_cliente", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StatusCliente {
    Ativo,
    Inativo,
    Bloqueado,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cliente {
    pub id: Uuid,
    #[schema(example = "Maria da Silva")]
    pub nome: String,
    #[schema(example = "12345678900")]
    pub documento: Option<String>,
    #[schema(example = "maria@email.com")]
    pub email: Option<String>,
    #[schema(example = "(11) 99999-8888")]
    pub telefone: Option<String>,
    pub endereco: Option<String>,
    pub status: StatusCliente,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Usado tanto no POST quanto no PUT (o formulário do painel é o mesmo)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientePayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Maria da Silva")]
    pub nome: String,

    // CPF (11) ou CNPJ (14), só dígitos
    #[validate(length(min = 11, max = 14, message = "Documento deve ser CPF ou CNPJ."))]
    #[schema(example = "12345678900")]
    pub documento: Option<String>,

    #[validate(email(message = "E-mail inválido."))]
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub endereco: Option<String>,

    pub status: Option<StatusCliente>,
}

impl ClientePayload {
    /// Remove pontuação do CPF/CNPJ antes de validar e gravar.
    pub fn normalizar(mut self) -> Self {
        self.documento = self
            .documento
            .map(|d| d.chars().filter(|c| c.is_ascii_digit()).collect::<String>())
            .filter(|d| !d.is_empty());
        self.nome = self.nome.trim().to_string();
        self
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BuscaQuery {
    /// Trecho do nome, documento ou e-mail
    pub busca: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normaliza_documento_pontuado() {
        let payload = ClientePayload {
            nome: "  João ".into(),
            documento: Some("123.456.789-00".into()),
            email: None,
            telefone: None,
            endereco: None,
            status: None,
        }
        .normalizar();

        assert_eq!(payload.nome, "João");
        assert_eq!(payload.documento.as_deref(), Some("12345678900"));
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn documento_so_com_pontuacao_vira_none() {
        let payload = ClientePayload {
            nome: "Ana".into(),
            documento: Some("..-".into()),
            email: Some("nao-e-email".into()),
            telefone: None,
            endereco: None,
            status: None,
        }
        .normalizar();

        assert_eq!(payload.documento, None);
        assert!(payload.validate().is_err());
    }
}
