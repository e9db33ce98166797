// src/models/terminais.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_terminal", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StatusTerminal {
    Ativo,
    Inativo,
    Manutencao,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Terminal {
    pub id: Uuid,
    #[schema(example = "Caixa 01 - Entrada")]
    pub nome: String,
    #[schema(example = "SN-A7F3-0021")]
    pub identificador: String,
    pub localizacao: Option<String>,
    pub status: StatusTerminal,
    pub ultimo_acesso: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TerminalPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub nome: String,
    #[validate(length(min = 3, message = "Identificador muito curto."))]
    pub identificador: String,
    pub localizacao: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlterarStatusTerminalPayload {
    pub status: StatusTerminal,
}
