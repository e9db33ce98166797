// src/models/cancelamentos.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_cancelamento", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StatusCancelamento {
    Solicitado,
    Aprovado,
    Rejeitado,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cancelamento {
    pub id: Uuid,
    pub pedido_id: Uuid,
    #[schema(example = "Cliente desistiu da compra")]
    pub motivo: String,
    pub observacao_admin: Option<String>,
    pub aprovado: bool,
    pub status: StatusCancelamento,
    pub solicitado_por: Option<Uuid>,
    pub aprovado_por: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SolicitarCancelamentoPayload {
    pub pedido_id: Uuid,
    #[validate(length(min = 3, message = "Descreva o motivo do cancelamento."))]
    pub motivo: String,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecisaoCancelamentoPayload {
    pub observacao: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CancelamentoQuery {
    pub status: Option<StatusCancelamento>,
}
