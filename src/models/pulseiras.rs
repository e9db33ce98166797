// src/models/pulseiras.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{
    pagamentos::TransacaoPix,
    pedidos::{FormaPagamento, StatusPedido},
    produtos::validate_not_negative,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_pulseira", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StatusPulseira {
    Ativa,
    Inativa,
    Bloqueada,
}

impl StatusPulseira {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusPulseira::Ativa => "ativa",
            StatusPulseira::Inativa => "inativa",
            StatusPulseira::Bloqueada => "bloqueada",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_recarga", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StatusRecarga {
    Pendente,
    Pago,
    Cancelado,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pulseira {
    pub id: Uuid,
    #[schema(example = "PL-000123")]
    pub codigo: String,
    pub cliente_id: Option<Uuid>,
    #[schema(example = "50.00")]
    pub saldo: Decimal,
    pub status: StatusPulseira,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendaPulseira {
    pub id: Uuid,
    pub pulseira_id: Uuid,
    pub cliente_id: Option<Uuid>,
    pub terminal_id: Option<Uuid>,
    #[schema(example = "10.00")]
    pub valor: Decimal,
    pub forma_pagamento: FormaPagamento,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecargaPulseira {
    pub id: Uuid,
    pub pulseira_id: Uuid,
    pub terminal_id: Option<Uuid>,
    #[schema(example = "30.00")]
    pub valor: Decimal,
    pub forma_pagamento: FormaPagamento,
    pub status: StatusRecarga,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Pedidos pagos com saldo da pulseira
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsumoPulseira {
    pub pedido_id: Uuid,
    pub numero: i32,
    pub total: Decimal,
    pub status: StatusPedido,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtratoPulseira {
    pub pulseira: Pulseira,
    pub vendas: Vec<VendaPulseira>,
    pub recargas: Vec<RecargaPulseira>,
    pub consumos: Vec<ConsumoPulseira>,
}

// Resposta da recarga: via PIX a transação vem junto para o QR Code
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecargaCriada {
    pub recarga: RecargaPulseira,
    pub pulseira: Pulseira,
    pub transacao_pix: Option<TransacaoPix>,
}

fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor deve ser maior que zero.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VenderPulseiraPayload {
    #[validate(length(min = 3, message = "Código da pulseira inválido."))]
    pub codigo: String,
    pub cliente_id: Option<Uuid>,
    pub terminal_id: Option<Uuid>,

    /// Preço cobrado pela pulseira em si
    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub valor: Decimal,

    /// Crédito já carregado na venda
    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub credito_inicial: Decimal,

    pub forma_pagamento: FormaPagamento,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecargaPayload {
    #[validate(custom(function = "validate_positive"))]
    #[schema(example = "30.00")]
    pub valor: Decimal,
    pub forma_pagamento: FormaPagamento,
    pub terminal_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlterarStatusPulseiraPayload {
    pub status: StatusPulseira,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PulseiraQuery {
    /// Trecho do código da pulseira
    pub busca: Option<String>,
    pub status: Option<StatusPulseira>,
}
