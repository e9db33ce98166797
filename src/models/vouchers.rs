// src/models/vouchers.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_voucher", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TipoVoucher {
    Valor,      // Desconto fixo em R$
    Percentual, // Desconto em % do subtotal
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_voucher", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StatusVoucher {
    Ativo,
    Inativo,
    Esgotado,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Voucher {
    pub id: Uuid,
    #[schema(example = "BEMVINDO10")]
    pub codigo: String,
    pub descricao: Option<String>,
    pub tipo: TipoVoucher,
    #[schema(example = "10.00")]
    pub valor: Decimal,
    #[schema(value_type = Option<String>, format = Date, example = "2026-12-31")]
    pub validade: Option<NaiveDate>,
    pub usos_maximos: i32,
    pub usos: i32,
    pub status: StatusVoucher,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
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
pub struct VoucherPayload {
    #[validate(length(min = 3, max = 32, message = "O código deve ter entre 3 e 32 caracteres."))]
    pub codigo: String,
    pub descricao: Option<String>,
    pub tipo: TipoVoucher,
    #[validate(custom(function = "validate_positive"))]
    pub valor: Decimal,
    #[schema(value_type = Option<String>, format = Date)]
    pub validade: Option<NaiveDate>,
    #[validate(range(min = 1, message = "Informe ao menos um uso."))]
    #[serde(default = "um")]
    pub usos_maximos: i32,
}

fn um() -> i32 {
    1
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlterarStatusVoucherPayload {
    pub status: StatusVoucher,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidarVoucherPayload {
    #[validate(length(min = 1))]
    pub codigo: String,
    #[schema(example = "80.00")]
    pub subtotal: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoucherValidado {
    pub voucher: Voucher,
    #[schema(example = "8.00")]
    pub desconto: Decimal,
}
