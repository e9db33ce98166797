// src/models/relatorios.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::models::pedidos::FormaPagamento;

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PeriodoQuery {
    /// Início do período (inclusive). Padrão: 30 dias atrás
    pub de: Option<DateTime<Utc>>,
    /// Fim do período (exclusivo). Padrão: agora
    pub ate: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Periodo {
    pub de: DateTime<Utc>,
    pub ate: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TotalPorForma {
    pub forma_pagamento: FormaPagamento,
    #[schema(example = 12)]
    pub quantidade: i64,
    #[schema(example = "480.00")]
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendasDia {
    #[schema(value_type = String, format = Date, example = "2026-10-01")]
    pub dia: NaiveDate,
    pub quantidade: i64,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResumoVendas {
    pub periodo: Periodo,
    #[schema(example = "1520.00")]
    pub total_vendido: Decimal,
    pub quantidade_pedidos: i64,
    pub ticket_medio: Decimal,
    pub total_cancelado: Decimal,
    pub quantidade_cancelados: i64,
    pub total_recargas: Decimal,
    pub pulseiras_vendidas: i64,
    pub por_forma_pagamento: Vec<TotalPorForma>,
}
