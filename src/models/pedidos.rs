// src/models/pedidos.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "forma_pagamento", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FormaPagamento {
    Dinheiro,
    Cartao,
    Pix,
    Boleto,
    Pulseira,
}

impl FormaPagamento {
    /// Formas que só ficam pagas depois da confirmação do provedor.
    pub fn aguarda_confirmacao(&self) -> bool {
        matches!(self, FormaPagamento::Pix | FormaPagamento::Boleto)
    }

    pub fn descricao(&self) -> &'static str {
        match self {
            FormaPagamento::Dinheiro => "Dinheiro",
            FormaPagamento::Cartao => "Cartão",
            FormaPagamento::Pix => "PIX",
            FormaPagamento::Boleto => "Boleto",
            FormaPagamento::Pulseira => "Saldo da pulseira",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_pedido", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StatusPedido {
    Pendente,
    Pago,
    Cancelado,
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pedido {
    pub id: Uuid,
    #[schema(example = 1024)]
    pub numero: i32,
    pub cliente_id: Option<Uuid>,
    pub pulseira_id: Option<Uuid>,
    pub terminal_id: Option<Uuid>,
    pub voucher_id: Option<Uuid>,
    #[schema(example = "45.00")]
    pub subtotal: Decimal,
    #[schema(example = "5.00")]
    pub desconto: Decimal,
    #[schema(example = "40.00")]
    pub total: Decimal,
    pub forma_pagamento: FormaPagamento,
    pub status: StatusPedido,
    pub observacao: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemPedido {
    pub id: Uuid,
    pub pedido_id: Uuid,
    pub produto_id: Uuid,
    #[schema(example = "Refrigerante Lata")]
    pub nome: String,
    #[schema(example = 2)]
    pub quantidade: i32,
    #[schema(example = "6.50")]
    pub preco_unitario: Decimal,
    #[schema(example = "13.00")]
    pub total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PedidoDetalhe {
    #[serde(flatten)]
    pub pedido: Pedido,
    pub cliente_nome: Option<String>,
    pub pulseira_codigo: Option<String>,
    pub itens: Vec<ItemPedido>,
}

// --- Payloads ---

/// Teto de unidades de um mesmo produto num pedido.
pub const QUANTIDADE_MAXIMA_ITEM: i32 = 10_000;

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemPedidoPayload {
    pub produto_id: Uuid,
    #[validate(range(min = 1, max = 10000, message = "A quantidade deve estar entre 1 e 10000."))]
    #[schema(example = 2)]
    pub quantidade: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CriarPedidoPayload {
    #[validate(length(min = 1, message = "O pedido precisa de ao menos um item."), nested)]
    pub itens: Vec<ItemPedidoPayload>,
    pub forma_pagamento: FormaPagamento,
    pub cliente_id: Option<Uuid>,
    /// Obrigatório quando a forma de pagamento é `pulseira`
    pub pulseira_codigo: Option<String>,
    pub terminal_id: Option<Uuid>,
    #[schema(example = "BEMVINDO10")]
    pub voucher_codigo: Option<String>,
    pub observacao: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct PedidoQuery {
    pub status: Option<StatusPedido>,
    /// Início do período (inclusive), RFC 3339
    pub de: Option<DateTime<Utc>>,
    /// Fim do período (exclusivo), RFC 3339
    pub ate: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantidade_do_item_tem_teto() {
        let item = |quantidade| ItemPedidoPayload { produto_id: Uuid::new_v4(), quantidade };
        assert!(item(1).validate().is_ok());
        assert!(item(QUANTIDADE_MAXIMA_ITEM).validate().is_ok());
        assert!(item(0).validate().is_err());
        assert!(item(2_000_000_000).validate().is_err());
    }
}
