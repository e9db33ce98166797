// src/models/produtos.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_produto", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StatusProduto {
    Ativo,
    Inativo,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Produto {
    pub id: Uuid,
    #[schema(example = "Refrigerante Lata")]
    pub nome: String,
    pub descricao: Option<String>,
    #[schema(example = "REF-350")]
    pub codigo: String,
    #[schema(example = "6.50")]
    pub preco: Decimal,
    #[schema(example = 48)]
    pub estoque: i32,
    #[schema(example = "Bebidas")]
    pub categoria: Option<String>,
    pub status: StatusProduto,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Teto do estoque de um produto e de um único ajuste.
pub const ESTOQUE_MAXIMO: i32 = 1_000_000;

pub(crate) fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProdutoPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub nome: String,

    pub descricao: Option<String>,

    #[validate(length(min = 1, message = "O código é obrigatório."))]
    pub codigo: String,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(example = "6.50")]
    pub preco: Decimal,

    #[validate(range(min = 0, max = 1000000, message = "O estoque deve estar entre 0 e 1000000."))]
    #[serde(default)]
    pub estoque: i32,

    pub categoria: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlterarStatusProdutoPayload {
    pub status: StatusProduto,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AjusteEstoquePayload {
    /// Positivo = entrada, negativo = saída
    #[validate(range(min = -1000000, max = 1000000, message = "O ajuste deve estar entre -1000000 e 1000000."))]
    #[schema(example = -2)]
    pub delta: i32,
    pub motivo: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProdutoQuery {
    pub busca: Option<String>,
    pub status: Option<StatusProduto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ajuste_de_estoque_limitado() {
        let ajuste = |delta| AjusteEstoquePayload { delta, motivo: None };
        assert!(ajuste(-2).validate().is_ok());
        assert!(ajuste(ESTOQUE_MAXIMO).validate().is_ok());
        assert!(ajuste(-ESTOQUE_MAXIMO).validate().is_ok());
        assert!(ajuste(i32::MAX).validate().is_err());
        assert!(ajuste(i32::MIN).validate().is_err());
    }
}
