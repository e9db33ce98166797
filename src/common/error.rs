use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use thiserror::Error;

use crate::middleware::i18n::Locale;

// Erros de domínio. Cada variante vira um status HTTP + mensagem traduzida
// em `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso restrito a administradores")]
    Forbidden,

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Conflito: {0}")]
    Conflict(String),

    #[error("Estoque insuficiente para {0}")]
    EstoqueInsuficiente(String),

    #[error("Saldo insuficiente na pulseira")]
    SaldoInsuficiente,

    #[error("Pulseira indisponível (status {0})")]
    PulseiraIndisponivel(String),

    #[error("Voucher inválido: {0}")]
    VoucherInvalido(String),

    #[error("Regra de negócio violada: {0}")]
    RegraNegocio(String),

    #[error("Operação não suportada: {0}")]
    NaoSuportado(String),

    #[error("Gateway de pagamento não configurado: {0}")]
    GatewayNaoConfigurado(String),

    #[error("Erro do provedor de pagamento: {0}")]
    ProvedorPagamento(String),

    #[error("Assinatura do webhook inválida")]
    AssinaturaInvalida,

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro HTTP: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

// O erro que de fato sai na resposta HTTP.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    /// Converte o erro de domínio em resposta, escolhendo a mensagem pelo idioma.
    pub fn to_api_error(&self, locale: &Locale) -> ApiError {
        let en = locale.is_english();
        let pick = |pt: String, en_msg: String| if en { en_msg } else { pt };

        let (status, error) = match self {
            AppError::ValidationError(errors) => {
                let mut details: HashMap<String, Vec<String>> = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                return ApiError {
                    status: StatusCode::BAD_REQUEST,
                    error: pick(
                        "Um ou mais campos são inválidos.".into(),
                        "One or more fields are invalid.".into(),
                    ),
                    details: Some(json!(details)),
                };
            }
            AppError::InvalidToken | AppError::JwtError(_) => (
                StatusCode::UNAUTHORIZED,
                pick(
                    "Token de autenticação inválido ou ausente.".into(),
                    "Missing or invalid authentication token.".into(),
                ),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                pick(
                    "Apenas administradores podem realizar esta ação.".into(),
                    "Only administrators can perform this action.".into(),
                ),
            ),
            AppError::ResourceNotFound(what) => (
                StatusCode::NOT_FOUND,
                pick(format!("{} não encontrado.", what), format!("{} not found.", what)),
            ),
            AppError::DatabaseError(sqlx::Error::RowNotFound) => (
                StatusCode::NOT_FOUND,
                pick("Registro não encontrado.".into(), "Record not found.".into()),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::EstoqueInsuficiente(produto) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                pick(
                    format!("Estoque insuficiente para o produto {}.", produto),
                    format!("Not enough stock for product {}.", produto),
                ),
            ),
            AppError::SaldoInsuficiente => (
                StatusCode::UNPROCESSABLE_ENTITY,
                pick(
                    "Saldo insuficiente na pulseira.".into(),
                    "Insufficient wristband balance.".into(),
                ),
            ),
            AppError::PulseiraIndisponivel(status) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                pick(
                    format!("Pulseira indisponível (status: {}).", status),
                    format!("Wristband unavailable (status: {}).", status),
                ),
            ),
            AppError::VoucherInvalido(motivo) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                pick(
                    format!("Voucher inválido: {}.", motivo),
                    format!("Invalid voucher: {}.", motivo),
                ),
            ),
            AppError::RegraNegocio(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::NaoSuportado(msg) => (
                StatusCode::BAD_REQUEST,
                pick(
                    format!("Operação não suportada: {}.", msg),
                    format!("Unsupported operation: {}.", msg),
                ),
            ),
            AppError::GatewayNaoConfigurado(provedor) => (
                StatusCode::SERVICE_UNAVAILABLE,
                pick(
                    format!("Provedor de pagamento {} não configurado.", provedor),
                    format!("Payment provider {} is not configured.", provedor),
                ),
            ),
            AppError::ProvedorPagamento(_) | AppError::HttpError(_) => {
                tracing::error!("Falha no provedor de pagamento: {}", self);
                (
                    StatusCode::BAD_GATEWAY,
                    pick(
                        "O provedor de pagamento não respondeu como esperado. Tente novamente.".into(),
                        "The payment provider did not respond as expected. Please retry.".into(),
                    ),
                )
            }
            AppError::AssinaturaInvalida => (
                StatusCode::UNAUTHORIZED,
                pick("Assinatura inválida.".into(), "Invalid signature.".into()),
            ),

            // Todo o resto vira 500 e fica registrado no log.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    pick(
                        "Ocorreu um erro inesperado.".into(),
                        "An unexpected error occurred.".into(),
                    ),
                )
            }
        };

        ApiError { status, error, details: None }
    }
}

/// Traduz violações de unicidade do Postgres em `Conflict`.
pub(crate) fn map_unique_violation(e: sqlx::Error, mensagem: &str) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::Conflict(mensagem.to_string());
        }
        if db_err.is_foreign_key_violation() {
            return AppError::Conflict(format!("{} (registro vinculado)", mensagem));
        }
    }
    AppError::DatabaseError(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt() -> Locale {
        Locale("pt".into())
    }

    #[test]
    fn not_found_vira_404() {
        let err = AppError::ResourceNotFound("Cliente".into()).to_api_error(&pt());
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.error, "Cliente não encontrado.");
    }

    #[test]
    fn row_not_found_do_sqlx_vira_404() {
        let err = AppError::DatabaseError(sqlx::Error::RowNotFound).to_api_error(&pt());
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn mensagem_em_ingles_quando_pedido() {
        let err = AppError::SaldoInsuficiente.to_api_error(&Locale("en".into()));
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.error, "Insufficient wristband balance.");
    }

    #[test]
    fn erro_interno_nao_vaza_detalhes() {
        let err = AppError::InternalServerError(anyhow::anyhow!("senha do banco: 123"))
            .to_api_error(&pt());
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.error.contains("123"));
    }

    #[test]
    fn validacao_traz_detalhes_por_campo() {
        let mut errors = validator::ValidationErrors::new();
        let mut e = validator::ValidationError::new("length");
        e.message = Some("O nome é obrigatório.".into());
        errors.add("nome", e);

        let err = AppError::ValidationError(errors).to_api_error(&pt());
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        let details = err.details.expect("detalhes");
        assert_eq!(details["nome"][0], "O nome é obrigatório.");
    }
}
