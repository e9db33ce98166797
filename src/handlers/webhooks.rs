// src/handlers/webhooks.rs

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::pagamentos::ProvedorPagamento,
};

pub const ASSINATURA_HEADER: &str = "x-hub-signature";

fn assinatura(headers: &HeaderMap) -> Option<&str> {
    headers.get(ASSINATURA_HEADER).and_then(|v| v.to_str().ok())
}

// Rotas públicas: quem chama é o provedor, sem JWT. A autenticidade vem da
// assinatura HMAC quando WEBHOOK_SECRET está configurado.
async fn receber(
    app_state: &AppState,
    locale: &Locale,
    provedor: ProvedorPagamento,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut conn = app_state
        .db_pool
        .acquire()
        .await
        .map_err(|e| AppError::from(e).to_api_error(locale))?;

    let transacao = app_state
        .pagamento_service
        .processar_webhook(&mut *conn, provedor, body, assinatura(headers))
        .await
        .map_err(|e| e.to_api_error(locale))?;

    if let Some(t) = &transacao {
        tracing::info!("Webhook {}: transação {} agora {:?}", provedor.as_str(), t.id, t.status);
    }

    Ok((StatusCode::OK, Json(json!({ "recebido": true }))))
}

// POST /api/webhooks/pagarme
#[utoipa::path(
    post,
    path = "/api/webhooks/pagarme",
    tag = "Webhooks",
    request_body(content = String, description = "Evento do Pagar.me (order.* / charge.*)", content_type = "application/json"),
    params(("x-hub-signature" = Option<String>, Header, description = "sha256=<hex> do corpo com WEBHOOK_SECRET")),
    responses(
        (status = 200, description = "Notificação recebida (cobranças desconhecidas também)"),
        (status = 401, description = "Assinatura inválida")
    )
)]
pub async fn webhook_pagarme(
    State(app_state): State<AppState>,
    locale: Locale,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    receber(&app_state, &locale, ProvedorPagamento::Pagarme, &headers, &body).await
}

// POST /api/webhooks/pagseguro
#[utoipa::path(
    post,
    path = "/api/webhooks/pagseguro",
    tag = "Webhooks",
    request_body(content = String, description = "Pedido do PagSeguro com as cobranças atualizadas", content_type = "application/json"),
    params(("x-hub-signature" = Option<String>, Header, description = "sha256=<hex> do corpo com WEBHOOK_SECRET")),
    responses(
        (status = 200, description = "Notificação recebida (cobranças desconhecidas também)"),
        (status = 401, description = "Assinatura inválida")
    )
)]
pub async fn webhook_pagseguro(
    State(app_state): State<AppState>,
    locale: Locale,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    receber(&app_state, &locale, ProvedorPagamento::Pagseguro, &headers, &body).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn le_a_assinatura_do_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(assinatura(&headers), None);

        headers.insert(ASSINATURA_HEADER, HeaderValue::from_static("sha256=abc123"));
        assert_eq!(assinatura(&headers), Some("sha256=abc123"));
    }
}
