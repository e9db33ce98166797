// src/handlers/documentos.rs

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{
    common::{db_utils::begin_rls_transaction, error::ApiError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::relatorios::PeriodoQuery,
};

// Headers para o navegador baixar o PDF
fn pdf(nome_arquivo: &str, bytes: Vec<u8>) -> Response {
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", nome_arquivo),
        ),
    ];
    (headers, bytes).into_response()
}

// GET /api/pedidos/{id}/recibo
#[utoipa::path(
    get,
    path = "/api/pedidos/{id}/recibo",
    tag = "Documentos",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Recibo em PDF"),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn recibo_pedido(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let bytes = app_state
        .document_service
        .gerar_recibo_pedido(&mut *tx, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(pdf(&format!("pedido_{}.pdf", id), bytes))
}

// GET /api/cancelamentos/{id}/comprovante
#[utoipa::path(
    get,
    path = "/api/cancelamentos/{id}/comprovante",
    tag = "Documentos",
    params(("id" = Uuid, Path, description = "ID do cancelamento")),
    responses(
        (status = 200, description = "Comprovante de cancelamento em PDF"),
        (status = 422, description = "Cancelamento ainda não aprovado")
    ),
    security(("api_jwt" = []))
)]
pub async fn comprovante_cancelamento(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let bytes = app_state
        .document_service
        .gerar_comprovante_cancelamento(&mut *tx, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(pdf(&format!("cancelamento_{}.pdf", id), bytes))
}

// GET /api/relatorios/vendas/pdf
#[utoipa::path(
    get,
    path = "/api/relatorios/vendas/pdf",
    tag = "Documentos",
    params(PeriodoQuery),
    responses(
        (status = 200, description = "Relatório de vendas do período em PDF"),
        (status = 422, description = "Período inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn relatorio_vendas(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(query): Query<PeriodoQuery>,
) -> Result<Response, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let bytes = app_state
        .document_service
        .gerar_relatorio_vendas(&mut *tx, &query)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(pdf("relatorio_vendas.pdf", bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_vai_como_anexo() {
        let resposta = pdf("pedido_1.pdf", b"%PDF-1.4".to_vec());
        let headers = resposta.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"pedido_1.pdf\""
        );
    }
}
