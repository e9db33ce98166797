// src/handlers/relatorios.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::{db_utils::begin_rls_transaction, error::ApiError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::relatorios::{PeriodoQuery, ResumoVendas, VendasDia},
};

// GET /api/relatorios/resumo
#[utoipa::path(
    get,
    path = "/api/relatorios/resumo",
    tag = "Relatórios",
    params(PeriodoQuery),
    responses(
        (status = 200, description = "Totais do período", body = ResumoVendas),
        (status = 422, description = "Período inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn resumo(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(query): Query<PeriodoQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let resumo = app_state
        .relatorio_service
        .resumo(&mut *tx, &query)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(resumo)))
}

// GET /api/relatorios/vendas-por-dia
#[utoipa::path(
    get,
    path = "/api/relatorios/vendas-por-dia",
    tag = "Relatórios",
    params(PeriodoQuery),
    responses(
        (status = 200, description = "Série diária de vendas pagas", body = Vec<VendasDia>)
    ),
    security(("api_jwt" = []))
)]
pub async fn vendas_por_dia(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(query): Query<PeriodoQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let serie = app_state
        .relatorio_service
        .vendas_por_dia(&mut *tx, &query)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(serie)))
}
