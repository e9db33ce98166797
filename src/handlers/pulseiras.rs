// src/handlers/pulseiras.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::{
        db_utils::begin_rls_transaction,
        error::{ApiError, AppError},
    },
    config::AppState,
    handlers::pagamentos::emitir_cobranca,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::pulseiras::{
        AlterarStatusPulseiraPayload, ExtratoPulseira, Pulseira, PulseiraQuery, RecargaCriada,
        RecargaPayload, VenderPulseiraPayload,
    },
};

// POST /api/pulseiras
#[utoipa::path(
    post,
    path = "/api/pulseiras",
    tag = "Pulseiras",
    request_body = VenderPulseiraPayload,
    responses(
        (status = 201, description = "Pulseira vendida", body = ExtratoPulseira),
        (status = 409, description = "Código de pulseira já utilizado"),
        (status = 422, description = "Forma de pagamento não aceita na venda")
    ),
    security(("api_jwt" = []))
)]
pub async fn vender_pulseira(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<VenderPulseiraPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let extrato = app_state
        .pulseira_service
        .vender(&mut *tx, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(extrato)))
}

// GET /api/pulseiras
#[utoipa::path(
    get,
    path = "/api/pulseiras",
    tag = "Pulseiras",
    params(PulseiraQuery),
    responses(
        (status = 200, description = "Pulseiras", body = Vec<Pulseira>)
    ),
    security(("api_jwt" = []))
)]
pub async fn listar_pulseiras(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(query): Query<PulseiraQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let pulseiras = app_state
        .pulseira_service
        .listar(&mut *tx, query.busca.as_deref(), query.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(pulseiras)))
}

// GET /api/pulseiras/{codigo}
#[utoipa::path(
    get,
    path = "/api/pulseiras/{codigo}",
    tag = "Pulseiras",
    params(("codigo" = String, Path, description = "Código impresso/NFC da pulseira")),
    responses(
        (status = 200, description = "Pulseira com saldo atual", body = Pulseira),
        (status = 404, description = "Pulseira não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn buscar_pulseira(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(codigo): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let pulseira = app_state
        .pulseira_service
        .buscar_por_codigo(&mut *tx, &codigo)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(pulseira)))
}

// PATCH /api/pulseiras/{codigo}/status
#[utoipa::path(
    patch,
    path = "/api/pulseiras/{codigo}/status",
    tag = "Pulseiras",
    params(("codigo" = String, Path, description = "Código da pulseira")),
    request_body = AlterarStatusPulseiraPayload,
    responses(
        (status = 200, description = "Status alterado", body = Pulseira),
        (status = 404, description = "Pulseira não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn alterar_status_pulseira(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(codigo): Path<String>,
    Json(payload): Json<AlterarStatusPulseiraPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let pulseira = app_state
        .pulseira_service
        .buscar_por_codigo(&mut *tx, &codigo)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let pulseira = app_state
        .pulseira_service
        .alterar_status(&mut *tx, pulseira.id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(pulseira)))
}

// POST /api/pulseiras/{codigo}/recargas
#[utoipa::path(
    post,
    path = "/api/pulseiras/{codigo}/recargas",
    tag = "Pulseiras",
    params(("codigo" = String, Path, description = "Código da pulseira")),
    request_body = RecargaPayload,
    responses(
        (status = 201, description = "Recarga registrada (via PIX traz o QR Code)", body = RecargaCriada),
        (status = 422, description = "Pulseira bloqueada/inativa ou forma de pagamento não aceita"),
        (status = 502, description = "Falha no provedor PIX")
    ),
    security(("api_jwt" = []))
)]
pub async fn recarregar_pulseira(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(codigo): Path<String>,
    Json(payload): Json<RecargaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let (mut recarga, cobranca) = app_state
        .pulseira_service
        .recarregar(&mut *tx, &codigo, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale))?;

    // PIX: a pulseira já foi liberada, agora o provedor gera o QR Code
    if let Some(cobranca) = cobranca {
        let transacao = emitir_cobranca(&app_state, &user, cobranca)
            .await
            .map_err(|e| e.to_api_error(&locale))?;
        recarga.transacao_pix = Some(transacao);
    }

    Ok((StatusCode::CREATED, Json(recarga)))
}

// GET /api/pulseiras/{codigo}/extrato
#[utoipa::path(
    get,
    path = "/api/pulseiras/{codigo}/extrato",
    tag = "Pulseiras",
    params(("codigo" = String, Path, description = "Código da pulseira")),
    responses(
        (status = 200, description = "Vendas, recargas e consumos da pulseira", body = ExtratoPulseira),
        (status = 404, description = "Pulseira não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn extrato_pulseira(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(codigo): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let extrato = app_state
        .pulseira_service
        .extrato(&mut *tx, &codigo)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(extrato)))
}
