// src/handlers/vouchers.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        db_utils::begin_rls_transaction,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::vouchers::{
        AlterarStatusVoucherPayload, ValidarVoucherPayload, Voucher, VoucherPayload, VoucherValidado,
    },
};

// POST /api/vouchers
#[utoipa::path(
    post,
    path = "/api/vouchers",
    tag = "Vouchers",
    request_body = VoucherPayload,
    responses(
        (status = 201, description = "Voucher criado (código gravado em maiúsculas)", body = Voucher),
        (status = 409, description = "Código já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn criar_voucher(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<VoucherPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let voucher = app_state
        .voucher_service
        .criar(&mut *tx, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(voucher)))
}

// GET /api/vouchers
#[utoipa::path(
    get,
    path = "/api/vouchers",
    tag = "Vouchers",
    responses(
        (status = 200, description = "Vouchers", body = Vec<Voucher>)
    ),
    security(("api_jwt" = []))
)]
pub async fn listar_vouchers(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let vouchers = app_state
        .voucher_service
        .listar(&mut *tx)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(vouchers)))
}

// PATCH /api/vouchers/{id}/status
#[utoipa::path(
    patch,
    path = "/api/vouchers/{id}/status",
    tag = "Vouchers",
    params(("id" = Uuid, Path, description = "ID do voucher")),
    request_body = AlterarStatusVoucherPayload,
    responses(
        (status = 200, description = "Status alterado", body = Voucher),
        (status = 404, description = "Voucher não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn alterar_status_voucher(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AlterarStatusVoucherPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let voucher = app_state
        .voucher_service
        .alterar_status(&mut *tx, id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(voucher)))
}

// POST /api/vouchers/validar
// Prévia do desconto no caixa. Não conta uso.
#[utoipa::path(
    post,
    path = "/api/vouchers/validar",
    tag = "Vouchers",
    request_body = ValidarVoucherPayload,
    responses(
        (status = 200, description = "Voucher válido e desconto calculado", body = VoucherValidado),
        (status = 422, description = "Voucher inexistente, inativo, esgotado ou expirado")
    ),
    security(("api_jwt" = []))
)]
pub async fn validar_voucher(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<ValidarVoucherPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let validado = app_state
        .voucher_service
        .validar(&mut *tx, &payload.codigo, payload.subtotal)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(validado)))
}
