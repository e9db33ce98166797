// src/handlers/terminais.rs

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
    models::terminais::{AlterarStatusTerminalPayload, Terminal, TerminalPayload},
};

// POST /api/terminais
#[utoipa::path(
    post,
    path = "/api/terminais",
    tag = "Terminais",
    request_body = TerminalPayload,
    responses(
        (status = 201, description = "Terminal cadastrado", body = Terminal),
        (status = 409, description = "Identificador já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn criar_terminal(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<TerminalPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let terminal = app_state
        .terminal_service
        .criar(&mut *tx, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(terminal)))
}

// GET /api/terminais
#[utoipa::path(
    get,
    path = "/api/terminais",
    tag = "Terminais",
    responses(
        (status = 200, description = "Terminais cadastrados", body = Vec<Terminal>)
    ),
    security(("api_jwt" = []))
)]
pub async fn listar_terminais(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let terminais = app_state
        .terminal_service
        .listar(&mut *tx)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(terminais)))
}

// PUT /api/terminais/{id}
#[utoipa::path(
    put,
    path = "/api/terminais/{id}",
    tag = "Terminais",
    params(("id" = Uuid, Path, description = "ID do terminal")),
    request_body = TerminalPayload,
    responses(
        (status = 200, description = "Terminal atualizado", body = Terminal),
        (status = 404, description = "Terminal não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn atualizar_terminal(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<TerminalPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let terminal = app_state
        .terminal_service
        .atualizar(&mut *tx, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(terminal)))
}

// PATCH /api/terminais/{id}/status
#[utoipa::path(
    patch,
    path = "/api/terminais/{id}/status",
    tag = "Terminais",
    params(("id" = Uuid, Path, description = "ID do terminal")),
    request_body = AlterarStatusTerminalPayload,
    responses(
        (status = 200, description = "Status alterado", body = Terminal),
        (status = 404, description = "Terminal não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn alterar_status_terminal(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AlterarStatusTerminalPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let terminal = app_state
        .terminal_service
        .alterar_status(&mut *tx, id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(terminal)))
}

// POST /api/terminais/{id}/acesso
// Heartbeat do quiosque: só atualiza o último acesso
#[utoipa::path(
    post,
    path = "/api/terminais/{id}/acesso",
    tag = "Terminais",
    params(("id" = Uuid, Path, description = "ID do terminal")),
    responses(
        (status = 200, description = "Acesso registrado", body = Terminal),
        (status = 404, description = "Terminal não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn registrar_acesso(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let terminal = app_state
        .terminal_service
        .registrar_acesso(&mut *tx, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(terminal)))
}
