// src/handlers/configuracoes.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::{
        db_utils::begin_rls_transaction,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::configuracoes::{AtualizarConfiguracoesPayload, ConfiguracoesSistema},
};

// GET /api/configuracoes
#[utoipa::path(
    get,
    path = "/api/configuracoes",
    tag = "Configurações",
    responses(
        (status = 200, description = "Configurações do sistema (padrões quando ainda não salvas)", body = ConfiguracoesSistema)
    ),
    security(("api_jwt" = []))
)]
pub async fn obter_configuracoes(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let configuracoes = app_state
        .configuracoes_service
        .obter(&mut *tx)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(configuracoes)))
}

// PUT /api/configuracoes
#[utoipa::path(
    put,
    path = "/api/configuracoes",
    tag = "Configurações",
    request_body = AtualizarConfiguracoesPayload,
    responses(
        (status = 200, description = "Configurações salvas", body = ConfiguracoesSistema),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn atualizar_configuracoes(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<AtualizarConfiguracoesPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let configuracoes = app_state
        .configuracoes_service
        .atualizar(&mut *tx, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(configuracoes)))
}
