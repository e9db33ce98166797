// src/handlers/cancelamentos.rs

use axum::{
    extract::{Path, Query, State},
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
    middleware::{
        auth::{AdminUser, AuthenticatedUser},
        i18n::Locale,
    },
    models::cancelamentos::{
        Cancelamento, CancelamentoQuery, DecisaoCancelamentoPayload, SolicitarCancelamentoPayload,
    },
};

// POST /api/cancelamentos
#[utoipa::path(
    post,
    path = "/api/cancelamentos",
    tag = "Cancelamentos",
    request_body = SolicitarCancelamentoPayload,
    responses(
        (status = 201, description = "Solicitação registrada, aguardando o administrador", body = Cancelamento),
        (status = 404, description = "Pedido não encontrado"),
        (status = 409, description = "Pedido já cancelado ou com solicitação em andamento")
    ),
    security(("api_jwt" = []))
)]
pub async fn solicitar_cancelamento(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<SolicitarCancelamentoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let cancelamento = app_state
        .cancelamento_service
        .solicitar(&mut *tx, payload.pedido_id, &payload.motivo, user.id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(cancelamento)))
}

// GET /api/cancelamentos
#[utoipa::path(
    get,
    path = "/api/cancelamentos",
    tag = "Cancelamentos",
    params(CancelamentoQuery),
    responses(
        (status = 200, description = "Solicitações de cancelamento", body = Vec<Cancelamento>)
    ),
    security(("api_jwt" = []))
)]
pub async fn listar_cancelamentos(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(query): Query<CancelamentoQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let cancelamentos = app_state
        .cancelamento_service
        .listar(&mut *tx, query.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(cancelamentos)))
}

// GET /api/cancelamentos/{id}
#[utoipa::path(
    get,
    path = "/api/cancelamentos/{id}",
    tag = "Cancelamentos",
    params(("id" = Uuid, Path, description = "ID do cancelamento")),
    responses(
        (status = 200, description = "Cancelamento", body = Cancelamento),
        (status = 404, description = "Cancelamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn buscar_cancelamento(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let cancelamento = app_state
        .cancelamento_service
        .buscar(&mut *tx, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(cancelamento)))
}

// POST /api/cancelamentos/{id}/aprovar
// Repetir a aprovação devolve o mesmo registro, sem efeitos novos.
#[utoipa::path(
    post,
    path = "/api/cancelamentos/{id}/aprovar",
    tag = "Cancelamentos",
    params(("id" = Uuid, Path, description = "ID do cancelamento")),
    request_body = DecisaoCancelamentoPayload,
    responses(
        (status = 200, description = "Pedido cancelado, estoque e saldo devolvidos", body = Cancelamento),
        (status = 403, description = "Apenas administradores"),
        (status = 409, description = "Cancelamento já rejeitado")
    ),
    security(("api_jwt" = []))
)]
pub async fn aprovar_cancelamento(
    State(app_state): State<AppState>,
    locale: Locale,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DecisaoCancelamentoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &admin)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let cancelamento = app_state
        .cancelamento_service
        .aprovar(&mut *tx, id, payload.observacao.as_deref(), admin.id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(cancelamento)))
}

// POST /api/cancelamentos/{id}/rejeitar
#[utoipa::path(
    post,
    path = "/api/cancelamentos/{id}/rejeitar",
    tag = "Cancelamentos",
    params(("id" = Uuid, Path, description = "ID do cancelamento")),
    request_body = DecisaoCancelamentoPayload,
    responses(
        (status = 200, description = "Solicitação rejeitada", body = Cancelamento),
        (status = 403, description = "Apenas administradores"),
        (status = 409, description = "Cancelamento já aprovado")
    ),
    security(("api_jwt" = []))
)]
pub async fn rejeitar_cancelamento(
    State(app_state): State<AppState>,
    locale: Locale,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DecisaoCancelamentoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &admin)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let cancelamento = app_state
        .cancelamento_service
        .rejeitar(&mut *tx, id, payload.observacao.as_deref(), admin.id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(cancelamento)))
}
