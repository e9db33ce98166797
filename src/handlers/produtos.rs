// src/handlers/produtos.rs

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
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::produtos::{
        AjusteEstoquePayload, AlterarStatusProdutoPayload, Produto, ProdutoPayload, ProdutoQuery,
    },
};

// POST /api/produtos
#[utoipa::path(
    post,
    path = "/api/produtos",
    tag = "Produtos",
    request_body = ProdutoPayload,
    responses(
        (status = 201, description = "Produto criado", body = Produto),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Código já utilizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn criar_produto(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<ProdutoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let produto = app_state
        .produto_service
        .criar(&mut *tx, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(produto)))
}

// GET /api/produtos
#[utoipa::path(
    get,
    path = "/api/produtos",
    tag = "Produtos",
    params(ProdutoQuery),
    responses(
        (status = 200, description = "Catálogo de produtos", body = Vec<Produto>)
    ),
    security(("api_jwt" = []))
)]
pub async fn listar_produtos(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(query): Query<ProdutoQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let produtos = app_state
        .produto_service
        .listar(&mut *tx, query.busca.as_deref(), query.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(produtos)))
}

// GET /api/produtos/{id}
#[utoipa::path(
    get,
    path = "/api/produtos/{id}",
    tag = "Produtos",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto", body = Produto),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn buscar_produto(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let produto = app_state
        .produto_service
        .buscar(&mut *tx, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(produto)))
}

// PUT /api/produtos/{id}
#[utoipa::path(
    put,
    path = "/api/produtos/{id}",
    tag = "Produtos",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = ProdutoPayload,
    responses(
        (status = 200, description = "Produto atualizado", body = Produto),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn atualizar_produto(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProdutoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let produto = app_state
        .produto_service
        .atualizar(&mut *tx, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(produto)))
}

// PATCH /api/produtos/{id}/status
#[utoipa::path(
    patch,
    path = "/api/produtos/{id}/status",
    tag = "Produtos",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = AlterarStatusProdutoPayload,
    responses(
        (status = 200, description = "Status alterado", body = Produto),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn alterar_status_produto(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AlterarStatusProdutoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let produto = app_state
        .produto_service
        .alterar_status(&mut *tx, id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(produto)))
}

// POST /api/produtos/{id}/estoque
#[utoipa::path(
    post,
    path = "/api/produtos/{id}/estoque",
    tag = "Produtos",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = AjusteEstoquePayload,
    responses(
        (status = 200, description = "Estoque ajustado", body = Produto),
        (status = 422, description = "O ajuste deixaria o estoque negativo")
    ),
    security(("api_jwt" = []))
)]
pub async fn ajustar_estoque(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AjusteEstoquePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let produto = app_state
        .produto_service
        .ajustar_estoque(&mut *tx, id, payload.delta, payload.motivo.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(produto)))
}
