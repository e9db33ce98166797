// src/handlers/pedidos.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        db_utils::begin_rls_transaction,
        error::{ApiError, AppError},
    },
    config::AppState,
    handlers::pagamentos::concluir_cobranca,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{
        pagamentos::{GerarCobrancaQuery, TransacaoPixResposta},
        pedidos::{CriarPedidoPayload, Pedido, PedidoDetalhe, PedidoQuery},
    },
};

// POST /api/pedidos
#[utoipa::path(
    post,
    path = "/api/pedidos",
    tag = "Pedidos",
    request_body = CriarPedidoPayload,
    responses(
        (status = 201, description = "Pedido criado com itens", body = PedidoDetalhe),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Produto ou pulseira não encontrado"),
        (status = 422, description = "Estoque/saldo insuficiente, produto inativo ou voucher inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn criar_pedido(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<CriarPedidoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let pedido = app_state
        .pedido_service
        .criar(&mut *tx, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(pedido)))
}

// GET /api/pedidos
#[utoipa::path(
    get,
    path = "/api/pedidos",
    tag = "Pedidos",
    params(PedidoQuery),
    responses(
        (status = 200, description = "Pedidos do período, mais recentes primeiro", body = Vec<Pedido>)
    ),
    security(("api_jwt" = []))
)]
pub async fn listar_pedidos(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(query): Query<PedidoQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let pedidos = app_state
        .pedido_service
        .listar(&mut *tx, &query)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(pedidos)))
}

// GET /api/pedidos/{id}
#[utoipa::path(
    get,
    path = "/api/pedidos/{id}",
    tag = "Pedidos",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido com itens", body = PedidoDetalhe),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn buscar_pedido(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let pedido = app_state
        .pedido_service
        .buscar(&mut *tx, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(pedido)))
}

// POST /api/pedidos/{id}/pix
#[utoipa::path(
    post,
    path = "/api/pedidos/{id}/pix",
    tag = "Pagamentos",
    params(
        ("id" = Uuid, Path, description = "ID do pedido"),
        GerarCobrancaQuery
    ),
    responses(
        (status = 201, description = "QR Code gerado (ou o pendente reaproveitado)", body = TransacaoPixResposta),
        (status = 409, description = "Pedido não está aguardando pagamento"),
        (status = 502, description = "Falha no provedor"),
        (status = 503, description = "Provedor não configurado")
    ),
    security(("api_jwt" = []))
)]
pub async fn gerar_pix(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Query(query): Query<GerarCobrancaQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let preparo = app_state
        .pagamento_service
        .preparar_pix_pedido(&mut *tx, id, query.provedor)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    // Libera o pedido antes de chamar o provedor
    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale))?;

    let transacao = concluir_cobranca(&app_state, &user, preparo)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(transacao.com_contador(Utc::now()))))
}

// POST /api/pedidos/{id}/boleto
#[utoipa::path(
    post,
    path = "/api/pedidos/{id}/boleto",
    tag = "Pagamentos",
    params(
        ("id" = Uuid, Path, description = "ID do pedido"),
        GerarCobrancaQuery
    ),
    responses(
        (status = 201, description = "Boleto gerado (ou o pendente reaproveitado)", body = TransacaoPixResposta),
        (status = 400, description = "Provedor não emite boleto"),
        (status = 422, description = "Pedido sem cliente com CPF/CNPJ")
    ),
    security(("api_jwt" = []))
)]
pub async fn gerar_boleto(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Query(query): Query<GerarCobrancaQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let preparo = app_state
        .pagamento_service
        .preparar_boleto(&mut *tx, id, query.provedor)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    // Libera o pedido antes de chamar o provedor
    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale))?;

    let transacao = concluir_cobranca(&app_state, &user, preparo)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(transacao.com_contador(Utc::now()))))
}

// GET /api/pedidos/{id}/transacoes
#[utoipa::path(
    get,
    path = "/api/pedidos/{id}/transacoes",
    tag = "Pagamentos",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Cobranças PIX/boleto do pedido", body = Vec<TransacaoPixResposta>)
    ),
    security(("api_jwt" = []))
)]
pub async fn listar_transacoes(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let transacoes = app_state
        .pagamento_service
        .listar_por_pedido(&mut *tx, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(transacoes)))
}
