// src/handlers/pagamentos.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::begin_rls_transaction,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::pagamentos::{TransacaoPix, TransacaoPixResposta},
    services::pagamento_service::{CobrancaPendente, PreparoCobranca},
};

/// Emite a cobrança preparada fora de qualquer transação e grava o resultado
/// numa nova. Se o provedor falhar, a recarga que esperava o PIX é cancelada.
pub(crate) async fn emitir_cobranca(
    app_state: &AppState,
    user: &AuthenticatedUser,
    pendente: CobrancaPendente,
) -> Result<TransacaoPix, AppError> {
    let service = &app_state.pagamento_service;
    let emitida = service.emitir(&pendente).await;

    let mut tx = begin_rls_transaction(app_state, user).await?;
    match emitida {
        Ok(emitida) => {
            let transacao = service.registrar(&mut *tx, &pendente, emitida).await?;
            tx.commit().await?;
            Ok(transacao)
        }
        Err(e) => {
            service.descartar(&mut *tx, &pendente).await?;
            tx.commit().await?;
            Err(e)
        }
    }
}

pub(crate) async fn concluir_cobranca(
    app_state: &AppState,
    user: &AuthenticatedUser,
    preparo: PreparoCobranca,
) -> Result<TransacaoPix, AppError> {
    match preparo {
        PreparoCobranca::Existente(transacao) => Ok(transacao),
        PreparoCobranca::Emitir(pendente) => emitir_cobranca(app_state, user, pendente).await,
    }
}

// GET /api/pagamentos/{id}
#[utoipa::path(
    get,
    path = "/api/pagamentos/{id}",
    tag = "Pagamentos",
    params(("id" = Uuid, Path, description = "ID da transação")),
    responses(
        (status = 200, description = "Transação como está gravada", body = TransacaoPixResposta),
        (status = 404, description = "Transação não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn buscar_transacao(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let transacao = app_state
        .pagamento_service
        .buscar(&mut *tx, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(transacao)))
}

// GET /api/pagamentos/{id}/status
// Polling do front enquanto o QR Code está na tela.
#[utoipa::path(
    get,
    path = "/api/pagamentos/{id}/status",
    tag = "Pagamentos",
    params(("id" = Uuid, Path, description = "ID da transação")),
    responses(
        (status = 200, description = "Status reconciliado com o provedor e contador regressivo", body = TransacaoPixResposta),
        (status = 404, description = "Transação não encontrada"),
        (status = 502, description = "Falha ao consultar o provedor")
    ),
    security(("api_jwt" = []))
)]
pub async fn consultar_status(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let agora = Utc::now();

    // Leitura sem lock; a consulta ao provedor roda com a transação já encerrada
    let transacao = {
        let mut tx = begin_rls_transaction(&app_state, &user)
            .await
            .map_err(|e| e.to_api_error(&locale))?;
        app_state
            .pagamento_service
            .buscar_transacao(&mut *tx, id)
            .await
            .map_err(|e| e.to_api_error(&locale))?
    };

    let Some(novo) = app_state
        .pagamento_service
        .consultar_provedor(&transacao, agora)
        .await
        .map_err(|e| e.to_api_error(&locale))?
    else {
        return Ok((StatusCode::OK, Json(transacao.com_contador(agora))));
    };

    let mut tx = begin_rls_transaction(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let transacao = app_state
        .pagamento_service
        .aplicar_consulta(&mut *tx, id, novo, agora)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(transacao.com_contador(agora))))
}
