// src/db/cancelamento_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::cancelamentos::{Cancelamento, StatusCancelamento},
};

#[derive(Clone, Default)]
pub struct CancelamentoRepository;

impl CancelamentoRepository {
    // O índice parcial `cancelamentos_pedido_ativo` garante uma solicitação
    // em aberto/aprovada por pedido; o clique duplo cai aqui como conflito.
    pub async fn criar<'e, E>(
        &self,
        executor: E,
        pedido_id: Uuid,
        motivo: &str,
        solicitado_por: Uuid,
    ) -> Result<Cancelamento, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Cancelamento>(
            r#"
            INSERT INTO cancelamentos (pedido_id, motivo, solicitado_por)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(pedido_id)
        .bind(motivo)
        .bind(solicitado_por)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, "Já existe um cancelamento em andamento para este pedido."))
    }

    pub async fn buscar<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Cancelamento>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cancelamento = sqlx::query_as::<_, Cancelamento>("SELECT * FROM cancelamentos WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(cancelamento)
    }

    pub async fn buscar_para_atualizar<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Cancelamento>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cancelamento = sqlx::query_as::<_, Cancelamento>(
            "SELECT * FROM cancelamentos WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(cancelamento)
    }

    pub async fn buscar_ativo_por_pedido<'e, E>(
        &self,
        executor: E,
        pedido_id: Uuid,
    ) -> Result<Option<Cancelamento>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cancelamento = sqlx::query_as::<_, Cancelamento>(
            r#"
            SELECT * FROM cancelamentos
            WHERE pedido_id = $1 AND status IN ('solicitado', 'aprovado')
            "#,
        )
        .bind(pedido_id)
        .fetch_optional(executor)
        .await?;

        Ok(cancelamento)
    }

    pub async fn listar<'e, E>(
        &self,
        executor: E,
        status: Option<StatusCancelamento>,
    ) -> Result<Vec<Cancelamento>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cancelamentos = sqlx::query_as::<_, Cancelamento>(
            r#"
            SELECT * FROM cancelamentos
            WHERE $1::status_cancelamento IS NULL OR status = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(status)
        .fetch_all(executor)
        .await?;

        Ok(cancelamentos)
    }

    pub async fn registrar_decisao<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: StatusCancelamento,
        observacao: Option<&str>,
        decidido_por: Uuid,
    ) -> Result<Cancelamento, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cancelamento = sqlx::query_as::<_, Cancelamento>(
            r#"
            UPDATE cancelamentos
            SET status = $2,
                aprovado = ($2 = 'aprovado'::status_cancelamento),
                observacao_admin = $3,
                aprovado_por = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(observacao)
        .bind(decidido_por)
        .fetch_one(executor)
        .await?;

        Ok(cancelamento)
    }
}
