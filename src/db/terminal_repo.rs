// src/db/terminal_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::terminais::{StatusTerminal, Terminal, TerminalPayload},
};

#[derive(Clone, Default)]
pub struct TerminalRepository;

impl TerminalRepository {
    pub async fn criar<'e, E>(&self, executor: E, input: &TerminalPayload) -> Result<Terminal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Terminal>(
            r#"
            INSERT INTO terminais (nome, identificador, localizacao)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&input.nome)
        .bind(&input.identificador)
        .bind(&input.localizacao)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, "Já existe um terminal com este identificador."))
    }

    pub async fn listar<'e, E>(&self, executor: E) -> Result<Vec<Terminal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let terminais = sqlx::query_as::<_, Terminal>("SELECT * FROM terminais ORDER BY nome ASC")
            .fetch_all(executor)
            .await?;

        Ok(terminais)
    }

    pub async fn atualizar<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        input: &TerminalPayload,
    ) -> Result<Option<Terminal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Terminal>(
            r#"
            UPDATE terminais
            SET nome = $2, identificador = $3, localizacao = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.nome)
        .bind(&input.identificador)
        .bind(&input.localizacao)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_unique_violation(e, "Já existe um terminal com este identificador."))
    }

    pub async fn alterar_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: StatusTerminal,
    ) -> Result<Option<Terminal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let terminal = sqlx::query_as::<_, Terminal>(
            "UPDATE terminais SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await?;

        Ok(terminal)
    }

    // Heartbeat do caixa
    pub async fn registrar_acesso<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Terminal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let terminal = sqlx::query_as::<_, Terminal>(
            "UPDATE terminais SET ultimo_acesso = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(terminal)
    }
}
