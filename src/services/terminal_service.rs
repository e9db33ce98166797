// src/services/terminal_service.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::TerminalRepository,
    models::terminais::{StatusTerminal, Terminal, TerminalPayload},
};

#[derive(Clone)]
pub struct TerminalService {
    repo: TerminalRepository,
}

impl TerminalService {
    pub fn new(repo: TerminalRepository) -> Self {
        Self { repo }
    }

    pub async fn criar<'e, E>(&self, executor: E, payload: &TerminalPayload) -> Result<Terminal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let terminal = self.repo.criar(executor, payload).await?;
        tracing::info!("Terminal {} registrado", terminal.identificador);
        Ok(terminal)
    }

    pub async fn listar<'e, E>(&self, executor: E) -> Result<Vec<Terminal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.listar(executor).await
    }

    pub async fn atualizar<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &TerminalPayload,
    ) -> Result<Terminal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .atualizar(executor, id, payload)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Terminal".into()))
    }

    pub async fn alterar_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: StatusTerminal,
    ) -> Result<Terminal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .alterar_status(executor, id, status)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Terminal".into()))
    }

    // Heartbeat do quiosque
    pub async fn registrar_acesso<'e, E>(&self, executor: E, id: Uuid) -> Result<Terminal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .registrar_acesso(executor, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Terminal".into()))
    }
}
