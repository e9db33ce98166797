// src/services/configuracoes_service.rs

use sqlx::{Executor, Postgres};

use crate::{
    common::error::AppError,
    db::ConfiguracoesRepository,
    models::configuracoes::{AtualizarConfiguracoesPayload, ConfiguracoesSistema},
};

#[derive(Clone)]
pub struct ConfiguracoesService {
    repo: ConfiguracoesRepository,
}

impl ConfiguracoesService {
    pub fn new(repo: ConfiguracoesRepository) -> Self {
        Self { repo }
    }

    pub async fn obter<'e, E>(&self, executor: E) -> Result<ConfiguracoesSistema, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.obter(executor).await
    }

    pub async fn atualizar<'e, E>(
        &self,
        executor: E,
        payload: &AtualizarConfiguracoesPayload,
    ) -> Result<ConfiguracoesSistema, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let configuracoes = self.repo.atualizar(executor, payload).await?;
        tracing::info!(
            "Configurações atualizadas (provedor PIX: {})",
            configuracoes.provedor_pix.as_str()
        );
        Ok(configuracoes)
    }
}
