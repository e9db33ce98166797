// src/services/cliente_service.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{busca::normalize_search, error::AppError},
    db::ClienteRepository,
    models::clientes::{Cliente, ClientePayload},
};

#[derive(Clone)]
pub struct ClienteService {
    repo: ClienteRepository,
}

impl ClienteService {
    pub fn new(repo: ClienteRepository) -> Self {
        Self { repo }
    }

    /// Lista clientes. A busca é a mesma do campo de pesquisa do painel:
    /// trecho do nome, documento ou e-mail, sem diferenciar maiúsculas.
    pub async fn listar<'e, E>(&self, executor: E, busca: Option<&str>) -> Result<Vec<Cliente>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let padrao = normalize_search(busca);
        self.repo.listar(executor, padrao.as_deref()).await
    }

    pub async fn buscar<'e, E>(&self, executor: E, id: Uuid) -> Result<Cliente, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .buscar(executor, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Cliente".into()))
    }

    pub async fn criar<'e, E>(&self, executor: E, payload: &ClientePayload) -> Result<Cliente, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cliente = self.repo.criar(executor, payload).await?;
        tracing::info!("Cliente {} cadastrado", cliente.id);
        Ok(cliente)
    }

    pub async fn atualizar<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &ClientePayload,
    ) -> Result<Cliente, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .atualizar(executor, id, payload)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Cliente".into()))
    }

    // Único cadastro com exclusão física; pedidos vinculados impedem (FK → 409)
    pub async fn remover<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        match self.repo.remover(executor, id).await? {
            0 => Err(AppError::ResourceNotFound("Cliente".into())),
            _ => {
                tracing::info!("Cliente {} removido", id);
                Ok(())
            }
        }
    }
}
