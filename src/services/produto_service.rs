// src/services/produto_service.rs

use sqlx::{Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::{busca::normalize_search, error::AppError},
    db::ProdutoRepository,
    models::produtos::{Produto, ProdutoPayload, StatusProduto, ESTOQUE_MAXIMO},
};

#[derive(Clone)]
pub struct ProdutoService {
    repo: ProdutoRepository,
}

impl ProdutoService {
    pub fn new(repo: ProdutoRepository) -> Self {
        Self { repo }
    }

    pub async fn criar<'e, E>(&self, executor: E, payload: &ProdutoPayload) -> Result<Produto, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let produto = self.repo.criar(executor, payload).await?;
        tracing::info!("Produto {} ({}) cadastrado", produto.codigo, produto.id);
        Ok(produto)
    }

    pub async fn listar<'e, E>(
        &self,
        executor: E,
        busca: Option<&str>,
        status: Option<StatusProduto>,
    ) -> Result<Vec<Produto>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let padrao = normalize_search(busca);
        self.repo.listar(executor, padrao.as_deref(), status).await
    }

    pub async fn buscar<'e, E>(&self, executor: E, id: Uuid) -> Result<Produto, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .buscar(executor, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Produto".into()))
    }

    pub async fn atualizar<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &ProdutoPayload,
    ) -> Result<Produto, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .atualizar(executor, id, payload)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Produto".into()))
    }

    pub async fn alterar_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: StatusProduto,
    ) -> Result<Produto, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .alterar_status(executor, id, status)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Produto".into()))
    }

    /// Entrada (delta positivo) ou baixa manual de estoque.
    pub async fn ajustar_estoque(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        delta: i32,
        motivo: Option<&str>,
    ) -> Result<Produto, AppError> {
        if delta == 0 {
            return self.buscar(&mut *conn, id).await;
        }

        match self.repo.ajustar_estoque(&mut *conn, id, delta).await? {
            Some(produto) => {
                tracing::info!(
                    "Estoque do produto {} ajustado em {} ({}) -> {}",
                    produto.codigo,
                    delta,
                    motivo.unwrap_or("sem motivo"),
                    produto.estoque
                );
                Ok(produto)
            }
            // Ou o produto não existe, ou o ajuste sairia da faixa permitida
            None => {
                let produto = self.buscar(&mut *conn, id).await?;
                if delta > 0 {
                    Err(AppError::RegraNegocio(format!(
                        "O estoque de {} passaria do limite de {} unidades.",
                        produto.nome, ESTOQUE_MAXIMO
                    )))
                } else {
                    Err(AppError::EstoqueInsuficiente(produto.nome))
                }
            }
        }
    }
}
