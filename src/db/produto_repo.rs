// src/db/produto_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::produtos::{Produto, ProdutoPayload, StatusProduto, ESTOQUE_MAXIMO},
};

#[derive(Clone, Default)]
pub struct ProdutoRepository;

impl ProdutoRepository {
    pub async fn criar<'e, E>(&self, executor: E, input: &ProdutoPayload) -> Result<Produto, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Produto>(
            r#"
            INSERT INTO produtos (nome, descricao, codigo, preco, estoque, categoria)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&input.nome)
        .bind(&input.descricao)
        .bind(&input.codigo)
        .bind(input.preco)
        .bind(input.estoque)
        .bind(&input.categoria)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, "Já existe um produto com este código."))
    }

    pub async fn listar<'e, E>(
        &self,
        executor: E,
        padrao: Option<&str>,
        status: Option<StatusProduto>,
    ) -> Result<Vec<Produto>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let produtos = sqlx::query_as::<_, Produto>(
            r#"
            SELECT * FROM produtos
            WHERE ($1::text IS NULL OR nome ILIKE $1 OR codigo ILIKE $1 OR categoria ILIKE $1)
              AND ($2::status_produto IS NULL OR status = $2)
            ORDER BY nome ASC
            "#,
        )
        .bind(padrao)
        .bind(status)
        .fetch_all(executor)
        .await?;

        Ok(produtos)
    }

    pub async fn buscar<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Produto>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let produto = sqlx::query_as::<_, Produto>("SELECT * FROM produtos WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(produto)
    }

    // Trava as linhas dos produtos do pedido (ordem por id evita deadlock entre caixas)
    pub async fn buscar_para_venda<'e, E>(&self, executor: E, ids: &[Uuid]) -> Result<Vec<Produto>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let produtos = sqlx::query_as::<_, Produto>(
            "SELECT * FROM produtos WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(ids)
        .fetch_all(executor)
        .await?;

        Ok(produtos)
    }

    pub async fn atualizar<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        input: &ProdutoPayload,
    ) -> Result<Option<Produto>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Produto>(
            r#"
            UPDATE produtos
            SET nome = $2, descricao = $3, codigo = $4, preco = $5, estoque = $6,
                categoria = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.nome)
        .bind(&input.descricao)
        .bind(&input.codigo)
        .bind(input.preco)
        .bind(input.estoque)
        .bind(&input.categoria)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_unique_violation(e, "Já existe um produto com este código."))
    }

    pub async fn alterar_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: StatusProduto,
    ) -> Result<Option<Produto>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let produto = sqlx::query_as::<_, Produto>(
            "UPDATE produtos SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await?;

        Ok(produto)
    }

    /// Soma `delta` ao estoque. Não atualiza nada (None) se o resultado sairia de `0..=ESTOQUE_MAXIMO`.
    pub async fn ajustar_estoque<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        delta: i32,
    ) -> Result<Option<Produto>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let produto = sqlx::query_as::<_, Produto>(
            r#"
            UPDATE produtos
            SET estoque = estoque + $2, updated_at = NOW()
            WHERE id = $1 AND estoque::bigint + $2 BETWEEN 0 AND $3
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(ESTOQUE_MAXIMO as i64)
        .fetch_optional(executor)
        .await?;

        Ok(produto)
    }
}
