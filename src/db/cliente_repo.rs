// src/db/cliente_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::clientes::{Cliente, ClientePayload, StatusCliente},
};

// Repositório de clientes: tudo que toca a tabela 'clientes'
// (o executor vem de fora: transação RLS do handler ou do service)
#[derive(Clone, Default)]
pub struct ClienteRepository;

impl ClienteRepository {
    // `padrao` já vem no formato ILIKE (ver common::busca)
    pub async fn listar<'e, E>(&self, executor: E, padrao: Option<&str>) -> Result<Vec<Cliente>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let clientes = sqlx::query_as::<_, Cliente>(
            r#"
            SELECT * FROM clientes
            WHERE $1::text IS NULL
               OR nome ILIKE $1
               OR documento ILIKE $1
               OR email ILIKE $1
            ORDER BY nome ASC
            "#,
        )
        .bind(padrao)
        .fetch_all(executor)
        .await?;

        Ok(clientes)
    }

    pub async fn buscar<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Cliente>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cliente = sqlx::query_as::<_, Cliente>("SELECT * FROM clientes WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(cliente)
    }

    pub async fn criar<'e, E>(&self, executor: E, input: &ClientePayload) -> Result<Cliente, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Cliente>(
            r#"
            INSERT INTO clientes (nome, documento, email, telefone, endereco, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&input.nome)
        .bind(&input.documento)
        .bind(&input.email)
        .bind(&input.telefone)
        .bind(&input.endereco)
        .bind(input.status.unwrap_or(StatusCliente::Ativo))
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, "Já existe um cliente com este documento."))
    }

    pub async fn atualizar<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        input: &ClientePayload,
    ) -> Result<Option<Cliente>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Cliente>(
            r#"
            UPDATE clientes
            SET nome = $2, documento = $3, email = $4, telefone = $5, endereco = $6,
                status = COALESCE($7, status), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.nome)
        .bind(&input.documento)
        .bind(&input.email)
        .bind(&input.telefone)
        .bind(&input.endereco)
        .bind(input.status)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_unique_violation(e, "Já existe um cliente com este documento."))
    }

    // Clientes são os únicos registros apagados de verdade.
    pub async fn remover<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM clientes WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await
            .map_err(|e| map_unique_violation(e, "Cliente possui pedidos e não pode ser removido."))?;

        Ok(result.rows_affected())
    }
}
