// src/db/pulseira_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::{
        pedidos::FormaPagamento,
        pulseiras::{
            ConsumoPulseira, Pulseira, RecargaPulseira, StatusPulseira, StatusRecarga, VendaPulseira,
        },
    },
};

#[derive(Clone, Default)]
pub struct PulseiraRepository;

impl PulseiraRepository {
    // =========================================================================
    //  PULSEIRAS
    // =========================================================================

    pub async fn criar<'e, E>(
        &self,
        executor: E,
        codigo: &str,
        cliente_id: Option<Uuid>,
        saldo: Decimal,
    ) -> Result<Pulseira, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Pulseira>(
            r#"
            INSERT INTO pulseiras (codigo, cliente_id, saldo)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(codigo)
        .bind(cliente_id)
        .bind(saldo)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, "Já existe uma pulseira com este código."))
    }

    pub async fn listar<'e, E>(
        &self,
        executor: E,
        padrao: Option<&str>,
        status: Option<StatusPulseira>,
    ) -> Result<Vec<Pulseira>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pulseiras = sqlx::query_as::<_, Pulseira>(
            r#"
            SELECT * FROM pulseiras
            WHERE ($1::text IS NULL OR codigo ILIKE $1)
              AND ($2::status_pulseira IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(padrao)
        .bind(status)
        .fetch_all(executor)
        .await?;

        Ok(pulseiras)
    }

    pub async fn buscar_por_codigo<'e, E>(&self, executor: E, codigo: &str) -> Result<Option<Pulseira>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pulseira = sqlx::query_as::<_, Pulseira>("SELECT * FROM pulseiras WHERE codigo = $1")
            .bind(codigo)
            .fetch_optional(executor)
            .await?;

        Ok(pulseira)
    }

    // SELECT ... FOR UPDATE: todo débito/crédito de saldo passa por aqui
    pub async fn buscar_para_atualizar<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Pulseira>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pulseira = sqlx::query_as::<_, Pulseira>("SELECT * FROM pulseiras WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(pulseira)
    }

    pub async fn buscar_por_codigo_para_atualizar<'e, E>(
        &self,
        executor: E,
        codigo: &str,
    ) -> Result<Option<Pulseira>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pulseira = sqlx::query_as::<_, Pulseira>(
            "SELECT * FROM pulseiras WHERE codigo = $1 FOR UPDATE",
        )
        .bind(codigo)
        .fetch_optional(executor)
        .await?;

        Ok(pulseira)
    }

    pub async fn alterar_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: StatusPulseira,
    ) -> Result<Option<Pulseira>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pulseira = sqlx::query_as::<_, Pulseira>(
            "UPDATE pulseiras SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await?;

        Ok(pulseira)
    }

    pub async fn atualizar_saldo<'e, E>(&self, executor: E, id: Uuid, saldo: Decimal) -> Result<Pulseira, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pulseira = sqlx::query_as::<_, Pulseira>(
            "UPDATE pulseiras SET saldo = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(saldo)
        .fetch_one(executor)
        .await?;

        Ok(pulseira)
    }

    // =========================================================================
    //  VENDAS E RECARGAS
    // =========================================================================

    pub async fn registrar_venda<'e, E>(
        &self,
        executor: E,
        pulseira_id: Uuid,
        cliente_id: Option<Uuid>,
        terminal_id: Option<Uuid>,
        valor: Decimal,
        forma_pagamento: FormaPagamento,
    ) -> Result<VendaPulseira, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let venda = sqlx::query_as::<_, VendaPulseira>(
            r#"
            INSERT INTO vendas_pulseiras (pulseira_id, cliente_id, terminal_id, valor, forma_pagamento)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(pulseira_id)
        .bind(cliente_id)
        .bind(terminal_id)
        .bind(valor)
        .bind(forma_pagamento)
        .fetch_one(executor)
        .await?;

        Ok(venda)
    }

    pub async fn criar_recarga<'e, E>(
        &self,
        executor: E,
        pulseira_id: Uuid,
        terminal_id: Option<Uuid>,
        valor: Decimal,
        forma_pagamento: FormaPagamento,
        status: StatusRecarga,
    ) -> Result<RecargaPulseira, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let recarga = sqlx::query_as::<_, RecargaPulseira>(
            r#"
            INSERT INTO recargas_pulseiras (pulseira_id, terminal_id, valor, forma_pagamento, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(pulseira_id)
        .bind(terminal_id)
        .bind(valor)
        .bind(forma_pagamento)
        .bind(status)
        .fetch_one(executor)
        .await?;

        Ok(recarga)
    }

    pub async fn buscar_recarga_para_atualizar<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<RecargaPulseira>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let recarga = sqlx::query_as::<_, RecargaPulseira>(
            "SELECT * FROM recargas_pulseiras WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(recarga)
    }

    pub async fn atualizar_status_recarga<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: StatusRecarga,
    ) -> Result<RecargaPulseira, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let recarga = sqlx::query_as::<_, RecargaPulseira>(
            "UPDATE recargas_pulseiras SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_one(executor)
        .await?;

        Ok(recarga)
    }

    // =========================================================================
    //  EXTRATO
    // =========================================================================

    pub async fn listar_vendas<'e, E>(&self, executor: E, pulseira_id: Uuid) -> Result<Vec<VendaPulseira>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let vendas = sqlx::query_as::<_, VendaPulseira>(
            "SELECT * FROM vendas_pulseiras WHERE pulseira_id = $1 ORDER BY created_at DESC",
        )
        .bind(pulseira_id)
        .fetch_all(executor)
        .await?;

        Ok(vendas)
    }

    pub async fn listar_recargas<'e, E>(
        &self,
        executor: E,
        pulseira_id: Uuid,
    ) -> Result<Vec<RecargaPulseira>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let recargas = sqlx::query_as::<_, RecargaPulseira>(
            "SELECT * FROM recargas_pulseiras WHERE pulseira_id = $1 ORDER BY created_at DESC",
        )
        .bind(pulseira_id)
        .fetch_all(executor)
        .await?;

        Ok(recargas)
    }

    pub async fn listar_consumos<'e, E>(
        &self,
        executor: E,
        pulseira_id: Uuid,
    ) -> Result<Vec<ConsumoPulseira>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let consumos = sqlx::query_as::<_, ConsumoPulseira>(
            r#"
            SELECT id AS pedido_id, numero, total, status, created_at
            FROM pedidos
            WHERE pulseira_id = $1 AND forma_pagamento = 'pulseira'
            ORDER BY created_at DESC
            "#,
        )
        .bind(pulseira_id)
        .fetch_all(executor)
        .await?;

        Ok(consumos)
    }
}
