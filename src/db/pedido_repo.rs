// src/db/pedido_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, FromRow, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::pedidos::{FormaPagamento, ItemPedido, Pedido, PedidoDetalhe, StatusPedido},
};

// Cabeçalho já calculado pelo service
pub struct NovoPedido<'a> {
    pub cliente_id: Option<Uuid>,
    pub pulseira_id: Option<Uuid>,
    pub terminal_id: Option<Uuid>,
    pub voucher_id: Option<Uuid>,
    pub subtotal: Decimal,
    pub desconto: Decimal,
    pub total: Decimal,
    pub forma_pagamento: FormaPagamento,
    pub status: StatusPedido,
    pub observacao: Option<&'a str>,
}

#[derive(FromRow)]
struct NomesAuxiliares {
    cliente_nome: Option<String>,
    pulseira_codigo: Option<String>,
}

#[derive(Clone, Default)]
pub struct PedidoRepository;

impl PedidoRepository {
    pub async fn criar<'e, E>(&self, executor: E, novo: &NovoPedido<'_>) -> Result<Pedido, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pedido = sqlx::query_as::<_, Pedido>(
            r#"
            INSERT INTO pedidos (
                cliente_id, pulseira_id, terminal_id, voucher_id,
                subtotal, desconto, total, forma_pagamento, status, observacao
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(novo.cliente_id)
        .bind(novo.pulseira_id)
        .bind(novo.terminal_id)
        .bind(novo.voucher_id)
        .bind(novo.subtotal)
        .bind(novo.desconto)
        .bind(novo.total)
        .bind(novo.forma_pagamento)
        .bind(novo.status)
        .bind(novo.observacao)
        .fetch_one(executor)
        .await?;

        Ok(pedido)
    }

    pub async fn inserir_item<'e, E>(
        &self,
        executor: E,
        pedido_id: Uuid,
        produto_id: Uuid,
        nome: &str,
        quantidade: i32,
        preco_unitario: Decimal,
        total: Decimal,
    ) -> Result<ItemPedido, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, ItemPedido>(
            r#"
            INSERT INTO itens_pedido (pedido_id, produto_id, nome, quantidade, preco_unitario, total)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(pedido_id)
        .bind(produto_id)
        .bind(nome)
        .bind(quantidade)
        .bind(preco_unitario)
        .bind(total)
        .fetch_one(executor)
        .await?;

        Ok(item)
    }

    pub async fn listar<'e, E>(
        &self,
        executor: E,
        status: Option<StatusPedido>,
        de: Option<DateTime<Utc>>,
        ate: Option<DateTime<Utc>>,
    ) -> Result<Vec<Pedido>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pedidos = sqlx::query_as::<_, Pedido>(
            r#"
            SELECT * FROM pedidos
            WHERE ($1::status_pedido IS NULL OR status = $1)
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at < $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(status)
        .bind(de)
        .bind(ate)
        .fetch_all(executor)
        .await?;

        Ok(pedidos)
    }

    pub async fn buscar<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Pedido>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pedido = sqlx::query_as::<_, Pedido>("SELECT * FROM pedidos WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(pedido)
    }

    pub async fn buscar_para_atualizar<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Pedido>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pedido = sqlx::query_as::<_, Pedido>("SELECT * FROM pedidos WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(pedido)
    }

    pub async fn listar_itens<'e, E>(&self, executor: E, pedido_id: Uuid) -> Result<Vec<ItemPedido>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let itens = sqlx::query_as::<_, ItemPedido>(
            "SELECT * FROM itens_pedido WHERE pedido_id = $1 ORDER BY nome ASC",
        )
        .bind(pedido_id)
        .fetch_all(executor)
        .await?;

        Ok(itens)
    }

    pub async fn atualizar_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: StatusPedido,
    ) -> Result<Pedido, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pedido = sqlx::query_as::<_, Pedido>(
            "UPDATE pedidos SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_one(executor)
        .await?;

        Ok(pedido)
    }

    // Três consultas na mesma conexão: cabeçalho, nomes auxiliares e itens.
    pub async fn buscar_detalhe(&self, conn: &mut PgConnection, id: Uuid) -> Result<Option<PedidoDetalhe>, AppError> {
        let Some(pedido) = self.buscar(&mut *conn, id).await? else {
            return Ok(None);
        };

        let aux = sqlx::query_as::<_, NomesAuxiliares>(
            r#"
            SELECT c.nome AS cliente_nome, p.codigo AS pulseira_codigo
            FROM pedidos o
            LEFT JOIN clientes c ON o.cliente_id = c.id
            LEFT JOIN pulseiras p ON o.pulseira_id = p.id
            WHERE o.id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

        let itens = self.listar_itens(&mut *conn, id).await?;

        Ok(Some(PedidoDetalhe {
            pedido,
            cliente_nome: aux.cliente_nome,
            pulseira_codigo: aux.pulseira_codigo,
            itens,
        }))
    }
}
