// src/db/pagamento_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::pagamentos::{
        ProvedorPagamento, BOLETO_DIAS_COMPENSACAO, StatusPagamento, TipoCobranca, TransacaoPix,
    },
};

pub struct NovaTransacao<'a> {
    pub pedido_id: Option<Uuid>,
    pub recarga_id: Option<Uuid>,
    pub provedor: ProvedorPagamento,
    pub provider_id: &'a str,
    pub tipo: TipoCobranca,
    pub valor: Decimal,
    pub qr_code: Option<&'a str>,
    pub qr_code_url: Option<&'a str>,
    pub linha_digitavel: Option<&'a str>,
    pub boleto_url: Option<&'a str>,
    pub expira_em: Option<DateTime<Utc>>,
}

#[derive(Clone, Default)]
pub struct PagamentoRepository;

impl PagamentoRepository {
    pub async fn criar<'e, E>(&self, executor: E, nova: &NovaTransacao<'_>) -> Result<TransacaoPix, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, TransacaoPix>(
            r#"
            INSERT INTO transacoes_pix (
                pedido_id, recarga_id, provedor, provider_id, tipo, valor,
                qr_code, qr_code_url, linha_digitavel, boleto_url, expira_em
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(nova.pedido_id)
        .bind(nova.recarga_id)
        .bind(nova.provedor)
        .bind(nova.provider_id)
        .bind(nova.tipo)
        .bind(nova.valor)
        .bind(nova.qr_code)
        .bind(nova.qr_code_url)
        .bind(nova.linha_digitavel)
        .bind(nova.boleto_url)
        .bind(nova.expira_em)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, "Cobrança já registrada."))
    }

    pub async fn buscar<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<TransacaoPix>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transacao = sqlx::query_as::<_, TransacaoPix>("SELECT * FROM transacoes_pix WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(transacao)
    }

    pub async fn buscar_para_atualizar<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<TransacaoPix>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transacao = sqlx::query_as::<_, TransacaoPix>(
            "SELECT * FROM transacoes_pix WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(transacao)
    }

    // Usado pelos webhooks, que só conhecem o id do provedor
    pub async fn buscar_por_provider_id_para_atualizar<'e, E>(
        &self,
        executor: E,
        provedor: ProvedorPagamento,
        provider_id: &str,
    ) -> Result<Option<TransacaoPix>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transacao = sqlx::query_as::<_, TransacaoPix>(
            "SELECT * FROM transacoes_pix WHERE provedor = $1 AND provider_id = $2 FOR UPDATE",
        )
        .bind(provedor)
        .bind(provider_id)
        .fetch_optional(executor)
        .await?;

        Ok(transacao)
    }

    // Cobrança ainda válida do mesmo pedido/recarga: reaproveitada em vez de gerar outra
    pub async fn buscar_pendente<'e, E>(
        &self,
        executor: E,
        pedido_id: Option<Uuid>,
        recarga_id: Option<Uuid>,
        tipo: TipoCobranca,
    ) -> Result<Option<TransacaoPix>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transacao = sqlx::query_as::<_, TransacaoPix>(
            r#"
            SELECT * FROM transacoes_pix
            WHERE pedido_id IS NOT DISTINCT FROM $1
              AND recarga_id IS NOT DISTINCT FROM $2
              AND tipo = $3
              AND status = 'pendente'
              AND (expira_em IS NULL OR expira_em > NOW())
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(pedido_id)
        .bind(recarga_id)
        .bind(tipo)
        .fetch_optional(executor)
        .await?;

        Ok(transacao)
    }

    pub async fn listar_por_pedido<'e, E>(&self, executor: E, pedido_id: Uuid) -> Result<Vec<TransacaoPix>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transacoes = sqlx::query_as::<_, TransacaoPix>(
            "SELECT * FROM transacoes_pix WHERE pedido_id = $1 ORDER BY created_at DESC",
        )
        .bind(pedido_id)
        .fetch_all(executor)
        .await?;

        Ok(transacoes)
    }

    pub async fn atualizar_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: StatusPagamento,
        pago_em: Option<DateTime<Utc>>,
    ) -> Result<TransacaoPix, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transacao = sqlx::query_as::<_, TransacaoPix>(
            r#"
            UPDATE transacoes_pix
            SET status = $2, pago_em = COALESCE($3, pago_em), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(pago_em)
        .fetch_one(executor)
        .await?;

        Ok(transacao)
    }

    /// Marca como expiradas as cobranças pendentes com prazo vencido e devolve as afetadas.
    /// Boleto só expira depois dos dias de compensação.
    pub async fn expirar_vencidas<'e, E>(&self, executor: E, agora: DateTime<Utc>) -> Result<Vec<TransacaoPix>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let expiradas = sqlx::query_as::<_, TransacaoPix>(
            r#"
            UPDATE transacoes_pix
            SET status = 'expirado', updated_at = NOW()
            WHERE status = 'pendente'
              AND expira_em IS NOT NULL
              AND (
                    (tipo = 'pix' AND expira_em <= $1)
                 OR (tipo = 'boleto' AND expira_em + make_interval(days => $2) <= $1)
              )
            RETURNING *
            "#,
        )
        .bind(agora)
        .bind(BOLETO_DIAS_COMPENSACAO as i32)
        .fetch_all(executor)
        .await?;

        Ok(expiradas)
    }

    // Pedido cancelado: QR Codes em aberto não devem mais ser pagos
    pub async fn cancelar_pendentes_do_pedido<'e, E>(&self, executor: E, pedido_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE transacoes_pix
            SET status = 'cancelado', updated_at = NOW()
            WHERE pedido_id = $1 AND status = 'pendente'
            "#,
        )
        .bind(pedido_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }
}
