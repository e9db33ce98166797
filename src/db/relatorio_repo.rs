// src/db/relatorio_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection};

use crate::{
    common::error::AppError,
    models::relatorios::{TotalPorForma, VendasDia},
};

// Números brutos do período; médias e arredondamentos ficam no service.
#[derive(Debug, Clone, FromRow)]
pub struct TotaisBrutos {
    pub total_vendido: Decimal,
    pub quantidade_pedidos: i64,
    pub total_cancelado: Decimal,
    pub quantidade_cancelados: i64,
    pub total_recargas: Decimal,
    pub pulseiras_vendidas: i64,
}

#[derive(Clone, Default)]
pub struct RelatorioRepository;

impl RelatorioRepository {
    pub async fn totais(
        &self,
        conn: &mut PgConnection,
        de: DateTime<Utc>,
        ate: DateTime<Utc>,
    ) -> Result<TotaisBrutos, AppError> {
        let totais = sqlx::query_as::<_, TotaisBrutos>(
            r#"
            SELECT
                COALESCE((SELECT SUM(total) FROM pedidos
                          WHERE status = 'pago' AND created_at >= $1 AND created_at < $2), 0) AS total_vendido,
                (SELECT COUNT(*) FROM pedidos
                 WHERE status = 'pago' AND created_at >= $1 AND created_at < $2) AS quantidade_pedidos,
                COALESCE((SELECT SUM(total) FROM pedidos
                          WHERE status = 'cancelado' AND created_at >= $1 AND created_at < $2), 0) AS total_cancelado,
                (SELECT COUNT(*) FROM pedidos
                 WHERE status = 'cancelado' AND created_at >= $1 AND created_at < $2) AS quantidade_cancelados,
                COALESCE((SELECT SUM(valor) FROM recargas_pulseiras
                          WHERE status = 'pago' AND created_at >= $1 AND created_at < $2), 0) AS total_recargas,
                (SELECT COUNT(*) FROM vendas_pulseiras
                 WHERE created_at >= $1 AND created_at < $2) AS pulseiras_vendidas
            "#,
        )
        .bind(de)
        .bind(ate)
        .fetch_one(&mut *conn)
        .await?;

        Ok(totais)
    }

    pub async fn por_forma_pagamento(
        &self,
        conn: &mut PgConnection,
        de: DateTime<Utc>,
        ate: DateTime<Utc>,
    ) -> Result<Vec<TotalPorForma>, AppError> {
        let linhas = sqlx::query_as::<_, TotalPorForma>(
            r#"
            SELECT forma_pagamento, COUNT(*) AS quantidade, COALESCE(SUM(total), 0) AS total
            FROM pedidos
            WHERE status = 'pago' AND created_at >= $1 AND created_at < $2
            GROUP BY forma_pagamento
            ORDER BY total DESC
            "#,
        )
        .bind(de)
        .bind(ate)
        .fetch_all(&mut *conn)
        .await?;

        Ok(linhas)
    }

    pub async fn vendas_por_dia(
        &self,
        conn: &mut PgConnection,
        de: DateTime<Utc>,
        ate: DateTime<Utc>,
    ) -> Result<Vec<VendasDia>, AppError> {
        // Dias agrupados no fuso de Brasília, que é o do caixa
        let linhas = sqlx::query_as::<_, VendasDia>(
            r#"
            SELECT (created_at AT TIME ZONE 'America/Sao_Paulo')::date AS dia,
                   COUNT(*) AS quantidade,
                   COALESCE(SUM(total), 0) AS total
            FROM pedidos
            WHERE status = 'pago' AND created_at >= $1 AND created_at < $2
            GROUP BY dia
            ORDER BY dia ASC
            "#,
        )
        .bind(de)
        .bind(ate)
        .fetch_all(&mut *conn)
        .await?;

        Ok(linhas)
    }
}
