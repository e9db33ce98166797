// src/services/relatorio_service.rs

use chrono::{DateTime, Duration, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::PgConnection;

use crate::{
    common::error::AppError,
    db::RelatorioRepository,
    models::relatorios::{Periodo, PeriodoQuery, ResumoVendas, VendasDia},
};

const PERIODO_PADRAO_DIAS: i64 = 30;

/// Sem datas: últimos 30 dias até agora. `de` precisa ser anterior a `ate`.
pub fn resolver_periodo(query: &PeriodoQuery, agora: DateTime<Utc>) -> Result<Periodo, AppError> {
    let ate = query.ate.unwrap_or(agora);
    let de = query.de.unwrap_or(ate - Duration::days(PERIODO_PADRAO_DIAS));

    if de >= ate {
        return Err(AppError::RegraNegocio(
            "O início do período deve ser anterior ao fim.".into(),
        ));
    }
    Ok(Periodo { de, ate })
}

pub fn ticket_medio(total: Decimal, quantidade: i64) -> Decimal {
    if quantidade <= 0 {
        return Decimal::ZERO;
    }
    (total / Decimal::from(quantidade)).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Clone)]
pub struct RelatorioService {
    repo: RelatorioRepository,
}

impl RelatorioService {
    pub fn new(repo: RelatorioRepository) -> Self {
        Self { repo }
    }

    pub async fn resumo(&self, conn: &mut PgConnection, query: &PeriodoQuery) -> Result<ResumoVendas, AppError> {
        let periodo = resolver_periodo(query, Utc::now())?;

        let totais = self.repo.totais(&mut *conn, periodo.de, periodo.ate).await?;
        let por_forma_pagamento = self
            .repo
            .por_forma_pagamento(&mut *conn, periodo.de, periodo.ate)
            .await?;

        Ok(ResumoVendas {
            ticket_medio: ticket_medio(totais.total_vendido, totais.quantidade_pedidos),
            periodo,
            total_vendido: totais.total_vendido,
            quantidade_pedidos: totais.quantidade_pedidos,
            total_cancelado: totais.total_cancelado,
            quantidade_cancelados: totais.quantidade_cancelados,
            total_recargas: totais.total_recargas,
            pulseiras_vendidas: totais.pulseiras_vendidas,
            por_forma_pagamento,
        })
    }

    pub async fn vendas_por_dia(
        &self,
        conn: &mut PgConnection,
        query: &PeriodoQuery,
    ) -> Result<Vec<VendasDia>, AppError> {
        let periodo = resolver_periodo(query, Utc::now())?;
        self.repo.vendas_por_dia(conn, periodo.de, periodo.ate).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn periodo_padrao_sao_os_ultimos_30_dias() {
        let agora = Utc::now();
        let periodo = resolver_periodo(&PeriodoQuery::default(), agora).unwrap();
        assert_eq!(periodo.ate, agora);
        assert_eq!(periodo.ate - periodo.de, Duration::days(30));
    }

    #[test]
    fn periodo_invertido_e_recusado() {
        let agora = Utc::now();
        let query = PeriodoQuery { de: Some(agora), ate: Some(agora - Duration::hours(1)) };
        assert!(matches!(resolver_periodo(&query, agora), Err(AppError::RegraNegocio(_))));
    }

    #[test]
    fn ticket_medio_arredonda_e_trata_zero_pedidos() {
        assert_eq!(ticket_medio(dec!(100), 3), dec!(33.33));
        assert_eq!(ticket_medio(dec!(100), 0), Decimal::ZERO);
    }
}
