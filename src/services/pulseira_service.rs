// src/services/pulseira_service.rs

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::{busca::normalize_search, error::AppError},
    db::PulseiraRepository,
    models::{
        pedidos::FormaPagamento,
        pulseiras::{
            ExtratoPulseira, Pulseira, RecargaCriada, RecargaPayload, StatusPulseira,
            StatusRecarga, VenderPulseiraPayload,
        },
    },
    services::pagamento_service::{CobrancaPendente, PagamentoService},
};

/// Bloqueada ou inativa não recebe recarga nem paga pedido.
pub fn verificar_operavel(pulseira: &Pulseira) -> Result<(), AppError> {
    match pulseira.status {
        StatusPulseira::Ativa => Ok(()),
        outro => Err(AppError::PulseiraIndisponivel(outro.as_str().to_string())),
    }
}

/// Novo saldo após um débito. Nunca fica negativo.
pub fn debitar(saldo: Decimal, valor: Decimal) -> Result<Decimal, AppError> {
    let novo = saldo - valor;
    if novo < Decimal::ZERO {
        return Err(AppError::SaldoInsuficiente);
    }
    Ok(novo)
}

pub fn creditar(saldo: Decimal, valor: Decimal) -> Decimal {
    saldo + valor
}

pub(crate) fn normalizar_codigo(codigo: &str) -> String {
    codigo.trim().to_uppercase()
}

#[derive(Clone)]
pub struct PulseiraService {
    repo: PulseiraRepository,
    pagamento_service: PagamentoService,
}

impl PulseiraService {
    pub fn new(repo: PulseiraRepository, pagamento_service: PagamentoService) -> Self {
        Self { repo, pagamento_service }
    }

    /// Venda no balcão: cria a pulseira, registra a venda e, se houver,
    /// o crédito inicial como uma recarga já paga.
    pub async fn vender<'e, E>(&self, executor: E, payload: &VenderPulseiraPayload) -> Result<ExtratoPulseira, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if !matches!(payload.forma_pagamento, FormaPagamento::Dinheiro | FormaPagamento::Cartao) {
            return Err(AppError::RegraNegocio(
                "A venda de pulseira é recebida em dinheiro ou cartão.".into(),
            ));
        }

        let mut tx = executor.begin().await?;

        let codigo = normalizar_codigo(&payload.codigo);
        let pulseira = self
            .repo
            .criar(&mut *tx, &codigo, payload.cliente_id, payload.credito_inicial)
            .await?;

        let venda = self
            .repo
            .registrar_venda(
                &mut *tx,
                pulseira.id,
                payload.cliente_id,
                payload.terminal_id,
                payload.valor,
                payload.forma_pagamento,
            )
            .await?;

        let mut recargas = Vec::new();
        if payload.credito_inicial > Decimal::ZERO {
            let recarga = self
                .repo
                .criar_recarga(
                    &mut *tx,
                    pulseira.id,
                    payload.terminal_id,
                    payload.credito_inicial,
                    payload.forma_pagamento,
                    StatusRecarga::Pago,
                )
                .await?;
            recargas.push(recarga);
        }

        tx.commit().await?;
        tracing::info!(
            "Pulseira {} vendida ({} de crédito inicial)",
            pulseira.codigo,
            payload.credito_inicial
        );

        Ok(ExtratoPulseira {
            pulseira,
            vendas: vec![venda],
            recargas,
            consumos: Vec::new(),
        })
    }

    pub async fn listar<'e, E>(
        &self,
        executor: E,
        busca: Option<&str>,
        status: Option<StatusPulseira>,
    ) -> Result<Vec<Pulseira>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let padrao = normalize_search(busca);
        self.repo.listar(executor, padrao.as_deref(), status).await
    }

    pub async fn buscar_por_codigo<'e, E>(&self, executor: E, codigo: &str) -> Result<Pulseira, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .buscar_por_codigo(executor, &normalizar_codigo(codigo))
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Pulseira".into()))
    }

    pub async fn alterar_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: StatusPulseira,
    ) -> Result<Pulseira, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pulseira = self
            .repo
            .alterar_status(executor, id, status)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Pulseira".into()))?;

        tracing::info!("Pulseira {} agora está {}", pulseira.codigo, status.as_str());
        Ok(pulseira)
    }

    /// Dinheiro/cartão creditam na hora. PIX deixa a recarga pendente até a
    /// confirmação do provedor e devolve a cobrança a emitir depois do commit.
    pub async fn recarregar<'e, E>(
        &self,
        executor: E,
        codigo: &str,
        payload: &RecargaPayload,
    ) -> Result<(RecargaCriada, Option<CobrancaPendente>), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let pulseira = self
            .repo
            .buscar_por_codigo_para_atualizar(&mut *tx, &normalizar_codigo(codigo))
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Pulseira".into()))?;
        verificar_operavel(&pulseira)?;

        let (resultado, cobranca) = match payload.forma_pagamento {
            FormaPagamento::Dinheiro | FormaPagamento::Cartao => {
                let recarga = self
                    .repo
                    .criar_recarga(
                        &mut *tx,
                        pulseira.id,
                        payload.terminal_id,
                        payload.valor,
                        payload.forma_pagamento,
                        StatusRecarga::Pago,
                    )
                    .await?;
                let saldo = creditar(pulseira.saldo, payload.valor);
                let pulseira = self.repo.atualizar_saldo(&mut *tx, pulseira.id, saldo).await?;

                (RecargaCriada { recarga, pulseira, transacao_pix: None }, None)
            }
            FormaPagamento::Pix => {
                let recarga = self
                    .repo
                    .criar_recarga(
                        &mut *tx,
                        pulseira.id,
                        payload.terminal_id,
                        payload.valor,
                        payload.forma_pagamento,
                        StatusRecarga::Pendente,
                    )
                    .await?;
                let cobranca = self
                    .pagamento_service
                    .preparar_pix_recarga(&mut *tx, &recarga, pulseira.cliente_id)
                    .await?;

                (RecargaCriada { recarga, pulseira, transacao_pix: None }, Some(cobranca))
            }
            outra => {
                return Err(AppError::RegraNegocio(format!(
                    "Recarga não aceita pagamento em {}.",
                    outra.descricao()
                )));
            }
        };

        tx.commit().await?;
        tracing::info!(
            "Recarga de {} na pulseira {} ({:?})",
            payload.valor,
            resultado.pulseira.codigo,
            resultado.recarga.status
        );
        Ok((resultado, cobranca))
    }

    pub async fn extrato(&self, conn: &mut PgConnection, codigo: &str) -> Result<ExtratoPulseira, AppError> {
        let pulseira = self.buscar_por_codigo(&mut *conn, codigo).await?;

        let vendas = self.repo.listar_vendas(&mut *conn, pulseira.id).await?;
        let recargas = self.repo.listar_recargas(&mut *conn, pulseira.id).await?;
        let consumos = self.repo.listar_consumos(&mut *conn, pulseira.id).await?;

        Ok(ExtratoPulseira { pulseira, vendas, recargas, consumos })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn pulseira(status: StatusPulseira) -> Pulseira {
        let agora = Utc::now();
        Pulseira {
            id: Uuid::new_v4(),
            codigo: "PL-000123".into(),
            cliente_id: None,
            saldo: dec!(20),
            status,
            created_at: agora,
            updated_at: agora,
        }
    }

    #[test]
    fn debito_ate_zerar_e_permitido() {
        assert_eq!(debitar(dec!(20.00), dec!(20.00)).unwrap(), dec!(0));
        assert_eq!(debitar(dec!(20.00), dec!(7.50)).unwrap(), dec!(12.50));
    }

    #[test]
    fn debito_acima_do_saldo_e_recusado() {
        assert!(matches!(
            debitar(dec!(20.00), dec!(20.01)),
            Err(AppError::SaldoInsuficiente)
        ));
    }

    #[test]
    fn credito_soma_ao_saldo() {
        assert_eq!(creditar(dec!(12.50), dec!(30)), dec!(42.50));
    }

    #[test]
    fn so_pulseira_ativa_opera() {
        assert!(verificar_operavel(&pulseira(StatusPulseira::Ativa)).is_ok());
        assert!(matches!(
            verificar_operavel(&pulseira(StatusPulseira::Bloqueada)),
            Err(AppError::PulseiraIndisponivel(s)) if s == "bloqueada"
        ));
        assert!(matches!(
            verificar_operavel(&pulseira(StatusPulseira::Inativa)),
            Err(AppError::PulseiraIndisponivel(s)) if s == "inativa"
        ));
    }
}
