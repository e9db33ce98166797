// src/services/cancelamento_service.rs

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        CancelamentoRepository, PagamentoRepository, PedidoRepository, ProdutoRepository,
        PulseiraRepository, VoucherRepository,
    },
    models::{
        cancelamentos::{Cancelamento, StatusCancelamento},
        pedidos::{FormaPagamento, Pedido, StatusPedido},
    },
    services::pulseira_service::creditar,
};

/// O que fazer com uma decisão do admin sobre uma solicitação.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transicao {
    Aplicar,
    /// Mesma decisão repetida: devolve o registro sem efeitos colaterais
    JaAplicada,
}

pub fn transicao(atual: StatusCancelamento, decisao: StatusCancelamento) -> Result<Transicao, AppError> {
    match (atual, decisao) {
        (StatusCancelamento::Solicitado, _) => Ok(Transicao::Aplicar),
        (a, d) if a == d => Ok(Transicao::JaAplicada),
        (StatusCancelamento::Aprovado, _) => Err(AppError::Conflict(
            "Este cancelamento já foi aprovado.".into(),
        )),
        _ => Err(AppError::Conflict("Este cancelamento já foi rejeitado.".into())),
    }
}

/// Quanto volta para a pulseira: só pedidos pagos com saldo.
pub fn valor_a_estornar(pedido: &Pedido) -> Option<(Uuid, Decimal)> {
    match (pedido.forma_pagamento, pedido.status, pedido.pulseira_id) {
        (FormaPagamento::Pulseira, StatusPedido::Pago, Some(pulseira_id)) if pedido.total > Decimal::ZERO => {
            Some((pulseira_id, pedido.total))
        }
        _ => None,
    }
}

#[derive(Clone)]
pub struct CancelamentoService {
    repo: CancelamentoRepository,
    pedido_repo: PedidoRepository,
    produto_repo: ProdutoRepository,
    pulseira_repo: PulseiraRepository,
    voucher_repo: VoucherRepository,
    pagamento_repo: PagamentoRepository,
}

impl CancelamentoService {
    pub fn new(
        repo: CancelamentoRepository,
        pedido_repo: PedidoRepository,
        produto_repo: ProdutoRepository,
        pulseira_repo: PulseiraRepository,
        voucher_repo: VoucherRepository,
        pagamento_repo: PagamentoRepository,
    ) -> Self {
        Self { repo, pedido_repo, produto_repo, pulseira_repo, voucher_repo, pagamento_repo }
    }

    pub async fn solicitar<'e, E>(
        &self,
        executor: E,
        pedido_id: Uuid,
        motivo: &str,
        solicitado_por: Uuid,
    ) -> Result<Cancelamento, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let pedido = self
            .pedido_repo
            .buscar_para_atualizar(&mut *tx, pedido_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Pedido".into()))?;

        if pedido.status == StatusPedido::Cancelado {
            return Err(AppError::Conflict(format!(
                "O pedido #{} já está cancelado.",
                pedido.numero
            )));
        }

        if self.repo.buscar_ativo_por_pedido(&mut *tx, pedido.id).await?.is_some() {
            return Err(AppError::Conflict(
                "Já existe um cancelamento em andamento para este pedido.".into(),
            ));
        }

        // O índice único parcial ainda cobre duas solicitações simultâneas
        let cancelamento = self.repo.criar(&mut *tx, pedido.id, motivo.trim(), solicitado_por).await?;

        tx.commit().await?;
        tracing::info!("Cancelamento solicitado para o pedido #{}", pedido.numero);
        Ok(cancelamento)
    }

    /// Aprova: cancela o pedido, devolve estoque, saldo da pulseira e uso do
    /// voucher. Aprovar de novo devolve o registro sem repetir nada disso.
    pub async fn aprovar<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        observacao: Option<&str>,
        admin_id: Uuid,
    ) -> Result<Cancelamento, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let cancelamento = self
            .repo
            .buscar_para_atualizar(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Cancelamento".into()))?;

        if transicao(cancelamento.status, StatusCancelamento::Aprovado)? == Transicao::JaAplicada {
            tx.commit().await?;
            return Ok(cancelamento);
        }

        let pedido = self
            .pedido_repo
            .buscar_para_atualizar(&mut *tx, cancelamento.pedido_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Pedido".into()))?;

        if pedido.status != StatusPedido::Cancelado {
            // 1. Estoque de volta
            let itens = self.pedido_repo.listar_itens(&mut *tx, pedido.id).await?;
            for item in &itens {
                self.produto_repo
                    .ajustar_estoque(&mut *tx, item.produto_id, item.quantidade)
                    .await?;
            }

            // 2. Saldo de volta para a pulseira
            if let Some((pulseira_id, valor)) = valor_a_estornar(&pedido) {
                let pulseira = self
                    .pulseira_repo
                    .buscar_para_atualizar(&mut *tx, pulseira_id)
                    .await?
                    .ok_or_else(|| AppError::ResourceNotFound("Pulseira".into()))?;
                let saldo = creditar(pulseira.saldo, valor);
                self.pulseira_repo.atualizar_saldo(&mut *tx, pulseira.id, saldo).await?;
                tracing::info!("Estornado {} para a pulseira {}", valor, pulseira.codigo);
            }

            // 3. Uso do voucher e cobranças em aberto
            if let Some(voucher_id) = pedido.voucher_id {
                self.voucher_repo.estornar_uso(&mut *tx, voucher_id).await?;
            }
            self.pagamento_repo.cancelar_pendentes_do_pedido(&mut *tx, pedido.id).await?;

            self.pedido_repo
                .atualizar_status(&mut *tx, pedido.id, StatusPedido::Cancelado)
                .await?;
        }

        let cancelamento = self
            .repo
            .registrar_decisao(&mut *tx, cancelamento.id, StatusCancelamento::Aprovado, observacao, admin_id)
            .await?;

        tx.commit().await?;
        tracing::info!("Pedido #{} cancelado (cancelamento {})", pedido.numero, cancelamento.id);
        Ok(cancelamento)
    }

    pub async fn rejeitar<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        observacao: Option<&str>,
        admin_id: Uuid,
    ) -> Result<Cancelamento, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let cancelamento = self
            .repo
            .buscar_para_atualizar(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Cancelamento".into()))?;

        let cancelamento = match transicao(cancelamento.status, StatusCancelamento::Rejeitado)? {
            Transicao::JaAplicada => cancelamento,
            Transicao::Aplicar => {
                self.repo
                    .registrar_decisao(&mut *tx, id, StatusCancelamento::Rejeitado, observacao, admin_id)
                    .await?
            }
        };

        tx.commit().await?;
        Ok(cancelamento)
    }

    pub async fn listar<'e, E>(
        &self,
        executor: E,
        status: Option<StatusCancelamento>,
    ) -> Result<Vec<Cancelamento>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.listar(executor, status).await
    }

    pub async fn buscar<'e, E>(&self, executor: E, id: Uuid) -> Result<Cancelamento, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .buscar(executor, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Cancelamento".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn pedido(forma: FormaPagamento, status: StatusPedido, pulseira_id: Option<Uuid>) -> Pedido {
        let agora = Utc::now();
        Pedido {
            id: Uuid::new_v4(),
            numero: 42,
            cliente_id: None,
            pulseira_id,
            terminal_id: None,
            voucher_id: None,
            subtotal: dec!(30),
            desconto: dec!(0),
            total: dec!(30),
            forma_pagamento: forma,
            status,
            observacao: None,
            created_at: agora,
            updated_at: agora,
        }
    }

    #[test]
    fn aprovar_duas_vezes_nao_repete_efeitos() {
        use StatusCancelamento::*;
        assert_eq!(transicao(Solicitado, Aprovado).unwrap(), Transicao::Aplicar);
        assert_eq!(transicao(Aprovado, Aprovado).unwrap(), Transicao::JaAplicada);
        assert_eq!(transicao(Rejeitado, Rejeitado).unwrap(), Transicao::JaAplicada);
    }

    #[test]
    fn decisao_contraria_e_conflito() {
        use StatusCancelamento::*;
        assert!(matches!(transicao(Aprovado, Rejeitado), Err(AppError::Conflict(_))));
        assert!(matches!(transicao(Rejeitado, Aprovado), Err(AppError::Conflict(_))));
    }

    #[test]
    fn estorno_so_para_pedido_pago_com_saldo() {
        let pulseira = Some(Uuid::new_v4());

        let pago_com_saldo = pedido(FormaPagamento::Pulseira, StatusPedido::Pago, pulseira);
        assert_eq!(valor_a_estornar(&pago_com_saldo), Some((pulseira.unwrap(), dec!(30))));

        // Vinculado à pulseira mas pago em dinheiro: nada a devolver no saldo
        let dinheiro = pedido(FormaPagamento::Dinheiro, StatusPedido::Pago, pulseira);
        assert_eq!(valor_a_estornar(&dinheiro), None);

        let pendente = pedido(FormaPagamento::Pulseira, StatusPedido::Pendente, pulseira);
        assert_eq!(valor_a_estornar(&pendente), None);
    }
}
