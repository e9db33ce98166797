// src/services/pagamento_service.rs

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, money::to_centavos},
    db::{
        pagamento_repo::NovaTransacao, ClienteRepository, ConfiguracoesRepository,
        PagamentoRepository, PedidoRepository, PulseiraRepository,
    },
    gateways::{
        verificar_assinatura, BoletoCriado, CobrancaBoleto, CobrancaCriada, CobrancaPix, Gateways,
        Pagador, PaymentGateway,
    },
    models::{
        clientes::Cliente,
        pagamentos::{
            ProvedorPagamento, StatusPagamento, TipoCobranca, TransacaoPix, TransacaoPixResposta,
        },
        pedidos::{FormaPagamento, Pedido, StatusPedido},
        pulseiras::{RecargaPulseira, StatusRecarga},
    },
    services::pulseira_service::creditar,
};

fn pagador_do_cliente(cliente: Cliente) -> Pagador {
    Pagador {
        nome: cliente.nome,
        documento: cliente.documento,
        email: cliente.email,
    }
}

// Só pedidos pendentes, na forma certa e com valor a cobrar
fn verificar_pedido_cobravel(pedido: &Pedido, forma: FormaPagamento) -> Result<(), AppError> {
    if pedido.status != StatusPedido::Pendente {
        return Err(AppError::Conflict(format!(
            "O pedido #{} não está aguardando pagamento.",
            pedido.numero
        )));
    }
    if pedido.forma_pagamento != forma {
        return Err(AppError::RegraNegocio(format!(
            "O pedido #{} foi registrado para pagamento em {}.",
            pedido.numero,
            pedido.forma_pagamento.descricao()
        )));
    }
    if pedido.total <= Decimal::ZERO {
        return Err(AppError::RegraNegocio("Pedido sem valor a cobrar.".into()));
    }
    Ok(())
}

/// O que fazer com a transação diante do status informado pelo provedor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliacao {
    Ignorar,
    Gravar,
    /// Confirmação que chegou depois de a cobrança expirar ou ser cancelada.
    /// O dinheiro entrou: o `pago` prevalece.
    PagamentoTardio,
}

pub fn reconciliar(atual: StatusPagamento, novo: StatusPagamento) -> Reconciliacao {
    use StatusPagamento::*;
    match (atual, novo) {
        (a, n) if a == n => Reconciliacao::Ignorar,
        (Pendente, _) => Reconciliacao::Gravar,
        (Expirado | Cancelado | Falhou, Pago) => Reconciliacao::PagamentoTardio,
        _ => Reconciliacao::Ignorar,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EfeitoPedido {
    Nenhum,
    MarcarPago,
    /// Pedido cancelado ou já pago por outra cobrança
    EstornoManual,
}

/// Efeito de uma mudança de cobrança no pedido. Cobrança morta não mexe no
/// pedido: ele continua pendente e pode gerar outro QR Code.
pub fn efeito_no_pedido(pedido: StatusPedido, novo: StatusPagamento) -> EfeitoPedido {
    if novo != StatusPagamento::Pago {
        return EfeitoPedido::Nenhum;
    }
    match pedido {
        StatusPedido::Pendente => EfeitoPedido::MarcarPago,
        StatusPedido::Pago | StatusPedido::Cancelado => EfeitoPedido::EstornoManual,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EfeitoRecarga {
    Nenhum,
    Creditar,
    Cancelar,
}

/// Pago credita a recarga pendente, e também a já cancelada por expiração.
pub fn efeito_na_recarga(recarga: StatusRecarga, novo: StatusPagamento) -> EfeitoRecarga {
    match (novo, recarga) {
        (StatusPagamento::Pago, StatusRecarga::Pendente | StatusRecarga::Cancelado) => EfeitoRecarga::Creditar,
        (StatusPagamento::Pago, StatusRecarga::Pago) => EfeitoRecarga::Nenhum,
        (StatusPagamento::Pendente, _) => EfeitoRecarga::Nenhum,
        (_, StatusRecarga::Pendente) => EfeitoRecarga::Cancelar,
        _ => EfeitoRecarga::Nenhum,
    }
}

/// Status a gravar depois do polling. O provedor tem a palavra final; o prazo
/// só vence a cobrança que ele ainda vê pendente (ou que não dá para consultar).
pub fn status_apos_consulta(
    transacao: &TransacaoPix,
    consultado: Option<StatusPagamento>,
    agora: DateTime<Utc>,
) -> StatusPagamento {
    let status = consultado.unwrap_or(transacao.status);
    if status == StatusPagamento::Pendente && transacao.venceu(agora) {
        StatusPagamento::Expirado
    } else {
        status
    }
}

enum Cobranca {
    Pix(CobrancaPix),
    Boleto(CobrancaBoleto),
}

pub enum CobrancaEmitida {
    Pix(CobrancaCriada),
    Boleto(BoletoCriado),
}

/// Cobrança montada com o pedido/recarga travado. Vai ao provedor depois do
/// commit, sem nenhum lock aberto durante a chamada HTTP.
pub struct CobrancaPendente {
    gateway: Arc<dyn PaymentGateway>,
    provedor: ProvedorPagamento,
    pedido_id: Option<Uuid>,
    recarga_id: Option<Uuid>,
    valor: Decimal,
    cobranca: Cobranca,
}

impl CobrancaPendente {
    fn tipo(&self) -> TipoCobranca {
        match self.cobranca {
            Cobranca::Pix(_) => TipoCobranca::Pix,
            Cobranca::Boleto(_) => TipoCobranca::Boleto,
        }
    }
}

pub enum PreparoCobranca {
    /// Clique duplo no "gerar QR Code": devolve o que ainda vale
    Existente(TransacaoPix),
    Emitir(CobrancaPendente),
}

#[derive(Clone)]
pub struct PagamentoService {
    repo: PagamentoRepository,
    pedido_repo: PedidoRepository,
    pulseira_repo: PulseiraRepository,
    cliente_repo: ClienteRepository,
    configuracoes_repo: ConfiguracoesRepository,
    gateways: Gateways,
    webhook_secret: Option<String>,
}

impl PagamentoService {
    pub fn new(
        repo: PagamentoRepository,
        pedido_repo: PedidoRepository,
        pulseira_repo: PulseiraRepository,
        cliente_repo: ClienteRepository,
        configuracoes_repo: ConfiguracoesRepository,
        gateways: Gateways,
        webhook_secret: Option<String>,
    ) -> Self {
        Self {
            repo,
            pedido_repo,
            pulseira_repo,
            cliente_repo,
            configuracoes_repo,
            gateways,
            webhook_secret,
        }
    }

    async fn pagador(&self, conn: &mut PgConnection, cliente_id: Option<Uuid>) -> Result<Option<Pagador>, AppError> {
        let Some(id) = cliente_id else {
            return Ok(None);
        };
        Ok(self.cliente_repo.buscar(&mut *conn, id).await?.map(pagador_do_cliente))
    }

    // =========================================================================
    //  GERAÇÃO DE COBRANÇAS
    //  preparar (transação curta) -> emitir (HTTP, sem transação) -> registrar
    // =========================================================================

    /// Confere o pedido e monta a cobrança PIX, ou devolve a pendente que ainda vale.
    pub async fn preparar_pix_pedido(
        &self,
        conn: &mut PgConnection,
        pedido_id: Uuid,
        provedor: Option<ProvedorPagamento>,
    ) -> Result<PreparoCobranca, AppError> {
        let pedido = self
            .pedido_repo
            .buscar_para_atualizar(&mut *conn, pedido_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Pedido".into()))?;
        verificar_pedido_cobravel(&pedido, FormaPagamento::Pix)?;

        if let Some(existente) = self
            .repo
            .buscar_pendente(&mut *conn, Some(pedido.id), None, TipoCobranca::Pix)
            .await?
        {
            return Ok(PreparoCobranca::Existente(existente));
        }

        let pagador = self.pagador(&mut *conn, pedido.cliente_id).await?;
        let cobranca = self
            .montar_pix(
                conn,
                provedor,
                Some(pedido.id),
                None,
                format!("pedido-{}", pedido.id),
                format!("Pedido #{}", pedido.numero),
                pedido.total,
                pagador,
            )
            .await?;

        Ok(PreparoCobranca::Emitir(cobranca))
    }

    /// PIX de uma recarga pendente, montado dentro da transação da recarga.
    pub async fn preparar_pix_recarga(
        &self,
        conn: &mut PgConnection,
        recarga: &RecargaPulseira,
        cliente_id: Option<Uuid>,
    ) -> Result<CobrancaPendente, AppError> {
        let pagador = self.pagador(&mut *conn, cliente_id).await?;
        self.montar_pix(
            conn,
            None,
            None,
            Some(recarga.id),
            format!("recarga-{}", recarga.id),
            "Recarga de pulseira".to_string(),
            recarga.valor,
            pagador,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn montar_pix(
        &self,
        conn: &mut PgConnection,
        provedor: Option<ProvedorPagamento>,
        pedido_id: Option<Uuid>,
        recarga_id: Option<Uuid>,
        referencia: String,
        descricao: String,
        valor: Decimal,
        pagador: Option<Pagador>,
    ) -> Result<CobrancaPendente, AppError> {
        let configuracoes = self.configuracoes_repo.obter(&mut *conn).await?;
        let provedor = provedor.unwrap_or(configuracoes.provedor_pix);
        let gateway = self.gateways.get(provedor)?;

        let cobranca = CobrancaPix {
            referencia,
            descricao,
            valor_centavos: to_centavos(valor)?,
            expira_em: Utc::now()
                + chrono::Duration::minutes(configuracoes.pix_expiracao_minutos as i64),
            pagador,
        };

        Ok(CobrancaPendente {
            gateway,
            provedor,
            pedido_id,
            recarga_id,
            valor,
            cobranca: Cobranca::Pix(cobranca),
        })
    }

    /// Boleto de um pedido pendente. Exige cliente com CPF/CNPJ.
    pub async fn preparar_boleto(
        &self,
        conn: &mut PgConnection,
        pedido_id: Uuid,
        provedor: Option<ProvedorPagamento>,
    ) -> Result<PreparoCobranca, AppError> {
        let pedido = self
            .pedido_repo
            .buscar_para_atualizar(&mut *conn, pedido_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Pedido".into()))?;
        verificar_pedido_cobravel(&pedido, FormaPagamento::Boleto)?;

        if let Some(existente) = self
            .repo
            .buscar_pendente(&mut *conn, Some(pedido.id), None, TipoCobranca::Boleto)
            .await?
        {
            return Ok(PreparoCobranca::Existente(existente));
        }

        let pagador = self
            .pagador(&mut *conn, pedido.cliente_id)
            .await?
            .filter(|p| p.documento.is_some())
            .ok_or_else(|| {
                AppError::RegraNegocio("Boleto exige um cliente com CPF/CNPJ cadastrado.".into())
            })?;

        let configuracoes = self.configuracoes_repo.obter(&mut *conn).await?;
        let provedor = provedor.unwrap_or(ProvedorPagamento::Pagarme);
        let gateway = self.gateways.get(provedor)?;

        let vencimento = Utc::now().date_naive()
            + chrono::Duration::days(configuracoes.boleto_dias_vencimento as i64);

        Ok(PreparoCobranca::Emitir(CobrancaPendente {
            gateway,
            provedor,
            pedido_id: Some(pedido.id),
            recarga_id: None,
            valor: pedido.total,
            cobranca: Cobranca::Boleto(CobrancaBoleto {
                referencia: format!("pedido-{}", pedido.id),
                descricao: format!("Pedido #{}", pedido.numero),
                valor_centavos: to_centavos(pedido.total)?,
                vencimento,
                pagador,
            }),
        }))
    }

    /// Chamada ao provedor. Não toca no banco.
    pub async fn emitir(&self, pendente: &CobrancaPendente) -> Result<CobrancaEmitida, AppError> {
        match &pendente.cobranca {
            Cobranca::Pix(cobranca) => Ok(CobrancaEmitida::Pix(pendente.gateway.criar_pix(cobranca).await?)),
            Cobranca::Boleto(cobranca) => {
                Ok(CobrancaEmitida::Boleto(pendente.gateway.criar_boleto(cobranca).await?))
            }
        }
    }

    /// Trava de novo o pedido/recarga, confere que ainda aguarda pagamento e grava a cobrança.
    pub async fn registrar(
        &self,
        conn: &mut PgConnection,
        pendente: &CobrancaPendente,
        emitida: CobrancaEmitida,
    ) -> Result<TransacaoPix, AppError> {
        let provider_id = match &emitida {
            CobrancaEmitida::Pix(criada) => criada.provider_id.as_str(),
            CobrancaEmitida::Boleto(criado) => criado.provider_id.as_str(),
        };

        if let Some(pedido_id) = pendente.pedido_id {
            let pedido = self
                .pedido_repo
                .buscar_para_atualizar(&mut *conn, pedido_id)
                .await?
                .ok_or_else(|| AppError::ResourceNotFound("Pedido".into()))?;

            let forma = match pendente.tipo() {
                TipoCobranca::Pix => FormaPagamento::Pix,
                TipoCobranca::Boleto => FormaPagamento::Boleto,
            };
            if let Err(e) = verificar_pedido_cobravel(&pedido, forma) {
                tracing::warn!(
                    "Cobrança {} emitida mas descartada: pedido #{} mudou durante a emissão",
                    provider_id,
                    pedido.numero
                );
                return Err(e);
            }

            // Outra requisição registrou primeiro: a recém-emitida fica sem uso
            if let Some(existente) = self
                .repo
                .buscar_pendente(&mut *conn, Some(pedido.id), None, pendente.tipo())
                .await?
            {
                tracing::warn!(
                    "Cobrança {} descartada: o pedido #{} já tem a {} pendente",
                    provider_id,
                    pedido.numero,
                    existente.provider_id
                );
                return Ok(existente);
            }
        }

        if let Some(recarga_id) = pendente.recarga_id {
            let recarga = self
                .pulseira_repo
                .buscar_recarga_para_atualizar(&mut *conn, recarga_id)
                .await?
                .ok_or_else(|| AppError::ResourceNotFound("Recarga".into()))?;
            if recarga.status != StatusRecarga::Pendente {
                tracing::warn!("Cobrança {} descartada: recarga {} não está pendente", provider_id, recarga.id);
                return Err(AppError::Conflict("A recarga não está aguardando pagamento.".into()));
            }
        }

        let nova = match &emitida {
            CobrancaEmitida::Pix(criada) => NovaTransacao {
                pedido_id: pendente.pedido_id,
                recarga_id: pendente.recarga_id,
                provedor: pendente.provedor,
                provider_id: &criada.provider_id,
                tipo: TipoCobranca::Pix,
                valor: pendente.valor,
                qr_code: Some(&criada.qr_code),
                qr_code_url: criada.qr_code_url.as_deref(),
                linha_digitavel: None,
                boleto_url: None,
                expira_em: criada.expira_em,
            },
            CobrancaEmitida::Boleto(criado) => NovaTransacao {
                pedido_id: pendente.pedido_id,
                recarga_id: pendente.recarga_id,
                provedor: pendente.provedor,
                provider_id: &criado.provider_id,
                tipo: TipoCobranca::Boleto,
                valor: pendente.valor,
                qr_code: None,
                qr_code_url: None,
                linha_digitavel: Some(&criado.linha_digitavel),
                boleto_url: criado.boleto_url.as_deref(),
                expira_em: criado.vencimento,
            },
        };
        let transacao = self.repo.criar(&mut *conn, &nova).await?;

        tracing::info!(
            "{:?} {} gerado via {} ({}, expira em {:?})",
            transacao.tipo,
            transacao.provider_id,
            pendente.provedor.as_str(),
            transacao.valor,
            transacao.expira_em
        );
        Ok(transacao)
    }

    /// A emissão falhou: a recarga que esperava o PIX não vai ser paga.
    pub async fn descartar(&self, conn: &mut PgConnection, pendente: &CobrancaPendente) -> Result<(), AppError> {
        let Some(recarga_id) = pendente.recarga_id else {
            return Ok(());
        };
        if let Some(recarga) = self
            .pulseira_repo
            .buscar_recarga_para_atualizar(&mut *conn, recarga_id)
            .await?
        {
            if recarga.status == StatusRecarga::Pendente {
                self.pulseira_repo
                    .atualizar_status_recarga(&mut *conn, recarga.id, StatusRecarga::Cancelado)
                    .await?;
            }
        }
        Ok(())
    }

    // =========================================================================
    //  CONSULTA (POLLING) E RECONCILIAÇÃO
    // =========================================================================

    pub async fn buscar_transacao<'e, E>(&self, executor: E, id: Uuid) -> Result<TransacaoPix, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .buscar(executor, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Transação".into()))
    }

    pub async fn buscar<'e, E>(&self, executor: E, id: Uuid) -> Result<TransacaoPixResposta, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        Ok(self.buscar_transacao(executor, id).await?.com_contador(Utc::now()))
    }

    /// Pergunta ao provedor, sem banco. `None` quando não há nada a reconciliar.
    /// Expirada ou cancelada ainda é consultada: o pagamento pode ter chegado depois.
    pub async fn consultar_provedor(
        &self,
        transacao: &TransacaoPix,
        agora: DateTime<Utc>,
    ) -> Result<Option<StatusPagamento>, AppError> {
        if transacao.status == StatusPagamento::Pago {
            return Ok(None);
        }

        let consultado = match self.gateways.get(transacao.provedor) {
            Ok(gateway) => Some(gateway.consultar(&transacao.provider_id).await?),
            Err(e) => {
                tracing::warn!("Consulta da transação {} ignorada: {}", transacao.id, e);
                None
            }
        };

        let novo = status_apos_consulta(transacao, consultado, agora);
        Ok((reconciliar(transacao.status, novo) != Reconciliacao::Ignorar).then_some(novo))
    }

    /// Trava a transação e aplica o status vindo do provedor.
    pub async fn aplicar_consulta(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        novo: StatusPagamento,
        agora: DateTime<Utc>,
    ) -> Result<TransacaoPix, AppError> {
        let transacao = self
            .repo
            .buscar_para_atualizar(&mut *conn, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Transação".into()))?;

        self.aplicar_status(conn, transacao, novo, agora).await
    }

    pub async fn listar_por_pedido<'e, E>(
        &self,
        executor: E,
        pedido_id: Uuid,
    ) -> Result<Vec<TransacaoPixResposta>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let agora = Utc::now();
        let transacoes = self.repo.listar_por_pedido(executor, pedido_id).await?;
        Ok(transacoes.into_iter().map(|t| t.com_contador(agora)).collect())
    }

    /// Grava o novo status e propaga para pedido/recarga. A linha já deve estar travada.
    async fn aplicar_status(
        &self,
        conn: &mut PgConnection,
        transacao: TransacaoPix,
        novo: StatusPagamento,
        agora: DateTime<Utc>,
    ) -> Result<TransacaoPix, AppError> {
        match reconciliar(transacao.status, novo) {
            Reconciliacao::Ignorar => return Ok(transacao),
            Reconciliacao::Gravar => {}
            Reconciliacao::PagamentoTardio => tracing::warn!(
                "Pagamento da cobrança {} confirmado depois de {:?}",
                transacao.provider_id,
                transacao.status
            ),
        }

        let pago_em = (novo == StatusPagamento::Pago).then_some(agora);
        let transacao = self
            .repo
            .atualizar_status(&mut *conn, transacao.id, novo, pago_em)
            .await?;

        tracing::info!(
            "Transação {} ({}) agora está {:?}",
            transacao.id,
            transacao.provider_id,
            transacao.status
        );

        if let Some(pedido_id) = transacao.pedido_id {
            self.propagar_ao_pedido(conn, &transacao, pedido_id).await?;
        }
        if let Some(recarga_id) = transacao.recarga_id {
            self.propagar_a_recarga(conn, recarga_id, transacao.status).await?;
        }

        Ok(transacao)
    }

    async fn propagar_ao_pedido(
        &self,
        conn: &mut PgConnection,
        transacao: &TransacaoPix,
        pedido_id: Uuid,
    ) -> Result<(), AppError> {
        let pedido = self
            .pedido_repo
            .buscar_para_atualizar(&mut *conn, pedido_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Pedido".into()))?;

        match efeito_no_pedido(pedido.status, transacao.status) {
            EfeitoPedido::Nenhum => {}
            EfeitoPedido::MarcarPago => {
                self.pedido_repo
                    .atualizar_status(&mut *conn, pedido.id, StatusPedido::Pago)
                    .await?;
                tracing::info!("Pedido #{} pago via {}", pedido.numero, transacao.provedor.as_str());
            }
            EfeitoPedido::EstornoManual => tracing::warn!(
                "Pagamento {} ({}) recebido para o pedido #{} já {:?}; requer estorno manual",
                transacao.provider_id,
                transacao.valor,
                pedido.numero,
                pedido.status
            ),
        }
        Ok(())
    }

    async fn propagar_a_recarga(
        &self,
        conn: &mut PgConnection,
        recarga_id: Uuid,
        novo: StatusPagamento,
    ) -> Result<(), AppError> {
        let recarga = self
            .pulseira_repo
            .buscar_recarga_para_atualizar(&mut *conn, recarga_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Recarga".into()))?;

        match efeito_na_recarga(recarga.status, novo) {
            EfeitoRecarga::Nenhum => {}
            EfeitoRecarga::Cancelar => {
                self.pulseira_repo
                    .atualizar_status_recarga(&mut *conn, recarga.id, StatusRecarga::Cancelado)
                    .await?;
            }
            EfeitoRecarga::Creditar => {
                let pulseira = self
                    .pulseira_repo
                    .buscar_para_atualizar(&mut *conn, recarga.pulseira_id)
                    .await?
                    .ok_or_else(|| AppError::ResourceNotFound("Pulseira".into()))?;

                // Dinheiro já recebido: credita mesmo com a pulseira bloqueada
                let saldo = creditar(pulseira.saldo, recarga.valor);
                self.pulseira_repo.atualizar_saldo(&mut *conn, pulseira.id, saldo).await?;
                self.pulseira_repo
                    .atualizar_status_recarga(&mut *conn, recarga.id, StatusRecarga::Pago)
                    .await?;

                tracing::info!(
                    "Recarga {} paga: pulseira {} agora com saldo {}",
                    recarga.id,
                    pulseira.codigo,
                    saldo
                );
            }
        }
        Ok(())
    }

    // =========================================================================
    //  WEBHOOKS
    // =========================================================================

    fn conferir_assinatura(
        &self,
        provedor: ProvedorPagamento,
        body: &[u8],
        assinatura: Option<&str>,
    ) -> Result<(), AppError> {
        // Sem WEBHOOK_SECRET configurado a verificação fica desligada
        let Some(secret) = &self.webhook_secret else {
            return Ok(());
        };
        if verificar_assinatura(secret, body, assinatura) {
            Ok(())
        } else {
            tracing::warn!("Webhook {} com assinatura inválida", provedor.as_str());
            Err(AppError::AssinaturaInvalida)
        }
    }

    /// Processa a notificação de um provedor. Cobrança desconhecida ou evento
    /// irrelevante devolve `None` (o handler responde 200 assim mesmo).
    pub async fn processar_webhook(
        &self,
        conn: &mut PgConnection,
        provedor: ProvedorPagamento,
        body: &[u8],
        assinatura: Option<&str>,
    ) -> Result<Option<TransacaoPix>, AppError> {
        self.conferir_assinatura(provedor, body, assinatura)?;

        let json: serde_json::Value = serde_json::from_slice(body)
            .map_err(|_| AppError::RegraNegocio("Corpo do webhook não é um JSON válido.".into()))?;

        let gateway = self.gateways.get(provedor)?;
        let Some(notificacao) = gateway.interpretar_webhook(&json) else {
            tracing::info!("Webhook {} ignorado (evento sem status de cobrança)", provedor.as_str());
            return Ok(None);
        };

        let mut tx = conn.begin().await?;

        let Some(transacao) = self
            .repo
            .buscar_por_provider_id_para_atualizar(&mut *tx, provedor, &notificacao.provider_id)
            .await?
        else {
            tracing::warn!(
                "Webhook {} para cobrança desconhecida {}",
                provedor.as_str(),
                notificacao.provider_id
            );
            tx.commit().await?;
            return Ok(None);
        };

        let transacao = self
            .aplicar_status(&mut *tx, transacao, notificacao.status, Utc::now())
            .await?;
        tx.commit().await?;

        Ok(Some(transacao))
    }

    // =========================================================================
    //  EXPIRAÇÃO EM SEGUNDO PLANO
    // =========================================================================

    /// Expira as cobranças vencidas e cancela as recargas ligadas a elas.
    pub async fn expirar_vencidas(&self, pool: &PgPool) -> Result<usize, AppError> {
        let mut tx = pool.begin().await?;

        let expiradas = self.repo.expirar_vencidas(&mut *tx, Utc::now()).await?;
        for transacao in &expiradas {
            if let Some(recarga_id) = transacao.recarga_id {
                self.propagar_a_recarga(&mut *tx, recarga_id, StatusPagamento::Expirado).await?;
            }
        }

        tx.commit().await?;
        Ok(expiradas.len())
    }

    pub fn spawn_expiration_sweeper(self, pool: PgPool, intervalo: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(intervalo);
            loop {
                ticker.tick().await;
                match self.expirar_vencidas(&pool).await {
                    Ok(0) => {}
                    Ok(n) => tracing::info!("⏱️ {} cobrança(s) PIX expirada(s)", n),
                    Err(e) => tracing::error!("Falha ao expirar cobranças PIX: {}", e),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pedido(status: StatusPedido, forma: FormaPagamento, total: Decimal) -> Pedido {
        let agora = Utc::now();
        Pedido {
            id: Uuid::new_v4(),
            numero: 7,
            cliente_id: None,
            pulseira_id: None,
            terminal_id: None,
            voucher_id: None,
            subtotal: total,
            desconto: dec!(0),
            total,
            forma_pagamento: forma,
            status,
            observacao: None,
            created_at: agora,
            updated_at: agora,
        }
    }

    fn transacao(status: StatusPagamento, tipo: TipoCobranca, expira_em: DateTime<Utc>) -> TransacaoPix {
        let agora = Utc::now();
        TransacaoPix {
            id: Uuid::new_v4(),
            pedido_id: None,
            recarga_id: Some(Uuid::new_v4()),
            provedor: ProvedorPagamento::Pagarme,
            provider_id: "or_123".into(),
            tipo,
            valor: dec!(50),
            qr_code: None,
            qr_code_url: None,
            linha_digitavel: None,
            boleto_url: None,
            status,
            expira_em: Some(expira_em),
            pago_em: None,
            created_at: agora,
            updated_at: agora,
        }
    }

    #[test]
    fn pago_repetido_nao_tem_efeito() {
        use StatusPagamento::*;
        assert_eq!(reconciliar(Pendente, Pago), Reconciliacao::Gravar);
        assert_eq!(reconciliar(Pendente, Expirado), Reconciliacao::Gravar);
        assert_eq!(reconciliar(Pendente, Pendente), Reconciliacao::Ignorar);
        assert_eq!(reconciliar(Pago, Pago), Reconciliacao::Ignorar);
        assert_eq!(reconciliar(Pago, Cancelado), Reconciliacao::Ignorar);
        assert_eq!(reconciliar(Expirado, Cancelado), Reconciliacao::Ignorar);
    }

    #[test]
    fn pagamento_depois_de_expirar_prevalece() {
        use StatusPagamento::*;
        assert_eq!(reconciliar(Expirado, Pago), Reconciliacao::PagamentoTardio);
        assert_eq!(reconciliar(Cancelado, Pago), Reconciliacao::PagamentoTardio);
        assert_eq!(reconciliar(Falhou, Pago), Reconciliacao::PagamentoTardio);

        // Recarga cancelada pela expiração volta a ser creditada
        assert_eq!(efeito_na_recarga(StatusRecarga::Cancelado, Pago), EfeitoRecarga::Creditar);
    }

    #[test]
    fn pago_fecha_pedido_pendente_e_avisa_nos_demais() {
        use StatusPagamento::*;
        assert_eq!(efeito_no_pedido(StatusPedido::Pendente, Pago), EfeitoPedido::MarcarPago);
        assert_eq!(efeito_no_pedido(StatusPedido::Cancelado, Pago), EfeitoPedido::EstornoManual);
        assert_eq!(efeito_no_pedido(StatusPedido::Pago, Pago), EfeitoPedido::EstornoManual);
        // Cobrança morta deixa o pedido pendente para gerar outro QR Code
        assert_eq!(efeito_no_pedido(StatusPedido::Pendente, Expirado), EfeitoPedido::Nenhum);
        assert_eq!(efeito_no_pedido(StatusPedido::Pendente, Falhou), EfeitoPedido::Nenhum);
    }

    #[test]
    fn recarga_segue_a_cobranca() {
        use StatusPagamento::*;
        assert_eq!(efeito_na_recarga(StatusRecarga::Pendente, Pago), EfeitoRecarga::Creditar);
        assert_eq!(efeito_na_recarga(StatusRecarga::Pago, Pago), EfeitoRecarga::Nenhum);
        assert_eq!(efeito_na_recarga(StatusRecarga::Pendente, Expirado), EfeitoRecarga::Cancelar);
        assert_eq!(efeito_na_recarga(StatusRecarga::Pendente, Falhou), EfeitoRecarga::Cancelar);
        assert_eq!(efeito_na_recarga(StatusRecarga::Pago, Expirado), EfeitoRecarga::Nenhum);
        assert_eq!(efeito_na_recarga(StatusRecarga::Pendente, Pendente), EfeitoRecarga::Nenhum);
    }

    #[test]
    fn polling_pergunta_ao_provedor_antes_de_expirar() {
        let agora = Utc::now();
        let vencida = transacao(
            StatusPagamento::Pendente,
            TipoCobranca::Pix,
            agora - chrono::Duration::seconds(1),
        );

        assert_eq!(
            status_apos_consulta(&vencida, Some(StatusPagamento::Pago), agora),
            StatusPagamento::Pago
        );
        assert_eq!(
            status_apos_consulta(&vencida, Some(StatusPagamento::Pendente), agora),
            StatusPagamento::Expirado
        );
        // Provedor fora do ar: só o prazo decide
        assert_eq!(status_apos_consulta(&vencida, None, agora), StatusPagamento::Expirado);

        let no_prazo = transacao(
            StatusPagamento::Pendente,
            TipoCobranca::Pix,
            agora + chrono::Duration::minutes(5),
        );
        assert_eq!(status_apos_consulta(&no_prazo, None, agora), StatusPagamento::Pendente);
    }

    #[test]
    fn boleto_pago_no_vencimento_nao_expira() {
        let agora = Utc::now();
        let boleto = transacao(
            StatusPagamento::Pendente,
            TipoCobranca::Boleto,
            agora - chrono::Duration::hours(20),
        );
        assert_eq!(
            status_apos_consulta(&boleto, Some(StatusPagamento::Pendente), agora),
            StatusPagamento::Pendente
        );
    }

    #[tokio::test]
    async fn emissao_vai_ao_provedor_sem_conexao_com_o_banco() {
        use crate::gateways::PagarmeGateway;
        use serde_json::json;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "or_xyz",
                "status": "pending",
                "charges": [{
                    "id": "ch_1",
                    "status": "pending",
                    "last_transaction": {
                        "qr_code": "00020101021226",
                        "qr_code_url": null,
                        "expires_at": "2030-01-01T12:00:00Z"
                    }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gateway: Arc<dyn PaymentGateway> =
            Arc::new(PagarmeGateway::new("sk_test".into(), Some(server.uri())).unwrap());
        let pendente = CobrancaPendente {
            gateway,
            provedor: ProvedorPagamento::Pagarme,
            pedido_id: Some(Uuid::new_v4()),
            recarga_id: None,
            valor: dec!(40.50),
            cobranca: Cobranca::Pix(CobrancaPix {
                referencia: "pedido-1".into(),
                descricao: "Pedido #1".into(),
                valor_centavos: 4050,
                expira_em: Utc::now() + chrono::Duration::minutes(30),
                pagador: None,
            }),
        };

        let emitida = service(None).emitir(&pendente).await.unwrap();
        assert!(matches!(emitida, CobrancaEmitida::Pix(c) if c.provider_id == "or_xyz"));
        assert_eq!(pendente.tipo(), TipoCobranca::Pix);
    }

    #[test]
    fn so_cobra_pedido_pendente_da_mesma_forma() {
        let ok = pedido(StatusPedido::Pendente, FormaPagamento::Pix, dec!(40));
        assert!(verificar_pedido_cobravel(&ok, FormaPagamento::Pix).is_ok());

        let pago = pedido(StatusPedido::Pago, FormaPagamento::Pix, dec!(40));
        assert!(matches!(
            verificar_pedido_cobravel(&pago, FormaPagamento::Pix),
            Err(AppError::Conflict(_))
        ));

        assert!(matches!(
            verificar_pedido_cobravel(&ok, FormaPagamento::Boleto),
            Err(AppError::RegraNegocio(_))
        ));

        let gratis = pedido(StatusPedido::Pendente, FormaPagamento::Pix, dec!(0));
        assert!(matches!(
            verificar_pedido_cobravel(&gratis, FormaPagamento::Pix),
            Err(AppError::RegraNegocio(_))
        ));
    }

    fn service(webhook_secret: Option<&str>) -> PagamentoService {
        PagamentoService::new(
            PagamentoRepository,
            PedidoRepository,
            PulseiraRepository,
            ClienteRepository,
            ConfiguracoesRepository,
            Gateways::default(),
            webhook_secret.map(String::from),
        )
    }

    #[test]
    fn assinatura_do_webhook_so_e_exigida_com_secret() {
        let body = br#"{"type":"order.paid"}"#;

        assert!(service(None)
            .conferir_assinatura(ProvedorPagamento::Pagarme, body, None)
            .is_ok());

        assert!(matches!(
            service(Some("s3gredo")).conferir_assinatura(ProvedorPagamento::Pagarme, body, Some("sha256=00")),
            Err(AppError::AssinaturaInvalida)
        ));
    }
}
