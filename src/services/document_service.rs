// src/services/document_service.rs

use std::fmt::Display;

use chrono::{DateTime, FixedOffset, Utc};
use genpdf::{elements, fonts::FontData, fonts::FontFamily, style, Element};
use image::Luma;
use qrcode::QrCode;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, money::format_brl},
    db::{CancelamentoRepository, ConfiguracoesRepository, PagamentoRepository, PedidoRepository},
    models::{
        cancelamentos::{Cancelamento, StatusCancelamento},
        configuracoes::ConfiguracoesSistema,
        pagamentos::{StatusPagamento, TipoCobranca, TransacaoPix},
        pedidos::{PedidoDetalhe, StatusPedido},
        relatorios::{PeriodoQuery, ResumoVendas, VendasDia},
    },
    services::relatorio_service::RelatorioService,
};

fn erro_pdf(e: impl Display) -> AppError {
    AppError::InternalServerError(anyhow::Error::msg(e.to_string()))
}

// Horário de Brasília (sem horário de verão desde 2019)
fn horario_local(data: DateTime<Utc>) -> String {
    match FixedOffset::west_opt(3 * 3600) {
        Some(fuso) => data.with_timezone(&fuso).format("%d/%m/%Y %H:%M").to_string(),
        None => data.format("%d/%m/%Y %H:%M UTC").to_string(),
    }
}

fn status_pedido(status: StatusPedido) -> &'static str {
    match status {
        StatusPedido::Pendente => "AGUARDANDO PAGAMENTO",
        StatusPedido::Pago => "PAGO",
        StatusPedido::Cancelado => "CANCELADO",
    }
}

/// O que vai no QR Code do recibo: o "copia e cola" de um PIX ainda
/// pendente do pedido ou, na falta dele, a chave PIX da empresa.
pub fn conteudo_qr_code(
    detalhe: &PedidoDetalhe,
    transacoes: &[TransacaoPix],
    configuracoes: &ConfiguracoesSistema,
    agora: DateTime<Utc>,
) -> Option<String> {
    if detalhe.pedido.status != StatusPedido::Pendente {
        return None;
    }

    transacoes
        .iter()
        .filter(|t| t.tipo == TipoCobranca::Pix && t.status == StatusPagamento::Pendente && !t.venceu(agora))
        .find_map(|t| t.qr_code.clone())
        .or_else(|| configuracoes.chave_pix.clone())
}

#[derive(Clone)]
pub struct DocumentService {
    pedido_repo: PedidoRepository,
    cancelamento_repo: CancelamentoRepository,
    configuracoes_repo: ConfiguracoesRepository,
    pagamento_repo: PagamentoRepository,
    relatorio_service: RelatorioService,
    fonts_dir: String,
}

impl DocumentService {
    pub fn new(
        pedido_repo: PedidoRepository,
        cancelamento_repo: CancelamentoRepository,
        configuracoes_repo: ConfiguracoesRepository,
        pagamento_repo: PagamentoRepository,
        relatorio_service: RelatorioService,
        fonts_dir: String,
    ) -> Self {
        Self {
            pedido_repo,
            cancelamento_repo,
            configuracoes_repo,
            pagamento_repo,
            relatorio_service,
            fonts_dir,
        }
    }

    // =========================================================================
    //  GERAÇÃO (busca os dados e renderiza)
    // =========================================================================

    pub async fn gerar_recibo_pedido<'e, E>(&self, executor: E, pedido_id: Uuid) -> Result<Vec<u8>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let detalhe = self
            .pedido_repo
            .buscar_detalhe(&mut *tx, pedido_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Pedido".into()))?;
        let configuracoes = self.configuracoes_repo.obter(&mut *tx).await?;
        let transacoes = self.pagamento_repo.listar_por_pedido(&mut *tx, pedido_id).await?;

        tx.commit().await?;

        let qr = conteudo_qr_code(&detalhe, &transacoes, &configuracoes, Utc::now());
        self.renderizar_recibo(&detalhe, &configuracoes, qr.as_deref())
    }

    pub async fn gerar_comprovante_cancelamento<'e, E>(
        &self,
        executor: E,
        cancelamento_id: Uuid,
    ) -> Result<Vec<u8>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let cancelamento = self
            .cancelamento_repo
            .buscar(&mut *tx, cancelamento_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Cancelamento".into()))?;

        if cancelamento.status != StatusCancelamento::Aprovado {
            return Err(AppError::RegraNegocio(
                "O comprovante só existe para cancelamentos aprovados.".into(),
            ));
        }

        let detalhe = self
            .pedido_repo
            .buscar_detalhe(&mut *tx, cancelamento.pedido_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Pedido".into()))?;
        let configuracoes = self.configuracoes_repo.obter(&mut *tx).await?;

        tx.commit().await?;

        self.renderizar_comprovante_cancelamento(&cancelamento, &detalhe, &configuracoes)
    }

    pub async fn gerar_relatorio_vendas(&self, conn: &mut PgConnection, query: &PeriodoQuery) -> Result<Vec<u8>, AppError> {
        let resumo = self.relatorio_service.resumo(&mut *conn, query).await?;
        let dias = self.relatorio_service.vendas_por_dia(&mut *conn, query).await?;
        let configuracoes = self.configuracoes_repo.obter(&mut *conn).await?;

        self.renderizar_relatorio(&resumo, &dias, &configuracoes)
    }

    // =========================================================================
    //  RENDERIZAÇÃO
    // =========================================================================

    fn carregar_fontes(&self) -> Result<FontFamily<FontData>, AppError> {
        genpdf::fonts::from_files(&self.fonts_dir, "Roboto", None).map_err(|_| {
            AppError::FontNotFound(format!("Fonte Roboto não encontrada em {}", self.fonts_dir))
        })
    }

    fn novo_documento(&self, titulo: &str, configuracoes: &ConfiguracoesSistema) -> Result<genpdf::Document, AppError> {
        let mut doc = genpdf::Document::new(self.carregar_fontes()?);
        doc.set_title(titulo);

        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        let empresa = configuracoes.nome_empresa.clone().unwrap_or_else(|| "PDV PULSEIRAS".to_string());
        doc.push(elements::Paragraph::new(empresa).styled(style::Style::new().bold().with_font_size(18)));

        if let Some(cnpj) = &configuracoes.cnpj {
            doc.push(elements::Paragraph::new(format!("CNPJ: {}", cnpj)).styled(style::Style::new().with_font_size(10)));
        }
        if let Some(telefone) = &configuracoes.telefone {
            doc.push(elements::Paragraph::new(format!("Telefone: {}", telefone)).styled(style::Style::new().with_font_size(10)));
        }

        doc.push(elements::Break::new(1.5));
        doc.push(elements::Paragraph::new(titulo).styled(style::Style::new().bold().with_font_size(14)));

        Ok(doc)
    }

    fn rodape(doc: &mut genpdf::Document, configuracoes: &ConfiguracoesSistema) {
        if let Some(endereco) = &configuracoes.endereco {
            doc.push(elements::Break::new(2));
            doc.push(elements::Paragraph::new(endereco.clone()).styled(style::Style::new().italic().with_font_size(8)));
        }
    }

    fn tabela_itens(detalhe: &PedidoDetalhe) -> Result<elements::TableLayout, AppError> {
        // Pesos: Produto (4), Qtd (1), Unitário (2), Total (2)
        let mut table = elements::TableLayout::new(vec![4, 1, 2, 2]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        let negrito = style::Style::new().bold();
        table
            .row()
            .element(elements::Paragraph::new("Produto").styled(negrito))
            .element(elements::Paragraph::new("Qtd").styled(negrito))
            .element(elements::Paragraph::new("Unitário").styled(negrito))
            .element(elements::Paragraph::new("Total").styled(negrito))
            .push()
            .map_err(erro_pdf)?;

        for item in &detalhe.itens {
            table
                .row()
                .element(elements::Paragraph::new(item.nome.clone()))
                .element(elements::Paragraph::new(item.quantidade.to_string()))
                .element(elements::Paragraph::new(format_brl(item.preco_unitario)))
                .element(elements::Paragraph::new(format_brl(item.total)))
                .push()
                .map_err(erro_pdf)?;
        }

        Ok(table)
    }

    fn renderizar(doc: genpdf::Document) -> Result<Vec<u8>, AppError> {
        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(erro_pdf)?;
        Ok(buffer)
    }

    pub fn renderizar_recibo(
        &self,
        detalhe: &PedidoDetalhe,
        configuracoes: &ConfiguracoesSistema,
        qr_code: Option<&str>,
    ) -> Result<Vec<u8>, AppError> {
        let pedido = &detalhe.pedido;
        let mut doc = self.novo_documento(&format!("RECIBO / PEDIDO #{}", pedido.numero), configuracoes)?;

        doc.push(elements::Paragraph::new(format!("Data: {}", horario_local(pedido.created_at))));
        doc.push(elements::Paragraph::new(format!(
            "Cliente: {}",
            detalhe.cliente_nome.as_deref().unwrap_or("Consumidor Final")
        )));
        if let Some(codigo) = &detalhe.pulseira_codigo {
            doc.push(elements::Paragraph::new(format!("Pulseira: {}", codigo)));
        }
        doc.push(elements::Paragraph::new(format!(
            "Pagamento: {} ({})",
            pedido.forma_pagamento.descricao(),
            status_pedido(pedido.status)
        )));

        doc.push(elements::Break::new(2));
        doc.push(Self::tabela_itens(detalhe)?);
        doc.push(elements::Break::new(2));

        // --- TOTAIS ---
        let alinhado = |texto: String| {
            let mut p = elements::Paragraph::new(texto);
            p.set_alignment(genpdf::Alignment::Right);
            p
        };
        doc.push(alinhado(format!("Subtotal: {}", format_brl(pedido.subtotal))));
        if pedido.desconto > rust_decimal::Decimal::ZERO {
            doc.push(alinhado(format!("Desconto: -{}", format_brl(pedido.desconto))));
        }
        doc.push(
            alinhado(format!("TOTAL: {}", format_brl(pedido.total)))
                .styled(style::Style::new().bold().with_font_size(12)),
        );

        if let Some(observacao) = &pedido.observacao {
            doc.push(elements::Break::new(1));
            doc.push(elements::Paragraph::new(format!("Obs.: {}", observacao)));
        }

        // --- PIX ---
        if let Some(conteudo) = qr_code {
            doc.push(elements::Break::new(2));
            doc.push(elements::Paragraph::new("PAGAMENTO VIA PIX").styled(style::Style::new().bold().with_font_size(12)));
            if let Some(chave) = configuracoes.chave_pix.as_deref().filter(|c| *c == conteudo) {
                doc.push(elements::Paragraph::new(format!("Chave: {}", chave)));
            }
            doc.push(elements::Break::new(1));

            let code = QrCode::new(conteudo.as_bytes()).map_err(erro_pdf)?;
            let imagem = image::DynamicImage::ImageLuma8(code.render::<Luma<u8>>().build());
            let qr = elements::Image::from_dynamic_image(imagem)
                .map_err(erro_pdf)?
                .with_scale(genpdf::Scale::new(0.5, 0.5));
            doc.push(qr);
        }

        Self::rodape(&mut doc, configuracoes);
        Self::renderizar(doc)
    }

    pub fn renderizar_comprovante_cancelamento(
        &self,
        cancelamento: &Cancelamento,
        detalhe: &PedidoDetalhe,
        configuracoes: &ConfiguracoesSistema,
    ) -> Result<Vec<u8>, AppError> {
        let pedido = &detalhe.pedido;
        let mut doc = self.novo_documento(
            &format!("COMPROVANTE DE CANCELAMENTO / PEDIDO #{}", pedido.numero),
            configuracoes,
        )?;

        doc.push(elements::Paragraph::new(format!("Pedido realizado em: {}", horario_local(pedido.created_at))));
        doc.push(elements::Paragraph::new(format!("Solicitado em: {}", horario_local(cancelamento.created_at))));
        doc.push(elements::Paragraph::new(format!("Aprovado em: {}", horario_local(cancelamento.updated_at))));
        doc.push(elements::Paragraph::new(format!(
            "Cliente: {}",
            detalhe.cliente_nome.as_deref().unwrap_or("Consumidor Final")
        )));
        doc.push(elements::Paragraph::new(format!("Forma de pagamento: {}", pedido.forma_pagamento.descricao())));

        doc.push(elements::Break::new(1));
        doc.push(elements::Paragraph::new("Motivo").styled(style::Style::new().bold()));
        doc.push(elements::Paragraph::new(cancelamento.motivo.clone()));
        if let Some(observacao) = &cancelamento.observacao_admin {
            doc.push(elements::Paragraph::new("Observação do administrador").styled(style::Style::new().bold()));
            doc.push(elements::Paragraph::new(observacao.clone()));
        }

        doc.push(elements::Break::new(2));
        doc.push(Self::tabela_itens(detalhe)?);
        doc.push(elements::Break::new(2));

        let mut total = elements::Paragraph::new(format!("VALOR CANCELADO: {}", format_brl(pedido.total)));
        total.set_alignment(genpdf::Alignment::Right);
        doc.push(total.styled(style::Style::new().bold().with_font_size(12)));

        if let Some(codigo) = &detalhe.pulseira_codigo {
            doc.push(elements::Paragraph::new(format!("Valor devolvido ao saldo da pulseira {}.", codigo)));
        }

        Self::rodape(&mut doc, configuracoes);
        Self::renderizar(doc)
    }

    pub fn renderizar_relatorio(
        &self,
        resumo: &ResumoVendas,
        dias: &[VendasDia],
        configuracoes: &ConfiguracoesSistema,
    ) -> Result<Vec<u8>, AppError> {
        let mut doc = self.novo_documento("RELATÓRIO DE VENDAS", configuracoes)?;

        doc.push(elements::Paragraph::new(format!(
            "Período: {} a {}",
            horario_local(resumo.periodo.de),
            horario_local(resumo.periodo.ate)
        )));
        doc.push(elements::Break::new(1.5));

        // --- RESUMO ---
        let mut tabela = elements::TableLayout::new(vec![3, 2]);
        tabela.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));
        let linhas = [
            ("Total vendido", format_brl(resumo.total_vendido)),
            ("Pedidos pagos", resumo.quantidade_pedidos.to_string()),
            ("Ticket médio", format_brl(resumo.ticket_medio)),
            ("Total cancelado", format_brl(resumo.total_cancelado)),
            ("Pedidos cancelados", resumo.quantidade_cancelados.to_string()),
            ("Recargas", format_brl(resumo.total_recargas)),
            ("Pulseiras vendidas", resumo.pulseiras_vendidas.to_string()),
        ];
        for (rotulo, valor) in linhas {
            tabela
                .row()
                .element(elements::Paragraph::new(rotulo).styled(style::Style::new().bold()))
                .element(elements::Paragraph::new(valor))
                .push()
                .map_err(erro_pdf)?;
        }
        doc.push(tabela);

        // --- POR FORMA DE PAGAMENTO ---
        if !resumo.por_forma_pagamento.is_empty() {
            doc.push(elements::Break::new(1.5));
            doc.push(elements::Paragraph::new("Por forma de pagamento").styled(style::Style::new().bold().with_font_size(12)));

            let mut formas = elements::TableLayout::new(vec![3, 1, 2]);
            formas.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));
            for forma in &resumo.por_forma_pagamento {
                formas
                    .row()
                    .element(elements::Paragraph::new(forma.forma_pagamento.descricao()))
                    .element(elements::Paragraph::new(forma.quantidade.to_string()))
                    .element(elements::Paragraph::new(format_brl(forma.total)))
                    .push()
                    .map_err(erro_pdf)?;
            }
            doc.push(formas);
        }

        // --- POR DIA ---
        if !dias.is_empty() {
            doc.push(elements::Break::new(1.5));
            doc.push(elements::Paragraph::new("Vendas por dia").styled(style::Style::new().bold().with_font_size(12)));

            let mut por_dia = elements::TableLayout::new(vec![2, 1, 2]);
            por_dia.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));
            for dia in dias {
                por_dia
                    .row()
                    .element(elements::Paragraph::new(dia.dia.format("%d/%m/%Y").to_string()))
                    .element(elements::Paragraph::new(dia.quantidade.to_string()))
                    .element(elements::Paragraph::new(format_brl(dia.total)))
                    .push()
                    .map_err(erro_pdf)?;
            }
            doc.push(por_dia);
        }

        Self::rodape(&mut doc, configuracoes);
        Self::renderizar(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        pagamentos::ProvedorPagamento,
        pedidos::{FormaPagamento, Pedido},
        relatorios::Periodo,
    };
    use rust_decimal_macros::dec;

    fn service(fonts_dir: &str) -> DocumentService {
        DocumentService::new(
            PedidoRepository,
            CancelamentoRepository,
            ConfiguracoesRepository,
            PagamentoRepository,
            RelatorioService::new(crate::db::RelatorioRepository),
            fonts_dir.to_string(),
        )
    }

    fn detalhe(status: StatusPedido) -> PedidoDetalhe {
        let agora = Utc::now();
        PedidoDetalhe {
            pedido: Pedido {
                id: Uuid::new_v4(),
                numero: 1024,
                cliente_id: None,
                pulseira_id: None,
                terminal_id: None,
                voucher_id: None,
                subtotal: dec!(40),
                desconto: dec!(0),
                total: dec!(40),
                forma_pagamento: FormaPagamento::Pix,
                status,
                observacao: None,
                created_at: agora,
                updated_at: agora,
            },
            cliente_nome: None,
            pulseira_codigo: None,
            itens: Vec::new(),
        }
    }

    fn pix(status: StatusPagamento, qr: &str, expira_em: DateTime<Utc>) -> TransacaoPix {
        let agora = Utc::now();
        TransacaoPix {
            id: Uuid::new_v4(),
            pedido_id: None,
            recarga_id: None,
            provedor: ProvedorPagamento::Pagarme,
            provider_id: "or_1".into(),
            tipo: TipoCobranca::Pix,
            valor: dec!(40),
            qr_code: Some(qr.into()),
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
    fn qr_do_recibo_prefere_pix_pendente_valido() {
        let agora = Utc::now();
        let configuracoes = ConfiguracoesSistema {
            chave_pix: Some("12345678000199".into()),
            ..Default::default()
        };
        let futuro = agora + chrono::Duration::minutes(10);
        let passado = agora - chrono::Duration::minutes(10);

        let transacoes = vec![
            pix(StatusPagamento::Pendente, "vencido", passado),
            pix(StatusPagamento::Pendente, "00020126-valido", futuro),
        ];
        assert_eq!(
            conteudo_qr_code(&detalhe(StatusPedido::Pendente), &transacoes, &configuracoes, agora).as_deref(),
            Some("00020126-valido")
        );

        // Sem cobrança válida cai para a chave da empresa
        assert_eq!(
            conteudo_qr_code(&detalhe(StatusPedido::Pendente), &transacoes[..1], &configuracoes, agora).as_deref(),
            Some("12345678000199")
        );

        // Pedido pago não leva QR Code
        assert_eq!(
            conteudo_qr_code(&detalhe(StatusPedido::Pago), &transacoes, &configuracoes, agora),
            None
        );
    }

    #[test]
    fn sem_fonte_o_pdf_nao_e_gerado() {
        let agora = Utc::now();
        let resumo = ResumoVendas {
            periodo: Periodo { de: agora - chrono::Duration::days(1), ate: agora },
            total_vendido: dec!(0),
            quantidade_pedidos: 0,
            ticket_medio: dec!(0),
            total_cancelado: dec!(0),
            quantidade_cancelados: 0,
            total_recargas: dec!(0),
            pulseiras_vendidas: 0,
            por_forma_pagamento: Vec::new(),
        };

        let resultado = service("/caminho/que/nao/existe").renderizar_relatorio(
            &resumo,
            &[],
            &ConfiguracoesSistema::default(),
        );
        assert!(matches!(resultado, Err(AppError::FontNotFound(_))));
    }

    #[test]
    fn horario_de_brasilia() {
        let data = DateTime::parse_from_rfc3339("2026-10-18T15:30:00Z").unwrap().with_timezone(&Utc);
        assert_eq!(horario_local(data), "18/10/2026 12:30");
    }
}
