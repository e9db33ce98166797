// src/services/pedido_service.rs

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{pedido_repo::NovoPedido, PedidoRepository, ProdutoRepository, PulseiraRepository},
    models::{
        pedidos::{
            CriarPedidoPayload, FormaPagamento, ItemPedidoPayload, Pedido, PedidoDetalhe,
            PedidoQuery, StatusPedido, QUANTIDADE_MAXIMA_ITEM,
        },
        produtos::{Produto, StatusProduto},
    },
    services::{
        pulseira_service::{debitar, normalizar_codigo, verificar_operavel},
        voucher_service::VoucherService,
    },
};

/// Uma linha do pedido já com preço e total calculados.
#[derive(Debug, Clone, PartialEq)]
pub struct LinhaPedido {
    pub produto_id: Uuid,
    pub nome: String,
    pub quantidade: i32,
    pub preco_unitario: Decimal,
    pub total: Decimal,
}

/// Junta itens repetidos do mesmo produto. A ordem por id é a mesma dos locks.
pub fn agrupar_itens(itens: &[ItemPedidoPayload]) -> Result<BTreeMap<Uuid, i32>, AppError> {
    let mut agrupados = BTreeMap::new();
    for item in itens {
        let quantidade = agrupados.entry(item.produto_id).or_insert(0i32);
        *quantidade = quantidade
            .checked_add(item.quantidade)
            .filter(|total| *total <= QUANTIDADE_MAXIMA_ITEM)
            .ok_or_else(|| {
                AppError::RegraNegocio(format!(
                    "Quantidade acima do limite de {} unidades por produto.",
                    QUANTIDADE_MAXIMA_ITEM
                ))
            })?;
    }
    Ok(agrupados)
}

/// Confere produto ativo e estoque, e precifica cada linha.
pub fn calcular_linhas(
    quantidades: &BTreeMap<Uuid, i32>,
    produtos: &[Produto],
) -> Result<Vec<LinhaPedido>, AppError> {
    quantidades
        .iter()
        .map(|(produto_id, &quantidade)| {
            let produto = produtos
                .iter()
                .find(|p| p.id == *produto_id)
                .ok_or_else(|| AppError::ResourceNotFound(format!("Produto {}", produto_id)))?;

            if produto.status != StatusProduto::Ativo {
                return Err(AppError::RegraNegocio(format!(
                    "O produto {} está inativo.",
                    produto.nome
                )));
            }
            if produto.estoque < quantidade {
                return Err(AppError::EstoqueInsuficiente(produto.nome.clone()));
            }

            Ok(LinhaPedido {
                produto_id: produto.id,
                nome: produto.nome.clone(),
                quantidade,
                preco_unitario: produto.preco,
                total: produto.preco * Decimal::from(quantidade),
            })
        })
        .collect()
}

/// (subtotal, desconto aplicado, total). O total nunca fica negativo.
pub fn calcular_totais(linhas: &[LinhaPedido], desconto: Decimal) -> (Decimal, Decimal, Decimal) {
    let subtotal: Decimal = linhas.iter().map(|l| l.total).sum();
    let desconto = desconto.max(Decimal::ZERO).min(subtotal);
    let total = (subtotal - desconto).max(Decimal::ZERO);
    (subtotal, desconto, total)
}

/// PIX e boleto esperam o provedor; o resto já nasce pago. Pedido zerado
/// pelo voucher não tem o que cobrar.
pub fn status_inicial(forma: FormaPagamento, total: Decimal) -> StatusPedido {
    if forma.aguarda_confirmacao() && total > Decimal::ZERO {
        StatusPedido::Pendente
    } else {
        StatusPedido::Pago
    }
}

#[derive(Clone)]
pub struct PedidoService {
    repo: PedidoRepository,
    produto_repo: ProdutoRepository,
    pulseira_repo: PulseiraRepository,
    voucher_service: VoucherService,
}

impl PedidoService {
    pub fn new(
        repo: PedidoRepository,
        produto_repo: ProdutoRepository,
        pulseira_repo: PulseiraRepository,
        voucher_service: VoucherService,
    ) -> Self {
        Self { repo, produto_repo, pulseira_repo, voucher_service }
    }

    /// Cria o pedido numa única transação: trava os produtos, baixa o estoque,
    /// resgata o voucher e, para `pulseira`, debita o saldo.
    pub async fn criar<'e, E>(&self, executor: E, payload: &CriarPedidoPayload) -> Result<PedidoDetalhe, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // 1. Produtos travados e linhas precificadas
        let quantidades = agrupar_itens(&payload.itens)?;
        let ids: Vec<Uuid> = quantidades.keys().copied().collect();
        let produtos = self.produto_repo.buscar_para_venda(&mut *tx, &ids).await?;
        let linhas = calcular_linhas(&quantidades, &produtos)?;

        // 2. Voucher
        let (subtotal_bruto, _, _) = calcular_totais(&linhas, Decimal::ZERO);
        let (voucher_id, desconto) = match payload.voucher_codigo.as_deref().map(str::trim) {
            Some(codigo) if !codigo.is_empty() => {
                let resgatado = self.voucher_service.resgatar(&mut *tx, codigo, subtotal_bruto).await?;
                (Some(resgatado.voucher.id), resgatado.desconto)
            }
            _ => (None, Decimal::ZERO),
        };
        let (subtotal, desconto, total) = calcular_totais(&linhas, desconto);

        // 3. Pulseira: debita quando é a forma de pagamento, senão só vincula
        let pulseira_id = match payload.pulseira_codigo.as_deref() {
            Some(codigo) => {
                let pulseira = self
                    .pulseira_repo
                    .buscar_por_codigo_para_atualizar(&mut *tx, &normalizar_codigo(codigo))
                    .await?
                    .ok_or_else(|| AppError::ResourceNotFound("Pulseira".into()))?;

                if payload.forma_pagamento == FormaPagamento::Pulseira {
                    verificar_operavel(&pulseira)?;
                    let saldo = debitar(pulseira.saldo, total)?;
                    self.pulseira_repo.atualizar_saldo(&mut *tx, pulseira.id, saldo).await?;
                }
                Some(pulseira.id)
            }
            None if payload.forma_pagamento == FormaPagamento::Pulseira => {
                return Err(AppError::RegraNegocio(
                    "Informe a pulseira para pagar com saldo.".into(),
                ));
            }
            None => None,
        };

        // 4. Pedido e itens, com baixa de estoque
        let status = status_inicial(payload.forma_pagamento, total);
        let pedido = self
            .repo
            .criar(
                &mut *tx,
                &NovoPedido {
                    cliente_id: payload.cliente_id,
                    pulseira_id,
                    terminal_id: payload.terminal_id,
                    voucher_id,
                    subtotal,
                    desconto,
                    total,
                    forma_pagamento: payload.forma_pagamento,
                    status,
                    observacao: payload.observacao.as_deref(),
                },
            )
            .await?;

        for linha in &linhas {
            self.produto_repo
                .ajustar_estoque(&mut *tx, linha.produto_id, -linha.quantidade)
                .await?
                .ok_or_else(|| AppError::EstoqueInsuficiente(linha.nome.clone()))?;

            self.repo
                .inserir_item(
                    &mut *tx,
                    pedido.id,
                    linha.produto_id,
                    &linha.nome,
                    linha.quantidade,
                    linha.preco_unitario,
                    linha.total,
                )
                .await?;
        }

        let detalhe = self
            .repo
            .buscar_detalhe(&mut *tx, pedido.id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Pedido".into()))?;

        tx.commit().await?;
        tracing::info!(
            "Pedido #{} criado: total {} em {} ({:?})",
            pedido.numero,
            pedido.total,
            pedido.forma_pagamento.descricao(),
            pedido.status
        );

        Ok(detalhe)
    }

    pub async fn listar<'e, E>(&self, executor: E, query: &PedidoQuery) -> Result<Vec<Pedido>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.listar(executor, query.status, query.de, query.ate).await
    }

    pub async fn buscar(&self, conn: &mut PgConnection, id: Uuid) -> Result<PedidoDetalhe, AppError> {
        self.repo
            .buscar_detalhe(conn, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Pedido".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn produto(nome: &str, preco: Decimal, estoque: i32, status: StatusProduto) -> Produto {
        let agora = Utc::now();
        Produto {
            id: Uuid::new_v4(),
            nome: nome.into(),
            descricao: None,
            codigo: nome.to_uppercase(),
            preco,
            estoque,
            categoria: None,
            status,
            created_at: agora,
            updated_at: agora,
        }
    }

    fn item(produto_id: Uuid, quantidade: i32) -> ItemPedidoPayload {
        ItemPedidoPayload { produto_id, quantidade }
    }

    #[test]
    fn itens_repetidos_sao_somados() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let agrupados = agrupar_itens(&[item(a, 1), item(b, 2), item(a, 3)]).unwrap();
        assert_eq!(agrupados.len(), 2);
        assert_eq!(agrupados[&a], 4);
        assert_eq!(agrupados[&b], 2);
    }

    #[test]
    fn soma_de_quantidades_nao_estoura() {
        let a = Uuid::new_v4();
        let err = agrupar_itens(&[item(a, 2_000_000_000), item(a, 2_000_000_000)]).unwrap_err();
        assert!(matches!(err, AppError::RegraNegocio(_)));

        let err = agrupar_itens(&[item(a, QUANTIDADE_MAXIMA_ITEM), item(a, 1)]).unwrap_err();
        assert!(matches!(err, AppError::RegraNegocio(_)));

        let no_limite = agrupar_itens(&[item(a, QUANTIDADE_MAXIMA_ITEM - 1), item(a, 1)]).unwrap();
        assert_eq!(no_limite[&a], QUANTIDADE_MAXIMA_ITEM);
    }

    #[test]
    fn subtotal_desconto_e_total() {
        let refri = produto("Refrigerante", dec!(6.50), 10, StatusProduto::Ativo);
        let lanche = produto("Lanche", dec!(18.00), 5, StatusProduto::Ativo);
        let quantidades = agrupar_itens(&[item(refri.id, 2), item(lanche.id, 1)]).unwrap();

        let linhas = calcular_linhas(&quantidades, &[refri, lanche]).unwrap();
        let (subtotal, desconto, total) = calcular_totais(&linhas, dec!(5));

        assert_eq!(subtotal, dec!(31.00));
        assert_eq!(desconto, dec!(5));
        assert_eq!(total, dec!(26.00));
    }

    #[test]
    fn desconto_maior_que_subtotal_zera_o_total() {
        let refri = produto("Refrigerante", dec!(6.50), 10, StatusProduto::Ativo);
        let linhas = calcular_linhas(&agrupar_itens(&[item(refri.id, 1)]).unwrap(), &[refri]).unwrap();

        let (subtotal, desconto, total) = calcular_totais(&linhas, dec!(50));
        assert_eq!(subtotal, dec!(6.50));
        assert_eq!(desconto, dec!(6.50));
        assert_eq!(total, Decimal::ZERO);
    }

    #[test]
    fn estoque_insuficiente_e_produto_inativo() {
        let pouco = produto("Pipoca", dec!(8), 1, StatusProduto::Ativo);
        let quantidades = agrupar_itens(&[item(pouco.id, 2)]).unwrap();
        assert!(matches!(
            calcular_linhas(&quantidades, &[pouco]),
            Err(AppError::EstoqueInsuficiente(nome)) if nome == "Pipoca"
        ));

        let inativo = produto("Sorvete", dec!(9), 10, StatusProduto::Inativo);
        let quantidades = agrupar_itens(&[item(inativo.id, 1)]).unwrap();
        assert!(matches!(
            calcular_linhas(&quantidades, &[inativo]),
            Err(AppError::RegraNegocio(_))
        ));

        let quantidades = agrupar_itens(&[item(Uuid::new_v4(), 1)]).unwrap();
        assert!(matches!(
            calcular_linhas(&quantidades, &[]),
            Err(AppError::ResourceNotFound(_))
        ));
    }

    #[test]
    fn status_inicial_por_forma_de_pagamento() {
        assert_eq!(status_inicial(FormaPagamento::Dinheiro, dec!(10)), StatusPedido::Pago);
        assert_eq!(status_inicial(FormaPagamento::Cartao, dec!(10)), StatusPedido::Pago);
        assert_eq!(status_inicial(FormaPagamento::Pulseira, dec!(10)), StatusPedido::Pago);
        assert_eq!(status_inicial(FormaPagamento::Pix, dec!(10)), StatusPedido::Pendente);
        assert_eq!(status_inicial(FormaPagamento::Boleto, dec!(10)), StatusPedido::Pendente);
        assert_eq!(status_inicial(FormaPagamento::Pix, Decimal::ZERO), StatusPedido::Pago);
    }
}
