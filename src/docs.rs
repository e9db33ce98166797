// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    info(title = "PDV Pulseiras", description = "Retaguarda dos quiosques: pulseiras pré-pagas, pedidos, cancelamentos e cobranças PIX/boleto"),
    paths(
        // --- Clientes ---
        handlers::clientes::listar_clientes,
        handlers::clientes::criar_cliente,
        handlers::clientes::buscar_cliente,
        handlers::clientes::atualizar_cliente,
        handlers::clientes::remover_cliente,

        // --- Produtos ---
        handlers::produtos::criar_produto,
        handlers::produtos::listar_produtos,
        handlers::produtos::buscar_produto,
        handlers::produtos::atualizar_produto,
        handlers::produtos::alterar_status_produto,
        handlers::produtos::ajustar_estoque,

        // --- Terminais ---
        handlers::terminais::criar_terminal,
        handlers::terminais::listar_terminais,
        handlers::terminais::atualizar_terminal,
        handlers::terminais::alterar_status_terminal,
        handlers::terminais::registrar_acesso,

        // --- Pulseiras ---
        handlers::pulseiras::vender_pulseira,
        handlers::pulseiras::listar_pulseiras,
        handlers::pulseiras::buscar_pulseira,
        handlers::pulseiras::alterar_status_pulseira,
        handlers::pulseiras::recarregar_pulseira,
        handlers::pulseiras::extrato_pulseira,

        // --- Vouchers ---
        handlers::vouchers::criar_voucher,
        handlers::vouchers::listar_vouchers,
        handlers::vouchers::alterar_status_voucher,
        handlers::vouchers::validar_voucher,

        // --- Pedidos ---
        handlers::pedidos::criar_pedido,
        handlers::pedidos::listar_pedidos,
        handlers::pedidos::buscar_pedido,
        handlers::pedidos::gerar_pix,
        handlers::pedidos::gerar_boleto,
        handlers::pedidos::listar_transacoes,

        // --- Cancelamentos ---
        handlers::cancelamentos::solicitar_cancelamento,
        handlers::cancelamentos::listar_cancelamentos,
        handlers::cancelamentos::buscar_cancelamento,
        handlers::cancelamentos::aprovar_cancelamento,
        handlers::cancelamentos::rejeitar_cancelamento,

        // --- Pagamentos ---
        handlers::pagamentos::buscar_transacao,
        handlers::pagamentos::consultar_status,
        handlers::webhooks::webhook_pagarme,
        handlers::webhooks::webhook_pagseguro,

        // --- Configurações ---
        handlers::configuracoes::obter_configuracoes,
        handlers::configuracoes::atualizar_configuracoes,

        // --- Relatórios e documentos ---
        handlers::relatorios::resumo,
        handlers::relatorios::vendas_por_dia,
        handlers::documentos::recibo_pedido,
        handlers::documentos::comprovante_cancelamento,
        handlers::documentos::relatorio_vendas,
    ),
    components(
        schemas(
            // --- Clientes ---
            models::clientes::StatusCliente,
            models::clientes::Cliente,
            models::clientes::ClientePayload,

            // --- Produtos ---
            models::produtos::StatusProduto,
            models::produtos::Produto,
            models::produtos::ProdutoPayload,
            models::produtos::AlterarStatusProdutoPayload,
            models::produtos::AjusteEstoquePayload,

            // --- Terminais ---
            models::terminais::StatusTerminal,
            models::terminais::Terminal,
            models::terminais::TerminalPayload,
            models::terminais::AlterarStatusTerminalPayload,

            // --- Pulseiras ---
            models::pulseiras::StatusPulseira,
            models::pulseiras::StatusRecarga,
            models::pulseiras::Pulseira,
            models::pulseiras::VendaPulseira,
            models::pulseiras::RecargaPulseira,
            models::pulseiras::ConsumoPulseira,
            models::pulseiras::ExtratoPulseira,
            models::pulseiras::RecargaCriada,
            models::pulseiras::VenderPulseiraPayload,
            models::pulseiras::RecargaPayload,
            models::pulseiras::AlterarStatusPulseiraPayload,

            // --- Vouchers ---
            models::vouchers::TipoVoucher,
            models::vouchers::StatusVoucher,
            models::vouchers::Voucher,
            models::vouchers::VoucherPayload,
            models::vouchers::AlterarStatusVoucherPayload,
            models::vouchers::ValidarVoucherPayload,
            models::vouchers::VoucherValidado,

            // --- Pedidos ---
            models::pedidos::FormaPagamento,
            models::pedidos::StatusPedido,
            models::pedidos::Pedido,
            models::pedidos::ItemPedido,
            models::pedidos::PedidoDetalhe,
            models::pedidos::ItemPedidoPayload,
            models::pedidos::CriarPedidoPayload,

            // --- Cancelamentos ---
            models::cancelamentos::StatusCancelamento,
            models::cancelamentos::Cancelamento,
            models::cancelamentos::SolicitarCancelamentoPayload,
            models::cancelamentos::DecisaoCancelamentoPayload,

            // --- Pagamentos ---
            models::pagamentos::ProvedorPagamento,
            models::pagamentos::TipoCobranca,
            models::pagamentos::StatusPagamento,
            models::pagamentos::TransacaoPix,
            models::pagamentos::TransacaoPixResposta,

            // --- Configurações ---
            models::configuracoes::ConfiguracoesSistema,
            models::configuracoes::AtualizarConfiguracoesPayload,

            // --- Relatórios ---
            models::relatorios::Periodo,
            models::relatorios::TotalPorForma,
            models::relatorios::VendasDia,
            models::relatorios::ResumoVendas,
        )
    ),
    tags(
        (name = "Clientes", description = "Cadastro de clientes"),
        (name = "Produtos", description = "Catálogo e estoque"),
        (name = "Terminais", description = "Quiosques e heartbeat"),
        (name = "Pulseiras", description = "Venda, saldo, recargas e extrato"),
        (name = "Vouchers", description = "Cupons de desconto"),
        (name = "Pedidos", description = "Vendas no caixa"),
        (name = "Cancelamentos", description = "Solicitação e aprovação de cancelamentos"),
        (name = "Pagamentos", description = "Cobranças PIX/boleto via Pagar.me e PagSeguro"),
        (name = "Webhooks", description = "Notificações dos provedores de pagamento"),
        (name = "Configurações", description = "Dados da empresa e preferências de pagamento"),
        (name = "Relatórios", description = "Indicadores de vendas"),
        (name = "Documentos", description = "Recibos, comprovantes e relatórios em PDF")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documenta_rotas_e_esquema_de_seguranca() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/clientes"));
        assert!(doc.paths.paths.contains_key("/api/pagamentos/{id}/status"));
        assert!(doc.paths.paths.contains_key("/api/webhooks/pagarme"));

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}
