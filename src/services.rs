pub mod cancelamento_service;
pub mod cliente_service;
pub mod configuracoes_service;
pub mod document_service;
pub mod pagamento_service;
pub mod pedido_service;
pub mod produto_service;
pub mod pulseira_service;
pub mod relatorio_service;
pub mod terminal_service;
pub mod voucher_service;
