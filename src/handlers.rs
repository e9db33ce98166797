pub mod cancelamentos;
pub mod clientes;
pub mod configuracoes;
pub mod documentos;
pub mod pagamentos;
pub mod pedidos;
pub mod produtos;
pub mod pulseiras;
pub mod relatorios;
pub mod terminais;
pub mod vouchers;
pub mod webhooks;
