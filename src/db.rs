pub mod cancelamento_repo;
pub use cancelamento_repo::CancelamentoRepository;
pub mod cliente_repo;
pub use cliente_repo::ClienteRepository;
pub mod configuracoes_repo;
pub use configuracoes_repo::ConfiguracoesRepository;
pub mod pagamento_repo;
pub use pagamento_repo::PagamentoRepository;
pub mod pedido_repo;
pub use pedido_repo::PedidoRepository;
pub mod produto_repo;
pub use produto_repo::ProdutoRepository;
pub mod pulseira_repo;
pub use pulseira_repo::PulseiraRepository;
pub mod relatorio_repo;
pub use relatorio_repo::RelatorioRepository;
pub mod terminal_repo;
pub use terminal_repo::TerminalRepository;
pub mod voucher_repo;
pub use voucher_repo::VoucherRepository;
