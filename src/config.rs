// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        CancelamentoRepository, ClienteRepository, ConfiguracoesRepository, PagamentoRepository,
        PedidoRepository, ProdutoRepository, PulseiraRepository, RelatorioRepository,
        TerminalRepository, VoucherRepository,
    },
    gateways::{pagarme::PagarmeGateway, pagseguro::PagSeguroGateway, Gateways},
    services::{
        cancelamento_service::CancelamentoService, cliente_service::ClienteService,
        configuracoes_service::ConfiguracoesService, document_service::DocumentService,
        pagamento_service::PagamentoService, pedido_service::PedidoService,
        produto_service::ProdutoService, pulseira_service::PulseiraService,
        relatorio_service::RelatorioService, terminal_service::TerminalService,
        voucher_service::VoucherService,
    },
};

pub const BIND_ADDR_PADRAO: &str = "0.0.0.0:3000";
pub const FONTS_DIR_PADRAO: &str = "./fonts";
pub const PIX_SWEEP_INTERVAL_PADRAO_SECS: u64 = 60;

// Variável vazia conta como ausente
fn env_opcional(nome: &str) -> Option<String> {
    env::var(nome).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Tudo que vem do ambiente (.env em desenvolvimento).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub pagarme_api_key: Option<String>,
    pub pagarme_base_url: Option<String>,
    pub pagseguro_token: Option<String>,
    pub pagseguro_base_url: Option<String>,
    pub pagseguro_notification_url: Option<String>,
    pub webhook_secret: Option<String>,
    pub db_rls_role: Option<String>,
    pub pix_sweep_interval: Duration,
    pub fonts_dir: String,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret =
            env::var("SUPABASE_JWT_SECRET").context("SUPABASE_JWT_SECRET deve ser definido")?;

        let pix_sweep_interval = match env_opcional("PIX_SWEEP_INTERVAL_SECS") {
            Some(v) => v
                .parse::<u64>()
                .context("PIX_SWEEP_INTERVAL_SECS deve ser um número de segundos")?,
            None => PIX_SWEEP_INTERVAL_PADRAO_SECS,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: env_opcional("BIND_ADDR").unwrap_or_else(|| BIND_ADDR_PADRAO.to_string()),
            pagarme_api_key: env_opcional("PAGARME_API_KEY"),
            pagarme_base_url: env_opcional("PAGARME_BASE_URL"),
            pagseguro_token: env_opcional("PAGSEGURO_TOKEN"),
            pagseguro_base_url: env_opcional("PAGSEGURO_BASE_URL"),
            pagseguro_notification_url: env_opcional("PAGSEGURO_NOTIFICATION_URL"),
            webhook_secret: env_opcional("WEBHOOK_SECRET"),
            db_rls_role: env_opcional("DB_RLS_ROLE"),
            pix_sweep_interval: Duration::from_secs(pix_sweep_interval.max(1)),
            fonts_dir: env_opcional("FONTS_DIR").unwrap_or_else(|| FONTS_DIR_PADRAO.to_string()),
        })
    }

    /// Só os provedores com credencial entram. Os outros respondem 503.
    pub fn gateways(&self) -> anyhow::Result<Gateways> {
        let mut gateways = Gateways::default();

        if let Some(api_key) = &self.pagarme_api_key {
            let gateway = PagarmeGateway::new(api_key.clone(), self.pagarme_base_url.clone())?;
            gateways.pagarme = Some(Arc::new(gateway));
            tracing::info!("💳 Pagar.me configurado");
        }

        if let Some(token) = &self.pagseguro_token {
            let gateway = PagSeguroGateway::new(
                token.clone(),
                self.pagseguro_base_url.clone(),
                self.pagseguro_notification_url.clone(),
            )?;
            gateways.pagseguro = Some(Arc::new(gateway));
            tracing::info!("💳 PagSeguro configurado");
        }

        if gateways.pagarme.is_none() && gateways.pagseguro.is_none() {
            tracing::warn!("Nenhum provedor de pagamento configurado: PIX e boleto ficam indisponíveis");
        }

        Ok(gateways)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_secret: String,
    /// Role assumido nas transações RLS (ex.: `authenticated` no Supabase)
    pub rls_role: Option<String>,

    pub cliente_service: ClienteService,
    pub produto_service: ProdutoService,
    pub terminal_service: TerminalService,
    pub pulseira_service: PulseiraService,
    pub voucher_service: VoucherService,
    pub pedido_service: PedidoService,
    pub cancelamento_service: CancelamentoService,
    pub pagamento_service: PagamentoService,
    pub configuracoes_service: ConfiguracoesService,
    pub relatorio_service: RelatorioService,
    pub document_service: DocumentService,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let gateways = settings.gateways()?;

        let mut state = Self::montar(
            db_pool,
            settings.jwt_secret.clone(),
            gateways,
            settings.webhook_secret.clone(),
            settings.fonts_dir.clone(),
        );
        state.rls_role = settings.db_rls_role.clone();
        Ok(state)
    }

    // --- Monta o gráfico de dependências ---
    pub fn montar(
        db_pool: PgPool,
        jwt_secret: String,
        gateways: Gateways,
        webhook_secret: Option<String>,
        fonts_dir: String,
    ) -> Self {
        let pagamento_service = PagamentoService::new(
            PagamentoRepository,
            PedidoRepository,
            PulseiraRepository,
            ClienteRepository,
            ConfiguracoesRepository,
            gateways,
            webhook_secret,
        );
        let voucher_service = VoucherService::new(VoucherRepository);
        let relatorio_service = RelatorioService::new(RelatorioRepository);

        Self {
            cliente_service: ClienteService::new(ClienteRepository),
            produto_service: ProdutoService::new(ProdutoRepository),
            terminal_service: TerminalService::new(TerminalRepository),
            pulseira_service: PulseiraService::new(PulseiraRepository, pagamento_service.clone()),
            pedido_service: PedidoService::new(
                PedidoRepository,
                ProdutoRepository,
                PulseiraRepository,
                voucher_service.clone(),
            ),
            cancelamento_service: CancelamentoService::new(
                CancelamentoRepository,
                PedidoRepository,
                ProdutoRepository,
                PulseiraRepository,
                VoucherRepository,
                PagamentoRepository,
            ),
            configuracoes_service: ConfiguracoesService::new(ConfiguracoesRepository),
            document_service: DocumentService::new(
                PedidoRepository,
                CancelamentoRepository,
                ConfiguracoesRepository,
                PagamentoRepository,
                relatorio_service.clone(),
                fonts_dir,
            ),
            voucher_service,
            relatorio_service,
            pagamento_service,
            db_pool,
            jwt_secret,
            rls_role: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            database_url: "postgres://localhost/pdv".into(),
            jwt_secret: "segredo".into(),
            bind_addr: BIND_ADDR_PADRAO.into(),
            pagarme_api_key: None,
            pagarme_base_url: None,
            pagseguro_token: None,
            pagseguro_base_url: None,
            pagseguro_notification_url: None,
            webhook_secret: None,
            db_rls_role: None,
            pix_sweep_interval: Duration::from_secs(PIX_SWEEP_INTERVAL_PADRAO_SECS),
            fonts_dir: FONTS_DIR_PADRAO.into(),
        }
    }

    #[test]
    fn so_provedores_com_credencial_sao_montados() {
        let gateways = settings().gateways().unwrap();
        assert!(gateways.pagarme.is_none());
        assert!(gateways.pagseguro.is_none());

        let mut com_pagarme = settings();
        com_pagarme.pagarme_api_key = Some("sk_test_123".into());
        let gateways = com_pagarme.gateways().unwrap();
        assert!(gateways.pagarme.is_some());
        assert!(gateways.pagseguro.is_none());
    }
}
