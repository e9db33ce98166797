// src/gateways.rs

//! Integração com os provedores de pagamento (PIX e boleto).
//!
//! Cada provedor implementa [`PaymentGateway`]. O service só conhece a trait;
//! quem escolhe o provedor é a configuração do sistema ou o payload.

pub mod pagarme;
pub mod pagseguro;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;

use crate::{
    common::error::AppError,
    models::pagamentos::{ProvedorPagamento, StatusPagamento},
};

pub use pagarme::PagarmeGateway;
pub use pagseguro::PagSeguroGateway;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone)]
pub struct Pagador {
    pub nome: String,
    pub documento: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CobrancaPix {
    /// Nosso identificador (vai como `code`/`reference_id`)
    pub referencia: String,
    pub descricao: String,
    pub valor_centavos: i64,
    pub expira_em: DateTime<Utc>,
    pub pagador: Option<Pagador>,
}

#[derive(Debug, Clone)]
pub struct CobrancaCriada {
    pub provider_id: String,
    pub qr_code: String,
    pub qr_code_url: Option<String>,
    pub expira_em: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct CobrancaBoleto {
    pub referencia: String,
    pub descricao: String,
    pub valor_centavos: i64,
    pub vencimento: NaiveDate,
    pub pagador: Pagador,
}

#[derive(Debug, Clone)]
pub struct BoletoCriado {
    pub provider_id: String,
    pub linha_digitavel: String,
    pub boleto_url: Option<String>,
    pub vencimento: Option<DateTime<Utc>>,
}

/// O que um webhook nos diz: qual cobrança e em que status ela está.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificacaoPagamento {
    pub provider_id: String,
    pub status: StatusPagamento,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn provedor(&self) -> ProvedorPagamento;

    async fn criar_pix(&self, cobranca: &CobrancaPix) -> Result<CobrancaCriada, AppError>;

    async fn consultar(&self, provider_id: &str) -> Result<StatusPagamento, AppError>;

    async fn criar_boleto(&self, _cobranca: &CobrancaBoleto) -> Result<BoletoCriado, AppError> {
        Err(AppError::NaoSuportado(format!(
            "boleto via {}",
            self.provedor().as_str()
        )))
    }

    /// Lê o corpo do webhook. `None` quando o evento não interessa.
    fn interpretar_webhook(&self, body: &Value) -> Option<NotificacaoPagamento>;
}

// Provedores configurados via env; ausente = não habilitado
#[derive(Clone, Default)]
pub struct Gateways {
    pub pagarme: Option<Arc<dyn PaymentGateway>>,
    pub pagseguro: Option<Arc<dyn PaymentGateway>>,
}

impl Gateways {
    pub fn get(&self, provedor: ProvedorPagamento) -> Result<Arc<dyn PaymentGateway>, AppError> {
        let gateway = match provedor {
            ProvedorPagamento::Pagarme => self.pagarme.clone(),
            ProvedorPagamento::Pagseguro => self.pagseguro.clone(),
        };
        gateway.ok_or_else(|| AppError::GatewayNaoConfigurado(provedor.as_str().to_string()))
    }
}

/// Confere `x-hub-signature` (HMAC-SHA256 em hex, com ou sem prefixo `sha256=`).
pub fn verificar_assinatura(secret: &str, body: &[u8], assinatura: Option<&str>) -> bool {
    let Some(assinatura) = assinatura else {
        return false;
    };
    let hex_sig = assinatura.trim().strip_prefix("sha256=").unwrap_or(assinatura.trim());
    let Ok(esperada) = hex::decode(hex_sig) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&esperada).is_ok()
}

/// Converte a resposta não-2xx do provedor em erro, guardando o corpo para o log.
pub(crate) async fn erro_do_provedor(provedor: ProvedorPagamento, resp: reqwest::Response) -> AppError {
    let status = resp.status();
    let corpo = resp.text().await.unwrap_or_default();
    AppError::ProvedorPagamento(format!("{} respondeu {}: {}", provedor.as_str(), status, corpo))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assinar(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn aceita_assinatura_com_e_sem_prefixo() {
        let body = br#"{"type":"order.paid"}"#;
        let sig = assinar("s3gredo", body);
        assert!(verificar_assinatura("s3gredo", body, Some(&sig)));
        assert!(verificar_assinatura("s3gredo", body, Some(&format!("sha256={}", sig))));
    }

    #[test]
    fn rejeita_assinatura_ausente_ou_adulterada() {
        let body = br#"{"type":"order.paid"}"#;
        let sig = assinar("s3gredo", body);
        assert!(!verificar_assinatura("s3gredo", body, None));
        assert!(!verificar_assinatura("outro", body, Some(&sig)));
        assert!(!verificar_assinatura("s3gredo", br#"{"type":"order.canceled"}"#, Some(&sig)));
        assert!(!verificar_assinatura("s3gredo", body, Some("nao-e-hex")));
    }

    #[test]
    fn gateway_nao_configurado() {
        let gateways = Gateways::default();
        assert!(matches!(
            gateways.get(ProvedorPagamento::Pagseguro),
            Err(AppError::GatewayNaoConfigurado(p)) if p == "pagseguro"
        ));
    }
}
