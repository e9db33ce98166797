// src/gateways/pagseguro.rs

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    common::error::AppError,
    gateways::{erro_do_provedor, CobrancaCriada, CobrancaPix, NotificacaoPagamento, PaymentGateway},
    models::pagamentos::{ProvedorPagamento, StatusPagamento},
};

pub const PAGSEGURO_BASE_URL: &str = "https://api.pagseguro.com";

#[derive(Clone)]
pub struct PagSeguroGateway {
    client: reqwest::Client,
    base_url: String,
    token: String,
    notification_url: Option<String>,
}

impl PagSeguroGateway {
    pub fn new(
        token: String,
        base_url: Option<String>,
        notification_url: Option<String>,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url
                .unwrap_or_else(|| PAGSEGURO_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            token,
            notification_url,
        })
    }
}

pub fn mapear_status(status: &str) -> StatusPagamento {
    match status.to_ascii_uppercase().as_str() {
        "PAID" => StatusPagamento::Pago,
        "CANCELED" => StatusPagamento::Cancelado,
        "DECLINED" => StatusPagamento::Falhou,
        _ => StatusPagamento::Pendente,
    }
}

// Pedido sem cobrança ainda não foi pago
fn status_do_pedido(pedido: &PedidoResponse) -> StatusPagamento {
    pedido
        .charges
        .first()
        .map(|c| mapear_status(&c.status))
        .unwrap_or(StatusPagamento::Pendente)
}

#[derive(Serialize)]
struct PedidoRequest<'a> {
    reference_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer: Option<ClienteRequest<'a>>,
    items: Vec<ItemRequest<'a>>,
    qr_codes: Vec<QrCodeRequest>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notification_urls: Vec<&'a str>,
}

#[derive(Serialize)]
struct ClienteRequest<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tax_id: Option<&'a str>,
}

#[derive(Serialize)]
struct ItemRequest<'a> {
    name: &'a str,
    quantity: u32,
    unit_amount: i64,
}

#[derive(Serialize)]
struct QrCodeRequest {
    amount: Valor,
    // A API espera o horário com offset explícito
    expiration_date: DateTime<FixedOffset>,
}

#[derive(Serialize)]
struct Valor {
    value: i64,
}

#[derive(Debug, Deserialize)]
struct PedidoResponse {
    id: String,
    #[serde(default)]
    qr_codes: Vec<QrCodeResponse>,
    #[serde(default)]
    charges: Vec<CobrancaResponse>,
}

#[derive(Debug, Deserialize)]
struct QrCodeResponse {
    text: String,
    expiration_date: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    links: Vec<LinkResponse>,
}

#[derive(Debug, Deserialize)]
struct LinkResponse {
    rel: String,
    href: String,
}

#[derive(Debug, Deserialize)]
struct CobrancaResponse {
    status: String,
}

#[async_trait]
impl PaymentGateway for PagSeguroGateway {
    fn provedor(&self) -> ProvedorPagamento {
        ProvedorPagamento::Pagseguro
    }

    async fn criar_pix(&self, cobranca: &CobrancaPix) -> Result<CobrancaCriada, AppError> {
        let body = PedidoRequest {
            reference_id: &cobranca.referencia,
            customer: cobranca.pagador.as_ref().map(|p| ClienteRequest {
                name: &p.nome,
                email: p.email.as_deref(),
                tax_id: p.documento.as_deref(),
            }),
            items: vec![ItemRequest {
                name: &cobranca.descricao,
                quantity: 1,
                unit_amount: cobranca.valor_centavos,
            }],
            qr_codes: vec![QrCodeRequest {
                amount: Valor { value: cobranca.valor_centavos },
                expiration_date: cobranca.expira_em.fixed_offset(),
            }],
            notification_urls: self.notification_url.as_deref().into_iter().collect(),
        };

        let resp = self
            .client
            .post(format!("{}/orders", self.base_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(erro_do_provedor(ProvedorPagamento::Pagseguro, resp).await);
        }

        let pedido = resp.json::<PedidoResponse>().await?;
        tracing::info!("PagSeguro: pedido {} criado", pedido.id);

        let qr = pedido.qr_codes.first().ok_or_else(|| {
            AppError::ProvedorPagamento("PagSeguro não retornou o QR Code".into())
        })?;
        let qr_code_url = qr
            .links
            .iter()
            .find(|l| l.rel.eq_ignore_ascii_case("QRCODE.PNG"))
            .map(|l| l.href.clone());

        Ok(CobrancaCriada {
            qr_code: qr.text.clone(),
            qr_code_url,
            expira_em: qr
                .expiration_date
                .map(|d| d.with_timezone(&Utc))
                .or(Some(cobranca.expira_em)),
            provider_id: pedido.id.clone(),
        })
    }

    async fn consultar(&self, provider_id: &str) -> Result<StatusPagamento, AppError> {
        let resp = self
            .client
            .get(format!("{}/orders/{}", self.base_url, provider_id))
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(erro_do_provedor(ProvedorPagamento::Pagseguro, resp).await);
        }

        let pedido = resp.json::<PedidoResponse>().await?;
        Ok(status_do_pedido(&pedido))
    }

    // A notificação traz o pedido inteiro, com as cobranças
    fn interpretar_webhook(&self, body: &Value) -> Option<NotificacaoPagamento> {
        let pedido: PedidoResponse = serde_json::from_value(body.clone()).ok()?;
        if pedido.charges.is_empty() {
            return None;
        }
        Some(NotificacaoPagamento {
            status: status_do_pedido(&pedido),
            provider_id: pedido.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateways::CobrancaBoleto;
    use crate::gateways::Pagador;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cobranca() -> CobrancaPix {
        CobrancaPix {
            referencia: "recarga-7".into(),
            descricao: "Recarga de pulseira".into(),
            valor_centavos: 5000,
            expira_em: Utc::now() + chrono::Duration::minutes(30),
            pagador: None,
        }
    }

    #[test]
    fn mapeia_status_do_pagseguro() {
        assert_eq!(mapear_status("PAID"), StatusPagamento::Pago);
        assert_eq!(mapear_status("CANCELED"), StatusPagamento::Cancelado);
        assert_eq!(mapear_status("DECLINED"), StatusPagamento::Falhou);
        assert_eq!(mapear_status("WAITING"), StatusPagamento::Pendente);
        assert_eq!(mapear_status("IN_ANALYSIS"), StatusPagamento::Pendente);
    }

    #[tokio::test]
    async fn cria_pix_com_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders"))
            .and(header("authorization", "Bearer tok_123"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "ORDE_ABC",
                "reference_id": "recarga-7",
                "qr_codes": [{
                    "id": "QRCO_1",
                    "text": "00020126580014br.gov.bcb.pix",
                    "expiration_date": "2030-01-01T09:00:00-03:00",
                    "links": [
                        { "rel": "QRCODE.PNG", "href": "https://api.pagseguro.com/qrcode/QRCO_1/png" },
                        { "rel": "QRCODE.BASE64", "href": "https://api.pagseguro.com/qrcode/QRCO_1/base64" }
                    ]
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = PagSeguroGateway::new("tok_123".into(), Some(server.uri()), None).unwrap();
        let criada = gateway.criar_pix(&cobranca()).await.unwrap();

        assert_eq!(criada.provider_id, "ORDE_ABC");
        assert_eq!(criada.qr_code, "00020126580014br.gov.bcb.pix");
        assert_eq!(
            criada.qr_code_url.as_deref(),
            Some("https://api.pagseguro.com/qrcode/QRCO_1/png")
        );
        assert_eq!(
            criada.expira_em.unwrap().to_rfc3339(),
            "2030-01-01T12:00:00+00:00"
        );
    }

    #[tokio::test]
    async fn consulta_sem_cobranca_fica_pendente() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orders/ORDE_ABC"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "ORDE_ABC",
                "qr_codes": []
            })))
            .mount(&server)
            .await;

        let gateway = PagSeguroGateway::new("tok_123".into(), Some(server.uri()), None).unwrap();
        assert_eq!(
            gateway.consultar("ORDE_ABC").await.unwrap(),
            StatusPagamento::Pendente
        );
    }

    #[tokio::test]
    async fn boleto_nao_suportado() {
        let gateway = PagSeguroGateway::new("tok_123".into(), None, None).unwrap();
        let boleto = CobrancaBoleto {
            referencia: "pedido-1".into(),
            descricao: "Pedido #1".into(),
            valor_centavos: 1000,
            vencimento: chrono::NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            pagador: Pagador { nome: "João".into(), documento: None, email: None },
        };
        assert!(matches!(
            gateway.criar_boleto(&boleto).await,
            Err(AppError::NaoSuportado(_))
        ));
    }

    #[test]
    fn interpreta_notificacao_paga() {
        let gateway = PagSeguroGateway::new("tok_123".into(), None, None).unwrap();
        let body = json!({
            "id": "ORDE_ABC",
            "charges": [{ "id": "CHAR_1", "status": "PAID" }]
        });
        assert_eq!(
            gateway.interpretar_webhook(&body),
            Some(NotificacaoPagamento {
                provider_id: "ORDE_ABC".into(),
                status: StatusPagamento::Pago
            })
        );
        assert_eq!(gateway.interpretar_webhook(&json!({ "id": "ORDE_ABC" })), None);
    }
}
