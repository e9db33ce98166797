// src/gateways/pagarme.rs

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    common::error::AppError,
    gateways::{
        erro_do_provedor, BoletoCriado, CobrancaBoleto, CobrancaCriada, CobrancaPix,
        NotificacaoPagamento, Pagador, PaymentGateway,
    },
    models::pagamentos::{ProvedorPagamento, StatusPagamento},
};

pub const PAGARME_BASE_URL: &str = "https://api.pagar.me/core/v5";

// Pagar.me v5: autenticação Basic com a secret key como usuário
#[derive(Clone)]
pub struct PagarmeGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PagarmeGateway {
    pub fn new(api_key: String, base_url: Option<String>) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url
                .unwrap_or_else(|| PAGARME_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key,
        })
    }

    async fn criar_pedido(&self, body: &PedidoRequest<'_>) -> Result<PedidoResponse, AppError> {
        let resp = self
            .client
            .post(format!("{}/orders", self.base_url))
            .basic_auth(&self.api_key, Some(""))
            .json(body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(erro_do_provedor(ProvedorPagamento::Pagarme, resp).await);
        }
        Ok(resp.json::<PedidoResponse>().await?)
    }
}

/// `paid` → pago; cancelamentos e falhas são finais; o resto segue pendente.
pub fn mapear_status(status: &str) -> StatusPagamento {
    match status.to_ascii_lowercase().as_str() {
        "paid" | "overpaid" => StatusPagamento::Pago,
        "canceled" | "voided" | "refunded" | "chargedback" => StatusPagamento::Cancelado,
        "failed" | "not_authorized" => StatusPagamento::Falhou,
        _ => StatusPagamento::Pendente,
    }
}

// --- Payloads da API ---

#[derive(Serialize)]
struct PedidoRequest<'a> {
    code: &'a str,
    items: Vec<ItemRequest<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer: Option<ClienteRequest<'a>>,
    payments: Vec<PagamentoRequest<'a>>,
}

#[derive(Serialize)]
struct ItemRequest<'a> {
    amount: i64,
    description: &'a str,
    quantity: u32,
    code: &'a str,
}

#[derive(Serialize)]
struct ClienteRequest<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    document: Option<&'a str>,
    #[serde(rename = "type")]
    tipo: &'static str,
}

impl<'a> From<&'a Pagador> for ClienteRequest<'a> {
    fn from(p: &'a Pagador) -> Self {
        // CNPJ tem 14 dígitos
        let tipo = match p.documento.as_deref() {
            Some(d) if d.len() == 14 => "company",
            _ => "individual",
        };
        Self {
            name: &p.nome,
            email: p.email.as_deref(),
            document: p.documento.as_deref(),
            tipo,
        }
    }
}

#[derive(Serialize)]
struct PagamentoRequest<'a> {
    payment_method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pix: Option<PixRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    boleto: Option<BoletoRequest<'a>>,
}

#[derive(Serialize)]
struct PixRequest {
    expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct BoletoRequest<'a> {
    instructions: &'a str,
    due_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct PedidoResponse {
    id: String,
    status: String,
    #[serde(default)]
    charges: Vec<CobrancaResponse>,
}

#[derive(Debug, Deserialize)]
struct CobrancaResponse {
    last_transaction: Option<TransacaoResponse>,
}

#[derive(Debug, Deserialize)]
struct TransacaoResponse {
    qr_code: Option<String>,
    qr_code_url: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    line: Option<String>,
    pdf: Option<String>,
    due_at: Option<DateTime<Utc>>,
}

impl PedidoResponse {
    fn ultima_transacao(&self) -> Option<&TransacaoResponse> {
        self.charges.first().and_then(|c| c.last_transaction.as_ref())
    }
}

#[async_trait]
impl PaymentGateway for PagarmeGateway {
    fn provedor(&self) -> ProvedorPagamento {
        ProvedorPagamento::Pagarme
    }

    async fn criar_pix(&self, cobranca: &CobrancaPix) -> Result<CobrancaCriada, AppError> {
        let body = PedidoRequest {
            code: &cobranca.referencia,
            items: vec![ItemRequest {
                amount: cobranca.valor_centavos,
                description: &cobranca.descricao,
                quantity: 1,
                code: &cobranca.referencia,
            }],
            customer: cobranca.pagador.as_ref().map(ClienteRequest::from),
            payments: vec![PagamentoRequest {
                payment_method: "pix",
                pix: Some(PixRequest { expires_at: cobranca.expira_em }),
                boleto: None,
            }],
        };

        let pedido = self.criar_pedido(&body).await?;
        tracing::info!("Pagar.me: pedido {} criado ({})", pedido.id, pedido.status);

        if mapear_status(&pedido.status) == StatusPagamento::Falhou {
            return Err(AppError::ProvedorPagamento(format!(
                "Pagar.me recusou o PIX do pedido {}",
                pedido.id
            )));
        }

        let transacao = pedido.ultima_transacao().ok_or_else(|| {
            AppError::ProvedorPagamento("Pagar.me não retornou a transação PIX".into())
        })?;
        let qr_code = transacao.qr_code.clone().ok_or_else(|| {
            AppError::ProvedorPagamento("Pagar.me não retornou o QR Code".into())
        })?;

        Ok(CobrancaCriada {
            qr_code,
            qr_code_url: transacao.qr_code_url.clone(),
            expira_em: transacao.expires_at.or(Some(cobranca.expira_em)),
            provider_id: pedido.id,
        })
    }

    async fn criar_boleto(&self, cobranca: &CobrancaBoleto) -> Result<BoletoCriado, AppError> {
        let due_at = cobranca
            .vencimento
            .and_hms_opt(23, 59, 59)
            .map(|d| d.and_utc())
            .ok_or_else(|| AppError::RegraNegocio("Data de vencimento inválida".into()))?;

        let body = PedidoRequest {
            code: &cobranca.referencia,
            items: vec![ItemRequest {
                amount: cobranca.valor_centavos,
                description: &cobranca.descricao,
                quantity: 1,
                code: &cobranca.referencia,
            }],
            customer: Some(ClienteRequest::from(&cobranca.pagador)),
            payments: vec![PagamentoRequest {
                payment_method: "boleto",
                pix: None,
                boleto: Some(BoletoRequest {
                    instructions: "Não receber após o vencimento.",
                    due_at,
                }),
            }],
        };

        let pedido = self.criar_pedido(&body).await?;
        tracing::info!("Pagar.me: boleto do pedido {} criado", pedido.id);

        let transacao = pedido.ultima_transacao().ok_or_else(|| {
            AppError::ProvedorPagamento("Pagar.me não retornou a transação do boleto".into())
        })?;
        let linha_digitavel = transacao.line.clone().ok_or_else(|| {
            AppError::ProvedorPagamento("Pagar.me não retornou a linha digitável".into())
        })?;

        Ok(BoletoCriado {
            linha_digitavel,
            boleto_url: transacao.pdf.clone(),
            vencimento: transacao.due_at.or(Some(due_at)),
            provider_id: pedido.id,
        })
    }

    async fn consultar(&self, provider_id: &str) -> Result<StatusPagamento, AppError> {
        let resp = self
            .client
            .get(format!("{}/orders/{}", self.base_url, provider_id))
            .basic_auth(&self.api_key, Some(""))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(erro_do_provedor(ProvedorPagamento::Pagarme, resp).await);
        }

        let pedido = resp.json::<PedidoResponse>().await?;
        Ok(mapear_status(&pedido.status))
    }

    // { "type": "order.paid", "data": { "id": "or_...", "status": "paid" } }
    // { "type": "charge.paid", "data": { "status": "paid", "order": { "id": "or_..." } } }
    fn interpretar_webhook(&self, body: &Value) -> Option<NotificacaoPagamento> {
        let tipo = body.get("type")?.as_str()?;
        let data = body.get("data")?;

        let provider_id = if tipo.starts_with("order.") {
            data.get("id")?.as_str()?
        } else if tipo.starts_with("charge.") {
            data.get("order")?.get("id")?.as_str()?
        } else {
            return None;
        };

        let status = data.get("status")?.as_str()?;
        Some(NotificacaoPagamento {
            provider_id: provider_id.to_string(),
            status: mapear_status(status),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cobranca() -> CobrancaPix {
        CobrancaPix {
            referencia: "pedido-1024".into(),
            descricao: "Pedido #1024".into(),
            valor_centavos: 4050,
            expira_em: Utc::now() + chrono::Duration::minutes(30),
            pagador: Some(Pagador {
                nome: "Maria".into(),
                documento: Some("12345678900".into()),
                email: Some("maria@email.com".into()),
            }),
        }
    }

    #[test]
    fn mapeia_status_do_pagarme() {
        assert_eq!(mapear_status("paid"), StatusPagamento::Pago);
        assert_eq!(mapear_status("PAID"), StatusPagamento::Pago);
        assert_eq!(mapear_status("canceled"), StatusPagamento::Cancelado);
        assert_eq!(mapear_status("failed"), StatusPagamento::Falhou);
        assert_eq!(mapear_status("pending"), StatusPagamento::Pendente);
        assert_eq!(mapear_status("processing"), StatusPagamento::Pendente);
    }

    #[tokio::test]
    async fn cria_pix_e_le_qr_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "or_abc",
                "status": "pending",
                "charges": [{
                    "id": "ch_1",
                    "status": "pending",
                    "last_transaction": {
                        "qr_code": "00020101021226",
                        "qr_code_url": "https://api.pagar.me/qr/or_abc.png",
                        "expires_at": "2030-01-01T12:00:00Z"
                    }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = PagarmeGateway::new("sk_test".into(), Some(server.uri())).unwrap();
        let criada = gateway.criar_pix(&cobranca()).await.unwrap();

        assert_eq!(criada.provider_id, "or_abc");
        assert_eq!(criada.qr_code, "00020101021226");
        assert_eq!(
            criada.expira_em.unwrap().to_rfc3339(),
            "2030-01-01T12:00:00+00:00"
        );
    }

    #[tokio::test]
    async fn erro_http_vira_erro_do_provedor() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders"))
            .respond_with(ResponseTemplate::new(422).set_body_string("customer.document inválido"))
            .mount(&server)
            .await;

        let gateway = PagarmeGateway::new("sk_test".into(), Some(server.uri())).unwrap();
        let err = gateway.criar_pix(&cobranca()).await.unwrap_err();
        assert!(matches!(err, AppError::ProvedorPagamento(msg) if msg.contains("422")));
    }

    #[tokio::test]
    async fn consulta_status_do_pedido() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orders/or_abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "or_abc",
                "status": "paid",
                "charges": []
            })))
            .mount(&server)
            .await;

        let gateway = PagarmeGateway::new("sk_test".into(), Some(server.uri())).unwrap();
        assert_eq!(gateway.consultar("or_abc").await.unwrap(), StatusPagamento::Pago);
    }

    #[test]
    fn interpreta_webhooks_de_pedido_e_de_cobranca() {
        let gateway = PagarmeGateway::new("sk_test".into(), None).unwrap();

        let pedido = json!({ "type": "order.paid", "data": { "id": "or_abc", "status": "paid" } });
        assert_eq!(
            gateway.interpretar_webhook(&pedido),
            Some(NotificacaoPagamento { provider_id: "or_abc".into(), status: StatusPagamento::Pago })
        );

        let cobranca = json!({
            "type": "charge.payment_failed",
            "data": { "id": "ch_1", "status": "failed", "order": { "id": "or_abc" } }
        });
        assert_eq!(
            gateway.interpretar_webhook(&cobranca).map(|n| n.status),
            Some(StatusPagamento::Falhou)
        );

        let outro = json!({ "type": "customer.created", "data": { "id": "cus_1" } });
        assert_eq!(gateway.interpretar_webhook(&outro), None);
    }
}
