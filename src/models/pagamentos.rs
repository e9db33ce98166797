// src/models/pagamentos.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// --- Enums (mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "provedor_pagamento", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProvedorPagamento {
    Pagarme,
    Pagseguro,
}

impl ProvedorPagamento {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProvedorPagamento::Pagarme => "pagarme",
            ProvedorPagamento::Pagseguro => "pagseguro",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_cobranca", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TipoCobranca {
    Pix,
    Boleto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_pagamento", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StatusPagamento {
    Pendente,
    Pago,
    Cancelado,
    Expirado,
    Falhou,
}

/// Dias depois do vencimento em que um boleto ainda pode ser compensado.
pub const BOLETO_DIAS_COMPENSACAO: i64 = 3;

impl StatusPagamento {
    /// Fora de `pendente`. Daqui só sai um pagamento confirmado depois.
    pub fn is_final(&self) -> bool {
        !matches!(self, StatusPagamento::Pendente)
    }
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransacaoPix {
    pub id: Uuid,
    pub pedido_id: Option<Uuid>,
    pub recarga_id: Option<Uuid>,
    pub provedor: ProvedorPagamento,
    /// Id opaco da cobrança no provedor
    #[schema(example = "or_56GXnk6T0eU88qMm")]
    pub provider_id: String,
    pub tipo: TipoCobranca,
    #[schema(example = "40.00")]
    pub valor: Decimal,
    /// Payload "copia e cola"
    pub qr_code: Option<String>,
    pub qr_code_url: Option<String>,
    pub linha_digitavel: Option<String>,
    pub boleto_url: Option<String>,
    pub status: StatusPagamento,
    pub expira_em: Option<DateTime<Utc>>,
    pub pago_em: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Segundos até a expiração, saturando em zero. `None` quando não expira.
pub fn segundos_restantes(expira_em: Option<DateTime<Utc>>, agora: DateTime<Utc>) -> Option<i64> {
    expira_em.map(|limite| (limite - agora).num_seconds().max(0))
}

impl TransacaoPix {
    /// Limite a partir do qual a cobrança pendente pode ser expirada.
    /// Boleto ganha os dias de compensação bancária depois do vencimento.
    pub fn prazo_final(&self) -> Option<DateTime<Utc>> {
        self.expira_em.map(|limite| match self.tipo {
            TipoCobranca::Pix => limite,
            TipoCobranca::Boleto => limite + chrono::Duration::days(BOLETO_DIAS_COMPENSACAO),
        })
    }

    /// Pendente com o prazo vencido: o contador chegou a zero.
    pub fn venceu(&self, agora: DateTime<Utc>) -> bool {
        self.status == StatusPagamento::Pendente
            && self.prazo_final().is_some_and(|limite| limite <= agora)
    }

    pub fn com_contador(self, agora: DateTime<Utc>) -> TransacaoPixResposta {
        let expirado = self.status == StatusPagamento::Expirado || self.venceu(agora);
        let segundos = if self.status.is_final() && self.status != StatusPagamento::Expirado {
            None
        } else {
            segundos_restantes(self.expira_em, agora)
        };

        TransacaoPixResposta {
            transacao: self,
            segundos_restantes: segundos,
            expirado,
        }
    }
}

// O que o front usa para desenhar o contador regressivo
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransacaoPixResposta {
    #[serde(flatten)]
    pub transacao: TransacaoPix,
    pub segundos_restantes: Option<i64>,
    pub expirado: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GerarCobrancaQuery {
    /// PIX: quando ausente usa o provedor das configurações do sistema.
    /// Boleto: quando ausente usa o Pagar.me
    pub provedor: Option<ProvedorPagamento>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn transacao(status: StatusPagamento, expira_em: Option<DateTime<Utc>>) -> TransacaoPix {
        let agora = Utc::now();
        TransacaoPix {
            id: Uuid::new_v4(),
            pedido_id: Some(Uuid::new_v4()),
            recarga_id: None,
            provedor: ProvedorPagamento::Pagarme,
            provider_id: "or_123".into(),
            tipo: TipoCobranca::Pix,
            valor: dec!(25.00),
            qr_code: Some("000201...".into()),
            qr_code_url: None,
            linha_digitavel: None,
            boleto_url: None,
            status,
            expira_em,
            pago_em: None,
            created_at: agora,
            updated_at: agora,
        }
    }

    #[test]
    fn contador_satura_em_zero() {
        let agora = Utc::now();
        assert_eq!(segundos_restantes(Some(agora + Duration::seconds(90)), agora), Some(90));
        assert_eq!(segundos_restantes(Some(agora - Duration::seconds(5)), agora), Some(0));
        assert_eq!(segundos_restantes(None, agora), None);
    }

    #[test]
    fn vira_expirado_exatamente_no_limite() {
        let agora = Utc::now();
        let t = transacao(StatusPagamento::Pendente, Some(agora));
        assert!(t.venceu(agora));
        assert!(!t.venceu(agora - Duration::seconds(1)));

        let resposta = t.com_contador(agora);
        assert!(resposta.expirado);
        assert_eq!(resposta.segundos_restantes, Some(0));
    }

    #[test]
    fn transacao_paga_nao_expira() {
        let agora = Utc::now();
        let t = transacao(StatusPagamento::Pago, Some(agora - Duration::minutes(10)));
        assert!(!t.venceu(agora));

        let resposta = t.com_contador(agora);
        assert!(!resposta.expirado);
        assert_eq!(resposta.segundos_restantes, None);
    }

    #[test]
    fn boleto_vencido_ainda_aguarda_compensacao() {
        let agora = Utc::now();
        let mut boleto = transacao(StatusPagamento::Pendente, Some(agora - Duration::days(1)));
        boleto.tipo = TipoCobranca::Boleto;
        assert!(!boleto.venceu(agora));
        assert!(!boleto.clone().com_contador(agora).expirado);

        boleto.expira_em = Some(agora - Duration::days(BOLETO_DIAS_COMPENSACAO));
        assert!(boleto.venceu(agora));
    }

    #[test]
    fn json_traz_contador_junto_da_transacao() {
        let agora = Utc::now();
        let t = transacao(StatusPagamento::Pendente, Some(agora + Duration::seconds(30)));
        let json = serde_json::to_value(t.com_contador(agora)).unwrap();
        assert_eq!(json["status"], "pendente");
        assert_eq!(json["segundosRestantes"], 30);
        assert_eq!(json["expirado"], false);
        assert!(json["providerId"].is_string());
    }
}
