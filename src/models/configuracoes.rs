// src/models/configuracoes.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::pagamentos::ProvedorPagamento;

pub const PIX_EXPIRACAO_PADRAO_MINUTOS: i32 = 30;
pub const BOLETO_VENCIMENTO_PADRAO_DIAS: i32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfiguracoesSistema {
    #[schema(example = "Parque das Águas Ltda")]
    pub nome_empresa: Option<String>,

    #[schema(example = "12.345.678/0001-99")]
    pub cnpj: Option<String>,

    #[schema(example = "Rua das Flores, 123 - Centro")]
    pub endereco: Option<String>,

    #[schema(example = "(11) 99999-8888")]
    pub telefone: Option<String>,

    #[schema(example = "12.345.678/0001-99")]
    pub chave_pix: Option<String>,

    pub provedor_pix: ProvedorPagamento,

    #[schema(example = 30)]
    pub pix_expiracao_minutos: i32,

    #[schema(example = 3)]
    pub boleto_dias_vencimento: i32,

    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for ConfiguracoesSistema {
    fn default() -> Self {
        Self {
            nome_empresa: None,
            cnpj: None,
            endereco: None,
            telefone: None,
            chave_pix: None,
            provedor_pix: ProvedorPagamento::Pagarme,
            pix_expiracao_minutos: PIX_EXPIRACAO_PADRAO_MINUTOS,
            boleto_dias_vencimento: BOLETO_VENCIMENTO_PADRAO_DIAS,
            updated_at: None,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AtualizarConfiguracoesPayload {
    pub nome_empresa: Option<String>,
    pub cnpj: Option<String>,
    pub endereco: Option<String>,
    pub telefone: Option<String>,
    pub chave_pix: Option<String>,
    pub provedor_pix: Option<ProvedorPagamento>,

    #[validate(range(min = 1, max = 1440, message = "Expiração entre 1 minuto e 24 horas."))]
    pub pix_expiracao_minutos: Option<i32>,

    #[validate(range(min = 1, max = 60, message = "Vencimento entre 1 e 60 dias."))]
    pub boleto_dias_vencimento: Option<i32>,
}
