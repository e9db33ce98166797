use sqlx::{Executor, Postgres};

use crate::{
    common::error::AppError,
    models::configuracoes::{AtualizarConfiguracoesPayload, ConfiguracoesSistema},
};

const COLUNAS: &str = "nome_empresa, cnpj, endereco, telefone, chave_pix, provedor_pix, \
                       pix_expiracao_minutos, boleto_dias_vencimento, updated_at";

#[derive(Clone, Default)]
pub struct ConfiguracoesRepository;

impl ConfiguracoesRepository {
    // Linha única. Se ainda não foi gravada, valem os padrões.
    pub async fn obter<'e, E>(&self, executor: E) -> Result<ConfiguracoesSistema, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let configuracoes = sqlx::query_as::<_, ConfiguracoesSistema>(&format!(
            "SELECT {} FROM configuracoes_sistema WHERE id",
            COLUNAS
        ))
        .fetch_optional(executor)
        .await?;

        Ok(configuracoes.unwrap_or_default())
    }

    // UPSERT; campo ausente no payload mantém o valor atual
    pub async fn atualizar<'e, E>(
        &self,
        executor: E,
        input: &AtualizarConfiguracoesPayload,
    ) -> Result<ConfiguracoesSistema, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let configuracoes = sqlx::query_as::<_, ConfiguracoesSistema>(&format!(
            r#"
            INSERT INTO configuracoes_sistema (
                id, nome_empresa, cnpj, endereco, telefone, chave_pix, provedor_pix,
                pix_expiracao_minutos, boleto_dias_vencimento, updated_at
            )
            VALUES (
                TRUE, $1, $2, $3, $4, $5, COALESCE($6, 'pagarme'::provedor_pagamento),
                COALESCE($7, 30), COALESCE($8, 3), NOW()
            )
            ON CONFLICT (id) DO UPDATE SET
                nome_empresa = COALESCE(EXCLUDED.nome_empresa, configuracoes_sistema.nome_empresa),
                cnpj = COALESCE(EXCLUDED.cnpj, configuracoes_sistema.cnpj),
                endereco = COALESCE(EXCLUDED.endereco, configuracoes_sistema.endereco),
                telefone = COALESCE(EXCLUDED.telefone, configuracoes_sistema.telefone),
                chave_pix = COALESCE(EXCLUDED.chave_pix, configuracoes_sistema.chave_pix),
                provedor_pix = COALESCE($6, configuracoes_sistema.provedor_pix),
                pix_expiracao_minutos = COALESCE($7, configuracoes_sistema.pix_expiracao_minutos),
                boleto_dias_vencimento = COALESCE($8, configuracoes_sistema.boleto_dias_vencimento),
                updated_at = NOW()
            RETURNING {}
            "#,
            COLUNAS
        ))
        .bind(&input.nome_empresa)
        .bind(&input.cnpj)
        .bind(&input.endereco)
        .bind(&input.telefone)
        .bind(&input.chave_pix)
        .bind(input.provedor_pix)
        .bind(input.pix_expiracao_minutos)
        .bind(input.boleto_dias_vencimento)
        .fetch_one(executor)
        .await?;

        Ok(configuracoes)
    }
}
