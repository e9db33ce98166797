// src/db/voucher_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::vouchers::{StatusVoucher, Voucher, VoucherPayload},
};

#[derive(Clone, Default)]
pub struct VoucherRepository;

impl VoucherRepository {
    pub async fn criar<'e, E>(&self, executor: E, codigo: &str, input: &VoucherPayload) -> Result<Voucher, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Voucher>(
            r#"
            INSERT INTO vouchers (codigo, descricao, tipo, valor, validade, usos_maximos)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(codigo)
        .bind(&input.descricao)
        .bind(input.tipo)
        .bind(input.valor)
        .bind(input.validade)
        .bind(input.usos_maximos)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, "Já existe um voucher com este código."))
    }

    pub async fn listar<'e, E>(&self, executor: E) -> Result<Vec<Voucher>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let vouchers = sqlx::query_as::<_, Voucher>("SELECT * FROM vouchers ORDER BY created_at DESC")
            .fetch_all(executor)
            .await?;

        Ok(vouchers)
    }

    pub async fn buscar_por_codigo<'e, E>(&self, executor: E, codigo: &str) -> Result<Option<Voucher>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let voucher = sqlx::query_as::<_, Voucher>("SELECT * FROM vouchers WHERE codigo = $1")
            .bind(codigo)
            .fetch_optional(executor)
            .await?;

        Ok(voucher)
    }

    pub async fn buscar_por_codigo_para_atualizar<'e, E>(
        &self,
        executor: E,
        codigo: &str,
    ) -> Result<Option<Voucher>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let voucher = sqlx::query_as::<_, Voucher>(
            "SELECT * FROM vouchers WHERE codigo = $1 FOR UPDATE",
        )
        .bind(codigo)
        .fetch_optional(executor)
        .await?;

        Ok(voucher)
    }

    pub async fn alterar_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: StatusVoucher,
    ) -> Result<Option<Voucher>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let voucher = sqlx::query_as::<_, Voucher>(
            "UPDATE vouchers SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await?;

        Ok(voucher)
    }

    // Conta um uso e marca como esgotado quando chega no limite
    pub async fn registrar_uso<'e, E>(&self, executor: E, id: Uuid) -> Result<Voucher, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let voucher = sqlx::query_as::<_, Voucher>(
            r#"
            UPDATE vouchers
            SET usos = usos + 1,
                status = CASE WHEN usos + 1 >= usos_maximos THEN 'esgotado'::status_voucher ELSE status END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_one(executor)
        .await?;

        Ok(voucher)
    }

    // Devolve o uso quando o pedido é cancelado
    pub async fn estornar_uso<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE vouchers
            SET usos = GREATEST(usos - 1, 0),
                status = CASE WHEN status = 'esgotado' THEN 'ativo'::status_voucher ELSE status END,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(executor)
        .await?;

        Ok(())
    }
}
