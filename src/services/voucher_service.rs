// src/services/voucher_service.rs

use chrono::{NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::{Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::VoucherRepository,
    models::vouchers::{
        StatusVoucher, TipoVoucher, Voucher, VoucherPayload, VoucherValidado,
    },
};

/// Desconto de um voucher sobre o subtotal.
/// Percentual é limitado a 100%; valor fixo nunca passa do subtotal.
pub fn calcular_desconto(tipo: TipoVoucher, valor: Decimal, subtotal: Decimal) -> Decimal {
    if subtotal <= Decimal::ZERO || valor <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    match tipo {
        TipoVoucher::Percentual => {
            let percentual = valor.min(Decimal::ONE_HUNDRED);
            (subtotal * percentual / Decimal::ONE_HUNDRED)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        }
        TipoVoucher::Valor => valor.min(subtotal),
    }
}

/// Confere se o voucher ainda pode ser usado na data informada.
pub fn verificar_disponibilidade(voucher: &Voucher, hoje: NaiveDate) -> Result<(), AppError> {
    match voucher.status {
        StatusVoucher::Inativo => return Err(AppError::VoucherInvalido("inativo".into())),
        StatusVoucher::Esgotado => return Err(AppError::VoucherInvalido("esgotado".into())),
        StatusVoucher::Ativo => {}
    }

    if voucher.usos >= voucher.usos_maximos {
        return Err(AppError::VoucherInvalido("esgotado".into()));
    }

    // Vale até o fim do dia da validade
    if voucher.validade.is_some_and(|validade| validade < hoje) {
        return Err(AppError::VoucherInvalido("expirado".into()));
    }

    Ok(())
}

pub(crate) fn normalizar_codigo(codigo: &str) -> String {
    codigo.trim().to_uppercase()
}

#[derive(Clone)]
pub struct VoucherService {
    repo: VoucherRepository,
}

impl VoucherService {
    pub fn new(repo: VoucherRepository) -> Self {
        Self { repo }
    }

    pub async fn criar<'e, E>(&self, executor: E, payload: &VoucherPayload) -> Result<Voucher, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if payload.tipo == TipoVoucher::Percentual && payload.valor > Decimal::ONE_HUNDRED {
            return Err(AppError::RegraNegocio(
                "Desconto percentual não pode passar de 100%.".into(),
            ));
        }

        let codigo = normalizar_codigo(&payload.codigo);
        let voucher = self.repo.criar(executor, &codigo, payload).await?;
        tracing::info!("Voucher {} criado", voucher.codigo);
        Ok(voucher)
    }

    pub async fn listar<'e, E>(&self, executor: E) -> Result<Vec<Voucher>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.listar(executor).await
    }

    pub async fn alterar_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: StatusVoucher,
    ) -> Result<Voucher, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .alterar_status(executor, id, status)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Voucher".into()))
    }

    /// Só calcula: nada é gravado. O uso é contado em `resgatar`, na venda.
    pub async fn validar<'e, E>(
        &self,
        executor: E,
        codigo: &str,
        subtotal: Decimal,
    ) -> Result<VoucherValidado, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let voucher = self
            .repo
            .buscar_por_codigo(executor, &normalizar_codigo(codigo))
            .await?
            .ok_or_else(|| AppError::VoucherInvalido("código inexistente".into()))?;

        verificar_disponibilidade(&voucher, Utc::now().date_naive())?;
        let desconto = calcular_desconto(voucher.tipo, voucher.valor, subtotal);

        Ok(VoucherValidado { voucher, desconto })
    }

    /// Trava o voucher, confere e conta um uso. Roda dentro da transação do pedido.
    pub async fn resgatar(
        &self,
        conn: &mut PgConnection,
        codigo: &str,
        subtotal: Decimal,
    ) -> Result<VoucherValidado, AppError> {
        let voucher = self
            .repo
            .buscar_por_codigo_para_atualizar(&mut *conn, &normalizar_codigo(codigo))
            .await?
            .ok_or_else(|| AppError::VoucherInvalido("código inexistente".into()))?;

        verificar_disponibilidade(&voucher, Utc::now().date_naive())?;
        let desconto = calcular_desconto(voucher.tipo, voucher.valor, subtotal);

        let voucher = self.repo.registrar_uso(&mut *conn, voucher.id).await?;
        Ok(VoucherValidado { voucher, desconto })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn voucher(status: StatusVoucher, usos: i32, validade: Option<NaiveDate>) -> Voucher {
        let agora = Utc::now();
        Voucher {
            id: Uuid::new_v4(),
            codigo: "BEMVINDO10".into(),
            descricao: None,
            tipo: TipoVoucher::Percentual,
            valor: dec!(10),
            validade,
            usos_maximos: 3,
            usos,
            status,
            created_at: agora,
            updated_at: agora,
        }
    }

    fn dia(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn percentual_arredonda_e_limita_em_cem() {
        assert_eq!(calcular_desconto(TipoVoucher::Percentual, dec!(10), dec!(45.55)), dec!(4.56));
        assert_eq!(calcular_desconto(TipoVoucher::Percentual, dec!(150), dec!(80)), dec!(80));
    }

    #[test]
    fn valor_fixo_nao_passa_do_subtotal() {
        assert_eq!(calcular_desconto(TipoVoucher::Valor, dec!(15), dec!(40)), dec!(15));
        assert_eq!(calcular_desconto(TipoVoucher::Valor, dec!(50), dec!(40)), dec!(40));
        assert_eq!(calcular_desconto(TipoVoucher::Valor, dec!(5), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn voucher_valido_ate_o_fim_do_dia() {
        let v = voucher(StatusVoucher::Ativo, 0, Some(dia(18)));
        assert!(verificar_disponibilidade(&v, dia(18)).is_ok());
        assert!(matches!(
            verificar_disponibilidade(&v, dia(19)),
            Err(AppError::VoucherInvalido(m)) if m == "expirado"
        ));
    }

    #[test]
    fn voucher_inativo_ou_esgotado_e_recusado() {
        let inativo = voucher(StatusVoucher::Inativo, 0, None);
        assert!(matches!(
            verificar_disponibilidade(&inativo, dia(1)),
            Err(AppError::VoucherInvalido(m)) if m == "inativo"
        ));

        // Status ainda ativo, mas o contador já bateu no limite
        let no_limite = voucher(StatusVoucher::Ativo, 3, None);
        assert!(matches!(
            verificar_disponibilidade(&no_limite, dia(1)),
            Err(AppError::VoucherInvalido(m)) if m == "esgotado"
        ));
    }

    #[test]
    fn codigo_normalizado_em_maiusculas() {
        assert_eq!(normalizar_codigo("  bemvindo10 "), "BEMVINDO10");
    }
}
