// src/common/money.rs

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::common::error::AppError;

// Os provedores (Pagar.me e PagSeguro) trabalham com inteiros em centavos.
pub fn to_centavos(valor: Decimal) -> Result<i64, AppError> {
    if valor.is_sign_negative() && !valor.is_zero() {
        return Err(AppError::RegraNegocio("Valor monetário negativo".into()));
    }

    (valor * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| AppError::RegraNegocio("Valor monetário fora do intervalo".into()))
}

/// Formata no padrão brasileiro: `R$ 1.234,56`.
pub fn format_brl(valor: Decimal) -> String {
    let arredondado = valor.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negativo = arredondado.is_sign_negative() && !arredondado.is_zero();
    let texto = format!("{:.2}", arredondado.abs());
    let (inteiro, centavos) = texto.split_once('.').unwrap_or((texto.as_str(), "00"));

    let mut agrupado = String::new();
    for (i, c) in inteiro.chars().enumerate() {
        if i > 0 && (inteiro.len() - i) % 3 == 0 {
            agrupado.push('.');
        }
        agrupado.push(c);
    }

    format!("{}R$ {},{}", if negativo { "-" } else { "" }, agrupado, centavos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn converte_para_centavos_arredondando() {
        assert_eq!(to_centavos(dec!(10.50)).unwrap(), 1050);
        assert_eq!(to_centavos(dec!(0.005)).unwrap(), 1);
        assert_eq!(to_centavos(dec!(0)).unwrap(), 0);
    }

    #[test]
    fn rejeita_valor_negativo() {
        assert!(to_centavos(dec!(-1.00)).is_err());
    }

    #[test]
    fn formata_em_reais() {
        assert_eq!(format_brl(dec!(0)), "R$ 0,00");
        assert_eq!(format_brl(dec!(12.5)), "R$ 12,50");
        assert_eq!(format_brl(dec!(1234.56)), "R$ 1.234,56");
        assert_eq!(format_brl(dec!(1234567.8)), "R$ 1.234.567,80");
        assert_eq!(format_brl(dec!(-15)), "-R$ 15,00");
    }
}
