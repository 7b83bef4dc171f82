// src/common/money.rs

use rust_decimal::{Decimal, RoundingStrategy};

/// Arredonda valores monetários/percentuais para 2 casas.
/// Usado só no retorno; as somas intermediárias ficam com precisão total.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn round2_f64(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Variação percentual entre dois períodos, com uma única regra para todas as métricas:
/// anterior = 0 -> 100 se o atual for positivo, senão 0.
pub fn percent_change(current: Decimal, previous: Decimal) -> Decimal {
    if previous.is_zero() {
        return if current > Decimal::ZERO {
            Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };
    }
    current
        .checked_sub(previous)
        .and_then(|diff| diff.checked_div(previous))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(round2)
        // fora da faixa do Decimal: satura no sentido da variação
        .unwrap_or(if current > previous { Decimal::MAX } else { Decimal::MIN })
}

/// Soma que satura em `Decimal::MAX` / `Decimal::MIN` em vez de estourar.
pub fn saturating_sum<I: IntoIterator<Item = Decimal>>(values: I) -> Decimal {
    values.into_iter().fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Média simples; zero quando não há elementos.
pub fn average(sum: Decimal, count: usize) -> Decimal {
    if count == 0 {
        Decimal::ZERO
    } else {
        sum / Decimal::from(count)
    }
}
