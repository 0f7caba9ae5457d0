//! 金额计算

use rust_decimal::{Decimal, RoundingStrategy};

/// 保留到分，恰好一半时取偶数（银行家舍入）
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// `amount * pct / 100`，保留两位小数
pub fn percentage_of(amount: Decimal, pct: Decimal) -> Decimal {
    round_money(amount * pct / Decimal::ONE_HUNDRED)
}

/// 占比（百分数），total 为 0 时返回 0
pub fn share_percent(part: Decimal, total: Decimal) -> Decimal {
    if total.is_zero() {
        Decimal::ZERO
    } else {
        round_money(part * Decimal::ONE_HUNDRED / total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_percentage_of() {
        assert_eq!(percentage_of(d("1000"), d("5")), d("50.00"));
        assert_eq!(percentage_of(d("199.99"), d("2.5")), d("5.00"));
        assert_eq!(percentage_of(d("10.10"), d("0")), d("0"));
    }

    #[test]
    fn test_round_money_midpoint() {
        assert_eq!(round_money(d("0.125")), d("0.12"));
        assert_eq!(round_money(d("0.135")), d("0.14"));
        assert_eq!(round_money(d("-0.125")), d("-0.12"));
        assert_eq!(round_money(d("0.1251")), d("0.13"));
    }

    #[test]
    fn test_share_percent() {
        assert_eq!(share_percent(d("25"), d("100")), d("25.00"));
        assert_eq!(share_percent(d("1"), d("3")), d("33.33"));
        assert_eq!(share_percent(d("5"), Decimal::ZERO), Decimal::ZERO);
    }
}
