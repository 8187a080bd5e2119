//! Shared helpers for the calculators: rounding, fixed-point and currency
//! formatting for the shareable summaries, and guarded ratios.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Weight of one sack of grain (kg).
pub const SACK_KG: Decimal = dec!(60);

/// Rounds to `dp` decimal places, halves away from zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use agro_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(89.2307), 2), dec!(89.23));
/// assert_eq!(round_half_up(dec!(0.125), 2), dec!(0.13));
/// assert_eq!(round_half_up(dec!(-0.125), 2), dec!(-0.13));
/// ```
pub fn round_half_up(
    value: Decimal,
    dp: u32,
) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats with exactly `dp` fraction digits and a `.` separator.
pub fn format_fixed(
    value: Decimal,
    dp: u32,
) -> String {
    let mut rounded = round_half_up(value, dp);
    rounded.rescale(dp);
    rounded.to_string()
}

/// Formats an amount as Brazilian reais: `R$`, a no-break space, `.` for
/// thousands and `,` before the two cents digits.
///
/// ```
/// use rust_decimal_macros::dec;
/// use agro_core::calculations::common::format_brl;
///
/// assert_eq!(format_brl(dec!(5800)), "R$\u{a0}5.800,00");
/// assert_eq!(format_brl(dec!(-1234567.891)), "-R$\u{a0}1.234.567,89");
/// ```
pub fn format_brl(value: Decimal) -> String {
    let fixed = format_fixed(value.abs(), 2);
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*c);
    }

    let sign = if value.is_sign_negative() && round_half_up(value, 2) != Decimal::ZERO {
        "-"
    } else {
        ""
    };
    format!("{sign}R$\u{a0}{grouped},{frac_part}")
}

/// `part / whole * 100`. `Some(0)` when `whole` is zero, `None` when the
/// quotient leaves the `Decimal` range.
pub fn percent_of(
    part: Decimal,
    whole: Decimal,
) -> Option<Decimal> {
    if whole.is_zero() {
        return Some(Decimal::ZERO);
    }
    part.checked_div(whole)?.checked_mul(dec!(100))
}

/// `numerator / denominator`. `Some(0)` when `denominator` is zero, `None`
/// on overflow.
pub fn ratio(
    numerator: Decimal,
    denominator: Decimal,
) -> Option<Decimal> {
    if denominator.is_zero() {
        Some(Decimal::ZERO)
    } else {
        numerator.checked_div(denominator)
    }
}

/// `value * factor / divisor` without panicking; `None` on overflow or a
/// zero divisor.
pub fn scaled(
    value: Decimal,
    factor: Decimal,
    divisor: Decimal,
) -> Option<Decimal> {
    value.checked_mul(factor)?.checked_div(divisor)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    // =========================================================================
    // format_fixed
    // =========================================================================

    #[test]
    fn format_fixed_pads_fraction_digits() {
        assert_eq!(format_fixed(dec!(12), 2), "12.00");
        assert_eq!(format_fixed(dec!(46.4), 1), "46.4");
    }

    #[test]
    fn format_fixed_rounds_half_up() {
        assert_eq!(format_fixed(dec!(285.714285), 1), "285.7");
        assert_eq!(format_fixed(dec!(4.1666), 2), "4.17");
        assert_eq!(format_fixed(dec!(0.05), 1), "0.1");
    }

    // =========================================================================
    // format_brl
    // =========================================================================

    #[test]
    fn format_brl_groups_thousands() {
        assert_eq!(format_brl(dec!(1234567.5)), "R$\u{a0}1.234.567,50");
    }

    #[test]
    fn format_brl_small_values_have_no_separator() {
        assert_eq!(format_brl(dec!(89.2307)), "R$\u{a0}89,23");
        assert_eq!(format_brl(dec!(0)), "R$\u{a0}0,00");
    }

    #[test]
    fn format_brl_negative_zero_after_rounding_is_unsigned() {
        assert_eq!(format_brl(dec!(-0.001)), "R$\u{a0}0,00");
    }

    // =========================================================================
    // guarded ratios
    // =========================================================================

    #[test]
    fn ratio_by_zero_is_zero() {
        assert_eq!(ratio(dec!(600), Decimal::ZERO), Some(Decimal::ZERO));
        assert_eq!(percent_of(dec!(5), Decimal::ZERO), Some(Decimal::ZERO));
    }

    #[test]
    fn percent_of_scales_by_hundred() {
        assert_eq!(percent_of(dec!(1), dec!(4)), Some(dec!(25)));
    }

    #[test]
    fn out_of_range_quotients_are_none() {
        assert_eq!(ratio(Decimal::MAX, dec!(0.5)), None);
        assert_eq!(percent_of(Decimal::MAX, Decimal::ONE), None);
        assert_eq!(scaled(Decimal::MAX, dec!(2), dec!(10)), None);
        assert_eq!(scaled(dec!(7), dec!(3), Decimal::ZERO), None);
    }

    #[test]
    fn scaled_multiplies_before_dividing() {
        assert_eq!(scaled(dec!(8), dec!(2.5), dec!(10)), Some(dec!(2)));
    }
}
