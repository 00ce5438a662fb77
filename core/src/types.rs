/// Currency amount used for balances, bets and deltas.
pub type Amount = f64;

/// Upper clamp applied to every balance after a play.
pub const MAX_BALANCE: Amount = 9_999_999.0;

/// Clamps a balance into `[0, MAX_BALANCE]`. NaN maps to zero, infinities to the nearest bound.
pub fn clamp_balance(value: Amount) -> Amount {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, MAX_BALANCE)
}

/// Rounds halves towards positive infinity, so `2.5 -> 3` and `-2.5 -> -2`.
pub fn round_half_up(value: Amount) -> Amount {
    (value + 0.5).floor()
}

pub fn round_cents(value: Amount) -> Amount {
    (value * 100.0).round() / 100.0
}

/// Parses a numeric text input the way a lenient form field would, treating
/// empty, non-numeric, non-finite and zero input as absent.
pub fn parse_amount(input: &str) -> Option<Amount> {
    input
        .trim()
        .parse::<Amount>()
        .ok()
        .filter(|value| value.is_finite() && *value != 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_balance_floors_at_zero_and_caps() {
        assert_eq!(clamp_balance(-3.0), 0.0);
        assert_eq!(clamp_balance(42.5), 42.5);
        assert_eq!(clamp_balance(1e12), MAX_BALANCE);
        assert_eq!(clamp_balance(f64::NAN), 0.0);
        assert_eq!(clamp_balance(f64::INFINITY), MAX_BALANCE);
        assert_eq!(clamp_balance(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn round_half_up_matches_lenient_rounding() {
        assert_eq!(round_half_up(15.0), 15.0);
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(7.49), 7.0);
    }

    #[test]
    fn parse_amount_treats_junk_as_absent() {
        assert_eq!(parse_amount(" 25 "), Some(25.0));
        assert_eq!(parse_amount("12.75"), Some(12.75));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("0"), None);
        assert_eq!(parse_amount("inf"), None);
    }
}
