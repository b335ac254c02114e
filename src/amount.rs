//! Conversion between integer tokens (satoshis) and the node's native unit.

/// Smallest units per native unit.
pub const TOKENS_PER_UNIT: u64 = 100_000_000;

/// Tokens → native amount, as sent to the node.
pub fn tokens_to_native(tokens: u64) -> f64 {
    tokens as f64 / TOKENS_PER_UNIT as f64
}

/// Native amount → tokens. The sign is dropped; the result is rounded to the nearest token.
pub fn native_to_tokens(native: f64) -> u64 {
    if !native.is_finite() {
        return 0;
    }
    (native.abs() * TOKENS_PER_UNIT as f64).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        assert_eq!(tokens_to_native(100_000), 0.001);
        assert_eq!(tokens_to_native(TOKENS_PER_UNIT), 1.0);
        assert_eq!(native_to_tokens(0.001), 100_000);
        assert_eq!(native_to_tokens(-0.001), 100_000);
        assert_eq!(native_to_tokens(0.0), 0);
    }

    #[test]
    fn test_round_trip() {
        let samples = [
            0u64,
            1,
            7,
            546,
            99_999,
            100_000,
            123_456_789,
            2_099_999_997_690_000,
            2_100_000_000_000_000,
        ];
        for tokens in samples {
            assert_eq!(native_to_tokens(tokens_to_native(tokens)), tokens, "tokens={}", tokens);
        }
        for tokens in (0..1_000_000u64).step_by(997) {
            assert_eq!(native_to_tokens(tokens_to_native(tokens)), tokens);
        }
    }

    #[test]
    fn test_non_finite_is_zero() {
        assert_eq!(native_to_tokens(f64::NAN), 0);
        assert_eq!(native_to_tokens(f64::INFINITY), 0);
    }
}
