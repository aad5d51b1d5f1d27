//! Check-digit algorithms for Brazilian taxpayer identifiers.
//!
//! Both CPF and CNPJ carry two trailing check digits computed with a weighted
//! modulo-11 sum. A check digit is `0` when the remainder is below 2, and
//! `11 - remainder` otherwise. All functions here are pure and operate on
//! digits-only strings; anything else is rejected rather than coerced.

/// Weights for the first CNPJ check digit, applied to the first 12 digits.
pub const CNPJ_FIRST_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Weights for the second CNPJ check digit, applied to the first 13 digits.
pub const CNPJ_SECOND_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Weights for the first CPF check digit, applied to the first 9 digits.
pub const CPF_FIRST_WEIGHTS: [u32; 9] = [10, 9, 8, 7, 6, 5, 4, 3, 2];

/// Weights for the second CPF check digit, applied to the first 10 digits.
pub const CPF_SECOND_WEIGHTS: [u32; 10] = [11, 10, 9, 8, 7, 6, 5, 4, 3, 2];

/// Compute a single modulo-11 check digit.
///
/// `digits` and `weights` must have the same length.
#[must_use]
pub fn mod11_check_digit(digits: &[u8], weights: &[u32]) -> u8 {
    debug_assert_eq!(digits.len(), weights.len());

    let sum: u32 = digits
        .iter()
        .zip(weights)
        .map(|(digit, weight)| u32::from(*digit) * weight)
        .sum();
    let remainder = sum % 11;

    if remainder < 2 {
        0
    } else {
        // remainder is in 2..=10, so the result always fits in a single digit
        u8::try_from(11 - remainder).unwrap_or(0)
    }
}

/// Compute the two CNPJ check digits for a 12-digit base.
///
/// Returns `None` if `base` is not exactly 12 ASCII digits.
#[must_use]
pub fn cnpj_check_digits(base: &str) -> Option<[u8; 2]> {
    let mut digits = parse_digits(base, 12)?;
    let first = mod11_check_digit(&digits, &CNPJ_FIRST_WEIGHTS);
    digits.push(first);
    let second = mod11_check_digit(&digits, &CNPJ_SECOND_WEIGHTS);
    Some([first, second])
}

/// Compute the two CPF check digits for a 9-digit base.
///
/// Returns `None` if `base` is not exactly 9 ASCII digits.
#[must_use]
pub fn cpf_check_digits(base: &str) -> Option<[u8; 2]> {
    let mut digits = parse_digits(base, 9)?;
    let first = mod11_check_digit(&digits, &CPF_FIRST_WEIGHTS);
    digits.push(first);
    let second = mod11_check_digit(&digits, &CPF_SECOND_WEIGHTS);
    Some([first, second])
}

/// Verify the check-digit pair of a 14-digit CNPJ.
#[must_use]
pub fn is_valid_cnpj(cnpj: &str) -> bool {
    trailing_digits_match(cnpj, 14, cnpj_check_digits)
}

/// Verify the check-digit pair of an 11-digit CPF.
#[must_use]
pub fn is_valid_cpf(cpf: &str) -> bool {
    trailing_digits_match(cpf, 11, cpf_check_digits)
}

/// True when every character of a non-empty string is the same (`"00000000000"`).
#[must_use]
pub fn is_repeated_sequence(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => chars.all(|c| c == first),
        None => false,
    }
}

fn trailing_digits_match(value: &str, width: usize, compute: fn(&str) -> Option<[u8; 2]>) -> bool {
    if value.len() != width || !value.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let (base, check) = value.split_at(width - 2);
    let Some(expected) = compute(base) else {
        return false;
    };

    let actual: Vec<u8> = check.bytes().map(|b| b - b'0').collect();
    actual == expected
}

fn parse_digits(value: &str, width: usize) -> Option<Vec<u8>> {
    if value.len() != width {
        return None;
    }

    value
        .bytes()
        .map(|b| b.is_ascii_digit().then(|| b - b'0'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replace the digit at `index` with the next digit modulo 10.
    fn flip_digit(value: &str, index: usize) -> String {
        value
            .char_indices()
            .map(|(i, c)| {
                if i == index {
                    let d = c.to_digit(10).expect("digit");
                    char::from_digit((d + 1) % 10, 10).expect("digit")
                } else {
                    c
                }
            })
            .collect()
    }

    #[test]
    fn test_known_valid_cnpjs() {
        for cnpj in ["11222333000181", "33000167000101", "11444777000161"] {
            assert!(is_valid_cnpj(cnpj), "should be valid: {cnpj}");
        }
    }

    #[test]
    fn test_flipping_either_cnpj_check_digit_invalidates() {
        let cnpj = "11222333000181";
        assert!(!is_valid_cnpj(&flip_digit(cnpj, 12)));
        assert!(!is_valid_cnpj(&flip_digit(cnpj, 13)));
    }

    #[test]
    fn test_cnpj_check_digits_for_generated_bases() {
        // Every base gets exactly one valid pair, and any other trailing pair fails.
        for n in 0..200u64 {
            let base = format!("{:08}0001", n * 7919 + 13);
            let [d1, d2] = cnpj_check_digits(&base).expect("12-digit base");
            let valid = format!("{base}{d1}{d2}");
            assert!(is_valid_cnpj(&valid), "generated {valid} should validate");
            assert!(!is_valid_cnpj(&flip_digit(&valid, 12)));
            assert!(!is_valid_cnpj(&flip_digit(&valid, 13)));
        }
    }

    #[test]
    fn test_cnpj_remainder_below_two_yields_zero() {
        // First-digit remainder for this base is 0.
        assert_eq!(cnpj_check_digits("330001670001"), Some([0, 1]));
    }

    #[test]
    fn test_cnpj_rejects_wrong_shape() {
        assert!(!is_valid_cnpj("1122233300018"));
        assert!(!is_valid_cnpj("112223330001811"));
        assert!(!is_valid_cnpj("11.222.333/0001-81"));
        assert_eq!(cnpj_check_digits("11222333000"), None);
        assert_eq!(cnpj_check_digits("11222333000a"), None);
    }

    #[test]
    fn test_known_valid_cpf() {
        assert_eq!(cpf_check_digits("529982247"), Some([2, 5]));
        assert!(is_valid_cpf("52998224725"));
        assert!(!is_valid_cpf(&flip_digit("52998224725", 9)));
        assert!(!is_valid_cpf(&flip_digit("52998224725", 10)));
    }

    #[test]
    fn test_cpf_generated_bases_round_trip() {
        for n in 1..300u64 {
            let base = format!("{:09}", n * 104_729 % 1_000_000_000);
            let [d1, d2] = cpf_check_digits(&base).expect("9-digit base");
            assert!(is_valid_cpf(&format!("{base}{d1}{d2}")));
        }
    }

    #[test]
    fn test_mod11_check_digit_rule() {
        // sum = 11 -> remainder 0 -> digit 0
        assert_eq!(mod11_check_digit(&[1], &[11]), 0);
        // sum = 1 -> remainder 1 -> digit 0
        assert_eq!(mod11_check_digit(&[1], &[1]), 0);
        // sum = 2 -> remainder 2 -> digit 9
        assert_eq!(mod11_check_digit(&[1], &[2]), 9);
        // sum = 10 -> remainder 10 -> digit 1
        assert_eq!(mod11_check_digit(&[5], &[2]), 1);
    }

    #[test]
    fn test_repeated_sequence() {
        assert!(is_repeated_sequence("00000000000"));
        assert!(is_repeated_sequence("99999999999999"));
        assert!(!is_repeated_sequence("00000000001"));
        assert!(!is_repeated_sequence(""));
    }
}
