//! Exact conversions between wei and decimal ether strings.
//!
//! All arithmetic is integer arithmetic on `U256`; floating point would
//! silently lose precision below roughly 2^53 wei.

use alloy_primitives::U256;

use crate::error::EthError;

/// Wei per ether: 10^18.
pub const WEI_PER_ETHER: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

const ETHER_DECIMALS: usize = 18;

/// Parses a decimal ether string (e.g. `"10"`, `"0.5"`,
/// `"0.000000000000000001"`) into wei.
///
/// At most 18 fractional digits are accepted; anything finer than one wei
/// cannot be represented and is an error rather than a rounding.
pub fn parse_ether(text: &str) -> Result<U256, EthError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(EthError::EncodingError("empty amount".into()));
    }

    let (whole, frac) = match text.split_once('.') {
        Some((whole, frac)) => {
            if frac.is_empty() {
                return Err(EthError::EncodingError(
                    "expected digits after the decimal point".into(),
                ));
            }
            (whole, frac)
        }
        None => (text, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(EthError::EncodingError("empty amount".into()));
    }
    if frac.len() > ETHER_DECIMALS {
        return Err(EthError::EncodingError(format!(
            "at most {ETHER_DECIMALS} fractional digits are representable, got {}",
            frac.len()
        )));
    }

    let whole_wei = parse_digits(whole)?
        .checked_mul(WEI_PER_ETHER)
        .ok_or_else(|| EthError::EncodingError("amount exceeds 256 bits".into()))?;

    // Right-pad the fraction to 18 digits: "5" means 5 * 10^17 wei.
    let mut frac_wei = parse_digits(frac)?;
    for _ in frac.len()..ETHER_DECIMALS {
        frac_wei = frac_wei
            .checked_mul(U256::from(10u8))
            .ok_or_else(|| EthError::EncodingError("amount exceeds 256 bits".into()))?;
    }

    whole_wei
        .checked_add(frac_wei)
        .ok_or_else(|| EthError::EncodingError("amount exceeds 256 bits".into()))
}

/// Formats wei as a canonical decimal ether string: no trailing fractional
/// zeros, no decimal point when the amount is whole.
pub fn format_ether(wei: U256) -> String {
    let whole = wei / WEI_PER_ETHER;
    let frac = wei % WEI_PER_ETHER;

    if frac.is_zero() {
        return whole.to_string();
    }

    let digits = format!("{:0>18}", frac.to_string());
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

fn parse_digits(digits: &str) -> Result<U256, EthError> {
    let mut value = U256::ZERO;
    for c in digits.chars() {
        let digit = c
            .to_digit(10)
            .ok_or_else(|| EthError::EncodingError(format!("invalid digit {c:?}")))?;
        value = value
            .checked_mul(U256::from(10u8))
            .and_then(|v| v.checked_add(U256::from(digit)))
            .ok_or_else(|| EthError::EncodingError("amount exceeds 256 bits".into()))?;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_wei_roundtrips_exactly() {
        let wei = parse_ether("0.000000000000000001").unwrap();
        assert_eq!(wei, U256::from(1));
        assert_eq!(format_ether(wei), "0.000000000000000001");
    }

    #[test]
    fn whole_ether_roundtrips() {
        let wei = parse_ether("10").unwrap();
        assert_eq!(wei, WEI_PER_ETHER * U256::from(10u8));
        assert_eq!(format_ether(wei), "10");
    }

    #[test]
    fn fractional_ether_roundtrips() {
        for text in ["0.5", "1.5", "12.34", "0.100000000000000001", "123456.789"] {
            let wei = parse_ether(text).unwrap();
            assert_eq!(format_ether(wei), text, "roundtrip mismatch for {text}");
        }
    }

    #[test]
    fn one_ether_is_ten_to_the_eighteenth() {
        assert_eq!(parse_ether("1").unwrap(), WEI_PER_ETHER);
        assert_eq!(format_ether(WEI_PER_ETHER), "1");
    }

    #[test]
    fn zero_formats_as_zero() {
        assert_eq!(parse_ether("0").unwrap(), U256::ZERO);
        assert_eq!(format_ether(U256::ZERO), "0");
    }

    #[test]
    fn bare_fraction_is_accepted() {
        assert_eq!(parse_ether(".5").unwrap(), parse_ether("0.5").unwrap());
    }

    #[test]
    fn nineteen_fractional_digits_rejected() {
        let result = parse_ether("0.0000000000000000001");
        assert!(matches!(result, Err(EthError::EncodingError(_))));
    }

    #[test]
    fn malformed_amounts_rejected() {
        for text in ["", ".", "1.", "1.2.3", "abc", "1,5", "-1", "1e18"] {
            assert!(parse_ether(text).is_err(), "expected error for {text:?}");
        }
    }

    #[test]
    fn overflow_is_an_error_not_a_wrap() {
        // 10^60 ether is far beyond 2^256 wei.
        let text = format!("1{}", "0".repeat(60));
        assert!(matches!(
            parse_ether(&text),
            Err(EthError::EncodingError(_))
        ));
    }

    #[test]
    fn no_floating_point_drift_on_awkward_values() {
        // 0.1 is famously unrepresentable in binary floating point.
        let wei = parse_ether("0.1").unwrap();
        assert_eq!(wei, U256::from(100_000_000_000_000_000u64));
        assert_eq!(format_ether(wei), "0.1");
    }
}
