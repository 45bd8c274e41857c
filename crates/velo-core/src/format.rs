//! Integer-only number formatting for displays
//!
//! The targets this runs on either have no float support in their
//! formatting machinery or cannot afford it, so values are rendered by
//! splitting them into integers first.
//!
//! Both functions write into a caller-owned byte buffer, append a NUL
//! terminator (display drivers take C strings) and return the text without
//! the terminator. Nothing is written unless the whole result fits.

use thiserror_no_std::Error;

/// Largest supported number of fractional digits; `10^9` still fits a `u32`
pub const MAX_PRECISION: u8 = 9;

/// Buffer size that fits any result of [`format_integer`] with `min_width <= 10`
pub const INTEGER_BUF_LEN: usize = 1 + 10 + 1;

/// Buffer size that fits any result of [`format_fraction`]
pub const FRACTION_BUF_LEN: usize = 1 + 10 + 1 + MAX_PRECISION as usize + 1;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatError {
    #[error("Output needs {needed} bytes but only {available} are available")]
    BufferTooSmall { needed: usize, available: usize },
    #[error("Precision {precision} exceeds the supported maximum")]
    PrecisionTooLarge { precision: u8 },
    #[error("Value is not a finite number")]
    NotFinite,
}

/// Write `value` as decimal text, zero-padding the digits to `min_width`.
///
/// The sign is not counted in the width: `-5` at width 3 is `-005`.
pub fn format_integer(value: i32, min_width: usize, buf: &mut [u8]) -> Result<&str, FormatError> {
    let negative = value < 0;
    let mut magnitude = value.unsigned_abs();

    let sign_len = negative as usize;
    let digits_len = digit_count(magnitude).max(min_width);
    let needed = digits_len
        .checked_add(sign_len + 1)
        .ok_or(FormatError::BufferTooSmall {
            needed: usize::MAX,
            available: buf.len(),
        })?;
    ensure_fits(buf, needed)?;
    let len = needed - 1;

    if negative {
        buf[0] = b'-';
    }

    // Least significant digit first, then reversed
    let digits = &mut buf[sign_len..len];
    let mut written = 0;
    loop {
        digits[written] = b'0' + (magnitude % 10) as u8;
        written += 1;
        magnitude /= 10;
        if magnitude == 0 {
            break;
        }
    }
    digits[written..].fill(b'0');
    digits.reverse();

    buf[len] = 0;
    Ok(ascii(&buf[..len]))
}

/// Write `value` with exactly `precision` fractional digits.
///
/// The fractional part is scaled by `10^precision` and rounded on its first
/// remaining digit only: below .5 rounds down, anything else rounds up. A
/// precision of 0 still prints the point, followed by `0`.
///
/// When rounding reaches the next whole number the carry goes into the
/// integer part, so `0.999` at precision 2 is `1.00`. The head unit's
/// earlier firmware left the carry in the fraction and printed `0.100`;
/// that output was wrong and is not reproduced.
///
/// Integer parts beyond `i32::MAX` saturate.
pub fn format_fraction(value: f32, precision: u8, buf: &mut [u8]) -> Result<&str, FormatError> {
    if !value.is_finite() {
        return Err(FormatError::NotFinite);
    }
    if precision > MAX_PRECISION {
        return Err(FormatError::PrecisionTooLarge { precision });
    }

    let negative = value < 0.0;
    let magnitude = if negative { -value } else { value };
    let mut integer = magnitude as i32;

    let mut fraction = 0;
    if precision > 0 {
        let one = 10u32.pow(precision as u32);
        let scaled = (magnitude % 1.0) * one as f32;
        let truncated = scaled as u32;
        fraction = if scaled - (truncated as f32) < 0.5 {
            truncated
        } else {
            truncated + 1
        };
        if fraction >= one {
            integer = integer.saturating_add(1);
            fraction -= one;
        }
    }

    let sign_len = negative as usize;
    let integer_len = digit_count(integer as u32);
    let fraction_len = digit_count(fraction).max(precision as usize);
    ensure_fits(buf, sign_len + integer_len + 1 + fraction_len + 1)?;

    if negative {
        buf[0] = b'-';
    }
    let mut len = sign_len;
    len += format_integer(integer, 0, &mut buf[len..])?.len();
    buf[len] = b'.';
    len += 1;
    len += format_integer(fraction as i32, precision as usize, &mut buf[len..])?.len();

    Ok(ascii(&buf[..len]))
}

fn digit_count(mut value: u32) -> usize {
    let mut count = 1;
    while value >= 10 {
        value /= 10;
        count += 1;
    }
    count
}

fn ensure_fits(buf: &[u8], needed: usize) -> Result<(), FormatError> {
    if buf.len() < needed {
        return Err(FormatError::BufferTooSmall {
            needed,
            available: buf.len(),
        });
    }
    Ok(())
}

/// Only ever called on digits, signs and points
fn ascii(bytes: &[u8]) -> &str {
    core::str::from_utf8(bytes).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn integer(value: i32, min_width: usize) -> String {
        let mut buf = [0xAAu8; INTEGER_BUF_LEN];
        format_integer(value, min_width, &mut buf).unwrap().to_string()
    }

    fn fraction(value: f32, precision: u8) -> String {
        let mut buf = [0xAAu8; FRACTION_BUF_LEN];
        format_fraction(value, precision, &mut buf)
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_integer_padding() {
        assert_eq!(integer(7, 3), "007");
        assert_eq!(integer(1234, 2), "1234", "width is a minimum");
        assert_eq!(integer(0, 0), "0");
        assert_eq!(integer(0, 4), "0000");
    }

    #[test]
    fn test_negative_integer_sign_is_not_padded() {
        assert_eq!(integer(-42, 0), "-42");
        assert_eq!(integer(-5, 3), "-005");
        assert_eq!(integer(i32::MIN, 0), "-2147483648");
    }

    #[test]
    fn test_integer_is_nul_terminated() {
        let mut buf = [0xAAu8; 8];
        let text = format_integer(7, 3, &mut buf).unwrap();
        assert_eq!(text, "007");
        assert_eq!(&buf[..5], b"007\0\xAA");
    }

    #[test]
    fn test_integer_buffer_too_small() {
        let mut buf = [0u8; 5];
        assert_eq!(
            format_integer(12345, 0, &mut buf),
            Err(FormatError::BufferTooSmall {
                needed: 6,
                available: 5
            })
        );
        assert_eq!(buf, [0; 5], "nothing written on failure");
        assert_eq!(format_integer(1234, 0, &mut buf), Ok("1234"));
    }

    #[test]
    fn test_huge_width_is_reported_not_overflowed() {
        let mut buf = [0u8; INTEGER_BUF_LEN];
        for value in [1, -1] {
            assert_eq!(
                format_integer(value, usize::MAX, &mut buf),
                Err(FormatError::BufferTooSmall {
                    needed: usize::MAX,
                    available: INTEGER_BUF_LEN
                })
            );
        }
    }

    #[test]
    fn test_fraction_rounding() {
        assert_eq!(fraction(3.456, 2), "3.46");
        assert_eq!(fraction(-1.2, 1), "-1.2");
        assert_eq!(fraction(12.5, 1), "12.5");
        assert_eq!(fraction(2.25, 1), "2.3", "exact half rounds up");
    }

    #[test]
    fn test_fraction_zero_precision_keeps_point() {
        assert_eq!(fraction(5.0, 0), "5.0");
        assert_eq!(fraction(5.7, 0), "5.0", "fraction is dropped, not rounded");
    }

    #[test]
    fn test_fraction_is_zero_padded() {
        assert_eq!(fraction(0.05, 3), "0.050");
        assert_eq!(fraction(7.005, 3), "7.005");
        assert_eq!(fraction(-0.5, 1), "-0.5");
    }

    #[test]
    fn test_fraction_carry_into_integer() {
        assert_eq!(fraction(0.999, 2), "1.00");
        assert_eq!(fraction(-9.96, 1), "-10.0");
    }

    #[test]
    fn test_fraction_rejects_bad_input() {
        let mut buf = [0u8; FRACTION_BUF_LEN];
        assert_eq!(
            format_fraction(f32::NAN, 1, &mut buf),
            Err(FormatError::NotFinite)
        );
        assert_eq!(
            format_fraction(f32::NEG_INFINITY, 1, &mut buf),
            Err(FormatError::NotFinite)
        );
        assert_eq!(
            format_fraction(1.0, 10, &mut buf),
            Err(FormatError::PrecisionTooLarge { precision: 10 })
        );
    }

    #[test]
    fn test_fraction_buffer_too_small() {
        let mut buf = [0u8; 5];
        assert_eq!(
            format_fraction(-12.34, 2, &mut buf),
            Err(FormatError::BufferTooSmall {
                needed: 7,
                available: 5
            })
        );
        assert_eq!(format_fraction(2.5, 1, &mut buf), Ok("2.5"));
    }
}
