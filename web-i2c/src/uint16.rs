use crate::RangeError;

/// Parse a decimal port number.
///
/// Leading whitespace and a sign are skipped, then the leading run of ASCII digits is the
/// number; whatever follows it is ignored, so `"12abc"` and `"1.5"` give 12 and 1. Input
/// without leading digits, a negative value, or a value above [`crate::UINT16_MAX`] is a
/// [`RangeError`]. `"-0"` is 0.
pub fn parse_uint16(text: &str) -> Result<u16, RangeError> {
    let unsigned = text.trim_start();
    let (negative, unsigned) = match unsigned.as_bytes().first() {
        Some(b'-') => (true, &unsigned[1..]),
        Some(b'+') => (false, &unsigned[1..]),
        _ => (false, unsigned),
    };
    let digits = unsigned.bytes().take_while(u8::is_ascii_digit);

    let mut value: Option<u16> = None;
    for digit in digits {
        let acc = value.unwrap_or(0);
        value = Some(
            acc.checked_mul(10)
                .and_then(|acc| acc.checked_add(u16::from(digit - b'0')))
                .ok_or_else(|| RangeError::new(text))?,
        );
    }

    match value {
        Some(0) => Ok(0),
        Some(n) if !negative => Ok(n),
        _ => Err(RangeError::new(text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_the_whole_range() {
        assert_eq!(parse_uint16("0"), Ok(0));
        assert_eq!(parse_uint16("1"), Ok(1));
        assert_eq!(parse_uint16("007"), Ok(7));
        assert_eq!(parse_uint16("65535"), Ok(65535));
    }

    #[test]
    fn reads_the_leading_number() {
        assert_eq!(parse_uint16("12abc"), Ok(12));
        assert_eq!(parse_uint16(" 7"), Ok(7));
        assert_eq!(parse_uint16("\t\n7 "), Ok(7));
        assert_eq!(parse_uint16("+7"), Ok(7));
        assert_eq!(parse_uint16("1.5"), Ok(1));
        assert_eq!(parse_uint16("-0"), Ok(0));
        assert_eq!(parse_uint16("-0.9"), Ok(0));
        assert_eq!(parse_uint16("65535xyz"), Ok(65535));
    }

    #[test]
    fn rejects_out_of_range_and_garbage() {
        for text in [
            "65536",
            "99999",
            "18446744073709551616",
            "65536abc",
            "-1",
            "-65535",
            "",
            " ",
            "-",
            "+",
            "+-1",
            "abc",
            ".5",
            "a12",
        ] {
            let err = parse_uint16(text).unwrap_err();
            assert_eq!(err.input(), text);
            assert_eq!(err.to_string(), "Must be between 0 and 65535.");
        }
    }
}
