//! Header serialization and validation.

use crate::error::ParseError;

/// Owned `(name, value)` pairs in lexicographic name order.
///
/// The sort is stable, so repeated names keep their relative order.
pub fn sorted_headers<I, K, V>(headers: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs: Vec<(String, String)> = headers
        .into_iter()
        .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    pairs
}

/// Render `name: value\r\n` per header, in lexicographic name order.
pub fn format_headers<I, K, V>(headers: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    sorted_headers(headers)
        .into_iter()
        .map(|(name, value)| format!("{name}: {value}\r\n"))
        .collect()
}

/// Reject names that are not RFC 9110 tokens and values holding control
/// bytes other than horizontal tab.
pub fn validate_header(name: &str, value: &str) -> Result<(), ParseError> {
    let name_ok = !name.is_empty() && name.bytes().all(is_token_byte);
    let value_ok = !value.bytes().any(is_control_byte);
    if name_ok && value_ok {
        Ok(())
    } else {
        Err(ParseError::InvalidHeader(name.to_string()))
    }
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

fn is_control_byte(b: u8) -> bool {
    (b < 0x20 && b != b'\t') || b == 0x7f
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn headers_are_crlf_terminated_and_sorted() {
        let headers = HashMap::from([
            ("X-Trace".to_string(), "abc".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ]);
        assert_eq!(
            format_headers(&headers),
            "Accept: application/json\r\nX-Trace: abc\r\n"
        );
    }

    #[test]
    fn empty_headers_format_to_nothing() {
        let headers: Vec<(String, String)> = Vec::new();
        assert_eq!(format_headers(headers), "");
    }

    #[test]
    fn sorting_keeps_repeated_names_in_order() {
        let headers = vec![("b", "1"), ("a", "x"), ("b", "2")];
        assert_eq!(
            sorted_headers(headers),
            vec![
                ("a".to_string(), "x".to_string()),
                ("b".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn validation_rejects_injection() {
        assert!(validate_header("Content-Type", "text/plain").is_ok());
        assert!(validate_header("X-Empty", "").is_ok());
        assert!(validate_header("", "v").is_err());
        assert!(validate_header("Bad Name", "v").is_err());
        assert!(validate_header("Host:", "v").is_err());
        assert_eq!(
            validate_header("X-Evil", "a\r\nInjected: 1"),
            Err(ParseError::InvalidHeader("X-Evil".to_string()))
        );
    }

    #[test]
    fn validation_rejects_control_bytes_in_values() {
        for value in ["a\x01b", "a\x1fb", "a\x7fb", "\x00"] {
            assert_eq!(
                validate_header("X-A", value),
                Err(ParseError::InvalidHeader("X-A".to_string())),
                "{value:?}"
            );
        }
        assert!(validate_header("X-A", "a\tb").is_ok());
        assert!(validate_header("X-A", "caf\u{e9}").is_ok());
    }
}
