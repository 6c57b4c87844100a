//! Query string encoding.
//!
//! Keys and values are percent-encoded independently. Pairs are emitted in
//! byte-lexicographic key order so the same mapping always produces the same
//! wire bytes, whatever map type the caller used.

/// Percent-encode everything outside `[A-Za-z0-9-_.~]`, using uppercase hex.
pub fn percent_encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char);
            }
            _ => {
                encoded.push('%');
                encoded.push(hex_digit(byte >> 4));
                encoded.push(hex_digit(byte & 0x0f));
            }
        }
    }
    encoded
}

fn hex_digit(nibble: u8) -> char {
    char::from(b"0123456789ABCDEF"[usize::from(nibble)])
}

/// Build `k1=v1&k2=v2` from a key/value mapping, sorted by key.
///
/// Returns an empty string for an empty mapping; the caller then omits `?`.
pub fn encode_query<I, K, V>(params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs: Vec<(K, V)> = params.into_iter().collect();
    pairs.sort_by(|a, b| a.0.as_ref().cmp(b.0.as_ref()));

    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k.as_ref()), percent_encode(v.as_ref())))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn percent_decode(s: &str) -> String {
        let bytes = s.as_bytes();
        let mut out = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'%' {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap();
                out.push(u8::from_str_radix(hex, 16).unwrap());
                i += 3;
            } else {
                out.push(bytes[i]);
                i += 1;
            }
        }
        String::from_utf8(out).unwrap()
    }

    fn decode_query(query: &str) -> HashMap<String, String> {
        query
            .split('&')
            .map(|pair| {
                let (k, v) = pair.split_once('=').unwrap();
                (percent_decode(k), percent_decode(v))
            })
            .collect()
    }

    #[test]
    fn unreserved_characters_pass_through() {
        assert_eq!(percent_encode("AZaz09-_.~"), "AZaz09-_.~");
    }

    #[test]
    fn reserved_characters_are_escaped_uppercase() {
        assert_eq!(percent_encode("a b"), "a%20b");
        assert_eq!(percent_encode("a&b=c"), "a%26b%3Dc");
        assert_eq!(percent_encode("/?#"), "%2F%3F%23");
        assert_eq!(percent_encode("é"), "%C3%A9");
    }

    #[test]
    fn pairs_are_sorted_by_key() {
        let params = HashMap::from([
            ("q".to_string(), "a b".to_string()),
            ("id".to_string(), "42".to_string()),
        ]);
        assert_eq!(encode_query(&params), "id=42&q=a%20b");
    }

    #[test]
    fn empty_mapping_encodes_to_empty_string() {
        let params: HashMap<String, String> = HashMap::new();
        assert_eq!(encode_query(&params), "");
    }

    #[test]
    fn encoding_is_deterministic() {
        let params: HashMap<String, String> = (0..32)
            .map(|i| (format!("key{i}"), format!("value {i}")))
            .collect();
        assert_eq!(encode_query(&params), encode_query(&params.clone()));
    }

    #[test]
    fn output_decodes_back_to_input() {
        let params = HashMap::from([
            ("name".to_string(), "Zoë & Ålfred".to_string()),
            ("expr".to_string(), "a=b&c=d".to_string()),
            ("empty".to_string(), String::new()),
            ("spaced key".to_string(), "日本語".to_string()),
        ]);
        assert_eq!(decode_query(&encode_query(&params)), params);
    }
}
