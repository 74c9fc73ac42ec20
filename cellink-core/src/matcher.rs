//! Ordered multi-token search over an accumulating byte buffer.
//!
//! The executor's success predicate and the framer's marker location both
//! reduce to the same question: do these tokens appear in this buffer, in
//! this order, and where does the last one end? Each token is searched
//! starting immediately past the previous token's match.

/// Find `tokens` in order inside `haystack`.
///
/// Returns the position just past the final token's match, or `None` if
/// any token is missing. An empty token list trivially matches at 0.
pub fn find_in_order<S: AsRef<[u8]>>(haystack: &[u8], tokens: &[S]) -> Option<usize> {
    let mut pos = 0;
    for token in tokens {
        let token = token.as_ref();
        let found = find_from(haystack, pos, token)?;
        pos = found + token.len();
    }
    Some(pos)
}

/// Find the first of `tokens` present anywhere in `haystack`.
///
/// Returns the position just past that token's match.
pub fn find_any<S: AsRef<[u8]>>(haystack: &[u8], tokens: &[S]) -> Option<usize> {
    tokens
        .iter()
        .filter_map(|t| find_from(haystack, 0, t.as_ref()).map(|i| i + t.as_ref().len()))
        .min()
}

/// Whether `token` occurs anywhere in `haystack`.
pub fn contains(haystack: &[u8], token: &[u8]) -> bool {
    find_from(haystack, 0, token).is_some()
}

/// First occurrence of `needle` in `haystack[from..]`, as an index into
/// the full haystack.
pub fn find_from(haystack: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(from.min(haystack.len()));
    }
    if from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| from + i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_tokens_in_order() {
        let buf = b"AT+CPIN?\r\n+CPIN: READY\r\n\r\nOK\r\n";
        let end = find_in_order(buf, &["+CPIN: READY", "OK"]).unwrap();
        assert_eq!(&buf[end - 2..end], b"OK");
    }

    #[test]
    fn order_matters() {
        let buf = b"OK first, READY later";
        assert!(find_in_order(buf, &["OK", "READY"]).is_some());
        assert!(find_in_order(buf, &["READY", "OK"]).is_none());
    }

    #[test]
    fn missing_token_is_none() {
        assert!(find_in_order(b"AT\r\nOK\r\n", &["CONNECT OK"]).is_none());
    }

    #[test]
    fn repeated_token_consumes_distinct_occurrences() {
        // Both tokens are "OK"; the second search must start past the first.
        assert!(find_in_order(b"OK OK", &["OK", "OK"]).is_some());
        assert!(find_in_order(b"OK", &["OK", "OK"]).is_none());
    }

    #[test]
    fn end_position_is_past_last_token() {
        let buf = b"SEND OK\r\ntrailing";
        let end = find_in_order(buf, &["SEND OK"]).unwrap();
        assert_eq!(end, 7);
        assert_eq!(&buf[end..], b"\r\ntrailing");
    }

    #[test]
    fn empty_token_list_matches_at_zero() {
        let tokens: &[&str] = &[];
        assert_eq!(find_in_order(b"anything", tokens), Some(0));
    }

    #[test]
    fn find_any_picks_earliest_match() {
        let buf = b"ALREADY CONNECT\r\n";
        let end = find_any(buf, &["CONNECT OK", "ALREADY CONNECT"]).unwrap();
        assert_eq!(end, 15);
        assert!(find_any(buf, &["SHUT OK", "CLOSE OK"]).is_none());
    }

    #[test]
    fn contains_simple() {
        assert!(contains(b"xxERRORxx", b"ERROR"));
        assert!(!contains(b"ERR", b"ERROR"));
    }
}
