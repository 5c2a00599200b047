//! RFC 6901 JSON Pointer token transforms shared by the scanner and the
//! evaluation engine's `JSONPath` type.
use std::borrow::Cow;

/// Encodes one reference token for use inside a JSON Pointer string:
/// `~` → `~0`, `/` → `~1`. Order matters — encoding `~` first would
/// double-escape the `~` introduced while encoding `/`.
pub fn encode_token(token: &str) -> Cow<'_, str> {
    if !token.contains('~') && !token.contains('/') {
        return Cow::Borrowed(token);
    }
    let mut buffer = String::with_capacity(token.len() + 2);
    for ch in token.chars() {
        match ch {
            '~' => buffer.push_str("~0"),
            '/' => buffer.push_str("~1"),
            _ => buffer.push(ch),
        }
    }
    Cow::Owned(buffer)
}

/// Decodes one reference token from a JSON Pointer string: `~1` → `/`,
/// `~0` → `~`. A single pass so that `~01` decodes to the literal `~1`
/// (first the `~0` is consumed into `~`, then the following `1` is left
/// untouched), matching RFC 6901 §4's decoding algorithm.
///
/// Heavily inspired by the single-pass unescape used by other Rust JSON
/// Pointer implementations (e.g. `boon`): search once for the first `~`,
/// then decode the rest in one linear pass instead of two separate
/// `.replace` calls.
pub fn decode_token(mut segment: &str) -> Cow<'_, str> {
    let Some(mut tilde_idx) = segment.find('~') else {
        return Cow::Borrowed(segment);
    };
    let mut buffer = String::with_capacity(segment.len());
    loop {
        let (before, after) = segment.split_at(tilde_idx);
        buffer.push_str(before);
        segment = &after[1..];
        let next_char_size = match segment.chars().next() {
            Some('1') => {
                buffer.push('/');
                1
            }
            Some('0') => {
                buffer.push('~');
                1
            }
            Some(next) => {
                buffer.push('~');
                buffer.push(next);
                next.len_utf8()
            }
            None => {
                buffer.push('~');
                break;
            }
        };
        segment = &segment[next_char_size..];
        let Some(next_tilde_idx) = segment.find('~') else {
            buffer.push_str(segment);
            break;
        };
        tilde_idx = next_tilde_idx;
    }
    Cow::Owned(buffer)
}

/// Splits a JSON Pointer string (without its leading `#`, if any) into
/// decoded tokens. An empty string yields no tokens (the root).
pub fn split_pointer(pointer: &str) -> Vec<String> {
    if pointer.is_empty() {
        return Vec::new();
    }
    let pointer = pointer.strip_prefix('/').unwrap_or(pointer);
    pointer
        .split('/')
        .map(|segment| decode_token(segment).into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("abc", "abc")]
    #[test_case("a~0b", "a~b")]
    #[test_case("a~1b", "a/b")]
    #[test_case("~01", "~1")]
    #[test_case("~10", "/0")]
    #[test_case("", "")]
    fn unescape_equivalence(input: &str, expected: &str) {
        assert_eq!(decode_token(input), expected);
        assert_eq!(decode_token(input), input.replace("~1", "/").replace("~0", "~"));
    }

    #[test]
    fn round_trips_through_encode_decode() {
        let token = "a/b~c";
        assert_eq!(decode_token(&encode_token(token)), token);
    }

    #[test]
    fn split_pointer_decodes_each_segment() {
        assert_eq!(split_pointer("/a~1b/c"), vec!["a/b".to_string(), "c".to_string()]);
        assert_eq!(split_pointer(""), Vec::<String>::new());
    }
}
