//! `application/x-www-form-urlencoded` at the byte level.
//!
//! Query values are not required to be UTF-8. Decoding to `String` would
//! replace stray bytes with U+FFFD and the backend would receive something
//! the caller never sent, so pairs stay as raw bytes from parse to
//! serialisation.

use percent_encoding::percent_decode;
use url::form_urlencoded;

/// Splits `input` on `&` and the first `=` of each segment, decoding `+` and
/// percent escapes. Empty segments are skipped.
pub(crate) fn parse(input: &[u8]) -> impl Iterator<Item = (Vec<u8>, Vec<u8>)> + '_ {
    input
        .split(|&b| b == b'&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.iter().position(|&b| b == b'=') {
            Some(eq) => (decode(&segment[..eq]), decode(&segment[eq + 1..])),
            None => (decode(segment), Vec::new()),
        })
}

/// Encodes pairs in the order given.
pub(crate) fn serialize<'a>(pairs: impl IntoIterator<Item = (&'a [u8], &'a [u8])>) -> String {
    let mut out = String::new();
    for (key, value) in pairs {
        if !out.is_empty() {
            out.push('&');
        }
        out.extend(form_urlencoded::byte_serialize(key));
        out.push('=');
        out.extend(form_urlencoded::byte_serialize(value));
    }
    out
}

fn decode(component: &[u8]) -> Vec<u8> {
    let spaced: Vec<u8> = component
        .iter()
        .map(|&b| if b == b'+' { b' ' } else { b })
        .collect();
    percent_decode(&spaced).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_non_utf8_bytes() {
        let pairs: Vec<_> = parse(b"sig=%FF%FE&q=a+b").collect();
        assert_eq!(pairs[0], (b"sig".to_vec(), vec![0xFF, 0xFE]));
        assert_eq!(pairs[1], (b"q".to_vec(), b"a b".to_vec()));

        let encoded = serialize(pairs.iter().map(|(k, v)| (k.as_slice(), v.as_slice())));
        assert_eq!(encoded, "sig=%FF%FE&q=a+b");
    }

    #[test]
    fn segment_without_equals_has_empty_value() {
        let pairs: Vec<_> = parse(b"flag&&x=").collect();
        assert_eq!(pairs, [(b"flag".to_vec(), Vec::new()), (b"x".to_vec(), Vec::new())]);
    }
}
