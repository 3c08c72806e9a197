/*!
 * Content compaction for large files
 *
 * A compacted token is the gzip stream of the UTF-8 text, base64 encoded with
 * the standard alphabet, so it is always safe to embed as XML text.
 */

use std::io::{Read, Write};

use base64::{engine::general_purpose, Engine as _};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::Result;

/// Gzip the UTF-8 bytes of `text` and base64 the result.
pub fn compact(text: &str) -> Result<String> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes())?;
    let compressed = encoder.finish()?;

    Ok(general_purpose::STANDARD.encode(compressed))
}

/// Inverse of [`compact`].
pub fn expand(token: &str) -> Result<String> {
    let compressed = general_purpose::STANDARD.decode(token.trim())?;
    let mut decoder = GzDecoder::new(compressed.as_slice());
    let mut text = String::new();
    decoder.read_to_string(&mut text)?;

    Ok(text)
}

/// Whether content of this decoded byte length gets compacted.
pub fn should_compact(enabled: bool, threshold: usize, text_len: usize) -> bool {
    enabled && text_len > threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_roundtrip() {
        for input in [
            "",
            "Hello world! How are you doing today?",
            "ünïcødé ✓ — <tags> & \"quotes\" ]]>",
            &"line of text\n".repeat(500),
        ] {
            let token = compact(input).unwrap();
            assert_eq!(expand(&token).unwrap(), input);
        }
    }

    #[test]
    fn test_token_is_printable() {
        let token = compact(&"abc\0def\n".repeat(20)).unwrap();
        assert!(token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'='));
    }

    #[test]
    fn test_repetitive_text_shrinks() {
        let input = "x".repeat(10_000);
        assert!(compact(&input).unwrap().len() < input.len());
    }

    #[test]
    fn test_expand_rejects_garbage() {
        assert!(expand("not base64 at all!").is_err());
        // valid base64 but not gzip
        assert!(expand("aGVsbG8=").is_err());
    }

    #[test]
    fn test_threshold_is_exclusive() {
        assert!(!should_compact(true, 1024, 1024));
        assert!(should_compact(true, 1024, 1025));
        assert!(!should_compact(false, 1024, 4096));
    }
}
