//! Composite identifier encoding and decoding.
//!
//! AppTrust entities are addressed by colon-joined identifiers such as
//! `my-app:1.0.0:QA` or `my-app:maven:com.example:lib:1.2.3`. At most one
//! segment (by convention a package name) may itself contain the delimiter,
//! so decoding peels a fixed number of segments off each end and keeps the
//! middle span verbatim.
//!
//! Empty tokens produced by consecutive delimiters, or by a delimiter at either
//! end of the string, are dropped before the split. Identifiers written by
//! earlier releases rely on that, so `encode(decode(s))` only equals `s` when
//! `s` has no empty segments.
//!
//! # Example
//!
//! ```
//! use apptrust_provider::identifier::{decode, encode};
//!
//! let id = decode("app-1:maven:com.example:lib:1.2.3", 2, 1).unwrap();
//! assert_eq!(id.prefix, vec!["app-1", "maven"]);
//! assert_eq!(id.middle, "com.example:lib");
//! assert_eq!(id.suffix, vec!["1.2.3"]);
//!
//! assert_eq!(encode(&["app-1", "1.0.0", "QA"]), "app-1:1.0.0:QA");
//! ```

use crate::error::ProviderError;

/// Separator between identifier segments.
pub const DELIMITER: char = ':';

/// A decoded composite identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedId {
    /// Fixed leading segments.
    pub prefix: Vec<String>,
    /// Everything between prefix and suffix, rejoined with the delimiter.
    pub middle: String,
    /// Fixed trailing segments.
    pub suffix: Vec<String>,
}

/// Join segments with the delimiter. No escaping is performed.
pub fn encode<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(":")
}

/// Split an identifier into `prefix_count` leading segments, `suffix_count`
/// trailing segments and the (possibly empty) middle between them.
///
/// Fails with [`ProviderError::MalformedIdentifier`] when there are fewer than
/// `prefix_count + suffix_count` non-empty segments.
pub fn decode(s: &str, prefix_count: usize, suffix_count: usize) -> Result<DecodedId, ProviderError> {
    let segments = split_segments(s);
    if segments.len() < prefix_count + suffix_count {
        return Err(ProviderError::MalformedIdentifier(format!(
            "'{}' has {} segment(s), expected at least {}",
            s,
            segments.len(),
            prefix_count + suffix_count
        )));
    }

    let middle_end = segments.len() - suffix_count;
    Ok(DecodedId {
        prefix: segments[..prefix_count].iter().map(|s| s.to_string()).collect(),
        middle: segments[prefix_count..middle_end].join(":"),
        suffix: segments[middle_end..].iter().map(|s| s.to_string()).collect(),
    })
}

/// Decode an identifier that must consist of exactly `count` segments.
pub fn decode_exact(s: &str, count: usize) -> Result<Vec<String>, ProviderError> {
    let decoded = decode(s, count, 0)?;
    if !decoded.middle.is_empty() {
        return Err(ProviderError::MalformedIdentifier(format!(
            "'{}' has more than {} segment(s)",
            s, count
        )));
    }
    Ok(decoded.prefix)
}

fn split_segments(s: &str) -> Vec<&str> {
    s.split(DELIMITER).filter(|seg| !seg.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        assert_eq!(encode(&["app"]), "app");
        assert_eq!(encode(&["x", "a:b", "y"]), "x:a:b:y");
        assert_eq!(encode::<&str>(&[]), "");
    }

    #[test]
    fn test_decode_middle_may_contain_delimiter() {
        let id = decode("x:a:b:y", 1, 1).unwrap();
        assert_eq!(id.prefix, vec!["x"]);
        assert_eq!(id.middle, "a:b");
        assert_eq!(id.suffix, vec!["y"]);
    }

    #[test]
    fn test_decode_package_coordinates() {
        let id = decode("app-1:maven:com.example:lib:1.2.3", 1, 1).unwrap();
        assert_eq!(id.prefix, vec!["app-1"]);
        assert_eq!(id.middle, "maven:com.example:lib");
        assert_eq!(id.suffix, vec!["1.2.3"]);
    }

    #[test]
    fn test_decode_empty_middle() {
        let id = decode("app:1.0.0", 1, 1).unwrap();
        assert_eq!(id.middle, "");
        assert_eq!(id.prefix, vec!["app"]);
        assert_eq!(id.suffix, vec!["1.0.0"]);
    }

    #[test]
    fn test_decode_too_few_segments() {
        let err = decode("app", 1, 1).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedIdentifier(_)));
        assert!(decode("", 1, 0).is_err());
    }

    #[test]
    fn test_decode_drops_empty_tokens() {
        let id = decode(":app::1.0.0:", 1, 1).unwrap();
        assert_eq!(id.prefix, vec!["app"]);
        assert_eq!(id.middle, "");
        assert_eq!(id.suffix, vec!["1.0.0"]);

        // lossy on purpose: the empty token between `a` and `b` is gone
        let id = decode("x:a::b:y", 1, 1).unwrap();
        assert_eq!(id.middle, "a:b");
    }

    #[test]
    fn test_decode_exact() {
        assert_eq!(
            decode_exact("app:1.0.0:QA", 3).unwrap(),
            vec!["app", "1.0.0", "QA"]
        );
        assert!(decode_exact("app:1.0.0", 3).is_err());
        assert!(decode_exact("app:1.0.0:QA:extra", 3).is_err());
    }

    #[test]
    fn test_round_trip_without_empty_segments() {
        let original = "app-1:npm:@scope:pkg:2.0.0";
        let id = decode(original, 2, 1).unwrap();
        let mut parts = id.prefix.clone();
        parts.push(id.middle.clone());
        parts.extend(id.suffix.clone());
        assert_eq!(encode(&parts), original);
    }
}
