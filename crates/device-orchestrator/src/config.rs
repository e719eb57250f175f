//! The `k1=v1;k2=v2` configuration surface. Intentionally a small
//! hand-rolled parser rather than a crate: the format is one level of
//! key-value pairs with no nesting or quoting.

use anyhow::{bail, Result};

pub fn parse_pairs(input: &str) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    for segment in input.split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let Some((key, value)) = segment.split_once('=') else {
            bail!("malformed config segment (expected k=v): {segment}");
        };
        pairs.push((key.trim().to_string(), value.trim().to_string()));
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiple_pairs() {
        let pairs = parse_pairs("card=1;hfp_enable=true").unwrap();
        assert_eq!(
            pairs,
            vec![
                ("card".to_string(), "1".to_string()),
                ("hfp_enable".to_string(), "true".to_string()),
            ]
        );
    }

    #[test]
    fn ignores_trailing_semicolons_and_blank_segments() {
        let pairs = parse_pairs("card=1;;").unwrap();
        assert_eq!(pairs, vec![("card".to_string(), "1".to_string())]);
    }

    #[test]
    fn rejects_a_segment_with_no_equals_sign() {
        assert!(parse_pairs("card").is_err());
    }
}
