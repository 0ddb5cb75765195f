//! Enhanced argument parsing for CLI arguments that support both multiple flags and comma-separated values

/// Parse a vector of strings that may contain comma-separated values
///
/// Splits comma-separated values, trims whitespace, and drops empty items.
///
/// # Examples
///
/// ```
/// use devscore::cli::enhanced_parser::parse_comma_separated;
///
/// // Multiple flags: --alias a=b --alias c=d
/// let input = vec!["a=b".to_string(), "c=d".to_string()];
/// assert_eq!(parse_comma_separated(input), vec!["a=b", "c=d"]);
///
/// // Comma-separated: --alias "a=b,c=d"
/// let input = vec!["a=b, c=d".to_string()];
/// assert_eq!(parse_comma_separated(input), vec!["a=b", "c=d"]);
/// ```
pub fn parse_comma_separated(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .flat_map(|item| {
            item.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<String>>()
        })
        .collect()
}

/// Parse `OLD=NEW` identity alias pairs
pub fn parse_alias_pairs(values: &[String]) -> Result<Vec<(String, String)>, String> {
    values
        .iter()
        .map(|value| match value.split_once('=') {
            Some((alias, canonical)) if !alias.trim().is_empty() && !canonical.trim().is_empty() => {
                Ok((alias.trim().to_lowercase(), canonical.trim().to_lowercase()))
            }
            _ => Err(format!("Invalid alias '{}'. Expected OLD_EMAIL=NEW_EMAIL", value)),
        })
        .collect()
}

/// Apply enhanced parsing to CLI arguments that support comma-separated values
pub struct EnhancedParser;

impl EnhancedParser {
    /// Parse stage name arguments
    pub fn parse_stages(stages: Vec<String>) -> Vec<String> {
        parse_comma_separated(stages)
    }

    /// Parse `--alias` arguments
    pub fn parse_aliases(aliases: Vec<String>) -> Vec<String> {
        parse_comma_separated(aliases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_comma_separated_mixed() {
        let input = vec!["merge,analyze".to_string(), "score".to_string()];
        assert_eq!(parse_comma_separated(input), vec!["merge", "analyze", "score"]);
    }

    #[test]
    fn test_parse_comma_separated_empty_values() {
        let input = vec!["merge,,score".to_string(), "".to_string(), " , ".to_string()];
        assert_eq!(parse_comma_separated(input), vec!["merge", "score"]);
    }

    #[test]
    fn test_parse_alias_pairs() {
        let pairs = parse_alias_pairs(&["Old@Example.com = alice@example.com".to_string()]).unwrap();
        assert_eq!(pairs, vec![("old@example.com".to_string(), "alice@example.com".to_string())]);

        assert!(parse_alias_pairs(&["alice@example.com".to_string()]).is_err());
        assert!(parse_alias_pairs(&["=alice@example.com".to_string()]).is_err());
    }

    #[test]
    fn test_enhanced_parser_aliases() {
        let input = vec!["a@x.io=b@x.io,c@x.io=b@x.io".to_string()];
        assert_eq!(EnhancedParser::parse_aliases(input), vec!["a@x.io=b@x.io", "c@x.io=b@x.io"]);
    }
}
