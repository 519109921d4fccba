//! Operator argument parsing
//!
//! A JSON array of strings is taken verbatim. Anything else is tokenized
//! on whitespace with paired single or double quotes grouping; quote
//! characters are consumed up to their match, escape sequences and mixed
//! quote styles are not interpreted.

/// Parse an argument string into a normalized argument vector.
pub fn parse_args(args: &str) -> Vec<String> {
    if let Ok(array) = serde_json::from_str::<Vec<String>>(args) {
        return array;
    }

    let mut result = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quote_char = '\0';

    for c in args.chars() {
        match c {
            ' ' | '\t' => {
                if in_quotes {
                    current.push(c);
                } else if !current.is_empty() {
                    result.push(std::mem::take(&mut current));
                }
            }
            '"' | '\'' => {
                if in_quotes && c == quote_char {
                    in_quotes = false;
                } else if !in_quotes {
                    in_quotes = true;
                    quote_char = c;
                } else {
                    current.push(c);
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        result.push(current);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_array_passes_through_unchanged() {
        let input = r#"["one", "two words", ""]"#;
        assert_eq!(parse_args(input), vec!["one", "two words", ""]);
    }

    #[test]
    fn test_plain_whitespace_split() {
        assert_eq!(parse_args("a b\tc"), vec!["a", "b", "c"]);
        assert_eq!(parse_args("  a   b  "), vec!["a", "b"]);
    }

    #[test]
    fn test_double_quotes_group_words() {
        assert_eq!(parse_args(r#"a "b c" d"#), vec!["a", "b c", "d"]);
    }

    #[test]
    fn test_single_quotes_group_words() {
        assert_eq!(parse_args("a 'b c' d"), vec!["a", "b c", "d"]);
    }

    #[test]
    fn test_other_quote_kind_is_literal_inside_quotes() {
        assert_eq!(parse_args(r#""it's fine""#), vec!["it's fine"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_args("").is_empty());
        assert!(parse_args("   ").is_empty());
    }

    #[test]
    fn test_json_array_of_non_strings_falls_back_to_lexer() {
        assert_eq!(parse_args("[1, 2]"), vec!["[1,", "2]"]);
    }
}
