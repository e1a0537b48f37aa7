//! Identifier quoting.
//!
//! Identifier quoting is the only dialect difference LessQL knows about.

use serde::Deserialize;

/// Delimiter wrapped around identifiers (table and column names).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    /// MySQL and SQLite style: `` `name` ``
    #[default]
    Backtick,
    /// ANSI and PostgreSQL style: `"name"`
    DoubleQuote,
    /// Identifiers are emitted as given
    None,
}

impl Delimiter {
    /// The delimiter character, if any.
    pub const fn as_char(self) -> Option<char> {
        match self {
            Delimiter::Backtick => Some('`'),
            Delimiter::DoubleQuote => Some('"'),
            Delimiter::None => None,
        }
    }

    /// Quote an identifier.
    ///
    /// Dotted names are quoted part by part (`post.id` becomes
    /// `` `post`.`id` ``). Embedded delimiter characters are doubled.
    pub fn quote_identifier(self, name: &str) -> String {
        let Some(d) = self.as_char() else {
            return name.to_string();
        };
        let doubled: String = [d, d].iter().collect();
        name.split('.')
            .map(|part| format!("{d}{}{d}", part.replace(d, &doubled)))
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier_backtick() {
        assert_eq!(Delimiter::Backtick.quote_identifier("post"), "`post`");
        assert_eq!(
            Delimiter::Backtick.quote_identifier("post.author_id"),
            "`post`.`author_id`"
        );
        assert_eq!(
            Delimiter::Backtick.quote_identifier("with`backtick"),
            "`with``backtick`"
        );
    }

    #[test]
    fn test_quote_identifier_double_quote() {
        assert_eq!(Delimiter::DoubleQuote.quote_identifier("simple"), "\"simple\"");
        assert_eq!(
            Delimiter::DoubleQuote.quote_identifier("with\"quote"),
            "\"with\"\"quote\""
        );
    }

    #[test]
    fn test_quote_identifier_none() {
        assert_eq!(Delimiter::None.quote_identifier("a.b"), "a.b");
    }

    #[test]
    fn test_delimiter_from_config() {
        let d: Delimiter = serde_json::from_str("\"double_quote\"").unwrap();
        assert_eq!(d, Delimiter::DoubleQuote);
    }
}
