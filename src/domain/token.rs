//! Bracketed tokens, the smallest unit of a raw file.

use std::fmt;

/// One bracketed unit of a raw file, e.g. `[BODY:QUADRUPED:TAIL]`.
///
/// The token is stored as its colon-separated fields. Field 0 is the token
/// name and the remaining fields are its arguments. The bracketed text is
/// always rebuilt from the fields, so rewriting a field rewrites the text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    fields: Vec<String>,
}

impl Token {
    /// Creates a token from its fields, name first.
    ///
    /// An empty field list is treated as a token with an empty name (`[]`).
    #[must_use]
    pub fn new(fields: Vec<String>) -> Self {
        if fields.is_empty() {
            Self {
                fields: vec![String::new()],
            }
        } else {
            Self { fields }
        }
    }

    /// The token name (field 0).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.fields[0]
    }

    /// The arguments following the name.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.fields[1..]
    }

    /// All fields, including the name at position 0.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Returns `true` if `value` is the name or one of the arguments.
    #[must_use]
    pub fn has_field(&self, value: &str) -> bool {
        self.fields.iter().any(|field| field == value)
    }

    /// Replaces the field at `index`, returning the previous value.
    ///
    /// Returns `None` and leaves the token untouched if `index` is out of
    /// range.
    pub fn set_field(&mut self, index: usize, value: String) -> Option<String> {
        self.fields
            .get_mut(index)
            .map(|field| std::mem::replace(field, value))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.fields.join(":"))
    }
}

impl<S: Into<String>> FromIterator<S> for Token {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_rebuilt_from_fields() {
        let token: Token = ["BODY", "QUADRUPED", "TAIL"].into_iter().collect();
        assert_eq!(token.to_string(), "[BODY:QUADRUPED:TAIL]");
        assert_eq!(token.name(), "BODY");
        assert_eq!(token.args(), ["QUADRUPED", "TAIL"]);
    }

    #[test]
    fn empty_token_has_empty_name() {
        let token = Token::new(Vec::new());
        assert_eq!(token.name(), "");
        assert!(token.args().is_empty());
        assert_eq!(token.to_string(), "[]");
    }

    #[test]
    fn set_field_rewrites_text() {
        let mut token: Token = ["CREATURE", "DOG"].into_iter().collect();
        let previous = token.set_field(1, "WOLF".to_string());

        assert_eq!(previous.as_deref(), Some("DOG"));
        assert_eq!(token.to_string(), "[CREATURE:WOLF]");
        assert_eq!(token.set_field(5, "X".to_string()), None);
    }
}
