//! Tokenizer and serializer for the raw file grammar.
//!
//! A raw file is a header line followed by `(comment, token)` pairs and an
//! optional trailing comment:
//!
//! ```text
//! creature_standard\r\n
//! \r\n[OBJECT:CREATURE]\r\n\r\n[CREATURE:DOG]\r\n\t[NAME:dog:dogs:dog]
//! ```
//!
//! A token is `[` name (`:` field)* `]` where neither the name nor a field
//! contains `:` or `]`. Comments are whatever precedes the next token and are
//! matched lazily. [`parse`] and [`unparse`] are inverses: for any input,
//! `unparse(&parse(bytes))` equals `crlf(bytes)`.

use std::sync::LazyLock;

use regex::bytes::{Captures, Regex};

use crate::{
    domain::token::Token,
    storage::cp437::{self, EncodeError},
};

/// A comment followed by a token.
static CONTEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s-u)(.*?)(\[[^:\]]*(?::[^:\]]*)*\])").expect("context pattern is valid")
});

static LINE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u)\r?\n").expect("line end pattern is valid"));

/// The free text preceding a token, and the token itself.
///
/// Only the trailing text after the last token of a file has no token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    /// Free text (whitespace, prose, stray brackets) before the token.
    pub comment: String,
    /// The token, if the comment is followed by one.
    pub token: Option<Token>,
}

impl Context {
    /// Creates a context with a token.
    #[must_use]
    pub fn new(comment: impl Into<String>, token: Token) -> Self {
        Self {
            comment: comment.into(),
            token: Some(token),
        }
    }

    /// Creates a context holding only free text.
    #[must_use]
    pub fn trailing(comment: impl Into<String>) -> Self {
        Self {
            comment: comment.into(),
            token: None,
        }
    }

    /// The token name, or `""` if there is no token.
    #[must_use]
    pub fn token_name(&self) -> &str {
        self.token.as_ref().map_or("", Token::name)
    }

    /// Appends the comment and token text to `out`.
    pub fn write_to(&self, out: &mut String) {
        out.push_str(&self.comment);
        if let Some(token) = &self.token {
            out.push_str(&token.to_string());
        }
    }
}

/// The three parts of a raw file, as produced by [`parse`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRaw {
    /// The first line including its line terminator.
    pub header: String,
    /// The first token after the header, which should be `[OBJECT:<type>]`.
    pub declaration: Context,
    /// Every later `(comment, token)` pair, then the trailing text if any.
    pub contexts: Vec<Context>,
}

impl ParsedRaw {
    /// Whether the header names the file and the declaration is
    /// `[OBJECT:<type>]` with exactly one field.
    #[must_use]
    pub fn declaration_is_valid(&self) -> bool {
        self.declaration
            .token
            .as_ref()
            .is_some_and(|token| token.name() == "OBJECT" && token.args().len() == 1)
            && !self.header.trim().is_empty()
    }
}

/// Splits a raw file into its header, declaration and contexts.
///
/// Parsing never fails: bytes that do not form a token end up in a comment.
#[must_use]
pub fn parse(buf: &[u8]) -> ParsedRaw {
    let header_end = buf
        .iter()
        .position(|&b| b == b'\n')
        .map_or(0, |newline| newline + 1);
    let header = cp437::decode(&buf[..header_end]);

    let (declaration, mut cursor) = match CONTEXT.captures_at(buf, header_end) {
        Some(caps) => (context_from(&caps), caps.get_match().end()),
        None => (Context::default(), header_end),
    };

    let mut contexts = Vec::new();
    while let Some(caps) = CONTEXT.captures_at(buf, cursor) {
        contexts.push(context_from(&caps));
        cursor = caps.get_match().end();
    }

    if cursor < buf.len() {
        contexts.push(Context::trailing(cp437::decode(&buf[cursor..])));
    }

    ParsedRaw {
        header,
        declaration,
        contexts,
    }
}

fn context_from(caps: &Captures<'_>) -> Context {
    let comment = caps.get(1).map_or(&b""[..], |m| m.as_bytes());
    let token = caps.get(2).map_or(&b"[]"[..], |m| m.as_bytes());
    let inner = &token[1..token.len() - 1];
    Context::new(
        cp437::decode(comment),
        inner.split(|&b| b == b':').map(cp437::decode).collect(),
    )
}

/// Reassembles a parsed raw file into CP437 bytes with CRLF line endings.
///
/// # Errors
///
/// Returns [`EncodeError`] if a comment or field contains a character that
/// has no CP437 byte. This can only happen after the parsed text has been
/// edited.
pub fn unparse(raw: &ParsedRaw) -> Result<Vec<u8>, EncodeError> {
    let mut text = raw.header.clone();
    raw.declaration.write_to(&mut text);
    for context in &raw.contexts {
        context.write_to(&mut text);
    }
    encode(&text)
}

/// Encodes text as CP437 with CRLF line endings.
///
/// # Errors
///
/// Returns [`EncodeError`] for characters outside the code page.
pub fn encode(text: &str) -> Result<Vec<u8>, EncodeError> {
    cp437::encode(text).map(|bytes| crlf(&bytes))
}

/// Normalises every `\n` or `\r\n` to `\r\n`.
#[must_use]
pub fn crlf(bytes: &[u8]) -> Vec<u8> {
    LINE_END.replace_all(bytes, &b"\r\n"[..]).into_owned()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const DOG: &[u8] = b"creature_domestic\r\n\r\n[OBJECT:CREATURE]\r\n\r\n[CREATURE:DOG]\r\n\t[NAME:dog:dogs:dog]\r\n\t[CASTE_NAME:dog:dogs:dog]\r\n";

    fn names(raw: &ParsedRaw) -> Vec<&str> {
        raw.contexts.iter().map(Context::token_name).collect()
    }

    #[test]
    fn splits_header_declaration_and_tokens() {
        let raw = parse(DOG);

        assert_eq!(raw.header, "creature_domestic\r\n");
        assert_eq!(raw.declaration.comment, "\r\n");
        assert_eq!(
            raw.declaration.token.as_ref().map(Token::fields),
            Some(&["OBJECT".to_string(), "CREATURE".to_string()][..])
        );
        assert!(raw.declaration_is_valid());
        assert_eq!(names(&raw), ["CREATURE", "NAME", "CASTE_NAME", ""]);

        let name = raw.contexts[1].token.as_ref().unwrap();
        assert_eq!(name.args(), ["dog", "dogs", "dog"]);
        assert_eq!(raw.contexts[1].comment, "\r\n\t");
        assert_eq!(raw.contexts[3], Context::trailing("\r\n"));
    }

    #[test]
    fn unparse_reproduces_input() {
        assert_eq!(unparse(&parse(DOG)).unwrap(), DOG);
    }

    #[test]
    fn unparse_normalises_line_endings() {
        let unix = b"plant_crops\n[OBJECT:PLANT]\n[PLANT:WHEAT]\n";
        let expected = b"plant_crops\r\n[OBJECT:PLANT]\r\n[PLANT:WHEAT]\r\n";
        assert_eq!(unparse(&parse(unix)).unwrap(), expected);
    }

    #[test]
    fn comment_may_contain_stray_brackets_and_colons() {
        let raw = parse(b"name\n[OBJECT:ITEM]\nnote: see ] here\n[ITEM_TOY:ITEM_TOY_PUZZLEBOX]");
        assert_eq!(raw.contexts.len(), 1);
        assert_eq!(raw.contexts[0].comment, "\nnote: see ] here\n");
        assert_eq!(raw.contexts[0].token_name(), "ITEM_TOY");
    }

    #[test]
    fn unterminated_bracket_stays_in_trailing_comment() {
        let raw = parse(b"name\n[OBJECT:BODY]\n[BODY:BASIC_1PARTBODY\n");
        assert_eq!(raw.contexts.len(), 1);
        assert_eq!(raw.contexts[0], Context::trailing("\n[BODY:BASIC_1PARTBODY\n"));
    }

    #[test]
    fn missing_declaration_is_invalid() {
        let raw = parse(b"creature_x\n[OBJCET:CREATURE]\n[CREATURE:X]\n");
        assert!(!raw.declaration_is_valid());
        assert_eq!(raw.declaration.token_name(), "OBJCET");

        let raw = parse(b"just a header with no tokens\n");
        assert_eq!(raw.declaration, Context::default());
        assert!(!raw.declaration_is_valid());
        assert!(raw.contexts.is_empty());
    }

    #[test]
    fn declaration_with_extra_field_is_invalid() {
        let raw = parse(b"creature_x\n[OBJECT:CREATURE:PLANT]\n");
        assert!(!raw.declaration_is_valid());
    }

    #[test]
    fn blank_header_is_invalid() {
        let raw = parse(b"   \n[OBJECT:CREATURE]\n");
        assert!(!raw.declaration_is_valid());
    }

    #[test]
    fn buffer_without_newline_has_empty_header() {
        let raw = parse(b"[OBJECT:CREATURE][CREATURE:A]");
        assert_eq!(raw.header, "");
        assert_eq!(raw.declaration.token_name(), "OBJECT");
        assert_eq!(names(&raw), ["CREATURE"]);
    }

    #[test]
    fn declaration_only_round_trips() {
        let input = b"inorganic_none\r\n[OBJECT:INORGANIC]";
        let raw = parse(input);
        assert!(raw.contexts.is_empty());
        assert_eq!(unparse(&raw).unwrap(), input);
    }

    #[test]
    fn empty_fields_are_preserved() {
        let raw = parse(b"x\n[OBJECT:ENTITY]\n[TAG::b:]");
        let token = raw.contexts[0].token.as_ref().unwrap();
        assert_eq!(token.fields(), ["TAG", "", "b", ""]);
        assert_eq!(token.to_string(), "[TAG::b:]");
    }

    #[test]
    fn crlf_keeps_existing_pairs() {
        assert_eq!(crlf(b"a\nb\r\nc\r"), b"a\r\nb\r\nc\r");
    }

    fn text(pattern: &'static str) -> impl Strategy<Value = String> {
        proptest::string::string_regex(pattern).expect("strategy pattern is valid")
    }

    prop_compose! {
        fn token()(name in text("[A-Z_]{1,12}"), args in prop::collection::vec(text("[a-zA-Z0-9 _]{0,8}"), 0..4)) -> String {
            std::iter::once(name).chain(args).collect::<Vec<_>>().join(":")
        }
    }

    prop_compose! {
        fn raw_file()(
            name in text("[a-z_]{1,16}"),
            kind in text("[A-Z_]{1,12}"),
            body in prop::collection::vec((text("[ \t\r\na-z.]{0,10}"), token()), 0..20),
            tail in text("[ \t\r\na-z]{0,6}"),
        ) -> Vec<u8> {
            let mut out = format!("{name}\n[OBJECT:{kind}]");
            for (comment, token) in body {
                out.push_str(&comment);
                out.push('[');
                out.push_str(&token);
                out.push(']');
            }
            out.push_str(&tail);
            out.into_bytes()
        }
    }

    proptest! {
        #[test]
        fn round_trip_on_arbitrary_bytes(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
            prop_assert_eq!(unparse(&parse(&bytes)).unwrap(), crlf(&bytes));
        }

        #[test]
        fn round_trip_on_generated_files(bytes in raw_file()) {
            let raw = parse(&bytes);
            prop_assert!(raw.declaration.token.is_some());
            prop_assert_eq!(unparse(&raw).unwrap(), crlf(&bytes));
        }
    }
}
