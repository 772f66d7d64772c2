//! A single identified record within a raw file.
//!
//! A record starts at a token such as `[CREATURE:DOG]` and owns every
//! following token up to the next record-starting token.

use std::collections::HashMap;

use crate::{domain::token::Token, storage::codec::Context};

/// A token belonging to a record, with the free text that precedes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Free text before the token.
    pub comment: String,
    /// The token.
    pub token: Token,
}

/// A record: an identity token plus the tags that follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    slot: usize,
    head: Context,
    tags: Vec<Tag>,
    by_name: HashMap<String, Vec<usize>>,
    trailing: String,
}

impl Record {
    /// Builds a record from a run of contexts.
    ///
    /// The first context is the identity token. A context without a token
    /// (the trailing text of a file) is kept as trailing text so the record
    /// serializes back to exactly what it was parsed from. The shape of the
    /// identity token is checked by [`Namespace::reindex`].
    ///
    /// [`Namespace::reindex`]: crate::domain::Namespace::reindex
    pub(crate) fn new(slot: usize, run: Vec<Context>) -> Self {
        let mut contexts = run.into_iter();
        let head = contexts.next().unwrap_or_default();

        let mut record = Self {
            slot,
            head,
            tags: Vec::new(),
            by_name: HashMap::new(),
            trailing: String::new(),
        };

        for context in contexts {
            match context.token {
                Some(token) => record.push(context.comment, token),
                None => record.trailing.push_str(&context.comment),
            }
        }
        record
    }

    fn push(&mut self, comment: String, token: Token) {
        self.by_name
            .entry(token.name().to_string())
            .or_default()
            .push(self.tags.len());
        self.tags.push(Tag { comment, token });
    }

    /// Position of this record within its namespace.
    #[must_use]
    pub const fn slot(&self) -> usize {
        self.slot
    }

    /// The name of the identity token, e.g. `CREATURE` or `ITEM_WEAPON`.
    #[must_use]
    pub fn subtype(&self) -> &str {
        self.head.token_name()
    }

    /// The identifier: the first field after the subtype, or `""` if there
    /// is none.
    #[must_use]
    pub fn identifier(&self) -> &str {
        self.head
            .token
            .as_ref()
            .and_then(|token| token.args().first())
            .map_or("", String::as_str)
    }

    /// Every field of the identity token after the subtype.
    ///
    /// A well-formed record has exactly one.
    #[must_use]
    pub fn identifying_fields(&self) -> &[String] {
        self.head.token.as_ref().map_or(&[][..], Token::args)
    }

    /// The identity token.
    #[must_use]
    pub const fn head(&self) -> &Context {
        &self.head
    }

    /// The field list (name first) of the tag at `position`.
    #[must_use]
    pub fn tag(&self, position: usize) -> Option<&[String]> {
        self.tags.get(position).map(|tag| tag.token.fields())
    }

    /// The field lists of every tag called `name`, in file order.
    #[must_use]
    pub fn tags_named(&self, name: &str) -> Vec<&[String]> {
        self.by_name.get(name).map_or_else(Vec::new, |positions| {
            positions
                .iter()
                .map(|&position| self.tags[position].token.fields())
                .collect()
        })
    }

    /// Returns `true` if the record has at least one tag called `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Iterates over the tags in file order.
    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    /// The number of tags, not counting the identity token.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Returns `true` if the record has no tags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Replaces the identifier, returning the previous one.
    ///
    /// The caller is responsible for keeping identifiers unique; the
    /// namespace and index maps are not updated.
    pub fn set_identifier(&mut self, identifier: String) -> Option<String> {
        let token = self.head.token.as_mut()?;
        if token.args().is_empty() {
            let mut fields = token.fields().to_vec();
            fields.push(identifier);
            *token = Token::new(fields);
            Some(String::new())
        } else {
            token.set_field(1, identifier)
        }
    }

    /// Replaces field `field` of the tag at `position`, returning the previous
    /// value.
    ///
    /// Rewriting field 0 renames the tag and keeps name lookups consistent.
    pub fn set_field(&mut self, position: usize, field: usize, value: String) -> Option<String> {
        let tag = self.tags.get_mut(position)?;
        let previous = tag.token.set_field(field, value)?;
        if field == 0 {
            let renamed = tag.token.name().to_string();
            if let Some(positions) = self.by_name.get_mut(&previous) {
                positions.retain(|&p| p != position);
                if positions.is_empty() {
                    self.by_name.remove(&previous);
                }
            }
            let positions = self.by_name.entry(renamed).or_default();
            positions.push(position);
            positions.sort_unstable();
        }
        Some(previous)
    }

    /// Appends the record's text, exactly as it will be written, to `out`.
    pub fn write_to(&self, out: &mut String) {
        self.head.write_to(out);
        for tag in &self.tags {
            out.push_str(&tag.comment);
            out.push_str(&tag.token.to_string());
        }
        out.push_str(&self.trailing);
    }

    /// The record's text, exactly as it will be written.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(comment: &str, fields: &[&str]) -> Context {
        Context::new(comment, fields.iter().copied().collect())
    }

    fn dog() -> Vec<Context> {
        vec![
            context("\n", &["CREATURE", "DOG"]),
            context("\n\t", &["DESCRIPTION", "A loyal companion."]),
            context("\n\t", &["TAG", "ONE"]),
            context("\n\t", &["BODY", "QUADRUPED"]),
            context("\n\t", &["TAG", "TWO", "2"]),
            context("\n\t", &["TAG", "THREE"]),
            Context::trailing("\n"),
        ]
    }

    fn build(run: Vec<Context>) -> Record {
        Record::new(0, run)
    }

    #[test]
    fn identity_and_positional_lookup() {
        let record = build(dog());

        assert_eq!(record.subtype(), "CREATURE");
        assert_eq!(record.identifier(), "DOG");
        assert_eq!(record.len(), 5);
        assert_eq!(record.tag(1).unwrap(), ["TAG", "ONE"]);
        assert!(record.tag(5).is_none());
    }

    #[test]
    fn repeated_tags_are_returned_in_file_order() {
        let record = build(dog());

        let tags = record.tags_named("TAG");
        assert_eq!(tags.len(), 3);
        assert_eq!(tags[0], ["TAG", "ONE"]);
        assert_eq!(tags[1], ["TAG", "TWO", "2"]);
        assert_eq!(tags[2], ["TAG", "THREE"]);

        assert!(record.contains("BODY"));
        assert!(!record.contains("CASTE"));
        assert!(record.tags_named("CASTE").is_empty());
    }

    #[test]
    fn text_reproduces_input() {
        let record = build(dog());
        assert_eq!(
            record.text(),
            "\n[CREATURE:DOG]\n\t[DESCRIPTION:A loyal companion.]\n\t[TAG:ONE]\n\t[BODY:QUADRUPED]\n\t[TAG:TWO:2]\n\t[TAG:THREE]\n"
        );
    }

    #[test]
    fn missing_identifier() {
        let record = build(vec![context("\n", &["CREATURE"])]);
        assert_eq!(record.identifier(), "");
        assert!(record.identifying_fields().is_empty());
    }

    #[test]
    fn multiple_identifiers() {
        let record = build(vec![context("\n", &["CREATURE", "DOG", "EXTRA"])]);
        assert_eq!(record.identifier(), "DOG");
        assert_eq!(record.identifying_fields(), ["DOG", "EXTRA"]);
        assert_eq!(record.text(), "\n[CREATURE:DOG:EXTRA]");
    }

    #[test]
    fn renaming_a_tag_updates_lookups() {
        let mut record = build(dog());

        let previous = record.set_field(3, 0, "TAG".to_string());
        assert_eq!(previous.as_deref(), Some("TAG"));

        let previous = record.set_field(2, 0, "TAG".to_string());
        assert_eq!(previous.as_deref(), Some("BODY"));
        assert!(!record.contains("BODY"));
        assert_eq!(
            record.tags_named("TAG"),
            [
                &["TAG".to_string(), "ONE".to_string()][..],
                &["TAG".to_string(), "QUADRUPED".to_string()][..],
                &["TAG".to_string(), "TWO".to_string(), "2".to_string()][..],
                &["TAG".to_string(), "THREE".to_string()][..],
            ]
        );
    }

    #[test]
    fn identifier_rewrite() {
        let mut record = build(dog());
        assert_eq!(record.set_identifier("HOUND".to_string()).as_deref(), Some("DOG"));
        assert_eq!(record.identifier(), "HOUND");
        assert!(record.text().starts_with("\n[CREATURE:HOUND]"));

        let mut bare = build(vec![context("", &["CREATURE"])]);
        assert_eq!(bare.set_identifier("CAT".to_string()).as_deref(), Some(""));
        assert_eq!(bare.text(), "[CREATURE:CAT]");
    }
}
