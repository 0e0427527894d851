//! Hidden data links.
//!
//! A message about a GitHub entity starts with a zero-width space wrapped in a
//! text link. The link URL carries the encoded [`EntityRef`]; Telegram keeps
//! it on the message entity list, so it comes back with any reply.

use crate::{
    formatting::escape_html,
    github::{codec, entity::EntityRef},
    messaging::types::TextEntity,
};

/// Invisible carrier character for the data link.
pub const ZERO_WIDTH_SPACE: char = '\u{200B}';

pub const DEFAULT_DATA_LINK_BASE: &str = "https://ghbot.invalid/d/";

/// Builds and reads data-link URLs under one base.
#[derive(Clone, Debug)]
pub struct LinkEmbedder {
    base: String,
}

impl Default for LinkEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_LINK_BASE)
    }
}

impl LinkEmbedder {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    pub fn data_link(&self, entity: &EntityRef) -> String {
        format!("{}{}", self.base, codec::encode(entity))
    }

    /// Token part of a data link, or `None` for any other URL.
    pub fn data_link_payload<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.base.as_str())
            .filter(|payload| !payload.is_empty())
    }

    /// Prefix plain `text` with the hidden carrier and return the annotation
    /// to send along with it.
    pub fn embed(&self, text: &str, entity: &EntityRef) -> (String, TextEntity) {
        let mut out = String::with_capacity(text.len() + ZERO_WIDTH_SPACE.len_utf8());
        out.push(ZERO_WIDTH_SPACE);
        out.push_str(text);
        let annotation =
            TextEntity::text_link(0, ZERO_WIDTH_SPACE.len_utf16(), self.data_link(entity));
        (out, annotation)
    }

    /// Same as [`LinkEmbedder::embed`] for HTML parse mode.
    pub fn embed_html(&self, html: &str, entity: &EntityRef) -> String {
        format!(
            "<a href=\"{}\">{ZERO_WIDTH_SPACE}</a>{html}",
            escape_html(&self.data_link(entity))
        )
    }

    /// Decode the first annotation that carries one of our tokens.
    ///
    /// Order follows the message entity list; later data links are ignored.
    pub fn resolve(&self, entities: &[TextEntity]) -> Option<EntityRef> {
        entities
            .iter()
            .filter_map(TextEntity::url)
            .filter_map(|url| self.data_link_payload(url))
            .find_map(codec::decode)
    }

    pub fn has_data_link(&self, entities: &[TextEntity]) -> bool {
        entities
            .iter()
            .filter_map(TextEntity::url)
            .any(|url| self.data_link_payload(url).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice_issue() -> EntityRef {
        EntityRef::issue("o/r", 42, "alice").unwrap()
    }

    #[test]
    fn embed_prepends_invisible_carrier() {
        let e = LinkEmbedder::default();
        let (text, ann) = e.embed("New issue", &alice_issue());
        assert_eq!(text, "\u{200B}New issue");
        assert_eq!(ann.offset, 0);
        assert_eq!(ann.length, 1);
        assert_eq!(ann.url(), Some("https://ghbot.invalid/d/i:o/r:42:alice"));
    }

    #[test]
    fn embed_html_wraps_carrier_in_anchor() {
        let e = LinkEmbedder::new("https://x.test/");
        let html = e.embed_html("<b>hi</b>", &alice_issue());
        assert_eq!(
            html,
            "<a href=\"https://x.test/i:o/r:42:alice\">\u{200B}</a><b>hi</b>"
        );
    }

    #[test]
    fn resolve_reads_back_embedded_entity() {
        let e = LinkEmbedder::default();
        let (_, ann) = e.embed("x", &alice_issue());
        assert_eq!(e.resolve(&[ann]), Some(alice_issue()));
    }

    #[test]
    fn resolve_skips_undecodable_annotations() {
        let e = LinkEmbedder::default();
        let bob_pr = EntityRef::pull_request("o/r", 7, "bob").unwrap();
        let entities = vec![
            TextEntity::text_link(0, 1, "https://ghbot.invalid/d/garbage"),
            TextEntity::text_link(2, 4, "https://github.com/o/r/pull/7"),
            TextEntity::text_link(0, 1, e.data_link(&bob_pr)),
        ];
        assert_eq!(e.resolve(&entities), Some(bob_pr));
    }

    #[test]
    fn resolve_first_match_wins() {
        let e = LinkEmbedder::default();
        let first = alice_issue();
        let second = EntityRef::review_comment("o/r", 7, 3, "bob").unwrap();
        let entities = vec![
            TextEntity::text_link(0, 1, e.data_link(&first)),
            TextEntity::text_link(1, 1, e.data_link(&second)),
        ];
        assert_eq!(e.resolve(&entities), Some(first));
    }

    #[test]
    fn resolve_without_data_links_is_none() {
        let e = LinkEmbedder::default();
        assert_eq!(e.resolve(&[]), None);
        let entities = vec![TextEntity {
            kind: crate::messaging::types::TextEntityKind::Bold,
            offset: 0,
            length: 3,
        }];
        assert_eq!(e.resolve(&entities), None);
        assert!(!e.has_data_link(&entities));
    }

    #[test]
    fn payload_requires_exact_base() {
        let e = LinkEmbedder::default();
        assert_eq!(
            e.data_link_payload("https://ghbot.invalid/d/i:o/r:1:a"),
            Some("i:o/r:1:a")
        );
        assert_eq!(e.data_link_payload("https://ghbot.invalid/d/"), None);
        assert_eq!(e.data_link_payload("https://example.com/d/i:o/r:1:a"), None);
    }
}
