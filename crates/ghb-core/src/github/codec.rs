//! Compact, delimiter-joined token for an [`EntityRef`].
//!
//! Layout: `kind:owner/name:number[:comment_id]:author`. The `:` separator
//! cannot occur in repository names, logins or decimal numbers, so splitting
//! is unambiguous.

use super::entity::{is_valid_login, EntityKind, EntityRef, RepoName};

const SEP: char = ':';

const KIND_ISSUE: &str = "i";
const KIND_PULL_REQUEST: &str = "p";
const KIND_REVIEW_COMMENT: &str = "rc";

pub fn encode(entity: &EntityRef) -> String {
    let repo = entity.repo.as_str();
    let number = entity.number;
    let author = &entity.author;
    match entity.kind {
        EntityKind::Issue => format!("{KIND_ISSUE}{SEP}{repo}{SEP}{number}{SEP}{author}"),
        EntityKind::PullRequest => {
            format!("{KIND_PULL_REQUEST}{SEP}{repo}{SEP}{number}{SEP}{author}")
        }
        EntityKind::PullRequestReviewComment { comment_id } => format!(
            "{KIND_REVIEW_COMMENT}{SEP}{repo}{SEP}{number}{SEP}{comment_id}{SEP}{author}"
        ),
    }
}

/// Decode a token produced by [`encode`].
///
/// Anything else (foreign payloads, truncated or tampered tokens) yields
/// `None`; callers treat that as "not one of ours".
pub fn decode(token: &str) -> Option<EntityRef> {
    let fields: Vec<&str> = token.split(SEP).collect();

    let (kind, repo, number, author) = match fields.as_slice() {
        [KIND_ISSUE, repo, number, author] => (EntityKind::Issue, repo, number, author),
        [KIND_PULL_REQUEST, repo, number, author] => {
            (EntityKind::PullRequest, repo, number, author)
        }
        [KIND_REVIEW_COMMENT, repo, number, comment_id, author] => (
            EntityKind::PullRequestReviewComment {
                comment_id: parse_decimal(comment_id)?,
            },
            repo,
            number,
            author,
        ),
        _ => return None,
    };

    if !is_valid_login(author) {
        return None;
    }

    Some(EntityRef {
        kind,
        repo: RepoName::parse(repo).ok()?,
        number: parse_decimal(number)?,
        author: author.to_string(),
    })
}

// `u64::from_str` accepts a leading `+`; tokens never contain one.
fn parse_decimal(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_token_round_trips() {
        let r = EntityRef::issue("o/r", 42, "alice").unwrap();
        let token = encode(&r);
        assert_eq!(token, "i:o/r:42:alice");
        assert_eq!(decode(&token), Some(r));
    }

    #[test]
    fn every_kind_round_trips() {
        let refs = [
            EntityRef::issue("rust-lang/rust", 0, "a").unwrap(),
            EntityRef::pull_request("o/r.js", 7, "bob").unwrap(),
            EntityRef::review_comment("some-org/x_y", 12, u64::MAX, "renovate[bot]").unwrap(),
        ];
        for r in refs {
            assert_eq!(decode(&encode(&r)), Some(r));
        }
    }

    #[test]
    fn review_comment_token_keeps_comment_id_position() {
        let r = EntityRef::review_comment("o/r", 7, 1001, "bob").unwrap();
        assert_eq!(encode(&r), "rc:o/r:7:1001:bob");
    }

    #[test]
    fn foreign_or_corrupt_tokens_decode_to_none() {
        for s in [
            "",
            ":",
            "i",
            "i:o/r:42",
            "i:o/r:42:alice:extra",
            "p:o/r:7:1001:bob",
            "rc:o/r:7:bob",
            "x:o/r:1:alice",
            "i:or:1:alice",
            "i:o/r:-1:alice",
            "i:o/r:+1:alice",
            "i:o/r:1.5:alice",
            "i:o/r:99999999999999999999:alice",
            "i:o/r:1:",
            "i:o/r:1:ali ce",
            "rc:o/r:7:abc:bob",
            "https://example.com/",
            "I:o/r:1:alice",
        ] {
            assert_eq!(decode(s), None, "{s:?}");
        }
    }
}
