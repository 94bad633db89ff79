//! # Conduit (RealWorld blogging API)
//!
//! `conduit` implements the RealWorld backend contract: user registration and
//! login, article and comment CRUD, and read-only profiles, persisted in a
//! single SQLite file.
//!
//! ## Slugs
//!
//! Articles are addressed by a slug derived from their title (see [`slug`]).
//! Slugs are lowercase `[a-z0-9-]`, capped at 100 characters, and made unique by
//! appending `-1`, `-2`, ... when the base slug is already taken. The `UNIQUE`
//! constraint on `articles.slug` turns a lost race between two writers into a
//! `409 Conflict` instead of a duplicate.
//!
//! ## Authentication
//!
//! Clients send `Authorization: Token <jwt>`. Tokens are HS256 JWTs signed with
//! a process-wide secret (see [`credentials`]); they are stateless and remain
//! valid until they expire.
//!
//! ## Ownership
//!
//! Only the author of an article or comment may update or delete it. The check
//! loads the row on every request and answers `404` when it is missing and `403`
//! when the caller is not the author (see [`ownership`]).

pub mod api;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod entities;
pub mod ownership;
pub mod slug;
pub mod storage;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

/// Service name reported by `/health` and used as the JWT issuer.
pub const SERVICE_NAME: &str = "conduit-api";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }
}
