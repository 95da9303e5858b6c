#![forbid(unsafe_code)]

use mp_core::UserId;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Maps an opaque session token to the user it was issued for.
pub(crate) trait IdentityProvider {
    fn resolve(&self, token: &str) -> Option<UserId>;
}

/// Fixed token table from configuration. Only SHA-256 digests of the tokens are kept.
#[derive(Clone, Debug, Default)]
pub(crate) struct StaticSessions {
    by_digest: BTreeMap<[u8; 32], UserId>,
}

impl StaticSessions {
    pub(crate) fn new(entries: impl IntoIterator<Item = (String, UserId)>) -> Self {
        let by_digest = entries
            .into_iter()
            .map(|(token, user)| (token_digest(&token), user))
            .collect();
        Self { by_digest }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.by_digest.is_empty()
    }
}

impl IdentityProvider for StaticSessions {
    fn resolve(&self, token: &str) -> Option<UserId> {
        if token.is_empty() {
            return None;
        }
        self.by_digest.get(&token_digest(token)).cloned()
    }
}

fn token_digest(token: &str) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(token.as_bytes()));
    out
}
