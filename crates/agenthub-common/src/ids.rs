//! Prefixed random identifiers.
//!
//! Every row carries an ID of the form `<prefix>_<random>`, e.g. `chat_k3v9x0ab1q`.
//! The prefix makes IDs self-describing in logs and webhook payloads. Bearer
//! credentials use the same scheme with a longer random part.

use rand::Rng;
use rand::distr::Alphanumeric;

/// Length of the random part of entity IDs.
pub const ID_RANDOM_LEN: usize = 10;

/// Length of the random part of access and refresh tokens.
pub const TOKEN_RANDOM_LEN: usize = 32;

pub const USER: &str = "user";
pub const AGENT: &str = "agent";
pub const TOKEN: &str = "token";
pub const CHANNEL: &str = "channel";
pub const CHAT: &str = "chat";
pub const MESSAGE: &str = "message";
pub const CHAT_AGENT: &str = "chatagent";
pub const BOARD: &str = "board";
pub const TASK: &str = "task";
pub const NOTE: &str = "note";
pub const DOCUMENT: &str = "document";
pub const MENU: &str = "menu";

const LOWER_ALNUM: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate an entity ID: `<prefix>_` followed by 10 lowercase alphanumerics.
pub fn generate(prefix: &str) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ID_RANDOM_LEN)
        .map(|_| LOWER_ALNUM[rng.random_range(0..LOWER_ALNUM.len())] as char)
        .collect();
    format!("{prefix}_{suffix}")
}

fn random_token(prefix: &str) -> String {
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(TOKEN_RANDOM_LEN)
        .map(char::from)
        .collect();
    format!("{prefix}_{suffix}")
}

/// Generate a bearer access token: `tkn_` followed by 32 alphanumerics.
pub fn access_token() -> String {
    random_token("tkn")
}

/// Generate a refresh token: `ref_` followed by 32 alphanumerics.
pub fn refresh_token() -> String {
    random_token("ref")
}
