use rand::{Rng, distr::Alphanumeric};

pub const INVITE_CODE_LEN: usize = 10;

/// Produce an opaque invite code safe for a URL path segment.
///
/// Sampled from the thread-local CSPRNG; at this length and volume a
/// collision is negligible, and the unique index on the code column
/// would reject one anyway.
pub fn generate_invite_code() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(INVITE_CODE_LEN)
        .map(char::from)
        .collect()
}
