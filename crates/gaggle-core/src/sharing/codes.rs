use rand::Rng;

/// Length of a public share code.
pub const SHARE_CODE_LEN: usize = 8;

/// Random bytes in an invite code (hex-encoded, so twice as many chars).
pub const INVITE_CODE_BYTES: usize = 16;

const SHARE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Eight uppercase alphanumeric characters.
pub fn generate_share_code() -> String {
    let mut rng = rand::rng();
    (0..SHARE_CODE_LEN)
        .map(|_| char::from(SHARE_ALPHABET[rng.random_range(0..SHARE_ALPHABET.len())]))
        .collect()
}

pub fn generate_invite_code() -> String {
    let mut bytes = [0u8; INVITE_CODE_BYTES];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}
