/// Random token generation for invitation links and sessions
use rand::{rngs::OsRng, RngCore};

/// Invitation tokens carry 256 bits of entropy
pub const INVITATION_TOKEN_BYTES: usize = 32;

/// Hex-encode `len` bytes drawn from the OS random source
pub fn random_hex_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Generate a new 64-character lowercase hex invitation token
pub fn create_invitation_token() -> String {
    random_hex_token(INVITATION_TOKEN_BYTES)
}
