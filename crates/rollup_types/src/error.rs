/// Decode failures are always typed: an unknown or truncated field must
/// fail loudly rather than silently drop data (spec round-trip law).
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("ABI decode failed: {0}")]
    Abi(String),
    #[error("RLP decode failed: {0}")]
    Rlp(String),
}
