//! Decoding and validating the RLP transaction list a `BlockProposed`
//! event's calldata or blob carries (§4.2 steps 4-5).
//!
//! An invalid list — too large, or not valid RLP — is coerced to an empty
//! one rather than rejected outright: the spec's redesign flags confirm
//! the current calldata syncer drops the older "throw-away block" special
//! case and simply substitutes empty (§SPEC_FULL.md C.2a).

use std::io::Read;

use flate2::read::ZlibDecoder;
use rlp::Rlp;

/// `BlockMaxTxListBytes` equivalent: if the decompressed list exceeds
/// this, it is treated as invalid. Sourced from the protocol's
/// `getConfig()` at driver startup (`TxListConfig::block_max_tx_list_bytes`);
/// passed in explicitly here to keep this module free of an RPC
/// dependency.
pub fn decode_and_validate(compressed: &[u8], max_bytes: u64) -> Vec<u8> {
    match decompress(compressed) {
        Ok(bytes) => validate(bytes, max_bytes),
        Err(err) => {
            tracing::warn!(%err, "txlist decompression failed, substituting empty list");
            Vec::new()
        }
    }
}

fn decompress(compressed: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(compressed);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

fn validate(bytes: Vec<u8>, max_bytes: u64) -> Vec<u8> {
    if bytes.len() as u64 > max_bytes {
        tracing::warn!(len = bytes.len(), max_bytes, "txlist exceeds max bytes, substituting empty list");
        return Vec::new();
    }
    if Rlp::new(&bytes).as_list::<Vec<u8>>().is_err() {
        tracing::warn!("txlist failed RLP decode, substituting empty list");
        return Vec::new();
    }
    bytes
}

/// Compresses an RLP-encoded tx list the same way the proposer publishes
/// it, for use in driver tests and by the proposer crate.
pub fn compress(rlp_tx_list: &[u8]) -> Vec<u8> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(rlp_tx_list).expect("writing to an in-memory buffer cannot fail");
    encoder.finish().expect("finishing an in-memory zlib stream cannot fail")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rlp_list() -> Vec<u8> {
        // An RLP list of two opaque byte strings, standing in for two raw
        // transactions.
        let mut stream = rlp::RlpStream::new_list(2);
        stream.append(&vec![1u8, 2, 3]);
        stream.append(&vec![4u8, 5, 6]);
        stream.out().to_vec()
    }

    #[test]
    fn round_trips_through_compression() {
        let list = sample_rlp_list();
        let compressed = compress(&list);
        let decoded = decode_and_validate(&compressed, 1_000_000);
        assert_eq!(decoded, list);
    }

    #[test]
    fn oversized_list_is_coerced_to_empty() {
        let list = sample_rlp_list();
        let compressed = compress(&list);
        let decoded = decode_and_validate(&compressed, 1);
        assert!(decoded.is_empty());
    }

    #[test]
    fn garbage_input_is_coerced_to_empty() {
        let decoded = decode_and_validate(b"not a valid zlib stream", 1_000_000);
        assert!(decoded.is_empty());
    }
}
