// src/codec/payload.rs
use crate::codec::rlp::{self, RlpItem};
use crate::error::{OperatorError, OperatorResult};
use crate::types::{PairType, RouteAction};
use alloy_primitives::U256;

/// The hub decoder reads a `c3 01 81 f8` hop as a malformed token marker, so
/// every occurrence is rewritten to the accepted equivalent after encoding.
const NULL_HOP_REJECTED: [u8; 4] = [0xc3, 0x01, 0x81, 0xf8];
const NULL_HOP_ACCEPTED: [u8; 4] = [0xc3, 0x01, 0xf8, 0x00];

/// Sentinel byte standing in for an absent hop address.
const NULL_ADDRESS_SENTINEL: u8 = 0xf8;

/// Encode a non-negative integer in the hub decoder's minimal-width form.
///
/// The decoder reserves the high bit of the leading byte, so values are
/// emitted in the smallest big-endian width whose leading byte stays below
/// 0x80. Magnitudes too large for that rule (31 bytes with the high bit set,
/// or a full 32 bytes) take the generic length-prefixed form; when the
/// magnitude needs all 32 bytes *and* carries the high bit, the prefix byte
/// is overwritten with zero, which is the exact shape the decoder accepts.
pub fn uint_to_bytes(x: U256) -> Vec<u8> {
    if x == U256::ZERO {
        return vec![0x00];
    }
    let be = x.to_be_bytes::<32>();
    let mut right = U256::from(0x80u64);
    for width in 1..32usize {
        if x < right {
            return be[32 - width..].to_vec();
        }
        right <<= 8;
    }
    let mut data = rlp::encode(&RlpItem::bytes(strip_leading_zeros(&be)));
    if x >= right {
        data[0] = 0;
    }
    data
}

fn strip_leading_zeros(bytes: &[u8]) -> Vec<u8> {
    let first = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
    bytes[first..].to_vec()
}

/// Shortest big-endian encoding of `n`, at least one byte.
pub fn bytes_from_number(n: u64) -> Vec<u8> {
    strip_leading_zeros(&n.to_be_bytes())
}

/// Raw hub-ledger bytes of a hop address. `cx`-prefixed contract addresses
/// map to `0x01` followed by the 20 raw bytes; an absent address maps to the
/// single sentinel byte.
pub fn bytes_from_address(address: Option<&str>) -> OperatorResult<Vec<u8>> {
    let Some(address) = address else {
        return Ok(vec![NULL_ADDRESS_SENTINEL]);
    };
    let hex_form = match address.strip_prefix("cx") {
        Some(body) => format!("01{body}"),
        None => address.to_string(),
    };
    hex::decode(&hex_form).map_err(|e| OperatorError::MalformedAddress(format!("{address}: {e}")))
}

/// Build the length-prefixed swap argument list consumed by the hub router:
/// optional method and receiver strings, optional minimum-received amount,
/// then one `[type, address]` pair per routing hop.
pub fn encode_swap_payload(
    path: &[RouteAction],
    method: Option<&str>,
    receiver: Option<&str>,
    min_received: Option<U256>,
) -> OperatorResult<Vec<u8>> {
    let mut components = Vec::new();
    if let Some(method) = method {
        components.push(RlpItem::bytes(method.as_bytes().to_vec()));
    }
    if let Some(receiver) = receiver {
        components.push(RlpItem::bytes(receiver.as_bytes().to_vec()));
    }
    if let Some(min_received) = min_received {
        components.push(RlpItem::bytes(uint_to_bytes(min_received)));
    }

    for hop in path {
        let type_byte = match hop.pair_type {
            PairType::StabilityFund => 2,
            _ => 1,
        };
        components.push(RlpItem::list(vec![
            RlpItem::bytes(bytes_from_number(type_byte)),
            RlpItem::bytes(bytes_from_address(hop.address.as_deref())?),
        ]));
    }

    let mut encoded = rlp::encode(&RlpItem::list(components));
    patch_null_hops(&mut encoded);
    Ok(encoded)
}

fn patch_null_hops(encoded: &mut [u8]) {
    let mut i = 0;
    while i + NULL_HOP_REJECTED.len() <= encoded.len() {
        if encoded[i..i + NULL_HOP_REJECTED.len()] == NULL_HOP_REJECTED {
            encoded[i..i + NULL_HOP_ACCEPTED.len()].copy_from_slice(&NULL_HOP_ACCEPTED);
            i += NULL_HOP_ACCEPTED.len();
        } else {
            i += 1;
        }
    }
}

/// JSON call envelope used by hub token contracts.
pub fn token_call_data(method: &str, params: serde_json::Value) -> String {
    serde_json::json!({
        "method": method,
        "params": params,
    })
    .to_string()
}

/// Rescale an amount from local-ledger decimals to hub-ledger decimals.
/// Upscaling that overflows 256 bits is an encoding invariant violation and
/// fails before anything reaches the wire.
pub fn to_hub_decimals(amount: U256, local_decimals: u8, hub_decimals: u8) -> OperatorResult<U256> {
    if local_decimals == hub_decimals {
        return Ok(amount);
    }
    let diff = local_decimals.abs_diff(hub_decimals) as u64;
    let factor = U256::from(10u64)
        .checked_pow(U256::from(diff))
        .ok_or_else(|| OperatorError::EncodingOverflow(format!("10^{diff} exceeds 256 bits")))?;
    if hub_decimals > local_decimals {
        amount.checked_mul(factor).ok_or_else(|| {
            OperatorError::EncodingOverflow(format!("{amount} * 10^{diff} exceeds 256 bits"))
        })
    } else {
        Ok(amount / factor)
    }
}
