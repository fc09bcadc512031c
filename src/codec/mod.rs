// src/codec/mod.rs
//
// Deterministic byte encodings for cross-chain call arguments. Everything in
// this module must match the hub ledger's decoder bit-for-bit; a mismatch is
// not detected locally and surfaces only as a remote revert.
pub mod payload;
pub mod rlp;

pub use payload::{
    bytes_from_address, bytes_from_number, encode_swap_payload, to_hub_decimals, token_call_data,
    uint_to_bytes,
};
pub use rlp::RlpItem;
