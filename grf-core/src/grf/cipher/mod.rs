//! Obfuscation layers of the GRF format.

mod des;
mod name;
mod payload;

pub use des::{BLOCK_SIZE, Block, decrypt_block, decrypt_blocks};
pub use name::{decode_name, latin1_to_string};
pub use payload::{HEADER_BLOCKS, cipher_period, decode_full, decode_header, decode_payload, deshuffle_block, substitute};

#[cfg(test)]
pub(crate) use name::tests::encode_name;
#[cfg(test)]
pub(crate) use payload::tests::encode_payload;
