use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct EntryFlags: u8 {
        const FILE = 0x01;
        /// Header blocks plus periodic blocks are obfuscated.
        const MIXED = 0x02;
        /// Only the first 20 blocks are encrypted.
        const DES = 0x04;
        const FOLDER = 0x08;
    }
}

/// Extensions the legacy format stores with header-only encryption.
const HEADER_ONLY_EXTENSIONS: [&str; 4] = [".gnd", ".gat", ".act", ".str"];

impl EntryFlags {
    /// Whether a table record with these flags and size becomes an entry.
    pub fn is_retained(&self, uncompressed_size: u32) -> bool {
        self.contains(EntryFlags::FILE) && !self.contains(EntryFlags::FOLDER) && uncompressed_size != 0
    }

    /// Cipher flag the legacy table implies for a file name.
    pub fn legacy_cipher_for(name: &str) -> EntryFlags {
        if HEADER_ONLY_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
            EntryFlags::DES
        } else {
            EntryFlags::MIXED
        }
    }
}

impl Serialize for EntryFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for EntryFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        Ok(EntryFlags::from_bits_retain(value))
    }
}
