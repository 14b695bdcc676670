use crate::compression;
use crate::error::Result;
use crate::grf::GrfEntry;
use crate::grf::cipher::decode_payload;

/// Turns the raw on-disk bytes of an entry into its payload: cipher pass,
/// then inflate, checked against the recorded uncompressed size.
pub fn decode_entry(mut raw: Vec<u8>, entry: &GrfEntry) -> Result<Vec<u8>> {
    decode_payload(&mut raw, entry.flags(), entry.compressed_size());
    compression::inflate_zlib_sized(&raw, entry.uncompressed_size() as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GrfError;
    use crate::grf::EntryFlags;
    use crate::test_util::FixtureEntry;

    fn fixture_entry(fixture: &FixtureEntry) -> (GrfEntry, Vec<u8>) {
        let blob = fixture.encode();
        let entry = GrfEntry::new(
            fixture.path.clone(),
            0,
            blob.compressed_size,
            blob.bytes.len() as u32,
            fixture.data.len() as u32,
            fixture.flags,
        );
        (entry, blob.bytes)
    }

    #[test]
    fn test_decode_all_policies() {
        let mut seed = 0x2545_F491u32;
        let data: Vec<u8> = (0..20_000)
            .map(|_| {
                seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                (seed >> 16) as u8
            })
            .collect();
        for flags in [
            EntryFlags::FILE,
            EntryFlags::FILE | EntryFlags::DES,
            EntryFlags::FILE | EntryFlags::MIXED,
            EntryFlags::FILE | EntryFlags::MIXED | EntryFlags::DES,
        ] {
            let fixture = FixtureEntry::file("data\\blob.bin", &data).with_flags(flags);
            let (entry, raw) = fixture_entry(&fixture);
            assert!(raw.len() / 8 > 20, "fixture must extend past the header blocks");
            let decoded = decode_entry(raw, &entry).unwrap();
            assert_eq!(decoded, data, "flags {flags:?}");
        }
    }

    #[test]
    fn test_wrong_uncompressed_size() {
        let fixture = FixtureEntry::file("data\\a.txt", b"hello hello hello");
        let (mut entry, raw) = fixture_entry(&fixture);
        entry.uncompressed_size += 1;
        let err = decode_entry(raw, &entry).unwrap_err();
        assert!(matches!(err, GrfError::CorruptStream(_)));
    }

    #[test]
    fn test_wrong_cipher_policy() {
        let fixture = FixtureEntry::file("data\\a.txt", &[1u8; 4096]).with_flags(EntryFlags::FILE | EntryFlags::MIXED);
        let (mut entry, raw) = fixture_entry(&fixture);
        entry.flags = EntryFlags::FILE;
        assert!(decode_entry(raw, &entry).is_err());
    }
}
