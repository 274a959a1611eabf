//! `Languages.bin` catalog reader (component G, §4.7). Structurally a
//! simpler sibling of the packages reader: fixed header, a flat language
//! list, then per-group string-id tables. Per-group text blobs are
//! surfaced as opaque bytes and never decoded — from `format_version >= 29`
//! onward the reference tool documents them as encrypted.
//!
//! Non-goal carried over from §1: this module never attempts to decrypt
//! those blobs.

use std::io::Read;

use crate::binreader::BinaryReader;
use crate::error::StructuralError;

const HASH_LEN: usize = 16;
const ENCRYPTED_SINCE_VERSION: i32 = 29;

/// A localization string ID paired with its opaque trailer bytes.
#[derive(Debug, Clone)]
pub struct IdString {
    pub id: String,
    pub unk: Vec<u8>,
}

/// One language group: a name prefix, an opaque (possibly encrypted) text
/// blob, and the string IDs it covers.
#[derive(Debug, Clone)]
pub struct Group {
    pub name: String,
    pub unk: i32,
    pub blob: Vec<u8>,
    pub string_ids: Vec<IdString>,
}

pub struct LanguagesCatalog {
    pub format_version: i32,
    pub is_encrypted: bool,
    pub languages: Vec<String>,
    pub groups: Vec<Group>,
}

impl LanguagesCatalog {
    pub fn parse<R: Read>(source: R) -> Result<Self, StructuralError> {
        let mut reader = BinaryReader::new(source);
        let _hash = reader.read(HASH_LEN)?;
        let _unk1 = reader.read_i32()?;
        let format_version = reader.read_i32()?;
        let is_encrypted = format_version >= ENCRYPTED_SINCE_VERSION;
        if is_encrypted {
            tracing::warn!(format_version, "language text is encrypted, surfacing opaque blobs");
        }

        let _unk2 = reader.read(5)?;

        let num_languages = reader.read_i32()?;
        let mut languages = Vec::with_capacity(num_languages.max(0) as usize);
        for _ in 0..num_languages {
            languages.push(reader.read_length_prefixed_string()?);
        }

        let num_groups = reader.read_i32()?;
        let mut groups = Vec::with_capacity(num_groups.max(0) as usize);
        for _ in 0..num_groups {
            let name = reader.read_length_prefixed_string()?;
            let unk = reader.read_i32()?;
            let string_count = reader.read_i32()?;
            let blob_len = reader.read_i32()?;
            if blob_len < 0 {
                return Err(StructuralError::LengthPrefixOverrun {
                    len: blob_len as i64,
                });
            }
            let blob = reader.read(blob_len as usize)?;

            let mut string_ids = Vec::with_capacity(string_count.max(0) as usize);
            for _ in 0..string_count {
                let id = reader.read_length_prefixed_string()?;
                let trailer = reader.read(8)?;
                string_ids.push(IdString { id, unk: trailer });
            }

            groups.push(Group {
                name,
                unk,
                blob,
                string_ids,
            });
        }

        Ok(LanguagesCatalog {
            format_version,
            is_encrypted,
            languages,
            groups,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_length_prefixed(buf: &mut Vec<u8>, s: &str) {
        buf.extend_from_slice(&(s.len() as i32).to_le_bytes());
        buf.extend_from_slice(s.as_bytes());
    }

    #[test]
    fn parses_languages_and_groups() {
        let mut buf = vec![0u8; HASH_LEN];
        buf.extend_from_slice(&0i32.to_le_bytes()); // unk1
        buf.extend_from_slice(&20i32.to_le_bytes()); // format_version, unencrypted
        buf.extend_from_slice(&[0u8; 5]); // unk2

        buf.extend_from_slice(&2i32.to_le_bytes()); // num_languages
        write_length_prefixed(&mut buf, "en");
        write_length_prefixed(&mut buf, "de");

        buf.extend_from_slice(&1i32.to_le_bytes()); // num_groups
        write_length_prefixed(&mut buf, "Weapons");
        buf.extend_from_slice(&7i32.to_le_bytes()); // unk
        buf.extend_from_slice(&1i32.to_le_bytes()); // string_count
        let blob = b"opaque";
        buf.extend_from_slice(&(blob.len() as i32).to_le_bytes());
        buf.extend_from_slice(blob);
        write_length_prefixed(&mut buf, "WEAPON_NAME");
        buf.extend_from_slice(&[0u8; 8]);

        let catalog = LanguagesCatalog::parse(std::io::Cursor::new(buf)).unwrap();
        assert_eq!(catalog.languages, vec!["en", "de"]);
        assert!(!catalog.is_encrypted);
        assert_eq!(catalog.groups.len(), 1);
        assert_eq!(catalog.groups[0].string_ids[0].id, "WEAPON_NAME");
        assert_eq!(catalog.groups[0].blob, blob);
    }

    #[test]
    fn flags_encrypted_format_versions() {
        let mut buf = vec![0u8; HASH_LEN];
        buf.extend_from_slice(&0i32.to_le_bytes());
        buf.extend_from_slice(&29i32.to_le_bytes());
        buf.extend_from_slice(&[0u8; 5]);
        buf.extend_from_slice(&0i32.to_le_bytes()); // num_languages
        buf.extend_from_slice(&0i32.to_le_bytes()); // num_groups

        let catalog = LanguagesCatalog::parse(std::io::Cursor::new(buf)).unwrap();
        assert!(catalog.is_encrypted);
    }
}
