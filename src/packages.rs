//! `Packages.bin` catalog reader and inheritance resolver (components D
//! and F, §4.4/§4.6). The struct table and the nested C-string blob mirror
//! the reference tool's `PackagesFile`; the inheritance walk is this
//! crate's own addition on top of it.

use std::collections::HashMap;
use std::io::Read;

use crate::binreader::BinaryReader;
use crate::error::{ResolutionError, StructuralError};
use crate::grammar;
use crate::value::{OrderedDict, Value};

const HASH_LEN: usize = 29;

/// A top-level struct descriptor preceding the chunk table; preserved
/// verbatim, never interpreted.
#[derive(Debug, Clone)]
pub struct TopStruct {
    pub name: String,
    pub unk: i32,
}

/// One decoded package entry.
#[derive(Debug, Clone)]
pub struct Package {
    pub header_path: String,
    pub name: String,
    pub parent_path: String,
    pub raw_bytes: Vec<u8>,
}

impl Package {
    /// The key packages are indexed and looked up by: `header_path` joined
    /// with this package's own `name`.
    pub fn full_path(&self) -> String {
        format!("{}/{}", self.header_path, self.name)
    }

    /// The key used to look up this package's declared parent, composed
    /// the same way as [`Package::full_path`] but from `parent_path`.
    fn parent_key(&self) -> Option<String> {
        if self.parent_path.is_empty() {
            None
        } else {
            Some(format!("{}/{}", self.header_path, self.parent_path))
        }
    }
}

/// A parsed `Packages.bin` catalog.
pub struct PackagesCatalog {
    pub structs: Vec<TopStruct>,
    packages: HashMap<String, Package>,
    /// Preserves file order for deterministic iteration/CLI output.
    order: Vec<String>,
}

impl PackagesCatalog {
    pub fn parse<R: Read>(source: R) -> Result<Self, StructuralError> {
        let mut reader = BinaryReader::new(source);
        let _hash = reader.read(HASH_LEN)?;

        let num_structs = reader.read_i32()?;
        let mut structs = Vec::with_capacity(num_structs.max(0) as usize);
        for _ in 0..num_structs {
            let name = reader.read_length_prefixed_string()?;
            let unk = reader.read_i32()?;
            structs.push(TopStruct { name, unk });
        }

        let chunksize = reader.read_i32()?;
        if chunksize < 0 {
            return Err(StructuralError::LengthPrefixOverrun {
                len: chunksize as i64,
            });
        }
        let blob = reader.read(chunksize as usize)?;
        let num_chunks = reader.read_i32()?;

        let mut chunk_reader = BinaryReader::new(std::io::Cursor::new(blob));
        let mut raw_chunks = Vec::with_capacity(num_chunks.max(0) as usize);
        for _ in 0..num_chunks {
            raw_chunks.push(chunk_reader.read_cstring()?);
        }

        let mut packages = HashMap::with_capacity(raw_chunks.len());
        let mut order = Vec::with_capacity(raw_chunks.len());
        for raw_bytes in raw_chunks {
            let header_path = reader.read_length_prefixed_string()?;
            let name = reader.read_length_prefixed_string()?;
            reader.read(5)?;
            let parent_path = reader.read_length_prefixed_string()?;
            reader.read(4)?;

            let package = Package {
                header_path,
                name,
                parent_path,
                raw_bytes,
            };
            let key = package.full_path();
            if packages.contains_key(&key) {
                return Err(StructuralError::DuplicatePackagePath(key));
            }
            order.push(key.clone());
            packages.insert(key, package);
        }

        Ok(PackagesCatalog {
            structs,
            packages,
            order,
        })
    }

    pub fn get(&self, full_path: &str) -> Option<&Package> {
        self.packages.get(full_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.order.iter().map(move |k| &self.packages[k])
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Decodes `pkg`'s own payload and overlays it onto its parent chain's
    /// decoded content, recursively. A package with no `parent_path`
    /// returns its own decoded payload unchanged.
    pub fn get_full_content(&self, pkg: &Package) -> Result<OrderedDict, ResolutionError> {
        let mut visited = Vec::new();
        self.resolve(pkg, &mut visited)
    }

    fn resolve(
        &self,
        pkg: &Package,
        visited: &mut Vec<String>,
    ) -> Result<OrderedDict, ResolutionError> {
        let key = pkg.full_path();
        if visited.contains(&key) {
            return Err(ResolutionError::Cycle(key));
        }
        visited.push(key);

        let own_text = String::from_utf8_lossy(&pkg.raw_bytes);
        let own = match grammar::loads(&own_text)? {
            Value::Dict(d) => d,
            _ => OrderedDict::new(),
        };

        let resolved = match pkg.parent_key() {
            None => own,
            Some(parent_key) => {
                let parent = self
                    .packages
                    .get(&parent_key)
                    .ok_or_else(|| ResolutionError::MissingParent(parent_key.clone()))?;
                let mut base = self.resolve(parent, visited)?;
                base.overlay(&own);
                base
            }
        };

        visited.pop();
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_length_prefixed(buf: &mut Vec<u8>, s: &str) {
        buf.extend_from_slice(&(s.len() as i32).to_le_bytes());
        buf.extend_from_slice(s.as_bytes());
    }

    fn build_bin(entries: &[(&str, &str, &str, &str)]) -> Vec<u8> {
        // entries: (header_path, name, parent_path, raw_text)
        let mut buf = vec![0u8; HASH_LEN];
        buf.extend_from_slice(&0i32.to_le_bytes()); // num_structs

        let mut blob = Vec::new();
        for (_, _, _, raw) in entries {
            blob.extend_from_slice(raw.as_bytes());
            blob.push(0);
        }
        buf.extend_from_slice(&(blob.len() as i32).to_le_bytes());
        buf.extend_from_slice(&blob);
        buf.extend_from_slice(&(entries.len() as i32).to_le_bytes());

        for (header_path, name, parent_path, _) in entries {
            write_length_prefixed(&mut buf, header_path);
            write_length_prefixed(&mut buf, name);
            buf.extend_from_slice(&[0u8; 5]);
            write_length_prefixed(&mut buf, parent_path);
            buf.extend_from_slice(&[0u8; 4]);
        }
        buf
    }

    #[test]
    fn parses_packages_and_indexes_by_full_path() {
        let bin = build_bin(&[("/Weapons", "Base", "", "Damage=10\n")]);
        let catalog = PackagesCatalog::parse(std::io::Cursor::new(bin)).unwrap();
        assert_eq!(catalog.len(), 1);
        let pkg = catalog.get("/Weapons/Base").unwrap();
        assert_eq!(pkg.raw_bytes, b"Damage=10\n");
    }

    #[test]
    fn rejects_duplicate_package_paths() {
        let bin = build_bin(&[
            ("/Weapons", "Base", "", "A=1\n"),
            ("/Weapons", "Base", "", "A=2\n"),
        ]);
        assert!(PackagesCatalog::parse(std::io::Cursor::new(bin)).is_err());
    }

    #[test]
    fn resolves_single_level_inheritance_with_shallow_overlay() {
        let bin = build_bin(&[
            ("/Weapons", "Base", "", "Damage=10\nName=Base\n"),
            ("/Weapons", "Rifle", "Base", "Damage=20\n"),
        ]);
        let catalog = PackagesCatalog::parse(std::io::Cursor::new(bin)).unwrap();
        let rifle = catalog.get("/Weapons/Rifle").unwrap();
        let content = catalog.get_full_content(rifle).unwrap();
        assert_eq!(content.get("Damage"), Some(&Value::Int(20)));
        assert_eq!(content.get("Name"), Some(&Value::String("Base".into())));
    }

    #[test]
    fn missing_parent_is_a_resolution_error() {
        let bin = build_bin(&[("/Weapons", "Rifle", "Ghost", "Damage=20\n")]);
        let catalog = PackagesCatalog::parse(std::io::Cursor::new(bin)).unwrap();
        let rifle = catalog.get("/Weapons/Rifle").unwrap();
        assert!(catalog.get_full_content(rifle).is_err());
    }

    #[test]
    fn inheritance_cycle_is_rejected() {
        let bin = build_bin(&[
            ("/Weapons", "A", "B", "X=1\n"),
            ("/Weapons", "B", "A", "Y=2\n"),
        ]);
        let catalog = PackagesCatalog::parse(std::io::Cursor::new(bin)).unwrap();
        let a = catalog.get("/Weapons/A").unwrap();
        assert!(catalog.get_full_content(a).is_err());
    }
}
