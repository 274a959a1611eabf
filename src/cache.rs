//! TOC directory-table parsing and cache archive materialization
//! (component C, §4.3). Mirrors the reference tool's `handle_files`: read
//! every 96-byte TOC record into a flat directory table, then walk the
//! records in order, seeking the cache body and writing each file raw or
//! through the LZ decoder.

use std::collections::HashMap;
use std::fs;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};
use chrono::{DateTime, Utc};
use filetime::FileTime;
use md5::{Digest, Md5};

use crate::binreader::BinaryReader;
use crate::error::StructuralError;
use crate::lz;

const TOC_MAGIC: [u8; 4] = [0x4e, 0xc6, 0x67, 0x18];
const RECORD_LEN: usize = 8 + 8 + 4 + 4 + 4 + 4 + 64;
const COLLISION_SUFFIX: &str = "~";

/// One TOC record (§3's `TOCEntry`).
#[derive(Debug, Clone)]
pub struct TocEntry {
    pub offset: i64,
    pub time: Option<DateTime<Utc>>,
    pub compressed_size: i32,
    pub size: i32,
    pub scope_index: i32,
    /// Parent directory's full path, e.g. `/Content/Weapons`.
    pub dir_path: String,
    pub filename: String,
}

impl TocEntry {
    pub fn is_directory(&self) -> bool {
        self.offset == -1
    }

    pub fn full_path(&self) -> PathBuf {
        Path::new(&self.dir_path).join(&self.filename)
    }
}

/// The parsed directory index table, in TOC record order.
pub struct Toc {
    pub entries: Vec<TocEntry>,
}

impl Toc {
    pub fn parse<R: Read>(source: R) -> Result<Self, StructuralError> {
        let mut reader = BinaryReader::new(source);

        let magic = reader.read(4)?;
        if magic != TOC_MAGIC {
            return Err(StructuralError::BadMagic {
                expected: TOC_MAGIC.to_vec(),
                actual: magic,
            });
        }
        let version = reader.read_i32()?;
        if version != 16 && version != 20 {
            return Err(StructuralError::UnsupportedVersion(version));
        }

        let mut directories: HashMap<i32, String> = HashMap::new();
        directories.insert(0, "/".to_string());
        let mut next_directory_index = 0i32;
        let mut entries = Vec::new();

        loop {
            let record = match reader.read(RECORD_LEN) {
                Ok(bytes) => bytes,
                Err(StructuralError::UnexpectedEof { .. }) => break,
                Err(e) => return Err(e),
            };
            let mut cur = std::io::Cursor::new(record);

            let offset = cur.read_i64::<LittleEndian>()?;
            let timestamp = cur.read_i64::<LittleEndian>()?;
            let compressed_size = cur.read_i32::<LittleEndian>()?;
            let size = cur.read_i32::<LittleEndian>()?;
            let scope_index = cur.read_i32::<LittleEndian>()?;
            let parent = cur.read_i32::<LittleEndian>()?;
            let mut filename_raw = [0u8; 64];
            cur.read_exact(&mut filename_raw)?;
            let filename_len = filename_raw.iter().position(|&b| b == 0).unwrap_or(64);
            let filename = String::from_utf8_lossy(&filename_raw[..filename_len]).into_owned();

            let time = if timestamp <= 0 {
                None
            } else {
                Some(filetime_to_datetime(timestamp))
            };

            let parent_path = directories
                .get(&parent)
                .cloned()
                .unwrap_or_else(|| "/".to_string());

            if offset == -1 {
                next_directory_index += 1;
                let this_path = Path::new(&parent_path)
                    .join(&filename)
                    .to_string_lossy()
                    .into_owned();
                directories.insert(next_directory_index, this_path);
            }

            entries.push(TocEntry {
                offset,
                time,
                compressed_size,
                size,
                scope_index,
                dir_path: parent_path,
                filename,
            });
        }

        Ok(Toc { entries })
    }
}

/// Windows FILETIME (100ns ticks since 1601-01-01) to UTC.
fn filetime_to_datetime(ticks: i64) -> DateTime<Utc> {
    const TICKS_PER_SECOND: i64 = 10_000_000;
    const UNIX_EPOCH_IN_TICKS: i64 = 116_444_736_000_000_000;
    let unix_ticks = ticks - UNIX_EPOCH_IN_TICKS;
    let secs = unix_ticks.div_euclid(TICKS_PER_SECOND);
    let nanos = unix_ticks.rem_euclid(TICKS_PER_SECOND) * 100;
    DateTime::from_timestamp(secs, nanos as u32).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Creates every directory the TOC names, then materializes every file
/// entry by seeking `cache` and writing raw or LZ-decompressed bytes.
/// Per-entry I/O failures are logged and skipped; they never abort the
/// walk (§4.3's non-fatal write-failure policy).
pub fn extract<R: Read + Seek>(
    cache: &mut R,
    toc: &Toc,
    out_dir: &Path,
) -> Result<(), StructuralError> {
    for dir_path in std::iter::once("/".to_string()).chain(
        toc.entries
            .iter()
            .filter(|e| e.is_directory())
            .map(|e| e.full_path().to_string_lossy().into_owned()),
    ) {
        let local = local_path(out_dir, Path::new(&dir_path));
        if !local.exists() {
            fs::create_dir_all(&local)?;
        }
    }

    for entry in &toc.entries {
        if entry.is_directory() {
            continue;
        }
        let Some(time) = entry.time else {
            tracing::warn!(path = %entry.full_path().display(), "skipping entry without time");
            continue;
        };

        let mut local = local_path(out_dir, &entry.full_path());
        if local.exists() && local.is_dir() {
            local = append_suffix(&local, COLLISION_SUFFIX);
        }

        cache.seek(std::io::SeekFrom::Start(entry.offset as u64))?;
        let compressed = entry.compressed_size != entry.size;
        tracing::info!(path = %local.display(), compressed, "extracting");

        let data = if compressed {
            match lz::decompress(cache, entry.size as usize) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(path = %entry.full_path().display(), error = %e, "decompression failed");
                    continue;
                }
            }
        } else {
            let mut buf = vec![0u8; entry.compressed_size as usize];
            if let Err(e) = cache.read_exact(&mut buf) {
                tracing::warn!(path = %entry.full_path().display(), error = %e, "read failed");
                continue;
            }
            buf
        };

        if local.exists() {
            let digest = Md5::digest(&data);
            let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
            local = append_suffix(&local, &format!("~{}", &hex[..5]));
        }

        if let Err(e) = fs::write(&local, &data) {
            tracing::warn!(path = %local.display(), error = %e, "cannot write entry, skipping");
            continue;
        }

        let ft = FileTime::from_unix_time(time.timestamp(), 0);
        if let Err(e) = filetime::set_file_times(&local, ft, ft) {
            tracing::warn!(path = %local.display(), error = %e, "could not set file times");
        }
    }

    Ok(())
}

fn local_path(out_dir: &Path, full_path: &Path) -> PathBuf {
    let stripped = full_path
        .to_string_lossy()
        .trim_start_matches(['/', '\\'])
        .to_string();
    out_dir.join(stripped)
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}
