//! The cache body's custom LZ77 variant: literal runs plus 3-byte/4-byte
//! back-references, streamed chunk by chunk (component B, §4.2).
//!
//! Ported from the reference tool's `lz77.lz_decompress`, with the
//! off-by-one assertions relaxed from `<` to `<=` per the design notes —
//! a literal run or back-reference that ends exactly at a buffer boundary
//! is legitimate, not an error.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::Read;

use crate::error::DecompressionError;

/// Decompresses a chunked LZ stream from `source` until `expected_size`
/// bytes have been produced.
pub fn decompress<R: Read>(
    source: &mut R,
    expected_size: usize,
) -> Result<Vec<u8>, DecompressionError> {
    let mut out = Vec::with_capacity(expected_size);

    while out.len() < expected_size {
        let comp_len = source.read_u16::<BigEndian>()?;
        let decomp_len = source.read_u16::<BigEndian>()?;

        let mut compressed = vec![0u8; comp_len as usize];
        source.read_exact(&mut compressed)?;

        let chunk = if comp_len == decomp_len {
            compressed
        } else {
            decompress_chunk(&compressed, decomp_len)?
        };

        if chunk.len() != decomp_len as usize {
            return Err(DecompressionError::ChunkSizeMismatch {
                expected: decomp_len,
                actual: chunk.len(),
            });
        }

        out.extend_from_slice(&chunk);
    }

    if out.len() != expected_size {
        return Err(DecompressionError::StreamSizeMismatch {
            expected: expected_size,
            actual: out.len(),
        });
    }

    Ok(out)
}

/// Decodes one compressed chunk's opcode stream into `decomp_len` bytes.
fn decompress_chunk(compressed: &[u8], decomp_len: u16) -> Result<Vec<u8>, DecompressionError> {
    let decomp_len = decomp_len as usize;
    let mut out = Vec::with_capacity(decomp_len);
    let mut pos = 0usize;

    while pos < compressed.len() {
        let code = compressed[pos];
        pos += 1;

        if code <= 0x1f {
            let len = code as usize + 1;
            let end = pos + len;
            if end > compressed.len() || out.len() + len > decomp_len {
                return Err(DecompressionError::ChunkSizeMismatch {
                    expected: decomp_len as u16,
                    actual: out.len() + len,
                });
            }
            out.extend_from_slice(&compressed[pos..end]);
            pos = end;
        } else {
            let mut copylen_raw = (code >> 5) as usize;
            if copylen_raw == 7 {
                let extra = *compressed
                    .get(pos)
                    .ok_or(DecompressionError::ChunkSizeMismatch {
                        expected: decomp_len as u16,
                        actual: out.len(),
                    })?;
                copylen_raw = 7 + extra as usize;
                pos += 1;
            }
            let copylen = copylen_raw + 2;

            let l = *compressed
                .get(pos)
                .ok_or(DecompressionError::ChunkSizeMismatch {
                    expected: decomp_len as u16,
                    actual: out.len(),
                })?;
            pos += 1;
            let lookback = (((code & 0x1f) as usize) << 8) | l as usize;

            let output_len = out.len();
            if lookback + 1 > output_len {
                return Err(DecompressionError::LookbackUnderflow {
                    lookback,
                    output_len,
                });
            }
            let src = output_len - 1 - lookback;

            if src + copylen > output_len {
                // Overlapping run: copy byte by byte so earlier-copied
                // bytes become valid sources for later ones.
                for i in src..src + copylen {
                    let b = out[i];
                    out.push(b);
                }
            } else {
                let copied = out[src..src + copylen].to_vec();
                out.extend_from_slice(&copied);
            }
        }
    }

    Ok(out)
}
