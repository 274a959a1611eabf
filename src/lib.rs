//! Reader and decoder library for a proprietary game engine's asset
//! bundles: a cache/TOC archive format with a custom LZ77 variant, a
//! `Packages.bin` catalog with per-package text payloads and inheritance,
//! and a sibling `Languages.bin` localization catalog.
//!
//! Module map:
//! - [`binreader`] — little-endian primitive reads over a byte source (A)
//! - [`lz`] — the chunked LZ77-variant decompressor (B)
//! - [`cache`] — TOC parsing and cache archive extraction (C)
//! - [`packages`] — `Packages.bin` reader and inheritance resolver (D, F)
//! - [`grammar`] — the package text mini-language parser (E)
//! - [`value`] — the generic value tree produced by the grammar (E)
//! - [`languages`] — `Languages.bin` reader (G)
//! - [`error`] — the per-subsystem error taxonomy (H)

pub mod binreader;
pub mod cache;
pub mod error;
pub mod grammar;
pub mod languages;
pub mod lz;
pub mod packages;
pub mod value;

pub use error::{Error, Result};
