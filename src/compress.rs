//! # Compression Framing
//!
//! A CDB file usually arrives zlib-framed: a `0xFFFFFFFF` magic word, the
//! uncompressed size, the compressed size, then a zlib-deflate payload of
//! the declared compressed length. A stream that does not open with the
//! magic is already a raw chunk stream and passes through untouched.
//!
//! The encoder always emits the compressed form. Byte identity is promised
//! for the *decompressed* stream only; two zlib implementations are free
//! to disagree about the compressed bytes.

use crate::error::CdbError;
use eyre::Result;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::borrow::Cow;
use std::io::{Read, Write};
use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

pub const COMPRESSED_MAGIC: u32 = 0xFFFF_FFFF;

const HEADER_SIZE: usize = 12;

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
struct CompressedHeader {
    magic: U32,
    uncompressed_size: U32,
    compressed_size: U32,
}

const _: () = assert!(std::mem::size_of::<CompressedHeader>() == HEADER_SIZE);

/// Returns true if the input opens with the compressed-stream magic.
pub fn is_compressed(input: &[u8]) -> bool {
    input.len() >= 4 && input[..4] == COMPRESSED_MAGIC.to_le_bytes()
}

/// Yields the raw chunk stream, inflating when the framing magic is present.
pub fn decompress(input: &[u8]) -> Result<Cow<'_, [u8]>> {
    if !is_compressed(input) {
        return Ok(Cow::Borrowed(input));
    }
    inflate(input).map(Cow::Owned)
}

fn inflate(input: &[u8]) -> Result<Vec<u8>> {
    if input.len() < HEADER_SIZE {
        return Err(CdbError::ShortRead {
            offset: 0,
            wanted: HEADER_SIZE,
            available: input.len(),
        }
        .into());
    }
    let header = CompressedHeader::ref_from_bytes(&input[..HEADER_SIZE])
        .map_err(|e| eyre::eyre!("failed to parse compression header: {:?}", e))?;

    let compressed_size = header.compressed_size.get() as usize;
    let uncompressed_size = header.uncompressed_size.get() as usize;
    let payload = input
        .get(HEADER_SIZE..HEADER_SIZE + compressed_size)
        .ok_or(CdbError::ShortRead {
            offset: HEADER_SIZE,
            wanted: compressed_size,
            available: input.len() - HEADER_SIZE,
        })?;

    let mut stream = Vec::with_capacity(uncompressed_size);
    ZlibDecoder::new(payload)
        .read_to_end(&mut stream)
        .map_err(|e| CdbError::DecompressionFailed(e.to_string()))?;

    if stream.len() != uncompressed_size {
        return Err(CdbError::DecompressionFailed(format!(
            "inflated to {} bytes, header declared {}",
            stream.len(),
            uncompressed_size
        ))
        .into());
    }

    tracing::debug!(
        compressed = compressed_size,
        uncompressed = uncompressed_size,
        "inflated chunk stream"
    );
    Ok(stream)
}

/// Wraps a raw chunk stream in the compressed framing.
pub fn compress(stream: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(stream)
        .map_err(|e| eyre::eyre!("deflate failed: {}", e))?;
    let payload = encoder
        .finish()
        .map_err(|e| eyre::eyre!("deflate failed: {}", e))?;

    let header = CompressedHeader {
        magic: U32::new(COMPRESSED_MAGIC),
        uncompressed_size: U32::new(stream.len() as u32),
        compressed_size: U32::new(payload.len() as u32),
    };
    tracing::debug!(
        uncompressed = stream.len(),
        compressed = payload.len(),
        "deflated chunk stream"
    );

    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}
