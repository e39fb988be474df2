//! Minimal RGBA PNG encoder (8-bit, colour type 6, no interlace).
//!
//! Overlays are a handful of flat colours over large transparent areas, so
//! scanlines are stored unfiltered and left to deflate.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{PreviewError, Result};

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];
const BYTES_PER_PIXEL: usize = 4;

/// Encode RGBA pixel data as a PNG file.
///
/// # Arguments
/// - `pixels`: RGBA bytes, row-major, top row first
/// - `width`: Image width in pixels
/// - `height`: Image height in pixels
pub fn encode_rgba(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    let expected = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(BYTES_PER_PIXEL));
    let fits_u32 = u32::try_from(width).is_ok() && u32::try_from(height).is_ok();
    if width == 0 || height == 0 || !fits_u32 || expected != Some(pixels.len()) {
        return Err(PreviewError::InvalidDimensions {
            width,
            height,
            len: pixels.len(),
        });
    }

    let idat = deflate_scanlines(pixels, width)?;

    let mut png = Vec::with_capacity(SIGNATURE.len() + idat.len() + 64);
    png.extend_from_slice(&SIGNATURE);
    write_chunk(&mut png, b"IHDR", &header(width as u32, height as u32));
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

fn header(width: u32, height: u32) -> [u8; 13] {
    let mut ihdr = [0u8; 13];
    ihdr[0..4].copy_from_slice(&width.to_be_bytes());
    ihdr[4..8].copy_from_slice(&height.to_be_bytes());
    ihdr[8] = 8; // bit depth
    ihdr[9] = 6; // RGBA
    // compression, filter and interlace methods stay 0
    ihdr
}

/// Length, type, data, then CRC over type and data.
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

fn deflate_scanlines(pixels: &[u8], width: usize) -> Result<Vec<u8>> {
    let stride = width * BYTES_PER_PIXEL;
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());

    for row in pixels.chunks_exact(stride) {
        encoder.write_all(&[0])?; // filter type: none
        encoder.write_all(row)?;
    }

    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_types(png: &[u8]) -> Vec<String> {
        let mut types = Vec::new();
        let mut pos = SIGNATURE.len();
        while pos + 8 <= png.len() {
            let len = u32::from_be_bytes([png[pos], png[pos + 1], png[pos + 2], png[pos + 3]]) as usize;
            types.push(String::from_utf8_lossy(&png[pos + 4..pos + 8]).to_string());
            pos += 12 + len;
        }
        types
    }

    #[test]
    fn test_png_structure() {
        let pixels = [255, 0, 0, 255, 0, 0, 0, 0];
        let png = encode_rgba(&pixels, 2, 1).unwrap();

        assert_eq!(&png[..8], &SIGNATURE);
        assert_eq!(chunk_types(&png), vec!["IHDR", "IDAT", "IEND"]);
        // IHDR width and height
        assert_eq!(&png[16..20], &2u32.to_be_bytes());
        assert_eq!(&png[20..24], &1u32.to_be_bytes());
        assert_eq!(png[25], 6);
    }

    #[test]
    fn test_iend_crc() {
        let png = encode_rgba(&[0, 0, 0, 0], 1, 1).unwrap();
        // CRC of "IEND" with no data is fixed
        assert_eq!(&png[png.len() - 4..], &[0xAE, 0x42, 0x60, 0x82]);
    }

    #[test]
    fn test_rejects_mismatched_buffer() {
        assert!(matches!(
            encode_rgba(&[0; 12], 2, 2),
            Err(PreviewError::InvalidDimensions { .. })
        ));
        assert!(encode_rgba(&[], 0, 0).is_err());
    }
}
