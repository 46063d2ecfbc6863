//! Minimal PNG encoder for 8-bit grayscale and RGB images.
//!
//! Scanlines are stored unfiltered and compressed with zlib.

use std::io::Write;

/// PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// PNG color types supported by this encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorType {
    Gray,
    Rgb,
}

impl ColorType {
    fn code(self) -> u8 {
        match self {
            Self::Gray => 0,
            Self::Rgb => 2,
        }
    }

    fn channels(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgb => 3,
        }
    }
}

/// Encode 8-bit grayscale pixels (one byte per pixel, row-major).
pub fn create_png_gray(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>, String> {
    encode(pixels, width, height, ColorType::Gray)
}

/// Encode 8-bit RGB pixels (three bytes per pixel, row-major).
pub fn create_png_rgb(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>, String> {
    encode(pixels, width, height, ColorType::Rgb)
}

fn encode(pixels: &[u8], width: usize, height: usize, color: ColorType) -> Result<Vec<u8>, String> {
    let row_bytes = width * color.channels();
    if width == 0 || height == 0 {
        return Err(format!("invalid image size {}x{}", width, height));
    }
    if pixels.len() != row_bytes * height {
        return Err(format!(
            "expected {} bytes for {}x{} {:?}, got {}",
            row_bytes * height,
            width,
            height,
            color,
            pixels.len()
        ));
    }

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);

    let mut ihdr_data = Vec::with_capacity(13);
    ihdr_data.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr_data.extend_from_slice(&(height as u32).to_be_bytes());
    ihdr_data.push(8); // bit depth
    ihdr_data.push(color.code());
    ihdr_data.push(0); // compression method
    ihdr_data.push(0); // filter method
    ihdr_data.push(0); // interlace method
    write_chunk(&mut png, b"IHDR", &ihdr_data);

    let idat_data = deflate_idat(pixels, row_bytes)
        .map_err(|e| format!("IDAT compression failed: {}", e))?;
    write_chunk(&mut png, b"IDAT", &idat_data);

    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Length, type, data, CRC over type + data.
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

fn deflate_idat(pixels: &[u8], row_bytes: usize) -> std::io::Result<Vec<u8>> {
    let rows = pixels.len() / row_bytes;
    let mut uncompressed = Vec::with_capacity(rows * (1 + row_bytes));
    for row in pixels.chunks_exact(row_bytes) {
        uncompressed.push(0); // filter type: none
        uncompressed.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(&uncompressed)?;
    encoder.finish()
}
