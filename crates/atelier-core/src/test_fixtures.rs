//! Shared fixtures for unit tests.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

use crate::decode::{Bitmap, Decode, DecodeError, ImageDecoder};

/// Opaque RGBA gradient; red follows x, green follows y.
pub fn gradient_rgba(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            ((x * 255) / width.max(1)) as u8,
            ((y * 255) / height.max(1)) as u8,
            128,
            255,
        ])
    })
}

/// [`gradient_rgba`] as a bitmap.
pub fn gradient_bitmap(width: u32, height: u32) -> Bitmap {
    Bitmap::from_rgba_image(gradient_rgba(width, height))
}

/// [`gradient_rgba`] encoded as PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    gradient_rgba(width, height)
        .write_to(&mut buffer, ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

/// [`gradient_rgba`] encoded as JPEG.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let rgb = DynamicImage::ImageRgba8(gradient_rgba(width, height)).into_rgb8();
    let mut buffer = Cursor::new(Vec::new());
    rgb.write_to(&mut buffer, ImageFormat::Jpeg).unwrap();
    buffer.into_inner()
}

/// [`jpeg_bytes`] with an APP1 Exif segment carrying `orientation`.
///
/// The segment sits right after SOI and holds a big-endian TIFF header with
/// a single IFD0 entry (tag 0x0112, SHORT, count 1).
pub fn jpeg_with_orientation(width: u32, height: u32, orientation: u16) -> Vec<u8> {
    let jpeg = jpeg_bytes(width, height);
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"MM\x00\x2A");
    tiff.extend_from_slice(&8_u32.to_be_bytes());
    tiff.extend_from_slice(&1_u16.to_be_bytes());
    tiff.extend_from_slice(&0x0112_u16.to_be_bytes());
    tiff.extend_from_slice(&3_u16.to_be_bytes());
    tiff.extend_from_slice(&1_u32.to_be_bytes());
    tiff.extend_from_slice(&orientation.to_be_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0_u32.to_be_bytes());

    let payload_len = 2 + 6 + tiff.len();
    let mut out = Vec::with_capacity(jpeg.len() + 2 + payload_len);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&(payload_len as u16).to_be_bytes());
    out.extend_from_slice(b"Exif\x00\x00");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Spy decoder: delegates to [`ImageDecoder`] and counts calls.
#[derive(Debug, Default)]
pub struct CountingDecoder {
    calls: AtomicUsize,
}

impl CountingDecoder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Decode for CountingDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Bitmap, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ImageDecoder.decode(bytes)
    }
}
