//! Decode adapter: encoded bytes in, upright RGBA bitmap out.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};
use tracing::debug;

use super::{Bitmap, DecodeError, Orientation};

/// Turns encoded image bytes into a [`Bitmap`].
///
/// The pipeline holds its decoder as `Arc<dyn Decode>` so tests can swap in
/// a spy or a deliberately faulty decoder.
pub trait Decode: Send + Sync {
    /// Decode `bytes` into an upright RGBA bitmap.
    fn decode(&self, bytes: &[u8]) -> Result<Bitmap, DecodeError>;
}

/// Default decoder backed by the `image` crate.
///
/// Accepts any container the enabled `image` codecs understand (PNG, JPEG,
/// WebP, GIF) and applies EXIF orientation the way browsers do when drawing
/// an `<img>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageDecoder;

impl Decode for ImageDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Bitmap, DecodeError> {
        decode_image(bytes)
    }
}

/// Decode an image from bytes, applying EXIF orientation correction.
///
/// The format is sniffed from the leading bytes, not from any file name.
/// The decoder and its intermediate buffers are owned locally and dropped
/// before this function returns, on success and on error.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the container is not recognized,
/// `DecodeError::Corrupted` if it is recognized but cannot be decoded.
pub fn decode_image(bytes: &[u8]) -> Result<Bitmap, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::InvalidFormat);
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::Io(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader.decode()?;
    let orientation = extract_orientation(bytes);
    debug!(
        width = img.width(),
        height = img.height(),
        ?orientation,
        swaps_dimensions = orientation.swaps_dimensions(),
        "decoded image"
    );

    let rgba = apply_orientation(img, orientation).into_rgba8();
    Ok(Bitmap::from_rgba_image(rgba))
}

/// Extract EXIF orientation from the container.
///
/// Returns `Orientation::Normal` if no EXIF data is found or orientation
/// cannot be determined.
pub fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);

    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

/// Apply EXIF orientation transformation to an image.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}
