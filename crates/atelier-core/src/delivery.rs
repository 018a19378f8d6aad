//! Helpers for storing and serving transcoded images.

pub use crate::pipeline::WEBP_CONTENT_TYPE;

/// Parameters for [`optimized_url`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryParams {
    /// Requested render quality, 1-100.
    pub quality: u8,
    /// Requested render width in pixels.
    pub width: u32,
    /// Substring identifying URLs served by the storage backend.
    pub storage_host: String,
}

impl Default for DeliveryParams {
    fn default() -> Self {
        Self {
            quality: 85,
            width: 800,
            storage_host: "supabase.co".to_string(),
        }
    }
}

/// Ask the storage backend for a resized WebP rendition of `url`.
///
/// URLs from other hosts are returned untouched.
pub fn optimized_url(url: &str, params: &DeliveryParams) -> String {
    if url.is_empty() || !url.contains(params.storage_host.as_str()) {
        return url.to_string();
    }
    format!(
        "{url}?width={}&quality={}&format=webp",
        params.width, params.quality
    )
}

/// Object key for an uploaded transcode, e.g. `avatar-1700000000000.webp`.
pub fn object_name(prefix: &str, timestamp_ms: u64) -> String {
    format!("{prefix}-{timestamp_ms}.webp")
}

#[cfg(test)]
mod tests {
    use super::*;

    const STORAGE_URL: &str =
        "https://abc.supabase.co/storage/v1/object/public/gallery/piece.webp";

    #[test]
    fn test_optimized_url_defaults() {
        assert_eq!(
            optimized_url(STORAGE_URL, &DeliveryParams::default()),
            format!("{STORAGE_URL}?width=800&quality=85&format=webp")
        );
    }

    #[test]
    fn test_optimized_url_custom() {
        let params = DeliveryParams {
            quality: 60,
            width: 400,
            ..DeliveryParams::default()
        };
        assert_eq!(
            optimized_url(STORAGE_URL, &params),
            format!("{STORAGE_URL}?width=400&quality=60&format=webp")
        );
    }

    #[test]
    fn test_foreign_url_untouched() {
        let url = "https://cdn.example.com/a.png";
        assert_eq!(optimized_url(url, &DeliveryParams::default()), url);
    }

    #[test]
    fn test_empty_url() {
        assert_eq!(optimized_url("", &DeliveryParams::default()), "");
    }

    #[test]
    fn test_object_name() {
        assert_eq!(object_name("avatar", 1_700_000_000_000), "avatar-1700000000000.webp");
        assert_eq!(object_name("commission", 5), "commission-5.webp");
    }

    #[test]
    fn test_content_type() {
        assert_eq!(WEBP_CONTENT_TYPE, "image/webp");
    }
}
