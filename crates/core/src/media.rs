//! Image CDN rendition URLs.
//!
//! Cloudinary serves resized renditions of an uploaded asset when a
//! transformation segment is placed after `/upload/` in its delivery URL:
//!
//! ```text
//! https://res.cloudinary.com/demo/image/upload/v1/vase.jpg
//! https://res.cloudinary.com/demo/image/upload/c_fill,w_500,h_500/v1/vase.jpg
//! ```

const CDN_HOST_MARKER: &str = "cloudinary.com";
const UPLOAD_SEGMENT: &str = "/upload/";

/// Derive a `width`×`height` fill-cropped rendition of a CDN image.
///
/// URLs that are not Cloudinary delivery URLs are returned unchanged.
#[must_use]
pub fn derive_url(url: &str, width: u32, height: u32) -> String {
    if !url.contains(CDN_HOST_MARKER) {
        return url.to_string();
    }

    match url.split_once(UPLOAD_SEGMENT) {
        Some((base, asset)) => {
            format!("{base}{UPLOAD_SEGMENT}c_fill,w_{width},h_{height}/{asset}")
        }
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_url_inserts_transformation() {
        let url = "https://res.cloudinary.com/optimage/image/upload/v1712/vase.jpg";
        assert_eq!(
            derive_url(url, 400, 300),
            "https://res.cloudinary.com/optimage/image/upload/c_fill,w_400,h_300/v1712/vase.jpg"
        );
    }

    #[test]
    fn test_derive_url_leaves_foreign_urls() {
        let url = "https://images.example.com/upload/vase.jpg";
        assert_eq!(derive_url(url, 500, 500), url);
        assert_eq!(derive_url("", 500, 500), "");
    }

    #[test]
    fn test_derive_url_without_upload_segment() {
        let url = "https://res.cloudinary.com/optimage/image/fetch/vase.jpg";
        assert_eq!(derive_url(url, 500, 500), url);
    }
}
