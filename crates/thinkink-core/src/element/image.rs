//! Embedded raster image payloads.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Encodings accepted for embedded images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
    Gif,
    Bmp,
}

const ALL_FORMATS: [ImageFormat; 5] = [
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Webp,
    ImageFormat::Gif,
    ImageFormat::Bmp,
];

impl ImageFormat {
    /// Short name used in MIME types and file extensions.
    pub fn name(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Webp => "webp",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
        }
    }

    /// Case-insensitive; `jpg` is accepted as JPEG.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        if ext == "jpg" {
            return Some(Self::Jpeg);
        }
        ALL_FORMATS.into_iter().find(|format| format.name() == ext)
    }

    pub fn from_mime_type(mime: &str) -> Option<Self> {
        mime.strip_prefix("image/").and_then(Self::from_extension)
    }

    fn matches_signature(self, data: &[u8]) -> bool {
        match self {
            Self::Png => data.starts_with(b"\x89PNG"),
            Self::Jpeg => data.starts_with(&[0xFF, 0xD8, 0xFF]),
            Self::Webp => data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP",
            Self::Gif => data.starts_with(b"GIF8"),
            Self::Bmp => data.starts_with(b"BM"),
        }
    }

    /// Sniff the encoding from leading signature bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }
        ALL_FORMATS.into_iter().find(|format| format.matches_signature(data))
    }
}

/// Encoded image bytes embedded in a document.
///
/// Stored as base64 so documents stay plain JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageData {
    pub format: ImageFormat,
    pub data_base64: String,
}

impl ImageData {
    /// Wrap raw bytes. Returns None when the format isn't recognized.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let format = ImageFormat::from_magic_bytes(bytes)?;
        Some(Self {
            format,
            data_base64: STANDARD.encode(bytes),
        })
    }

    /// Parse a `data:image/...;base64,` URL.
    pub fn from_data_url(url: &str) -> Option<Self> {
        let rest = url.strip_prefix("data:")?;
        let (mime, payload) = rest.split_once(";base64,")?;
        let format = ImageFormat::from_mime_type(mime)?;
        Some(Self {
            format,
            data_base64: payload.to_string(),
        })
    }

    /// Decode the base64 payload.
    pub fn bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data_base64)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.format.mime_type(), self.data_base64)
    }

    /// Hash of the encoded content. Equal payloads share a key; distinct ones
    /// may collide, so callers compare payloads on a hit.
    pub fn content_key(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.data_base64.hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_magic_bytes() {
        assert_eq!(ImageFormat::from_magic_bytes(&PNG_HEADER), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF89a"), Some(ImageFormat::Gif));
        assert_eq!(ImageFormat::from_magic_bytes(b"nope"), None);
        assert_eq!(ImageFormat::from_magic_bytes(&[1, 2]), None);
    }

    #[test]
    fn test_data_url_roundtrip() {
        let data = ImageData::from_bytes(&PNG_HEADER).unwrap();
        let url = data.to_data_url();
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(ImageData::from_data_url(&url), Some(data.clone()));
        assert_eq!(data.bytes().unwrap(), PNG_HEADER.to_vec());
    }

    #[test]
    fn test_content_key_is_content_based() {
        let a = ImageData::from_bytes(&PNG_HEADER).unwrap();
        let b = ImageData::from_bytes(&PNG_HEADER).unwrap();
        assert_eq!(a.content_key(), b.content_key());
    }

    #[test]
    fn test_mime_and_extension() {
        assert_eq!(ImageFormat::from_extension("JPG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_mime_type("image/webp"), Some(ImageFormat::Webp));
        assert_eq!(ImageFormat::from_mime_type("text/plain"), None);
    }
}
