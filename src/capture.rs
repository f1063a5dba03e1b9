use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

pub const INVALID_IMAGE_WARNING: &str = "Por favor sube una imagen válida.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// Standard-alphabet base64 of the raw file bytes, no data-URI prefix.
    pub data: String,
    pub mime: &'static str,
}

/// Reads the file behind a typed or pasted path and packages it for the
/// model. Magic bytes decide the mime type; the extension is only a
/// fallback for files too short to sniff or with unknown headers.
pub fn load_image_payload(raw: &str) -> Result<ImagePayload> {
    let cleaned = sanitize_path(raw);
    if cleaned.is_empty() {
        return Err(anyhow::anyhow!("empty path"));
    }
    let path = expand_home(&cleaned);
    let bytes = fs::read(&path).with_context(|| format!("failed reading {}", path.display()))?;
    let mime = sniff_mime(&bytes)
        .or_else(|| mime_for_path(&path))
        .ok_or_else(|| anyhow::anyhow!("{} is not a supported image", path.display()))?;
    Ok(ImagePayload {
        data: BASE64.encode(&bytes),
        mime,
    })
}

/// Terminals paste drag-dropped files quoted or with escaped spaces.
pub fn sanitize_path(raw: &str) -> String {
    let mut cleaned = raw.trim().to_string();
    if cleaned.len() >= 2
        && ((cleaned.starts_with('"') && cleaned.ends_with('"'))
            || (cleaned.starts_with('\'') && cleaned.ends_with('\'')))
    {
        cleaned = cleaned[1..cleaned.len() - 1].to_string();
    }
    cleaned.replace("\\ ", " ").trim().to_string()
}

pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Ok(home) = env::var("HOME")
    {
        return PathBuf::from(home).join(rest);
    }
    PathBuf::from(path)
}

pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    None
}

pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_quotes_and_escapes() {
        assert_eq!(
            sanitize_path(" '/tmp/partido final.png' \n"),
            "/tmp/partido final.png"
        );
        assert_eq!(
            sanitize_path("\"/tmp/captura.jpg\""),
            "/tmp/captura.jpg"
        );
        assert_eq!(
            sanitize_path("/tmp/mi\\ partido.png"),
            "/tmp/mi partido.png"
        );
    }

    #[test]
    fn lone_quote_is_kept() {
        assert_eq!(sanitize_path("'"), "'");
        assert_eq!(sanitize_path("'/tmp/x.png"), "'/tmp/x.png");
    }

    #[test]
    fn sniffs_common_headers() {
        assert_eq!(
            sniff_mime(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00]),
            Some("image/png")
        );
        assert_eq!(sniff_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(sniff_mime(b"GIF89a..."), Some("image/gif"));
        assert_eq!(sniff_mime(b"RIFF\x10\x00\x00\x00WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff_mime(b"plain text"), None);
        assert_eq!(sniff_mime(b""), None);
    }

    #[test]
    fn extension_fallback_covers_image_types_only() {
        assert_eq!(mime_for_path(Path::new("a.PNG")), Some("image/png"));
        assert_eq!(mime_for_path(Path::new("a.jpeg")), Some("image/jpeg"));
        assert_eq!(mime_for_path(Path::new("a.webp")), Some("image/webp"));
        assert_eq!(mime_for_path(Path::new("a.gif")), Some("image/gif"));
        assert_eq!(mime_for_path(Path::new("a.pdf")), None);
        assert_eq!(mime_for_path(Path::new("noext")), None);
    }
}
