//! Small helpers shared by the package writer and the converter.

use std::borrow::Cow;

/// Decode bytes to a string, handling various encodings.
///
/// This function:
/// 1. First tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. If malformed, tries the hint encoding (e.g. `shift_jis` for Aozora texts)
/// 3. Falls back to Windows-1252
///
/// Uses `Cow<str>` to avoid allocation when the input is valid UTF-8.
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, malformed) = encoding.decode(bytes);
        if !malformed {
            return result;
        }
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Escape text for use in XML content and attribute values.
pub fn escape_xml(s: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(s)
}

/// Format a sequence number as a 4-digit zero-padded id (`0001`).
pub fn format_id(index: usize) -> String {
    format!("{index:04}")
}

/// Extension of the last path component, without the dot.
///
/// Returns an empty string when the file name has no extension.
pub fn extension(path: &str) -> &str {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match name.rfind('.') {
        Some(pos) => &name[pos + 1..],
        None => "",
    }
}

/// Media type derived from a file extension: `image/<ext>`, with `jpg`
/// normalized to `jpeg`.
pub fn image_media_type(ext: &str) -> String {
    match ext.to_lowercase().as_str() {
        "jpg" => "image/jpeg".to_string(),
        other => format!("image/{other}"),
    }
}

/// Whether the media type is one of the raster formats a package may list.
pub fn is_supported_image(media_type: &str) -> bool {
    matches!(media_type, "image/png" | "image/jpeg" | "image/gif")
}

/// Whether a cover location should be downloaded rather than read from disk.
pub fn is_remote(location: &str) -> bool {
    let lower = location.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Normalize an archive entry name: forward slashes, no leading slash.
pub fn normalize_entry_name(name: &str) -> String {
    name.replace('\\', "/").trim_start_matches('/').to_string()
}
