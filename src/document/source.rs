//! Reading source bytes into SVG text.
//!
//! Compressed containers are probed first, plain text second. The probe is
//! decided by the gzip magic bytes, so the order never depends on the file
//! extension.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use super::LoadError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ZIP_MAGIC: [u8; 4] = [b'P', b'K', 0x03, 0x04];

/// Read a file from disk and decode it to SVG text.
pub fn read_svg(path: &Path) -> Result<String, LoadError> {
    let bytes = fs::read(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
        _ => LoadError::NotReadable(path.to_path_buf(), err),
    })?;
    decode_svg(&bytes)
}

/// Decode raw bytes (`.svg` or `.svgz`) to SVG text.
pub fn decode_svg(bytes: &[u8]) -> Result<String, LoadError> {
    if bytes.starts_with(&GZIP_MAGIC) {
        let inflated = usvg::decompress_svgz(bytes)
            .map_err(|err| LoadError::MalformedContainer(format!("invalid gzip stream: {err}")))?;
        return into_text(inflated);
    }

    if bytes.starts_with(&ZIP_MAGIC) {
        return Err(LoadError::MalformedContainer(
            "zip archives are not supported, extract the drawing first".to_string(),
        ));
    }

    into_text(bytes.to_vec())
}

fn into_text(bytes: Vec<u8>) -> Result<String, LoadError> {
    let mut text = String::from_utf8(bytes)
        .map_err(|err| LoadError::MalformedContainer(format!("not UTF-8 text: {err}")))?;

    // Byte order mark from some editors
    if text.starts_with('\u{feff}') {
        text.drain(..'\u{feff}'.len_utf8());
    }

    if !text.contains("<svg") {
        return Err(LoadError::MalformedContainer(
            "no <svg> element found".to_string(),
        ));
    }
    Ok(text)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use flate2::{Compression, write::GzEncoder};
    use std::io::Write;

    /// Compress `data` into a gzip member, as `.svgz` files are stored.
    pub(crate) fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_decode_plain() {
        let text = decode_svg(b"<svg width=\"1\" height=\"1\"/>").unwrap();
        assert!(text.starts_with("<svg"));
    }

    #[test]
    fn test_decode_strips_bom() {
        let text = decode_svg("\u{feff}<svg/>".as_bytes()).unwrap();
        assert_eq!(text, "<svg/>");
    }

    #[test]
    fn test_decode_gzip() {
        let svg = b"<svg width=\"10\" height=\"10\"></svg>";
        let text = decode_svg(&gzip(svg)).unwrap();
        assert_eq!(text.as_bytes(), svg);
    }

    #[test]
    fn test_decode_broken_gzip() {
        let err = decode_svg(&[0x1f, 0x8b, 0x08, 0x00, 0x01]).unwrap_err();
        assert!(matches!(err, LoadError::MalformedContainer(_)));
    }

    #[test]
    fn test_decode_rejects_non_svg() {
        assert!(matches!(
            decode_svg(b"hello world"),
            Err(LoadError::MalformedContainer(_))
        ));
        assert!(matches!(
            decode_svg(&[0xff, 0xfe, 0x00, 0x3c]),
            Err(LoadError::MalformedContainer(_))
        ));
        assert!(matches!(
            decode_svg(b"PK\x03\x04rest"),
            Err(LoadError::MalformedContainer(_))
        ));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_svg(&dir.path().join("missing.svg")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn test_read_directory_is_not_readable() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_svg(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::NotReadable(..)));
    }
}
