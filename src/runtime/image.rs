use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    rc::Rc,
};

/// Image handle. The default image is empty (no source, zero size).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Image {
    inner: Option<Rc<ImageSource>>,
}

#[derive(Debug, PartialEq)]
struct ImageSource {
    path: PathBuf,
    format: ImageFormat,
    width: u32,
    height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Gif,
    Bmp,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadImageError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path}: unrecognized image format")]
    UnknownFormat { path: PathBuf },
}

impl Image {
    /// Read the header of a PNG, GIF or BMP file to learn its size.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Image, LoadImageError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| LoadImageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let (format, width, height) =
            sniff_header(&bytes).ok_or_else(|| LoadImageError::UnknownFormat {
                path: path.to_path_buf(),
            })?;
        Ok(Image {
            inner: Some(Rc::new(ImageSource {
                path: path.to_path_buf(),
                format,
                width,
                height,
            })),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.inner.as_ref().map(|source| source.path.as_path())
    }

    pub fn format(&self) -> Option<ImageFormat> {
        self.inner.as_ref().map(|source| source.format)
    }

    /// `(width, height)` in pixels; `(0, 0)` for the empty image.
    pub fn size(&self) -> (u32, u32) {
        self.inner
            .as_ref()
            .map(|source| (source.width, source.height))
            .unwrap_or((0, 0))
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Some(source) => write!(f, "@image-url(\"{}\")", source.path.display()),
            None => write!(f, "@image-url(\"\")"),
        }
    }
}

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

fn sniff_header(bytes: &[u8]) -> Option<(ImageFormat, u32, u32)> {
    if bytes.starts_with(PNG_SIGNATURE) {
        // The IHDR chunk always comes first: length, "IHDR", width, height.
        let width = read_u32_be(bytes, 16)?;
        let height = read_u32_be(bytes, 20)?;
        return Some((ImageFormat::Png, width, height));
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        let width = read_u16_le(bytes, 6)? as u32;
        let height = read_u16_le(bytes, 8)? as u32;
        return Some((ImageFormat::Gif, width, height));
    }
    if bytes.starts_with(b"BM") {
        let width = read_u32_le(bytes, 18)?;
        // Negative heights mark top-down bitmaps.
        let height = (read_u32_le(bytes, 22)? as i32).unsigned_abs();
        return Some((ImageFormat::Bmp, width, height));
    }
    None
}

fn read_u32_be(bytes: &[u8], at: usize) -> Option<u32> {
    let chunk: [u8; 4] = bytes.get(at..at + 4)?.try_into().ok()?;
    Some(u32::from_be_bytes(chunk))
}

fn read_u32_le(bytes: &[u8], at: usize) -> Option<u32> {
    let chunk: [u8; 4] = bytes.get(at..at + 4)?.try_into().ok()?;
    Some(u32::from_le_bytes(chunk))
}

fn read_u16_le(bytes: &[u8], at: usize) -> Option<u16> {
    let chunk: [u8; 2] = bytes.get(at..at + 2)?.try_into().ok()?;
    Some(u16::from_le_bytes(chunk))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_header(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes
    }

    #[test]
    fn sniffs_png_size() {
        assert_eq!(sniff_header(&png_header(64, 32)), Some((ImageFormat::Png, 64, 32)));
    }

    #[test]
    fn sniffs_gif_size() {
        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&[10, 0, 20, 0]);
        assert_eq!(sniff_header(&bytes), Some((ImageFormat::Gif, 10, 20)));
    }

    #[test]
    fn truncated_headers_are_rejected() {
        assert_eq!(sniff_header(&PNG_SIGNATURE[..4]), None);
        assert_eq!(sniff_header(b"hello"), None);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Image::load_from_path("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, LoadImageError::Io { .. }));
    }

    #[test]
    fn default_image_is_empty() {
        let image = Image::default();
        assert!(image.is_empty());
        assert_eq!(image.size(), (0, 0));
        assert_eq!(image.path(), None);
    }
}
