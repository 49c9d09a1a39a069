/// A raw pixel snapshot with explicit geometry, e.g. a canvas readback.
/// `pixels` is tightly packed RGBA, row-major, `width * height * 4` bytes.
#[derive(Clone, Debug)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }
}

/// The forms an image can reach the classifier in.
#[derive(Clone, Debug)]
pub enum PixelSource {
    /// Already-decoded RGBA pixels.
    Raw(PixelBuffer),
    /// Bytes of an encoded image file (PNG, JPEG, ...).
    Encoded(Vec<u8>),
    /// A `data:<mime>;base64,<payload>` URL, as produced by a canvas export
    /// or a file reader in the hosting UI.
    DataUrl(String),
}
