// THEORY:
// A `FrameBuffer` is an owned, validated rectangle of interleaved RGB or RGBA bytes.
// Camera frames and the reference image both arrive as `FrameBuffer`s. Validation
// happens once, at construction, so the hot differencing loop can index the data
// without re-checking the channel layout.
//
// Buffers are moved, never cloned, between ticks: the session keeps the previous
// frame by taking ownership of the current one once analysis is done.

use crate::core_modules::pixel::pixel::{MilliLuminance, Pixel, milli_luminance_of};
use crate::error::{Result, RevealError};
use image::{DynamicImage, RgbImage, RgbaImage};

/// An immutable, row-major RGB(A) pixel buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl FrameBuffer {
    /// Wraps raw interleaved bytes. `channels` must be 3 or 4 and `data` must
    /// cover `width * height` pixels (trailing bytes are tolerated).
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<Self> {
        if channels != 3 && channels != 4 {
            return Err(RevealError::UnsupportedChannels(channels));
        }
        let expected = width as usize * height as usize * channels as usize;
        if data.len() < expected {
            return Err(RevealError::BufferTooShort {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// RGBA convenience constructor, the layout most capture APIs hand out.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        Self::new(width, height, 4, data)
    }

    /// A buffer where every pixel is `pixel`.
    pub fn filled(width: u32, height: u32, pixel: Pixel) -> Self {
        let bytes: [u8; 4] = pixel.into();
        let data = bytes.repeat(width as usize * height as usize);
        Self {
            width,
            height,
            channels: 4,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    #[inline]
    fn byte_index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.channels as usize
    }

    /// The pixel at `(x, y)`, or `None` when outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Pixel> {
        if !self.contains(x, y) {
            return None;
        }
        let start = self.byte_index(x, y);
        self.data
            .get(start..start + self.channels as usize)
            .map(Pixel::from)
    }

    /// Milli-luminance at `(x, y)`, or `None` when outside the buffer.
    #[inline]
    pub fn milli_luminance(&self, x: u32, y: u32) -> Option<MilliLuminance> {
        if !self.contains(x, y) {
            return None;
        }
        let start = self.byte_index(x, y);
        self.data.get(start..start + 3).map(milli_luminance_of)
    }

    /// Overwrites one pixel. Out-of-range coordinates are ignored.
    pub fn put_pixel(&mut self, x: u32, y: u32, pixel: Pixel) {
        if !self.contains(x, y) {
            return;
        }
        let start = self.byte_index(x, y);
        let bytes: [u8; 4] = pixel.into();
        let channels = self.channels as usize;
        self.data[start..start + channels].copy_from_slice(&bytes[..channels]);
    }

    /// Fills the half-open rectangle `[x0, x1) x [y0, y1)`, clipped to the buffer.
    pub fn fill_rect(&mut self, x0: u32, y0: u32, x1: u32, y1: u32, pixel: Pixel) {
        for y in y0..y1.min(self.height) {
            for x in x0..x1.min(self.width) {
                self.put_pixel(x, y, pixel);
            }
        }
    }
}

impl From<RgbaImage> for FrameBuffer {
    fn from(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            channels: 4,
            data: image.into_raw(),
        }
    }
}

impl From<RgbImage> for FrameBuffer {
    fn from(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            channels: 3,
            data: image.into_raw(),
        }
    }
}

impl From<DynamicImage> for FrameBuffer {
    fn from(image: DynamicImage) -> Self {
        match image {
            DynamicImage::ImageRgb8(rgb) => rgb.into(),
            DynamicImage::ImageRgba8(rgba) => rgba.into(),
            other => other.into_rgba8().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unsupported_channels() {
        let err = FrameBuffer::new(2, 2, 2, vec![0; 8]).unwrap_err();
        assert_eq!(err, RevealError::UnsupportedChannels(2));
    }

    #[test]
    fn rejects_short_data() {
        let err = FrameBuffer::from_rgba(2, 2, vec![0; 15]).unwrap_err();
        assert_eq!(
            err,
            RevealError::BufferTooShort {
                expected: 16,
                actual: 15
            }
        );
    }

    #[test]
    fn reads_rgb_and_rgba_layouts() {
        let rgb = FrameBuffer::new(2, 1, 3, vec![10, 20, 30, 40, 50, 60]).unwrap();
        assert_eq!(rgb.pixel(1, 0), Some(Pixel::new(40, 50, 60, 255)));

        let rgba = FrameBuffer::from_rgba(1, 2, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        assert_eq!(rgba.pixel(0, 1), Some(Pixel::new(5, 6, 7, 8)));
        assert_eq!(rgba.pixel(1, 0), None);
        assert_eq!(rgba.milli_luminance(0, 2), None);
    }

    #[test]
    fn fill_rect_clips_to_buffer() {
        let mut frame = FrameBuffer::filled(4, 4, Pixel::gray(0));
        frame.fill_rect(2, 2, 10, 10, Pixel::gray(9));
        assert_eq!(frame.pixel(1, 1), Some(Pixel::gray(0)));
        assert_eq!(frame.pixel(3, 3), Some(Pixel::gray(9)));
    }

    #[test]
    fn converts_from_image_buffers() {
        let image = RgbImage::from_pixel(3, 2, image::Rgb([100, 100, 100]));
        let frame = FrameBuffer::from(DynamicImage::ImageRgb8(image));
        assert_eq!(frame.dimensions(), (3, 2));
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.pixel(2, 1).map(|p| p.luminance()), Some(100.0));
    }
}
