// THEORY:
// The `Pixel` module is the single-pixel (1D) layer of the engine. A `Pixel` is a
// "dumb" data container: it knows its own channels and how to summarize itself as a
// luminance value, and nothing about neighbors or time.
//
// Luminance is the only heuristic the reveal engine needs. It uses the Rec. 601 luma
// weights (0.299, 0.587, 0.114). To keep frame differencing exact, the weighted sum
// is held in integer "milli-luminance" units (299R + 587G + 114B) and only divided
// by 1000 when a float is requested. A uniform gray shift of N therefore produces a
// delta of exactly N, which keeps the strict threshold comparison deterministic.

pub mod pixel {
    pub type Byte = u8;
    pub type Channel = Byte;
    pub type Luminance = f64;
    /// Luminance scaled by 1000, exact for any 8-bit RGB triple.
    pub type MilliLuminance = u32;

    const RED_WEIGHT: MilliLuminance = 299;
    const GREEN_WEIGHT: MilliLuminance = 587;
    const BLUE_WEIGHT: MilliLuminance = 114;
    pub const MILLI_SCALE: f64 = 1000.0;

    /// A single RGB(A) pixel. Alpha is carried but never weighted.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
        /// The alpha channel value (0-255), 255 for RGB sources.
        pub alpha: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Pixel {
                red,
                green,
                blue,
                alpha,
            }
        }

        /// A fully opaque gray pixel.
        pub fn gray(value: Channel) -> Self {
            Pixel::new(value, value, value, 255)
        }

        /// Weighted channel sum in milli-luminance units (0..=255_000).
        #[inline]
        pub fn milli_luminance(&self) -> MilliLuminance {
            RED_WEIGHT * self.red as MilliLuminance
                + GREEN_WEIGHT * self.green as MilliLuminance
                + BLUE_WEIGHT * self.blue as MilliLuminance
        }

        /// Perceived brightness in the 0..=255 scale.
        pub fn luminance(&self) -> Luminance {
            self.milli_luminance() as Luminance / MILLI_SCALE
        }
    }

    /// Milli-luminance straight from a channel slice, skipping the `Pixel` value.
    /// The slice must hold at least three bytes (R, G, B).
    #[inline]
    pub fn milli_luminance_of(rgb: &[Byte]) -> MilliLuminance {
        RED_WEIGHT * rgb[0] as MilliLuminance
            + GREEN_WEIGHT * rgb[1] as MilliLuminance
            + BLUE_WEIGHT * rgb[2] as MilliLuminance
    }

    impl From<&[Byte]> for Pixel {
        /// Accepts RGB or RGBA byte groups. Missing alpha becomes opaque.
        fn from(bytes: &[Byte]) -> Self {
            match bytes {
                [r, g, b] => Pixel::new(*r, *g, *b, 255),
                [r, g, b, a, ..] => Pixel::new(*r, *g, *b, *a),
                _ => Pixel::default(),
            }
        }
    }

    impl From<Pixel> for [Byte; 4] {
        fn from(pixel: Pixel) -> Self {
            [pixel.red, pixel.green, pixel.blue, pixel.alpha]
        }
    }
}
