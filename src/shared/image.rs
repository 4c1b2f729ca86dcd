/// ARGB32 pixel buffer (icons, snapshots of window contents)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    /// Row-major, one `0xAARRGGBB` word per pixel
    pub pixels: Vec<u32>,
}

impl Image {
    /// Build an image, rejecting buffers whose length does not match the size.
    pub fn new(width: u32, height: u32, pixels: Vec<u32>) -> Option<Self> {
        let expected = (width as usize).checked_mul(height as usize)?;
        if expected == 0 || pixels.len() != expected {
            return None;
        }
        Some(Self { width, height, pixels })
    }

    /// Solid-colour image
    pub fn filled(width: u32, height: u32, argb: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![argb; width as usize * height as usize],
        }
    }

    /// Placeholder shown for windows without any icon
    pub fn placeholder() -> Self {
        const SIZE: u32 = 32;
        const FRAME: u32 = 0xff5e81ac;
        const FILL: u32 = 0xff3b4252;
        let mut image = Self::filled(SIZE, SIZE, FILL);
        for y in 0..SIZE {
            for x in 0..SIZE {
                if x < 2 || y < 2 || x >= SIZE - 2 || y >= SIZE - 2 {
                    image.pixels[(y * SIZE + x) as usize] = FRAME;
                }
            }
        }
        image
    }
}
