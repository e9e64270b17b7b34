use crate::palette::Rgb;

/// An RGBA pixel buffer representing a rendered image.
#[derive(Debug, Clone)]
pub struct RenderBuffer {
    pub width: u32,
    pub height: u32,
    /// RGBA pixel data, 4 bytes per pixel, row-major order.
    pub pixels: Vec<u8>,
}

impl RenderBuffer {
    /// Create a buffer filled with one opaque color.
    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        let pixels = color.to_rgba().repeat(width as usize * height as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// RGBA value at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.pixels[idx..idx + 4]);
        Some(px)
    }

    /// Copy `src` into this buffer with its top-left corner at `(x, y)`.
    ///
    /// `src` must fit entirely inside `self`.
    pub fn blit(&mut self, x: u32, y: u32, src: &RenderBuffer) {
        debug_assert!(x + src.width <= self.width && y + src.height <= self.height);
        let stride = self.width as usize * 4;
        let row_len = src.width as usize * 4;
        for (row, src_row) in src.pixels.chunks_exact(row_len).enumerate() {
            let dst_start = (y as usize + row) * stride + x as usize * 4;
            self.pixels[dst_start..dst_start + row_len].copy_from_slice(src_row);
        }
    }
}
