/// Pixelation sampling: the CPU side of a "pixelSize" shader.
///
/// `pixel_size` is measured against a `REFERENCE_WIDTH`-wide frame, so a
/// given reveal level looks equally coarse whatever the source resolution.
/// Every destination pixel samples the source at the centre of the block
/// it falls into; all pixels of one block therefore share one colour.

/// Width the pixel size is expressed against (assets are authored at
/// 1200×800).
pub const REFERENCE_WIDTH: f32 = 1200.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Largest rect with the source aspect ratio that fits in `dst`, centred.
pub fn fit(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> Rect {
    if src_w == 0 || src_h == 0 || dst_w == 0 || dst_h == 0 {
        return Rect { x: 0, y: 0, w: 0, h: 0 };
    }
    let scale = (dst_w as f32 / src_w as f32).min(dst_h as f32 / src_h as f32);
    let w = ((src_w as f32 * scale).round() as u32).clamp(1, dst_w);
    let h = ((src_h as f32 * scale).round() as u32).clamp(1, dst_h);
    Rect { x: (dst_w - w) / 2, y: (dst_h - h) / 2, w, h }
}

/// Maps destination pixels of a fitted rect back to source pixels.
#[derive(Clone, Copy, Debug)]
pub struct Sampler {
    src_w: u32,
    src_h: u32,
    dst_w: u32,
    dst_h: u32,
    block: f32,
}

impl Sampler {
    pub fn new(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32, pixel_size: f32) -> Self {
        Sampler {
            src_w,
            src_h,
            dst_w: dst_w.max(1),
            dst_h: dst_h.max(1),
            block: pixel_size.max(1.0) * src_w as f32 / REFERENCE_WIDTH,
        }
    }

    /// Block edge length in source pixels.
    #[allow(dead_code)]
    pub fn block(&self) -> f32 {
        self.block
    }

    /// Source pixel for destination pixel `(dx, dy)` (relative to the rect).
    pub fn sample(&self, dx: u32, dy: u32) -> (u32, u32) {
        let sx = (dx as f32 + 0.5) * self.src_w as f32 / self.dst_w as f32;
        let sy = (dy as f32 + 0.5) * self.src_h as f32 / self.dst_h as f32;
        (snap(sx, self.block, self.src_w), snap(sy, self.block, self.src_h))
    }
}

/// Snap a source coordinate to the centre of its block.
fn snap(coord: f32, block: f32, extent: u32) -> u32 {
    let c = if block > 1.0 {
        (coord / block).floor() * block + block * 0.5
    } else {
        coord
    };
    (c.max(0.0) as u32).min(extent.saturating_sub(1))
}
