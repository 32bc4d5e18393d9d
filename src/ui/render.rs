//! Software framebuffer primitives: pixel packing, a 5x7 bitmap font, rect
//! fills/outlines, and a scaled blit with a global alpha used by the fade
//! transition.

pub const BG_COLOR: [u8; 4] = [24, 24, 24, 255];

// 5x7 bitmap font for ASCII 32..127, one byte per column, LSB = top row.
#[rustfmt::skip]
static FONT_5X7: [u8; 480] = [
    0x00, 0x00, 0x00, 0x00, 0x00, // space
    0x00, 0x00, 0x5F, 0x00, 0x00, // !
    0x00, 0x07, 0x00, 0x07, 0x00, // "
    0x14, 0x7F, 0x14, 0x7F, 0x14, // #
    0x24, 0x2A, 0x7F, 0x2A, 0x12, // $
    0x23, 0x13, 0x08, 0x64, 0x62, // %
    0x36, 0x49, 0x55, 0x22, 0x50, // &
    0x00, 0x05, 0x03, 0x00, 0x00, // '
    0x00, 0x1C, 0x22, 0x41, 0x00, // (
    0x00, 0x41, 0x22, 0x1C, 0x00, // )
    0x14, 0x08, 0x3E, 0x08, 0x14, // *
    0x08, 0x08, 0x3E, 0x08, 0x08, // +
    0x00, 0x50, 0x30, 0x00, 0x00, // ,
    0x08, 0x08, 0x08, 0x08, 0x08, // -
    0x00, 0x60, 0x60, 0x00, 0x00, // .
    0x20, 0x10, 0x08, 0x04, 0x02, // /
    0x3E, 0x51, 0x49, 0x45, 0x3E, // 0
    0x00, 0x42, 0x7F, 0x40, 0x00, // 1
    0x42, 0x61, 0x51, 0x49, 0x46, // 2
    0x21, 0x41, 0x45, 0x4B, 0x31, // 3
    0x18, 0x14, 0x12, 0x7F, 0x10, // 4
    0x27, 0x45, 0x45, 0x45, 0x39, // 5
    0x3C, 0x4A, 0x49, 0x49, 0x30, // 6
    0x01, 0x71, 0x09, 0x05, 0x03, // 7
    0x36, 0x49, 0x49, 0x49, 0x36, // 8
    0x06, 0x49, 0x49, 0x29, 0x1E, // 9
    0x00, 0x36, 0x36, 0x00, 0x00, // :
    0x00, 0x56, 0x36, 0x00, 0x00, // ;
    0x08, 0x14, 0x22, 0x41, 0x00, // <
    0x14, 0x14, 0x14, 0x14, 0x14, // =
    0x00, 0x41, 0x22, 0x14, 0x08, // >
    0x02, 0x01, 0x51, 0x09, 0x06, // ?
    0x3E, 0x41, 0x5D, 0x55, 0x1E, // @
    0x7E, 0x11, 0x11, 0x11, 0x7E, // A
    0x7F, 0x49, 0x49, 0x49, 0x36, // B
    0x3E, 0x41, 0x41, 0x41, 0x22, // C
    0x7F, 0x41, 0x41, 0x22, 0x1C, // D
    0x7F, 0x49, 0x49, 0x49, 0x41, // E
    0x7F, 0x09, 0x09, 0x09, 0x01, // F
    0x3E, 0x41, 0x49, 0x49, 0x7A, // G
    0x7F, 0x08, 0x08, 0x08, 0x7F, // H
    0x00, 0x41, 0x7F, 0x41, 0x00, // I
    0x20, 0x40, 0x41, 0x3F, 0x01, // J
    0x7F, 0x08, 0x14, 0x22, 0x41, // K
    0x7F, 0x40, 0x40, 0x40, 0x40, // L
    0x7F, 0x02, 0x0C, 0x02, 0x7F, // M
    0x7F, 0x04, 0x08, 0x10, 0x7F, // N
    0x3E, 0x41, 0x41, 0x41, 0x3E, // O
    0x7F, 0x09, 0x09, 0x09, 0x06, // P
    0x3E, 0x41, 0x51, 0x21, 0x5E, // Q
    0x7F, 0x09, 0x19, 0x29, 0x46, // R
    0x46, 0x49, 0x49, 0x49, 0x31, // S
    0x01, 0x01, 0x7F, 0x01, 0x01, // T
    0x3F, 0x40, 0x40, 0x40, 0x3F, // U
    0x1F, 0x20, 0x40, 0x20, 0x1F, // V
    0x3F, 0x40, 0x38, 0x40, 0x3F, // W
    0x63, 0x14, 0x08, 0x14, 0x63, // X
    0x07, 0x08, 0x70, 0x08, 0x07, // Y
    0x61, 0x51, 0x49, 0x45, 0x43, // Z
    0x00, 0x7F, 0x41, 0x41, 0x00, // [
    0x02, 0x04, 0x08, 0x10, 0x20, // backslash
    0x00, 0x41, 0x41, 0x7F, 0x00, // ]
    0x04, 0x02, 0x01, 0x02, 0x04, // ^
    0x40, 0x40, 0x40, 0x40, 0x40, // _
    0x00, 0x01, 0x02, 0x04, 0x00, // `
    0x20, 0x54, 0x54, 0x54, 0x78, // a
    0x7F, 0x48, 0x44, 0x44, 0x38, // b
    0x38, 0x44, 0x44, 0x44, 0x20, // c
    0x38, 0x44, 0x44, 0x48, 0x7F, // d
    0x38, 0x54, 0x54, 0x54, 0x18, // e
    0x08, 0x7E, 0x09, 0x01, 0x02, // f
    0x0C, 0x52, 0x52, 0x52, 0x3E, // g
    0x7F, 0x08, 0x04, 0x04, 0x78, // h
    0x00, 0x44, 0x7D, 0x40, 0x00, // i
    0x20, 0x40, 0x44, 0x3D, 0x00, // j
    0x7F, 0x10, 0x28, 0x44, 0x00, // k
    0x00, 0x41, 0x7F, 0x40, 0x00, // l
    0x7C, 0x04, 0x18, 0x04, 0x78, // m
    0x7C, 0x08, 0x04, 0x04, 0x78, // n
    0x38, 0x44, 0x44, 0x44, 0x38, // o
    0x7C, 0x14, 0x14, 0x14, 0x08, // p
    0x08, 0x14, 0x14, 0x18, 0x7C, // q
    0x7C, 0x08, 0x04, 0x04, 0x08, // r
    0x48, 0x54, 0x54, 0x54, 0x20, // s
    0x04, 0x3F, 0x44, 0x40, 0x20, // t
    0x3C, 0x40, 0x40, 0x20, 0x7C, // u
    0x1C, 0x20, 0x40, 0x20, 0x1C, // v
    0x3C, 0x40, 0x30, 0x40, 0x3C, // w
    0x44, 0x28, 0x10, 0x28, 0x44, // x
    0x0C, 0x50, 0x50, 0x50, 0x3C, // y
    0x44, 0x64, 0x54, 0x4C, 0x44, // z
    0x00, 0x08, 0x36, 0x41, 0x00, // {
    0x00, 0x00, 0x7F, 0x00, 0x00, // |
    0x00, 0x41, 0x36, 0x08, 0x00, // }
    0x10, 0x08, 0x08, 0x10, 0x08, // ~
    0x00, 0x00, 0x00, 0x00, 0x00, // DEL (blank)
];

/// Pack RGB into softbuffer u32 format: 0x00RRGGBB.
pub fn rgb(r: u8, g: u8, b: u8) -> u32 {
    (r as u32) << 16 | (g as u32) << 8 | b as u32
}

fn unpack_rgb(v: u32) -> (u8, u8, u8) {
    ((v >> 16) as u8, (v >> 8) as u8, v as u8)
}

fn blend(buf: &mut [u32], off: usize, color: (u8, u8, u8), a: u32) {
    let (dr, dg, db) = unpack_rgb(buf[off]);
    let r = ((color.0 as u32 * a + dr as u32 * (255 - a)) / 255) as u8;
    let g = ((color.1 as u32 * a + dg as u32 * (255 - a)) / 255) as u8;
    let b = ((color.2 as u32 * a + db as u32 * (255 - a)) / 255) as u8;
    buf[off] = rgb(r, g, b);
}

fn draw_char(
    buf: &mut [u32],
    stride: u32,
    buf_h: u32,
    ch: char,
    px: i32,
    py: i32,
    scale: u32,
    color: (u8, u8, u8, u8),
) {
    let idx = (ch as u32).wrapping_sub(32) as usize;
    if idx >= 96 {
        return;
    }
    let glyph = &FONT_5X7[idx * 5..idx * 5 + 5];
    let a = color.3 as u32;
    for col in 0..5u32 {
        let bits = glyph[col as usize];
        for row in 0..7u32 {
            if bits & (1 << row) == 0 {
                continue;
            }
            for sy in 0..scale {
                for sx in 0..scale {
                    let x = px + (col * scale + sx) as i32;
                    let y = py + (row * scale + sy) as i32;
                    if x >= 0 && y >= 0 && (x as u32) < stride && (y as u32) < buf_h {
                        let off = (y as u32 * stride + x as u32) as usize;
                        blend(buf, off, (color.0, color.1, color.2), a);
                    }
                }
            }
        }
    }
}

/// Draw a string. Returns the x position after the last character.
pub fn draw_text(
    buf: &mut [u32],
    stride: u32,
    buf_h: u32,
    text: &str,
    px: i32,
    py: i32,
    scale: u32,
    color: (u8, u8, u8, u8),
) -> i32 {
    let mut x = px;
    for ch in text.chars() {
        draw_char(buf, stride, buf_h, ch, x, py, scale, color);
        x += (6 * scale) as i32; // 5 pixels + 1 spacing
    }
    x
}

/// Pixel width of `text` at `scale`, for centering.
pub fn text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * 6 * scale
}

/// Fill a rectangle with alpha blending.
pub fn fill_rect(
    buf: &mut [u32],
    stride: u32,
    buf_h: u32,
    rx: i32,
    ry: i32,
    rw: u32,
    rh: u32,
    color: (u8, u8, u8, u8),
) {
    let a = color.3 as u32;
    for row in 0..rh {
        let y = ry + row as i32;
        if y < 0 || y as u32 >= buf_h {
            continue;
        }
        for col in 0..rw {
            let x = rx + col as i32;
            if x < 0 || x as u32 >= stride {
                continue;
            }
            let off = (y as u32 * stride + x as u32) as usize;
            blend(buf, off, (color.0, color.1, color.2), a);
        }
    }
}

/// Rectangle outline, `thickness` pixels thick, drawn inward.
pub fn draw_rect_outline(
    buf: &mut [u32],
    stride: u32,
    buf_h: u32,
    rx: i32,
    ry: i32,
    rw: u32,
    rh: u32,
    thickness: u32,
    color: (u8, u8, u8, u8),
) {
    let t = thickness.min(rw / 2).min(rh / 2).max(1);
    fill_rect(buf, stride, buf_h, rx, ry, rw, t, color);
    fill_rect(buf, stride, buf_h, rx, ry + (rh - t) as i32, rw, t, color);
    fill_rect(buf, stride, buf_h, rx, ry, t, rh, color);
    fill_rect(buf, stride, buf_h, rx + (rw - t) as i32, ry, t, rh, color);
}

/// Scale factor that fits an image inside a box without cropping.
pub fn fit_scale(img_w: f32, img_h: f32, box_w: f32, box_h: f32) -> f32 {
    (box_w / img_w).min(box_h / img_h)
}

/// Nearest-neighbor scaled blit of RGBA bytes into the framebuffer.
///
/// `global_alpha` multiplies each source pixel's own alpha; the fade
/// transition renders outgoing and incoming photos through it.
pub fn blit_scaled(
    dst: &mut [u32],
    dst_w: u32,
    dst_h: u32,
    src: &[u8],
    src_w: u32,
    src_h: u32,
    x0: f32,
    y0: f32,
    scale: f32,
    global_alpha: u8,
) {
    if global_alpha == 0 {
        return;
    }
    let draw_w = src_w as f32 * scale;
    let draw_h = src_h as f32 * scale;

    let dx_start = x0.max(0.0) as u32;
    let dy_start = y0.max(0.0) as u32;
    let dx_end = ((x0 + draw_w).ceil() as u32).min(dst_w);
    let dy_end = ((y0 + draw_h).ceil() as u32).min(dst_h);

    let inv_scale = 1.0 / scale;
    let ga = global_alpha as u32;

    for dy in dy_start..dy_end {
        let sy = ((dy as f32 - y0) * inv_scale) as u32;
        if sy >= src_h {
            continue;
        }
        for dx in dx_start..dx_end {
            let sx = ((dx as f32 - x0) * inv_scale) as u32;
            if sx >= src_w {
                continue;
            }
            let si = (sy as usize * src_w as usize + sx as usize) * 4;
            let di = dy as usize * dst_w as usize + dx as usize;
            let a = src[si + 3] as u32 * ga / 255;
            if a == 255 {
                dst[di] = rgb(src[si], src[si + 1], src[si + 2]);
            } else if a > 0 {
                blend(dst, di, (src[si], src[si + 1], src[si + 2]), a);
            }
        }
    }
}
