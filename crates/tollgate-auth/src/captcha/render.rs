//! PNG rendering of a challenge question.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, Rgba, RgbaImage};
use rand::Rng;

use tollgate_core::error::{AppError, ErrorKind};
use tollgate_core::result::AppResult;

const NOISE_LINES: usize = 5;
const NOISE_DOTS: usize = 50;
const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// 5x7 bitmap of a glyph, one row per byte, bit 4 is the leftmost column.
fn glyph(c: char) -> Option<[u8; 7]> {
    let rows = match c {
        '0' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x0E, 0x11, 0x01, 0x06, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '+' => [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '×' => [0x00, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x00],
        '÷' => [0x00, 0x04, 0x00, 0x1F, 0x00, 0x04, 0x00],
        '=' => [0x00, 0x00, 0x1F, 0x00, 0x1F, 0x00, 0x00],
        '?' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
        _ => return None,
    };
    Some(rows)
}

/// Render `text` with noise and return it as a PNG data URL.
pub fn render_data_url<R: Rng + ?Sized>(
    text: &str,
    width: u32,
    height: u32,
    rng: &mut R,
) -> AppResult<String> {
    let png = render_png(text, width, height, rng)?;
    Ok(format!("{DATA_URL_PREFIX}{}", STANDARD.encode(png)))
}

/// Render `text` onto a `width`×`height` canvas and encode it as PNG.
pub fn render_png<R: Rng + ?Sized>(
    text: &str,
    width: u32,
    height: u32,
    rng: &mut R,
) -> AppResult<Vec<u8>> {
    if width == 0 || height == 0 {
        return Err(AppError::configuration("Captcha image size must be positive"));
    }

    let mut img = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

    for _ in 0..NOISE_LINES {
        let from = (rng.random_range(0..width), rng.random_range(0..height));
        let to = (rng.random_range(0..width), rng.random_range(0..height));
        let color = Rgba([
            rng.random_range(0..128),
            rng.random_range(0..128),
            rng.random_range(0..128),
            255,
        ]);
        draw_line(&mut img, from, to, color);
    }

    for _ in 0..NOISE_DOTS {
        let color = Rgba([rng.random(), rng.random(), rng.random(), 255]);
        img.put_pixel(
            rng.random_range(0..width),
            rng.random_range(0..height),
            color,
        );
    }

    draw_text(&mut img, text, rng);

    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Failed to encode captcha image", e))?;
    Ok(buf)
}

/// Bresenham line, clipped to the canvas.
fn draw_line(img: &mut RgbaImage, from: (u32, u32), to: (u32, u32), color: Rgba<u8>) {
    let (mut x, mut y) = (i64::from(from.0), i64::from(from.1));
    let (x2, y2) = (i64::from(to.0), i64::from(to.1));
    let dx = (x2 - x).abs();
    let dy = (y2 - y).abs();
    let sx = if x < x2 { 1 } else { -1 };
    let sy = if y < y2 { 1 } else { -1 };
    let mut err = dx - dy;

    loop {
        put_clipped(img, x, y, color);
        if x == x2 && y == y2 {
            break;
        }
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
    }
}

fn draw_text<R: Rng + ?Sized>(img: &mut RgbaImage, text: &str, rng: &mut R) {
    let (width, height) = img.dimensions();
    let chars: Vec<char> = text.chars().collect();
    let slot = i64::from(width) / (chars.len() as i64 + 2);
    let scale = (slot / i64::from(GLYPH_WIDTH + 1)).max(1);
    let glyph_height = i64::from(GLYPH_HEIGHT) * scale;

    for (i, c) in chars.iter().enumerate() {
        let Some(rows) = glyph(*c) else {
            continue;
        };
        let left = slot * (i as i64 + 1);
        let top = (i64::from(height) - glyph_height) / 2 + rng.random_range(-5..=5);
        let color = Rgba([
            rng.random_range(50..150),
            rng.random_range(50..150),
            rng.random_range(50..150),
            255,
        ]);

        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                let px = left + i64::from(col) * scale;
                let py = top + row as i64 * scale;
                for dy in 0..scale {
                    for dx in 0..scale {
                        put_clipped(img, px + dx, py + dy, color);
                    }
                }
            }
        }
    }
}

fn put_clipped(img: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) {
        if x < img.width() && y < img.height() {
            img.put_pixel(x, y, color);
        }
    }
}
