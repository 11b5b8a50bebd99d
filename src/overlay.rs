use crate::error::MediaError;
use crate::logok;
use anyhow::{Context, Result};
use fontdue::{Font, FontSettings};
use image::{Rgb, RgbImage};
use std::path::Path;

const FONT_SIZE: f32 = 64.0;
const SIDE_PADDING: u32 = 56;
const LINE_GAP: f32 = 20.0;
const TEXT_COLOR: [u8; 3] = [255, 255, 255];

/// Splits a word after each hyphen that sits between two alphanumerics,
/// so `well-known` can break as `well-` / `known`.
fn hyphen_chunks(word: &str) -> Vec<Vec<char>> {
    let chars: Vec<char> = word.chars().collect();
    let mut chunks = Vec::new();
    let mut current = Vec::new();
    for (i, &c) in chars.iter().enumerate() {
        current.push(c);
        let splits = c == '-'
            && i > 0
            && chars[i - 1].is_alphanumeric()
            && chars.get(i + 1).is_some_and(|n| n.is_alphanumeric());
        if splits {
            chunks.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Greedy word wrap. Runs of whitespace collapse to one space, hyphenated
/// words may break after a hyphen and words wider than `width` are split
/// across lines.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        for (n, mut chunk) in hyphen_chunks(word).into_iter().enumerate() {
            let cur_len = current.chars().count();
            // chunks after the first continue the same word without a space
            let sep = usize::from(!current.is_empty() && n == 0);

            if cur_len + sep + chunk.len() <= width {
                if sep == 1 {
                    current.push(' ');
                }
                current.extend(chunk.iter());
                continue;
            }
            if chunk.len() <= width {
                lines.push(std::mem::take(&mut current));
                current = chunk.iter().collect();
                continue;
            }

            // Long chunk: fill what is left of the current line, then whole-width pieces.
            if !current.is_empty() {
                let space_left = width.saturating_sub(cur_len + sep);
                if space_left > 0 {
                    if sep == 1 {
                        current.push(' ');
                    }
                    current.extend(chunk.drain(..space_left));
                }
                lines.push(std::mem::take(&mut current));
            }
            while chunk.len() > width {
                lines.push(chunk.drain(..width).collect());
            }
            current = chunk.into_iter().collect();
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Ink extents of one line, relative to its pen origin on the baseline.
struct LineBox {
    width: f32,
    top: f32,
    bottom: f32,
}

impl LineBox {
    fn height(&self) -> f32 {
        (self.bottom - self.top).max(0.0)
    }
}

fn measure_line(font: &Font, line: &str) -> LineBox {
    let mut pen = 0.0f32;
    let mut left = f32::MAX;
    let mut right = f32::MIN;
    let mut top = f32::MAX;
    let mut bottom = f32::MIN;
    let mut prev: Option<char> = None;

    for ch in line.chars() {
        if let Some(p) = prev {
            pen += font.horizontal_kern(p, ch, FONT_SIZE).unwrap_or(0.0);
        }
        let m = font.metrics(ch, FONT_SIZE);
        if m.width > 0 && m.height > 0 {
            let x0 = pen + m.xmin as f32;
            left = left.min(x0);
            right = right.max(x0 + m.width as f32);
            top = top.min(-(m.ymin as f32 + m.height as f32));
            bottom = bottom.max(-(m.ymin as f32));
        }
        pen += m.advance_width;
        prev = Some(ch);
    }

    if left > right {
        return LineBox { width: 0.0, top: 0.0, bottom: 0.0 };
    }
    LineBox { width: right - left, top, bottom }
}

fn blend(img: &mut RgbImage, x: i32, y: i32, coverage: u8) {
    if coverage == 0 || x < 0 || y < 0 || x as u32 >= img.width() || y as u32 >= img.height() {
        return;
    }
    let a = coverage as f32 / 255.0;
    let Rgb(px) = img.get_pixel_mut(x as u32, y as u32);
    for (c, target) in px.iter_mut().zip(TEXT_COLOR) {
        *c = (*c as f32 * (1.0 - a) + target as f32 * a).round() as u8;
    }
}

fn draw_line(img: &mut RgbImage, font: &Font, line: &str, x: f32, baseline: f32) {
    let mut pen = x;
    let mut prev: Option<char> = None;
    for ch in line.chars() {
        if let Some(p) = prev {
            pen += font.horizontal_kern(p, ch, FONT_SIZE).unwrap_or(0.0);
        }
        let (m, bitmap) = font.rasterize(ch, FONT_SIZE);
        let gx = (pen + m.xmin as f32).round() as i32;
        let gy = (baseline - (m.ymin as f32 + m.height as f32)).round() as i32;
        for row in 0..m.height {
            for col in 0..m.width {
                blend(img, gx + col as i32, gy + row as i32, bitmap[row * m.width + col]);
            }
        }
        pen += m.advance_width;
        prev = Some(ch);
    }
}

pub fn load_font(font_path: &Path) -> Result<Font> {
    if !font_path.is_file() {
        return Err(MediaError::FileNotFound(font_path.to_path_buf()).into());
    }
    let bytes = std::fs::read(font_path)
        .with_context(|| format!("Failed to read font {}", font_path.display()))?;
    Font::from_bytes(bytes, FontSettings::default())
        .map_err(|e| MediaError::Font(format!("{}: {}", font_path.display(), e)).into())
}

/// Renders `quote` in white, wrapped and centred, over the image at
/// `image_path` and writes the result to `output_path`.
pub fn overlay_quote(image_path: &Path, quote: &str, output_path: &Path, font_path: &Path) -> Result<()> {
    let font = load_font(font_path)?;
    let mut img = image::open(image_path)
        .with_context(|| format!("Failed to open image {}", image_path.display()))?
        .to_rgb8();

    let (w, h) = img.dimensions();
    let max_text_width = w.saturating_sub(SIDE_PADDING) as f32;
    let avg_char = font.metrics('A', FONT_SIZE).advance_width.max(1.0);
    let max_chars = (max_text_width / avg_char).floor() as usize;

    let lines = wrap_text(quote, max_chars);
    let boxes: Vec<LineBox> = lines.iter().map(|l| measure_line(&font, l)).collect();

    let mut total: f32 = boxes.iter().map(LineBox::height).sum();
    total += lines.len().saturating_sub(1) as f32 * LINE_GAP;

    let ascent = font
        .horizontal_line_metrics(FONT_SIZE)
        .map(|m| m.ascent)
        .unwrap_or(FONT_SIZE);

    let mut y = (h as f32 - total) / 2.0;
    for (line, bx) in lines.iter().zip(&boxes) {
        let x = (w as f32 - bx.width) / 2.0;
        draw_line(&mut img, &font, line, x, y + ascent);
        y += bx.height() + LINE_GAP;
    }

    img.save(output_path)
        .with_context(|| format!("Failed to save {}", output_path.display()))?;
    logok(format!("Modified image saved to: {}", output_path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_greedily() {
        assert_eq!(
            wrap_text("the quick brown fox jumps", 10),
            vec!["the quick", "brown fox", "jumps"]
        );
        assert_eq!(wrap_text("  spaced   out  ", 20), vec!["spaced out"]);
        assert!(wrap_text("", 10).is_empty());
    }

    #[test]
    fn splits_words_longer_than_width() {
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap_text("ab cdefghij", 5), vec!["ab cd", "efghi", "j"]);
    }

    #[test]
    fn hyphenated_words_break_after_the_hyphen() {
        assert_eq!(wrap_text("a well-known fact", 8), vec!["a well-", "known", "fact"]);
        assert_eq!(wrap_text("a well-known fact", 20), vec!["a well-known fact"]);
        assert_eq!(hyphen_chunks("-x- a--b"), vec![vec!['-', 'x', '-', ' ', 'a', '-', '-', 'b']]);
        assert_eq!(hyphen_chunks("self-made-man").len(), 3);
    }

    #[test]
    fn every_line_fits() {
        let text = "You have power over your mind, not outside events. Realize this, and you will find strength.";
        for width in [8, 15, 27] {
            for line in wrap_text(text, width) {
                assert!(line.chars().count() <= width, "{line:?} > {width}");
            }
        }
    }

    #[test]
    fn missing_font_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let img_path = dir.path().join("in.png");
        RgbImage::new(8, 8).save(&img_path).unwrap();
        let err = overlay_quote(
            &img_path,
            "quote",
            &dir.path().join("out.png"),
            &dir.path().join("missing.ttf"),
        )
        .unwrap_err();
        assert!(matches!(err.downcast_ref::<MediaError>(), Some(MediaError::FileNotFound(_))));
    }

    #[test]
    fn blend_mixes_towards_white_and_ignores_out_of_bounds() {
        let mut img = RgbImage::from_pixel(2, 2, Rgb([0, 0, 0]));
        blend(&mut img, 0, 0, 255);
        blend(&mut img, 1, 0, 128);
        blend(&mut img, 5, 5, 255);
        blend(&mut img, -1, 0, 255);
        assert_eq!(img.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(img.get_pixel(1, 0), &Rgb([128, 128, 128]));
        assert_eq!(img.get_pixel(0, 1), &Rgb([0, 0, 0]));
    }
}
