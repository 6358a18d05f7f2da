use std::collections::HashMap;
use std::error::Error;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use rusttype::{Font, Scale, point};

/// Qualitative 20-color palette, used when the destination list fits in it.
/// Larger lists fall back to evenly spaced hues.
const PALETTE: [Rgb<u8>; 20] = [
    Rgb([31, 119, 180]),
    Rgb([174, 199, 232]),
    Rgb([255, 127, 14]),
    Rgb([255, 187, 120]),
    Rgb([44, 160, 44]),
    Rgb([152, 223, 138]),
    Rgb([214, 39, 40]),
    Rgb([255, 152, 150]),
    Rgb([148, 103, 189]),
    Rgb([197, 176, 213]),
    Rgb([140, 86, 75]),
    Rgb([196, 156, 148]),
    Rgb([227, 119, 194]),
    Rgb([247, 182, 210]),
    Rgb([127, 127, 127]),
    Rgb([199, 199, 199]),
    Rgb([188, 189, 34]),
    Rgb([219, 219, 141]),
    Rgb([23, 190, 207]),
    Rgb([158, 218, 229]),
];

fn hue_color(index: usize, n: usize) -> Rgb<u8> {
    let h = index as f32 / n as f32 * 360.0;
    let (s, v) = (0.85f32, 0.9f32);
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match (h / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    Rgb([
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    ])
}

pub fn palette_color(index: usize, n: usize) -> Rgb<u8> {
    if n <= PALETTE.len() {
        PALETTE[index % PALETTE.len()]
    } else {
        hue_color(index, n)
    }
}

/// Assigns each destination label a color by its position in the input list.
/// When a label repeats, the first occurrence's color wins.
pub fn color_map(destinations: &[String]) -> HashMap<String, Rgb<u8>> {
    let n = destinations.len();
    let mut colors = HashMap::new();
    for (i, dest) in destinations.iter().enumerate() {
        colors.entry(dest.clone()).or_insert_with(|| palette_color(i, n));
    }
    colors
}

const FONT_CANDIDATES: &[&str] = &[
    "Arial", "Helvetica", "DejaVuSans", "LiberationSans", "SegoeUI", "Segoe UI", "NotoSans-Regular", "NotoSans", "Cantarell-Regular"
];

fn font_search_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    if cfg!(target_os = "macos") {
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        dirs.push(PathBuf::from("/Library/Fonts"));
        if let Some(home) = dirs_next::home_dir() { dirs.push(home.join("Library/Fonts")); }
    } else if cfg!(target_os = "windows") {
        if let Some(win) = std::env::var_os("WINDIR") { dirs.push(PathBuf::from(win).join("Fonts")); }
        dirs.push(PathBuf::from("C:/Windows/Fonts"));
    } else { // Linux / BSD
        dirs.push(PathBuf::from("/usr/share/fonts"));
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
        if let Some(home) = dirs_next::home_dir() {
            dirs.push(home.join(".fonts"));
            dirs.push(home.join(".local/share/fonts"));
        }
    }
    dirs
}

fn ascii_coverage(font: &Font) -> usize {
    (32u8..=126u8)
        .filter(|&ch| font.glyph(ch as char).id().0 != 0)
        .count()
}

fn find_system_font_data() -> Option<Vec<u8>> {
    // Allow explicit override for debugging or custom font selection
    if let Ok(path) = std::env::var("DRAW_FONT_PATH") {
        if let Ok(bytes) = fs::read(&path) { return Some(bytes); }
    }

    // Walk font dirs recursively; many distros keep fonts in subdirectories
    let mut font_files: Vec<PathBuf> = Vec::new();
    for dir in font_search_dirs() {
        if !dir.exists() { continue; }
        for entry in walkdir::WalkDir::new(&dir).follow_links(true).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_file() { continue; }
            if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                if matches!(ext.to_ascii_lowercase().as_str(), "ttf" | "otf") {
                    font_files.push(path.to_path_buf());
                }
            }
        }
    }

    // Fast path: well-known font names first
    for &cand in FONT_CANDIDATES {
        let hit = font_files.iter().find(|p| {
            p.file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.eq_ignore_ascii_case(cand))
                .unwrap_or(false)
        });
        if let Some(p) = hit {
            if let Ok(data) = fs::read(p) { return Some(data); }
        }
    }

    // Otherwise take the font with the widest printable-ASCII coverage
    let mut best: Option<(usize, PathBuf)> = None;
    for path in font_files {
        let Ok(bytes) = fs::read(&path) else { continue };
        if let Some(font) = Font::try_from_vec(bytes) {
            let score = ascii_coverage(&font);
            if best.as_ref().map(|(s, _)| score > *s).unwrap_or(true) {
                best = Some((score, path));
            }
        }
    }
    best.and_then(|(_, p)| fs::read(p).ok())
}

struct LabelPainter {
    font: Font<'static>,
    scale: Scale,
    line_height: f32,
    ascent: f32,
}

impl LabelPainter {
    fn new(font_data: Vec<u8>, px: f32) -> Result<Self, Box<dyn Error>> {
        let font = Font::try_from_vec(font_data).ok_or("Invalid font data")?;
        let scale = Scale::uniform(px);
        let v = font.v_metrics(scale);
        let line_height = (v.ascent - v.descent + v.line_gap).ceil();
        let ascent = v.ascent;
        Ok(Self { font, scale, line_height, ascent })
    }

    fn text_width(&self, text: &str) -> f32 {
        let glyphs: Vec<_> = self.font.layout(text, self.scale, point(0.0, 0.0)).collect();
        match glyphs.last() {
            Some(last) => last.position().x + last.unpositioned().h_metrics().advance_width,
            None => 0.0,
        }
    }

    /// Draws one line with its horizontal center at `center_x`.
    fn draw_centered(&self, img: &mut RgbImage, text: &str, center_x: f32, top: f32, color: Rgb<u8>) {
        let left = center_x - self.text_width(text) / 2.0;
        self.draw_line(img, text, left, top + self.ascent, color);
    }

    /// Greedy word wrap into `max_w`-wide lines, each centered at `center_x`,
    /// stopping when `max_h` is exhausted.
    fn draw_wrapped_centered(&self, img: &mut RgbImage, text: &str, center_x: f32, top: f32, max_w: f32, max_h: f32, color: Rgb<u8>) {
        let mut lines: Vec<String> = Vec::new();
        let mut line = String::new();
        for word in text.split_whitespace() {
            let candidate = if line.is_empty() { word.to_string() } else { format!("{line} {word}") };
            if !line.is_empty() && self.text_width(&candidate) > max_w {
                lines.push(std::mem::take(&mut line));
                line = word.to_string();
            } else {
                line = candidate;
            }
        }
        if !line.is_empty() { lines.push(line); }

        let mut pen_y = 0.0f32;
        for text_line in lines {
            if pen_y + self.line_height > max_h { break; }
            let left = center_x - self.text_width(&text_line) / 2.0;
            self.draw_line(img, &text_line, left, top + pen_y + self.ascent, color);
            pen_y += self.line_height;
        }
    }

    fn draw_line(&self, img: &mut RgbImage, text: &str, left: f32, baseline_y: f32, color: Rgb<u8>) {
        for glyph in self.font.layout(text, self.scale, point(left, baseline_y)) {
            if let Some(bb) = glyph.pixel_bounding_box() {
                glyph.draw(|x, y, v| {
                    if v < 0.05 { return; }
                    let gx = x as i32 + bb.min.x;
                    let gy = y as i32 + bb.min.y;
                    if gx >= 0 && gy >= 0 && (gx as u32) < img.width() && (gy as u32) < img.height() {
                        let dst = img.get_pixel_mut(gx as u32, gy as u32);
                        for i in 0..3 {
                            dst[i] = ((dst[i] as f32) * (1.0 - v) + (color[i] as f32) * v) as u8;
                        }
                    }
                });
            }
        }
    }
}

fn fill_rect(img: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb<u8>) {
    for y in y0..y1.min(img.height()) {
        for x in x0..x1.min(img.width()) {
            img.put_pixel(x, y, color);
        }
    }
}

fn outline_rect(img: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb<u8>) {
    if x1 <= x0 || y1 <= y0 { return; }
    for x in x0..x1.min(img.width()) {
        img.put_pixel(x, y0, color);
        if y1 - 1 < img.height() { img.put_pixel(x, y1 - 1, color); }
    }
    for y in y0..y1.min(img.height()) {
        img.put_pixel(x0, y, color);
        if x1 - 1 < img.width() { img.put_pixel(x1 - 1, y, color); }
    }
}

// Layout constants
const BAR_W: u32 = 72;
const BAR_GAP: u32 = 28;
const PADDING: u32 = 24;
const TITLE_H: u32 = 36;
const PLOT_H: u32 = 240;
const LABEL_H: u32 = 60;
const MIN_IMG_W: u32 = 360;

/// Renders one tally as a bar chart PNG. `entries` come pre-sorted (tallest
/// bar first); an empty slice still produces the title and axis, which is what
/// a zero-draw run looks like.
pub fn render_tally_chart(
    title: &str,
    entries: &[(&str, u64)],
    colors: &HashMap<String, Rgb<u8>>,
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn Error>> {
    let n = entries.len() as u32;
    let grid_w = n * BAR_W + n.saturating_sub(1) * BAR_GAP;
    let img_w = (grid_w + PADDING * 2).max(MIN_IMG_W);
    let img_h = PADDING * 2 + TITLE_H + PLOT_H + LABEL_H;

    let bg = Rgb([245, 245, 245]);
    let axis = Rgb([30, 30, 30]);
    let txt = Rgb([20, 20, 20]);
    let edge = Rgb([255, 255, 255]);
    let fallback = Rgb([127, 127, 127]);

    let mut img = RgbImage::from_pixel(img_w, img_h, bg);

    let font_data = find_system_font_data().ok_or("No system font found for rendering")?;
    let title_painter = LabelPainter::new(font_data.clone(), 20.0)?;
    let painter = LabelPainter::new(font_data, 14.0)?;

    title_painter.draw_centered(&mut img, title, img_w as f32 / 2.0, PADDING as f32, txt);

    // Axis baseline
    let baseline = PADDING + TITLE_H + PLOT_H;
    for x in PADDING..(img_w - PADDING) {
        img.put_pixel(x, baseline, axis);
    }

    // Tallest bar leaves ~20% headroom for the count labels
    let max_count = entries.iter().map(|(_, c)| *c).max().unwrap_or(0);
    let scale = if max_count > 0 {
        PLOT_H as f32 / (max_count as f32 * 1.2)
    } else {
        0.0
    };

    for (i, (label, count)) in entries.iter().enumerate() {
        let x0 = PADDING + i as u32 * (BAR_W + BAR_GAP);
        let bar_h = (*count as f32 * scale).round() as u32;
        let y0 = baseline - bar_h;
        let color = colors.get(*label).copied().unwrap_or(fallback);

        fill_rect(&mut img, x0, y0, x0 + BAR_W, baseline, color);
        outline_rect(&mut img, x0, y0, x0 + BAR_W, baseline, edge);

        let bar_center = x0 as f32 + BAR_W as f32 / 2.0;
        if *count > 0 {
            let count_top = y0 as f32 - painter.line_height - 2.0;
            painter.draw_centered(&mut img, &count.to_string(), bar_center, count_top.max(PADDING as f32), txt);
        }
        painter.draw_wrapped_centered(
            &mut img,
            label,
            bar_center,
            (baseline + 6) as f32,
            (BAR_W + BAR_GAP - 6) as f32,
            (LABEL_H - 6) as f32,
            txt,
        );
    }

    let mut file = File::create(path)?;
    img.write_to(&mut file, image::ImageFormat::Png)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_is_deterministic_and_first_occurrence_wins() {
        let dests: Vec<String> = ["Madrid", "Malta", "Madrid"].iter().map(|s| s.to_string()).collect();
        let colors = color_map(&dests);
        assert_eq!(colors.len(), 2);
        assert_eq!(colors["Madrid"], palette_color(0, 3));
        assert_eq!(colors["Malta"], palette_color(1, 3));
    }

    #[test]
    fn test_large_sets_get_distinct_hues() {
        let n = 30;
        let first = palette_color(0, n);
        let mid = palette_color(n / 2, n);
        assert_ne!(first, mid);
    }

    #[test]
    fn test_render_tally_chart_to_png() {
        let dests: Vec<String> = ["Madrid", "Malta", "Lisbon"].iter().map(|s| s.to_string()).collect();
        let colors = color_map(&dests);
        let entries = vec![("Madrid", 12u64), ("Lisbon", 5), ("Malta", 3)];
        let path = std::env::temp_dir().join("test_tally_chart.png");
        match render_tally_chart("Overall picks", &entries, &colors, &path) {
            Ok(()) => {
                assert!(path.exists());
                std::fs::remove_file(&path).ok();
            }
            // machines without any system font can only fail font discovery
            Err(e) => assert!(e.to_string().contains("font")),
        }
    }

    #[test]
    fn test_render_empty_tally_chart() {
        let colors = HashMap::new();
        let path = std::env::temp_dir().join("test_empty_chart.png");
        match render_tally_chart("Overall picks", &[], &colors, &path) {
            Ok(()) => {
                assert!(path.exists());
                std::fs::remove_file(&path).ok();
            }
            Err(e) => assert!(e.to_string().contains("font")),
        }
    }
}
