//! Rasterization of rendered documents
//!
//! [`LayoutRasterizer`] lays the document out the way the preview shows it
//! (a 794 px wide page, header with logo and identity lines, a two-column
//! details table, bank details underneath) and paints it at an integer
//! oversampling factor. Layout is computed once in CSS pixels and scaled at
//! paint time, so the raster height grows with long terms text rather than
//! being clipped.
//!
//! Glyphs are painted with a TrueType font. The font comes from, in order:
//! a configured font file, a configured system family (resolved through
//! `fontdb`, feature `system-fonts`), or the DejaVu Sans face bundled with
//! the crate.

use async_trait::async_trait;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use rusttype::{Font, Scale};
use std::path::Path;
use tracing::{debug, warn};

use super::{ExportError, ExportResult};
use crate::config::ExportSection;
use crate::render::RenderedDocument;

/// DejaVu Sans, see `assets/fonts/DejaVuSans-LICENSE.txt`
static BUNDLED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

/// Layout width in CSS pixels (A4 at 96 dpi)
pub const LAYOUT_WIDTH_PX: u32 = 794;

/// Largest raster the rasterizer will allocate
const MAX_RASTER_PIXELS: u64 = 200_000_000;

const PADDING: f32 = 12.0;
const LOGO_SIZE: f32 = 40.0;
const GAP: f32 = 12.0;
const TITLE_SIZE: f32 = 16.0;
const META_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 12.0;
const LINE_HEIGHT: f32 = 1.25;
const CELL_PADDING_X: f32 = 8.0;
const CELL_PADDING_Y: f32 = 4.0;
const SECTION_GAP: f32 = 8.0;
const RULE: f32 = 1.0;
/// Average glyph advance as a fraction of the font size, used for wrapping
const AVG_CHAR_WIDTH: f32 = 0.55;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const TEXT_COLOR: Rgb<u8> = Rgb([23, 23, 23]);
const RULE_COLOR: Rgb<u8> = Rgb([212, 212, 212]);
const LABEL_BACKGROUND: Rgb<u8> = Rgb([245, 245, 245]);

/// Turns a rendered document into a bitmap
#[async_trait(?Send)]
pub trait Rasterizer {
    /// Paint `document` at `scale` device pixels per layout pixel
    async fn rasterize(&self, document: &RenderedDocument, scale: u32) -> ExportResult<RgbImage>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
enum DrawOp {
    Fill {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgb<u8>,
    },
    Text {
        x: f32,
        y: f32,
        size: f32,
        align: Align,
        text: String,
    },
    Logo {
        x: f32,
        y: f32,
        size: f32,
    },
}

/// Document geometry in CSS pixels
#[derive(Debug, Clone, PartialEq)]
struct Layout {
    width: f32,
    height: f32,
    ops: Vec<DrawOp>,
}

/// Built-in document rasterizer
pub struct LayoutRasterizer {
    font: Option<Font<'static>>,
}

impl Default for LayoutRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutRasterizer {
    /// Rasterizer painting text with the bundled font
    pub fn new() -> Self {
        let font = Font::try_from_bytes(BUNDLED_FONT);
        if font.is_none() {
            warn!("Bundled font could not be parsed");
        }
        Self { font }
    }

    /// Rasterizer painting text with the given TrueType/OpenType font data
    pub fn with_font_bytes(bytes: Vec<u8>) -> ExportResult<Self> {
        let font = Font::try_from_vec(bytes)
            .ok_or_else(|| ExportError::RasterError("Invalid font data".to_string()))?;
        Ok(Self { font: Some(font) })
    }

    /// Rasterizer painting text with the font file at `path`
    pub fn from_font_path(path: &Path) -> ExportResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            ExportError::IoError(format!("Failed to read font {}: {}", path.display(), e))
        })?;
        Self::with_font_bytes(bytes)
    }

    /// Rasterizer using the configured font file or family, else the bundled font
    pub fn from_config(config: &ExportSection) -> ExportResult<Self> {
        if let Some(path) = &config.font_path {
            return Self::from_font_path(path);
        }

        #[cfg(feature = "system-fonts")]
        if let Some(family) = &config.font_family {
            match system_font(family) {
                Some(font) => {
                    debug!("Using system font for family '{}'", family);
                    return Ok(Self { font: Some(font) });
                }
                None => warn!("No system font for family '{}'; using bundled font", family),
            }
        }

        Ok(Self::new())
    }

    /// Whether text glyphs will be painted
    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    fn paint(
        &self,
        font: &Font<'static>,
        layout: &Layout,
        document: &RenderedDocument,
        scale: u32,
    ) -> ExportResult<RgbImage> {
        let s = scale as f32;
        let width = (layout.width * s).ceil() as u32;
        let height = (layout.height * s).ceil() as u32;
        if u64::from(width) * u64::from(height) > MAX_RASTER_PIXELS {
            return Err(ExportError::RasterError(format!(
                "Raster of {}x{} pixels is too large",
                width, height
            )));
        }

        let mut canvas = RgbImage::from_pixel(width, height, WHITE);
        for op in &layout.ops {
            match op {
                DrawOp::Fill {
                    x,
                    y,
                    width,
                    height,
                    color,
                } => {
                    let w = (width * s).round().max(1.0) as u32;
                    let h = (height * s).round().max(1.0) as u32;
                    draw_filled_rect_mut(
                        &mut canvas,
                        Rect::at((x * s).round() as i32, (y * s).round() as i32).of_size(w, h),
                        *color,
                    );
                }
                DrawOp::Text {
                    x,
                    y,
                    size,
                    align,
                    text,
                } => {
                    let font_scale = Scale::uniform(size * s);
                    let mut px = x * s;
                    if *align == Align::Right {
                        let (text_width, _) = text_size(font_scale, font, text);
                        px -= text_width as f32;
                    }
                    draw_text_mut(
                        &mut canvas,
                        TEXT_COLOR,
                        px.round() as i32,
                        (y * s).round() as i32,
                        font_scale,
                        font,
                        text,
                    );
                }
                DrawOp::Logo { x, y, size } => {
                    if let Some(bytes) = &document.header.logo {
                        match image::load_from_memory(bytes) {
                            Ok(logo) => {
                                let side = (size * s).round().max(1.0) as u32;
                                let logo = flatten_on_white(
                                    &logo.resize(side, side, FilterType::Triangle).to_rgba8(),
                                );
                                imageops::overlay(
                                    &mut canvas,
                                    &logo,
                                    (x * s).round() as i64,
                                    (y * s).round() as i64,
                                );
                            }
                            Err(e) => warn!("Skipping undecodable logo: {}", e),
                        }
                    }
                }
            }
        }

        Ok(canvas)
    }
}

#[async_trait(?Send)]
impl Rasterizer for LayoutRasterizer {
    async fn rasterize(&self, document: &RenderedDocument, scale: u32) -> ExportResult<RgbImage> {
        if scale == 0 {
            return Err(ExportError::RasterError("Scale must be at least 1".to_string()));
        }
        let font = self.font.as_ref().ok_or_else(|| {
            ExportError::RasterError(format!(
                "No font available to draw {}",
                document.order_number
            ))
        })?;

        let layout = layout(document);
        debug!(
            "Rasterizing {} at {}x ({:.0}x{:.0} layout px)",
            document.order_number, scale, layout.width, layout.height
        );
        self.paint(font, &layout, document, scale)
    }
}

/// Regular face of `family`, falling back to the database's sans-serif family
#[cfg(feature = "system-fonts")]
fn system_font(family: &str) -> Option<Font<'static>> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();

    let query = fontdb::Query {
        families: &[fontdb::Family::Name(family), fontdb::Family::SansSerif],
        weight: fontdb::Weight::NORMAL,
        stretch: fontdb::Stretch::Normal,
        style: fontdb::Style::Normal,
    };
    let id = db.query(&query)?;
    db.with_face_data(id, |data, index| {
        Font::try_from_vec_and_index(data.to_vec(), index)
    })
    .flatten()
}

fn line_height(size: f32) -> f32 {
    size * LINE_HEIGHT
}

fn fill(x: f32, y: f32, width: f32, height: f32, color: Rgb<u8>) -> DrawOp {
    DrawOp::Fill {
        x,
        y,
        width,
        height,
        color,
    }
}

fn text(x: f32, y: f32, size: f32, align: Align, text: &str) -> DrawOp {
    DrawOp::Text {
        x,
        y,
        size,
        align,
        text: text.to_string(),
    }
}

/// Wrap `text` to fit `width` pixels at font `size`, keeping explicit line breaks
fn wrap(text: &str, width: f32, size: f32) -> Vec<String> {
    let max_chars = ((width / (size * AVG_CHAR_WIDTH)).floor() as usize).max(1);
    let lines: Vec<String> = text
        .lines()
        .flat_map(|paragraph| word_wrap(paragraph, max_chars))
        .collect();
    if lines.is_empty() {
        vec![String::new()]
    } else {
        lines
    }
}

/// Greedy wrap at `max_chars` per line; words longer than a line are split
fn word_wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for piece in chars.chunks(max_chars) {
            let fits = current_len == 0 || current_len + 1 + piece.len() <= max_chars;
            if !fits {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(piece);
            current_len += piece.len();
        }
    }

    if current_len > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn layout(document: &RenderedDocument) -> Layout {
    let width = LAYOUT_WIDTH_PX as f32;
    let content_width = width - 2.0 * PADDING;
    let mut ops = Vec::new();
    let top = PADDING;

    // Header: logo and company identity on the left, order metadata on the right
    let mut text_x = PADDING;
    let mut left_bottom = top;
    if document.header.logo.is_some() {
        ops.push(DrawOp::Logo {
            x: PADDING,
            y: top,
            size: LOGO_SIZE,
        });
        text_x += LOGO_SIZE + GAP;
        left_bottom = top + LOGO_SIZE;
    }

    let right_width = content_width * 0.35;
    let left_width = content_width - right_width - (text_x - PADDING);
    let mut y = top;
    for line in wrap(&document.header.company_name, left_width, TITLE_SIZE) {
        ops.push(text(text_x, y, TITLE_SIZE, Align::Left, &line));
        y += line_height(TITLE_SIZE);
    }
    for identity in &document.header.identity_lines {
        for line in wrap(identity, left_width, BODY_SIZE) {
            ops.push(text(text_x, y, BODY_SIZE, Align::Left, &line));
            y += line_height(BODY_SIZE);
        }
    }
    left_bottom = left_bottom.max(y);

    let mut right_y = top;
    for line in [&document.header.order_number_line, &document.header.date_line] {
        ops.push(text(width - PADDING, right_y, META_SIZE, Align::Right, line));
        right_y += line_height(META_SIZE);
    }

    y = left_bottom.max(right_y) + SECTION_GAP;
    ops.push(fill(PADDING, y, content_width, RULE, RULE_COLOR));
    y += RULE + SECTION_GAP;

    // Details table
    let label_width = content_width / 3.0;
    let value_width = content_width - label_width;
    let table_top = y;
    ops.push(fill(PADDING, y, content_width, RULE, RULE_COLOR));
    y += RULE;
    for row in &document.details {
        let labels = wrap(&row.label, label_width - 2.0 * CELL_PADDING_X, BODY_SIZE);
        let values = wrap(&row.value, value_width - 2.0 * CELL_PADDING_X, BODY_SIZE);
        let lines = labels.len().max(values.len());
        let row_height = lines as f32 * line_height(BODY_SIZE) + 2.0 * CELL_PADDING_Y;

        ops.push(fill(PADDING, y, label_width, row_height, LABEL_BACKGROUND));
        let mut line_y = y + CELL_PADDING_Y;
        for line in &labels {
            ops.push(text(PADDING + CELL_PADDING_X, line_y, BODY_SIZE, Align::Left, line));
            line_y += line_height(BODY_SIZE);
        }
        let mut line_y = y + CELL_PADDING_Y;
        for line in &values {
            ops.push(text(
                PADDING + label_width + CELL_PADDING_X,
                line_y,
                BODY_SIZE,
                Align::Left,
                line,
            ));
            line_y += line_height(BODY_SIZE);
        }

        y += row_height;
        ops.push(fill(PADDING, y, content_width, RULE, RULE_COLOR));
        y += RULE;
    }
    let table_height = y - table_top;
    ops.push(fill(PADDING, table_top, RULE, table_height, RULE_COLOR));
    ops.push(fill(PADDING + label_width, table_top, RULE, table_height, RULE_COLOR));
    ops.push(fill(width - PADDING - RULE, table_top, RULE, table_height, RULE_COLOR));
    y += SECTION_GAP;

    if let Some(bank) = &document.bank {
        ops.push(text(PADDING, y, BODY_SIZE, Align::Left, &bank.title));
        y += line_height(BODY_SIZE);
        for line in wrap(&bank.text, content_width, BODY_SIZE) {
            ops.push(text(PADDING, y, BODY_SIZE, Align::Left, &line));
            y += line_height(BODY_SIZE);
        }
    }

    Layout {
        width,
        height: y + PADDING,
        ops,
    }
}

/// Composite an RGBA image over white
fn flatten_on_white(image: &image::RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let alpha = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * alpha + 255 * (255 - alpha)) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::document::{BankBlock, DetailRow, HeaderBlock};

    fn document(terms: &str) -> RenderedDocument {
        RenderedDocument {
            order_number: "PO-1".to_string(),
            file_name: "PO-PO-1.pdf".to_string(),
            header: HeaderBlock {
                logo: None,
                company_name: "Acme Agro".to_string(),
                identity_lines: vec!["12 Market Yard, Pune".to_string()],
                order_number_line: "Order number: PO-1".to_string(),
                date_line: "Date: 05 Mar 2024".to_string(),
            },
            details: vec![
                DetailRow::new("PARTY NAME:", "Shree Traders"),
                DetailRow::new("TERMS & CONDITION:", terms),
            ],
            bank: Some(BankBlock {
                title: "BANK DETAILS".to_string(),
                text: "State Bank, IFSC: SBIN0000123".to_string(),
            }),
        }
    }

    fn png_logo() -> Vec<u8> {
        let logo = image::RgbaImage::from_pixel(4, 4, image::Rgba([200, 0, 0, 255]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(logo)
            .write_to(&mut bytes, image::ImageOutputFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_word_wrap() {
        assert_eq!(word_wrap("a bb ccc", 4), vec!["a bb", "ccc"]);
        assert_eq!(word_wrap("", 4), vec![String::new()]);
        assert_eq!(word_wrap("ab GODOWN7", 4), vec!["ab", "GODO", "WN7"]);
        assert_eq!(wrap("one\ntwo", 500.0, 12.0), vec!["one", "two"]);
        assert_eq!(wrap("", 500.0, 12.0), vec![String::new()]);
    }

    #[test]
    fn test_long_terms_grow_layout() {
        let short = layout(&document("Net 30"));
        let long = layout(&document(&"Payment within thirty days of delivery. ".repeat(60)));
        assert_eq!(short.width, LAYOUT_WIDTH_PX as f32);
        assert!(long.height > short.height + 100.0);
    }

    #[test]
    fn test_logo_shifts_identity_text() {
        let mut doc = document("Net 30");
        let without = layout(&doc);
        doc.header.logo = Some(vec![1, 2, 3]);
        let with = layout(&doc);

        assert!(with.ops.iter().any(|op| matches!(op, DrawOp::Logo { .. })));
        let first_text_x = |layout: &Layout| {
            layout.ops.iter().find_map(|op| match op {
                DrawOp::Text { x, .. } => Some(*x),
                _ => None,
            })
        };
        assert_eq!(first_text_x(&without), Some(PADDING));
        assert_eq!(first_text_x(&with), Some(PADDING + LOGO_SIZE + GAP));
    }

    #[tokio::test]
    async fn test_rasterize_scales_layout() {
        let doc = document("Net 30");
        let rasterizer = LayoutRasterizer::new();
        let raster = rasterizer.rasterize(&doc, 2).await.unwrap();
        let expected = layout(&doc);
        assert_eq!(raster.width(), LAYOUT_WIDTH_PX * 2);
        assert_eq!(raster.height(), (expected.height * 2.0).ceil() as u32);
        // label cells are shaded
        assert_ne!(*raster.get_pixel(40, raster.height() / 2), WHITE);
    }

    #[tokio::test]
    async fn test_rasterize_paints_logo() {
        let mut doc = document("Net 30");
        doc.header.logo = Some(png_logo());
        let raster = LayoutRasterizer::new().rasterize(&doc, 2).await.unwrap();
        let center = (PADDING + LOGO_SIZE / 2.0) as u32 * 2;
        let pixel = raster.get_pixel(center, center);
        assert!(pixel[0] > 150 && pixel[1] < 50, "{:?}", pixel);
    }

    #[tokio::test]
    async fn test_bad_logo_is_skipped() {
        let mut doc = document("Net 30");
        doc.header.logo = Some(b"not an image".to_vec());
        assert!(LayoutRasterizer::new().rasterize(&doc, 2).await.is_ok());
    }

    #[tokio::test]
    async fn test_zero_scale_is_rejected() {
        let result = LayoutRasterizer::new().rasterize(&document(""), 0).await;
        assert!(matches!(result, Err(ExportError::RasterError(_))));
    }

    #[test]
    fn test_invalid_font_bytes() {
        assert!(LayoutRasterizer::with_font_bytes(vec![0, 1, 2]).is_err());
        assert!(LayoutRasterizer::new().has_font());
    }

    #[tokio::test]
    async fn test_default_config_paints_text() {
        let rasterizer = LayoutRasterizer::from_config(&ExportSection::default()).unwrap();
        assert!(rasterizer.has_font());

        let first = document("Net 30");
        let mut second = document("Net 30");
        second.details[0].value = "Completely Different Party".to_string();

        let a = rasterizer.rasterize(&first, 2).await.unwrap();
        let b = rasterizer.rasterize(&second, 2).await.unwrap();
        assert_eq!(a.dimensions(), b.dimensions());
        assert_ne!(a, b);

        // dark glyph pixels in the company name line
        let title_band = (PADDING * 2.0) as u32..((PADDING + TITLE_SIZE) * 2.0) as u32;
        let dark = title_band
            .flat_map(|y| (0..a.width() / 2).map(move |x| (x, y)))
            .filter(|&(x, y)| a.get_pixel(x, y)[0] < 100)
            .count();
        assert!(dark > 0);
    }

    #[tokio::test]
    async fn test_missing_font_is_an_error() {
        let rasterizer = LayoutRasterizer { font: None };
        let result = rasterizer.rasterize(&document("Net 30"), 2).await;
        assert!(matches!(result, Err(ExportError::RasterError(_))));
    }

    #[cfg(feature = "system-fonts")]
    #[test]
    fn test_unknown_family_falls_back_to_bundled_font() {
        let config = ExportSection {
            font_family: Some("No Such Family 9000".to_string()),
            ..Default::default()
        };
        assert!(LayoutRasterizer::from_config(&config).unwrap().has_font());
    }

    #[test]
    fn test_flatten_on_white() {
        let rgba = image::RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 0, 0]));
        assert_eq!(*flatten_on_white(&rgba).get_pixel(0, 0), WHITE);
    }
}
