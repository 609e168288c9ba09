//! PDF writer for rasterized documents
//!
//! The document raster is JPEG-encoded once and stored as a single image
//! XObject. Every page draws that same image at full page width, shifted by
//! the page's placement offset, so the output size does not grow with the
//! page count beyond one small content stream per page.
//!
//! ## Object layout
//!
//! - `1`: catalog
//! - `2`: page tree
//! - `3`: shared image (`/Im1`, DCTDecode)
//! - `4, 5`: page 1 and its content stream; `6, 7` for page 2, and so on
//! - last: document info

use base64::Engine;
use chrono::Utc;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::paginate::{MM_TO_PT, PageGeometry, PagePlacement, paginate};
use super::{ExportError, ExportResult};

/// Default JPEG quality for the embedded raster
pub const DEFAULT_JPEG_QUALITY: u8 = 98;

const PRODUCER: &str = "purchase-order-sdk";

/// A finished PDF
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfDocument {
    /// Raw PDF bytes
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// Document title written to the info dictionary
    pub title: String,
    /// Height of the raster once scaled to the page width
    pub image_height_mm: f64,
    /// Placement of the raster on each page
    pub placements: Vec<PagePlacement>,
}

impl PdfDocument {
    /// Number of pages
    pub fn page_count(&self) -> usize {
        self.placements.len()
    }

    /// PDF content as base64, for hosts that move files as text
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }
}

/// Encode an RGB raster as baseline JPEG
pub fn encode_jpeg(raster: &RgbImage, quality: u8) -> ExportResult<Vec<u8>> {
    let mut buffer = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        encoder
            .encode(raster.as_raw(), raster.width(), raster.height(), ColorType::Rgb8)
            .map_err(|e| ExportError::EncodeError(format!("JPEG encoding failed: {}", e)))?;
    }
    Ok(buffer)
}

/// Build a paginated PDF from a document raster
pub fn build_pdf(
    raster: &RgbImage,
    geometry: &PageGeometry,
    jpeg_quality: u8,
    title: &str,
) -> ExportResult<PdfDocument> {
    let (width_px, height_px) = raster.dimensions();
    if width_px == 0 || height_px == 0 {
        return Err(ExportError::RasterError(format!(
            "Cannot export an empty raster ({}x{})",
            width_px, height_px
        )));
    }

    let image_height_mm = geometry.image_height_mm(width_px, height_px);
    let placements = paginate(image_height_mm, geometry.page_advance_mm);
    let jpeg = encode_jpeg(raster, jpeg_quality)?;

    debug!(
        "Writing {} page(s) for {}x{} raster ({:.1} mm tall, {} byte JPEG)",
        placements.len(),
        width_px,
        height_px,
        image_height_mm,
        jpeg.len()
    );

    let bytes = write_pdf(
        title,
        &jpeg,
        (width_px, height_px),
        geometry,
        image_height_mm,
        &placements,
    );

    Ok(PdfDocument {
        bytes,
        title: title.to_string(),
        image_height_mm,
        placements,
    })
}

/// Content stream drawing the shared image for one placement.
///
/// PDF space has its origin at the bottom-left, so the image's bottom edge
/// sits at `page height - (offset + image height)`.
fn page_content(geometry: &PageGeometry, image_height_mm: f64, offset_mm: f64) -> String {
    let width_pt = geometry.image_width_mm * MM_TO_PT;
    let height_pt = image_height_mm * MM_TO_PT;
    let y_pt = geometry.page_height_mm * MM_TO_PT - (offset_mm + image_height_mm) * MM_TO_PT;
    format!(
        "q\n{:.4} 0 0 {:.4} 0 {:.4} cm\n/Im1 Do\nQ",
        width_pt, height_pt, y_pt
    )
}

fn write_pdf(
    title: &str,
    jpeg: &[u8],
    (width_px, height_px): (u32, u32),
    geometry: &PageGeometry,
    image_height_mm: f64,
    placements: &[PagePlacement],
) -> Vec<u8> {
    let page_width_pt = geometry.page_width_mm * MM_TO_PT;
    let page_height_pt = geometry.page_height_mm * MM_TO_PT;
    let page_count = placements.len();

    let mut pdf = Vec::new();

    // Header
    pdf.extend_from_slice(b"%PDF-1.4\n");
    pdf.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

    let mut xref_positions: Vec<usize> = Vec::new();

    // Object 1: Catalog
    xref_positions.push(pdf.len());
    pdf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

    // Object 2: Pages
    xref_positions.push(pdf.len());
    let kids: Vec<String> = (0..page_count)
        .map(|idx| format!("{} 0 R", 4 + idx * 2))
        .collect();
    pdf.extend_from_slice(
        format!(
            "2 0 obj\n<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n",
            kids.join(" "),
            page_count
        )
        .as_bytes(),
    );

    // Object 3: the shared image
    xref_positions.push(pdf.len());
    pdf.extend_from_slice(
        format!(
            "3 0 obj\n<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>\nstream\n",
            width_px,
            height_px,
            jpeg.len()
        )
        .as_bytes(),
    );
    pdf.extend_from_slice(jpeg);
    pdf.extend_from_slice(b"\nendstream\nendobj\n");

    for (idx, placement) in placements.iter().enumerate() {
        let page_obj_id = 4 + idx * 2;
        let content_obj_id = page_obj_id + 1;

        xref_positions.push(pdf.len());
        pdf.extend_from_slice(
            format!(
                "{} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] /Contents {} 0 R /Resources << /XObject << /Im1 3 0 R >> >> >>\nendobj\n",
                page_obj_id, page_width_pt, page_height_pt, content_obj_id
            )
            .as_bytes(),
        );

        let content = page_content(geometry, image_height_mm, placement.offset_mm);
        xref_positions.push(pdf.len());
        pdf.extend_from_slice(
            format!(
                "{} 0 obj\n<< /Length {} >>\nstream\n{}\nendstream\nendobj\n",
                content_obj_id,
                content.len(),
                content
            )
            .as_bytes(),
        );
    }

    // Info dictionary
    let info_obj_id = 4 + page_count * 2;
    xref_positions.push(pdf.len());
    pdf.extend_from_slice(
        format!(
            "{} 0 obj\n<< /Title {} /Producer ({}) /CreationDate ({}) >>\nendobj\n",
            info_obj_id,
            pdf_text_string(title),
            PRODUCER,
            Utc::now().format("D:%Y%m%d%H%M%S")
        )
        .as_bytes(),
    );

    // Cross-reference table
    let xref_start = pdf.len();
    pdf.extend_from_slice(b"xref\n");
    pdf.extend_from_slice(format!("0 {}\n", xref_positions.len() + 1).as_bytes());
    pdf.extend_from_slice(b"0000000000 65535 f \n");
    for pos in &xref_positions {
        pdf.extend_from_slice(format!("{:010} 00000 n \n", pos).as_bytes());
    }

    // Trailer
    pdf.extend_from_slice(b"trailer\n");
    pdf.extend_from_slice(
        format!(
            "<< /Size {} /Root 1 0 R /Info {} 0 R >>\n",
            xref_positions.len() + 1,
            info_obj_id
        )
        .as_bytes(),
    );
    pdf.extend_from_slice(b"startxref\n");
    pdf.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    pdf.extend_from_slice(b"%%EOF\n");

    pdf
}

/// Escape special characters for PDF literal strings
/// Text string for the Info dictionary.
///
/// ASCII goes out as a literal string; anything else as UTF-16BE hex with a
/// byte order mark so viewers show order numbers and names unmangled.
fn pdf_text_string(s: &str) -> String {
    if s.is_ascii() {
        return format!("({})", escape_pdf_string(s));
    }
    let units: String = s.encode_utf16().map(|unit| format!("{:04X}", unit)).collect();
    format!("<FEFF{}>", units)
}

/// Escape an ASCII literal string body
fn escape_pdf_string(s: &str) -> String {
    s.chars().fold(String::with_capacity(s.len()), |mut out, c| {
        match c {
            '\\' | '(' | ')' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn raster(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([255, 255, 255]))
    }

    fn count(haystack: &[u8], needle: &str) -> usize {
        String::from_utf8_lossy(haystack).matches(needle).count()
    }

    #[test]
    fn test_escape_pdf_string() {
        assert_eq!(escape_pdf_string("PO (A)\\1"), "PO \\(A\\)\\\\1");
        assert_eq!(pdf_text_string("PO-7"), "(PO-7)");
        assert_eq!(pdf_text_string("PO-₹1"), "<FEFF0050004F002D20B90031>");
    }

    #[test]
    fn test_encode_jpeg() {
        let jpeg = encode_jpeg(&raster(8, 8), DEFAULT_JPEG_QUALITY).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_single_page_pdf() {
        let doc = build_pdf(&raster(100, 50), &PageGeometry::default(), 90, "PO-1").unwrap();
        assert_eq!(doc.page_count(), 1);
        assert!((doc.image_height_mm - 105.0).abs() < 1e-9);
        assert!(doc.bytes.starts_with(b"%PDF-1.4"));
        assert!(doc.bytes.ends_with(b"%%EOF\n"));
        assert_eq!(count(&doc.bytes, "/Type /Page "), 1);
        assert_eq!(count(&doc.bytes, "/Subtype /Image"), 1);
        assert!(!doc.to_base64().is_empty());
    }

    #[test]
    fn test_multi_page_pdf_shares_one_image() {
        // 2.5 page advances tall at 210 mm wide
        let doc = build_pdf(&raster(210, 737), &PageGeometry::default(), 90, "PO-2").unwrap();
        assert_eq!(doc.page_count(), 3);
        assert_eq!(count(&doc.bytes, "/Type /Page "), 3);
        assert_eq!(count(&doc.bytes, "/Subtype /Image"), 1);
        assert_eq!(count(&doc.bytes, "/Im1 Do"), 3);
        assert!(count(&doc.bytes, "/Count 3") == 1);
    }

    #[test]
    fn test_page_content_positions_image() {
        let geometry = PageGeometry::default();
        let first = page_content(&geometry, 297.0, 0.0);
        assert!(first.contains(" 0 0.0000 cm"));

        let second = page_content(&geometry, 297.0, -295.0);
        let expected_y = 295.0 * MM_TO_PT;
        assert!(second.contains(&format!(" 0 {:.4} cm", expected_y)));
    }

    #[test]
    fn test_empty_raster_is_rejected() {
        let result = build_pdf(&RgbImage::new(0, 0), &PageGeometry::default(), 90, "PO");
        assert!(matches!(result, Err(ExportError::RasterError(_))));
    }
}
