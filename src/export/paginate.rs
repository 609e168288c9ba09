//! Page geometry and multi-page placement of a single raster
//!
//! The whole document is rasterized once. The raster is scaled to the page
//! width and, when it is taller than one page, placed again on each
//! following page shifted up by one page advance, so every page shows the
//! next slice of the same image:
//!
//! ```text
//! page 1: offset    0 mm   [#### slice 1 ####]
//! page 2: offset -295 mm   [#### slice 2 ####]
//! page 3: offset -590 mm   [#### slice 3 ####]
//! ```

use serde::{Deserialize, Serialize};

use super::PageSize;

/// Distance between consecutive slices is the page height less this margin
pub const PAGE_BOTTOM_MARGIN_MM: f64 = 2.0;

/// Remaining heights at or below this are treated as exhausted
const EPSILON_MM: f64 = 1e-6;

/// Millimeters to PDF points
pub const MM_TO_PT: f64 = 72.0 / 25.4;

/// Page and image geometry in millimeters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub page_width_mm: f64,
    pub page_height_mm: f64,
    /// Width the raster is scaled to (full page width)
    pub image_width_mm: f64,
    /// Vertical distance between slices of the raster on consecutive pages
    pub page_advance_mm: f64,
}

impl PageGeometry {
    /// Geometry for a page size: A4 places the image 210 mm wide and
    /// advances 295 mm per page
    pub fn for_page_size(page_size: PageSize) -> Self {
        let (width, height) = page_size.dimensions_mm();
        Self {
            page_width_mm: width,
            page_height_mm: height,
            image_width_mm: width,
            page_advance_mm: height - PAGE_BOTTOM_MARGIN_MM,
        }
    }

    /// Height of a `width` x `height` pixel raster once scaled to the image width
    pub fn image_height_mm(&self, width_px: u32, height_px: u32) -> f64 {
        if width_px == 0 {
            return 0.0;
        }
        f64::from(height_px) * self.image_width_mm / f64::from(width_px)
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::for_page_size(PageSize::A4)
    }
}

/// Where the raster is drawn on one page
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PagePlacement {
    /// 1-based page number
    pub page: u32,
    /// Vertical offset of the raster's top edge from the page's top edge (≤ 0)
    pub offset_mm: f64,
}

/// Place an image `image_height_mm` tall across pages advancing `page_height_mm`.
///
/// Page 1 shows the image at offset 0. While image height remains beyond
/// the pages placed so far, another page is added with the image shifted
/// up by one more page height.
///
/// # Examples
///
/// ```
/// use purchase_order_sdk::export::paginate;
///
/// let pages = paginate(600.0, 295.0);
/// assert_eq!(pages.len(), 3);
/// assert_eq!(pages[2].offset_mm, -590.0);
/// ```
pub fn paginate(image_height_mm: f64, page_height_mm: f64) -> Vec<PagePlacement> {
    let mut placements = vec![PagePlacement {
        page: 1,
        offset_mm: 0.0,
    }];

    if page_height_mm <= 0.0 || !image_height_mm.is_finite() {
        return placements;
    }

    let mut remaining = image_height_mm - page_height_mm;
    while remaining > EPSILON_MM {
        placements.push(PagePlacement {
            page: placements.len() as u32 + 1,
            offset_mm: remaining - image_height_mm,
        });
        remaining -= page_height_mm;
    }

    placements
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_a4_geometry() {
        let geometry = PageGeometry::default();
        assert_eq!(geometry.image_width_mm, 210.0);
        assert_eq!(geometry.page_advance_mm, 295.0);
        // 2x raster of a 794 px wide layout
        assert_close(geometry.image_height_mm(1588, 1588), 210.0);
        assert_close(geometry.image_height_mm(1000, 500), 105.0);
        assert_eq!(geometry.image_height_mm(0, 500), 0.0);
    }

    #[test]
    fn test_short_image_is_one_page() {
        let pages = paginate(150.0, 295.0);
        assert_eq!(pages, vec![PagePlacement { page: 1, offset_mm: 0.0 }]);
    }

    #[test]
    fn test_exact_fit_is_one_page() {
        assert_eq!(paginate(295.0, 295.0).len(), 1);
    }

    #[test]
    fn test_three_page_heights() {
        let pages = paginate(2.5 * 295.0, 295.0);
        assert_eq!(pages.len(), 3);
        assert_close(pages[0].offset_mm, 0.0);
        assert_close(pages[1].offset_mm, -295.0);
        assert_close(pages[2].offset_mm, -590.0);
        assert_eq!(pages[2].page, 3);
    }

    #[test]
    fn test_exact_multiple_has_no_blank_page() {
        let pages = paginate(3.0 * 295.0, 295.0);
        assert_eq!(pages.len(), 3);
    }

    #[test]
    fn test_offsets_step_by_page_height() {
        let pages = paginate(2000.0, 295.0);
        assert_eq!(pages.len(), 7);
        for pair in pages.windows(2) {
            assert_close(pair[0].offset_mm - pair[1].offset_mm, 295.0);
        }
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(paginate(f64::NAN, 295.0).len(), 1);
        assert_eq!(paginate(500.0, 0.0).len(), 1);
    }
}
