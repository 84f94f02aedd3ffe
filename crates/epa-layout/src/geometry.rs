//! Page geometry and table column widths
//!
//! All lengths are millimetres. Text capacity is measured in display
//! columns: a half-width character takes one column, a CJK character two.

use crate::error::{LayoutError, LayoutResult};
use serde::{Deserialize, Serialize};

const MM_PER_PT: f32 = 0.352_778;

/// Printable page
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    /// Sheet width
    pub page_width_mm: f32,
    /// Sheet height
    pub page_height_mm: f32,
    /// Top margin
    pub margin_top_mm: f32,
    /// Bottom margin
    pub margin_bottom_mm: f32,
    /// Left margin
    pub margin_left_mm: f32,
    /// Right margin
    pub margin_right_mm: f32,
    /// Body font size in points
    pub font_size_pt: f32,
    /// Line height as a multiple of the font size
    pub line_spacing: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

impl PageGeometry {
    /// A4 portrait, 25 mm margins, 10.5 pt body text at 1.5 spacing
    #[must_use]
    pub const fn a4() -> Self {
        Self {
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            margin_top_mm: 25.0,
            margin_bottom_mm: 25.0,
            margin_left_mm: 25.0,
            margin_right_mm: 25.0,
            font_size_pt: 10.5,
            line_spacing: 1.5,
        }
    }

    /// With the same margin on every side
    #[inline]
    #[must_use]
    pub fn with_margins(mut self, margin_mm: f32) -> Self {
        self.margin_top_mm = margin_mm;
        self.margin_bottom_mm = margin_mm;
        self.margin_left_mm = margin_mm;
        self.margin_right_mm = margin_mm;
        self
    }

    /// With body font size
    #[inline]
    #[must_use]
    pub fn with_font_size(mut self, points: f32) -> Self {
        self.font_size_pt = points;
        self
    }

    /// Width between the side margins
    #[inline]
    #[must_use]
    pub fn usable_width(&self) -> f32 {
        self.page_width_mm - self.margin_left_mm - self.margin_right_mm
    }

    /// Height between the top and bottom margins
    #[inline]
    #[must_use]
    pub fn usable_height(&self) -> f32 {
        self.page_height_mm - self.margin_top_mm - self.margin_bottom_mm
    }

    /// Height of one body line
    #[inline]
    #[must_use]
    pub fn line_height(&self) -> f32 {
        self.font_size_pt * MM_PER_PT * self.line_spacing
    }

    /// Body lines that fit on one page
    #[must_use]
    pub fn lines_per_page(&self) -> usize {
        to_count(self.usable_height() / self.line_height())
    }

    /// Display columns that fit in `width_mm`
    #[must_use]
    pub fn columns_for(&self, width_mm: f32) -> usize {
        let column_mm = self.font_size_pt * MM_PER_PT / 2.0;
        to_count(width_mm / column_mm)
    }

    /// Check that every length is positive and a usable area remains
    ///
    /// # Errors
    /// Returns [`LayoutError::InvalidGeometry`] naming the first bad value
    pub fn validate(&self) -> LayoutResult<()> {
        let lengths = [
            ("page width", self.page_width_mm),
            ("page height", self.page_height_mm),
            ("font size", self.font_size_pt),
            ("line spacing", self.line_spacing),
        ];
        for (name, value) in lengths {
            if !value.is_finite() || value <= 0.0 {
                return Err(LayoutError::invalid_geometry(format!("{name} must be positive, got {value}")));
            }
        }
        let margins = [
            self.margin_top_mm,
            self.margin_bottom_mm,
            self.margin_left_mm,
            self.margin_right_mm,
        ];
        if margins.iter().any(|m| !m.is_finite() || *m < 0.0) {
            return Err(LayoutError::invalid_geometry("margins must be non-negative"));
        }
        if self.usable_width() <= 0.0 || self.usable_height() <= 0.0 {
            return Err(LayoutError::invalid_geometry("margins leave no usable area"));
        }
        if self.lines_per_page() == 0 {
            return Err(LayoutError::invalid_geometry("font too large for one line per page"));
        }
        Ok(())
    }

    /// Resolve column widths for a table of `columns` columns
    ///
    /// Explicit widths are used as given unless their sum exceeds the usable
    /// width, in which case all of them are scaled down by the same factor.
    /// Without explicit widths the usable width is divided evenly.
    ///
    /// # Errors
    /// - [`LayoutError::ColumnMismatch`] if the explicit widths have the wrong length
    /// - [`LayoutError::InvalidGeometry`] if an explicit width is not positive
    pub fn column_widths(&self, columns: usize, explicit: Option<&[f32]>) -> LayoutResult<Vec<f32>> {
        let usable = self.usable_width();
        let Some(widths) = explicit else {
            if columns == 0 {
                return Ok(Vec::new());
            }
            #[allow(clippy::cast_precision_loss)]
            let each = usable / columns as f32;
            return Ok(vec![each; columns]);
        };

        if widths.len() != columns {
            return Err(LayoutError::ColumnMismatch {
                expected: columns,
                actual: widths.len(),
            });
        }
        if let Some(bad) = widths.iter().find(|w| !w.is_finite() || **w <= 0.0) {
            return Err(LayoutError::invalid_geometry(format!("column width must be positive, got {bad}")));
        }

        let total: f32 = widths.iter().sum();
        if total > usable {
            let scale = usable / total;
            Ok(widths.iter().map(|w| w * scale).collect())
        } else {
            Ok(widths.to_vec())
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_count(value: f32) -> usize {
    if value.is_finite() && value >= 1.0 {
        value.floor() as usize
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn a4_usable_area() {
        let page = PageGeometry::a4();
        assert!(close(page.usable_width(), 160.0));
        assert!(close(page.usable_height(), 247.0));
        assert_eq!(page.columns_for(page.usable_width()), 86);
        assert_eq!(page.lines_per_page(), 44);
        assert!(page.validate().is_ok());
    }

    #[test]
    fn uniform_division() {
        let widths = PageGeometry::a4().column_widths(4, None).unwrap();
        assert_eq!(widths.len(), 4);
        assert!(widths.iter().all(|w| close(*w, 40.0)));
        assert!(PageGeometry::a4().column_widths(0, None).unwrap().is_empty());
    }

    #[test]
    fn explicit_widths_kept_when_they_fit() {
        let widths = PageGeometry::a4().column_widths(2, Some(&[70.0, 60.0])).unwrap();
        assert_eq!(widths, vec![70.0, 60.0]);
    }

    #[test]
    fn oversized_widths_rescaled_proportionally() {
        let widths = PageGeometry::a4().column_widths(3, Some(&[100.0, 100.0, 200.0])).unwrap();
        assert!(close(widths.iter().sum(), 160.0));
        assert!(close(widths[0], 40.0));
        assert!(close(widths[2], 80.0));
    }

    #[test]
    fn width_count_must_match() {
        let err = PageGeometry::a4().column_widths(3, Some(&[50.0, 50.0])).unwrap_err();
        assert_eq!(err, LayoutError::ColumnMismatch { expected: 3, actual: 2 });
    }

    #[test]
    fn non_positive_width_rejected() {
        let err = PageGeometry::a4().column_widths(2, Some(&[50.0, 0.0])).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidGeometry(_)));
    }

    #[test]
    fn margins_swallowing_the_page_are_invalid() {
        let page = PageGeometry::a4().with_margins(120.0);
        assert!(matches!(page.validate(), Err(LayoutError::InvalidGeometry(_))));
    }
}
