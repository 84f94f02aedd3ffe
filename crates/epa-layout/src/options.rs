//! Layout options
//!
//! Of these, only `evidence_page_break` and `case_type_label` come from the
//! host configuration; everything else is a layout default.

use crate::error::LayoutResult;
use crate::geometry::PageGeometry;
use chrono::NaiveDate;
use epa_package::PackageConfig;

/// Label column of two-column key/value tables
pub const DEFAULT_LABEL_WIDTH_MM: f32 = 70.0;

/// How a document is laid out
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutOptions {
    /// Start every exhibit on a new page
    pub evidence_page_break: bool,
    /// Case type shown on cover pages
    pub case_type_label: String,
    /// Page geometry
    pub geometry: PageGeometry,
    /// Label column width of key/value tables; [`DEFAULT_LABEL_WIDTH_MM`] when unset
    pub field_label_width: Option<f32>,
    /// Date printed on cover pages; today when unset
    pub generated_on: Option<NaiveDate>,
}

impl LayoutOptions {
    /// Create default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With per-exhibit page breaks
    #[inline]
    #[must_use]
    pub fn with_evidence_page_break(mut self, enabled: bool) -> Self {
        self.evidence_page_break = enabled;
        self
    }

    /// With cover-page case type
    #[inline]
    #[must_use]
    pub fn with_case_type_label(mut self, label: impl Into<String>) -> Self {
        self.case_type_label = label.into();
        self
    }

    /// With page geometry
    #[inline]
    #[must_use]
    pub fn with_geometry(mut self, geometry: PageGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// With key/value label column width
    #[inline]
    #[must_use]
    pub fn with_field_label_width(mut self, width_mm: f32) -> Self {
        self.field_label_width = Some(width_mm);
        self
    }

    /// With a fixed cover date
    #[inline]
    #[must_use]
    pub fn with_generated_on(mut self, date: NaiveDate) -> Self {
        self.generated_on = Some(date);
        self
    }

    /// Label column width in effect
    #[must_use]
    pub fn label_width(&self) -> f32 {
        self.field_label_width.unwrap_or(DEFAULT_LABEL_WIDTH_MM)
    }

    /// Cover date in effect
    #[must_use]
    pub fn cover_date(&self) -> NaiveDate {
        self.generated_on
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// Check geometry
    ///
    /// # Errors
    /// Returns [`LayoutError::InvalidGeometry`](crate::LayoutError::InvalidGeometry)
    /// for unusable geometry
    pub fn validate(&self) -> LayoutResult<()> {
        self.geometry.validate()
    }
}

impl From<&PackageConfig> for LayoutOptions {
    fn from(config: &PackageConfig) -> Self {
        Self::new()
            .with_evidence_page_break(config.evidence_page_break)
            .with_case_type_label(config.case_type_label.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_options_projected_from_package_config() {
        let config = PackageConfig::default()
            .with_evidence_page_break(true)
            .with_case_type_label("融资租赁合同纠纷");
        let options = LayoutOptions::from(&config);

        assert!(options.evidence_page_break);
        assert_eq!(options.case_type_label, "融资租赁合同纠纷");
        assert_eq!(options.geometry, PageGeometry::a4());
        assert!((options.label_width() - DEFAULT_LABEL_WIDTH_MM).abs() < f32::EPSILON);
    }

    #[test]
    fn fixed_cover_date_wins() {
        let date = NaiveDate::from_ymd_opt(2022, 3, 1).unwrap();
        assert_eq!(LayoutOptions::new().with_generated_on(date).cover_date(), date);
    }
}
