//! Named cell styles
//!
//! Every cell in a report carries one of five roles. The catalog maps each
//! role to a concrete `rust_xlsxwriter::Format`.

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder};
use serde::Serialize;

/// Style role of a worksheet cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum StyleRole {
    /// Report title
    MainHeader,
    /// Column headers
    SubHeader,
    /// Filter summary label ("Status:")
    FilterParam,
    /// Filter summary value
    FilterValue,
    /// Data cells
    Border,
}

impl StyleRole {
    pub const ALL: [StyleRole; 5] = [
        StyleRole::MainHeader,
        StyleRole::SubHeader,
        StyleRole::FilterParam,
        StyleRole::FilterValue,
        StyleRole::Border,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StyleRole::MainHeader => "main_header",
            StyleRole::SubHeader => "sub_header",
            StyleRole::FilterParam => "filter_param",
            StyleRole::FilterValue => "filter_value",
            StyleRole::Border => "border",
        }
    }
}

/// Reusable formats, one per role.
pub(crate) struct StyleCatalog {
    main_header: Format,
    sub_header: Format,
    filter_param: Format,
    filter_value: Format,
    border: Format,
}

impl StyleCatalog {
    pub(crate) fn new() -> Self {
        let main_header = Format::new()
            .set_bold()
            .set_font_size(14)
            .set_font_color(0xFFFFFF)
            .set_background_color(0x1F4E78)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter);

        let sub_header = Format::new()
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_background_color(0x4472C4)
            .set_font_color(0xFFFFFF)
            .set_border(FormatBorder::Thin);

        let filter_param = Format::new()
            .set_bold()
            .set_background_color(0xD9E1F2)
            .set_align(FormatAlign::Left);

        let filter_value = Format::new()
            .set_background_color(0xFFF2CC)
            .set_align(FormatAlign::Left);

        let border = Format::new()
            .set_border(FormatBorder::Thin)
            .set_align(FormatAlign::Left);

        Self {
            main_header,
            sub_header,
            filter_param,
            filter_value,
            border,
        }
    }

    pub(crate) fn get(&self, role: StyleRole) -> &Format {
        match role {
            StyleRole::MainHeader => &self.main_header,
            StyleRole::SubHeader => &self.sub_header,
            StyleRole::FilterParam => &self.filter_param,
            StyleRole::FilterValue => &self.filter_value,
            StyleRole::Border => &self.border,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_are_distinct() {
        let mut names: Vec<_> = StyleRole::ALL.iter().map(|r| r.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), StyleRole::ALL.len());
    }

    #[test]
    fn catalog_formats_differ_per_role() {
        let catalog = StyleCatalog::new();
        assert_ne!(catalog.get(StyleRole::MainHeader), catalog.get(StyleRole::SubHeader));
        assert_ne!(catalog.get(StyleRole::FilterParam), catalog.get(StyleRole::FilterValue));
        assert_ne!(catalog.get(StyleRole::Border), catalog.get(StyleRole::SubHeader));
    }
}
