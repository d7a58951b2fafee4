//! Highlight filtering for the summary pane.
//!
//! Visibility narrows which highlights a renderer shows at all; the keyword
//! filter matches case-insensitively against quotation text.

use crate::models::Highlight;

/// Which highlights the viewer shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightVisibility {
    All,
    /// Only the leading highlights (color index 1 or 2).
    Key,
    None,
}

/// Optional narrowing on top of visibility.
#[derive(Debug, Clone, Default)]
pub struct HighlightFilter {
    pub keyword: Option<String>,
}

/// Apply visibility and filter to a highlight list, preserving order.
pub fn filter_highlights<'a>(
    highlights: &'a [Highlight],
    visibility: HighlightVisibility,
    filter: &HighlightFilter,
) -> Vec<&'a Highlight> {
    if visibility == HighlightVisibility::None {
        return Vec::new();
    }

    let keyword = filter.keyword.as_deref().map(str::to_lowercase);

    highlights
        .iter()
        .filter(|h| visibility != HighlightVisibility::Key || h.color_index <= 2)
        .filter(|h| match &keyword {
            Some(kw) => h.source_text.to_lowercase().contains(kw),
            None => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceLocation;

    fn highlight(id: &str, color: u8, source: &str) -> Highlight {
        Highlight {
            id: id.to_string(),
            section_id: format!("s-{}", id),
            color_index: color,
            source_text: source.to_string(),
            location: SourceLocation {
                page: 1,
                paragraph: 1,
                start_offset: 0,
                end_offset: source.len().max(1),
            },
        }
    }

    #[test]
    fn none_hides_everything() {
        let hs = vec![highlight("h1", 1, "alpha")];
        let filtered = filter_highlights(&hs, HighlightVisibility::None, &HighlightFilter::default());
        assert!(filtered.is_empty());
    }

    #[test]
    fn key_keeps_first_two_colors() {
        let hs = vec![
            highlight("h1", 1, "alpha"),
            highlight("h2", 2, "beta"),
            highlight("h3", 3, "gamma"),
        ];
        let filtered = filter_highlights(&hs, HighlightVisibility::Key, &HighlightFilter::default());
        let ids: Vec<&str> = filtered.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["h1", "h2"]);
    }

    #[test]
    fn keyword_matches_case_insensitively() {
        let hs = vec![
            highlight("h1", 1, "Cloud adoption trends"),
            highlight("h2", 2, "Revenue growth"),
        ];
        let filter = HighlightFilter {
            keyword: Some("CLOUD".to_string()),
        };
        let filtered = filter_highlights(&hs, HighlightVisibility::All, &filter);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "h1");
    }
}
