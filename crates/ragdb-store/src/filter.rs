//! Metadata filter to SQL predicate translation.

use ragdb_core::types::SearchFilters;

/// Build the `only_if` predicate for a store query. Multiple fields are
/// OR-combined. Returns `None` when no field is set.
pub fn filter_expr(filters: &SearchFilters) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(doc) = &filters.source_document {
        parts.push(format!("source_document = '{}'", escape(doc)));
    }
    if let Some(chapter) = &filters.chapter_title {
        parts.push(format!("chapter_title = '{}'", escape(chapter)));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" OR "))
    }
}

fn escape(value: &str) -> String {
    value.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filters_give_no_predicate() {
        assert_eq!(filter_expr(&SearchFilters::default()), None);
    }

    #[test]
    fn single_field() {
        let filters = SearchFilters {
            source_document: Some("handbook.pdf".into()),
            chapter_title: None,
        };
        assert_eq!(filter_expr(&filters).as_deref(), Some("source_document = 'handbook.pdf'"));
    }

    #[test]
    fn two_fields_are_or_combined() {
        let filters = SearchFilters {
            source_document: Some("handbook.pdf".into()),
            chapter_title: Some("Water".into()),
        };
        assert_eq!(
            filter_expr(&filters).as_deref(),
            Some("source_document = 'handbook.pdf' OR chapter_title = 'Water'")
        );
    }

    #[test]
    fn single_quotes_are_escaped() {
        let filters = SearchFilters {
            source_document: Some("farmer's almanac".into()),
            chapter_title: None,
        };
        assert_eq!(
            filter_expr(&filters).as_deref(),
            Some("source_document = 'farmer''s almanac'")
        );
    }
}
