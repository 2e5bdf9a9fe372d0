use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// Largest limit or offset the stores accept (signed 64-bit).
const MAX_BOUND: u64 = i64::MAX as u64;

/// Pagination parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct Pageable {
    #[serde(default)]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub size: u64,
    /// Column to order by, optionally suffixed with `,desc` (e.g. `"count,desc"`).
    /// Defaults to the identifier column.
    #[serde(default)]
    pub sort: Option<String>,
}

fn default_page_size() -> u64 {
    20
}

impl Default for Pageable {
    fn default() -> Self {
        Self {
            page: 0,
            size: default_page_size(),
            sort: None,
        }
    }
}

impl Pageable {
    pub fn new(page: u64, size: u64) -> Self {
        Self {
            page,
            size,
            sort: None,
        }
    }

    pub fn sorted_by(mut self, sort: &str) -> Self {
        self.sort = Some(sort.to_string());
        self
    }

    /// Rows skipped before this page, `None` on overflow.
    pub fn offset(&self) -> Option<u64> {
        self.page.checked_mul(self.size)
    }

    /// Checked `(limit, offset)` for a query.
    pub fn bounds(&self) -> Result<(u64, u64), DataError> {
        if self.size > MAX_BOUND {
            return Err(DataError::invalid("size", format!("must not exceed {MAX_BOUND}")));
        }
        match self.offset() {
            Some(offset) if offset <= MAX_BOUND => Ok((self.size, offset)),
            _ => Err(DataError::invalid("page", "offset out of range")),
        }
    }

    /// Parsed `(column, ascending)` of the `sort` parameter.
    pub fn sort_order(&self) -> Option<(&str, bool)> {
        let sort = self.sort.as_deref()?;
        match sort.split_once(',') {
            Some((column, dir)) => Some((column.trim(), !dir.trim().eq_ignore_ascii_case("desc"))),
            None => Some((sort.trim(), true)),
        }
    }
}

/// A page of results with pagination metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, pageable: &Pageable, total_elements: u64) -> Self {
        let total_pages = if pageable.size == 0 {
            0
        } else {
            total_elements.div_ceil(pageable.size)
        };
        Self {
            content,
            page: pageable.page,
            size: pageable.size,
            total_elements,
            total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        let page = Page::new(vec![1, 2], &Pageable::new(2, 2), 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(Pageable::new(2, 2).offset(), Some(4));
    }

    #[test]
    fn bounds_reject_out_of_range_values() {
        assert_eq!(Pageable::new(3, 10).bounds().unwrap(), (10, 30));
        assert_eq!(Pageable::new(u64::MAX / 2 + 1, 2).offset(), None);

        let err = Pageable::new(u64::MAX / 2 + 1, 2).bounds().unwrap_err();
        assert!(matches!(&err, DataError::Validation(errors) if errors[0].field == "page"));
        let err = Pageable::new(2, MAX_BOUND).bounds().unwrap_err();
        assert!(matches!(&err, DataError::Validation(errors) if errors[0].field == "page"));
        let err = Pageable::new(0, u64::MAX).bounds().unwrap_err();
        assert!(matches!(&err, DataError::Validation(errors) if errors[0].field == "size"));
    }

    #[test]
    fn zero_size_has_no_pages() {
        let page: Page<i32> = Page::new(vec![], &Pageable::new(0, 0), 7);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn sort_parsing() {
        assert_eq!(Pageable::default().sort_order(), None);
        assert_eq!(Pageable::default().sorted_by("count").sort_order(), Some(("count", true)));
        assert_eq!(
            Pageable::default().sorted_by("count, DESC").sort_order(),
            Some(("count", false))
        );
    }

    #[test]
    fn deserializes_with_defaults() {
        let p: Pageable = serde_json::from_str(r#"{"page": 3}"#).unwrap();
        assert_eq!((p.page, p.size, p.sort), (3, 20, None));
    }
}
