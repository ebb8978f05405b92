use serde::Serialize;

use crate::domain::error::DomainError;

/// A 1-based page of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn new(number: u32, size: u32) -> Result<Self, DomainError> {
        if number == 0 || size == 0 {
            return Err(DomainError::PageNotFound(number.to_string()));
        }
        Ok(Self { number, size })
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.number - 1) * i64::from(self.size)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: i64,
    pub num_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    /// An empty listing still has a first page; any page past the last one
    /// does not exist.
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Result<Self, DomainError> {
        let num_pages = num_pages(total, request.size);
        if request.number > num_pages {
            return Err(DomainError::PageNotFound(request.number.to_string()));
        }
        Ok(Self {
            items,
            page: request.number,
            page_size: request.size,
            total,
            num_pages,
            has_next: request.number < num_pages,
            has_previous: request.number > 1,
        })
    }
}

fn num_pages(total: i64, size: u32) -> u32 {
    let size = i64::from(size);
    let pages = (total.max(0) + size - 1) / size;
    u32::try_from(pages.max(1)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_computed_from_one_based_pages() {
        let request = PageRequest::new(3, 10).unwrap();
        assert_eq!(request.offset(), 20);
        assert_eq!(request.limit(), 10);
    }

    #[test]
    fn page_zero_does_not_exist() {
        assert!(matches!(
            PageRequest::new(0, 10),
            Err(DomainError::PageNotFound(page)) if page == "0"
        ));
    }

    #[test]
    fn empty_listing_has_a_single_page() {
        let page = Page::<()>::new(vec![], PageRequest::new(1, 10).unwrap(), 0).unwrap();
        assert_eq!(page.num_pages, 1);
        assert!(!page.has_next);
        assert!(!page.has_previous);
    }

    #[test]
    fn page_past_the_last_is_rejected() {
        let request = PageRequest::new(3, 10).unwrap();
        assert!(Page::<()>::new(vec![], request, 20).is_err());
        let page = Page::new(vec![(); 1], request, 21).unwrap();
        assert_eq!(page.num_pages, 3);
        assert!(page.has_previous);
        assert!(!page.has_next);
    }
}
