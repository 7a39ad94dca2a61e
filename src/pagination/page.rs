use serde::{Deserialize, Serialize};

/// One page of results plus the totals needed to navigate the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub total_pages: u64,
    pub total_elements: u64,
    pub elements: Vec<T>,
}

impl<T> Page<T> {
    /// Assembles a page, deriving `total_pages` from `total_elements` and `size`.
    pub fn new(elements: Vec<T>, total_elements: u64, size: u32) -> Self {
        Self {
            total_pages: total_pages(total_elements, size),
            total_elements,
            elements,
        }
    }

    /// Converts every element, keeping the totals and the element order.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            total_pages: self.total_pages,
            total_elements: self.total_elements,
            elements: self.elements.into_iter().map(f).collect(),
        }
    }
}

/// `ceil(total_elements / size)`, or `0` when `size` is `0`.
pub fn total_pages(total_elements: u64, size: u32) -> u64 {
    if size == 0 {
        return 0;
    }
    total_elements.div_ceil(u64::from(size))
}
