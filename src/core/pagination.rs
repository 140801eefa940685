/// One page of a listing, with enough numbers for the page controls.
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn previous_number(&self) -> usize {
        self.number.saturating_sub(1).max(1)
    }

    pub fn next_number(&self) -> usize {
        (self.number + 1).min(self.num_pages)
    }
}

/// Slice `items` into the requested page. Out-of-range page numbers
/// clamp to the nearest valid page; an empty listing yields a single
/// empty page 1.
pub fn paginate<T>(items: Vec<T>, per_page: usize, requested: usize) -> Page<T> {
    let total = items.len();
    let num_pages = if total == 0 {
        1
    } else {
        (total + per_page - 1) / per_page
    };
    let number = requested.clamp(1, num_pages);
    let start = (number - 1) * per_page;

    let items = items
        .into_iter()
        .skip(start)
        .take(per_page)
        .collect();

    Page {
        items,
        number,
        num_pages,
        total,
    }
}
