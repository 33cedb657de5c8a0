#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page_size: u32,
    pub page_index: u32,
}

impl PageWindow {
    pub fn new(page_size: u32, page_index: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            page_index,
        }
    }

    pub fn first(page_size: u32) -> Self {
        Self::new(page_size, 0)
    }

    pub fn limit(&self) -> u32 {
        self.page_size
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page_size) * u64::from(self.page_index)
    }

    pub fn with_index(self, page_index: u32) -> Self {
        Self { page_index, ..self }
    }

    pub fn page_count(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.page_size)).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_size_times_index() {
        let window = PageWindow::new(10, 3);
        assert_eq!(window.limit(), 10);
        assert_eq!(window.offset(), 30);
        assert_eq!(window.with_index(0).offset(), 0);
    }

    #[test]
    fn zero_page_size_is_clamped() {
        assert_eq!(PageWindow::new(0, 2).limit(), 1);
    }

    #[test]
    fn page_count_rounds_up() {
        let window = PageWindow::first(10);
        assert_eq!(window.page_count(0), 1);
        assert_eq!(window.page_count(10), 1);
        assert_eq!(window.page_count(11), 2);
    }
}
