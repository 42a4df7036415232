use crate::types::{AppListQuery, AppPage, SearchConfig, SortConfig};

/// Paging, sorting and search state for the app table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableState {
    pub page: u32,
    pub total_pages: u32,
    pub page_size: u32,
    pub sort: SortConfig,
    pub search: SearchConfig,
}

impl TableState {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            total_pages: 1,
            page_size,
            sort: SortConfig::default(),
            search: SearchConfig::default(),
        }
    }

    /// Clicking the active column flips direction; a new column starts descending.
    pub fn set_sort(&mut self, field: &str) {
        if self.sort.field == field {
            self.sort.desc = !self.sort.desc;
        } else {
            self.sort = SortConfig {
                field: field.to_string(),
                desc: true,
            };
        }
        self.page = 1;
    }

    pub fn set_search(&mut self, term: &str, key: &str, exact: bool) {
        self.search = SearchConfig {
            term: term.trim().to_string(),
            key: key.to_string(),
            exact,
        };
        self.page = 1;
    }

    pub fn clear_search(&mut self) {
        self.search = SearchConfig::default();
        self.page = 1;
    }

    /// Move to `page`, clamped into `1..=total_pages`. Returns the page landed on.
    pub fn go_to(&mut self, page: u32) -> u32 {
        self.page = page.clamp(1, self.total_pages.max(1));
        self.page
    }

    pub fn next_page(&mut self) -> u32 {
        self.go_to(self.page.saturating_add(1))
    }

    pub fn prev_page(&mut self) -> u32 {
        self.go_to(self.page.saturating_sub(1))
    }

    /// Sync paging with what the upstream actually returned.
    pub fn apply_page(&mut self, page: &AppPage) {
        self.total_pages = page.total_pages.max(1);
        self.page = page.current_page.clamp(1, self.total_pages);
    }

    pub fn to_query(&self) -> AppListQuery {
        let searching = !self.search.term.is_empty();
        AppListQuery {
            page: Some(self.page),
            sort: Some(self.sort.field.clone()),
            desc: Some(self.sort.desc),
            page_size: Some(self.page_size),
            search_key: searching.then(|| self.search.key.clone()),
            search_value: searching.then(|| self.search.term.clone()),
            search_exact: searching.then_some(self.search.exact),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_toggle_and_switch() {
        let mut t = TableState::new(50);
        t.page = 4;
        t.set_sort("download_count");
        assert!(!t.sort.desc);
        assert_eq!(t.page, 1);
        t.set_sort("download_count");
        assert!(t.sort.desc);
        t.set_sort("name");
        assert_eq!(t.sort.field, "name");
        assert!(t.sort.desc);
    }

    #[test]
    fn test_page_clamping() {
        let mut t = TableState::new(50);
        t.total_pages = 3;
        assert_eq!(t.go_to(0), 1);
        assert_eq!(t.go_to(99), 3);
        assert_eq!(t.next_page(), 3);
        assert_eq!(t.prev_page(), 2);
    }

    #[test]
    fn test_search_resets_page_and_shapes_query() {
        let mut t = TableState::new(20);
        t.total_pages = 5;
        t.go_to(3);
        t.set_search("  maps ", "developer_name", true);
        assert_eq!(t.page, 1);
        let q = t.to_query();
        assert_eq!(q.search_value.as_deref(), Some("maps"));
        assert_eq!(q.search_key.as_deref(), Some("developer_name"));
        assert_eq!(q.search_exact, Some(true));

        t.clear_search();
        let q = t.to_query();
        assert!(q.search_value.is_none());
        assert!(q.search_key.is_none());
        assert_eq!(q.page_size, Some(20));
    }

    #[test]
    fn test_apply_page() {
        let mut t = TableState::new(20);
        t.apply_page(&AppPage {
            data: vec![],
            total_count: 0,
            current_page: 1,
            total_pages: 0,
        });
        assert_eq!(t.total_pages, 1);
        assert_eq!(t.page, 1);
    }
}
