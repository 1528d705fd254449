use askama_actix::Template;

const PAGINATOR_LOOK_AHEAD: u64 = 2;

/// [1] 2 3 ... 13
/// 1 2 [3] 4 5 ... 13
/// 1 2 3 4 [5] 6 7 ... 13
/// 1 ... 4 5 [6] 7 8 ... 13
/// 1 ... 7 8 [9] 10 11 12 13
/// 1 ... 9 10 [11] 12 13
/// 1 ... 11 12 [13]
#[derive(Debug)]
pub struct Paginator {
    /// Ends in `?` or `&`; the page number is appended.
    pub base_url: String,
    pub this_page: u64,
    pub page_count: u64,
}

#[derive(Template)]
#[template(path = "util/paginator.html")]
struct PaginatorTemplate<'a> {
    paginator: &'a Paginator,
}

pub trait PaginatorToHtml {
    fn as_html(&self) -> String;
    fn has_pages(&self) -> bool;
    fn is_current_page(&self, page: &u64) -> bool;
    fn get_segments(&self) -> Vec<Vec<u64>>;
}

impl PaginatorToHtml for Paginator {
    fn has_pages(&self) -> bool {
        self.page_count > 1
    }

    fn is_current_page(&self, page: &u64) -> bool {
        *page == self.this_page
    }

    /// Runs of consecutive page numbers; an ellipsis goes between runs.
    fn get_segments(&self) -> Vec<Vec<u64>> {
        let this_page = self.this_page.clamp(1, self.page_count.max(1));
        let start = this_page.saturating_sub(PAGINATOR_LOOK_AHEAD).max(1);
        let end = (this_page + PAGINATOR_LOOK_AHEAD).min(self.page_count);

        let mut segments = Vec::new();
        let mut current: Vec<u64> = Vec::new();

        if start > 1 + PAGINATOR_LOOK_AHEAD {
            segments.push(vec![1]);
        } else {
            current.extend(1..start);
        }
        current.extend(start..=end);

        if end + PAGINATOR_LOOK_AHEAD < self.page_count {
            segments.push(current);
            current = vec![self.page_count];
        } else {
            current.extend((end + 1)..=self.page_count);
        }
        segments.push(current);
        segments
    }

    fn as_html(&self) -> String {
        if self.has_pages() {
            let mut buffer = String::new();
            let template = PaginatorTemplate { paginator: self };
            if template.render_into(&mut buffer).is_err() {
                "[Paginator Util Error]".to_owned()
            } else {
                buffer
            }
        } else {
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(this_page: u64, page_count: u64) -> Vec<Vec<u64>> {
        Paginator {
            base_url: "/admin/ads/?".to_owned(),
            this_page,
            page_count,
        }
        .get_segments()
    }

    #[test]
    fn test_paginator_segments() {
        assert_eq!(segments(1, 13), vec![vec![1, 2, 3], vec![13]]);
        assert_eq!(segments(3, 13), vec![vec![1, 2, 3, 4, 5], vec![13]]);
        assert_eq!(segments(5, 13), vec![vec![1, 2, 3, 4, 5, 6, 7], vec![13]]);
        assert_eq!(segments(6, 13), vec![vec![1], vec![4, 5, 6, 7, 8], vec![13]]);
        assert_eq!(segments(9, 13), vec![vec![1], vec![7, 8, 9, 10, 11, 12, 13]]);
        assert_eq!(segments(13, 13), vec![vec![1], vec![11, 12, 13]]);
        assert_eq!(segments(1, 1), vec![vec![1]]);
    }

    #[test]
    fn test_single_page_renders_nothing() {
        let paginator = Paginator {
            base_url: "/admin/ads/?".to_owned(),
            this_page: 1,
            page_count: 1,
        };
        assert!(!paginator.has_pages());
        assert_eq!(paginator.as_html(), "");
    }
}
