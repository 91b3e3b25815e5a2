//! Filter, sort and pagination state for the top-level comment list.

use crate::fetch::{FetchFailure, RequestSeq, Ticket};
use crate::{Comment, CommentResponse};

/// Comments per page, as paginated by the server.
pub const PAGE_SIZE: u64 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Unset,
    Ascending,
    Descending,
}

impl SortOrder {
    /// Value of the `created_at` query parameter.
    pub fn as_param(self) -> &'static str {
        match self {
            SortOrder::Unset => "",
            SortOrder::Ascending => "fifo",
            SortOrder::Descending => "lifo",
        }
    }

    /// Unknown values fall back to `Unset`.
    pub fn from_param(value: &str) -> Self {
        match value {
            "fifo" => SortOrder::Ascending,
            "lifo" => SortOrder::Descending,
            _ => SortOrder::Unset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Username,
    Email,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub username: String,
    pub email: String,
    pub order: SortOrder,
    pub page: u64,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            username: String::new(),
            email: String::new(),
            order: SortOrder::Unset,
            page: 1,
        }
    }
}

impl ListQuery {
    /// Empty filters are left out; `created_at` and `page` are always sent.
    pub fn to_query_string(&self) -> String {
        let page = self.page.to_string();
        let mut pairs: Vec<(&str, &str)> = Vec::with_capacity(4);
        if !self.username.is_empty() {
            pairs.push(("username", self.username.as_str()));
        }
        if !self.email.is_empty() {
            pairs.push(("email", self.email.as_str()));
        }
        pairs.push(("created_at", self.order.as_param()));
        pairs.push(("page", page.as_str()));

        pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// `ceil(count / PAGE_SIZE)`; zero results means zero pages.
pub fn total_pages(count: u64) -> u64 {
    count.div_ceil(PAGE_SIZE)
}

/// State behind the list view. Owns the query and the most recent page of results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListController {
    query: ListQuery,
    total_pages: u64,
    comments: Vec<Comment>,
    seq: RequestSeq,
    loaded: bool,
}

impl ListController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn current_page(&self) -> u64 {
        self.query.page
    }

    pub fn total_pages(&self) -> u64 {
        self.total_pages
    }

    /// Whether at least one fetch has completed successfully.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn update_filter(&mut self, field: FilterField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FilterField::Username => self.query.username = value,
            FilterField::Email => self.query.email = value,
        }
    }

    pub fn update_sort_order(&mut self, order: SortOrder) {
        self.query.order = order;
    }

    /// Moves to page `n` when it exists. Returns whether the page changed.
    pub fn go_to_page(&mut self, n: u64) -> bool {
        if n < 1 || n > self.total_pages || n == self.query.page {
            return false;
        }
        self.query.page = n;
        true
    }

    pub fn has_previous(&self) -> bool {
        self.query.page > 1 && self.total_pages > 0
    }

    pub fn has_next(&self) -> bool {
        self.query.page < self.total_pages
    }

    /// Issues a ticket for a new fetch and returns it with the query to send.
    pub fn begin_fetch(&mut self) -> (Ticket, ListQuery) {
        (self.seq.issue(), self.query.clone())
    }

    /// Applies a fetch result. Results from superseded requests are dropped.
    ///
    /// On failure the previous page stays on screen, except that a page past
    /// the first which the server no longer has falls back to page 1.
    /// Returns whether the result changed the controller.
    pub fn finish_fetch(
        &mut self,
        ticket: Ticket,
        result: Result<CommentResponse, FetchFailure>,
    ) -> bool {
        if !self.seq.is_current(ticket) {
            log::debug!("dropping superseded list response");
            return false;
        }
        match result {
            Ok(response) => {
                self.total_pages = total_pages(response.count);
                self.comments = response.results;
                self.loaded = true;
                let last = self.total_pages.max(1);
                if self.query.page > last {
                    self.query.page = last;
                } else if self.query.page < 1 {
                    self.query.page = 1;
                }
                true
            }
            Err(FetchFailure::NotFound) if self.query.page > 1 => {
                log::debug!("page {} no longer exists, back to page 1", self.query.page);
                self.query.page = 1;
                true
            }
            Err(FetchFailure::NotFound) => {
                log::warn!("error fetching comments: not found");
                false
            }
            Err(FetchFailure::Failed(reason)) => {
                log::warn!("error fetching comments: {}", reason);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: i64) -> Comment {
        Comment {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@x.com"),
            home_page: None,
            text: "text".into(),
            created_at: "2024-05-01T10:00:00Z".into(),
        }
    }

    fn response(count: u64, ids: &[i64]) -> CommentResponse {
        CommentResponse {
            count,
            next: None,
            previous: None,
            results: ids.iter().copied().map(comment).collect(),
        }
    }

    fn loaded(count: u64) -> ListController {
        let mut list = ListController::new();
        let (ticket, _) = list.begin_fetch();
        assert!(list.finish_fetch(ticket, Ok(response(count, &[1, 2]))));
        list
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(5), 3);
        assert_eq!(total_pages(4), 2);
        assert_eq!(total_pages(1), 1);
        assert_eq!(total_pages(0), 0);
    }

    #[test]
    fn default_query_sends_unset_order_and_first_page() {
        assert_eq!(ListQuery::default().to_query_string(), "created_at=&page=1");
    }

    #[test]
    fn filters_are_encoded_and_included_when_set() {
        let query = ListQuery {
            username: "al ice".into(),
            email: "a@x.com".into(),
            order: SortOrder::Descending,
            page: 2,
        };
        assert_eq!(
            query.to_query_string(),
            "username=al%20ice&email=a%40x.com&created_at=lifo&page=2"
        );
    }

    #[test]
    fn sort_order_params_round_trip() {
        for order in [SortOrder::Unset, SortOrder::Ascending, SortOrder::Descending] {
            assert_eq!(SortOrder::from_param(order.as_param()), order);
        }
        assert_eq!(SortOrder::from_param("bogus"), SortOrder::Unset);
    }

    #[test]
    fn go_to_page_ignores_out_of_range() {
        let mut list = loaded(5);
        assert_eq!(list.total_pages(), 3);

        let before = list.clone();
        assert!(!list.go_to_page(0));
        assert!(!list.go_to_page(4));
        assert_eq!(list, before);

        assert!(list.go_to_page(3));
        assert_eq!(list.current_page(), 3);
    }

    #[test]
    fn empty_result_disables_both_page_controls() {
        let list = loaded(0);
        assert_eq!(list.total_pages(), 0);
        assert!(!list.has_previous());
        assert!(!list.has_next());
    }

    #[test]
    fn page_controls_follow_position() {
        let mut list = loaded(5);
        assert!(!list.has_previous());
        assert!(list.has_next());
        list.go_to_page(3);
        assert!(list.has_previous());
        assert!(!list.has_next());
    }

    #[test]
    fn filter_and_sort_updates_leave_page_alone() {
        let mut list = loaded(5);
        list.go_to_page(2);
        list.update_filter(FilterField::Username, "bob");
        list.update_filter(FilterField::Email, "b@x.com");
        list.update_sort_order(SortOrder::Ascending);
        let query = list.query();
        assert_eq!(query.username, "bob");
        assert_eq!(query.email, "b@x.com");
        assert_eq!(query.order, SortOrder::Ascending);
        assert_eq!(query.page, 2);
    }

    #[test]
    fn shrinking_result_clamps_current_page() {
        let mut list = loaded(6);
        list.go_to_page(3);
        list.update_filter(FilterField::Username, "rare");

        let (ticket, query) = list.begin_fetch();
        assert_eq!(query.page, 3);
        list.finish_fetch(ticket, Ok(response(1, &[9])));
        assert_eq!(list.total_pages(), 1);
        assert_eq!(list.current_page(), 1);
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut list = ListController::new();
        let (older, _) = list.begin_fetch();
        let (newer, _) = list.begin_fetch();

        assert!(list.finish_fetch(newer, Ok(response(3, &[5, 6]))));
        assert!(!list.finish_fetch(older, Ok(response(10, &[1, 2]))));

        let ids: Vec<i64> = list.comments().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![5, 6]);
        assert_eq!(list.total_pages(), 2);
    }

    #[test]
    fn failed_fetch_keeps_previous_page() {
        let mut list = loaded(4);
        let (ticket, _) = list.begin_fetch();
        assert!(!list.finish_fetch(
            ticket,
            Err(FetchFailure::Failed("connection refused".into()))
        ));
        assert_eq!(list.comments().len(), 2);
        assert_eq!(list.total_pages(), 2);
    }

    #[test]
    fn missing_page_falls_back_to_first() {
        let mut list = loaded(6);
        list.go_to_page(3);
        list.update_filter(FilterField::Email, "rare@x.com");

        let (ticket, query) = list.begin_fetch();
        assert_eq!(query.page, 3);
        assert!(list.finish_fetch(ticket, Err(FetchFailure::NotFound)));
        assert_eq!(list.current_page(), 1);

        let (ticket, query) = list.begin_fetch();
        assert_eq!(query.page, 1);
        assert!(list.finish_fetch(ticket, Ok(response(1, &[9]))));
        assert_eq!(list.total_pages(), 1);
    }

    #[test]
    fn not_found_on_first_page_keeps_state() {
        let mut list = loaded(4);
        let (ticket, _) = list.begin_fetch();
        assert!(!list.finish_fetch(ticket, Err(FetchFailure::NotFound)));
        assert_eq!(list.current_page(), 1);
        assert_eq!(list.comments().len(), 2);
    }
}
