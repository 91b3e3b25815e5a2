//! Reply tree flattening and detail-view state.

use crate::fetch::{FetchFailure, FetchState, RequestSeq, Ticket};
use crate::{Comment, CommentDetail};

/// Message shown when the thread could not be loaded.
pub const LOAD_ERROR: &str = "Error loading comment";

/// One rendered node of a thread, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadRow {
    pub comment: Comment,
    pub depth: usize,
    pub parent_id: Option<i64>,
}

/// Pre-order walk of the tree. Uses an explicit stack so deep threads
/// never grow the call stack.
pub fn flatten(root: &CommentDetail) -> Vec<ThreadRow> {
    let mut rows = Vec::new();
    let mut stack: Vec<(&CommentDetail, usize, Option<i64>)> = vec![(root, 0, None)];

    while let Some((node, depth, parent_id)) = stack.pop() {
        rows.push(ThreadRow {
            comment: node.comment.clone(),
            depth,
            parent_id,
        });
        // Reversed so children come off the stack in server order.
        for child in node.replies.iter().rev() {
            stack.push((child, depth + 1, Some(node.comment.id)));
        }
    }

    rows
}

pub fn contains(root: &CommentDetail, id: i64) -> bool {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.comment.id == id {
            return true;
        }
        stack.extend(node.replies.iter());
    }
    false
}

/// The single node in a thread whose reply form is open, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplyTarget(Option<i64>);

impl ReplyTarget {
    /// Opens the form at `id`, closing any other. Toggling the open node closes it.
    pub fn toggle(&mut self, id: i64) {
        self.0 = if self.0 == Some(id) { None } else { Some(id) };
    }

    pub fn close(&mut self) {
        self.0 = None;
    }

    pub fn is_open(&self, id: i64) -> bool {
        self.0 == Some(id)
    }

    pub fn active(&self) -> Option<i64> {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadController {
    id: i64,
    state: FetchState<CommentDetail>,
    seq: RequestSeq,
    reply: ReplyTarget,
}

impl ThreadController {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            state: FetchState::Loading,
            seq: RequestSeq::new(),
            reply: ReplyTarget::default(),
        }
    }

    /// Points the controller at another thread. Requests issued for the
    /// previous id become stale.
    pub fn switch_to(&mut self, id: i64) {
        self.id = id;
        self.state = FetchState::Loading;
        self.reply.close();
        self.seq.issue();
    }

    /// The requested id cannot name a thread (e.g. unparseable route param).
    pub fn mark_not_found(&mut self) {
        self.seq.issue();
        self.reply.close();
        self.state = FetchState::NotFound;
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn state(&self) -> &FetchState<CommentDetail> {
        &self.state
    }

    pub fn rows(&self) -> Vec<ThreadRow> {
        self.state.ready().map(flatten).unwrap_or_default()
    }

    pub fn reply_target(&self) -> ReplyTarget {
        self.reply
    }

    pub fn toggle_reply(&mut self, id: i64) {
        self.reply.toggle(id);
    }

    pub fn close_reply(&mut self) {
        self.reply.close();
    }

    /// Starts a (re-)fetch. Data already on screen stays until the result arrives.
    pub fn begin_fetch(&mut self) -> Ticket {
        if !matches!(self.state, FetchState::Ready(_)) {
            self.state = FetchState::Loading;
        }
        self.seq.issue()
    }

    /// Applies a fetch result unless a newer fetch has been issued since.
    pub fn finish_fetch(
        &mut self,
        ticket: Ticket,
        result: Result<CommentDetail, FetchFailure>,
    ) -> bool {
        if !self.seq.is_current(ticket) {
            log::debug!("dropping superseded response for thread {}", self.id);
            return false;
        }
        match result {
            Ok(detail) => {
                if let Some(active) = self.reply.active() {
                    if !contains(&detail, active) {
                        self.reply.close();
                    }
                }
                self.state = FetchState::Ready(detail);
            }
            Err(FetchFailure::NotFound) => {
                self.reply.close();
                self.state = FetchState::NotFound;
            }
            Err(FetchFailure::Failed(reason)) => {
                log::warn!("error loading thread {}: {}", self.id, reason);
                self.reply.close();
                self.state = FetchState::Failed(LOAD_ERROR.to_string());
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: i64, replies: Vec<CommentDetail>) -> CommentDetail {
        CommentDetail {
            comment: Comment {
                id,
                username: format!("user{id}"),
                email: format!("user{id}@x.com"),
                home_page: None,
                text: format!("comment {id}"),
                created_at: "2024-05-01T10:00:00Z".into(),
            },
            replies,
        }
    }

    /// 1
    /// ├── 2
    /// │   └── 4
    /// └── 3
    fn sample() -> CommentDetail {
        node(1, vec![node(2, vec![node(4, vec![])]), node(3, vec![])])
    }

    #[test]
    fn flatten_yields_one_row_per_node_in_preorder() {
        let rows = flatten(&sample());
        let ids: Vec<i64> = rows.iter().map(|r| r.comment.id).collect();
        assert_eq!(ids, vec![1, 2, 4, 3]);
    }

    #[test]
    fn children_are_indented_past_their_parent() {
        let rows = flatten(&sample());
        for row in &rows {
            match row.parent_id {
                None => assert_eq!(row.depth, 0),
                Some(parent) => {
                    let parent_row = rows.iter().find(|r| r.comment.id == parent).unwrap();
                    assert_eq!(row.depth, parent_row.depth + 1);
                }
            }
        }
        assert_eq!(rows.iter().map(|r| r.depth).max(), Some(2));
    }

    #[test]
    fn deep_thread_flattens_without_recursion() {
        let mut tree = node(500, vec![]);
        for id in (0..500).rev() {
            tree = node(id, vec![tree]);
        }
        let rows = flatten(&tree);
        assert_eq!(rows.len(), 501);
        assert_eq!(rows.last().unwrap().depth, 500);
    }

    #[test]
    fn only_one_reply_form_is_open() {
        let mut target = ReplyTarget::default();
        target.toggle(2);
        assert!(target.is_open(2));

        target.toggle(3);
        assert!(target.is_open(3));
        assert!(!target.is_open(2));

        target.toggle(1);
        assert_eq!(target.active(), Some(1));

        target.toggle(1);
        assert_eq!(target.active(), None);
    }

    #[test]
    fn refetch_keeps_data_visible_until_result() {
        let mut thread = ThreadController::new(1);
        assert!(thread.state().is_loading());

        let ticket = thread.begin_fetch();
        thread.finish_fetch(ticket, Ok(sample()));
        assert_eq!(thread.rows().len(), 4);

        let _ = thread.begin_fetch();
        assert!(thread.state().ready().is_some());
    }

    #[test]
    fn stale_thread_response_is_discarded() {
        let mut thread = ThreadController::new(1);
        let older = thread.begin_fetch();
        let newer = thread.begin_fetch();

        assert!(thread.finish_fetch(newer, Ok(sample())));
        assert!(!thread.finish_fetch(older, Ok(node(1, vec![]))));
        assert_eq!(thread.rows().len(), 4);
    }

    #[test]
    fn switching_threads_invalidates_pending_fetch() {
        let mut thread = ThreadController::new(1);
        let for_old_thread = thread.begin_fetch();
        thread.switch_to(2);
        assert_eq!(thread.id(), 2);

        assert!(!thread.finish_fetch(for_old_thread, Ok(sample())));
        assert!(thread.state().is_loading());

        let ticket = thread.begin_fetch();
        assert!(thread.finish_fetch(ticket, Ok(node(2, vec![]))));
        assert_eq!(thread.rows().len(), 1);
    }

    #[test]
    fn unparseable_id_is_not_found() {
        let mut thread = ThreadController::new(0);
        let pending = thread.begin_fetch();
        thread.mark_not_found();
        assert_eq!(thread.state(), &FetchState::NotFound);
        assert!(!thread.finish_fetch(pending, Ok(sample())));
    }

    #[test]
    fn reply_target_closes_when_node_disappears() {
        let mut thread = ThreadController::new(1);
        let ticket = thread.begin_fetch();
        thread.finish_fetch(ticket, Ok(sample()));

        thread.toggle_reply(4);
        let ticket = thread.begin_fetch();
        thread.finish_fetch(ticket, Ok(sample()));
        assert!(thread.reply_target().is_open(4));

        let ticket = thread.begin_fetch();
        thread.finish_fetch(ticket, Ok(node(1, vec![node(3, vec![])])));
        assert_eq!(thread.reply_target().active(), None);
    }

    #[test]
    fn failures_map_to_visible_states() {
        let mut thread = ThreadController::new(9);
        let ticket = thread.begin_fetch();
        thread.finish_fetch(ticket, Err(FetchFailure::NotFound));
        assert_eq!(thread.state(), &FetchState::NotFound);

        let ticket = thread.begin_fetch();
        thread.finish_fetch(ticket, Err(FetchFailure::Failed("502".into())));
        assert_eq!(thread.state(), &FetchState::Failed(LOAD_ERROR.into()));
        assert!(thread.rows().is_empty());
    }
}
