//! The feed store: one view's ordered, in-memory list of posts. Newest at the
//! head, at most one record per id, only ever grows while mounted.
use crate::feed::structs::Post;
use crate::metrics;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// Where the feed is in its lifecycle. There is deliberately no retrying state:
/// a failed initial load stays failed until the whole view is remounted.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedState {
    Loading,
    Ready,
    Failed,
}

/// What `insert_if_absent` did with the record it was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inserted {
    /// Fresh id, placed at the head.
    Fresh,
    /// An id already in the store. First write wins; the input was discarded.
    Duplicate,
}

pub struct FeedStore {
    posts: Vec<Post>,
    state: FeedState,
    /// Bumped on every visible change. Renderers poll this to know when to redraw.
    revision: u64,
}

/// A point-in-time copy of the store, the renderer's whole input.
#[derive(Serialize, Debug)]
pub struct Snapshot {
    pub state: FeedState,
    pub revision: u64,
    pub posts: Vec<Post>,
}

impl Default for FeedStore {
    fn default() -> Self {
        Self {
            posts: Vec::new(),
            state: FeedState::Loading,
            revision: 0,
        }
    }
}

impl FeedStore {
    /// Insert a post at the head unless its id is already present. Duplicate
    /// deliveries are discarded whole: a later copy never updates the fields
    /// of the record that arrived first.
    pub fn insert_if_absent(&mut self, post: Post) -> Inserted {
        if self.contains(post.id) {
            debug!(post_id = %post.id, "duplicate delivery dropped");
            metrics::FEED_INSERTS.with_label_values(&["duplicate"]).inc();
            return Inserted::Duplicate;
        }
        self.posts.insert(0, post);
        self.revision += 1;
        metrics::FEED_INSERTS.with_label_values(&["inserted"]).inc();
        Inserted::Fresh
    }

    /// Replace the store's contents wholesale with a fresh load, preserving the
    /// server's order. Overlapping ids with previous contents don't matter; the
    /// old records are gone.
    pub fn replace_all(&mut self, posts: Vec<Post>) {
        self.posts = posts;
        self.state = FeedState::Ready;
        self.revision += 1;
    }

    /// Record that the initial load failed. Existing records (there are none on
    /// a first mount) are left alone; only the state flag changes.
    pub fn mark_failed(&mut self) {
        self.state = FeedState::Failed;
        self.revision += 1;
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.posts.iter().any(|p| p.id == id)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state,
            revision: self.revision,
            posts: self.posts.clone(),
        }
    }
}

/// Handle to one view's feed store. Cloning shares the same store; the mutex
/// makes each check-then-insert atomic, which is all the synchronization the
/// three insertion triggers need.
#[derive(Clone, Default)]
pub struct SharedFeed {
    inner: Arc<Mutex<FeedStore>>,
}

impl SharedFeed {
    pub fn insert_if_absent(&self, post: Post) -> Inserted {
        self.lock().insert_if_absent(post)
    }

    pub fn replace_all(&self, posts: Vec<Post>) {
        self.lock().replace_all(posts)
    }

    pub fn mark_failed(&self) {
        self.lock().mark_failed()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FeedStore> {
        // A poisoned lock means an insert panicked mid-update; the store can't
        // be trusted after that.
        self.inner.lock().expect("feed store lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::structs::post_fixture;
    use std::collections::HashSet;

    fn ids(feed: &SharedFeed) -> Vec<Uuid> {
        feed.snapshot().posts.iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_head_insertion_order() {
        let feed = SharedFeed::default();
        let (a, b, c, d) = (
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
        );
        feed.replace_all(vec![
            post_fixture(a, "a"),
            post_fixture(b, "b"),
            post_fixture(c, "c"),
        ]);

        assert_eq!(feed.insert_if_absent(post_fixture(d, "d")), Inserted::Fresh);
        assert_eq!(ids(&feed), vec![d, a, b, c]);
    }

    #[test]
    fn test_no_duplicates_under_any_interleaving() {
        let feed = SharedFeed::default();
        let fixed: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();

        // Initial load, then a mix of push deliveries and composer inserts,
        // several of them redeliveries.
        feed.replace_all(vec![
            post_fixture(fixed[0], "load"),
            post_fixture(fixed[1], "load"),
        ]);
        feed.insert_if_absent(post_fixture(fixed[2], "push"));
        feed.insert_if_absent(post_fixture(fixed[0], "push redelivery"));
        feed.insert_if_absent(post_fixture(fixed[3], "composer"));
        feed.insert_if_absent(post_fixture(fixed[3], "push echo of composer"));
        feed.insert_if_absent(post_fixture(fixed[2], "push redelivery"));

        let seen = ids(&feed);
        let distinct: HashSet<_> = seen.iter().copied().collect();
        assert_eq!(seen.len(), distinct.len());
        assert_eq!(distinct.len(), 4);
    }

    #[test]
    fn test_first_write_wins() {
        let feed = SharedFeed::default();
        let id = Uuid::new_v4();
        feed.insert_if_absent(post_fixture(id, "original"));

        assert_eq!(
            feed.insert_if_absent(post_fixture(id, "edited")),
            Inserted::Duplicate
        );
        let snap = feed.snapshot();
        assert_eq!(snap.posts.len(), 1);
        assert_eq!(snap.posts[0].content, "original");
    }

    #[test]
    fn test_replace_on_load_discards_everything() {
        let feed = SharedFeed::default();
        let kept = Uuid::new_v4();
        feed.replace_all(vec![
            post_fixture(kept, "first mount"),
            post_fixture(Uuid::new_v4(), "first mount"),
        ]);

        // Remount: second load overlaps on one id, differs on the rest.
        let fresh = Uuid::new_v4();
        feed.replace_all(vec![
            post_fixture(kept, "second mount"),
            post_fixture(fresh, "second mount"),
        ]);

        let snap = feed.snapshot();
        assert_eq!(ids(&feed), vec![kept, fresh]);
        assert_eq!(snap.posts[0].content, "second mount");
        assert_eq!(snap.state, FeedState::Ready);
    }

    #[test]
    fn test_lifecycle_flags() {
        let feed = SharedFeed::default();
        assert_eq!(feed.snapshot().state, FeedState::Loading);

        feed.mark_failed();
        let snap = feed.snapshot();
        assert_eq!(snap.state, FeedState::Failed);
        assert!(snap.posts.is_empty());
    }

    #[test]
    fn test_revision_only_moves_on_visible_change() {
        let feed = SharedFeed::default();
        let id = Uuid::new_v4();

        let r0 = feed.snapshot().revision;
        feed.insert_if_absent(post_fixture(id, "x"));
        let r1 = feed.snapshot().revision;
        assert!(r1 > r0);

        feed.insert_if_absent(post_fixture(id, "x again"));
        assert_eq!(feed.snapshot().revision, r1);
    }
}
