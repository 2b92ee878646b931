//! Append-only in-memory comment store

use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A stored comment. Never mutated once appended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    pub content: String,
}

impl Comment {
    /// Build a comment with a freshly generated identifier
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
        }
    }
}

/// Ordered comment list owned by one server instance
///
/// Clones share the same underlying list.
#[derive(Clone, Default)]
pub struct CommentStore {
    comments: Arc<RwLock<Vec<Comment>>>,
}

impl CommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new comment and return the stored value
    pub async fn append(&self, content: impl Into<String>) -> Comment {
        let comment = Comment::new(content);

        let mut guard = self.comments.write().await;
        guard.push(comment.clone());

        tracing::debug!(comment_id = %comment.id, total = guard.len(), "Comment stored");

        comment
    }

    /// Snapshot of every comment in insertion order
    pub async fn all(&self) -> Vec<Comment> {
        self.comments.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.comments.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.comments.read().await.is_empty()
    }
}
