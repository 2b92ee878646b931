//! Comment schema: `allComments` query and `addComment` mutation

use async_graphql::{Context, Object, Result as GraphQLResult, SimpleObject};
use tracing::info;

use crate::pubsub::{PubSub, COMMENT_ADDED};
use crate::store::{Comment as StoredComment, CommentStore};

/// A user comment
#[derive(SimpleObject, Clone, Debug, PartialEq, Eq)]
#[graphql(name = "Comment")]
pub struct Comment {
    pub id: Option<String>,
    pub content: Option<String>,
}

impl From<StoredComment> for Comment {
    fn from(comment: StoredComment) -> Self {
        Comment {
            id: Some(comment.id),
            content: Some(comment.content),
        }
    }
}

pub(crate) fn comment_store<'a>(ctx: &Context<'a>) -> GraphQLResult<&'a CommentStore> {
    ctx.data::<CommentStore>()
        .map_err(|_| "Comment store not available".into())
}

pub(crate) fn event_channel<'a>(ctx: &Context<'a>) -> GraphQLResult<&'a PubSub<StoredComment>> {
    ctx.data::<PubSub<StoredComment>>()
        .map_err(|_| "Event channel not available".into())
}

#[derive(Default)]
pub struct CommentQuery;

#[Object]
impl CommentQuery {
    /// Every stored comment, oldest first
    async fn all_comments(&self, ctx: &Context<'_>) -> GraphQLResult<Option<Vec<Option<Comment>>>> {
        let store = comment_store(ctx)?;

        let comments = store
            .all()
            .await
            .into_iter()
            .map(|c| Some(Comment::from(c)))
            .collect();

        Ok(Some(comments))
    }
}

#[derive(Default)]
pub struct CommentMutation;

#[Object]
impl CommentMutation {
    /// Store a comment and notify `commentAdded` subscribers
    async fn add_comment(
        &self,
        ctx: &Context<'_>,
        content: String,
    ) -> GraphQLResult<Option<Comment>> {
        let store = comment_store(ctx)?;
        let pubsub = event_channel(ctx)?;

        // Append and publish take separate locks, so concurrent adds may be
        // published in a different order than they were stored.
        let stored = store.append(content).await;
        let delivered = pubsub.publish(COMMENT_ADDED, stored.clone());

        info!(
            comment_id = %stored.id,
            subscribers = delivered,
            "Comment added"
        );

        Ok(Some(stored.into()))
    }
}
