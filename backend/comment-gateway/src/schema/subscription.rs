//! GraphQL Subscriptions (WebSocket support)

use async_graphql::{Context, Subscription};
use futures_util::stream::{Stream, StreamExt};

use super::comment::{event_channel, Comment};
use crate::pubsub::COMMENT_ADDED;

#[derive(Default)]
pub struct SubscriptionRoot;

#[Subscription]
impl SubscriptionRoot {
    /// Emits every comment added after the subscription starts
    ///
    /// No replay of earlier comments and no filtering.
    async fn comment_added(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<impl Stream<Item = Option<Comment>>> {
        let events = event_channel(ctx)?.subscribe(COMMENT_ADDED);
        tracing::debug!(subscriber_id = ?events.id(), "commentAdded subscription started");

        Ok(events.map(|comment| Some(Comment::from(comment))))
    }
}
