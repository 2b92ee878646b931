//! GraphQL schema: comments query, mutation and subscription

pub mod comment;
pub mod subscription;

use async_graphql::{MergedObject, Schema};

use crate::config::GraphQLConfig;
use crate::pubsub::PubSub;
use crate::store::{Comment as StoredComment, CommentStore};

/// Root query object
#[derive(MergedObject, Default)]
pub struct QueryRoot(comment::CommentQuery);

/// Root mutation object
#[derive(MergedObject, Default)]
pub struct MutationRoot(comment::CommentMutation);

/// GraphQL App Schema type with WebSocket subscriptions
pub type AppSchema = Schema<QueryRoot, MutationRoot, subscription::SubscriptionRoot>;

/// Build the schema around an explicitly owned store and event channel
pub fn build_schema(
    store: CommentStore,
    pubsub: PubSub<StoredComment>,
    config: &GraphQLConfig,
) -> AppSchema {
    let builder = Schema::build(
        QueryRoot::default(),
        MutationRoot::default(),
        subscription::SubscriptionRoot,
    )
    .data(store)
    .data(pubsub)
    .limit_depth(config.max_depth)
    .limit_complexity(config.max_complexity);

    if config.introspection {
        builder.finish()
    } else {
        builder.disable_introspection().finish()
    }
}
