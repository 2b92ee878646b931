use anyhow::Context;
use tracing::info;

use comment_gateway::{
    build_schema, config::Config, logging, server, CommentStore, ConnectionObserver, PubSub,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    info!("Starting Comment Gateway...");

    let config = Config::from_env().context("Failed to load configuration")?;

    // The store and event channel live exactly as long as this process
    let store = CommentStore::new();
    let pubsub = PubSub::new();
    let schema = build_schema(store, pubsub, &config.graphql);

    let server = server::start(&config, schema, ConnectionObserver::new())
        .context("Failed to start HTTP server")?;

    info!(
        "GraphQL endpoint: http://{}{}",
        server.addr(),
        config.graphql.path
    );
    info!(
        "Subscriptions endpoint: ws://{}{}",
        server.addr(),
        config.graphql.subscriptions_path
    );

    server.run().await.context("HTTP server terminated")?;

    info!("Comment Gateway stopped");
    Ok(())
}
