//! Test harness: a live gateway on an ephemeral port plus a hybrid client
//!
//! Must run inside an actix system (`#[actix_web::test]`).

#![allow(dead_code)]

pub mod client;

use actix_web::dev::ServerHandle;
use comment_gateway::{
    build_schema, server, Comment, CommentStore, Config, ConnectionObserver, PubSub,
    COMMENT_ADDED,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time::{sleep, timeout};

pub const WAIT: Duration = Duration::from_secs(5);

/// Running gateway with direct access to its store and event channel
pub struct TestServer {
    pub addr: SocketAddr,
    pub config: Config,
    pub store: CommentStore,
    pub pubsub: PubSub<Comment>,
    pub observer: ConnectionObserver,
    handle: ServerHandle,
}

impl TestServer {
    pub fn start() -> Self {
        Self::start_with(Config::default())
    }

    pub fn start_with(mut config: Config) -> Self {
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        config.server.workers = 1;

        let store = CommentStore::new();
        let pubsub = PubSub::new();
        let observer = ConnectionObserver::new();
        let schema = build_schema(store.clone(), pubsub.clone(), &config.graphql);

        let (addr, handle) = server::start(&config, schema, observer.clone())
            .expect("test server binds")
            .spawn();

        Self {
            addr,
            config,
            store,
            pubsub,
            observer,
            handle,
        }
    }

    pub fn http_url(&self) -> String {
        format!("http://{}{}", self.addr, self.config.graphql.path)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}{}", self.addr, self.config.graphql.subscriptions_path)
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Resolve once the server has seen a WebSocket `connection_init`
    pub async fn ws_connect_received(&self) {
        timeout(WAIT, self.observer.wait_for_connections(1))
            .await
            .expect("server never received a subscription connection");
    }

    /// Resolve once `count` resolvers are registered on `commentAdded`
    pub async fn wait_for_subscribers(&self, count: usize) {
        timeout(WAIT, async {
            while self.pubsub.subscriber_count(COMMENT_ADDED) < count {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("subscription never registered");
    }

    pub async fn stop(self) {
        self.handle.stop(false).await;
    }
}
