//! HTTP and WebSocket wiring for the comment schema
//!
//! Queries and mutations are served over HTTP POST; subscriptions run over a
//! long-lived WebSocket on a separate path (graphql-transport-ws or legacy
//! graphql-ws subprotocol).

use actix_web::dev::{Server, ServerHandle};
use actix_web::{middleware::Logger, web, App, HttpRequest, HttpResponse, HttpServer};
use async_graphql::http::GraphiQLSource;
use async_graphql::Data;
use async_graphql_actix_web::{GraphQLRequest, GraphQLResponse, GraphQLSubscription};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::info;

use crate::config::{Config, GraphQLConfig};
use crate::error::{GatewayError, GatewayResult};
use crate::schema::AppSchema;

/// Observes WebSocket clients completing `connection_init`
///
/// Lets callers wait until the server has accepted a subscription connection.
#[derive(Clone, Default)]
pub struct ConnectionObserver {
    notify: Arc<Notify>,
    connections: Arc<AtomicUsize>,
}

impl ConnectionObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_received(&self) {
        let total = self.connections.fetch_add(1, Ordering::SeqCst) + 1;
        info!(connections = total, "Subscription connection received");
        self.notify.notify_waiters();
    }

    /// Total connections initialised since startup
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Resolve once at least `count` connections have been initialised
    pub async fn wait_for_connections(&self, count: usize) {
        loop {
            let notified = self.notify.notified();
            if self.connections() >= count {
                return;
            }
            notified.await;
        }
    }
}

async fn graphql_handler(schema: web::Data<AppSchema>, req: GraphQLRequest) -> GraphQLResponse {
    schema.execute(req.into_inner()).await.into()
}

async fn graphql_subscription_handler(
    schema: web::Data<AppSchema>,
    observer: web::Data<ConnectionObserver>,
    req: HttpRequest,
    payload: web::Payload,
) -> actix_web::Result<HttpResponse> {
    let observer = observer.get_ref().clone();

    GraphQLSubscription::new(schema.as_ref().clone())
        .on_connection_init(move |_params| async move {
            observer.connection_received();
            Ok(Data::default())
        })
        .start(&req, payload)
}

async fn health_handler() -> &'static str {
    "ok"
}

/// SDL (Schema Definition Language) endpoint
async fn schema_handler(schema: web::Data<AppSchema>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain")
        .body(schema.sdl())
}

async fn playground_handler(graphql: web::Data<GraphQLConfig>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(
            GraphiQLSource::build()
                .endpoint(&graphql.path)
                .subscription_endpoint(&graphql.subscriptions_path)
                .finish(),
        )
}

/// Register every gateway route
pub fn routes(cfg: &mut web::ServiceConfig, graphql: &GraphQLConfig) {
    cfg.route(&graphql.path, web::post().to(graphql_handler))
        .route(&graphql.path, web::get().to(graphql_subscription_handler))
        .route(
            &graphql.subscriptions_path,
            web::get().to(graphql_subscription_handler),
        )
        .route("/schema", web::get().to(schema_handler))
        .route("/health", web::get().to(health_handler));

    if graphql.playground {
        cfg.route("/playground", web::get().to(playground_handler));
    }
}

/// A bound, not yet awaited server
pub struct RunningServer {
    addr: SocketAddr,
    server: Server,
}

impl RunningServer {
    /// Address the listener actually bound (resolves port 0)
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn handle(&self) -> ServerHandle {
        self.server.handle()
    }

    /// Drive the server until it is stopped
    pub async fn run(self) -> std::io::Result<()> {
        self.server.await
    }

    /// Run the server in the background on the current runtime
    pub fn spawn(self) -> (SocketAddr, ServerHandle) {
        let handle = self.server.handle();
        actix_web::rt::spawn(self.server);
        (self.addr, handle)
    }
}

/// Bind the gateway with the given schema
pub fn start(
    config: &Config,
    schema: AppSchema,
    observer: ConnectionObserver,
) -> GatewayResult<RunningServer> {
    config.validate()?;

    let graphql = config.graphql.clone();
    let bind_addr = config.bind_addr();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(schema.clone()))
            .app_data(web::Data::new(observer.clone()))
            .app_data(web::Data::new(graphql.clone()))
            .configure(|cfg| routes(cfg, &graphql))
    })
    .workers(config.server.workers)
    .bind(&bind_addr)
    .map_err(|e| GatewayError::bind(&bind_addr, e))?;

    let addr = server
        .addrs()
        .first()
        .copied()
        .ok_or(GatewayError::NoBoundAddress)?;

    info!(
        %addr,
        graphql_path = %config.graphql.path,
        subscriptions_path = %config.graphql.subscriptions_path,
        "Comment gateway listening"
    );

    Ok(RunningServer {
        addr,
        server: server.run(),
    })
}
