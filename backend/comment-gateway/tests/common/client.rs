//! Hybrid GraphQL client: subscriptions over WebSocket, everything else over HTTP

use anyhow::{anyhow, bail, Context, Result};
use async_graphql::parser::{parse_query, types::OperationType};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

const SUBPROTOCOL: &str = "graphql-transport-ws";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    /// Kind of the first operation in the document
    pub fn of(document: &str) -> Result<Self> {
        let doc = parse_query(document).context("invalid GraphQL document")?;
        let (_, operation) = doc
            .operations
            .iter()
            .next()
            .ok_or_else(|| anyhow!("document has no operation"))?;

        Ok(match operation.node.ty {
            OperationType::Query => OperationKind::Query,
            OperationType::Mutation => OperationKind::Mutation,
            OperationType::Subscription => OperationKind::Subscription,
        })
    }
}

/// Result of a routed operation
pub enum Outcome {
    Response(Value),
    Events(Subscription),
}

impl Outcome {
    pub fn into_response(self) -> Result<Value> {
        match self {
            Outcome::Response(value) => Ok(value),
            Outcome::Events(_) => bail!("expected a single response, got a subscription"),
        }
    }

    pub fn into_subscription(self) -> Result<Subscription> {
        match self {
            Outcome::Events(subscription) => Ok(subscription),
            Outcome::Response(_) => bail!("expected a subscription, got a single response"),
        }
    }
}

/// Query/mutation link over HTTP POST
pub struct HttpLink {
    url: String,
    http: reqwest::Client,
}

impl HttpLink {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http: reqwest::Client::new(),
        }
    }

    pub async fn execute(&self, query: &str, variables: Value) -> Result<Value> {
        let mut body = json!({ "query": query });
        if !variables.is_null() {
            body["variables"] = variables;
        }

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .context("HTTP request failed")?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}

/// Subscription link speaking graphql-transport-ws
pub struct WsLink {
    url: String,
}

impl WsLink {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Open a socket, wait for `connection_ack`, then start the subscription
    pub async fn subscribe(&self, query: &str) -> Result<Subscription> {
        let mut request = self.url.as_str().into_client_request()?;
        request
            .headers_mut()
            .insert("Sec-WebSocket-Protocol", HeaderValue::from_static(SUBPROTOCOL));

        let (socket, _) = connect_async(request)
            .await
            .context("WebSocket connection failed")?;

        let mut subscription = Subscription {
            socket,
            id: "1".to_string(),
            connection_confirmed: false,
        };

        subscription
            .send(json!({ "type": "connection_init", "payload": {} }))
            .await?;
        subscription.await_ack().await?;

        subscription
            .send(json!({
                "id": subscription.id,
                "type": "subscribe",
                "payload": { "query": query },
            }))
            .await?;

        Ok(subscription)
    }
}

/// Live subscription over its own socket
pub struct Subscription {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    id: String,
    connection_confirmed: bool,
}

impl Subscription {
    /// Whether the server acknowledged `connection_init`
    pub fn connection_confirmed(&self) -> bool {
        self.connection_confirmed
    }

    async fn send(&mut self, message: Value) -> Result<()> {
        self.socket.send(Message::Text(message.to_string())).await?;
        Ok(())
    }

    async fn await_ack(&mut self) -> Result<()> {
        while let Some(message) = self.next_message().await? {
            match message["type"].as_str() {
                Some("connection_ack") => {
                    self.connection_confirmed = true;
                    return Ok(());
                }
                Some("ping") => self.send(json!({ "type": "pong" })).await?,
                other => bail!("unexpected message before ack: {:?}", other),
            }
        }
        bail!("socket closed before connection_ack")
    }

    async fn next_message(&mut self) -> Result<Option<Value>> {
        while let Some(frame) = self.socket.next().await {
            match frame? {
                Message::Text(text) => return Ok(Some(serde_json::from_str(&text)?)),
                Message::Close(_) => return Ok(None),
                _ => continue,
            }
        }
        Ok(None)
    }

    /// Next `data` payload, or `None` if nothing arrives within `wait`
    pub async fn next_data(&mut self, wait: Duration) -> Result<Option<Value>> {
        let received = timeout(wait, async {
            while let Some(message) = self.next_message().await? {
                match message["type"].as_str() {
                    Some("next") if message["id"] == self.id.as_str() => {
                        return Ok(Some(message["payload"]["data"].clone()));
                    }
                    Some("error") => bail!("subscription error: {}", message["payload"]),
                    Some("complete") => return Ok(None),
                    Some("ping") => self.send(json!({ "type": "pong" })).await?,
                    _ => continue,
                }
            }
            Ok::<Option<Value>, anyhow::Error>(None)
        })
        .await;

        match received {
            Ok(result) => result,
            Err(_) => Ok(None),
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.send(json!({ "id": self.id, "type": "complete" })).await?;
        self.socket.close(None).await?;
        Ok(())
    }
}

/// Routes each operation by kind: subscriptions to WebSocket, the rest to HTTP
pub struct HybridClient {
    http: HttpLink,
    ws: WsLink,
}

impl HybridClient {
    pub fn new(http_url: impl Into<String>, ws_url: impl Into<String>) -> Self {
        Self {
            http: HttpLink::new(http_url),
            ws: WsLink::new(ws_url),
        }
    }

    pub async fn execute(&self, document: &str) -> Result<Outcome> {
        match OperationKind::of(document)? {
            OperationKind::Subscription => Ok(Outcome::Events(self.ws.subscribe(document).await?)),
            OperationKind::Query | OperationKind::Mutation => Ok(Outcome::Response(
                self.http.execute(document, Value::Null).await?,
            )),
        }
    }

    pub async fn execute_with(&self, document: &str, variables: Value) -> Result<Value> {
        match OperationKind::of(document)? {
            OperationKind::Subscription => bail!("variables are only routed over HTTP"),
            _ => self.http.execute(document, variables).await,
        }
    }
}
