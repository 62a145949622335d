//! Client for the balanz backend: one WebSocket carrying
//! request/response frames correlated by a short numeric message id.
//!
//! Requests are `[2, message_id, command, payload]`; responses are
//! `[status, message_id, payload]` with status `3` meaning success. Several
//! calls may be in flight at once; each is resolved independently when its
//! matching response arrives. On transport loss the client retries with a
//! fixed delay and logs in again; calls made while disconnected fail
//! immediately instead of queuing.

use std::{collections::HashMap, sync::Arc, time::Duration};

use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use rand::Rng;
use serde_json::{Value, json};
use tokio::{
    net::TcpStream,
    sync::{Mutex, oneshot},
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{client::IntoClientRequest, http::HeaderValue, protocol::Message},
};

use crate::{
    core::session::{Charger, Group, Session},
    prelude::*,
};

const SUBPROTOCOL: &str = "ocpp1.6";
const CALL_FRAME: i64 = 2;
const STATUS_OK: i64 = 3;
const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const CALL_TIMEOUT: Duration = Duration::from_secs(30);

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Sink = SplitSink<Socket, Message>;
type Pending = HashMap<String, oneshot::Sender<(i64, Value)>>;

pub struct Client {
    inner: Arc<Inner>,
}

struct Inner {
    url: String,
    token: String,

    /// [`None`] while disconnected.
    sink: Mutex<Option<Sink>>,

    /// Outstanding calls awaiting their correlated response.
    pending: Mutex<Pending>,
}

impl Client {
    /// Open the channel, start the read loop, and log in.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn connect(url: &str, token: &str) -> Result<Self> {
        let inner = Arc::new(Inner {
            url: url.to_string(),
            token: token.to_string(),
            sink: Mutex::new(None),
            pending: Mutex::new(Pending::new()),
        });
        let socket = dial(&inner.url).await?;
        let (sink, stream) = socket.split();
        *inner.sink.lock().await = Some(sink);
        tokio::spawn(run(Arc::clone(&inner), stream));

        let user_type = inner.login().await?;
        info!(user_type, "logged in");
        Ok(Self { inner })
    }

    pub async fn call(&self, command: &str, payload: Value) -> Result<Value> {
        self.inner.call(command, payload).await
    }

    pub async fn get_sessions(&self, include_live: bool) -> Result<Vec<Session>> {
        let payload =
            self.call("GetSessions", json!({ "include_live": include_live.to_string() })).await?;
        serde_json::from_value(payload).context("malformed `GetSessions` payload")
    }

    pub async fn get_chargers(&self) -> Result<Vec<Charger>> {
        let payload = self.call("GetChargers", json!({})).await?;
        serde_json::from_value(payload).context("malformed `GetChargers` payload")
    }

    pub async fn get_groups(&self) -> Result<Vec<Group>> {
        let payload = self.call("GetGroups", json!({})).await?;
        serde_json::from_value(payload).context("malformed `GetGroups` payload")
    }
}

impl Inner {
    async fn call(&self, command: &str, payload: Value) -> Result<Value> {
        let message_id = gen_message_id();
        let (sender, receiver) = oneshot::channel();
        {
            let mut sink = self.sink.lock().await;
            let Some(sink) = sink.as_mut() else {
                bail!("not connected, failing the `{command}` call");
            };
            self.pending.lock().await.insert(message_id.clone(), sender);
            let frame = encode_request(&message_id, command, &payload);
            if let Err(error) = sink.send(Message::Text(frame)).await {
                self.pending.lock().await.remove(&message_id);
                return Err(Error::from(error)).context("failed to send the request");
            }
        }
        let (status, payload) = match tokio::time::timeout(CALL_TIMEOUT, receiver).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => bail!("connection lost while awaiting the `{command}` response"),
            Err(_) => {
                self.pending.lock().await.remove(&message_id);
                bail!("timed out awaiting the `{command}` response");
            }
        };
        ensure!(status == STATUS_OK, "`{command}` failed with status {status}: {payload}");
        Ok(payload)
    }

    async fn login(&self) -> Result<String> {
        let payload = self.call("Login", json!({ "token": self.token })).await?;
        Ok(payload.get("user_type").and_then(Value::as_str).unwrap_or_default().to_string())
    }
}

async fn dial(url: &str) -> Result<Socket> {
    let mut request = url.into_client_request()?;
    request.headers_mut().insert("Sec-WebSocket-Protocol", HeaderValue::from_static(SUBPROTOCOL));
    let (socket, _) = connect_async(request).await.context("failed to connect")?;
    Ok(socket)
}

/// Read loop: dispatch responses to their outstanding calls and reconnect
/// on transport loss.
async fn run(inner: Arc<Inner>, mut stream: SplitStream<Socket>) {
    loop {
        while let Some(message) = stream.next().await {
            match message {
                Ok(Message::Text(text)) => dispatch(&inner, &text).await,
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(error) => {
                    warn!("transport error: {error:#}");
                    break;
                }
            }
        }

        // Fail the outstanding calls right away rather than queueing.
        *inner.sink.lock().await = None;
        inner.pending.lock().await.clear();
        warn!("connection lost, reconnecting…");

        stream = loop {
            tokio::time::sleep(RECONNECT_DELAY).await;
            let socket = match dial(&inner.url).await {
                Ok(socket) => socket,
                Err(error) => {
                    warn!("reconnect attempt failed: {error:#}");
                    continue;
                }
            };
            let (sink, stream) = socket.split();
            *inner.sink.lock().await = Some(sink);
            match inner.login().await {
                Ok(user_type) => {
                    info!(user_type, "reconnected and logged in");
                    break stream;
                }
                Err(error) => {
                    warn!("failed to log in again: {error:#}");
                    *inner.sink.lock().await = None;
                }
            }
        };
    }
}

async fn dispatch(inner: &Inner, text: &str) {
    match decode_response(text) {
        Ok((status, message_id, payload)) => {
            match inner.pending.lock().await.remove(&message_id) {
                // The receiver may have timed out; that is fine.
                Some(sender) => {
                    let _ = sender.send((status, payload));
                }
                None => warn!(%message_id, "no matching outstanding call, discarding the response"),
            }
        }
        Err(error) => warn!("ignoring a malformed frame: {error:#}"),
    }
}

/// Random correlation token, 1000 through 9999 like the reference dashboard.
fn gen_message_id() -> String {
    rand::thread_rng().gen_range(1000..=9999).to_string()
}

fn encode_request(message_id: &str, command: &str, payload: &Value) -> String {
    json!([CALL_FRAME, message_id, command, payload]).to_string()
}

fn decode_response(text: &str) -> Result<(i64, String, Value)> {
    serde_json::from_str(text).context("malformed response frame")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_request() {
        let frame = encode_request("1234", "GetSessions", &json!({ "include_live": "true" }));
        assert_eq!(frame, r#"[2,"1234","GetSessions",{"include_live":"true"}]"#);
    }

    #[test]
    fn test_decode_response() {
        let (status, message_id, payload) =
            decode_response(r#"[3,"1234",[{"session_id":"S-1"}]]"#).unwrap();
        assert_eq!(status, STATUS_OK);
        assert_eq!(message_id, "1234");
        assert!(payload.is_array());
    }

    #[test]
    fn test_decode_response_rejects_short_frames() {
        assert!(decode_response(r#"[3,"1234"]"#).is_err());
        assert!(decode_response("{}").is_err());
    }

    #[test]
    fn test_message_id_range() {
        for _ in 0..100 {
            let message_id: u32 = gen_message_id().parse().unwrap();
            assert!((1000..=9999).contains(&message_id));
        }
    }

    #[tokio::test]
    async fn test_dispatch_resolves_outstanding_call() {
        let inner = Inner {
            url: String::new(),
            token: String::new(),
            sink: Mutex::new(None),
            pending: Mutex::new(Pending::new()),
        };
        let (sender, receiver) = oneshot::channel();
        inner.pending.lock().await.insert("4321".to_string(), sender);

        dispatch(&inner, r#"[3,"4321",{"user_type":"Admin"}]"#).await;
        let (status, payload) = receiver.await.unwrap();
        assert_eq!(status, STATUS_OK);
        assert_eq!(payload["user_type"], "Admin");
        assert!(inner.pending.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_call_fails_immediately_while_disconnected() {
        let inner = Inner {
            url: String::new(),
            token: String::new(),
            sink: Mutex::new(None),
            pending: Mutex::new(Pending::new()),
        };
        let error = inner.call("GetSessions", json!({})).await.unwrap_err();
        assert!(error.to_string().contains("not connected"));
    }
}
