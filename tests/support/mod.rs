//! In-memory transport and scripted server for session tests.

#![allow(dead_code)]

use async_trait::async_trait;
use prost::Message;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use ysafe_client::protocol::{response, Request, Response, SignInResult, Status};
use ysafe_client::{ClientError, Credentials, FrameTransport, Session, SessionConfig};

pub const TEST_EMAIL: &str = "ops@example.com";

/// base64 of "credential-blob"
pub const TEST_TOKEN: &str = "Y3JlZGVudGlhbC1ibG9i";

pub fn credentials() -> Credentials {
    Credentials::new(TEST_TOKEN, "123456")
}

/// Client half: what the session talks to.
pub struct MockTransport {
    to_server: mpsc::UnboundedSender<Vec<u8>>,
    from_server: mpsc::UnboundedReceiver<Vec<u8>>,
    writes: Arc<AtomicUsize>,
}

#[async_trait]
impl FrameTransport for MockTransport {
    async fn send_frame(&mut self, frame: Vec<u8>) -> Result<(), ClientError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.to_server
            .send(frame)
            .map_err(|_| ClientError::Transport("peer gone".into()))
    }

    async fn recv_frame(&mut self) -> Result<Option<Vec<u8>>, ClientError> {
        Ok(self.from_server.recv().await)
    }
}

/// What the scripted server does with one request.
pub enum Reply {
    Message(Response),
    Raw(Vec<u8>),
    /// Answer after a pause; later requests wait behind it
    Delayed(Response, Duration),
    /// Read the request but never answer
    Silent,
    /// Close the connection without answering
    HangUp,
}

/// Everything the server saw.
#[derive(Clone, Default)]
pub struct Recorder {
    pub writes: Arc<AtomicUsize>,
    pub requests: Arc<Mutex<Vec<Request>>>,
}

impl Recorder {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

/// Spawn a server that answers each request with `handler`.
pub fn spawn_server<F>(mut handler: F) -> (MockTransport, Recorder, JoinHandle<()>)
where
    F: FnMut(&Request) -> Reply + Send + 'static,
{
    let (to_server, mut requests_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    let (replies_tx, from_server) = mpsc::unbounded_channel::<Vec<u8>>();
    let recorder = Recorder::default();

    let transport = MockTransport {
        to_server,
        from_server,
        writes: Arc::clone(&recorder.writes),
    };

    let seen = Arc::clone(&recorder.requests);
    let task = tokio::spawn(async move {
        let mut replies = Some(replies_tx);
        while let Some(frame) = requests_rx.recv().await {
            let request = Request::decode(frame.as_slice()).expect("client sent a valid request");
            seen.lock().unwrap().push(request.clone());

            let Some(tx) = replies.as_ref() else { break };
            match handler(&request) {
                Reply::Message(response) => {
                    let _ = tx.send(response.encode_to_vec());
                }
                Reply::Raw(bytes) => {
                    let _ = tx.send(bytes);
                }
                Reply::Delayed(response, pause) => {
                    tokio::time::sleep(pause).await;
                    let _ = tx.send(response.encode_to_vec());
                }
                Reply::Silent => {}
                Reply::HangUp => {
                    replies = None;
                }
            }
        }
    });

    (transport, recorder, task)
}

pub fn sign_in_reply(status: Status, email: &str) -> Response {
    Response::new(response::Operation::SignIn(SignInResult {
        status: status as i32,
        message: None,
        email: email.to_string(),
    }))
}

pub fn is_sign_in(request: &Request) -> bool {
    matches!(
        request.operation,
        Some(ysafe_client::protocol::request::Operation::SignIn(_))
    )
}

/// A signed-in session whose later requests are answered by `handler`.
pub async fn session_with<F>(mut handler: F) -> (Session, Recorder)
where
    F: FnMut(&Request) -> Reply + Send + 'static,
{
    session_with_config(SessionConfig::default(), move |request| {
        if is_sign_in(request) {
            Reply::Message(sign_in_reply(Status::Success, TEST_EMAIL))
        } else {
            handler(request)
        }
    })
    .await
}

pub async fn session_with_config<F>(config: SessionConfig, handler: F) -> (Session, Recorder)
where
    F: FnMut(&Request) -> Reply + Send + 'static,
{
    let (transport, recorder, _task) = spawn_server(handler);
    let session = Session::establish(transport, &credentials(), config)
        .await
        .expect("sign-in succeeds");
    (session, recorder)
}
