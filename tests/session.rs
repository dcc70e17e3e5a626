//! Session lifecycle against an in-memory server.

mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use support::*;
use ysafe_client::protocol::{
    request, response, GetMetaFromPath, GetMetaFromPathResult, PathKind, Request, Status,
};
use ysafe_client::{ClientError, Credentials, Session, SessionConfig, SessionRegistry};

fn lookup_request(path: &str) -> Request {
    Request::new(request::Operation::GetMetaFromPath(GetMetaFromPath {
        path: path.to_string(),
        trashed: false,
        type_of_path: PathKind::Any as i32,
    }))
}

fn lookup_reply(status: Status, message: Option<String>) -> Reply {
    Reply::Message(ysafe_client::protocol::Response::new(
        response::Operation::GetMetaFromPath(GetMetaFromPathResult {
            status: status as i32,
            message,
            meta: None,
        }),
    ))
}

fn requested_path(request: &Request) -> String {
    match &request.operation {
        Some(request::Operation::GetMetaFromPath(lookup)) => lookup.path.clone(),
        other => panic!("unexpected request {:?}", other),
    }
}

// =============================================================================
// Handshake
// =============================================================================

#[tokio::test]
async fn test_sign_in_captures_email() {
    let (session, recorder) = session_with(|_| lookup_reply(Status::Success, None)).await;

    assert_eq!(session.email(), TEST_EMAIL);
    assert!(session.is_alive());

    let requests = recorder.requests();
    assert_eq!(requests.len(), 1);
    match &requests[0].operation {
        Some(request::Operation::SignIn(sign_in)) => {
            assert_eq!(sign_in.data, b"credential-blob");
            assert_eq!(sign_in.pin.as_deref(), Some("123456"));
        }
        other => panic!("expected sign-in, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rejected_sign_in_is_handshake_error() {
    let (transport, _recorder, _task) =
        spawn_server(|_| Reply::Message(sign_in_reply(Status::Unauthorized, "")));

    let result = Session::establish(transport, &credentials(), SessionConfig::default()).await;
    assert!(matches!(result.err(), Some(ClientError::Handshake(_))));
}

#[tokio::test]
async fn test_unknown_sign_in_status_is_not_success() {
    let (transport, _recorder, _task) = spawn_server(|_| {
        let mut reply = sign_in_reply(Status::Success, TEST_EMAIL);
        if let Some(response::Operation::SignIn(result)) = reply.operation.as_mut() {
            result.status = 42;
        }
        Reply::Message(reply)
    });

    let result = Session::establish(transport, &credentials(), SessionConfig::default()).await;
    assert!(matches!(result.err(), Some(ClientError::Handshake(_))));
}

#[tokio::test]
async fn test_server_closing_during_sign_in_is_handshake_error() {
    let (transport, _recorder, _task) = spawn_server(|_| Reply::HangUp);

    let result = Session::establish(transport, &credentials(), SessionConfig::default()).await;
    assert!(matches!(result.err(), Some(ClientError::Handshake(_))));
}

#[tokio::test]
async fn test_wrong_sign_in_reply_is_protocol_error() {
    let (transport, _recorder, _task) = spawn_server(|_| lookup_reply(Status::Success, None));

    let result = Session::establish(transport, &credentials(), SessionConfig::default()).await;
    assert!(matches!(result.err(), Some(ClientError::Protocol(_))));
}

#[tokio::test]
async fn test_malformed_token_sends_nothing() {
    let (transport, recorder, _task) =
        spawn_server(|_| Reply::Message(sign_in_reply(Status::Success, TEST_EMAIL)));

    let bad = Credentials::new("this is not base64!", "123456");
    let result = Session::establish(transport, &bad, SessionConfig::default()).await;

    assert!(matches!(result.err(), Some(ClientError::Decode(_))));
    assert_eq!(recorder.writes(), 0);
}

#[tokio::test]
async fn test_connect_rejects_plain_websocket_endpoint() {
    let config = SessionConfig {
        endpoint: "ws://files.ysafe.io:5577".to_string(),
        ..Default::default()
    };
    let result = Session::connect(config, &credentials()).await;
    assert!(matches!(result.err(), Some(ClientError::AddressParse(_))));
}

#[tokio::test]
async fn test_connect_checks_token_before_dialing() {
    // Nothing listens here; a Decode error proves no dial was attempted.
    let config = SessionConfig {
        endpoint: "wss://127.0.0.1:9".to_string(),
        ..Default::default()
    };
    let bad = Credentials::new("%%%", "123456");
    let result = Session::connect(config, &bad).await;
    assert!(matches!(result.err(), Some(ClientError::Decode(_))));
}

// =============================================================================
// Request / reply
// =============================================================================

#[tokio::test]
async fn test_reply_is_returned_to_caller() {
    let (session, _recorder) =
        session_with(|_| lookup_reply(Status::ObjectNotFound, Some("no such path".into()))).await;

    let reply = session.send(lookup_request("/proj_abc")).await.unwrap();
    match reply.operation {
        Some(response::Operation::GetMetaFromPath(result)) => {
            assert_eq!(result.status, Status::ObjectNotFound as i32);
            assert_eq!(result.message.as_deref(), Some("no such path"));
        }
        other => panic!("unexpected reply {:?}", other),
    }
}

#[tokio::test]
async fn test_concurrent_callers_get_their_own_replies() {
    let (session, recorder) = session_with(|request| {
        let path = requested_path(request);
        lookup_reply(Status::Success, Some(path))
    })
    .await;
    let session = Arc::new(session);

    let mut handles = Vec::new();
    for i in 0..16 {
        let session = Arc::clone(&session);
        handles.push(tokio::spawn(async move {
            let path = format!("/folder_{}", i);
            let reply = session.send(lookup_request(&path)).await.unwrap();
            match reply.operation {
                Some(response::Operation::GetMetaFromPath(result)) => {
                    assert_eq!(result.message.as_deref(), Some(path.as_str()));
                }
                other => panic!("unexpected reply {:?}", other),
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // sign-in plus one frame per caller
    assert_eq!(recorder.writes(), 17);
}

#[tokio::test]
async fn test_empty_reply_keeps_session_usable() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let (session, _recorder) = session_with(move |_| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Reply::Raw(Vec::new())
        } else {
            lookup_reply(Status::Success, None)
        }
    })
    .await;

    let first = session.send(lookup_request("/a")).await;
    assert!(matches!(first, Err(ClientError::EmptyResponse)));

    let second = session.send(lookup_request("/a")).await;
    assert!(second.is_ok());
}

#[tokio::test]
async fn test_undecodable_reply_keeps_session_usable() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let (session, _recorder) = session_with(move |_| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Reply::Raw(vec![0xff, 0xff, 0xff])
        } else {
            lookup_reply(Status::Success, None)
        }
    })
    .await;

    let first = session.send(lookup_request("/a")).await;
    assert!(matches!(first, Err(ClientError::Protocol(_))));

    let second = session.send(lookup_request("/a")).await;
    assert!(second.is_ok());
}

#[tokio::test]
async fn test_transport_loss_fails_fast_afterwards() {
    let (session, recorder) = session_with(|_| Reply::HangUp).await;

    assert!(session.is_alive());

    let first = session.send(lookup_request("/a")).await;
    assert!(matches!(first, Err(ClientError::Transport(_))));
    assert!(!session.is_alive());
    let writes = recorder.writes();

    let second = session.send(lookup_request("/a")).await;
    assert!(matches!(second, Err(ClientError::NotConnected)));
    assert_eq!(recorder.writes(), writes, "no write after the connection is gone");
    assert!(!session.is_alive());
}

#[tokio::test]
async fn test_send_after_disconnect_is_not_connected() {
    let (session, recorder) = session_with(|_| lookup_reply(Status::Success, None)).await;

    assert!(session.is_alive());
    session.disconnect().await;
    assert!(!session.is_alive());
    let writes = recorder.writes();

    let result = session.send(lookup_request("/a")).await;
    assert!(matches!(result, Err(ClientError::NotConnected)));
    assert_eq!(recorder.writes(), writes);

    // Disconnecting twice is harmless
    session.disconnect().await;
}

#[tokio::test]
async fn test_request_timeout_when_configured() {
    let config = SessionConfig {
        request_timeout: Some(Duration::from_millis(50)),
        ..Default::default()
    };
    let (session, _recorder) = session_with_config(config, |request| {
        if is_sign_in(request) {
            Reply::Message(sign_in_reply(Status::Success, TEST_EMAIL))
        } else {
            Reply::Silent
        }
    })
    .await;

    let result = session.send(lookup_request("/slow")).await;
    match result {
        Err(ClientError::Timeout(message)) => assert!(message.contains("50ms"), "{}", message),
        other => panic!("expected Timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_request_abandoned_in_queue_is_never_written() {
    let config = SessionConfig {
        request_timeout: Some(Duration::from_millis(100)),
        ..Default::default()
    };
    let (session, recorder) = session_with_config(config, |request| {
        if is_sign_in(request) {
            return Reply::Message(sign_in_reply(Status::Success, TEST_EMAIL));
        }
        let path = requested_path(request);
        let reply = ysafe_client::protocol::Response::new(response::Operation::GetMetaFromPath(
            GetMetaFromPathResult {
                status: Status::Success as i32,
                message: Some(path.clone()),
                meta: None,
            },
        ));
        if path == "/first" {
            Reply::Delayed(reply, Duration::from_millis(300))
        } else {
            Reply::Message(reply)
        }
    })
    .await;
    let session = Arc::new(session);

    let in_flight = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.send(lookup_request("/first")).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Queued behind /first, gives up before the worker reaches it
    let queued = session.send(lookup_request("/second")).await;
    assert!(matches!(queued, Err(ClientError::Timeout(_))));
    assert!(matches!(
        in_flight.await.unwrap(),
        Err(ClientError::Timeout(_))
    ));

    // Let the late reply to /first drain, then the session works again
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(session.send(lookup_request("/third")).await.is_ok());

    let paths: Vec<String> = recorder
        .requests()
        .iter()
        .skip(1)
        .map(requested_path)
        .collect();
    assert_eq!(paths, vec!["/first", "/third"]);
}

// =============================================================================
// Registry
// =============================================================================

#[tokio::test]
async fn test_registry_initialises_once() {
    let registry = SessionRegistry::new(SessionConfig::default());
    let inits = Arc::new(AtomicUsize::new(0));

    let mut sessions = Vec::new();
    for _ in 0..3 {
        let inits = Arc::clone(&inits);
        let session = registry
            .get_or_init_with(|| async move {
                inits.fetch_add(1, Ordering::SeqCst);
                let (session, _recorder) =
                    session_with(|_| lookup_reply(Status::Success, None)).await;
                Ok(session)
            })
            .await
            .unwrap();
        sessions.push(session);
    }

    assert_eq!(inits.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&sessions[0], &sessions[1]));
    assert!(Arc::ptr_eq(&sessions[0], &sessions[2]));
}

#[tokio::test]
async fn test_registry_retries_after_failed_init() {
    let registry = SessionRegistry::new(SessionConfig::default());

    let failed = registry
        .get_or_init_with(|| async { Err(ClientError::Handshake("rejected".into())) })
        .await;
    assert!(matches!(failed.err(), Some(ClientError::Handshake(_))));

    let retried = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&retried);
    let session = registry
        .get_or_init_with(|| async move {
            counter.fetch_add(1, Ordering::SeqCst);
            let (session, _recorder) = session_with(|_| lookup_reply(Status::Success, None)).await;
            Ok(session)
        })
        .await
        .unwrap();
    assert_eq!(retried.load(Ordering::SeqCst), 1);
    assert_eq!(session.email(), TEST_EMAIL);
}

#[tokio::test]
async fn test_registry_replaces_session_that_lost_its_connection() {
    let registry = SessionRegistry::new(SessionConfig::default());
    let inits = Arc::new(AtomicUsize::new(0));

    let connect = |inits: Arc<AtomicUsize>| async move {
        inits.fetch_add(1, Ordering::SeqCst);
        let (session, _recorder) = session_with(|_| Reply::HangUp).await;
        Ok::<_, ClientError>(session)
    };

    let first = registry
        .get_or_init_with(|| connect(Arc::clone(&inits)))
        .await
        .unwrap();
    let lost = first.send(lookup_request("/a")).await;
    assert!(matches!(lost, Err(ClientError::Transport(_))));
    assert!(!first.is_alive());

    let second = registry
        .get_or_init_with(|| connect(Arc::clone(&inits)))
        .await
        .unwrap();
    assert_eq!(inits.load(Ordering::SeqCst), 2, "signed in again");
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(second.is_alive());

    // The replacement is reused while it stays connected
    let third = registry
        .get_or_init_with(|| connect(Arc::clone(&inits)))
        .await
        .unwrap();
    assert!(Arc::ptr_eq(&second, &third));
    assert_eq!(inits.load(Ordering::SeqCst), 2);
}
