//! Integration tests for the inbox check.
//!
//! Scripted servers use a mock stream that replays a transcript and records
//! what the client sent; transport failures use real sockets on loopback.

use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpListener;

use mailprobe_imap::{AuthResult, Config, Error, Session, check_inbox, check_inbox_on};
use mailprobe_oauth::sasl::xoauth2_response;
use mailprobe_oauth::{Credential, Token};

/// What the mock observed, shared with the test after the session is gone.
#[derive(Default)]
struct Observed {
    sent: Vec<u8>,
    shutdown: bool,
}

/// Mock stream that returns a predefined transcript.
struct MockStream {
    /// Server bytes to return (in order).
    responses: Cursor<Vec<u8>>,
    observed: Arc<Mutex<Observed>>,
}

impl MockStream {
    fn new(responses: &str) -> (Self, Arc<Mutex<Observed>>) {
        let observed = Arc::new(Mutex::new(Observed::default()));
        let stream = Self {
            responses: Cursor::new(responses.as_bytes().to_vec()),
            observed: Arc::clone(&observed),
        };
        (stream, observed)
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let data = self.responses.get_ref();
        let pos = usize::try_from(self.responses.position()).unwrap();

        if pos >= data.len() {
            return Poll::Ready(Ok(()));
        }

        let remaining = &data[pos..];
        let to_read = remaining.len().min(buf.remaining());
        buf.put_slice(&remaining[..to_read]);
        self.responses.set_position((pos + to_read) as u64);

        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.observed.lock().unwrap().sent.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.observed.lock().unwrap().shutdown = true;
        Poll::Ready(Ok(()))
    }
}

fn config() -> Config {
    Config::builder("imap.example.com")
        .io_timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

fn credential() -> Credential {
    Credential::new("user@example.com", Token::bearer("ya29.token"))
}

fn sent_lines(observed: &Arc<Mutex<Observed>>) -> Vec<String> {
    let sent = observed.lock().unwrap().sent.clone();
    String::from_utf8(sent)
        .unwrap()
        .split_terminator("\r\n")
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_authenticated_reports_unseen_count() {
    let (stream, observed) = MockStream::new(concat!(
        "* OK banner\r\n",
        "* CAPABILITY IMAP4rev1 AUTH=XOAUTH2\r\n",
        "A0001 OK CAPABILITY completed\r\n",
        "A0002 OK AUTHENTICATE completed\r\n",
        "* STATUS INBOX (UNSEEN 3)\r\n",
        "A0003 OK STATUS completed\r\n",
        "* BYE logging out\r\n",
        "A0004 OK LOGOUT completed\r\n",
    ));
    let session = Session::from_stream(stream, &config());

    let report = check_inbox_on(session, &credential()).await.unwrap();

    assert!(matches!(report.auth, AuthResult::Authenticated));
    assert_eq!(report.unseen(), Some(3));
    assert_eq!(report.status_lines, vec!["* STATUS INBOX (UNSEEN 3)".to_string()]);

    let payload = xoauth2_response("user@example.com", "ya29.token").unwrap();
    assert_eq!(
        sent_lines(&observed),
        vec![
            "A0001 CAPABILITY".to_string(),
            format!("A0002 AUTHENTICATE XOAUTH2 {payload}"),
            "A0003 STATUS INBOX (UNSEEN)".to_string(),
            "A0004 LOGOUT".to_string(),
        ]
    );
    assert!(observed.lock().unwrap().shutdown);
}

#[tokio::test]
async fn test_rejected_skips_status_and_logs_out() {
    let (stream, observed) = MockStream::new(concat!(
        "* OK banner\r\n",
        "A0001 OK CAPABILITY completed\r\n",
        "A0002 NO AUTHENTICATE failed\r\n",
        "A0003 OK LOGOUT completed\r\n",
    ));
    let session = Session::from_stream(stream, &config());

    let report = check_inbox_on(session, &credential()).await.unwrap();

    let AuthResult::Rejected(message) = &report.auth else {
        panic!("expected rejection, got {:?}", report.auth);
    };
    assert_eq!(message, "AUTHENTICATE failed");
    assert!(report.status_lines.is_empty());

    let sent = sent_lines(&observed);
    assert_eq!(sent.len(), 3);
    assert!(sent.iter().all(|line| !line.contains("STATUS")));
    assert_eq!(sent[2], "A0003 LOGOUT");
    assert!(observed.lock().unwrap().shutdown);
}

#[tokio::test]
async fn test_connection_dropped_mid_handshake() {
    let (stream, observed) = MockStream::new("* OK banner\r\n");
    let session = Session::from_stream(stream, &config());

    let report = check_inbox_on(session, &credential()).await.unwrap();

    assert!(matches!(
        report.auth,
        AuthResult::TransportError(Error::ConnectionClosed)
    ));
    assert_eq!(sent_lines(&observed), vec!["A0001 CAPABILITY".to_string()]);
    assert!(observed.lock().unwrap().shutdown);
}

#[tokio::test]
async fn test_peer_closes_before_banner() {
    let (stream, observed) = MockStream::new("");
    let session = Session::from_stream(stream, &config());

    let report = check_inbox_on(session, &credential()).await.unwrap();

    assert!(matches!(report.auth, AuthResult::TransportError(_)));
    assert!(observed.lock().unwrap().sent.is_empty());
    assert!(observed.lock().unwrap().shutdown);
}

#[tokio::test]
async fn test_foreign_tag_is_transport_error() {
    let (stream, observed) = MockStream::new(concat!(
        "* OK banner\r\n",
        "A0001 OK CAPABILITY completed\r\n",
        "A0001 OK AUTHENTICATE completed\r\n",
    ));
    let session = Session::from_stream(stream, &config());

    let report = check_inbox_on(session, &credential()).await.unwrap();

    assert!(matches!(
        report.auth,
        AuthResult::TransportError(Error::MalformedResponse(_))
    ));
    assert!(observed.lock().unwrap().shutdown);
}

#[tokio::test]
async fn test_capability_refusal_does_not_block_auth() {
    let (stream, _observed) = MockStream::new(concat!(
        "* OK banner\r\n",
        "A0001 BAD unknown command\r\n",
        "A0002 OK AUTHENTICATE completed\r\n",
        "* STATUS INBOX (UNSEEN 0)\r\n",
        "A0003 OK STATUS completed\r\n",
        "A0004 OK LOGOUT completed\r\n",
    ));
    let session = Session::from_stream(stream, &config());

    let report = check_inbox_on(session, &credential()).await.unwrap();

    assert!(report.auth.is_authenticated());
    assert_eq!(report.unseen(), Some(0));
}

#[tokio::test]
async fn test_bare_lf_terminators() {
    // Bare LF terminators are accepted.
    let (stream, _observed) = MockStream::new(concat!(
        "* OK banner\n",
        "A0001 OK CAPABILITY completed\n",
        "A0002 OK AUTHENTICATE completed\n",
        "* STATUS INBOX (MESSAGES 10 UNSEEN 4)\n",
        "A0003 OK STATUS completed\n",
        "A0004 OK LOGOUT completed\n",
    ));
    let session = Session::from_stream(stream, &config());

    let report = check_inbox_on(session, &credential()).await.unwrap();
    assert_eq!(report.unseen(), Some(4));
}

#[tokio::test]
async fn test_connect_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = Config::builder("127.0.0.1")
        .port(port)
        .connect_timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    let report = check_inbox(&config, &credential()).await.unwrap();
    let AuthResult::TransportError(e) = report.auth else {
        panic!("expected transport error");
    };
    assert!(matches!(e, Error::Io(_)));
    assert!(e.is_transport());
}

#[tokio::test]
async fn test_connect_timeout_on_silent_server() {
    // Bound but never accepted: the kernel completes TCP, TLS never answers.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let config = Config::builder("127.0.0.1")
        .port(port)
        .connect_timeout(Duration::from_millis(200))
        .build()
        .unwrap();

    let report = check_inbox(&config, &credential()).await.unwrap();
    assert!(matches!(
        report.auth,
        AuthResult::TransportError(Error::Timeout(_))
    ));
    drop(listener);
}

#[tokio::test]
async fn test_plaintext_server_fails_tls() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let _ = socket.write_all(b"* OK plaintext IMAP ready\r\n").await;
        // Keep the socket open until the client gives up.
        tokio::time::sleep(Duration::from_secs(2)).await;
    });

    let config = Config::builder("127.0.0.1")
        .port(port)
        .connect_timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    let report = check_inbox(&config, &credential()).await.unwrap();
    let AuthResult::TransportError(e) = report.auth else {
        panic!("expected transport error");
    };
    assert!(e.is_transport());

    server.abort();
}
