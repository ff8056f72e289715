//! Framed I/O for the IMAP line protocol.
//!
//! Server lines are newline-terminated (CRLF on conforming servers). Reads go
//! through a buffer, so a line split over several TCP segments, or several
//! lines in one segment, are framed correctly. Every read and write is bounded
//! by the I/O deadline.

use std::future::Future;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::parser::ResponseLine;
use crate::types::Status;
use crate::{Error, Result};

/// Default buffer size for reading.
const DEFAULT_BUFFER_SIZE: usize = 2048;

/// Maximum line length to prevent memory exhaustion.
const MAX_LINE_LENGTH: usize = 1024 * 1024; // 1 MB

/// Framed connection for the IMAP protocol.
pub struct FramedStream<S> {
    reader: BufReader<S>,
    write_buffer: BytesMut,
    io_timeout: Duration,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new framed stream.
    pub fn new(stream: S, io_timeout: Duration) -> Self {
        Self {
            reader: BufReader::with_capacity(DEFAULT_BUFFER_SIZE, stream),
            write_buffer: BytesMut::with_capacity(DEFAULT_BUFFER_SIZE),
            io_timeout,
        }
    }

    /// Reads one line and returns it without its `\r\n` or `\n` terminator.
    ///
    /// # Errors
    ///
    /// [`Error::ConnectionClosed`] if the peer closes before a full line,
    /// [`Error::Timeout`] if the deadline expires, or the underlying I/O error.
    pub async fn read_line(&mut self) -> Result<String> {
        let timeout = self.io_timeout;
        let mut line = with_deadline(timeout, read_raw_line(&mut self.reader)).await?;

        if line.last() == Some(&b'\n') {
            line.pop();
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }

        Ok(String::from_utf8_lossy(&line).into_owned())
    }

    /// Writes a command to the stream and flushes it.
    pub async fn write_command(&mut self, data: &[u8]) -> Result<()> {
        self.write_buffer.clear();
        self.write_buffer.extend_from_slice(data);

        let timeout = self.io_timeout;
        let stream = self.reader.get_mut();
        let buffer = &self.write_buffer;
        with_deadline(timeout, async {
            stream.write_all(buffer).await?;
            stream.flush().await?;
            Ok::<_, Error>(())
        })
        .await
    }

    /// Shuts down the write side (TLS `close_notify`, then socket FIN).
    pub async fn shutdown(&mut self) -> Result<()> {
        let timeout = self.io_timeout;
        let stream = self.reader.get_mut();
        with_deadline(timeout, async { stream.shutdown().await.map_err(Error::from) }).await
    }
}

async fn read_raw_line<R>(reader: &mut BufReader<R>) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut line = Vec::new();

    loop {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            return Err(Error::ConnectionClosed);
        }

        if let Some(pos) = buf.iter().position(|&b| b == b'\n') {
            line.extend_from_slice(&buf[..=pos]);
            reader.consume(pos + 1);
            return Ok(line);
        }

        let len = buf.len();
        line.extend_from_slice(buf);
        reader.consume(len);

        if line.len() > MAX_LINE_LENGTH {
            return Err(Error::MalformedResponse("line too long".to_string()));
        }
    }
}

async fn with_deadline<T>(timeout: Duration, fut: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| Error::Timeout(timeout))?
}

/// Reply to one command: its tagged completion plus the untagged lines before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse {
    /// Tag the command was issued with.
    pub tag: String,
    /// Completion status.
    pub status: Status,
    /// Completion text.
    pub text: String,
    /// Untagged lines received before completion, verbatim.
    pub untagged: Vec<String>,
}

impl CommandResponse {
    /// Converts a NO/BAD completion into an error.
    ///
    /// # Errors
    ///
    /// [`Error::No`] or [`Error::Bad`] carrying the completion text.
    pub fn into_ok(self) -> Result<Self> {
        match self.status {
            Status::Ok => Ok(self),
            Status::No => Err(Error::No(self.text)),
            Status::Bad => Err(Error::Bad(self.text)),
        }
    }
}

/// What the accumulator needs after taking a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// Keep reading.
    Pending,
    /// Server asked for more data; the caller decides how to answer.
    Continuation(String),
    /// The command completed.
    Done(CommandResponse),
}

/// Collects lines for one outstanding command until its tagged completion.
#[derive(Debug)]
pub struct ResponseAccumulator {
    tag: String,
    untagged: Vec<String>,
}

impl ResponseAccumulator {
    /// Creates a new response accumulator for the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            untagged: Vec::new(),
        }
    }

    /// Feeds one classified line.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedResponse`] if the line is tagged for another command.
    pub fn push(&mut self, line: ResponseLine) -> Result<Progress> {
        match line {
            ResponseLine::Untagged(text) => {
                self.untagged.push(text);
                Ok(Progress::Pending)
            }
            ResponseLine::Continuation(text) => Ok(Progress::Continuation(text)),
            ResponseLine::Tagged { .. } if !line.completes(&self.tag) => {
                Err(Error::MalformedResponse(format!(
                    "expected tag {}, got {line:?}",
                    self.tag
                )))
            }
            ResponseLine::Tagged { tag, status, text } => Ok(Progress::Done(CommandResponse {
                tag,
                status,
                text,
                untagged: std::mem::take(&mut self.untagged),
            })),
        }
    }

    /// Returns the untagged lines collected so far.
    #[must_use]
    pub fn untagged(&self) -> &[String] {
        &self.untagged
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_framed_read_simple_line() {
        let mock = Builder::new().read(b"* OK ready\r\n").build();
        let mut framed = FramedStream::new(mock, TIMEOUT);

        assert_eq!(framed.read_line().await.unwrap(), "* OK ready");
    }

    #[tokio::test]
    async fn test_framed_read_bare_lf() {
        let mock = Builder::new().read(b"* OK ready\n").build();
        let mut framed = FramedStream::new(mock, TIMEOUT);

        assert_eq!(framed.read_line().await.unwrap(), "* OK ready");
    }

    #[tokio::test]
    async fn test_framed_read_split_across_reads() {
        let mock = Builder::new()
            .read(b"* STATUS IN")
            .read(b"BOX (UNSEEN")
            .read(b" 3)\r")
            .read(b"\n")
            .build();
        let mut framed = FramedStream::new(mock, TIMEOUT);

        assert_eq!(
            framed.read_line().await.unwrap(),
            "* STATUS INBOX (UNSEEN 3)"
        );
    }

    #[tokio::test]
    async fn test_framed_read_several_lines_in_one_read() {
        let mock = Builder::new()
            .read(b"* CAPABILITY IMAP4rev1\r\nA0001 OK done\r\n")
            .build();
        let mut framed = FramedStream::new(mock, TIMEOUT);

        assert_eq!(framed.read_line().await.unwrap(), "* CAPABILITY IMAP4rev1");
        assert_eq!(framed.read_line().await.unwrap(), "A0001 OK done");
    }

    #[tokio::test]
    async fn test_framed_read_eof() {
        let mock = Builder::new().build();
        let mut framed = FramedStream::new(mock, TIMEOUT);

        assert!(matches!(
            framed.read_line().await,
            Err(Error::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_framed_read_partial_line_then_eof() {
        let mock = Builder::new().read(b"* OK half").build();
        let mut framed = FramedStream::new(mock, TIMEOUT);

        assert!(matches!(
            framed.read_line().await,
            Err(Error::ConnectionClosed)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_framed_read_timeout() {
        let mock = Builder::new().wait(Duration::from_secs(60)).build();
        let mut framed = FramedStream::new(mock, Duration::from_secs(1));

        assert!(matches!(
            framed.read_line().await,
            Err(Error::Timeout(d)) if d == Duration::from_secs(1)
        ));
    }

    #[tokio::test]
    async fn test_framed_write_command() {
        let mock = Builder::new().write(b"A0001 CAPABILITY\r\n").build();
        let mut framed = FramedStream::new(mock, TIMEOUT);

        framed.write_command(b"A0001 CAPABILITY\r\n").await.unwrap();
    }

    #[tokio::test]
    async fn test_line_length_limit() {
        let long_line = "A".repeat(MAX_LINE_LENGTH + 100);
        let mock = Builder::new().read(long_line.as_bytes()).build();
        let mut framed = FramedStream::new(mock, TIMEOUT);

        let result = framed.read_line().await;
        assert!(result.unwrap_err().to_string().contains("line too long"));
    }

    #[test]
    fn test_response_accumulator() {
        let mut accumulator = ResponseAccumulator::new("A0001");

        let progress = accumulator
            .push(ResponseLine::parse("* CAPABILITY IMAP4rev1").unwrap())
            .unwrap();
        assert_eq!(progress, Progress::Pending);
        assert_eq!(accumulator.untagged().len(), 1);

        let progress = accumulator
            .push(ResponseLine::parse("A0001 OK Success").unwrap())
            .unwrap();
        let Progress::Done(response) = progress else {
            panic!("expected completion");
        };
        assert_eq!(response.tag, "A0001");
        assert_eq!(response.status, Status::Ok);
        assert_eq!(response.text, "Success");
        assert_eq!(response.untagged, vec!["* CAPABILITY IMAP4rev1".to_string()]);
    }

    #[test]
    fn test_response_accumulator_wrong_tag() {
        let mut accumulator = ResponseAccumulator::new("A0002");
        let err = accumulator
            .push(ResponseLine::parse("A0001 OK late").unwrap())
            .unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn test_response_accumulator_tag_must_match_exactly() {
        let mut accumulator = ResponseAccumulator::new("A1");
        assert!(matches!(
            accumulator.push(ResponseLine::parse("A10 OK done").unwrap()),
            Err(Error::MalformedResponse(_))
        ));

        let mut accumulator = ResponseAccumulator::new("A10");
        assert!(matches!(
            accumulator.push(ResponseLine::parse("A1 OK done").unwrap()),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_response_accumulator_continuation() {
        let mut accumulator = ResponseAccumulator::new("A0002");
        let progress = accumulator
            .push(ResponseLine::parse("+ e30=").unwrap())
            .unwrap();
        assert_eq!(progress, Progress::Continuation("e30=".to_string()));
    }

    #[test]
    fn test_command_response_into_ok() {
        let response = |status| CommandResponse {
            tag: "A1".to_string(),
            status,
            text: "text".to_string(),
            untagged: Vec::new(),
        };

        assert!(response(Status::Ok).into_ok().is_ok());
        assert!(matches!(response(Status::No).into_ok(), Err(Error::No(t)) if t == "text"));
        assert!(matches!(response(Status::Bad).into_ok(), Err(Error::Bad(_))));
    }
}
