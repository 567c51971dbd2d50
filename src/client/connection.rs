//! Chat client connection
//!
//! After joining, two flows run concurrently against the same connection:
//!
//! ```text
//!   input lines ──► Command ──► FramedWrite ──► server
//!                      │
//!                      ▼
//!              Mutex<RosterReplica> ◄── EventInterpreter ◄── FramedRead ◄── server
//!                      │                       │
//!                      └──────► output ◄───────┘
//! ```
//!
//! Either flow ending stops the client.

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::error::{Error, ProtocolError, Result};
use crate::protocol::{ChatCodec, ParticipantId, WireMessage};

use super::command::Command;
use super::config::ClientConfig;
use super::events::{chat_line, joined_line, EventInterpreter, Reaction};
use super::roster::RosterReplica;

const MESSAGE_TOO_LONG: &str = "Message too long";

/// A joined chat participant
pub struct ChatClient<S> {
    me: ParticipantId,
    reader: FramedRead<ReadHalf<S>, ChatCodec>,
    writer: FramedWrite<WriteHalf<S>, ChatCodec>,
    roster: RosterReplica,
}

impl ChatClient<TcpStream> {
    /// Connect to the server and join the group
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let addr = config.server_addr();
        let stream = TcpStream::connect(&addr).await?;
        stream.set_nodelay(true)?;
        tracing::debug!(server = %addr, "Connected");

        Self::join(stream, config.max_frame_size).await
    }
}

impl<S> ChatClient<S>
where
    S: AsyncRead + AsyncWrite,
{
    /// Request admission over an established stream
    ///
    /// Our own ID is the newest entry in the roster the server answers with.
    /// A capacity refusal comes back as [`Error::Rejected`].
    pub async fn join(stream: S, max_frame_size: usize) -> Result<Self> {
        let (rd, wr) = tokio::io::split(stream);
        let codec = ChatCodec::with_max_frame_size(max_frame_size);
        let mut reader = FramedRead::new(rd, codec.clone());
        let mut writer = FramedWrite::new(wr, codec);

        writer.send(WireMessage::ReqAdd).await?;

        let ids = match reader.next().await.transpose()? {
            Some(WireMessage::ResList(ids)) => ids,
            Some(WireMessage::Error(code)) => return Err(Error::Rejected(code)),
            Some(other) => {
                return Err(ProtocolError::UnexpectedMessage(format!(
                    "{} while joining",
                    other.name()
                ))
                .into())
            }
            None => return Err(Error::ConnectionClosed),
        };

        let mut roster = RosterReplica::new();
        roster.seed(ids);
        let me = roster
            .newest()
            .ok_or_else(|| ProtocolError::UnexpectedMessage("empty roster".into()))?;

        tracing::debug!(participant = %me, roster = roster.len(), "Joined");

        Ok(Self {
            me,
            reader,
            writer,
            roster,
        })
    }

    /// Our participant ID
    pub fn id(&self) -> ParticipantId {
        self.me
    }

    /// Local roster replica
    pub fn roster(&self) -> &RosterReplica {
        &self.roster
    }

    /// Run the command and event flows until one of them stops
    ///
    /// Returns `Ok` once our own removal is acknowledged. A lost connection
    /// or a write failure is an error. End of input counts as
    /// `close connection`.
    pub async fn run<I, O>(self, input: I, output: O) -> Result<()>
    where
        I: AsyncBufRead + Unpin,
        O: AsyncWrite + Unpin,
    {
        let ChatClient {
            me,
            mut reader,
            mut writer,
            roster,
        } = self;

        let roster = Mutex::new(roster);
        let output = Mutex::new(output);

        print(&output, &joined_line(me)).await?;

        let result = tokio::select! {
            result = command_flow(me, input, &mut writer, &roster, &output) => result,
            result = event_flow(me, &mut reader, &roster, &output) => result,
        };

        if let Err(e) = writer.close().await {
            tracing::debug!(error = %e, "Error closing connection");
        }
        result
    }
}

/// User input to wire messages. Returns only on failure.
///
/// Stops reading input after `close connection` and waits for the event
/// flow to see our `OK`.
async fn command_flow<I, W, O>(
    me: ParticipantId,
    input: I,
    writer: &mut FramedWrite<W, ChatCodec>,
    roster: &Mutex<RosterReplica>,
    output: &Mutex<O>,
) -> Result<()>
where
    I: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    O: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut leaving = false;

    while let Some(line) = lines.next_line().await? {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                tracing::debug!(line = %line, error = %e, "Rejected input");
                print(output, "Invalid command").await?;
                continue;
            }
        };

        if command == Command::List {
            let listing = roster.lock().await.listing();
            print(output, &listing).await?;
            continue;
        }

        let time = chrono::Local::now().format("%H:%M").to_string();
        if let Some(message) = command.to_wire(me, &time) {
            let size = message.encode().len();
            let max = writer.encoder().max_frame_size();
            if size > max {
                tracing::debug!(size, max, "Message exceeds frame limit");
                print(output, MESSAGE_TOO_LONG).await?;
                continue;
            }
            writer.send(message).await?;
        }

        match command {
            Command::SendAll(text) => {
                // The server never echoes a broadcast to its author
                let stamped = super::command::stamp(&time, &text);
                print(output, &chat_line(me, me, None, &stamped)).await?;
            }
            Command::Close => {
                leaving = true;
                break;
            }
            _ => {}
        }
    }

    if !leaving {
        writer.send(WireMessage::ReqRem(me)).await?;
    }

    // Wait for the server's OK on the event flow
    std::future::pending().await
}

/// Server events to roster updates and output. Returns when we have left.
async fn event_flow<R, O>(
    me: ParticipantId,
    reader: &mut FramedRead<R, ChatCodec>,
    roster: &Mutex<RosterReplica>,
    output: &Mutex<O>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    O: AsyncWrite + Unpin,
{
    let events = EventInterpreter::new(me);

    loop {
        let message = match reader.next().await.transpose()? {
            Some(message) => message,
            None => return Err(Error::ConnectionClosed),
        };

        let reaction = {
            let mut roster = roster.lock().await;
            events.apply(message, &mut roster)
        };

        match reaction {
            Reaction::Print(line) => print(output, &line).await?,
            Reaction::Ignore => {}
            Reaction::Leave(line) => {
                print(output, &line).await?;
                return Ok(());
            }
        }
    }
}

async fn print<O>(output: &Mutex<O>, line: &str) -> Result<()>
where
    O: AsyncWrite + Unpin,
{
    let mut out = output.lock().await;
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use tokio::io::duplex;

    use super::*;
    use crate::protocol::ErrorCode;

    fn id(n: u64) -> ParticipantId {
        ParticipantId::new(n)
    }

    /// Server end of a duplex pipe
    fn server_side(
        stream: tokio::io::DuplexStream,
    ) -> (
        FramedRead<ReadHalf<tokio::io::DuplexStream>, ChatCodec>,
        FramedWrite<WriteHalf<tokio::io::DuplexStream>, ChatCodec>,
    ) {
        let (rd, wr) = tokio::io::split(stream);
        (
            FramedRead::new(rd, ChatCodec::new()),
            FramedWrite::new(wr, ChatCodec::new()),
        )
    }

    #[tokio::test]
    async fn test_join_takes_newest_id() {
        let (client_end, server_end) = duplex(1024);
        let (mut rx, mut tx) = server_side(server_end);

        let server = tokio::spawn(async move {
            assert_eq!(rx.next().await.unwrap().unwrap(), WireMessage::ReqAdd);
            tx.send(WireMessage::ResList(vec![id(1), id(4)])).await.unwrap();
            (rx, tx)
        });

        let client = ChatClient::join(client_end, 4096).await.unwrap();
        assert_eq!(client.id(), id(4));
        assert_eq!(client.roster().listing(), "01 04");
        let _ = server.await.unwrap();
    }

    #[tokio::test]
    async fn test_join_rejected_at_capacity() {
        let (client_end, server_end) = duplex(1024);
        let (mut rx, mut tx) = server_side(server_end);

        tokio::spawn(async move {
            rx.next().await;
            tx.send(WireMessage::Error(ErrorCode::CapacityExceeded))
                .await
                .unwrap();
        });

        let err = ChatClient::join(client_end, 4096).await.err().unwrap();
        assert!(matches!(err, Error::Rejected(ErrorCode::CapacityExceeded)));
    }

    #[tokio::test]
    async fn test_session_until_close() {
        let (client_end, server_end) = duplex(4096);
        let (mut rx, mut tx) = server_side(server_end);

        let server = tokio::spawn(async move {
            assert_eq!(rx.next().await.unwrap().unwrap(), WireMessage::ReqAdd);
            tx.send(WireMessage::ResList(vec![id(1), id(2)])).await.unwrap();

            let mut received = Vec::new();
            loop {
                let message = rx.next().await.unwrap().unwrap();
                received.push(message.clone());
                match message {
                    WireMessage::Msg { receiver: Some(r), .. } if r == id(9) => {
                        tx.send(WireMessage::Error(ErrorCode::ReceiverNotFound))
                            .await
                            .unwrap();
                    }
                    WireMessage::ReqRem(who) => {
                        tx.send(WireMessage::join_notice(id(3))).await.unwrap();
                        tx.send(WireMessage::Ok(who)).await.unwrap();
                        break;
                    }
                    _ => {}
                }
            }
            received
        });

        let client = ChatClient::join(client_end, 4096).await.unwrap();
        let input: &[u8] =
            b"list users\nbogus\nsend all \"hi, all\"\nsend to 9 \"x\"\nclose connection\n";
        let mut output = Vec::new();

        client.run(input, &mut output).await.unwrap();

        let received = server.await.unwrap();
        assert_eq!(received.len(), 3);
        assert!(matches!(
            &received[0],
            WireMessage::Msg { author, receiver: None, text } if *author == id(2) && text.ends_with("]hi, all")
        ));
        assert_eq!(received[2], WireMessage::ReqRem(id(2)));

        let printed = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = printed.lines().collect();
        assert_eq!(lines[0], "User 02 joined the group!");
        assert_eq!(lines[1], "01 02");
        assert_eq!(lines[2], "Invalid command");
        assert!(lines[3].ends_with(" -> all hi, all"));
        assert!(printed.contains("Receiver not found\n"));
        assert!(printed.contains("User 03 joined the group!\n"));
        assert_eq!(*lines.last().unwrap(), "User 02 left the group!");
    }

    #[tokio::test]
    async fn test_oversize_message_stays_local() {
        let (client_end, server_end) = duplex(16 * 1024);
        let (mut rx, mut tx) = server_side(server_end);

        let server = tokio::spawn(async move {
            rx.next().await;
            tx.send(WireMessage::ResList(vec![id(1)])).await.unwrap();
            let next = rx.next().await.unwrap().unwrap();
            tx.send(WireMessage::Ok(id(1))).await.unwrap();
            next
        });

        let client = ChatClient::join(client_end, 4096).await.unwrap();
        let input = format!(
            "send all \"{}\"\nlist users\nclose connection\n",
            "x".repeat(5000)
        );
        let mut output = Vec::new();

        client.run(input.as_bytes(), &mut output).await.unwrap();

        // Nothing but the leave request reached the server
        assert_eq!(server.await.unwrap(), WireMessage::ReqRem(id(1)));

        let printed = String::from_utf8(output).unwrap();
        assert_eq!(
            printed.lines().collect::<Vec<_>>(),
            vec![
                "User 01 joined the group!",
                "Message too long",
                "01",
                "User 01 left the group!",
            ]
        );
    }

    #[tokio::test]
    async fn test_input_after_close_is_not_sent() {
        let (client_end, server_end) = duplex(1024);
        let (mut rx, mut tx) = server_side(server_end);

        let server = tokio::spawn(async move {
            rx.next().await;
            tx.send(WireMessage::ResList(vec![id(1)])).await.unwrap();
            let leave = rx.next().await.unwrap().unwrap();
            tx.send(WireMessage::Ok(id(1))).await.unwrap();

            // Everything else the client wrote before hanging up
            let mut rest = Vec::new();
            while let Some(Ok(message)) = rx.next().await {
                rest.push(message);
            }
            (leave, rest)
        });

        let client = ChatClient::join(client_end, 4096).await.unwrap();
        let input: &[u8] = b"close connection\nsend all \"late\"\nclose connection\n";
        let mut output = Vec::new();

        client.run(input, &mut output).await.unwrap();

        let (leave, rest) = server.await.unwrap();
        assert_eq!(leave, WireMessage::ReqRem(id(1)));
        assert!(rest.is_empty(), "unexpected frames after leaving: {:?}", rest);
    }

    #[tokio::test]
    async fn test_end_of_input_leaves() {
        let (client_end, server_end) = duplex(1024);
        let (mut rx, mut tx) = server_side(server_end);

        let server = tokio::spawn(async move {
            rx.next().await;
            tx.send(WireMessage::ResList(vec![id(1)])).await.unwrap();
            let leave = rx.next().await.unwrap().unwrap();
            tx.send(WireMessage::Ok(id(1))).await.unwrap();
            leave
        });

        let client = ChatClient::join(client_end, 4096).await.unwrap();
        let mut output = Vec::new();
        client.run(&b""[..], &mut output).await.unwrap();

        assert_eq!(server.await.unwrap(), WireMessage::ReqRem(id(1)));
    }

    #[tokio::test]
    async fn test_lost_connection_is_error() {
        let (client_end, server_end) = duplex(1024);
        let (mut rx, mut tx) = server_side(server_end);

        let server = tokio::spawn(async move {
            rx.next().await;
            tx.send(WireMessage::ResList(vec![id(1)])).await.unwrap();
            // dropping both halves closes the pipe
        });

        let client = ChatClient::join(client_end, 4096).await.unwrap();
        server.await.unwrap();

        // Input that never ends, so only the event flow can stop the client
        let (input, _keep_open) = duplex(64);
        let input = tokio::io::BufReader::new(input);
        let err = client.run(input, Vec::new()).await.unwrap_err();
        assert!(err.is_disconnect());
    }
}
