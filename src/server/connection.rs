//! Per-connection task
//!
//! Owns one client stream from accept to close. Drives the
//! [`ConnectionState`] machine, writes its own socket, and reaches other
//! participants only through the registry.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::time::Instant;
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::error::{Error, ProtocolError, Result};
use crate::protocol::{ChatCodec, ErrorCode, ParticipantId, WireMessage};
use crate::registry::{Admission, Outbound, Session, SessionRegistry};
use crate::server::config::ServerConfig;
use crate::session::{Action, ConnectionState};

/// How an admitted session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    /// Client asked to leave and was removed
    Left,
    /// Client closed the stream
    PeerClosed,
    /// Close requested through the registry
    Shutdown,
}

enum Flow {
    Continue,
    Leave,
}

/// One client connection
pub struct Connection<S> {
    peer: String,
    reader: FramedRead<ReadHalf<S>, ChatCodec>,
    writer: FramedWrite<WriteHalf<S>, ChatCodec>,
    registry: Arc<SessionRegistry>,
    config: ServerConfig,
    state: ConnectionState,
    /// Join notice went out, so a leave notice is owed
    announced: bool,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite,
{
    /// Create a connection handler for an accepted stream
    pub fn new(
        stream: S,
        peer: impl Into<String>,
        registry: Arc<SessionRegistry>,
        config: ServerConfig,
    ) -> Self {
        let (rd, wr) = tokio::io::split(stream);
        let codec = ChatCodec::with_max_frame_size(config.max_frame_size);

        Self {
            peer: peer.into(),
            reader: FramedRead::new(rd, codec.clone()),
            writer: FramedWrite::new(wr, codec),
            registry,
            config,
            state: ConnectionState::new(),
            announced: false,
        }
    }

    /// Run the connection to completion
    ///
    /// Returns `Ok` for a clean leave, a refused admission, or the peer
    /// hanging up before or after joining; `Err` for protocol violations,
    /// idle timeouts and transport failures. Either way the session is out
    /// of the registry and the stream is closed when this returns.
    pub async fn run(mut self) -> Result<()> {
        let result = self.run_inner().await;
        self.state.terminate();

        if let Err(e) = self.writer.close().await {
            tracing::debug!(peer = %self.peer, error = %e, "Error closing stream");
        }
        result
    }

    async fn run_inner(&mut self) -> Result<()> {
        let first = match self.read_message(self.idle_deadline()).await? {
            Some(message) => message,
            None => {
                tracing::debug!(peer = %self.peer, "Closed before joining");
                return Ok(());
            }
        };

        match self.state.on_message(first) {
            Action::Admit => {}
            Action::Violation(reason) => {
                tracing::warn!(peer = %self.peer, reason = %reason, "Protocol violation");
                return Err(ProtocolError::UnexpectedMessage(reason).into());
            }
            other => {
                return Err(ProtocolError::UnexpectedMessage(format!("{:?}", other)).into());
            }
        }

        let Admission {
            session,
            mut outbound,
            roster,
        } = match self.registry.admit().await {
            Ok(admission) => admission,
            Err(e) => {
                tracing::info!(peer = %self.peer, error = %e, "Admission refused");
                self.writer.send(WireMessage::Error(e.error_code())).await?;
                return Ok(());
            }
        };

        let id = session.id();
        self.state.activate(id);

        let outcome = self.serve(&session, &mut outbound, roster).await;
        self.finish(&session, &outcome).await;

        match outcome {
            Ok(exit) => {
                tracing::debug!(session_id = %id, peer = %self.peer, exit = ?exit, "Session ended");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Roster, join notice, then the active loop
    async fn serve(
        &mut self,
        session: &Session,
        outbound: &mut Outbound,
        roster: Vec<ParticipantId>,
    ) -> Result<Exit> {
        let id = session.id();

        self.writer.send(WireMessage::ResList(roster)).await?;
        session.activate();
        self.registry
            .broadcast(&WireMessage::join_notice(id), id)
            .await;
        self.announced = true;

        let mut phase = session.watch_phase();
        let mut deadline = self.idle_deadline();

        loop {
            if session.is_closing() {
                return Ok(Exit::Shutdown);
            }

            tokio::select! {
                biased;

                changed = phase.changed() => {
                    if changed.is_err() || session.is_closing() {
                        return Ok(Exit::Shutdown);
                    }
                }

                Some(queued) = outbound.recv() => {
                    self.writer.send(queued).await?;
                }

                next = read_with_deadline(&mut self.reader, deadline) => {
                    let message = match next? {
                        Some(message) => message,
                        None => return Ok(Exit::PeerClosed),
                    };
                    deadline = self.idle_deadline();

                    if let Flow::Leave = self.dispatch(session, message).await? {
                        return Ok(Exit::Left);
                    }
                }
            }
        }
    }

    async fn dispatch(&mut self, session: &Session, message: WireMessage) -> Result<Flow> {
        let id = session.id();
        tracing::debug!(session_id = %id, message = message.name(), "Dispatch");

        match self.state.on_message(message) {
            Action::Route {
                receiver: None,
                message,
            } => {
                self.registry.broadcast(&message, id).await;
            }
            Action::Route {
                receiver: Some(to),
                message,
            } => {
                if self.registry.send_to(to, message).await.is_none() {
                    tracing::debug!(session_id = %id, receiver = %to, "Receiver not found");
                    self.writer
                        .send(WireMessage::Error(ErrorCode::ReceiverNotFound))
                        .await?;
                }
            }
            Action::Reply(reply) => {
                self.writer.send(reply).await?;
            }
            Action::SendRoster => {
                let roster = self.registry.snapshot().await;
                self.writer.send(WireMessage::ResList(roster)).await?;
            }
            Action::Leave => return self.leave(id).await,
            Action::Violation(reason) => {
                tracing::warn!(session_id = %id, reason = %reason, "Protocol violation");
                return Err(ProtocolError::UnexpectedMessage(reason).into());
            }
            Action::Admit => {
                return Err(ProtocolError::UnexpectedMessage("REQ_ADD after admission".into()).into());
            }
        }

        Ok(Flow::Continue)
    }

    /// Drop out of the registry, acknowledge, then tell everyone else
    ///
    /// Removal comes first so nobody who sees the leave notice can still
    /// find the session.
    async fn leave(&mut self, id: ParticipantId) -> Result<Flow> {
        if self.registry.remove(id).await.is_none() {
            self.writer
                .send(WireMessage::Error(ErrorCode::SenderNotFound))
                .await?;
            return Ok(Flow::Continue);
        }

        self.registry.broadcast(&WireMessage::ReqRem(id), id).await;
        self.writer.send(WireMessage::Ok(id)).await?;

        Ok(Flow::Leave)
    }

    /// Cleanup shared by every exit path except a completed leave
    async fn finish(&mut self, session: &Session, outcome: &Result<Exit>) {
        let id = session.id();
        session.mark_terminated();

        if matches!(outcome, Ok(Exit::Left)) {
            return;
        }

        if let Err(e) = outcome {
            if e.is_disconnect() {
                tracing::debug!(session_id = %id, error = %e, "Peer disconnected");
            } else {
                tracing::warn!(session_id = %id, error = %e, "Session failed");
            }
        }

        if self.registry.remove(id).await.is_some() && self.announced {
            self.registry.broadcast(&WireMessage::ReqRem(id), id).await;
        }
    }

    async fn read_message(&mut self, deadline: Option<Instant>) -> Result<Option<WireMessage>> {
        read_with_deadline(&mut self.reader, deadline).await
    }

    fn idle_deadline(&self) -> Option<Instant> {
        self.config.idle_timeout.map(|t| Instant::now() + t)
    }
}

/// Next message, `None` on clean end of stream
async fn read_with_deadline<R>(
    reader: &mut FramedRead<R, ChatCodec>,
    deadline: Option<Instant>,
) -> Result<Option<WireMessage>>
where
    R: AsyncRead + Unpin,
{
    let next = match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, reader.next())
            .await
            .map_err(|_| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "idle timeout",
                ))
            })?,
        None => reader.next().await,
    };
    next.transpose()
}
