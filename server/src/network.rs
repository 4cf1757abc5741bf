//! Server network layer handling TCP connections and line framing

use crate::maze::Maze;
use crate::session::Session;
use log::{debug, error, info, warn};
use shared::{ClientMessage, PlayerId};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};

/// Accepts players and runs one task per connection against a shared session
pub struct Server {
    listener: TcpListener,
    session: Arc<Mutex<Session>>,
}

impl Server {
    pub async fn bind(addr: &str, maze: Maze) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Server {
            listener,
            session: Arc::new(Mutex::new(Session::new(maze))),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Box<dyn std::error::Error>> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle to the shared session, mainly for inspection in tests.
    pub fn session(&self) -> Arc<Mutex<Session>> {
        Arc::clone(&self.session)
    }

    /// Accept loop; runs until the task is dropped.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Server started successfully");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    debug!("Accepted connection from {}", addr);
                    let session = Arc::clone(&self.session);
                    tokio::spawn(handle_connection(stream, addr, session));
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }
}

/// Longest accepted command line in bytes, terminator excluded.
pub const MAX_LINE_LEN: usize = 4096;

/// Outcome of reading one `\n`-terminated frame
#[derive(Debug, PartialEq, Eq)]
enum Frame {
    /// A complete line is in the buffer, terminator stripped
    Line,
    /// The line exceeded [`MAX_LINE_LEN`] and was skipped up to its terminator
    Oversized,
    /// The peer closed; an unterminated tail is dropped
    Eof,
}

/// Reads the next frame into `buf` without ever holding much more than
/// [`MAX_LINE_LEN`] bytes of it, whatever the peer sends.
async fn read_frame<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Frame>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let mut discarding = false;

    loop {
        let (terminated, used) = {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(Frame::Eof);
            }
            let (chunk, terminated, used) = match available.iter().position(|&b| b == b'\n') {
                Some(i) => (&available[..i], true, i + 1),
                None => (available, false, available.len()),
            };
            if !discarding {
                buf.extend_from_slice(chunk);
            }
            (terminated, used)
        };
        reader.consume(used);

        if !discarding && buf.len() > MAX_LINE_LEN {
            buf.clear();
            discarding = true;
        }
        if terminated {
            if discarding {
                return Ok(Frame::Oversized);
            }
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
            return Ok(Frame::Line);
        }
    }
}

/// Reads protocol lines from one peer until it goes away.
///
/// Outbound lines travel through a bounded channel to a dedicated writer
/// task, so a slow peer never stalls whoever is holding the session lock.
/// Lines that are oversized, not UTF-8 or not a known command are skipped;
/// only EOF or a read error ends the connection.
async fn handle_connection(stream: TcpStream, addr: SocketAddr, session: Arc<Mutex<Session>>) {
    let (reader, writer) = stream.into_split();
    let capacity = session.lock().await.outbox_capacity();
    let (tx, rx) = mpsc::channel(capacity);
    tokio::spawn(write_lines(writer, rx, addr));

    let mut outbox = Some(tx);
    let mut player: Option<PlayerId> = None;
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        match read_frame(&mut reader, &mut buf).await {
            Ok(Frame::Line) => {
                let Ok(line) = std::str::from_utf8(&buf) else {
                    debug!("Ignoring non UTF-8 line from {}", addr);
                    continue;
                };
                match ClientMessage::parse(line) {
                    Some(ClientMessage::Join) => match (player, outbox.take()) {
                        (None, Some(tx)) => {
                            let id = session.lock().await.join(addr, tx);
                            player = Some(id);
                        }
                        _ => debug!("Ignoring repeated JOIN from {}", addr),
                    },
                    Some(ClientMessage::Move(direction)) => match player {
                        Some(id) => {
                            session
                                .lock()
                                .await
                                .handle_move(id, direction, Instant::now());
                        }
                        None => debug!("Ignoring MOVE before JOIN from {}", addr),
                    },
                    None => debug!("Ignoring malformed line from {}: {:?}", addr, line),
                }
            }
            Ok(Frame::Oversized) => {
                debug!("Ignoring line over {} bytes from {}", MAX_LINE_LEN, addr);
            }
            Ok(Frame::Eof) => {
                debug!("Connection from {} closed", addr);
                break;
            }
            Err(e) => {
                warn!("Error reading from {}: {}", addr, e);
                break;
            }
        }
    }

    if let Some(id) = player {
        session.lock().await.disconnect(id);
    }
}

/// Drains the outbox onto the socket. Exiting drops the receiver, which makes
/// later sends to this connection fail.
async fn write_lines(
    mut writer: OwnedWriteHalf,
    mut rx: mpsc::Receiver<String>,
    addr: SocketAddr,
) {
    while let Some(line) = rx.recv().await {
        let mut bytes = line.into_bytes();
        bytes.push(b'\n');
        if let Err(e) = writer.write_all(&bytes).await {
            warn!("Failed to write to {}: {}", addr, e);
            break;
        }
    }
}
