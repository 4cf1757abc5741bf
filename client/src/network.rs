//! Client connection to the maze server and the interactive command loop

use crate::game::ClientGameState;
use crate::input::{parse_command, Command, HELP};
use crate::rendering::{render, win_banner};
use log::{debug, info, warn};
use shared::{ClientMessage, ServerMessage};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use std::time::Instant;
use tokio::net::TcpStream;

/// Console client speaking the line protocol over one TCP connection
pub struct Client {
    reader: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
    game_state: ClientGameState,
    joined_at: Option<Instant>,
    won: bool,
}

impl Client {
    pub async fn connect(server_addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let stream = TcpStream::connect(server_addr).await?;
        info!("Connected to {}", server_addr);

        let (reader, writer) = stream.into_split();
        Ok(Client {
            reader: BufReader::new(reader).lines(),
            writer,
            game_state: ClientGameState::new(),
            joined_at: None,
            won: false,
        })
    }

    async fn send(&mut self, message: ClientMessage) -> Result<(), Box<dyn std::error::Error>> {
        let line = format!("{}\n", message);
        self.writer.write_all(line.as_bytes()).await?;
        Ok(())
    }

    fn handle_line(&mut self, line: &str) {
        let Some(message) = ServerMessage::parse(line) else {
            warn!("Unexpected line from server: {:?}", line);
            return;
        };
        debug!("From server: {}", line);

        if let ServerMessage::Welcome(id) = &message {
            println!("My player id: {}", id);
            self.joined_at = Some(Instant::now());
        }

        if self.game_state.apply(message) {
            println!("{}", render(&self.game_state));
        }

        if self.game_state.has_won() && !self.won {
            let elapsed = self.joined_at.map(|t| t.elapsed()).unwrap_or_default();
            println!("{}", win_banner(elapsed));
            info!("Reached the exit after {:.2}s", elapsed.as_secs_f64());
            self.won = true;
        }
    }

    /// Joins, then relays typed commands and prints server updates until the
    /// user quits or either side closes.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.send(ClientMessage::Join).await?;
        println!("{}", HELP);

        let mut stdin = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                line = self.reader.next_line() => match line? {
                    Some(line) => self.handle_line(&line),
                    None => {
                        info!("Server closed connection");
                        break;
                    }
                },
                typed = stdin.next_line() => match typed? {
                    Some(typed) => match parse_command(&typed) {
                        Some(Command::Send(message)) => self.send(message).await?,
                        Some(Command::Quit) => break,
                        None => println!("{}", HELP),
                    },
                    None => break,
                },
            }
        }

        info!("Client closed");
        Ok(())
    }
}
