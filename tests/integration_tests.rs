//! Integration tests for the maze server over real TCP connections
//!
//! These tests run the full stack (listener, per-connection tasks, session
//! and broadcasts) and talk to it the way a client would.

use rand::rngs::StdRng;
use rand::SeedableRng;
use server::maze::{Maze, MazeConfig};
use server::network::{Server, MAX_LINE_LEN};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_test::assert_ok;

/// Start at (1, 1), door at (3, 1), exit at (1, 3).
const CORRIDOR: [&str; 5] = [
    "1111111",
    "1003001",
    "1111101",
    "1200001",
    "1111111",
];

async fn start_server(maze: Maze) -> SocketAddr {
    let server = assert_ok!(Server::bind("127.0.0.1:0", maze).await);
    let addr = assert_ok!(server.local_addr());
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    addr
}

async fn start_corridor_server() -> SocketAddr {
    start_server(Maze::from_rows(&CORRIDOR).unwrap()).await
}

struct TestClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = assert_ok!(TcpStream::connect(addr).await);
        let (reader, writer) = stream.into_split();
        Self {
            lines: BufReader::new(reader).lines(),
            writer,
        }
    }

    async fn send_raw(&mut self, bytes: &[u8]) {
        assert_ok!(self.writer.write_all(bytes).await);
        assert_ok!(self.writer.flush().await);
    }

    async fn send(&mut self, line: &str) {
        self.send_raw(format!("{}\n", line).as_bytes()).await;
    }

    async fn recv(&mut self) -> String {
        let line = timeout(Duration::from_secs(2), self.lines.next_line())
            .await
            .expect("timed out waiting for a line from the server");
        assert_ok!(line).expect("server closed the connection")
    }

    async fn recv_n(&mut self, n: usize) -> Vec<String> {
        let mut lines = Vec::with_capacity(n);
        for _ in 0..n {
            lines.push(self.recv().await);
        }
        lines
    }

    /// Sends JOIN and consumes the greeting plus the first POS batch.
    async fn join(&mut self, rows: usize, players: usize) -> Vec<String> {
        self.send("JOIN").await;
        self.recv_n(2 + rows + players).await
    }
}

/// JOIN PROTOCOL TESTS
mod join_tests {
    use super::*;

    /// Tests the full greeting sent to a new player
    #[tokio::test]
    async fn join_sequence() {
        let addr = start_corridor_server().await;
        let mut client = TestClient::connect(addr).await;

        let lines = client.join(CORRIDOR.len(), 1).await;

        let mut expected = vec!["WELCOME p1".to_string(), "SPAWN 1 1".to_string()];
        expected.extend(CORRIDOR.iter().map(|row| format!("MAZEROW {}", row)));
        expected.push("POS p1 1 1".to_string());
        assert_eq!(lines, expected);
    }

    /// Tests that a repeated JOIN on the same connection is ignored
    #[tokio::test]
    async fn repeated_join_is_ignored() {
        let addr = start_corridor_server().await;
        let mut client = TestClient::connect(addr).await;
        client.join(CORRIDOR.len(), 1).await;

        client.send("JOIN").await;
        client.send("MOVE RIGHT").await;
        assert_eq!(client.recv().await, "POS p1 2 1");
    }

    /// Tests that a generated maze is streamed row by row
    #[tokio::test]
    async fn generated_maze_rows_are_sent() {
        let config = MazeConfig::default();
        let maze = Maze::generate(&config, &mut StdRng::seed_from_u64(11));
        let rows: Vec<String> = maze
            .grid()
            .iter()
            .map(|row| row.iter().map(|c| c.digit()).collect())
            .collect();
        let addr = start_server(maze).await;

        let mut client = TestClient::connect(addr).await;
        let lines = client.join(rows.len(), 1).await;

        let received: Vec<&str> = lines[2..2 + rows.len()]
            .iter()
            .map(|l| l.strip_prefix("MAZEROW ").unwrap())
            .collect();
        assert_eq!(received, rows);
        assert!(received.iter().all(|r| r.len() == config.cols));
    }
}

/// MOVEMENT TESTS
mod movement_tests {
    use super::*;

    /// Tests that a move into a wall reports the unchanged position and no tiles
    #[tokio::test]
    async fn move_into_wall_keeps_position() {
        let addr = start_corridor_server().await;
        let mut client = TestClient::connect(addr).await;
        client.join(CORRIDOR.len(), 1).await;

        client.send("MOVE UP").await;
        assert_eq!(client.recv().await, "POS p1 1 1");

        client.send("MOVE RIGHT").await;
        assert_eq!(client.recv().await, "POS p1 2 1");
    }

    /// Tests that commands split across writes are reassembled
    #[tokio::test]
    async fn partial_lines_are_buffered() {
        let addr = start_corridor_server().await;
        let mut client = TestClient::connect(addr).await;
        client.join(CORRIDOR.len(), 1).await;

        client.send_raw(b"MO").await;
        sleep(Duration::from_millis(20)).await;
        client.send_raw(b"VE RIGHT\nMOVE LEFT\n").await;

        assert_eq!(client.recv().await, "POS p1 2 1");
        assert_eq!(client.recv().await, "POS p1 1 1");
    }

    /// Tests that malformed lines are ignored without closing the connection
    #[tokio::test]
    async fn malformed_lines_are_ignored() {
        let addr = start_corridor_server().await;
        let mut client = TestClient::connect(addr).await;
        client.join(CORRIDOR.len(), 1).await;

        client.send("MOVE").await;
        client.send("MOVE SIDEWAYS").await;
        client.send("DANCE").await;
        client.send("MOVE RIGHT").await;
        assert_eq!(client.recv().await, "POS p1 2 1");
    }

    /// Tests that a line that is not UTF-8 is skipped like any malformed line
    #[tokio::test]
    async fn invalid_utf8_line_is_ignored() {
        let addr = start_corridor_server().await;
        let mut client = TestClient::connect(addr).await;
        client.join(CORRIDOR.len(), 1).await;

        client.send_raw(b"MOVE \xff\xfe\n").await;
        client.send("MOVE RIGHT").await;
        assert_eq!(client.recv().await, "POS p1 2 1");
    }

    /// Tests that an oversized line is dropped and framing resumes after it
    #[tokio::test]
    async fn oversized_line_is_ignored() {
        let addr = start_corridor_server().await;
        let mut client = TestClient::connect(addr).await;
        client.join(CORRIDOR.len(), 1).await;

        let flood = vec![b'X'; MAX_LINE_LEN * 4];
        client.send_raw(&flood).await;
        client.send_raw(b"\nMOVE RIGHT\n").await;
        assert_eq!(client.recv().await, "POS p1 2 1");
    }
}

/// MULTIPLAYER TESTS
mod multiplayer_tests {
    use super::*;

    /// Tests door activation broadcast and exclusive access
    #[tokio::test]
    async fn door_lease_blocks_second_player() {
        let addr = start_corridor_server().await;
        let mut alice = TestClient::connect(addr).await;
        alice.join(CORRIDOR.len(), 1).await;

        let mut bob = TestClient::connect(addr).await;
        bob.join(CORRIDOR.len(), 2).await;
        assert_eq!(alice.recv_n(2).await, vec!["POS p1 1 1", "POS p2 1 1"]);

        alice.send("MOVE RIGHT").await;
        let expected = vec!["POS p1 2 1", "POS p2 1 1"];
        assert_eq!(alice.recv_n(2).await, expected);
        assert_eq!(bob.recv_n(2).await, expected);

        alice.send("MOVE RIGHT").await;
        let activation = vec![
            "TILE 3 1 4",
            "TILE 2 1 4",
            "TILE 4 1 4",
            "TILE 1 1 4",
            "TILE 5 1 4",
            "POS p1 3 1",
            "POS p2 1 1",
        ];
        assert_eq!(alice.recv_n(7).await, activation);
        assert_eq!(bob.recv_n(7).await, activation);

        bob.send("MOVE RIGHT").await;
        assert_eq!(bob.recv_n(2).await, vec!["POS p1 3 1", "POS p2 2 1"]);

        bob.send("MOVE RIGHT").await;
        assert_eq!(bob.recv_n(2).await, vec!["POS p1 3 1", "POS p2 2 1"]);
    }

    /// Tests that closing a connection informs the remaining players
    #[tokio::test]
    async fn disconnect_informs_survivors() {
        let addr = start_corridor_server().await;
        let mut alice = TestClient::connect(addr).await;
        alice.join(CORRIDOR.len(), 1).await;

        let mut bob = TestClient::connect(addr).await;
        bob.join(CORRIDOR.len(), 2).await;
        alice.recv_n(2).await;

        drop(bob);
        assert_eq!(alice.recv().await, "POS p1 1 1");

        let mut carol = TestClient::connect(addr).await;
        let lines = carol.join(CORRIDOR.len(), 2).await;
        assert_eq!(lines[0], "WELCOME p3");
        assert_eq!(&lines[lines.len() - 2..], &["POS p1 1 1", "POS p3 1 1"]);
    }
}
