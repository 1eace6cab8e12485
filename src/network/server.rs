use std::error::Error;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use uuid::Uuid;

use crate::common::{ChatMessage, ClientFrame, ServerFrame, UserMessage};
use crate::storage::{AuditAction, AuditEntry, AuditLog};

/// Display name for connections that did not pass `?username=`.
pub const UNKNOWN_USERNAME: &str = "UnknownUser";

const BROADCAST_CAPACITY: usize = 256;
const AUDIT_PREVIEW_CHARS: usize = 50;
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);
const HEALTH_RESPONSE: &[u8] =
    b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 2\r\nConnection: close\r\n\r\nOK";

/// Fans every chat event out to all connected sockets.
pub struct RelayServer {
    listener: TcpListener,
    frames: broadcast::Sender<ServerFrame>,
    audit: AuditLog,
}

impl RelayServer {
    pub async fn bind(addr: &str, audit: AuditLog) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let (frames, _) = broadcast::channel(BROADCAST_CAPACITY);
        Ok(Self {
            listener,
            frames,
            audit,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn run(self) -> Result<(), Box<dyn Error + Send + Sync>> {
        log::info!("Relay server listening on {}", self.local_addr()?);

        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    log::warn!("Failed to accept connection: {err}");
                    tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                    continue;
                }
            };
            let session = Session {
                id: Uuid::new_v4(),
                peer,
                frames: self.frames.clone(),
                audit: self.audit.clone(),
            };
            tokio::spawn(async move {
                if let Err(err) = session.serve(stream).await {
                    log::warn!("Connection from {peer} ended with error: {err}");
                }
            });
        }
    }
}

struct Session {
    id: Uuid,
    peer: SocketAddr,
    frames: broadcast::Sender<ServerFrame>,
    audit: AuditLog,
}

impl Session {
    async fn serve(self, mut stream: TcpStream) -> Result<(), Box<dyn Error + Send + Sync>> {
        if is_health_check(&stream).await? {
            answer_health_check(&mut stream).await?;
            return Ok(());
        }

        let mut username = None;
        let ws_stream = accept_hdr_async(
            stream,
            |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
                username = username_from_query(request.uri().query());
                Ok(response)
            },
        )
        .await?;
        let username = username.unwrap_or_else(|| UNKNOWN_USERNAME.to_string());

        // Đăng ký trước khi phát thông báo để chính người mới cũng nhận được
        let mut updates = self.frames.subscribe();
        self.audit.record(AuditEntry::new(
            AuditAction::SocketConnect,
            &username,
            Some(self.peer),
            format!("User '{username}' connected via WebSocket."),
        ));
        log::info!("Client connected: {}, User: {username}", self.id);
        let _ = self
            .frames
            .send(ServerFrame::notice(format!("{username} has joined the chat.")));

        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                incoming = read.next() => {
                    match incoming {
                        Some(Ok(Message::Text(raw))) => self.handle_client_frame(&username, &raw),
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(err)) => {
                            log::warn!("Read error on session {}: {err}", self.id);
                            break;
                        }
                    }
                }
                outgoing = updates.recv() => {
                    match outgoing {
                        Ok(frame) => match frame.encode() {
                            Ok(raw) => {
                                if let Err(err) = write.send(Message::Text(raw)).await {
                                    log::warn!("Write error on session {}: {err}", self.id);
                                    break;
                                }
                            }
                            Err(err) => log::warn!("Failed to serialize frame: {err}"),
                        },
                        Err(RecvError::Lagged(skipped)) => {
                            log::warn!("Session {} lagged, skipped {skipped} frames", self.id);
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        }

        drop(updates);
        self.audit.record(AuditEntry::new(
            AuditAction::SocketDisconnect,
            &username,
            Some(self.peer),
            format!("User '{username}' disconnected from WebSocket."),
        ));
        log::info!("Client disconnected: {}, User: {username}", self.id);
        let _ = self
            .frames
            .send(ServerFrame::notice(format!("{username} has left the chat.")));

        Ok(())
    }

    fn handle_client_frame(&self, username: &str, raw: &str) {
        let text = match ClientFrame::decode(raw) {
            Ok(ClientFrame::UserMessage(UserMessage { text })) => text,
            Err(err) => {
                log::warn!("Dropping frame from session {}: {err}", self.id);
                return;
            }
        };

        if text.is_empty() {
            return;
        }

        let preview: String = text.chars().take(AUDIT_PREVIEW_CHARS).collect();
        self.audit.record(AuditEntry::new(
            AuditAction::MessageSent,
            username,
            Some(self.peer),
            format!("User '{username}' sent message: {preview}"),
        ));
        let _ = self
            .frames
            .send(ServerFrame::NewChatMessage(ChatMessage::new(username, text)));
    }
}

/// Peeks at the request head: a plain `GET /health` without an upgrade.
async fn is_health_check(stream: &TcpStream) -> io::Result<bool> {
    let mut peek_buf = [0u8; 512];
    let peeked = stream.peek(&mut peek_buf).await?;
    let head = String::from_utf8_lossy(&peek_buf[..peeked]);

    let mut request_line = head.lines().next().unwrap_or("").split_whitespace();
    let is_get = request_line.next() == Some("GET");
    let path = request_line.next().unwrap_or("");
    let path = path.split('?').next().unwrap_or("");
    let wants_upgrade = head.to_ascii_lowercase().contains("upgrade: websocket");

    Ok(is_get && path == "/health" && !wants_upgrade)
}

async fn answer_health_check(stream: &mut TcpStream) -> io::Result<()> {
    // Đọc hết phần request đã peek trước khi trả lời rồi đóng kết nối
    let mut request_buf = [0u8; 512];
    let _ = stream.read(&mut request_buf).await?;
    stream.write_all(HEALTH_RESPONSE).await?;
    stream.shutdown().await
}

fn username_from_query(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == "username")
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ServerNotice;
    use crate::network::client::connection_url;
    use tokio::sync::mpsc;
    use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

    type TestSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

    async fn start_server() -> (SocketAddr, mpsc::UnboundedReceiver<AuditEntry>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let server = RelayServer::bind("127.0.0.1:0", AuditLog::new(sender))
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.run());
        (addr, receiver)
    }

    async fn join(addr: SocketAddr, username: &str) -> TestSocket {
        let url = connection_url(&format!("ws://{addr}/ws"), username).unwrap();
        let (socket, _) = connect_async(url.as_str()).await.unwrap();
        socket
    }

    async fn next_frame(socket: &mut TestSocket) -> ServerFrame {
        loop {
            match socket.next().await {
                Some(Ok(Message::Text(raw))) => return ServerFrame::decode(&raw).unwrap(),
                Some(Ok(_)) => continue,
                other => panic!("socket ended: {other:?}"),
            }
        }
    }

    async fn say(socket: &mut TestSocket, text: &str) {
        let frame = ClientFrame::UserMessage(UserMessage {
            text: text.to_string(),
        });
        socket
            .send(Message::Text(frame.encode().unwrap()))
            .await
            .unwrap();
    }

    fn notice(text: &str) -> ServerFrame {
        ServerFrame::ServerMessage(ServerNotice {
            text: text.to_string(),
        })
    }

    #[test]
    fn username_query_parsing() {
        assert_eq!(
            username_from_query(Some("username=ann+lee")),
            Some("ann lee".to_string())
        );
        assert_eq!(username_from_query(Some("username=")), None);
        assert_eq!(username_from_query(Some("room=1")), None);
        assert_eq!(username_from_query(None), None);
    }

    #[tokio::test]
    async fn broadcasts_join_messages_and_leave() {
        let (addr, mut audit) = start_server().await;

        let mut ann = join(addr, "ann").await;
        assert_eq!(next_frame(&mut ann).await, notice("ann has joined the chat."));

        let mut bob = join(addr, "bob").await;
        assert_eq!(next_frame(&mut bob).await, notice("bob has joined the chat."));
        assert_eq!(next_frame(&mut ann).await, notice("bob has joined the chat."));

        say(&mut bob, "hello").await;
        let expected = ServerFrame::NewChatMessage(ChatMessage::new("bob", "hello"));
        assert_eq!(next_frame(&mut bob).await, expected);
        assert_eq!(next_frame(&mut ann).await, expected);

        bob.close(None).await.unwrap();
        assert_eq!(next_frame(&mut ann).await, notice("bob has left the chat."));

        let mut actions = Vec::new();
        while actions.len() < 4 {
            actions.push(audit.recv().await.unwrap().action);
        }
        assert_eq!(
            actions,
            vec![
                AuditAction::SocketConnect,
                AuditAction::SocketConnect,
                AuditAction::MessageSent,
                AuditAction::SocketDisconnect,
            ]
        );
    }

    #[tokio::test]
    async fn ignores_empty_and_malformed_frames() {
        let (addr, _audit) = start_server().await;

        let mut ann = join(addr, "ann").await;
        assert_eq!(next_frame(&mut ann).await, notice("ann has joined the chat."));

        say(&mut ann, "").await;
        ann.send(Message::Text("{\"event\":\"user_message\"}".to_string()))
            .await
            .unwrap();
        ann.send(Message::Ping(vec![1])).await.unwrap();
        say(&mut ann, "after").await;

        assert_eq!(
            next_frame(&mut ann).await,
            ServerFrame::NewChatMessage(ChatMessage::new("ann", "after"))
        );
    }

    async fn get_health(addr: SocketAddr) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn health_endpoint_answers_ok() {
        let (addr, _audit) = start_server().await;

        let response = get_health(addr).await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.ends_with("\r\n\r\nOK"));
    }

    #[tokio::test]
    async fn keeps_serving_after_failed_connections() {
        let (addr, mut audit) = start_server().await;

        // Kết nối không hoàn tất handshake, và một request HTTP không phải WebSocket
        drop(TcpStream::connect(addr).await.unwrap());
        let mut stray = TcpStream::connect(addr).await.unwrap();
        stray
            .write_all(b"GET /ws HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        let mut discarded = Vec::new();
        let _ = stray.read_to_end(&mut discarded).await;

        assert!(get_health(addr).await.starts_with("HTTP/1.1 200 OK"));
        let mut ann = join(addr, "ann").await;
        assert_eq!(next_frame(&mut ann).await, notice("ann has joined the chat."));
        assert_eq!(audit.recv().await.unwrap().action, AuditAction::SocketConnect);
    }

    #[tokio::test]
    async fn anonymous_connections_get_placeholder_name() {
        let (addr, _audit) = start_server().await;

        let (mut socket, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
        assert_eq!(
            next_frame(&mut socket).await,
            notice("UnknownUser has joined the chat.")
        );
    }
}
