use std::error::Error;

use futures::{Sink, SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_tungstenite::tungstenite::{self, Message};
use url::Url;

use crate::common::{ClientFrame, InboundEvent, OutboundEvent, ServerFrame};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Owns the socket to the chat server and bridges it to the UI queues.
pub struct WsClient {
    server_url: String,
    username: String,
    event_sender: mpsc::Sender<InboundEvent>,
    command_receiver: mpsc::Receiver<OutboundEvent>,
}

impl WsClient {
    pub fn new(
        event_sender: mpsc::Sender<InboundEvent>,
        command_receiver: mpsc::Receiver<OutboundEvent>,
        server_url: String,
        username: String,
    ) -> Self {
        Self {
            server_url,
            username,
            event_sender,
            command_receiver,
        }
    }

    /// Runs until the socket closes or the UI drops its command sender.
    ///
    /// A `Disconnected` event is always delivered before returning, including
    /// when the initial connection attempt fails.
    pub async fn run(mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let ws_stream = match self.connect().await {
            Ok(ws_stream) => ws_stream,
            Err(err) => {
                self.notify(InboundEvent::Disconnected).await;
                return Err(err);
            }
        };

        log::info!("Connected to {} as {}", self.server_url, self.username);
        self.notify(InboundEvent::Connected).await;

        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                command = self.command_receiver.recv() => {
                    if let Some(command) = command {
                        if !self.handle_command(command, &mut write).await {
                            break;
                        }
                    } else {
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    }
                }
                frame = read.next() => {
                    match frame {
                        Some(Ok(message)) => {
                            if !self.handle_frame(message).await {
                                break;
                            }
                        }
                        Some(Err(err)) => {
                            log::warn!("WebSocket read error: {err}");
                            break;
                        }
                        None => break,
                    }
                }
            }
        }

        self.notify(InboundEvent::Disconnected).await;
        Ok(())
    }

    async fn connect(&self) -> Result<WsStream, Box<dyn Error + Send + Sync>> {
        let url = connection_url(&self.server_url, &self.username)?;
        let (ws_stream, _) = connect_async(url.as_str()).await?;
        Ok(ws_stream)
    }

    async fn handle_command<W>(&mut self, command: OutboundEvent, write: &mut W) -> bool
    where
        W: Sink<Message, Error = tungstenite::Error> + Unpin,
    {
        let frame = ClientFrame::from(command);
        match frame.encode() {
            Ok(raw) => {
                if let Err(err) = write.send(Message::Text(raw)).await {
                    log::warn!("Failed to send frame: {err}");
                    return false;
                }
            }
            Err(err) => log::warn!("Failed to serialize message: {err}"),
        }
        true
    }

    /// Pings are answered by tungstenite itself.
    async fn handle_frame(&mut self, message: Message) -> bool {
        match message {
            Message::Text(raw) => match ServerFrame::decode(&raw) {
                Ok(frame) => self.notify(frame.into()).await,
                Err(err) => log::warn!("Dropping inbound frame: {err}"),
            },
            Message::Close(_) => {
                log::info!("Server closed the connection");
                return false;
            }
            _ => {}
        }
        true
    }

    async fn notify(&self, event: InboundEvent) {
        if let Err(err) = self.event_sender.send(event).await {
            log::warn!("Failed to notify UI: {err:?}");
        }
    }
}

/// Appends the display name as the `username` query parameter.
pub fn connection_url(server_url: &str, username: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(server_url)?;
    url.query_pairs_mut().append_pair("username", username);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{ChatMessage, UserMessage};
    use tokio::net::TcpListener;

    #[test]
    fn connection_url_carries_username() {
        let url = connection_url("ws://127.0.0.1:8080/ws", "ann lee").unwrap();
        assert_eq!(url.as_str(), "ws://127.0.0.1:8080/ws?username=ann+lee");
    }

    #[test]
    fn connection_url_rejects_garbage() {
        assert!(connection_url("not a url", "ann").is_err());
    }

    #[tokio::test]
    async fn bridges_socket_and_queues() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

            ws.send(Message::Ping(vec![7])).await.unwrap();
            let malformed = r#"{"event":"new_chat_message","data":{"text":"no name"}}"#;
            ws.send(Message::Text(malformed.to_string())).await.unwrap();
            let frame = ServerFrame::NewChatMessage(ChatMessage::new("bob", "hey"));
            ws.send(Message::Text(frame.encode().unwrap())).await.unwrap();

            let reply = loop {
                match ws.next().await {
                    Some(Ok(Message::Text(raw))) => break raw,
                    Some(Ok(_)) => continue,
                    other => panic!("unexpected frame: {other:?}"),
                }
            };
            ws.close(None).await.unwrap();
            reply
        });

        let (event_tx, mut event_rx) = mpsc::channel(16);
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let client = WsClient::new(
            event_tx,
            cmd_rx,
            format!("ws://{addr}/ws"),
            "alice".to_string(),
        );
        let task = tokio::spawn(client.run());

        assert_eq!(event_rx.recv().await, Some(InboundEvent::Connected));
        assert_eq!(
            event_rx.recv().await,
            Some(InboundEvent::NewChatMessage(ChatMessage::new("bob", "hey")))
        );

        cmd_tx
            .send(OutboundEvent::UserMessage {
                text: "hi".to_string(),
            })
            .await
            .unwrap();

        let reply = server.await.unwrap();
        assert_eq!(
            ClientFrame::decode(&reply).unwrap(),
            ClientFrame::UserMessage(UserMessage {
                text: "hi".to_string()
            })
        );

        assert_eq!(event_rx.recv().await, Some(InboundEvent::Disconnected));
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn refused_connection_reports_disconnect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (event_tx, mut event_rx) = mpsc::channel(4);
        let (_cmd_tx, cmd_rx) = mpsc::channel(4);
        let client = WsClient::new(
            event_tx,
            cmd_rx,
            format!("ws://{addr}/ws"),
            "alice".to_string(),
        );

        assert!(client.run().await.is_err());
        assert_eq!(event_rx.recv().await, Some(InboundEvent::Disconnected));
    }
}
