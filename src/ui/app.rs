use eframe::egui;
use tokio::sync::mpsc;

use crate::client::ChatClient;
use crate::common::{InboundEvent, OutboundEvent};

use super::components::{chat_area, input_bar};
use super::state::ChatWindow;

type UiChatClient = ChatClient<mpsc::Sender<OutboundEvent>, String, Vec<String>, ChatWindow>;

pub struct ChatApp {
    client: UiChatClient,
    event_receiver: mpsc::Receiver<InboundEvent>,
}

impl ChatApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        command_sender: mpsc::Sender<OutboundEvent>,
        event_receiver: mpsc::Receiver<InboundEvent>,
    ) -> Self {
        Self::with_channels(command_sender, event_receiver)
    }

    fn with_channels(
        command_sender: mpsc::Sender<OutboundEvent>,
        event_receiver: mpsc::Receiver<InboundEvent>,
    ) -> Self {
        Self {
            client: ChatClient::new(
                command_sender,
                String::new(),
                Vec::new(),
                Some(ChatWindow::default()),
            ),
            event_receiver,
        }
    }

    fn handle_network_events(&mut self) {
        while let Ok(event) = self.event_receiver.try_recv() {
            self.client.handle_event(event);
        }
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_network_events();

        egui::TopBottomPanel::bottom("message-form").show(ctx, |ui| {
            ui.add_space(4.0);
            if input_bar::render(ui, self.client.input_mut()) {
                self.client.submit();
            }
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Socket Chat");
            ui.separator();
            let (messages, chat_window) = self.client.view_mut();
            chat_area::render(ui, messages, chat_window);
        });

        ctx.request_repaint();
    }
}
