use crate::common::{ChatMessage, InboundEvent, OutboundEvent};

use super::ports::{Channel, InputField, MessageList, ScrollContainer};

/// Binds one messaging channel to one input/list pair.
///
/// All UI handles are injected at construction; the chat window is optional
/// and auto-scrolling is skipped when it is absent.
pub struct ChatClient<C, I, L, S> {
    channel: C,
    input: I,
    messages: L,
    chat_window: Option<S>,
}

impl<C, I, L, S> ChatClient<C, I, L, S>
where
    C: Channel,
    I: InputField,
    L: MessageList,
    S: ScrollContainer,
{
    pub fn new(channel: C, input: I, messages: L, chat_window: Option<S>) -> Self {
        Self {
            channel,
            input,
            messages,
            chat_window,
        }
    }

    pub fn handle_event(&mut self, event: InboundEvent) {
        match &event {
            InboundEvent::Connected => log::info!("Connected to server"),
            InboundEvent::Disconnected => log::info!("Disconnected from server"),
            _ => {}
        }

        if let Some(message) = event.into_message() {
            self.add_message(&message);
        }
    }

    /// Sends the current input as a `user_message` and clears the field.
    ///
    /// Returns `false` without touching anything when the input is empty.
    pub fn submit(&mut self) -> bool {
        if self.input.value().is_empty() {
            return false;
        }

        let text = self.input.value().to_string();
        if let Err(err) = self.channel.emit(OutboundEvent::UserMessage { text }) {
            log::warn!("Failed to send command to network: {err}");
        }
        self.input.clear();
        true
    }

    pub fn add_message(&mut self, message: &ChatMessage) {
        self.messages.append(message.to_string());

        // Cuộn xuống cuối khung chat
        if let Some(chat_window) = self.chat_window.as_mut() {
            let bottom = chat_window.scroll_height();
            chat_window.set_scroll_top(bottom);
        }
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn messages(&self) -> &L {
        &self.messages
    }

    pub fn chat_window(&self) -> Option<&S> {
        self.chat_window.as_ref()
    }

    /// Borrows the list and the chat window together for rendering.
    pub fn view_mut(&mut self) -> (&L, Option<&mut S>) {
        (&self.messages, self.chat_window.as_mut())
    }
}
