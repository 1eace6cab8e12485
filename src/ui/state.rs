use crate::client::ScrollContainer;

/// Scroll state of the chat window between frames.
///
/// egui lays the list out during the next frame, so a scroll request is
/// recorded here and applied by the chat area when it renders.
#[derive(Debug, Default)]
pub struct ChatWindow {
    content_height: f32,
    follow_bottom: bool,
}

impl ChatWindow {
    /// Whether the next frame should stick to the end of the list.
    pub fn take_follow_bottom(&mut self) -> bool {
        std::mem::take(&mut self.follow_bottom)
    }

    pub fn set_content_height(&mut self, height: f32) {
        self.content_height = height;
    }
}

impl ScrollContainer for ChatWindow {
    fn scroll_height(&self) -> f32 {
        self.content_height
    }

    /// Offsets at or past the last measured height mean "follow the end".
    fn set_scroll_top(&mut self, offset: f32) {
        self.follow_bottom = offset >= self.content_height;
    }
}
