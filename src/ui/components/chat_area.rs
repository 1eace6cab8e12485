use eframe::egui;

use crate::ui::state::ChatWindow;

/// The scrollable `chat-window` wrapping the `messages` list.
pub fn render(ui: &mut egui::Ui, messages: &[String], chat_window: Option<&mut ChatWindow>) {
    let Some(chat_window) = chat_window else {
        for line in messages {
            ui.label(line);
        }
        return;
    };

    let follow = chat_window.take_follow_bottom();
    let output = egui::ScrollArea::vertical()
        .id_salt("chat-window")
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for line in messages {
                ui.label(line);
            }
            if follow {
                ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
            }
        });

    chat_window.set_content_height(output.content_size.y);
}
