use eframe::egui;

use super::{DialogEvent, DialogHost, DialogKind, Session};
use crate::i18n::Translator;

impl DialogHost {
    /// 열린 대화상자를 열린 순서대로 그리고, 이번 프레임의 이벤트를 세션에 전달한다.
    pub fn show(&mut self, ctx: &egui::Context, tr: &Translator) {
        if self.stack.is_empty() {
            return;
        }
        let mut events: Vec<(DialogKind, DialogEvent)> = Vec::new();
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            if let Some(top) = self.top() {
                events.push((top, DialogEvent::Escape));
            }
        }
        for kind in self.stack.clone() {
            match kind {
                DialogKind::Message => {
                    if let Some(s) = self.message.as_mut() {
                        show_session(ctx, tr, kind, s, &mut events);
                    }
                }
                DialogKind::Confirm => {
                    if let Some(s) = self.confirm.as_mut() {
                        show_session(ctx, tr, kind, s, &mut events);
                    }
                }
                DialogKind::TextInput => {
                    if let Some(s) = self.text_input.as_mut() {
                        show_session(ctx, tr, kind, s, &mut events);
                    }
                }
                DialogKind::Choice => {
                    if let Some(s) = self.choice.as_mut() {
                        show_session(ctx, tr, kind, s, &mut events);
                    }
                }
            }
        }
        for (kind, event) in events {
            self.dispatch(kind, event);
        }
    }
}

fn show_session<T>(
    ctx: &egui::Context,
    tr: &Translator,
    kind: DialogKind,
    session: &mut Session<T>,
    events: &mut Vec<(DialogKind, DialogEvent)>,
) {
    let screen = ctx.screen_rect();
    let backdrop_id = egui::Id::new(("dialog_backdrop", kind, session.id));
    let outside_clicked = egui::Area::new(backdrop_id)
        .order(egui::Order::Middle)
        .fixed_pos(screen.min)
        .show(ctx, |ui| {
            let resp = ui.allocate_rect(screen, egui::Sense::click());
            ui.painter()
                .rect_filled(screen, 0.0, egui::Color32::from_black_alpha(80));
            resp.clicked()
        })
        .inner;
    ctx.move_to_top(egui::LayerId::new(egui::Order::Middle, backdrop_id));

    let window_id = egui::Id::new(("dialog_window", kind, session.id));
    let mut open = true;
    egui::Window::new(session.request.title.clone())
        .id(window_id)
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.set_min_width(280.0);
            if !session.request.prompt.is_empty() {
                ui.label(&session.request.prompt);
                ui.add_space(6.0);
            }
            match kind {
                DialogKind::TextInput => {
                    let resp = ui.add(
                        egui::TextEdit::singleline(&mut session.input).desired_width(260.0),
                    );
                    if resp.changed() {
                        events.push((kind, DialogEvent::TextChanged(session.input.clone())));
                    }
                    if resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        events.push((kind, DialogEvent::Primary));
                    }
                    if session.invalid {
                        ui.colored_label(
                            egui::Color32::from_rgb(220, 80, 80),
                            tr.text("dialog.error.empty", "Please enter a value."),
                        );
                    }
                }
                DialogKind::Choice => {
                    ui.horizontal_wrapped(|ui| {
                        for (i, option) in session.request.options.iter().enumerate() {
                            if ui.button(option).clicked() {
                                events.push((kind, DialogEvent::PickOption(i)));
                            }
                        }
                    });
                }
                DialogKind::Message | DialogKind::Confirm => {}
            }
            ui.add_space(8.0);
            ui.horizontal(|ui| match kind {
                DialogKind::Message => {
                    if ui.button(tr.text("dialog.ok", "OK")).clicked() {
                        events.push((kind, DialogEvent::Primary));
                    }
                }
                DialogKind::Confirm | DialogKind::TextInput => {
                    if ui.button(tr.text("dialog.ok", "OK")).clicked() {
                        events.push((kind, DialogEvent::Primary));
                    }
                    if ui.button(tr.text("dialog.cancel", "Cancel")).clicked() {
                        events.push((kind, DialogEvent::Cancel));
                    }
                }
                DialogKind::Choice => {
                    if ui.button(tr.text("dialog.cancel", "Cancel")).clicked() {
                        events.push((kind, DialogEvent::Cancel));
                    }
                }
            });
        });
    ctx.move_to_top(egui::LayerId::new(egui::Order::Middle, window_id));

    if !open {
        events.push((kind, DialogEvent::Hidden));
    }
    if outside_clicked {
        events.push((kind, DialogEvent::OutsideClick));
    }
}
