use crate::about;
use crate::config::Background;
use crate::state::{State, Status};
use crate::{ScopeCapture, INITIAL_WIDTH, PROGRAM_TITLE};
use eframe::egui::{self, Color32, Context, RichText, Ui};

const UP_COLOR: Color32 = Color32::GREEN;
const DOWN_COLOR: Color32 = Color32::from_rgb(255, 0, 0);
const PATH_BACKGROUND: Color32 = Color32::from_rgb(0xd3, 0xd3, 0xd3);

// --- UI Drawing Functions ---

pub(crate) fn draw_about_screen(app: &mut ScopeCapture, ui: &mut Ui) {
    ui.set_width(INITIAL_WIDTH);
    ui.vertical_centered(|ui| {
        ui.heading(format!("About {}", PROGRAM_TITLE));
        ui.separator();
        for line in about::about() {
            ui.label(line);
        }
        ui.separator();
        if ui.button("OK").clicked() {
            app.state = State::Running;
        }
    });
}

pub(crate) fn draw_running_state(app: &mut ScopeCapture, ui: &mut Ui, ctx: &Context) {
    ui.horizontal(|ui| {
        draw_backend_section(app, ui);
        draw_instrument_section(app, ui);
    });
    ui.separator();
    draw_save_section(app, ui);
    ui.separator();
    draw_capture_section(app, ui);
    ui.add_space(10.0);
    draw_control_buttons(app, ui, ctx);
}

fn draw_backend_section(app: &mut ScopeCapture, ui: &mut Ui) {
    ui.group(|ui| {
        ui.vertical(|ui| {
            ui.label(format!("{} Status", app.backend_label));
            status_label(ui, &app.backend_label, app.backend_status);
            if ui.button(format!("Try {}", app.backend_label)).clicked() {
                app.handle_retry_backend();
            }
        });
    });
}

fn draw_instrument_section(app: &mut ScopeCapture, ui: &mut Ui) {
    ui.group(|ui| {
        ui.vertical(|ui| {
            ui.label("Instrument Status");
            ui.horizontal(|ui| {
                status_label(ui, "LINK", app.link_status);
                if ui.button("Connect Instrument").clicked() {
                    // failures are logged and shown by the LINK indicator
                    let _ = app.handle_connect();
                }
            });
            address_selector(app, ui);
        });
    });
}

/// Drop-down of enumerated resources plus a text field for manual entry.
fn address_selector(app: &mut ScopeCapture, ui: &mut Ui) {
    let current = app.config.settings().instrumentaddr.clone();
    let mut picked: Option<String> = None;

    egui::ComboBox::from_id_salt("instrument_address")
        .width(260.0)
        .selected_text(current.as_str())
        .show_ui(ui, |ui| {
            if app.resources.is_empty() {
                ui.label("(no resources found)");
            }
            for resource in &app.resources {
                if ui
                    .selectable_label(*resource == current, resource.as_str())
                    .clicked()
                    && *resource != current
                {
                    picked = Some(resource.clone());
                }
            }
        });

    let mut typed = current;
    if ui.text_edit_singleline(&mut typed).changed() {
        picked = Some(typed);
    }

    if let Some(address) = picked {
        app.handle_select_address(&address);
    }
}

fn draw_save_section(app: &mut ScopeCapture, ui: &mut Ui) {
    egui::Grid::new("save_grid")
        .num_columns(3)
        .spacing([8.0, 6.0])
        .show(ui, |ui| {
            ui.label("Save to:");
            ui.label(
                RichText::new(app.config.settings().imagepath.as_str())
                    .color(Color32::BLACK)
                    .background_color(PATH_BACKGROUND),
            );
            if ui.button("Browse").clicked() {
                app.handle_browse();
            }
            ui.end_row();

            ui.label("Save as:");
            let mut name = app.config.settings().imagename.clone();
            if ui.text_edit_singleline(&mut name).changed() {
                app.handle_image_name(&name);
            }
            ui.end_row();
        });
}

fn draw_capture_section(app: &mut ScopeCapture, ui: &mut Ui) {
    ui.horizontal(|ui| {
        ui.label("Background color:");
        let mut background = app.config.settings().background;
        let black = ui.radio_value(&mut background, Background::Black, "Black");
        let white = ui.radio_value(&mut background, Background::White, "White");
        if black.changed() || white.changed() {
            app.handle_background(background);
        }
    });

    if ui.button(RichText::new("Print Screen").strong()).clicked() {
        app.capture_and_report();
    }

    match &app.last_capture {
        Some(Ok(path)) => {
            ui.label(format!("Saved {}", path.display()));
        }
        Some(Err(message)) => {
            ui.colored_label(DOWN_COLOR, message.as_str());
        }
        None => {}
    }
}

fn status_label(ui: &mut Ui, name: &str, status: Status) {
    let color = if status.is_up() { UP_COLOR } else { DOWN_COLOR };
    ui.label(RichText::new(format!("{}: {}", name, status)).color(color));
}

/// Draws the About/Exit buttons along the bottom.
fn draw_control_buttons(app: &mut ScopeCapture, ui: &mut Ui, ctx: &Context) {
    ui.horizontal(|ui| {
        if ui.button("About").clicked() {
            app.state = State::About;
        }

        if ui.button("Exit").clicked() {
            // Ask eframe to close the window. `on_exit` will be called.
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    });
}
