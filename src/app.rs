// src/app.rs
use std::path::PathBuf;
use std::time::Instant;

use eframe::egui;

use asana_tracker::config::{AppSettings, SETTINGS_FILE};
use asana_tracker::overlay::OverlayCanvas;
use asana_tracker::profile::ProfileRegistry;
use asana_tracker::record::CsvSessionLog;
use asana_tracker::session::{LogSpeech, PracticeSession, SessionListener, SessionSummary, SpeechSink};
use asana_tracker::source::{LandmarkSource, RecordingReader, SimulatedPerformer};

const FRAME_SIZE: egui::Vec2 = egui::Vec2::new(640.0, 480.0);

/// Speech sink that also remembers the last count for the status panel.
#[derive(Default)]
struct CueBoard {
    enabled: bool,
    last: Option<u64>,
    voice: LogSpeech,
}

impl SpeechSink for CueBoard {
    fn speak(&mut self, seconds: u64) {
        self.last = Some(seconds);
        if self.enabled {
            self.voice.speak(seconds);
        }
    }
}

/// Discards summaries when recording is switched off.
struct NoRecord;

impl SessionListener for NoRecord {
    fn session_finished(&mut self, _summary: &SessionSummary) -> anyhow::Result<()> {
        Ok(())
    }
}

pub struct AsanaTrackerApp {
    registry: ProfileRegistry,
    settings: AppSettings,
    selected_pose: String,

    session: Option<PracticeSession>,
    source: Option<LandmarkSource>,
    session_clock: Instant,

    canvas: OverlayCanvas,
    cues: CueBoard,
    session_log: CsvSessionLog,
    last_summary: Option<SessionSummary>,
    status: String,

    recording_input: String,
    settings_path: PathBuf,
    show_settings: bool,
}

impl AsanaTrackerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, registry: ProfileRegistry, settings: AppSettings) -> Self {
        Self::with_settings(registry, settings)
    }

    fn with_settings(registry: ProfileRegistry, settings: AppSettings) -> Self {
        let selected_pose = if registry.get(&settings.default_pose).is_some() {
            settings.default_pose.clone()
        } else {
            registry.ids().next().unwrap_or_default().to_string()
        };

        Self {
            session_log: CsvSessionLog::new(&settings.output_directory),
            recording_input: settings
                .recording_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            cues: CueBoard {
                enabled: settings.speak_cues,
                ..CueBoard::default()
            },
            registry,
            settings,
            selected_pose,
            session: None,
            source: None,
            session_clock: Instant::now(),
            canvas: OverlayCanvas::default(),
            last_summary: None,
            status: String::from("Select a pose and press Start"),
            settings_path: PathBuf::from(SETTINGS_FILE),
            show_settings: false,
        }
    }

    fn now_ms(&self) -> u64 {
        self.session_clock.elapsed().as_millis() as u64
    }

    fn start_session(&mut self) {
        let Some(profile) = self.registry.get(&self.selected_pose).cloned() else {
            self.status = format!("Unknown pose: {}", self.selected_pose);
            return;
        };

        let source = match &self.settings.recording_path {
            Some(path) => match RecordingReader::open(path) {
                Ok(reader) => LandmarkSource::Recording(reader),
                Err(e) => {
                    tracing::warn!(error = %e, "falling back to simulated performer");
                    self.status = format!("{}; using simulation", e);
                    LandmarkSource::Simulated(SimulatedPerformer::new(
                        profile.clone(),
                        self.settings.simulation_period_secs,
                    ))
                }
            },
            None => LandmarkSource::Simulated(SimulatedPerformer::new(
                profile.clone(),
                self.settings.simulation_period_secs,
            )),
        };

        self.canvas.clear();
        self.cues.last = None;
        self.session_clock = Instant::now();
        self.status = format!("Practicing {} ({})", profile.title(), source.describe());
        self.session = Some(PracticeSession::new(profile, self.settings.overlay.clone(), 0));
        self.source = Some(source);
    }

    fn finish_session(&mut self) {
        let Some(session) = self.session.take() else { return };
        self.source = None;
        let ended_ms = self.now_ms();

        let finished = if self.settings.record_sessions {
            session.finish(ended_ms, &mut self.session_log)
        } else {
            session.finish(ended_ms, &mut NoRecord)
        };

        match finished {
            Ok(summary) => {
                self.status = format!(
                    "Finished {}: longest hold {} s",
                    summary.pose_id, summary.longest_hold_seconds
                );
                self.last_summary = Some(summary);
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to record session");
                self.status = format!("Session not recorded: {}", e);
            }
        }
    }

    fn save_settings(&mut self) {
        match self.settings.save(&self.settings_path) {
            Ok(()) => {
                tracing::info!(path = %self.settings_path.display(), "settings saved");
                self.status = format!("Settings saved to {}", self.settings_path.display());
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to save settings");
                self.status = format!("Settings not saved: {}", e);
            }
        }
    }

    fn step(&mut self) {
        let now_ms = self.now_ms();
        let (Some(session), Some(source)) = (self.session.as_mut(), self.source.as_mut()) else {
            return;
        };

        if let Some(output) = source.next_frame(now_ms) {
            session.drive(&output, &mut self.canvas, &mut self.cues);
        }

        if source.is_finished() {
            self.finish_session();
        }
    }

    fn render_header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(10.0);
            egui::menu::bar(ui, |ui| {
                ui.heading("Asana Tracker");
                ui.separator();

                let practicing = self.session.is_some();
                ui.add_enabled_ui(!practicing, |ui| {
                    let ids: Vec<String> = self.registry.ids().map(str::to_string).collect();
                    for id in ids {
                        let title = self
                            .registry
                            .get(&id)
                            .map(|p| p.title().to_string())
                            .unwrap_or_else(|| id.clone());
                        ui.selectable_value(&mut self.selected_pose, id, title);
                    }
                });

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("⚙ Settings").clicked() {
                        self.show_settings = !self.show_settings;
                    }
                });
            });
            ui.add_space(10.0);
        });
    }

    fn render_control_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("controls").show(ctx, |ui| {
            ui.add_space(10.0);
            ui.horizontal(|ui| {
                let practicing = self.session.is_some();
                let button = if practicing {
                    egui::Button::new("⏹ Finish").fill(egui::Color32::from_rgb(244, 67, 54))
                } else {
                    egui::Button::new("▶ Start").fill(egui::Color32::from_rgb(76, 175, 80))
                };
                if ui.add_sized([120.0, 40.0], button).clicked() {
                    if practicing {
                        self.finish_session();
                    } else {
                        self.start_session();
                    }
                }

                ui.separator();
                ui.label(&self.status);
            });
            ui.add_space(10.0);
        });
    }

    fn render_main_content(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.columns(2, |columns| {
                columns[0].group(|ui| {
                    ui.heading("Pose Overlay");
                    let size = egui::vec2(ui.available_width(), ui.available_width() * 0.75);
                    let (rect, _response) = ui.allocate_exact_size(size, egui::Sense::hover());
                    self.canvas.paint(ui.painter(), rect, FRAME_SIZE);
                });

                columns[1].vertical(|ui| {
                    ui.group(|ui| {
                        ui.heading("Hold");
                        self.render_hold_panel(ui);
                    });
                    ui.add_space(20.0);
                    ui.group(|ui| {
                        ui.heading("Joints");
                        self.render_joint_panel(ui);
                    });
                });
            });
        });
    }

    fn render_hold_panel(&self, ui: &mut egui::Ui) {
        let held = self
            .session
            .as_ref()
            .and_then(|s| s.last_result())
            .map(|r| r.held_seconds)
            .unwrap_or(0);
        ui.label(egui::RichText::new(format!("{} s", held)).size(48.0));

        if let Some(session) = &self.session {
            ui.label(format!("Longest hold: {} s", session.longest_hold_seconds()));
        }
        if let Some(spoken) = self.cues.last {
            ui.label(format!("Last cue: {}", spoken));
        }
        if let Some(summary) = &self.last_summary {
            ui.separator();
            ui.label(format!(
                "Previous: {}, {} s best, {} frames",
                summary.pose_id, summary.longest_hold_seconds, summary.frames_evaluated
            ));
        }
    }

    fn render_joint_panel(&self, ui: &mut egui::Ui) {
        let Some(session) = &self.session else {
            ui.label("No active session");
            return;
        };
        let Some(result) = session.last_result() else {
            ui.label("Waiting for landmarks...");
            return;
        };

        for (joint, group) in result.joints.iter().zip(&session.profile().joints) {
            let color = if joint.in_range {
                egui::Color32::from_rgb(76, 175, 80)
            } else {
                egui::Color32::from_rgb(244, 67, 54)
            };
            ui.horizontal(|ui| {
                ui.label(&joint.name);
                if joint.points.is_empty() {
                    ui.colored_label(color, "not visible");
                } else {
                    ui.colored_label(color, format!("{}°", joint.angle_degrees));
                }
                ui.label(format!("target {}–{}°", group.range.min, group.range.max));
            });
        }
    }

    fn render_settings_window(&mut self, ctx: &egui::Context) {
        let mut open = self.show_settings;
        egui::Window::new("Settings")
            .open(&mut open)
            .resizable(true)
            .default_size([400.0, 400.0])
            .show(ctx, |ui| {
                ui.heading("Feedback");
                if ui.checkbox(&mut self.settings.speak_cues, "Announce hold seconds").changed() {
                    self.cues.enabled = self.settings.speak_cues;
                }
                ui.checkbox(&mut self.settings.overlay.show_joint_angles, "Show joint angles");
                ui.checkbox(&mut self.settings.record_sessions, "Record finished sessions");

                ui.separator();
                ui.heading("Landmark Source");
                ui.label("Recording (JSON lines), empty for simulation:");
                if ui.text_edit_singleline(&mut self.recording_input).changed() {
                    let trimmed = self.recording_input.trim();
                    self.settings.recording_path = (!trimmed.is_empty()).then(|| PathBuf::from(trimmed));
                }
                ui.add(
                    egui::Slider::new(&mut self.settings.simulation_period_secs, 4.0..=60.0)
                        .text("Simulation cycle")
                        .suffix(" s"),
                );

                ui.separator();
                ui.label("Output Directory:");
                ui.label(self.settings.output_directory.display().to_string());

                ui.separator();
                if ui.button("💾 Save Settings").clicked() {
                    self.save_settings();
                }
            });
        self.show_settings = open;
    }
}

impl eframe::App for AsanaTrackerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.step();

        self.render_header(ctx);
        self.render_control_panel(ctx);

        if self.show_settings {
            self.render_settings_window(ctx);
        }

        self.render_main_content(ctx);

        // Keep polling the landmark source
        ctx.request_repaint();
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        // Closing the window ends the running session
        self.finish_session();
    }
}
