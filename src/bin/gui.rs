#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

//! eframe/egui 기반 데스크톱 GUI 진입점.

use eframe::{egui, App, Frame};
use egui_plot::{AxisHints, GridMark, HPlacement, Legend, Line, Plot, Points};
use image::GenericImageView;
use insulation_thickness_toolbox::{
    app,
    catalog::Catalog,
    config,
    dialog::{DialogHandle, DialogHost, DialogRequest, DialogResult},
    export::{self, ExportError, ExportPayload},
    i18n,
    params::{Environment, Orientation, ParameterSet, RangeInput, SweepVariable},
    point::{self, PointResult},
    solver::{HttpSolver, PointTask, SweepSolver, SweepTask},
    sweep::{
        chart::{AxisMap, ChartLabels, ChartModel, Dataset},
        AxisSyncPolicy, GeometryKind, SecondaryView, SweepController, SweepError, SweepPhase,
        SweepStatus,
    },
};
use rfd::FileDialog;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::{env, fs, path::Path};

fn main() -> Result<(), eframe::Error> {
    app::init_logging("info");
    // CLI 언어 옵션 처리: --lang xx 또는 --lang=xx (xx: auto/en-us/ko-kr/ko)
    let mut cli_lang: Option<String> = None;
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        let a = &args[i];
        if let Some(val) = a.strip_prefix("--lang=") {
            cli_lang = Some(val.to_string());
        } else if (a == "--lang" || a == "-L") && i + 1 < args.len() {
            cli_lang = Some(args[i + 1].clone());
            i += 1;
        }
        i += 1;
    }

    let mut viewport = egui::ViewportBuilder::default()
        .with_inner_size(egui::vec2(1200.0, 780.0))
        .with_transparent(true);
    if let Some(icon) = load_app_icon() {
        viewport = viewport.with_icon(icon);
    }
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    let mut app_cfg = config::load_or_default().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "설정 로드 실패, 기본값 사용");
        config::Config::default()
    });
    if let Some(lang_cli) = cli_lang {
        app_cfg.language = i18n::resolve_language(&lang_cli, Some(app_cfg.language.as_str()));
    }
    eframe::run_native(
        "Insulation Thickness Toolbox",
        options,
        Box::new(move |cc| {
            if let Err(e) = setup_fonts(&cc.egui_ctx) {
                tracing::warn!("Font error: {e}");
            }
            let mut gui = GuiApp::new(app_cfg.clone());
            if let Some(storage) = cc.storage {
                gui.catalog = Catalog::load(storage);
            }
            Box::new(gui)
        }),
    )
}

fn load_app_icon() -> Option<egui::IconData> {
    let search = ["icon.png", "assets/icon.png", "../icon.png"];
    let path = search.iter().find(|p| Path::new(*p).exists())?;
    let bytes = fs::read(path).ok()?;
    let img = image::load_from_memory(&bytes).ok()?;
    let rgba = img.to_rgba8();
    let (w, h) = img.dimensions();
    Some(egui::IconData {
        rgba: rgba.into_raw(),
        width: w,
        height: h,
    })
}

/// 공통: 바이너리 폰트 바이트를 egui에 등록.
fn apply_font_bytes(ctx: &egui::Context, bytes: Vec<u8>, name: &str) {
    let mut fonts = egui::FontDefinitions::default();
    let font_name = name.to_string();
    fonts
        .font_data
        .insert(font_name.clone(), egui::FontData::from_owned(bytes));
    fonts
        .families
        .entry(egui::FontFamily::Proportional)
        .or_default()
        .insert(0, font_name.clone());
    fonts
        .families
        .entry(egui::FontFamily::Monospace)
        .or_default()
        .push(font_name);
    ctx.set_fonts(fonts);
}

/// 한글 표시용 폰트를 찾아 적용한다.
/// 1) assets/fonts/ 아래 폰트
/// 2) Windows 시스템 폰트(맑은 고딕/굴림)
/// 3) Linux/macOS의 CJK 폰트
/// 모두 없으면 기본 폰트를 유지하고 Err를 돌려준다.
fn setup_fonts(ctx: &egui::Context) -> Result<(), String> {
    let mut candidates: Vec<std::path::PathBuf> = vec![
        "assets/fonts/malgun.ttf".into(),
        "assets/fonts/NanumGothic.ttf".into(),
    ];
    if let Some(windir) = env::var_os("WINDIR") {
        let fonts = Path::new(&windir).join("Fonts");
        candidates.extend(["malgun.ttf", "gulim.ttc"].iter().map(|f| fonts.join(f)));
    }
    candidates.extend(
        [
            "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/truetype/nanum/NanumGothic.ttf",
            "/System/Library/Fonts/AppleSDGothicNeo.ttc",
        ]
        .iter()
        .map(std::path::PathBuf::from),
    );
    for path in candidates {
        if path.exists() {
            let bytes = fs::read(&path)
                .map_err(|e| format!("Failed to read font ({}): {e}", path.display()))?;
            apply_font_bytes(ctx, bytes, "korean_font");
            tracing::debug!(path = %path.display(), "폰트 적용");
            return Ok(());
        }
    }
    Err("Korean font not found; using the default font.".into())
}

/// 진행 중인 카탈로그 작업. 대화상자 결과를 기다린다.
#[derive(Debug)]
enum CatalogFlow {
    Save(DialogHandle<String>),
    Load(String, DialogHandle<()>),
    Delete(String, DialogHandle<()>),
}

struct GuiApp {
    config: config::Config,
    tr: i18n::Translator,
    solver: Arc<dyn SweepSolver>,
    // 입력 폼
    params: ParameterSet,
    variable: Option<SweepVariable>,
    range: RangeInput,
    // 단일 지점 계산
    point_task: Option<PointTask>,
    point_result: Option<PointResult>,
    point_message: Option<Result<String, String>>,
    // 스윕/차트
    controller: SweepController,
    // 대화상자와 카탈로그
    dialogs: DialogHost,
    catalog: Catalog,
    catalog_selected: Option<String>,
    catalog_flow: Option<CatalogFlow>,
    catalog_dirty: bool,
    notice: Option<DialogHandle<()>>,
    note: Option<String>,
    // 설정 창
    show_settings_modal: bool,
    lang_input: String,
    api_base_input: String,
    settings_status: Option<String>,
    window_alpha: f32,
}

impl GuiApp {
    fn new(config: config::Config) -> Self {
        let lang_code = i18n::resolve_language("auto", Some(config.language.as_str()));
        let tr = i18n::Translator::new_with_pack(&lang_code, config.language_pack_dir.as_deref());
        let mut controller = SweepController::new(
            config.axis_sync,
            config.max_iterations,
            config.export_precision,
        );
        controller.set_labels(chart_labels(&tr));
        Self {
            solver: Arc::new(HttpSolver::from_config(&config)),
            lang_input: config.language.clone(),
            api_base_input: config.api_base.clone(),
            window_alpha: config.window_alpha,
            config,
            tr,
            params: ParameterSet::default(),
            variable: None,
            range: RangeInput::default(),
            point_task: None,
            point_result: None,
            point_message: None,
            controller,
            dialogs: DialogHost::new(),
            catalog: Catalog::default(),
            catalog_selected: None,
            catalog_flow: None,
            catalog_dirty: false,
            notice: None,
            note: None,
            show_settings_modal: false,
            settings_status: None,
        }
    }

    fn txt(&self, key: &str, default: &str) -> String {
        self.tr.text(key, default)
    }

    fn variable_label(&self, variable: SweepVariable) -> String {
        self.tr.text(&variable.legend_key(), variable.legend())
    }

    /// 변수를 고르면 그 변수의 기본 범위로 채운다.
    fn select_variable(&mut self, variable: Option<SweepVariable>) {
        if self.variable == variable {
            return;
        }
        self.variable = variable;
        self.range = variable.map(RangeInput::for_variable).unwrap_or_default();
    }

    /// 메시지 대화상자로 알린다. 이미 떠 있으면 상태줄로 대신한다.
    fn notify(&mut self, title: &str, message: String) {
        match self.dialogs.open_message(DialogRequest::new(title, message.clone())) {
            Ok(handle) => self.notice = Some(handle),
            Err(e) => {
                tracing::debug!(error = %e, "메시지 대화상자 대신 상태줄 사용");
                self.note = Some(message);
            }
        }
    }

    fn start_sweep(&mut self, ctx: &egui::Context) {
        let x_title = self
            .variable
            .map(|v| self.variable_label(v))
            .unwrap_or_default();
        match self
            .controller
            .begin_sweep(&self.params, self.variable, &self.range, &x_title)
        {
            Ok(ticket) => {
                let repaint = ctx.clone();
                let task = SweepTask::spawn(self.solver.clone(), ticket, move || {
                    repaint.request_repaint()
                });
                self.controller.attach_task(task);
            }
            Err(SweepError::Busy) => {}
            Err(e) => {
                let title = self.txt("gui.sweep.invalid_title", "Check the inputs");
                self.notify(&title, e.to_string());
            }
        }
    }

    fn start_point(&mut self, ctx: &egui::Context) {
        if self.point_task.is_some() {
            return;
        }
        match point::build_point_request(&self.params) {
            Ok(request) => {
                self.point_result = None;
                self.point_message = None;
                let repaint = ctx.clone();
                self.point_task = Some(PointTask::spawn(self.solver.clone(), request, move || {
                    repaint.request_repaint()
                }));
            }
            Err(e) => {
                let title = self.txt("gui.sweep.invalid_title", "Check the inputs");
                self.notify(&title, e.to_string());
            }
        }
    }

    fn poll_point(&mut self) {
        let Some(outcome) = self.point_task.as_ref().and_then(PointTask::try_take) else {
            return;
        };
        self.point_task = None;
        match outcome {
            Ok(result) => {
                self.point_message = Some(Ok(match result.iterations {
                    Some(n) => format!(
                        "{} {n}",
                        self.txt("gui.point.iterations", "Calculated. Iterations:")
                    ),
                    None => self.txt("gui.point.symbolic", "Calculated (symbolic solution)"),
                }));
                self.point_result = Some(result);
            }
            Err(e) => {
                tracing::warn!(error = %e, "단일 지점 계산 실패");
                self.point_message = Some(Err(format!(
                    "{} {e}",
                    self.txt("gui.point.error_title", "Calculation failed")
                )));
            }
        }
    }

    fn start_export(&mut self) {
        let request = DialogRequest::new(
            self.txt("gui.export.title", "Export data"),
            self.txt("gui.export.prompt", "Choose the file format."),
        );
        if let Err(e) = self.controller.request_export(&mut self.dialogs, request) {
            let title = self.txt("gui.export.title", "Export data");
            let message = match e {
                ExportError::NoData => self.txt("gui.export.no_data", "There is no data to export."),
                other => other.to_string(),
            };
            self.notify(&title, message);
        }
    }

    fn save_payload(&mut self, payload: ExportPayload) {
        let ext = Path::new(&payload.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("txt")
            .to_string();
        let Some(path) = FileDialog::new()
            .set_file_name(&payload.file_name)
            .add_filter(ext.to_uppercase(), &[ext.as_str()])
            .save_file()
        else {
            return;
        };
        let title = self.txt("gui.export.title", "Export data");
        match export::write_download(&path, &payload.bytes) {
            Ok(()) => {
                self.note = Some(format!(
                    "{} {}",
                    self.txt("gui.export.saved", "Saved:"),
                    path.display()
                ));
            }
            Err(e) => self.notify(&title, e.to_string()),
        }
    }

    fn begin_catalog_save(&mut self) {
        let request = DialogRequest::new(
            self.txt("gui.catalog.save_title", "Save parameters"),
            self.txt("gui.catalog.save_prompt", "Name for this parameter set:"),
        )
        .with_default(self.catalog.suggest_name());
        match self.dialogs.open_text_input(request) {
            Ok(handle) => self.catalog_flow = Some(CatalogFlow::Save(handle)),
            Err(e) => tracing::warn!(error = %e, "카탈로그 저장 대화상자 열기 실패"),
        }
    }

    fn begin_catalog_confirm(&mut self, delete: bool) {
        let Some(name) = self.catalog_selected.clone() else {
            return;
        };
        let (title, prompt) = if delete {
            (
                self.txt("gui.catalog.delete_title", "Delete parameters"),
                format!(
                    "{} \"{name}\"",
                    self.txt("gui.catalog.delete_prompt", "Delete the saved set")
                ),
            )
        } else {
            (
                self.txt("gui.catalog.load_title", "Load parameters"),
                format!(
                    "{} \"{name}\"",
                    self.txt("gui.catalog.load_prompt", "Replace the form with the saved set")
                ),
            )
        };
        match self.dialogs.open_confirm(DialogRequest::new(title, prompt)) {
            Ok(handle) if delete => self.catalog_flow = Some(CatalogFlow::Delete(name, handle)),
            Ok(handle) => self.catalog_flow = Some(CatalogFlow::Load(name, handle)),
            Err(e) => tracing::warn!(error = %e, "카탈로그 확인 대화상자 열기 실패"),
        }
    }

    /// 카탈로그 대화상자 결과를 반영한다.
    fn poll_catalog(&mut self) {
        let title = self.txt("gui.catalog.title", "Parameter catalog");
        let Some(flow) = self.catalog_flow.as_mut() else {
            return;
        };
        let message = match flow {
            CatalogFlow::Save(handle) => match handle.poll() {
                None => return,
                Some(DialogResult::Cancelled) => None,
                Some(DialogResult::Value(name)) => {
                    Some(match self.catalog.insert(&name, self.params.clone()) {
                        Ok(()) => {
                            self.catalog_dirty = true;
                            self.catalog_selected = Some(name.clone());
                            format!("{} \"{name}\"", self.tr.text("gui.catalog.saved", "Saved"))
                        }
                        Err(e) => e.to_string(),
                    })
                }
            },
            CatalogFlow::Load(name, handle) => match handle.poll() {
                None => return,
                Some(DialogResult::Cancelled) => None,
                Some(DialogResult::Value(())) => Some(match self.catalog.get(name) {
                    Ok(params) => {
                        self.params = params.clone();
                        format!("{} \"{name}\"", self.tr.text("gui.catalog.loaded", "Loaded"))
                    }
                    Err(e) => e.to_string(),
                }),
            },
            CatalogFlow::Delete(name, handle) => match handle.poll() {
                None => return,
                Some(DialogResult::Cancelled) => None,
                Some(DialogResult::Value(())) => Some(match self.catalog.remove(name) {
                    Ok(_) => {
                        self.catalog_dirty = true;
                        self.catalog_selected = None;
                        format!("{} \"{name}\"", self.tr.text("gui.catalog.deleted", "Deleted"))
                    }
                    Err(e) => e.to_string(),
                }),
            },
        };
        self.catalog_flow = None;
        if let Some(message) = message {
            self.notify(&title, message);
        }
    }

    fn poll_dialogs(&mut self) {
        if let Some(handle) = self.notice.as_mut() {
            if handle.poll().is_some() {
                self.notice = None;
            }
        }
        self.poll_catalog();
        if let Some(outcome) = self.controller.poll_export() {
            match outcome {
                Ok(payload) => self.save_payload(payload),
                Err(e) => {
                    let title = self.txt("gui.export.title", "Export data");
                    self.notify(&title, e.to_string());
                }
            }
        }
    }

    /// 설정 창의 값을 적용하고 config.toml에 저장한다.
    fn apply_settings(&mut self) {
        self.config.language = self.lang_input.clone();
        self.config.api_base = self.api_base_input.trim().to_string();
        self.config.window_alpha = self.window_alpha;
        self.config.axis_sync = self.controller.policy();
        let resolved = i18n::resolve_language(&self.config.language, None);
        self.tr = i18n::Translator::new_with_pack(&resolved, self.config.language_pack_dir.as_deref());
        self.controller.set_labels(chart_labels(&self.tr));
        self.solver = Arc::new(HttpSolver::from_config(&self.config));
        self.settings_status = Some(match self.config.save() {
            Ok(()) => self.txt("gui.settings.saved", "Saved."),
            Err(e) => format!("{} {e}", self.txt("gui.settings.save_error", "Save error:")),
        });
    }

    fn ui_params(&mut self, ui: &mut egui::Ui) {
        let tr = self.tr.clone();
        let txt = |key: &str, default: &str| tr.text(key, default);

        ui.heading(txt("gui.form.heading", "Parameters"));
        egui::Grid::new("form_selects")
            .num_columns(2)
            .spacing([8.0, 4.0])
            .show(ui, |ui| {
                let unselected = txt("gui.form.select", "Select...");
                ui.label(txt("gui.form.geometry", "Geometry"));
                egui::ComboBox::from_id_source("geometry")
                    .selected_text(
                        self.params
                            .geometry
                            .map(|g| geometry_label(g, &txt))
                            .unwrap_or_else(|| unselected.clone()),
                    )
                    .show_ui(ui, |ui| {
                        for g in GeometryKind::ALL {
                            ui.selectable_value(&mut self.params.geometry, Some(g), geometry_label(g, &txt));
                        }
                    });
                ui.end_row();

                ui.label(txt("gui.form.environment", "Environment"));
                egui::ComboBox::from_id_source("environment")
                    .selected_text(
                        self.params
                            .environment
                            .map(|e| environment_label(e, &txt))
                            .unwrap_or_else(|| unselected.clone()),
                    )
                    .show_ui(ui, |ui| {
                        for e in Environment::ALL {
                            ui.selectable_value(&mut self.params.environment, Some(e), environment_label(e, &txt));
                        }
                    });
                ui.end_row();

                ui.label(txt("gui.form.orientation", "Orientation"));
                egui::ComboBox::from_id_source("orientation")
                    .selected_text(
                        self.params
                            .orientation
                            .map(|o| orientation_label(o, &txt))
                            .unwrap_or_else(|| unselected.clone()),
                    )
                    .show_ui(ui, |ui| {
                        for o in Orientation::ALL {
                            ui.selectable_value(&mut self.params.orientation, Some(o), orientation_label(o, &txt));
                        }
                    });
                ui.end_row();
            });

        ui.separator();
        egui::Grid::new("form_values")
            .num_columns(2)
            .spacing([8.0, 4.0])
            .show(ui, |ui| {
                for variable in SweepVariable::ALL {
                    ui.label(tr.text(&variable.legend_key(), variable.legend()));
                    let value = self.params.value_mut(variable);
                    ui.add(egui::DragValue::new(value).speed(drag_speed(variable)).max_decimals(4));
                    ui.end_row();
                }
                let mut has_h = self.params.convection.is_some();
                if ui
                    .checkbox(&mut has_h, txt("gui.form.convection", "Convection coefficient h (W/m²·K)"))
                    .on_hover_text(txt("gui.form.convection_tip", "Leave unchecked to let the solver compute h."))
                    .changed()
                {
                    self.params.convection = has_h.then_some(10.0);
                }
                if let Some(h) = self.params.convection.as_mut() {
                    ui.add(egui::DragValue::new(h).speed(0.1).clamp_range(0.0..=f64::MAX));
                } else {
                    ui.label("-");
                }
                ui.end_row();
            });
    }

    fn ui_point(&mut self, ui: &mut egui::Ui) {
        let tr = self.tr.clone();
        let txt = |key: &str, default: &str| tr.text(key, default);
        ui.heading(txt("gui.point.heading", "Optimal thickness"));
        let running = self.point_task.is_some();
        ui.horizontal(|ui| {
            let label = if running {
                txt("gui.point.running", "Calculating...")
            } else {
                txt("gui.point.calculate", "Calculate")
            };
            if ui.add_enabled(!running, egui::Button::new(label)).clicked() {
                let ctx = ui.ctx().clone();
                self.start_point(&ctx);
            }
            if running {
                ui.spinner();
            }
        });

        let check = txt("gui.point.check_kh", "check k,h");
        let (e, h, rc) = match &self.point_result {
            Some(r) => (r.thickness_text(), r.convection_text(), r.critical_text(&check)),
            None => ("-".to_string(), "-".to_string(), "-".to_string()),
        };
        egui::Grid::new("point_result")
            .num_columns(2)
            .spacing([8.0, 4.0])
            .show(ui, |ui| {
                ui.label(txt("gui.point.thickness", "Optimal thickness e (m)"));
                ui.strong(e);
                ui.end_row();
                ui.label(txt("gui.point.convection", "Convection coefficient h (W/m²·K)"));
                ui.strong(h);
                ui.end_row();
                ui.label(txt("gui.point.critical", "Critical radius (m)"));
                ui.strong(rc);
                ui.end_row();
            });
        match &self.point_message {
            Some(Ok(msg)) => {
                ui.colored_label(egui::Color32::from_rgb(22, 163, 74), msg.as_str());
            }
            Some(Err(msg)) => {
                let color = ui.visuals().error_fg_color;
                ui.colored_label(color, msg.as_str());
            }
            None => {}
        }
    }

    fn ui_catalog(&mut self, ui: &mut egui::Ui) {
        let tr = self.tr.clone();
        let txt = |key: &str, default: &str| tr.text(key, default);
        ui.heading(txt("gui.catalog.title", "Parameter catalog"));
        let names: Vec<String> = self.catalog.names().map(str::to_string).collect();
        egui::ComboBox::from_id_source("catalog_pick")
            .selected_text(
                self.catalog_selected
                    .clone()
                    .unwrap_or_else(|| txt("gui.form.select", "Select...")),
            )
            .show_ui(ui, |ui| {
                for name in names {
                    ui.selectable_value(&mut self.catalog_selected, Some(name.clone()), name);
                }
            });
        let busy = self.catalog_flow.is_some();
        let has_selection = self.catalog_selected.is_some();
        ui.horizontal(|ui| {
            if ui
                .add_enabled(!busy, egui::Button::new(txt("gui.catalog.save", "Save")))
                .clicked()
            {
                self.begin_catalog_save();
            }
            if ui
                .add_enabled(!busy && has_selection, egui::Button::new(txt("gui.catalog.load", "Load")))
                .clicked()
            {
                self.begin_catalog_confirm(false);
            }
            if ui
                .add_enabled(!busy && has_selection, egui::Button::new(txt("gui.catalog.delete", "Delete")))
                .clicked()
            {
                self.begin_catalog_confirm(true);
            }
        });
        ui.small(format!(
            "{} {}/{}",
            txt("gui.catalog.count", "Saved sets:"),
            self.catalog.len(),
            insulation_thickness_toolbox::catalog::MAX_ENTRIES
        ));
    }

    fn ui_sweep_controls(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let tr = self.tr.clone();
        let txt = |key: &str, default: &str| tr.text(key, default);
        ui.horizontal_wrapped(|ui| {
            ui.label(txt("gui.sweep.variable", "Variable to plot"));
            let mut selected = self.variable;
            egui::ComboBox::from_id_source("sweep_variable")
                .width(240.0)
                .selected_text(
                    selected
                        .map(|v| self.variable_label(v))
                        .unwrap_or_else(|| txt("gui.form.select", "Select...")),
                )
                .show_ui(ui, |ui| {
                    for v in SweepVariable::ALL {
                        ui.selectable_value(&mut selected, Some(v), self.variable_label(v));
                    }
                });
            self.select_variable(selected);

            ui.label(txt("gui.sweep.min", "Min"));
            ui.add(egui::TextEdit::singleline(&mut self.range.min).desired_width(70.0));
            ui.label(txt("gui.sweep.max", "Max"));
            ui.add(egui::TextEdit::singleline(&mut self.range.max).desired_width(70.0));
            ui.label(txt("gui.sweep.step", "Step"));
            ui.add(egui::TextEdit::singleline(&mut self.range.step).desired_width(70.0));

            let label = if self.controller.is_busy() {
                txt("gui.sweep.running", "Calculating...")
            } else {
                txt("gui.sweep.run", "Plot")
            };
            if ui
                .add_enabled(self.controller.can_trigger(), egui::Button::new(label))
                .clicked()
            {
                self.start_sweep(ctx);
            }
            if self.controller.is_busy() {
                ui.spinner();
            }
            if ui
                .add_enabled(
                    self.controller.can_export(),
                    egui::Button::new(txt("gui.export.button", "Export")),
                )
                .clicked()
            {
                self.start_export();
            }
        });

        if self.controller.secondary_controls_visible() {
            let current = self
                .controller
                .view_state()
                .map_or(SecondaryView::None, |s| s.view);
            let mut view = current;
            ui.horizontal(|ui| {
                ui.label(txt("gui.chart.secondary", "Secondary axis"));
                ui.radio_value(&mut view, SecondaryView::Convection, txt("gui.chart.view.convection", "Convection coefficient"));
                ui.radio_value(&mut view, SecondaryView::CriticalThickness, txt("gui.chart.view.critical", "Critical thickness"));
                ui.radio_value(&mut view, SecondaryView::None, txt("gui.chart.view.none", "None"));
            });
            if view != current {
                self.controller.set_secondary_view(view);
            }
        }
    }

    fn ui_chart(&self, ui: &mut egui::Ui) {
        let Some(chart) = self.controller.chart() else {
            ui.centered_and_justified(|ui| {
                ui.label(self.txt(
                    "gui.chart.empty",
                    "Choose a variable and range, then press Plot.",
                ));
            });
            return;
        };
        ui.vertical_centered(|ui| ui.strong(&chart.title));
        show_chart(ui, chart);
    }

    fn ui_status(&self, ui: &mut egui::Ui) {
        let text = match (self.controller.phase(), self.controller.status()) {
            (SweepPhase::Fetching, _) => self.txt("gui.status.fetching", "Requesting the solver..."),
            (_, Some(SweepStatus::Rendered { points })) => {
                format!("{} {points}", self.txt("gui.status.points", "Points:"))
            }
            (_, Some(SweepStatus::Failed(e))) => {
                format!("{} {e}", self.txt("gui.status.error", "Error:"))
            }
            _ => self.txt("gui.status.idle", "Ready"),
        };
        ui.horizontal(|ui| {
            ui.label(text);
            if let Some(note) = &self.note {
                ui.separator();
                ui.small(note);
            }
        });
    }
}

fn chart_labels(tr: &i18n::Translator) -> ChartLabels {
    let d = ChartLabels::default();
    ChartLabels {
        title: tr.text("gui.chart.title", &d.title),
        primary: tr.text("gui.chart.primary", &d.primary),
        convection: tr.text("gui.chart.convection", &d.convection),
        critical: tr.text("gui.chart.critical", &d.critical),
    }
}

fn geometry_label<F: Fn(&str, &str) -> String>(g: GeometryKind, txt: &F) -> String {
    match g {
        GeometryKind::Plane => txt("gui.geometry.plane", "Plane wall"),
        GeometryKind::Cylinder => txt("gui.geometry.cylinder", "Cylinder (pipe)"),
        GeometryKind::Sphere => txt("gui.geometry.sphere", "Sphere"),
    }
}

fn environment_label<F: Fn(&str, &str) -> String>(e: Environment, txt: &F) -> String {
    match e {
        Environment::Interior => txt("gui.environment.interior", "Indoor"),
        Environment::Exterior => txt("gui.environment.exterior", "Outdoor"),
    }
}

fn orientation_label<F: Fn(&str, &str) -> String>(o: Orientation, txt: &F) -> String {
    match o {
        Orientation::Horizontal => txt("gui.orientation.horizontal", "Horizontal"),
        Orientation::Vertical => txt("gui.orientation.vertical", "Vertical"),
    }
}

fn policy_label<F: Fn(&str, &str) -> String>(p: AxisSyncPolicy, txt: &F) -> String {
    match p {
        AxisSyncPolicy::CriticalOnly => txt("gui.settings.sync_critical_only", "Critical thickness only"),
        AxisSyncPolicy::Always => txt("gui.settings.sync_always", "Always"),
        AxisSyncPolicy::Never => txt("gui.settings.sync_never", "Never"),
    }
}

fn drag_speed(variable: SweepVariable) -> f64 {
    let (min, max, _) = variable.default_range();
    ((max - min) / 500.0).max(0.0001)
}

fn format_tick(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}")
}

fn add_dataset(plot_ui: &mut egui_plot::PlotUi, data: &Dataset, map: Option<AxisMap>, color: egui::Color32) {
    for (i, segment) in data.segments().into_iter().enumerate() {
        let points: Vec<[f64; 2]> = segment
            .into_iter()
            .map(|[x, y]| [x, map.map_or(y, |m| m.apply(y))])
            .collect();
        // 범례 항목이 계열당 하나만 생기도록 첫 구간에만 이름을 붙인다.
        let name = if i == 0 { data.label.as_str() } else { "" };
        plot_ui.points(Points::new(points.clone()).radius(2.5).color(color));
        plot_ui.line(Line::new(points).color(color).width(2.0).name(name));
    }
}

/// 차트 모델을 egui_plot으로 그린다. 보조 계열은 오른쪽 축 눈금을 따로 단다.
fn show_chart(ui: &mut egui::Ui, chart: &ChartModel) {
    let primary_decimals = chart.primary_axis.decimals;
    let mut y_axes = vec![AxisHints::new_y()
        .label(chart.primary_axis.title.clone())
        .formatter(move |mark: GridMark, _chars: usize, _range: &RangeInclusive<f64>| {
            format_tick(mark.value, primary_decimals)
        })];

    let map = chart.axis_map();
    if let (Some(axis), Some(map)) = (chart.secondary_axis.as_ref(), map) {
        let decimals = axis.decimals;
        y_axes.push(
            AxisHints::new_y()
                .label(axis.title.clone())
                .placement(HPlacement::Right)
                .formatter(move |mark: GridMark, _chars: usize, _range: &RangeInclusive<f64>| {
                    format_tick(map.invert(mark.value), decimals)
                }),
        );
    }

    let mut plot = Plot::new("sweep_chart")
        .legend(Legend::default())
        .x_axis_label(chart.x_title.clone())
        .custom_y_axes(y_axes);
    if let Some(range) = chart.primary_axis.range {
        plot = plot.include_y(range.min).include_y(range.max);
    }

    let primary_color = egui::Color32::from_rgb(31, 119, 180);
    let secondary_color = egui::Color32::from_rgb(214, 39, 40);
    plot.show(ui, |plot_ui| {
        add_dataset(plot_ui, &chart.primary, None, primary_color);
        if let Some(secondary) = &chart.secondary {
            add_dataset(plot_ui, secondary, map, secondary_color);
        }
    });
}

impl App for GuiApp {
    fn update(&mut self, ctx: &egui::Context, frame: &mut Frame) {
        let mut style = (*ctx.style()).clone();
        style.interaction.selectable_labels = false;
        style.visuals.window_fill = style.visuals.window_fill.linear_multiply(self.window_alpha);
        style.visuals.panel_fill = style.visuals.panel_fill.linear_multiply(self.window_alpha);
        ctx.set_style(style);

        self.controller.poll();
        self.poll_point();
        self.poll_dialogs();
        if self.catalog_dirty {
            if let Some(storage) = frame.storage_mut() {
                if let Err(e) = self.catalog.persist(storage) {
                    self.note = Some(e.to_string());
                }
            }
            self.catalog_dirty = false;
        }

        let tr = self.tr.clone();
        let txt = move |key: &str, default: &str| tr.text(key, default);

        // 상단 바
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(txt("gui.app_title", "Insulation Thickness Toolbox"));
                ui.separator();
                if ui.button(txt("gui.settings.title", "Settings")).clicked() {
                    self.show_settings_modal = true;
                }
            });
        });

        // 설정 모달
        if self.show_settings_modal {
            let mut policy = self.controller.policy();
            let mut save_clicked = false;
            egui::Window::new(txt("gui.settings.title", "Settings"))
                .collapsible(false)
                .resizable(true)
                .open(&mut self.show_settings_modal)
                .show(ctx, |ui| {
                    ui.label(txt("gui.settings.lang", "Language"));
                    egui::ComboBox::from_id_source("lang_choice")
                        .selected_text(&self.lang_input)
                        .show_ui(ui, |ui| {
                            ui.selectable_value(&mut self.lang_input, "auto".into(), txt("gui.settings.lang_auto", "System"));
                            ui.selectable_value(&mut self.lang_input, "en-us".into(), "English (US)");
                            ui.selectable_value(&mut self.lang_input, "ko-kr".into(), "한국어");
                        });
                    ui.separator();
                    ui.label(txt("gui.settings.api_base", "Solver server address"));
                    ui.text_edit_singleline(&mut self.api_base_input);
                    ui.separator();
                    ui.label(txt("gui.settings.sync", "Axis synchronization"));
                    for p in AxisSyncPolicy::ALL {
                        ui.radio_value(&mut policy, p, policy_label(p, &txt));
                    }
                    ui.separator();
                    ui.label(txt("gui.settings.alpha", "Window transparency"));
                    ui.add(egui::Slider::new(&mut self.window_alpha, 0.3..=1.0).text("alpha"));
                    ui.separator();
                    if ui.button(txt("gui.settings.save", "Save settings")).clicked() {
                        save_clicked = true;
                    }
                    if let Some(msg) = &self.settings_status {
                        ui.label(msg);
                    }
                });
            if policy != self.controller.policy() {
                self.controller.set_policy(policy);
            }
            if save_clicked {
                self.apply_settings();
            }
        }

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.ui_status(ui);
        });

        egui::SidePanel::left("form")
            .resizable(true)
            .min_width(260.0)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.ui_params(ui);
                    ui.separator();
                    self.ui_point(ui);
                    ui.separator();
                    self.ui_catalog(ui);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.ui_sweep_controls(ui, ctx);
            ui.separator();
            self.ui_chart(ui);
        });

        self.dialogs.show(ctx, &self.tr);

        if self.controller.is_busy() || self.point_task.is_some() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        if let Err(e) = self.catalog.persist(storage) {
            tracing::warn!(error = %e, "종료 시 카탈로그 저장 실패");
        }
    }
}
