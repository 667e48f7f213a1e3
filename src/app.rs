use std::path::PathBuf;

use crate::config::{Config, ConfigError};
use crate::export::{self, ExportError, ExportFormat};
use crate::i18n::{keys, Translator};
use crate::params::{Environment, Orientation, ParameterSet, RangeInput, SweepVariable};
use crate::point;
use crate::solver::{self, SweepSolver};
use crate::sweep::{GeometryKind, InvalidGeometry, SweepController, SweepError, SweepStatus};
use crate::ui_cli;

/// 애플리케이션 실행 중 발생 가능한 오류를 표현한다.
#[derive(Debug)]
pub enum AppError {
    /// 파일 입출력 오류
    Io(std::io::Error),
    /// 설정 저장/로드 오류
    Config(ConfigError),
    /// 스윕 요청/응답 오류
    Sweep(SweepError),
    /// 내보내기 오류
    Export(ExportError),
    /// 잘못된 명령행 인자
    Usage(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Io(e) => write!(f, "입출력 오류: {e}"),
            AppError::Config(e) => write!(f, "설정 오류: {e}"),
            AppError::Sweep(e) => write!(f, "{e}"),
            AppError::Export(e) => write!(f, "내보내기 오류: {e}"),
            AppError::Usage(msg) => write!(f, "잘못된 인자: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        AppError::Io(value)
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        AppError::Config(value)
    }
}

impl From<SweepError> for AppError {
    fn from(value: SweepError) -> Self {
        AppError::Sweep(value)
    }
}

impl From<ExportError> for AppError {
    fn from(value: ExportError) -> Self {
        AppError::Export(value)
    }
}

impl From<InvalidGeometry> for AppError {
    fn from(value: InvalidGeometry) -> Self {
        AppError::Usage(value.to_string())
    }
}

/// tracing 구독자를 초기화한다. `RUST_LOG`가 있으면 그 값을 우선한다.
pub fn init_logging(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// CLI 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    File(ExportFormat),
}

/// 헤드리스 스윕 한 번의 입력.
#[derive(Debug, Clone)]
pub struct SweepArgs {
    pub variable: SweepVariable,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
    pub geometry: String,
    pub environment: Environment,
    pub orientation: Orientation,
    /// `key=value` 형태의 파라미터 덮어쓰기
    pub overrides: Vec<String>,
    pub format: OutputFormat,
    pub out: Option<PathBuf>,
}

/// 단일 지점 계산 한 번의 입력.
#[derive(Debug, Clone)]
pub struct PointArgs {
    pub geometry: String,
    pub environment: Environment,
    pub orientation: Orientation,
    pub overrides: Vec<String>,
}

fn form_params(
    geometry: &str,
    environment: Environment,
    orientation: Orientation,
    overrides: &[String],
) -> Result<ParameterSet, AppError> {
    let mut params = ParameterSet {
        geometry: Some(geometry.parse::<GeometryKind>()?),
        environment: Some(environment),
        orientation: Some(orientation),
        ..ParameterSet::default()
    };
    for item in overrides {
        let (key, value) = ui_cli::parse_override(item)?;
        if !params.set_by_id(&key, value) {
            return Err(AppError::Usage(format!("알 수 없는 파라미터: {key}")));
        }
    }
    Ok(params)
}

/// 인자를 파라미터 묶음과 범위로 바꾼다.
pub fn prepare(args: &SweepArgs) -> Result<(ParameterSet, RangeInput), AppError> {
    let params = form_params(
        &args.geometry,
        args.environment,
        args.orientation,
        &args.overrides,
    )?;
    let (dmin, dmax, dstep) = args.variable.default_range();
    let range = RangeInput::from_range(
        args.min.unwrap_or(dmin),
        args.max.unwrap_or(dmax),
        args.step.unwrap_or(dstep),
    );
    Ok((params, range))
}

/// 스윕을 한 번 실행하고 결과를 출력하거나 파일로 저장한다.
pub fn run(
    config: &Config,
    tr: &Translator,
    args: &SweepArgs,
    solver: &dyn SweepSolver,
) -> Result<(), AppError> {
    let (params, range) = prepare(args)?;
    let mut controller =
        SweepController::new(config.axis_sync, config.max_iterations, config.export_precision);
    let x_title = args.variable.legend();
    let ticket = controller.begin_sweep(&params, Some(args.variable), &range, x_title)?;
    println!("{}", tr.t(keys::CLI_HEADING));
    println!(
        "{} {} [{} .. {}, step {}]",
        tr.t(keys::CLI_REQUEST),
        x_title,
        ticket.request.range.min,
        ticket.request.range.max,
        ticket.request.range.step
    );

    controller.complete_sweep(solver::run_blocking(solver, &ticket));
    if let Some(SweepStatus::Failed(e)) = controller.status() {
        return Err(AppError::Sweep(e.clone()));
    }
    let Some(result) = controller.result() else {
        return Err(AppError::Export(ExportError::NoData));
    };

    match args.format {
        OutputFormat::Table => {
            ui_cli::print_table(tr, result, x_title, config.export_precision);
        }
        OutputFormat::File(format) => {
            let payload = controller.export_as(format)?;
            let path = args
                .out
                .clone()
                .unwrap_or_else(|| PathBuf::from(&payload.file_name));
            export::write_download(&path, &payload.bytes)?;
            println!("{} {}", tr.t(keys::CLI_SAVED), path.display());
        }
    }
    Ok(())
}

/// 현재 파라미터로 최적 두께 한 지점을 계산해 출력한다.
pub fn run_point(tr: &Translator, args: &PointArgs, solver: &dyn SweepSolver) -> Result<(), AppError> {
    let params = form_params(
        &args.geometry,
        args.environment,
        args.orientation,
        &args.overrides,
    )?;
    let request = point::build_point_request(&params)?;
    tracing::info!(geometry = %request.geometry, "단일 지점 계산");
    let result = solver::solve_point_blocking(solver, &request)?;
    println!("{}", tr.t(keys::CLI_POINT_HEADING));
    ui_cli::print_point(tr, &result);
    Ok(())
}
