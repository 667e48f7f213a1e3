use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use insulation_thickness_toolbox::{
    app::{self, AppError, OutputFormat, PointArgs, SweepArgs},
    config,
    export::ExportFormat,
    i18n,
    params::{Environment, Orientation, SweepVariable},
    solver::HttpSolver,
};

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum EnvironmentArg {
    Interior,
    Exterior,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OrientationArg {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum FormatArg {
    /// 터미널 표
    Table,
    Json,
    Csv,
}

/// 계산 형상과 파라미터 입력. 스윕과 단일 지점 계산이 같이 쓴다.
#[derive(Args, Debug, Clone)]
struct FormArgs {
    /// 계산 형상 (plane/cylinder/sphere 또는 방정식 키)
    #[arg(long, default_value = "cylinder")]
    geometry: String,

    #[arg(long, value_enum, default_value_t = EnvironmentArg::Interior)]
    environment: EnvironmentArg,

    #[arg(long, value_enum, default_value_t = OrientationArg::Horizontal)]
    orientation: OrientationArg,

    /// 파라미터 덮어쓰기 (예: --set k=0.04). 여러 번 쓸 수 있다.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 현재 파라미터로 최적 두께 한 지점을 계산한다
    Point(FormArgs),
}

/// 보온재 경제적 두께 스윕을 헤드리스로 실행한다.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Economic insulation thickness sweep CLI",
    long_about = None,
    args_conflicts_with_subcommands = true,
    subcommand_negates_reqs = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// 스윕 변수 식별자 (Ta, Te, Ti, v, k, diametro, C, w, beta, vida_util, eta)
    #[arg(long, value_parser = parse_variable, required = true)]
    variable: Option<SweepVariable>,

    /// 최소값 (생략 시 변수 기본 범위)
    #[arg(long)]
    min: Option<f64>,

    #[arg(long)]
    max: Option<f64>,

    #[arg(long)]
    step: Option<f64>,

    #[command(flatten)]
    form: FormArgs,

    #[arg(long, value_enum, default_value_t = FormatArg::Table)]
    format: FormatArg,

    /// 저장 경로 (json/csv). 생략 시 sweep_<변수>.<확장자>
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// 언어 (auto/ko-kr/en-us)
    #[arg(short = 'L', long = "lang", default_value = "auto", global = true)]
    lang: String,

    /// 솔버 서버 주소. 설정 파일 값을 덮어쓴다.
    #[arg(long, global = true)]
    api_base: Option<String>,
}

fn parse_variable(s: &str) -> Result<SweepVariable, String> {
    SweepVariable::from_id(s).ok_or_else(|| {
        let ids: Vec<&str> = SweepVariable::ALL.iter().map(|v| v.id()).collect();
        format!("알 수 없는 변수 '{s}'. 가능한 값: {}", ids.join(", "))
    })
}

impl FormArgs {
    fn environment(&self) -> Environment {
        match self.environment {
            EnvironmentArg::Interior => Environment::Interior,
            EnvironmentArg::Exterior => Environment::Exterior,
        }
    }

    fn orientation(&self) -> Orientation {
        match self.orientation {
            OrientationArg::Horizontal => Orientation::Horizontal,
            OrientationArg::Vertical => Orientation::Vertical,
        }
    }

    fn point_args(&self) -> PointArgs {
        PointArgs {
            geometry: self.geometry.clone(),
            environment: self.environment(),
            orientation: self.orientation(),
            overrides: self.overrides.clone(),
        }
    }
}

impl Cli {
    fn sweep_args(&self) -> Result<SweepArgs, AppError> {
        let variable = self
            .variable
            .ok_or_else(|| AppError::Usage("--variable 인자가 필요합니다".into()))?;
        Ok(SweepArgs {
            variable,
            min: self.min,
            max: self.max,
            step: self.step,
            geometry: self.form.geometry.clone(),
            environment: self.form.environment(),
            orientation: self.form.orientation(),
            overrides: self.form.overrides.clone(),
            format: match self.format {
                FormatArg::Table => OutputFormat::Table,
                FormatArg::Json => OutputFormat::File(ExportFormat::Json),
                FormatArg::Csv => OutputFormat::File(ExportFormat::Csv),
            },
            out: self.out.clone(),
        })
    }
}

/// 프로그램의 엔트리 포인트. 설정을 로드한 뒤 스윕(또는 단일 지점 계산)을 한 번 실행한다.
fn main() {
    app::init_logging("info");
    let cli = Cli::parse();
    if let Err(err) = try_run(&cli) {
        eprintln!("오류: {err}");
        std::process::exit(1);
    }
}

fn try_run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut cfg = config::load_or_default()?;
    if let Some(base) = &cli.api_base {
        cfg.api_base = base.clone();
    }
    let lang = i18n::resolve_language(&cli.lang, Some(cfg.language.as_str()));
    let tr = i18n::Translator::new_with_pack(&lang, cfg.language_pack_dir.as_deref());
    let solver = HttpSolver::from_config(&cfg);
    match &cli.command {
        Some(Command::Point(form)) => {
            tracing::debug!(endpoint = solver.point_endpoint(), "솔버 엔드포인트");
            app::run_point(&tr, &form.point_args(), &solver)?;
        }
        None => {
            tracing::debug!(endpoint = solver.endpoint(), "솔버 엔드포인트");
            app::run(&cfg, &tr, &cli.sweep_args()?, &solver)?;
        }
    }
    Ok(())
}
