use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::export::Precision;
use crate::sweep::{AxisSyncPolicy, DEFAULT_MAX_ITERATIONS};

const CONFIG_FILE: &str = "config.toml";

/// 애플리케이션 설정을 표현한다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 솔버 서버 주소. `plot_espesor` 경로가 뒤에 붙는다.
    pub api_base: String,
    pub request_timeout_secs: u64,
    /// 스윕 한 번의 최대 반복 수((max-min)/step)
    pub max_iterations: u32,
    pub axis_sync: AxisSyncPolicy,
    pub export_precision: Precision,
    /// 언어 코드(auto/ko/en-us 등)
    pub language: String,
    /// 외부 언어팩 디렉터리. 비어 있으면 locales/ 또는 내장 팩을 쓴다.
    pub language_pack_dir: Option<String>,
    /// 창 불투명도 (0.3~1.0)
    pub window_alpha: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:5000/".into(),
            request_timeout_secs: 30,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            axis_sync: AxisSyncPolicy::default(),
            export_precision: Precision::default(),
            language: "auto".into(),
            language_pack_dir: None,
            window_alpha: 1.0,
        }
    }
}

/// 설정 로드/저장 시 발생 가능한 오류를 표현한다.
#[derive(Debug)]
pub enum ConfigError {
    /// 파일 입출력 오류
    Io(std::io::Error),
    /// TOML 역직렬화 오류
    Serde(toml::de::Error),
    /// TOML 직렬화 오류
    Serialize(toml::ser::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "파일 입출력 오류: {e}"),
            ConfigError::Serde(e) => write!(f, "설정 파싱 오류: {e}"),
            ConfigError::Serialize(e) => write!(f, "설정 직렬화 오류: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        ConfigError::Io(value)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        ConfigError::Serde(value)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(value: toml::ser::Error) -> Self {
        ConfigError::Serialize(value)
    }
}

/// config.toml을 로드하거나 없으면 기본 설정을 생성한다.
pub fn load_or_default() -> Result<Config, ConfigError> {
    load_from(Path::new(CONFIG_FILE))
}

/// 지정한 경로에서 설정을 읽는다. 파일이 없으면 기본값으로 새로 만든다.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    if path.exists() {
        let content = fs::read_to_string(path)?;
        let cfg: Config = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "설정 로드");
        Ok(cfg)
    } else {
        let cfg = Config::default();
        save_to(&cfg, path)?;
        tracing::info!(path = %path.display(), "기본 설정 파일 생성");
        Ok(cfg)
    }
}

fn save_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(cfg)?;
    fs::write(path, content)?;
    Ok(())
}

impl Config {
    /// 설정을 config.toml에 저장한다.
    pub fn save(&self) -> Result<(), ConfigError> {
        save_to(self, Path::new(CONFIG_FILE))
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        save_to(self, path)
    }
}
