use std::collections::HashMap;
use std::fs;
use std::path::Path;
use sys_locale::get_locale;

/// CLI 출력에 쓰는 문자열 키.
pub mod keys {
    pub const CLI_HEADING: &str = "cli.heading";
    pub const CLI_REQUEST: &str = "cli.request";
    pub const CLI_POINTS: &str = "cli.points";
    pub const CLI_SAVED: &str = "cli.saved";
    pub const CLI_NO_CONVECTION: &str = "cli.no_convection";
    pub const CLI_GAP_NOTE: &str = "cli.gap_note";
    pub const CLI_POINT_HEADING: &str = "cli.point.heading";
    pub const CLI_POINT_THICKNESS: &str = "cli.point.thickness";
    pub const CLI_POINT_CONVECTION: &str = "cli.point.convection";
    pub const CLI_POINT_CRITICAL: &str = "cli.point.critical";
    pub const CLI_POINT_CHECK_KH: &str = "cli.point.check_kh";
    pub const CLI_POINT_ITERATIONS: &str = "cli.point.iterations";
    pub const CLI_POINT_SYMBOLIC: &str = "cli.point.symbolic";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Ko,
    En,
}

impl Language {
    fn from_code(code: &str) -> Self {
        let c = code.to_lowercase();
        if c.starts_with("en") {
            Language::En
        } else {
            Language::Ko
        }
    }
}

/// 런타임 언어 번들을 제공한다.
#[derive(Debug, Clone)]
pub struct Translator {
    lang: Language,
    overrides: Option<HashMap<String, String>>,
}

impl Translator {
    /// 언어 코드(ko/en)에 따라 번역기를 생성한다. 알 수 없는 코드는 ko로 폴백한다.
    pub fn new(lang_code: &str) -> Self {
        Self {
            lang: Language::from_code(lang_code),
            overrides: None,
        }
    }

    /// 언어 코드 + 언어팩 디렉터리(locales/ 등)를 받아서 번역기를 생성한다.
    /// 디렉터리가 없거나 파일이 없으면 내장 문자열만 사용한다.
    pub fn new_with_pack(lang_code: &str, pack_dir: Option<&str>) -> Self {
        let overrides = pack_dir
            .and_then(|dir| load_overrides(dir, lang_code))
            .or_else(|| load_overrides("locales", lang_code))
            .or_else(|| built_in_pack(lang_code));
        Self {
            lang: Language::from_code(lang_code),
            overrides,
        }
    }

    /// 키를 조회해 문자열을 반환한다. 언어팩에 없으면 None.
    pub fn lookup(&self, key: &str) -> Option<String> {
        self.overrides
            .as_ref()
            .and_then(|m| m.get(key).cloned())
    }

    /// 언어팩에 있으면 그 값을, 없으면 주어진 기본 문구를 돌려준다.
    pub fn text(&self, key: &str, default: &str) -> String {
        self.lookup(key).unwrap_or_else(|| default.to_string())
    }

    /// CLI 문자열. 언어팩 → 내장 문자열 순으로 찾는다.
    pub fn t(&self, key: &str) -> String {
        if let Some(v) = self.lookup(key) {
            return v;
        }
        let s = match self.lang {
            Language::En => en(key).unwrap_or_else(|| ko(key)),
            Language::Ko => ko(key),
        };
        s.to_string()
    }
}

/// CLI 플래그/설정/시스템 순으로 언어 코드를 결정한다.
pub fn resolve_language(cli_arg: &str, config_lang: Option<&str>) -> String {
    normalize_lang(cli_arg)
        .or_else(|| config_lang.and_then(normalize_lang))
        .or_else(detect_system_language)
        .unwrap_or_else(|| "en-us".to_string())
}

fn normalize_lang(code: &str) -> Option<String> {
    let c = code.trim().to_lowercase();
    match c.as_str() {
        "ko" | "ko-kr" => Some("ko-kr".into()),
        "en" | "en-us" | "en-uk" | "en-gb" => Some("en-us".into()),
        "auto" | "" => None,
        other if other.starts_with("ko") => Some("ko-kr".into()),
        other if other.starts_with("en") => Some("en-us".into()),
        _ => None,
    }
}

fn normalize_locale_string(loc: &str) -> Option<String> {
    let lang = loc
        .split(['.', '_', '-'])
        .next()
        .unwrap_or_default()
        .to_lowercase();
    match lang.as_str() {
        "ko" => Some("ko-kr".into()),
        "en" => Some("en-us".into()),
        _ => None,
    }
}

/// 시스템 로케일에서 언어를 추정한다.
pub fn detect_system_language() -> Option<String> {
    if let Some(code) = get_locale().as_deref().and_then(normalize_locale_string) {
        return Some(code);
    }
    ["LC_ALL", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find_map(|v| normalize_locale_string(&v))
}

/// TOML 기반 언어팩을 로드한다. 형식: key = "value" 로 구성된 플랫 맵(테이블은 점으로 연결).
fn load_overrides(dir: &str, lang: &str) -> Option<HashMap<String, String>> {
    let try_load = |code: &str| -> Option<HashMap<String, String>> {
        let path = Path::new(dir).join(format!("{code}.toml"));
        let content = fs::read_to_string(path).ok()?;
        parse_toml_to_map(&content)
    };

    if let Some(map) = try_load(lang) {
        return Some(map);
    }
    let (base, _) = lang.split_once(['-', '_'])?;
    try_load(base)
}

fn parse_toml_to_map(src: &str) -> Option<HashMap<String, String>> {
    let value: toml::Value = match toml::from_str(src) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "언어팩 파싱 실패");
            return None;
        }
    };
    let table = value.as_table()?;
    let mut map = HashMap::new();

    fn walk(prefix: &str, val: &toml::Value, out: &mut HashMap<String, String>) {
        match val {
            toml::Value::String(s) => {
                out.insert(prefix.to_string(), s.to_string());
            }
            toml::Value::Table(t) => {
                for (k, v) in t {
                    let key = if prefix.is_empty() {
                        k.clone()
                    } else {
                        format!("{prefix}.{k}")
                    };
                    walk(&key, v, out);
                }
            }
            _ => {}
        }
    }

    for (k, v) in table {
        walk(k, v, &mut map);
    }

    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}

/// 내장 언어팩(파일이 없어도 동작하도록 빌드 시 포함).
fn built_in_pack(lang: &str) -> Option<HashMap<String, String>> {
    match lang.to_lowercase().as_str() {
        "en-us" | "en" => parse_toml_to_map(include_str!("../locales/en-us.toml")),
        "ko-kr" | "ko" => parse_toml_to_map(include_str!("../locales/ko-kr.toml")),
        _ => None,
    }
}

fn ko(key: &str) -> &'static str {
    use keys::*;
    match key {
        CLI_HEADING => "=== 보온재 경제적 두께 스윕 ===",
        CLI_REQUEST => "스윕 변수:",
        CLI_POINTS => "계산 지점 수:",
        CLI_SAVED => "저장 완료:",
        CLI_NO_CONVECTION => "솔버가 대류 계수를 반환하지 않아 임계 두께를 계산할 수 없습니다.",
        CLI_GAP_NOTE => "'-' 표시는 해당 지점의 값이 없음을 뜻합니다.",
        CLI_POINT_HEADING => "=== 보온재 경제적 두께 (단일 지점) ===",
        CLI_POINT_THICKNESS => "최적 두께 e (m):",
        CLI_POINT_CONVECTION => "대류 계수 h (W/m²·K):",
        CLI_POINT_CRITICAL => "임계 반경 (m):",
        CLI_POINT_CHECK_KH => "k, h 확인 필요",
        CLI_POINT_ITERATIONS => "계산 완료. 반복 횟수:",
        CLI_POINT_SYMBOLIC => "계산 완료 (기호 해)",
        _ => "[missing translation]",
    }
}

fn en(key: &str) -> Option<&'static str> {
    use keys::*;
    Some(match key {
        CLI_HEADING => "=== Economic insulation thickness sweep ===",
        CLI_REQUEST => "Swept variable:",
        CLI_POINTS => "Points:",
        CLI_SAVED => "Saved:",
        CLI_NO_CONVECTION => {
            "The solver returned no convection coefficient; critical thickness is unavailable."
        }
        CLI_GAP_NOTE => "'-' marks points without a value.",
        CLI_POINT_HEADING => "=== Economic insulation thickness (single point) ===",
        CLI_POINT_THICKNESS => "Optimal thickness e (m):",
        CLI_POINT_CONVECTION => "Convection coefficient h (W/m²·K):",
        CLI_POINT_CRITICAL => "Critical radius (m):",
        CLI_POINT_CHECK_KH => "check k,h",
        CLI_POINT_ITERATIONS => "Calculated. Iterations:",
        CLI_POINT_SYMBOLIC => "Calculated (symbolic solution)",
        _ => return None,
    })
}
