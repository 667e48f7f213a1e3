//! 스윕 결과를 JSON/CSV로 내보낸다.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::dialog::DialogError;
use crate::params::SweepVariable;
use crate::sweep::SweepResult;

pub const THICKNESS_HEADER: &str = "Optimal thickness (m)";
pub const CONVECTION_HEADER: &str = "Convection coefficient (W/m²·K)";
pub const CRITICAL_HEADER: &str = "Critical thickness (m)";

/// 열별 소수 자릿수.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Precision {
    pub y: usize,
    pub h: usize,
    pub rc: usize,
}

impl Default for Precision {
    fn default() -> Self {
        Self { y: 4, h: 2, rc: 4 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 2] = [ExportFormat::Json, ExportFormat::Csv];

    pub fn ext(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv;charset=utf-8",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Json => "JSON",
            ExportFormat::Csv => "CSV",
        }
    }
}

/// 한 행. 열 순서는 삽입 순서를 따른다.
pub type ExportRow = Map<String, Value>;

/// 내보내기 오류.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("내보낼 데이터가 없습니다.")]
    NoData,
    #[error("파일 입출력 오류: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON 직렬화 오류: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV 작성 오류: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Dialog(#[from] DialogError),
}

fn fixed(v: Option<f64>, decimals: usize) -> Value {
    match v.filter(|v| v.is_finite()) {
        Some(v) => Value::String(format!("{v:.decimals$}")),
        None => Value::Null,
    }
}

/// 결과를 행 목록으로 바꾼다. 값이 없는 지점은 `null`로 명시한다.
pub fn to_rows(result: &SweepResult, x_label: &str, precision: Precision) -> Vec<ExportRow> {
    let x_label = if x_label.trim().is_empty() {
        "x"
    } else {
        x_label
    };
    (0..result.x.len())
        .map(|i| {
            let mut row = Map::new();
            row.insert(x_label.to_string(), Value::from(result.x[i]));
            row.insert(
                THICKNESS_HEADER.to_string(),
                fixed(result.y.get(i).copied().flatten(), precision.y),
            );
            if let Some(h) = &result.h_vals {
                row.insert(
                    CONVECTION_HEADER.to_string(),
                    fixed(h.get(i).copied().flatten(), precision.h),
                );
            }
            row.insert(
                CRITICAL_HEADER.to_string(),
                fixed(result.rc_vals.get(i).copied().flatten(), precision.rc),
            );
            row
        })
        .collect()
}

/// 들여쓰기된 JSON 배열.
pub fn to_json(rows: &[ExportRow]) -> Result<String, ExportError> {
    if rows.is_empty() {
        return Err(ExportError::NoData);
    }
    Ok(serde_json::to_string_pretty(rows)?)
}

fn cell(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.as_f64().map_or_else(|| n.to_string(), |f| f.to_string()),
        other => other.to_string(),
    }
}

/// 헤더 + 행, CRLF 줄바꿈. 쉼표/따옴표/개행이 든 필드만 따옴표로 감싼다.
pub fn to_csv(rows: &[ExportRow]) -> Result<String, ExportError> {
    let first = rows.first().ok_or(ExportError::NoData)?;
    let headers: Vec<&String> = first.keys().collect();
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());
    writer.write_record(headers.iter().map(|h| h.as_str()))?;
    for row in rows {
        writer.write_record(
            headers
                .iter()
                .map(|h| row.get(h.as_str()).map(cell).unwrap_or_default()),
        )?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// `sweep_<변수 id>.<확장자>`
pub fn export_file_name(variable: SweepVariable, format: ExportFormat) -> String {
    format!("sweep_{}.{}", variable.id(), format.ext())
}

/// 저장할 파일 내용.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPayload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

/// 결과를 선택한 형식으로 직렬화한다. 결과가 비어 있으면 `NoData`.
pub fn prepare_export(
    result: Option<&SweepResult>,
    variable: SweepVariable,
    x_label: &str,
    format: ExportFormat,
    precision: Precision,
) -> Result<ExportPayload, ExportError> {
    let result = result.filter(|r| !r.is_empty()).ok_or(ExportError::NoData)?;
    let rows = to_rows(result, x_label, precision);
    let text = match format {
        ExportFormat::Json => to_json(&rows)?,
        ExportFormat::Csv => to_csv(&rows)?,
    };
    tracing::info!(format = format.ext(), rows = rows.len(), "내보내기 데이터 준비");
    Ok(ExportPayload {
        file_name: export_file_name(variable, format),
        bytes: text.into_bytes(),
        mime: format.mime(),
    })
}

/// 바이트를 파일로 쓴다.
pub fn write_download(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    fs::write(path, bytes)?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "내보내기 파일 저장");
    Ok(())
}
