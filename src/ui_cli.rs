use crate::app::AppError;
use crate::export::{Precision, CONVECTION_HEADER, CRITICAL_HEADER, THICKNESS_HEADER};
use crate::i18n::{keys, Translator};
use crate::point::PointResult;
use crate::sweep::SweepResult;

/// `key=value` 인자를 나눈다.
pub fn parse_override(item: &str) -> Result<(String, f64), AppError> {
    let (key, value) = item
        .split_once('=')
        .ok_or_else(|| AppError::Usage(format!("key=value 형식이 아닙니다: {item}")))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(AppError::Usage(format!("파라미터 이름이 비어 있습니다: {item}")));
    }
    let value = value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AppError::Usage(format!("숫자가 아닙니다: {item}")))?;
    Ok((key.to_string(), value))
}

fn cell(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(v) if v.is_finite() => format!("{v:.decimals$}"),
        _ => "-".to_string(),
    }
}

/// 결과 표의 행들을 만든다. 첫 행은 헤더.
pub fn table_rows(result: &SweepResult, x_label: &str, precision: Precision) -> Vec<Vec<String>> {
    let with_h = result.h_vals.is_some();
    let mut header = vec![x_label.to_string(), THICKNESS_HEADER.to_string()];
    if with_h {
        header.push(CONVECTION_HEADER.to_string());
    }
    header.push(CRITICAL_HEADER.to_string());

    let mut rows = vec![header];
    for i in 0..result.len() {
        let mut row = vec![
            format!("{}", result.x[i]),
            cell(result.y.get(i).copied().flatten(), precision.y),
        ];
        if let Some(h) = &result.h_vals {
            row.push(cell(h.get(i).copied().flatten(), precision.h));
        }
        row.push(cell(result.rc_vals.get(i).copied().flatten(), precision.rc));
        rows.push(row);
    }
    rows
}

/// 결과를 열 맞춤 표로 출력한다.
pub fn print_table(tr: &Translator, result: &SweepResult, x_label: &str, precision: Precision) {
    let rows = table_rows(result, x_label, precision);
    let columns = rows.first().map_or(0, Vec::len);
    let widths: Vec<usize> = (0..columns)
        .map(|c| {
            rows.iter()
                .map(|r| r[c].chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();
    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(v, &w)| format!("{v:>w$}"))
            .collect();
        println!("{}", line.join("  "));
    }
    println!("{} {}", tr.t(keys::CLI_POINTS), result.len());
    if !result.has_convection() {
        println!("{}", tr.t(keys::CLI_NO_CONVECTION));
    } else if result.rc_vals.iter().any(Option::is_none) || result.y.iter().any(Option::is_none) {
        println!("{}", tr.t(keys::CLI_GAP_NOTE));
    }
}

/// 단일 지점 결과 필드를 한 줄씩 출력한다.
pub fn print_point(tr: &Translator, result: &PointResult) {
    println!("{} {}", tr.t(keys::CLI_POINT_THICKNESS), result.thickness_text());
    println!("{} {}", tr.t(keys::CLI_POINT_CONVECTION), result.convection_text());
    println!(
        "{} {}",
        tr.t(keys::CLI_POINT_CRITICAL),
        result.critical_text(&tr.t(keys::CLI_POINT_CHECK_KH))
    );
    match result.iterations {
        Some(n) => println!("{} {n}", tr.t(keys::CLI_POINT_ITERATIONS)),
        None => println!("{}", tr.t(keys::CLI_POINT_SYMBOLIC)),
    }
}
