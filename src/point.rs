//! 단일 지점 최적 두께 계산.
//!
//! 폼의 현재 값 그대로 원격 솔버의 `solve_equation`을 한 번 호출해 최적 두께 `e`를
//! 구한다. 반환된 대류 계수(없으면 사용자가 입력한 h)로 그 지점의 임계 반경도 함께 낸다.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::params::ParameterSet;
use crate::sweep::{critical_value, GeometryKind, SweepError};

/// 솔버가 풀어야 할 미지수(보온 두께).
pub const SOLVE_VARIABLE: &str = "e";

/// 연간 운전 시간의 상한 [h].
pub const HOURS_PER_YEAR: f64 = 8760.0;

/// 원격 솔버로 보내는 단일 지점 요청.
#[derive(Debug, Clone, PartialEq)]
pub struct PointRequest {
    pub geometry: GeometryKind,
    pub known_values: BTreeMap<String, Value>,
    pub flow_type: String,
    pub orientation: String,
    /// 임계 반경 계산용 열전도율
    pub conductivity: f64,
    /// 사용자가 직접 입력한 대류 계수. 솔버가 h를 돌려주지 않을 때 쓴다.
    pub user_convection: Option<f64>,
}

/// 솔버 응답(와이어 형식).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PointResponse {
    /// 숫자 또는 숫자 문자열(기호 해)
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 화면/터미널에 보여줄 단일 지점 결과.
#[derive(Debug, Clone, PartialEq)]
pub struct PointResult {
    pub thickness: Option<f64>,
    pub convection: Option<f64>,
    pub iterations: Option<u32>,
    /// `None`이면 k나 h가 유효하지 않은 경우
    pub critical: Option<f64>,
}

impl PointResult {
    /// 응답을 해석한다. `error` 필드가 있으면 서버 거부로 본다.
    pub fn from_response(
        response: PointResponse,
        request: &PointRequest,
    ) -> Result<Self, SweepError> {
        if let Some(msg) = response.error {
            return Err(SweepError::ServerRejection(msg));
        }
        let thickness = response.result.as_ref().and_then(number);
        let h_for_critical = response
            .h
            .or(request.user_convection)
            .unwrap_or(0.0);
        Ok(Self {
            thickness,
            convection: response.h.filter(|h| h.is_finite() && *h != 0.0),
            iterations: response.iterations.filter(|n| *n > 0),
            critical: critical_value(request.geometry, request.conductivity, h_for_critical),
        })
    }

    /// 소수 4자리, 값이 없으면 `N/A`.
    pub fn thickness_text(&self) -> String {
        self.thickness
            .map_or_else(|| "N/A".to_string(), |e| format!("{e:.4}"))
    }

    /// 소수 2자리, 값이 없으면 `-`.
    pub fn convection_text(&self) -> String {
        self.convection
            .map_or_else(|| "-".to_string(), |h| format!("{h:.2}"))
    }

    pub fn critical_text(&self, invalid: &str) -> String {
        self.critical
            .map_or_else(|| invalid.to_string(), |rc| format!("{rc:.4}"))
    }
}

fn number(v: &Value) -> Option<f64> {
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn invalid(msg: &str) -> SweepError {
    SweepError::InputValidation(msg.to_string())
}

/// 폼 값을 검증하고 단일 지점 요청을 만든다. 실패하면 서버로 보내지 않는다.
pub fn build_point_request(params: &ParameterSet) -> Result<PointRequest, SweepError> {
    let (geometry, environment, orientation) =
        match (params.geometry, params.environment, params.orientation) {
            (Some(g), Some(e), Some(o)) => (g, e, o),
            _ => return Err(invalid("필수 항목(계산 형상, 환경, 방향)을 모두 선택하세요.")),
        };
    let p = params;
    let checks = [
        (p.life_years < 1.0, "수명은 1년 이상이어야 합니다."),
        (p.fuel_price <= 0.0, "연료 단가는 0보다 커야 합니다."),
        (
            p.operating_hours <= 0.0 || p.operating_hours > HOURS_PER_YEAR,
            "연간 운전 시간은 0보다 크고 8760 이하여야 합니다.",
        ),
        (p.insulation_cost <= 0.0, "보온재 체적 단가는 0보다 커야 합니다."),
        (p.conductivity <= 0.0, "열전도율은 0보다 커야 합니다."),
        (
            p.ambient_temp_c >= p.surface_temp_c,
            "주위 온도는 표면 온도보다 낮아야 합니다.",
        ),
        (
            p.internal_temp_c <= p.surface_temp_c,
            "최고 내부 온도는 표면 온도보다 높아야 합니다.",
        ),
        (p.wind_speed < 0.0, "풍속은 0 이상이어야 합니다."),
        (
            p.efficiency_pct <= 0.0 || p.efficiency_pct > 100.0,
            "효율은 0%보다 크고 100% 이하여야 합니다.",
        ),
        (p.diameter <= 0.0, "직경 또는 벽 높이는 0보다 커야 합니다."),
        (
            p.convection.is_some_and(|h| h <= 0.0),
            "대류 계수(h)를 입력했다면 0보다 커야 합니다.",
        ),
    ];
    if let Some((_, msg)) = checks.iter().find(|(failed, _)| *failed) {
        return Err(invalid(msg));
    }

    Ok(PointRequest {
        geometry,
        known_values: params.known_values(),
        flow_type: environment.key().to_string(),
        orientation: orientation.key().to_string(),
        conductivity: params.conductivity,
        user_convection: params.convection,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{Environment, Orientation};

    fn params() -> ParameterSet {
        ParameterSet {
            geometry: Some(GeometryKind::Sphere),
            environment: Some(Environment::Interior),
            orientation: Some(Orientation::Vertical),
            ..ParameterSet::default()
        }
    }

    #[test]
    fn defaults_build_a_request() {
        let req = build_point_request(&params()).expect("valid");
        assert_eq!(req.geometry, GeometryKind::Sphere);
        assert_eq!(req.flow_type, "interior");
        assert_eq!(req.orientation, "vertical");
        assert_eq!(req.known_values["eta"], Value::from(0.85));
        assert_eq!(req.user_convection, None);
    }

    #[test]
    fn each_bound_is_checked() {
        let cases: [fn(&mut ParameterSet); 12] = [
            |p| p.geometry = None,
            |p| p.life_years = 0.5,
            |p| p.fuel_price = 0.0,
            |p| p.operating_hours = 8761.0,
            |p| p.insulation_cost = -1.0,
            |p| p.conductivity = 0.0,
            |p| p.ambient_temp_c = p.surface_temp_c,
            |p| p.internal_temp_c = p.surface_temp_c,
            |p| p.wind_speed = -0.1,
            |p| p.efficiency_pct = 120.0,
            |p| p.diameter = 0.0,
            |p| p.convection = Some(0.0),
        ];
        for (i, mutate) in cases.into_iter().enumerate() {
            let mut p = params();
            mutate(&mut p);
            assert!(
                matches!(build_point_request(&p), Err(SweepError::InputValidation(_))),
                "case {i}"
            );
        }
    }

    #[test]
    fn critical_radius_prefers_returned_h() {
        let req = build_point_request(&ParameterSet {
            convection: Some(20.0),
            ..params()
        })
        .expect("valid");
        let resp: PointResponse =
            serde_json::from_str(r#"{"result": 0.04567891, "h": 9.8, "iterations": 12}"#)
                .expect("json");
        let r = PointResult::from_response(resp, &req).expect("ok");
        assert_eq!(r.thickness_text(), "0.0457");
        assert_eq!(r.convection_text(), "9.80");
        assert_eq!(r.iterations, Some(12));
        assert!((r.critical.expect("rc") - 2.0 * 0.049 / 9.8).abs() < 1e-12);

        let fallback = PointResult::from_response(
            PointResponse {
                result: Some(Value::from(0.03)),
                ..PointResponse::default()
            },
            &req,
        )
        .expect("ok");
        assert_eq!(fallback.convection_text(), "-");
        assert!((fallback.critical.expect("rc") - 2.0 * 0.049 / 20.0).abs() < 1e-12);
    }

    #[test]
    fn missing_h_leaves_critical_unavailable() {
        let req = build_point_request(&params()).expect("valid");
        let r = PointResult::from_response(
            PointResponse {
                result: Some(Value::from("0.0312")),
                ..PointResponse::default()
            },
            &req,
        )
        .expect("ok");
        assert_eq!(r.thickness, Some(0.0312));
        assert_eq!(r.iterations, None);
        assert_eq!(r.critical_text("check k,h"), "check k,h");
    }

    #[test]
    fn absent_result_is_not_available() {
        let req = build_point_request(&params()).expect("valid");
        let r = PointResult::from_response(PointResponse::default(), &req).expect("ok");
        assert_eq!(r.thickness_text(), "N/A");
    }

    #[test]
    fn error_field_is_server_rejection() {
        let req = build_point_request(&params()).expect("valid");
        let resp: PointResponse =
            serde_json::from_str(r#"{"error": "Ecuación no encontrada"}"#).expect("json");
        assert_eq!(
            PointResult::from_response(resp, &req),
            Err(SweepError::ServerRejection("Ecuación no encontrada".into()))
        );
    }
}
