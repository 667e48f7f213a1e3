//! 파라메트릭 스윕(한 변수를 범위로 변화시키며 최적 두께를 구하는 계산) 모듈 모음.
//!
//! 실제 방정식 풀이는 원격 솔버가 담당하고, 여기서는 요청 구성과 결과 보관,
//! 임계 두께 파생, 축 동기화, 차트 모델 구성을 다룬다.

pub mod axis;
pub mod chart;
pub mod controller;
pub mod critical;
pub mod store;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::params::{ParameterSet, RangeInput, SweepVariable};

pub use axis::{sync_range, AxisRange, AxisSyncPolicy};
pub use chart::ChartModel;
pub use controller::{ChartViewState, SweepController, SweepPhase, SweepStatus};
pub use critical::{critical_value, derive_critical};
pub use store::SeriesStore;

/// 스윕 한 번에 허용하는 기본 반복 상한.
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// 계산 형상(경제적 최적 두께 모드). 와이어 키는 솔버의 방정식 키와 같다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    #[serde(rename = "optimo_economico_plano")]
    Plane,
    #[serde(rename = "optimo_economico_cilindro")]
    Cylinder,
    #[serde(rename = "optimo_economico_esfera")]
    Sphere,
}

impl GeometryKind {
    pub const ALL: [GeometryKind; 3] = [
        GeometryKind::Plane,
        GeometryKind::Cylinder,
        GeometryKind::Sphere,
    ];

    /// 솔버에 전달하는 방정식 키.
    pub fn equation_key(&self) -> &'static str {
        match self {
            GeometryKind::Plane => "optimo_economico_plano",
            GeometryKind::Cylinder => "optimo_economico_cilindro",
            GeometryKind::Sphere => "optimo_economico_esfera",
        }
    }
}

/// 알 수 없는 형상 키. 호출 측 계약 위반으로 취급한다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("지원하지 않는 형상입니다: {0}")]
pub struct InvalidGeometry(pub String);

impl FromStr for GeometryKind {
    type Err = InvalidGeometry;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "optimo_economico_plano" | "plane" | "plano" => Ok(GeometryKind::Plane),
            "optimo_economico_cilindro" | "cylinder" | "cilindro" => Ok(GeometryKind::Cylinder),
            "optimo_economico_esfera" | "sphere" | "esfera" => Ok(GeometryKind::Sphere),
            _ => Err(InvalidGeometry(s.to_string())),
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.equation_key())
    }
}

/// 스윕 범위. `min < max`, `step > 0`은 [`build_request`]에서 보장한다.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl SweepRange {
    /// 범위/간격 비율(대략적인 반복 횟수).
    pub fn ratio(&self) -> f64 {
        (self.max - self.min) / self.step
    }
}

/// 원격 솔버로 보내는 스윕 요청.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepRequest {
    pub geometry: GeometryKind,
    pub variable: SweepVariable,
    pub known_values: BTreeMap<String, serde_json::Value>,
    pub range: SweepRange,
    pub flow_type: String,
    pub orientation: String,
    /// 변수가 열전도율이 아닐 때 임계 두께 계산에 쓰는 고정 열전도율.
    pub fixed_conductivity: f64,
}

/// 솔버 응답(와이어 형식). 필드 누락은 [`SweepResult::from_response`]에서 판정한다.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SweepResponse {
    #[serde(default)]
    pub x: Option<Vec<f64>>,
    #[serde(default)]
    pub y: Option<Vec<Option<f64>>>,
    #[serde(default, alias = "hVals", skip_serializing_if = "Option::is_none")]
    pub h_vals: Option<Vec<Option<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 한 번의 스윕 결과. `rc_vals`는 응답을 받을 때마다 새로 파생한다.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepResult {
    pub x: Vec<f64>,
    pub y: Vec<Option<f64>>,
    pub h_vals: Option<Vec<Option<f64>>>,
    pub rc_vals: Vec<Option<f64>>,
}

impl SweepResult {
    /// 응답을 검증하고 임계 두께 계열을 파생해 결과를 만든다.
    pub fn from_response(
        response: SweepResponse,
        request: &SweepRequest,
    ) -> Result<Self, SweepError> {
        if let Some(msg) = response.error {
            return Err(SweepError::ServerRejection(msg));
        }
        let (x, y) = match (response.x, response.y) {
            (Some(x), Some(y)) => (x, y),
            _ => {
                return Err(SweepError::MalformedResponse(
                    "x 또는 y 계열이 없습니다".into(),
                ))
            }
        };
        if x.len() != y.len() {
            return Err(SweepError::MalformedResponse(format!(
                "x({})와 y({})의 길이가 다릅니다",
                x.len(),
                y.len()
            )));
        }
        if let Some(h) = &response.h_vals {
            if h.len() != x.len() {
                return Err(SweepError::MalformedResponse(format!(
                    "h_vals({})와 x({})의 길이가 다릅니다",
                    h.len(),
                    x.len()
                )));
            }
        }
        let mut result = SweepResult {
            x,
            y,
            h_vals: response.h_vals,
            rc_vals: Vec::new(),
        };
        result.rc_vals = derive_critical(
            &result,
            request.geometry,
            request.variable,
            request.fixed_conductivity,
        );
        Ok(result)
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// 대류 계수 계열에 값이 하나라도 있는지.
    pub fn has_convection(&self) -> bool {
        self.h_vals
            .as_ref()
            .is_some_and(|h| h.iter().any(Option::is_some))
    }
}

/// 보조 축에 표시할 계열.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecondaryView {
    Convection,
    CriticalThickness,
    None,
}

/// 스윕 요청/응답 처리 중 발생 가능한 오류.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SweepError {
    /// 요청 전 로컬 검증 실패. 서버로 보내지 않는다.
    #[error("입력 오류: {0}")]
    InputValidation(String),
    /// 네트워크/엔드포인트 접근 실패. 상세 내용은 로그로만 남긴다.
    #[error("서버에 연결할 수 없습니다.")]
    TransportFailure(String),
    /// 서버가 명시적으로 거부한 경우. 메시지를 그대로 보여준다.
    #[error("{0}")]
    ServerRejection(String),
    /// 응답 형식이 계약과 다른 경우
    #[error("서버 응답 형식이 올바르지 않습니다: {0}")]
    MalformedResponse(String),
    /// 이미 요청이 진행 중인 경우
    #[error("이미 계산이 진행 중입니다.")]
    Busy,
}

/// 폼 값과 범위 입력을 검증하고 스윕 요청을 구성한다.
pub fn build_request(
    params: &ParameterSet,
    variable: Option<SweepVariable>,
    range: &RangeInput,
    max_iterations: u32,
) -> Result<SweepRequest, SweepError> {
    let variable = variable.ok_or_else(|| {
        SweepError::InputValidation("그래프로 그릴 변수를 선택하세요.".into())
    })?;
    let (geometry, environment, orientation) =
        match (params.geometry, params.environment, params.orientation) {
            (Some(g), Some(e), Some(o)) => (g, e, o),
            _ => {
                return Err(SweepError::InputValidation(
                    "필수 항목(계산 형상, 환경, 방향)을 모두 선택하세요.".into(),
                ))
            }
        };
    let range = range.parse().ok_or_else(|| {
        SweepError::InputValidation("최소/최대/간격 값은 숫자여야 합니다.".into())
    })?;
    if range.step <= 0.0 {
        return Err(SweepError::InputValidation(
            "간격은 0보다 커야 합니다.".into(),
        ));
    }
    if range.min >= range.max {
        return Err(SweepError::InputValidation(
            "최소값은 최대값보다 작아야 합니다.".into(),
        ));
    }
    if range.ratio() > f64::from(max_iterations) {
        return Err(SweepError::InputValidation(format!(
            "반복 횟수가 너무 많습니다(최대 {max_iterations}). 범위나 간격을 조정하세요."
        )));
    }

    Ok(SweepRequest {
        geometry,
        variable,
        known_values: params.known_values(),
        range,
        flow_type: environment.key().to_string(),
        orientation: orientation.key().to_string(),
        fixed_conductivity: params.conductivity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{Environment, Orientation};

    fn complete_params() -> ParameterSet {
        ParameterSet {
            geometry: Some(GeometryKind::Cylinder),
            environment: Some(Environment::Exterior),
            orientation: Some(Orientation::Horizontal),
            ..ParameterSet::default()
        }
    }

    fn range(min: &str, max: &str, step: &str) -> RangeInput {
        RangeInput {
            min: min.into(),
            max: max.into(),
            step: step.into(),
        }
    }

    #[test]
    fn geometry_parses_wire_keys_and_rejects_unknown() {
        assert_eq!(
            "optimo_economico_esfera".parse::<GeometryKind>(),
            Ok(GeometryKind::Sphere)
        );
        assert_eq!("cylinder".parse::<GeometryKind>(), Ok(GeometryKind::Cylinder));
        assert!("cono".parse::<GeometryKind>().is_err());
    }

    #[test]
    fn build_request_requires_variable() {
        let err = build_request(&complete_params(), None, &range("1", "2", "0.1"), 100)
            .unwrap_err();
        assert!(matches!(err, SweepError::InputValidation(_)));
    }

    #[test]
    fn build_request_requires_categorical_fields() {
        let mut params = complete_params();
        params.orientation = None;
        let err = build_request(
            &params,
            Some(SweepVariable::WindSpeed),
            &range("1", "2", "0.1"),
            100,
        )
        .unwrap_err();
        assert!(matches!(err, SweepError::InputValidation(_)));
    }

    #[test]
    fn build_request_validates_range() {
        let p = complete_params();
        let v = Some(SweepVariable::WindSpeed);
        for bad in [
            range("", "2", "0.1"),
            range("a", "2", "0.1"),
            range("1", "2", "0"),
            range("1", "2", "-1"),
            range("2", "2", "0.1"),
            range("3", "2", "0.1"),
            range("0", "1000", "1"),
        ] {
            assert!(
                matches!(build_request(&p, v, &bad, 100), Err(SweepError::InputValidation(_))),
                "{bad:?}"
            );
        }
        let ok = build_request(&p, v, &range("0.1", "10", "0.2"), 100).expect("valid");
        assert_eq!(ok.geometry, GeometryKind::Cylinder);
        assert_eq!(ok.flow_type, "exterior");
        assert_eq!(ok.orientation, "horizontal");
        assert_eq!(ok.range.step, 0.2);
    }

    #[test]
    fn iteration_cap_is_inclusive() {
        let p = complete_params();
        let req = build_request(&p, Some(SweepVariable::AmbientTemp), &range("0", "100", "1"), 100);
        assert!(req.is_ok());
    }

    #[test]
    fn every_default_range_fits_iteration_cap() {
        let p = complete_params();
        let rejected: Vec<&str> = SweepVariable::ALL
            .into_iter()
            .filter(|v| {
                build_request(&p, Some(*v), &RangeInput::for_variable(*v), DEFAULT_MAX_ITERATIONS)
                    .is_err()
            })
            .map(|v| v.id())
            .collect();
        assert!(rejected.is_empty(), "{rejected:?}");
    }

    #[test]
    fn response_without_y_is_malformed() {
        let req = build_request(
            &complete_params(),
            Some(SweepVariable::WindSpeed),
            &range("1", "2", "0.5"),
            100,
        )
        .expect("valid");
        let resp = SweepResponse {
            x: Some(vec![1.0, 1.5, 2.0]),
            ..SweepResponse::default()
        };
        assert!(matches!(
            SweepResult::from_response(resp, &req),
            Err(SweepError::MalformedResponse(_))
        ));
    }

    #[test]
    fn response_error_field_is_server_rejection() {
        let req = build_request(
            &complete_params(),
            Some(SweepVariable::WindSpeed),
            &range("1", "2", "0.5"),
            100,
        )
        .expect("valid");
        let resp: SweepResponse =
            serde_json::from_str(r#"{"error": "Ecuación no encontrada"}"#).expect("json");
        assert_eq!(
            SweepResult::from_response(resp, &req),
            Err(SweepError::ServerRejection("Ecuación no encontrada".into()))
        );
    }

    #[test]
    fn response_accepts_camel_case_h_vals_alias() {
        let resp: SweepResponse =
            serde_json::from_str(r#"{"x":[1,2],"y":[0.1,null],"hVals":[5.0,null]}"#)
                .expect("json");
        assert_eq!(resp.h_vals, Some(vec![Some(5.0), None]));
        assert_eq!(resp.y, Some(vec![Some(0.1), None]));
    }
}
