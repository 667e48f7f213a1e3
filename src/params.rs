//! 입력 폼의 파라미터 모델과 스윕 가능한 변수 정의.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::sweep::{GeometryKind, SweepRange};

/// 설치 환경(자연/강제 대류 선택용).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Interior,
    Exterior,
}

impl Environment {
    pub const ALL: [Environment; 2] = [Environment::Interior, Environment::Exterior];

    pub fn key(&self) -> &'static str {
        match self {
            Environment::Interior => "interior",
            Environment::Exterior => "exterior",
        }
    }
}

/// 형상의 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub const ALL: [Orientation; 2] = [Orientation::Horizontal, Orientation::Vertical];

    pub fn key(&self) -> &'static str {
        match self {
            Orientation::Horizontal => "horizontal",
            Orientation::Vertical => "vertical",
        }
    }
}

/// 계산에 쓰이는 파라미터 묶음. 카탈로그 저장 형식도 이 구조를 그대로 쓴다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSet {
    /// 수명 [년]
    #[serde(rename = "vida_util")]
    pub life_years: f64,
    /// 연료 단가 [$/kWh]
    #[serde(rename = "w")]
    pub fuel_price: f64,
    /// 연간 운전 시간 [h/년]
    #[serde(rename = "beta")]
    pub operating_hours: f64,
    /// 보온재 체적 단가 [$/m³]
    #[serde(rename = "C")]
    pub insulation_cost: f64,
    /// 열전도율 k [W/m·K]
    #[serde(rename = "k")]
    pub conductivity: f64,
    #[serde(rename = "Ta")]
    pub ambient_temp_c: f64,
    #[serde(rename = "Te")]
    pub surface_temp_c: f64,
    #[serde(rename = "Ti")]
    pub internal_temp_c: f64,
    /// 풍속 [m/s]
    #[serde(rename = "v")]
    pub wind_speed: f64,
    /// 열기관 효율 [%]
    #[serde(rename = "eta")]
    pub efficiency_pct: f64,
    /// 대류 계수 h [W/m²·K]. 비어 있으면 솔버가 계산한다.
    #[serde(rename = "h")]
    pub convection: Option<f64>,
    /// 배관 직경 또는 벽 높이 [m]
    #[serde(rename = "diametro")]
    pub diameter: f64,
    #[serde(rename = "ambiente")]
    pub environment: Option<Environment>,
    #[serde(rename = "tipo_calculo")]
    pub geometry: Option<GeometryKind>,
    #[serde(rename = "orientacion")]
    pub orientation: Option<Orientation>,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            life_years: 15.0,
            fuel_price: 0.04,
            operating_hours: 7968.0,
            insulation_cost: 2205.48,
            conductivity: 0.049,
            ambient_temp_c: 28.0,
            surface_temp_c: 50.0,
            internal_temp_c: 180.0,
            wind_speed: 2.1,
            efficiency_pct: 85.0,
            convection: None,
            diameter: 0.1016,
            environment: None,
            geometry: None,
            orientation: None,
        }
    }
}

impl ParameterSet {
    /// 솔버에 보낼 고정값 맵을 만든다.
    ///
    /// 효율은 분수로 환산하고, `H`는 직경을 그대로 복사한다. `h`는 양수일 때만 넣어
    /// 비어 있으면 솔버가 대류 계수를 직접 계산하도록 한다.
    pub fn known_values(&self) -> BTreeMap<String, Value> {
        let mut map = BTreeMap::new();
        let mut put = |k: &str, v: f64| {
            map.insert(k.to_string(), Value::from(v));
        };
        put("vida_util", self.life_years);
        put("w", self.fuel_price);
        put("beta", self.operating_hours);
        put("C", self.insulation_cost);
        put("k", self.conductivity);
        put("Ta", self.ambient_temp_c);
        put("Te", self.surface_temp_c);
        put("Ti", self.internal_temp_c);
        put("v", self.wind_speed);
        put("eta", self.efficiency_pct / 100.0);
        put("diametro", self.diameter);
        put("H", self.diameter);
        if let Some(h) = self.convection.filter(|h| *h > 0.0) {
            put("h", h);
        }
        if let Some(env) = self.environment {
            map.insert("flow_type".into(), Value::from(env.key()));
        }
        if let Some(o) = self.orientation {
            map.insert("orientation".into(), Value::from(o.key()));
        }
        map
    }

    /// 변수 id(또는 `h`)로 값을 바꾼다. 알 수 없는 id면 false.
    pub fn set_by_id(&mut self, id: &str, value: f64) -> bool {
        if id == "h" {
            self.convection = Some(value).filter(|h| *h > 0.0);
            return true;
        }
        match SweepVariable::from_id(id) {
            Some(variable) => {
                *self.value_mut(variable) = value;
                true
            }
            None => false,
        }
    }

    pub fn value(&self, variable: SweepVariable) -> f64 {
        match variable {
            SweepVariable::AmbientTemp => self.ambient_temp_c,
            SweepVariable::SurfaceTemp => self.surface_temp_c,
            SweepVariable::InternalTemp => self.internal_temp_c,
            SweepVariable::WindSpeed => self.wind_speed,
            SweepVariable::Conductivity => self.conductivity,
            SweepVariable::Diameter => self.diameter,
            SweepVariable::InsulationCost => self.insulation_cost,
            SweepVariable::FuelPrice => self.fuel_price,
            SweepVariable::OperatingHours => self.operating_hours,
            SweepVariable::LifeYears => self.life_years,
            SweepVariable::Efficiency => self.efficiency_pct,
        }
    }

    pub fn value_mut(&mut self, variable: SweepVariable) -> &mut f64 {
        match variable {
            SweepVariable::AmbientTemp => &mut self.ambient_temp_c,
            SweepVariable::SurfaceTemp => &mut self.surface_temp_c,
            SweepVariable::InternalTemp => &mut self.internal_temp_c,
            SweepVariable::WindSpeed => &mut self.wind_speed,
            SweepVariable::Conductivity => &mut self.conductivity,
            SweepVariable::Diameter => &mut self.diameter,
            SweepVariable::InsulationCost => &mut self.insulation_cost,
            SweepVariable::FuelPrice => &mut self.fuel_price,
            SweepVariable::OperatingHours => &mut self.operating_hours,
            SweepVariable::LifeYears => &mut self.life_years,
            SweepVariable::Efficiency => &mut self.efficiency_pct,
        }
    }
}

/// 스윕 대상 변수.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SweepVariable {
    AmbientTemp,
    SurfaceTemp,
    InternalTemp,
    WindSpeed,
    Conductivity,
    Diameter,
    InsulationCost,
    FuelPrice,
    OperatingHours,
    LifeYears,
    Efficiency,
}

impl SweepVariable {
    pub const ALL: [SweepVariable; 11] = [
        SweepVariable::AmbientTemp,
        SweepVariable::SurfaceTemp,
        SweepVariable::InternalTemp,
        SweepVariable::WindSpeed,
        SweepVariable::Conductivity,
        SweepVariable::Diameter,
        SweepVariable::InsulationCost,
        SweepVariable::FuelPrice,
        SweepVariable::OperatingHours,
        SweepVariable::LifeYears,
        SweepVariable::Efficiency,
    ];

    /// 솔버가 쓰는 변수 식별자.
    pub fn id(&self) -> &'static str {
        match self {
            SweepVariable::AmbientTemp => "Ta",
            SweepVariable::SurfaceTemp => "Te",
            SweepVariable::InternalTemp => "Ti",
            SweepVariable::WindSpeed => "v",
            SweepVariable::Conductivity => "k",
            SweepVariable::Diameter => "diametro",
            SweepVariable::InsulationCost => "C",
            SweepVariable::FuelPrice => "w",
            SweepVariable::OperatingHours => "beta",
            SweepVariable::LifeYears => "vida_util",
            SweepVariable::Efficiency => "eta",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.id() == id)
    }

    /// 축 제목과 내보내기 헤더에 쓰는 설명(영문 기본값). GUI는 번역 키로 덮어쓴다.
    pub fn legend(&self) -> &'static str {
        match self {
            SweepVariable::AmbientTemp => "Ambient temperature (°C)",
            SweepVariable::SurfaceTemp => "Surface temperature (°C)",
            SweepVariable::InternalTemp => "Max. internal temperature (°C)",
            SweepVariable::WindSpeed => "Wind speed (m/s)",
            SweepVariable::Conductivity => "Thermal conductivity (W/m·K)",
            SweepVariable::Diameter => "Pipe diameter / wall height (m)",
            SweepVariable::InsulationCost => "Insulation volumetric cost ($/m³)",
            SweepVariable::FuelPrice => "Fuel price ($/kWh)",
            SweepVariable::OperatingHours => "Operating hours per year (h)",
            SweepVariable::LifeYears => "Service life (years)",
            SweepVariable::Efficiency => "Heat engine efficiency (%)",
        }
    }

    /// 번역 키. 없으면 [`Self::legend`]로 폴백한다.
    pub fn legend_key(&self) -> String {
        format!("gui.variable.{}", self.id())
    }

    /// 변수 선택 시 미리 채우는 기본 범위 (min, max, step).
    pub fn default_range(&self) -> (f64, f64, f64) {
        match self {
            SweepVariable::AmbientTemp => (10.0, 50.0, 1.0),
            SweepVariable::SurfaceTemp => (10.0, 100.0, 5.0),
            SweepVariable::InternalTemp => (20.0, 300.0, 5.0),
            SweepVariable::WindSpeed => (0.1, 10.0, 0.2),
            SweepVariable::Conductivity => (0.01, 0.2, 0.005),
            SweepVariable::Diameter => (0.01, 1.0, 0.02),
            SweepVariable::InsulationCost => (100.0, 10000.0, 200.0),
            SweepVariable::FuelPrice => (0.01, 0.2, 0.005),
            SweepVariable::OperatingHours => (24.0, 8760.0, 96.0),
            SweepVariable::LifeYears => (1.0, 30.0, 1.0),
            SweepVariable::Efficiency => (10.0, 100.0, 5.0),
        }
    }
}

/// 텍스트로 입력받은 범위 필드. 숫자 여부는 [`RangeInput::parse`]에서 판정한다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeInput {
    pub min: String,
    pub max: String,
    pub step: String,
}

impl RangeInput {
    pub fn from_range(min: f64, max: f64, step: f64) -> Self {
        Self {
            min: min.to_string(),
            max: max.to_string(),
            step: step.to_string(),
        }
    }

    /// 변수의 기본 범위로 채운다. 변수 선택이 바뀔 때 명시적으로 호출한다.
    pub fn for_variable(variable: SweepVariable) -> Self {
        let (min, max, step) = variable.default_range();
        Self::from_range(min, max, step)
    }

    /// 세 필드가 모두 유한한 숫자면 범위를 돌려준다.
    pub fn parse(&self) -> Option<SweepRange> {
        let num = |s: &str| s.trim().parse::<f64>().ok().filter(|v| v.is_finite());
        Some(SweepRange {
            min: num(&self.min)?,
            max: num(&self.max)?,
            step: num(&self.step)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_values_converts_efficiency_and_mirrors_diameter() {
        let p = ParameterSet::default();
        let kv = p.known_values();
        assert_eq!(kv["eta"], Value::from(0.85));
        assert_eq!(kv["H"], kv["diametro"]);
        assert!(!kv.contains_key("h"));
    }

    #[test]
    fn known_values_only_sends_positive_h() {
        let mut p = ParameterSet {
            convection: Some(0.0),
            ..ParameterSet::default()
        };
        assert!(!p.known_values().contains_key("h"));
        p.convection = Some(12.5);
        assert_eq!(p.known_values()["h"], Value::from(12.5));
    }

    #[test]
    fn set_by_id_updates_matching_field() {
        let mut p = ParameterSet::default();
        assert!(p.set_by_id("vida_util", 20.0));
        assert_eq!(p.life_years, 20.0);
        assert_eq!(p.value(SweepVariable::LifeYears), 20.0);
        assert!(p.set_by_id("h", 7.5));
        assert_eq!(p.convection, Some(7.5));
        assert!(!p.set_by_id("unknown", 1.0));
    }

    #[test]
    fn variable_ids_round_trip() {
        for v in SweepVariable::ALL {
            assert_eq!(SweepVariable::from_id(v.id()), Some(v));
        }
        assert_eq!(SweepVariable::from_id("x"), None);
    }

    #[test]
    fn range_input_rejects_blank_and_non_numeric() {
        assert!(RangeInput::default().parse().is_none());
        let r = RangeInput {
            min: "1".into(),
            max: "abc".into(),
            step: "0.1".into(),
        };
        assert!(r.parse().is_none());
        let ok = RangeInput::for_variable(SweepVariable::Conductivity)
            .parse()
            .expect("numeric");
        assert_eq!((ok.min, ok.max, ok.step), (0.01, 0.2, 0.005));
    }

    #[test]
    fn parameter_set_uses_original_wire_names() {
        let p = ParameterSet {
            geometry: Some(GeometryKind::Sphere),
            ..ParameterSet::default()
        };
        let json = serde_json::to_value(&p).expect("serialize");
        assert_eq!(json["tipo_calculo"], "optimo_economico_esfera");
        assert_eq!(json["vida_util"], 15.0);
        let back: ParameterSet = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, p);
    }
}
