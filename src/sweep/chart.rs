//! 그래프 한 장을 표현하는 렌더러 독립 모델.
//!
//! GUI는 이 모델을 egui_plot 선과 축으로 옮기기만 한다. 보조 계열은 별도 y축을
//! 쓰므로, 한 좌표계에 그릴 때는 [`AxisMap`]으로 주 축 좌표로 사상한다.

use super::axis::{sync_range, AxisRange, AxisSyncPolicy};
use super::{SecondaryView, SweepResult};

/// 차트 제목/범례에 쓰는 문구. GUI에서 번역된 값으로 교체한다.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLabels {
    pub title: String,
    pub primary: String,
    pub convection: String,
    pub critical: String,
}

impl Default for ChartLabels {
    fn default() -> Self {
        Self {
            title: "Optimal insulation thickness".into(),
            primary: "Optimal thickness (m)".into(),
            convection: "Convection coefficient (W/m²·K)".into(),
            critical: "Critical thickness (m)".into(),
        }
    }
}

/// 주 계열 표시 소수 자릿수
pub const PRIMARY_DECIMALS: usize = 3;
pub const CONVECTION_DECIMALS: usize = 2;
pub const CRITICAL_DECIMALS: usize = 4;

/// 한 계열. `None` 값은 보간하지 않고 선을 끊는다.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub label: String,
    pub x: Vec<f64>,
    pub y: Vec<Option<f64>>,
    pub decimals: usize,
}

impl Dataset {
    /// 값이 있는 연속 구간별로 점 목록을 나눈다.
    pub fn segments(&self) -> Vec<Vec<[f64; 2]>> {
        let mut out = Vec::new();
        let mut current: Vec<[f64; 2]> = Vec::new();
        for (x, y) in self.x.iter().zip(&self.y) {
            match y.filter(|v| v.is_finite()) {
                Some(v) => current.push([*x, v]),
                None => {
                    if !current.is_empty() {
                        out.push(std::mem::take(&mut current));
                    }
                }
            }
        }
        if !current.is_empty() {
            out.push(current);
        }
        out
    }

    pub fn has_values(&self) -> bool {
        self.y.iter().any(|v| v.is_some_and(f64::is_finite))
    }
}

/// 한 y축의 설정. `range`가 `None`이면 자기 데이터로 자동 스케일한다.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisConfig {
    pub title: String,
    pub range: Option<AxisRange>,
    pub decimals: usize,
}

impl AxisConfig {
    fn auto(title: &str, decimals: usize) -> Self {
        Self {
            title: title.to_string(),
            range: None,
            decimals,
        }
    }

    /// 고정 범위가 있으면 그것을, 없으면 데이터로부터 계산한 범위를 돌려준다.
    pub fn effective_range(&self, data: &[Option<f64>]) -> Option<AxisRange> {
        self.range.or_else(|| sync_range(&[data]))
    }
}

/// 보조 축 값을 주 축 좌표로 옮기는 선형 사상.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisMap {
    pub primary: AxisRange,
    pub secondary: AxisRange,
}

impl AxisMap {
    /// 보조 축 값 → 주 축 좌표
    pub fn apply(&self, v: f64) -> f64 {
        self.primary.min + (v - self.secondary.min) * self.primary.span() / self.secondary.span()
    }

    /// 주 축 좌표 → 보조 축 값 (눈금 라벨용)
    pub fn invert(&self, v: f64) -> f64 {
        self.secondary.min + (v - self.primary.min) * self.secondary.span() / self.primary.span()
    }
}

/// 현재 그려진 차트.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartModel {
    pub title: String,
    pub x_title: String,
    pub primary: Dataset,
    pub primary_axis: AxisConfig,
    pub secondary: Option<Dataset>,
    pub secondary_axis: Option<AxisConfig>,
    pub synchronized: bool,
}

impl ChartModel {
    /// 새 결과로 차트를 처음부터 만든다.
    pub fn build(
        result: &SweepResult,
        x_title: &str,
        view: SecondaryView,
        policy: AxisSyncPolicy,
        labels: &ChartLabels,
    ) -> Self {
        let mut chart = Self {
            title: labels.title.clone(),
            x_title: x_title.to_string(),
            primary: Dataset {
                label: labels.primary.clone(),
                x: result.x.clone(),
                y: result.y.clone(),
                decimals: PRIMARY_DECIMALS,
            },
            primary_axis: AxisConfig::auto(&labels.primary, PRIMARY_DECIMALS),
            secondary: None,
            secondary_axis: None,
            synchronized: false,
        };
        chart.set_secondary(result, view, policy, labels);
        chart
    }

    /// 보조 계열과 보조 축만 교체한다. 주 계열 데이터는 건드리지 않고,
    /// 주 축 범위는 동기화 여부에 따라서만 바뀐다.
    pub fn set_secondary(
        &mut self,
        result: &SweepResult,
        view: SecondaryView,
        policy: AxisSyncPolicy,
        labels: &ChartLabels,
    ) {
        let secondary = match view {
            SecondaryView::Convection => result.h_vals.as_ref().map(|h| Dataset {
                label: labels.convection.clone(),
                x: result.x.clone(),
                y: h.clone(),
                decimals: CONVECTION_DECIMALS,
            }),
            SecondaryView::CriticalThickness => Some(Dataset {
                label: labels.critical.clone(),
                x: result.x.clone(),
                y: result.rc_vals.clone(),
                decimals: CRITICAL_DECIMALS,
            }),
            SecondaryView::None => None,
        }
        .filter(Dataset::has_values);

        let Some(secondary) = secondary else {
            self.secondary = None;
            self.secondary_axis = None;
            self.synchronized = false;
            self.primary_axis.range = None;
            return;
        };

        let mut axis = AxisConfig::auto(&secondary.label, secondary.decimals);
        self.synchronized = policy.applies(view);
        if self.synchronized {
            let shared = sync_range(&[&self.primary.y, &secondary.y]);
            self.primary_axis.range = shared;
            axis.range = shared;
        } else {
            self.primary_axis.range = None;
        }
        self.secondary = Some(secondary);
        self.secondary_axis = Some(axis);
    }

    /// 보조 계열을 주 축 좌표로 옮길 사상. 동기화 중이면 항등 사상이다.
    pub fn axis_map(&self) -> Option<AxisMap> {
        let secondary = self.secondary.as_ref()?;
        let axis = self.secondary_axis.as_ref()?;
        let primary = self.primary_axis.effective_range(&self.primary.y)?;
        let secondary = axis.effective_range(&secondary.y)?;
        if primary.span() <= 0.0 || secondary.span() <= 0.0 {
            return None;
        }
        Some(AxisMap { primary, secondary })
    }
}
