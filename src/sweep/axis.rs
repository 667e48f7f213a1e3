use serde::{Deserialize, Serialize};

use super::SecondaryView;

/// 축의 표시 범위.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// 두 y축을 같은 범위로 맞출지 결정하는 정책.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AxisSyncPolicy {
    /// 임계 두께 보기에서만 동기화(같은 단위 [m]).
    #[default]
    CriticalOnly,
    /// 보조 계열이 있으면 항상 동기화
    Always,
    /// 항상 독립 스케일
    Never,
}

impl AxisSyncPolicy {
    pub const ALL: [AxisSyncPolicy; 3] = [
        AxisSyncPolicy::CriticalOnly,
        AxisSyncPolicy::Always,
        AxisSyncPolicy::Never,
    ];

    /// 주어진 보조 보기에서 축 동기화가 켜지는지.
    pub fn applies(&self, view: SecondaryView) -> bool {
        match (self, view) {
            (_, SecondaryView::None) => false,
            (AxisSyncPolicy::Always, _) => true,
            (AxisSyncPolicy::CriticalOnly, SecondaryView::CriticalThickness) => true,
            (AxisSyncPolicy::CriticalOnly, _) => false,
            (AxisSyncPolicy::Never, _) => false,
        }
    }
}

/// 여러 계열의 값(있는 값만)을 모두 포함하는 여백 있는 공통 범위를 계산한다.
///
/// 값 범위의 5%를 여백으로 더하며, 모든 값이 같으면 `max(|v|·0.1, 0.1)`을 쓴다.
/// 값이 하나도 없으면 `None`.
pub fn sync_range(series_list: &[&[Option<f64>]]) -> Option<AxisRange> {
    let mut values = series_list
        .iter()
        .flat_map(|s| s.iter().copied().flatten())
        .filter(|v| v.is_finite());
    let first = values.next()?;
    let (data_min, data_max) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let padding = if data_min == data_max {
        (data_min.abs() * 0.1).max(0.1)
    } else {
        (data_max - data_min) * 0.05
    };
    Some(AxisRange {
        min: data_min - padding,
        max: data_max + padding,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn pads_by_five_percent_of_span() {
        let a = [Some(1.0), Some(2.0), Some(3.0)];
        let b = [Some(2.0), Some(3.0), Some(4.0)];
        let r = sync_range(&[&a, &b]).expect("range");
        assert!(close(r.min, 1.0 - 0.15), "{r:?}");
        assert!(close(r.max, 4.0 + 0.15), "{r:?}");
    }

    #[test]
    fn degenerate_values_use_ten_percent_padding() {
        let a = [Some(5.0)];
        let b = [Some(5.0)];
        let r = sync_range(&[&a, &b]).expect("range");
        assert!(close(r.min, 4.5));
        assert!(close(r.max, 5.5));
    }

    #[test]
    fn degenerate_zero_uses_minimum_padding() {
        let a = [Some(0.0), None];
        let r = sync_range(&[&a]).expect("range");
        assert!(close(r.min, -0.1));
        assert!(close(r.max, 0.1));
    }

    #[test]
    fn absent_values_are_skipped_and_empty_is_none() {
        let a = [None, Some(2.0), None];
        let b: [Option<f64>; 2] = [None, None];
        let r = sync_range(&[&a, &b]).expect("range");
        assert!(close(r.min, 1.8));
        assert!(sync_range(&[&b]).is_none());
        assert!(sync_range(&[]).is_none());
    }

    #[test]
    fn policy_matrix() {
        use SecondaryView::*;
        assert!(AxisSyncPolicy::CriticalOnly.applies(CriticalThickness));
        assert!(!AxisSyncPolicy::CriticalOnly.applies(Convection));
        assert!(AxisSyncPolicy::Always.applies(Convection));
        assert!(!AxisSyncPolicy::Always.applies(None));
        assert!(!AxisSyncPolicy::Never.applies(CriticalThickness));
    }
}
