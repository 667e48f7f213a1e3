use crate::params::SweepVariable;

use super::{GeometryKind, SweepResult};

/// 한 지점의 임계 두께/반경. 평판·원통은 `k / h`, 구는 `2k / h`.
/// `k`나 `h`가 0 이하이거나 NaN이면 `None`.
pub fn critical_value(geometry: GeometryKind, k: f64, h: f64) -> Option<f64> {
    if !(k > 0.0 && h > 0.0) {
        return None;
    }
    let factor = match geometry {
        GeometryKind::Plane | GeometryKind::Cylinder => 1.0,
        GeometryKind::Sphere => 2.0,
    };
    Some(factor * k / h)
}

/// 대류 계수 계열로부터 임계 두께/반경 계열을 계산한다.
///
/// `h`가 없거나 0 이하, 또는 그 지점의 열전도율이 유효하지 않으면 해당 지점은
/// `None`(그래프의 공백)이 된다. 열전도율을 스윕하는 경우에는 각 지점의 x 값을
/// k로 쓴다.
pub fn derive_critical(
    series: &SweepResult,
    geometry: GeometryKind,
    swept: SweepVariable,
    fixed_conductivity: f64,
) -> Vec<Option<f64>> {
    (0..series.x.len())
        .map(|i| {
            let h = series
                .h_vals
                .as_ref()
                .and_then(|h| h.get(i).copied().flatten())?;
            let k = if swept == SweepVariable::Conductivity {
                series.x[i]
            } else {
                fixed_conductivity
            };
            critical_value(geometry, k, h)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(x: Vec<f64>, h: Option<Vec<Option<f64>>>) -> SweepResult {
        SweepResult {
            y: vec![Some(0.05); x.len()],
            x,
            h_vals: h,
            rc_vals: Vec::new(),
        }
    }

    #[test]
    fn cylinder_uses_k_over_h() {
        let s = series(vec![1.0], Some(vec![Some(2.0)]));
        let rc = derive_critical(&s, GeometryKind::Cylinder, SweepVariable::WindSpeed, 4.0);
        assert_eq!(rc, vec![Some(2.0)]);
    }

    #[test]
    fn sphere_uses_two_k_over_h() {
        let s = series(vec![1.0], Some(vec![Some(2.0)]));
        let rc = derive_critical(&s, GeometryKind::Sphere, SweepVariable::WindSpeed, 4.0);
        assert_eq!(rc, vec![Some(4.0)]);
    }

    #[test]
    fn plane_matches_cylinder() {
        let s = series(vec![1.0, 2.0], Some(vec![Some(5.0), Some(10.0)]));
        let plane = derive_critical(&s, GeometryKind::Plane, SweepVariable::AmbientTemp, 0.05);
        let cyl = derive_critical(&s, GeometryKind::Cylinder, SweepVariable::AmbientTemp, 0.05);
        assert_eq!(plane, cyl);
    }

    #[test]
    fn non_positive_or_missing_h_is_a_gap() {
        let s = series(
            vec![1.0, 2.0, 3.0, 4.0],
            Some(vec![Some(0.0), Some(-1.0), None, Some(8.0)]),
        );
        let rc = derive_critical(&s, GeometryKind::Cylinder, SweepVariable::WindSpeed, 4.0);
        assert_eq!(rc, vec![None, None, None, Some(0.5)]);
    }

    #[test]
    fn absent_h_series_yields_all_gaps_with_matching_length() {
        let s = series(vec![1.0, 2.0, 3.0], None);
        let rc = derive_critical(&s, GeometryKind::Sphere, SweepVariable::WindSpeed, 4.0);
        assert_eq!(rc, vec![None, None, None]);
    }

    #[test]
    fn conductivity_sweep_uses_x_as_k() {
        let s = series(vec![0.0, 0.1, 0.2], Some(vec![Some(10.0); 3]));
        let rc = derive_critical(&s, GeometryKind::Cylinder, SweepVariable::Conductivity, 99.0);
        assert_eq!(rc[0], None);
        assert!((rc[1].unwrap() - 0.01).abs() < 1e-12);
        assert!((rc[2].unwrap() - 0.02).abs() < 1e-12);
    }

    #[test]
    fn invalid_fixed_conductivity_is_a_gap() {
        let s = series(vec![1.0], Some(vec![Some(10.0)]));
        for k in [0.0, -0.1, f64::NAN] {
            let rc = derive_critical(&s, GeometryKind::Plane, SweepVariable::WindSpeed, k);
            assert_eq!(rc, vec![None]);
        }
    }

    #[test]
    fn point_value_rejects_non_positive_inputs() {
        let rc = critical_value(GeometryKind::Sphere, 0.05, 10.0).expect("positive");
        assert!((rc - 0.01).abs() < 1e-12);
        assert_eq!(critical_value(GeometryKind::Plane, 0.05, 0.0), None);
        assert_eq!(critical_value(GeometryKind::Cylinder, -1.0, 5.0), None);
        assert_eq!(critical_value(GeometryKind::Cylinder, f64::NAN, 5.0), None);
    }
}
