//! 스윕 요청 → 결과 반영 → 보조 축 전환 흐름 회귀 테스트(메모리 솔버 사용).
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use insulation_thickness_toolbox::export::Precision;
use insulation_thickness_toolbox::params::{
    Environment, Orientation, ParameterSet, RangeInput, SweepVariable,
};
use insulation_thickness_toolbox::solver::{self, SweepSolver, SweepTask};
use insulation_thickness_toolbox::sweep::{
    AxisSyncPolicy, GeometryKind, SecondaryView, SweepController, SweepError, SweepPhase,
    SweepRequest, SweepResponse, SweepStatus,
};

struct StubSolver {
    response: Result<SweepResponse, SweepError>,
}

impl SweepSolver for StubSolver {
    fn sweep(&self, _request: &SweepRequest) -> Result<SweepResponse, SweepError> {
        self.response.clone()
    }
}

fn params(geometry: GeometryKind) -> ParameterSet {
    ParameterSet {
        geometry: Some(geometry),
        environment: Some(Environment::Exterior),
        orientation: Some(Orientation::Horizontal),
        ..ParameterSet::default()
    }
}

fn wind_response() -> SweepResponse {
    SweepResponse {
        x: Some(vec![0.5, 1.0, 1.5]),
        y: Some(vec![Some(0.02), None, Some(0.03)]),
        h_vals: Some(vec![Some(5.0), Some(6.125), None]),
        error: None,
    }
}

fn controller() -> SweepController {
    SweepController::new(AxisSyncPolicy::CriticalOnly, 100, Precision::default())
}

#[test]
fn rendered_sweep_defaults_to_convection_view() {
    let mut c = controller();
    let stub = StubSolver {
        response: Ok(wind_response()),
    };
    let ticket = c
        .begin_sweep(
            &params(GeometryKind::Cylinder),
            Some(SweepVariable::WindSpeed),
            &RangeInput::from_range(0.5, 1.5, 0.5),
            "Wind speed (m/s)",
        )
        .expect("valid request");
    assert!(c.is_busy());
    assert!(!c.can_trigger());
    assert!(c.complete_sweep(solver::run_blocking(&stub, &ticket)));

    assert_eq!(c.phase(), SweepPhase::Rendered);
    assert_eq!(c.status(), Some(&SweepStatus::Rendered { points: 3 }));
    assert!(c.secondary_controls_visible());
    let state = c.view_state().expect("chart state");
    assert_eq!(state.view, SecondaryView::Convection);
    assert!(!state.synchronized);
    assert!(state.chart.primary_axis.range.is_none());
    assert_eq!(state.chart.x_title, "Wind speed (m/s)");

    let rc = &c.result().expect("result").rc_vals;
    assert!((rc[0].expect("rc") - 0.049 / 5.0).abs() < 1e-12);
    assert!((rc[1].expect("rc") - 0.049 / 6.125).abs() < 1e-12);
    assert_eq!(rc[2], None);
}

#[test]
fn critical_view_synchronizes_both_axes() {
    let mut c = controller();
    let stub = StubSolver {
        response: Ok(wind_response()),
    };
    let ticket = c
        .begin_sweep(
            &params(GeometryKind::Cylinder),
            Some(SweepVariable::WindSpeed),
            &RangeInput::from_range(0.5, 1.5, 0.5),
            "v",
        )
        .expect("valid request");
    c.complete_sweep(solver::run_blocking(&stub, &ticket));
    let primary_before = c.chart().expect("chart").primary.clone();
    let stored_before = c.result().expect("stored").clone();

    assert!(c.set_secondary_view(SecondaryView::CriticalThickness));
    let chart = c.chart().expect("chart");
    assert!(chart.synchronized);
    let primary = chart.primary_axis.range.expect("primary range");
    let secondary = chart
        .secondary_axis
        .as_ref()
        .and_then(|a| a.range)
        .expect("secondary range");
    assert_eq!(primary, secondary);
    assert!(primary.min < 0.049 / 6.125);
    assert!(primary.max > 0.03);
    assert_eq!(chart.primary, primary_before);

    assert!(c.set_secondary_view(SecondaryView::None));
    let chart = c.chart().expect("chart");
    assert!(chart.secondary.is_none());
    assert!(!chart.synchronized);
    assert!(chart.primary_axis.range.is_none());
    // 같은 선택은 무시
    assert!(!c.set_secondary_view(SecondaryView::None));

    // 보조 축을 오가도 저장된 계열은 그대로
    assert!(c.set_secondary_view(SecondaryView::Convection));
    assert!(c.set_secondary_view(SecondaryView::CriticalThickness));
    assert!(c.set_secondary_view(SecondaryView::Convection));
    let stored = c.result().expect("stored");
    assert_eq!(stored.x, stored_before.x);
    assert_eq!(stored.y, stored_before.y);
    assert_eq!(stored.h_vals, stored_before.h_vals);
    assert_eq!(c.chart().expect("chart").primary, primary_before);
}

#[test]
fn missing_convection_hides_secondary_controls() {
    let mut c = controller();
    let stub = StubSolver {
        response: Ok(SweepResponse {
            h_vals: None,
            ..wind_response()
        }),
    };
    let ticket = c
        .begin_sweep(
            &params(GeometryKind::Plane),
            Some(SweepVariable::WindSpeed),
            &RangeInput::from_range(0.5, 1.5, 0.5),
            "v",
        )
        .expect("valid request");
    c.complete_sweep(solver::run_blocking(&stub, &ticket));
    assert_eq!(c.phase(), SweepPhase::Rendered);
    assert!(!c.secondary_controls_visible());
    assert_eq!(c.view_state().map(|s| s.view), Some(SecondaryView::None));
    assert!(!c.set_secondary_view(SecondaryView::CriticalThickness));
    assert!(c.result().expect("result").rc_vals.iter().all(Option::is_none));
}

#[test]
fn sphere_conductivity_sweep_uses_swept_values() {
    let mut c = controller();
    let stub = StubSolver {
        response: Ok(SweepResponse {
            x: Some(vec![0.02, 0.04]),
            y: Some(vec![Some(0.05), Some(0.04)]),
            h_vals: Some(vec![Some(8.0), Some(8.0)]),
            error: None,
        }),
    };
    let ticket = c
        .begin_sweep(
            &params(GeometryKind::Sphere),
            Some(SweepVariable::Conductivity),
            &RangeInput::from_range(0.02, 0.04, 0.02),
            "k",
        )
        .expect("valid request");
    c.complete_sweep(solver::run_blocking(&stub, &ticket));
    let rc = &c.result().expect("result").rc_vals;
    assert!((rc[0].expect("rc") - 2.0 * 0.02 / 8.0).abs() < 1e-12);
    assert!((rc[1].expect("rc") - 2.0 * 0.04 / 8.0).abs() < 1e-12);
}

#[test]
fn server_rejection_clears_previous_chart() {
    let mut c = controller();
    let ok = StubSolver {
        response: Ok(wind_response()),
    };
    let range = RangeInput::from_range(0.5, 1.5, 0.5);
    let p = params(GeometryKind::Cylinder);
    let ticket = c
        .begin_sweep(&p, Some(SweepVariable::WindSpeed), &range, "v")
        .expect("valid request");
    c.complete_sweep(solver::run_blocking(&ok, &ticket));
    assert!(c.chart().is_some());

    let rejecting = StubSolver {
        response: Ok(SweepResponse {
            error: Some("No converge".into()),
            ..SweepResponse::default()
        }),
    };
    let ticket = c
        .begin_sweep(&p, Some(SweepVariable::WindSpeed), &range, "v")
        .expect("valid request");
    c.complete_sweep(solver::run_blocking(&rejecting, &ticket));
    assert_eq!(c.phase(), SweepPhase::Error);
    assert!(c.chart().is_none());
    assert!(c.result().is_none());
    assert_eq!(
        c.status(),
        Some(&SweepStatus::Failed(SweepError::ServerRejection(
            "No converge".into()
        )))
    );
    assert!(c.can_trigger());
}

#[test]
fn second_trigger_while_fetching_is_busy() {
    let mut c = controller();
    let range = RangeInput::from_range(0.5, 1.5, 0.5);
    let p = params(GeometryKind::Cylinder);
    let first = c
        .begin_sweep(&p, Some(SweepVariable::WindSpeed), &range, "v")
        .expect("valid request");
    assert_eq!(
        c.begin_sweep(&p, Some(SweepVariable::WindSpeed), &range, "v"),
        Err(SweepError::Busy)
    );
    let stub = StubSolver {
        response: Ok(wind_response()),
    };
    let mut stale = solver::run_blocking(&stub, &first);
    stale.id += 10;
    assert!(!c.complete_sweep(stale));
    assert!(c.is_busy());
    assert!(c.complete_sweep(solver::run_blocking(&stub, &first)));
}

#[test]
fn export_waits_for_pending_sweep() {
    let mut c = controller();
    let range = RangeInput::from_range(0.5, 1.5, 0.5);
    let p = params(GeometryKind::Cylinder);
    let stub = StubSolver {
        response: Ok(wind_response()),
    };
    let first = c
        .begin_sweep(&p, Some(SweepVariable::WindSpeed), &range, "v")
        .expect("valid request");
    assert!(!c.can_export());
    c.complete_sweep(solver::run_blocking(&stub, &first));
    assert!(c.can_export());

    let second = c
        .begin_sweep(&p, Some(SweepVariable::WindSpeed), &range, "v")
        .expect("valid request");
    assert!(!c.can_export());
    c.complete_sweep(solver::run_blocking(&stub, &second));
    assert!(c.can_export());
}

#[test]
fn worker_thread_delivers_result_and_notifies() {
    let mut c = controller();
    let ticket = c
        .begin_sweep(
            &params(GeometryKind::Cylinder),
            Some(SweepVariable::WindSpeed),
            &RangeInput::from_range(0.5, 1.5, 0.5),
            "v",
        )
        .expect("valid request");
    let notified = Arc::new(AtomicUsize::new(0));
    let counter = notified.clone();
    let stub: Arc<dyn SweepSolver> = Arc::new(StubSolver {
        response: Ok(wind_response()),
    });
    c.attach_task(SweepTask::spawn(stub, ticket, move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    let mut done = false;
    for _ in 0..500 {
        if c.poll() {
            done = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(done, "worker did not finish");
    assert_eq!(c.phase(), SweepPhase::Rendered);
    // notify는 결과 전송 직후 호출된다.
    for _ in 0..100 {
        if notified.load(Ordering::SeqCst) == 1 {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(notified.load(Ordering::SeqCst), 1);
}

#[test]
fn validation_errors_never_reach_the_solver() {
    let mut c = controller();
    let p = params(GeometryKind::Cylinder);
    for (variable, range) in [
        (None, RangeInput::from_range(0.5, 1.5, 0.5)),
        (Some(SweepVariable::WindSpeed), RangeInput::from_range(2.0, 1.0, 0.5)),
        (Some(SweepVariable::WindSpeed), RangeInput::from_range(0.0, 1.0, 0.0)),
        (Some(SweepVariable::WindSpeed), RangeInput::from_range(0.0, 1000.0, 1.0)),
        (
            Some(SweepVariable::WindSpeed),
            RangeInput {
                min: "abc".into(),
                max: "1".into(),
                step: "0.1".into(),
            },
        ),
    ] {
        let err = c.begin_sweep(&p, variable, &range, "v").expect_err("invalid");
        assert!(matches!(err, SweepError::InputValidation(_)), "{err:?}");
        assert_eq!(c.phase(), SweepPhase::Idle);
        assert!(!c.is_busy());
    }
}
