//! 스윕 요청부터 차트 갱신, 내보내기까지의 흐름을 관리하는 상태 기계.

use crate::dialog::{DialogHandle, DialogHost, DialogRequest, DialogResult};
use crate::export::{self, ExportError, ExportFormat, ExportPayload, Precision};
use crate::params::{ParameterSet, RangeInput, SweepVariable};
use crate::solver::{SweepCompletion, SweepTask, SweepTicket};

use super::chart::{ChartLabels, ChartModel};
use super::store::{SeriesStore, StoredSweep};
use super::{
    build_request, AxisSyncPolicy, SecondaryView, SweepError, SweepResult,
    DEFAULT_MAX_ITERATIONS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepPhase {
    Idle,
    Fetching,
    Rendered,
    Error,
}

/// 현재 차트와 보조 축 선택 상태. 새 결과마다 통째로 다시 만든다.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartViewState {
    pub view: SecondaryView,
    pub synchronized: bool,
    pub chart: ChartModel,
}

/// 마지막 스윕의 결과 안내. 다음 스윕을 시작할 때까지 유지된다.
#[derive(Debug, Clone, PartialEq)]
pub enum SweepStatus {
    Rendered { points: usize },
    Failed(SweepError),
}

struct PendingSweep {
    ticket: SweepTicket,
    x_title: String,
}

pub struct SweepController {
    phase: SweepPhase,
    store: SeriesStore,
    view_state: Option<ChartViewState>,
    policy: AxisSyncPolicy,
    max_iterations: u32,
    precision: Precision,
    labels: ChartLabels,
    next_id: u64,
    pending: Option<PendingSweep>,
    task: Option<SweepTask>,
    status: Option<SweepStatus>,
    export_choice: Option<DialogHandle<usize>>,
}

impl Default for SweepController {
    fn default() -> Self {
        Self::new(AxisSyncPolicy::default(), DEFAULT_MAX_ITERATIONS, Precision::default())
    }
}

impl SweepController {
    pub fn new(policy: AxisSyncPolicy, max_iterations: u32, precision: Precision) -> Self {
        Self {
            phase: SweepPhase::Idle,
            store: SeriesStore::new(),
            view_state: None,
            policy,
            max_iterations,
            precision,
            labels: ChartLabels::default(),
            next_id: 1,
            pending: None,
            task: None,
            status: None,
            export_choice: None,
        }
    }

    pub fn phase(&self) -> SweepPhase {
        self.phase
    }

    pub fn status(&self) -> Option<&SweepStatus> {
        self.status.as_ref()
    }

    pub fn view_state(&self) -> Option<&ChartViewState> {
        self.view_state.as_ref()
    }

    pub fn chart(&self) -> Option<&ChartModel> {
        self.view_state.as_ref().map(|v| &v.chart)
    }

    pub fn stored(&self) -> Option<&StoredSweep> {
        self.store.get()
    }

    pub fn result(&self) -> Option<&SweepResult> {
        self.store.result()
    }

    pub fn is_busy(&self) -> bool {
        self.phase == SweepPhase::Fetching
    }

    /// 그래프 버튼을 누를 수 있는지
    pub fn can_trigger(&self) -> bool {
        !self.is_busy()
    }

    /// 대류 계수 값이 하나라도 있을 때만 보조 축 선택을 보여준다.
    pub fn secondary_controls_visible(&self) -> bool {
        self.phase == SweepPhase::Rendered
            && self.store.result().is_some_and(SweepResult::has_convection)
    }

    pub fn policy(&self) -> AxisSyncPolicy {
        self.policy
    }

    /// 축 동기화 정책을 바꾸고, 그려진 차트가 있으면 보조 축을 다시 계산한다.
    pub fn set_policy(&mut self, policy: AxisSyncPolicy) {
        self.policy = policy;
        self.refresh_secondary();
    }

    pub fn set_max_iterations(&mut self, max_iterations: u32) {
        self.max_iterations = max_iterations;
    }

    pub fn set_precision(&mut self, precision: Precision) {
        self.precision = precision;
    }

    /// 번역된 차트 문구를 적용한다.
    pub fn set_labels(&mut self, labels: ChartLabels) {
        if self.labels == labels {
            return;
        }
        self.labels = labels;
        if let (Some(stored), Some(state)) = (self.store.get(), self.view_state.as_mut()) {
            let x_title = state.chart.x_title.clone();
            state.chart = ChartModel::build(
                &stored.result,
                &x_title,
                state.view,
                self.policy,
                &self.labels,
            );
            state.synchronized = state.chart.synchronized;
        }
    }

    /// 입력을 검증하고 새 요청을 발급한다. 검증 실패는 서버로 보내지 않는다.
    pub fn begin_sweep(
        &mut self,
        params: &ParameterSet,
        variable: Option<SweepVariable>,
        range: &RangeInput,
        x_title: &str,
    ) -> Result<SweepTicket, SweepError> {
        if self.is_busy() {
            return Err(SweepError::Busy);
        }
        self.status = None;
        let request = match build_request(params, variable, range, self.max_iterations) {
            Ok(r) => r,
            Err(e) => {
                tracing::info!(error = %e, "스윕 입력 검증 실패");
                self.status = Some(SweepStatus::Failed(e.clone()));
                return Err(e);
            }
        };
        let ticket = SweepTicket {
            id: self.next_id,
            request,
        };
        self.next_id += 1;
        self.pending = Some(PendingSweep {
            ticket: ticket.clone(),
            x_title: x_title.to_string(),
        });
        self.phase = SweepPhase::Fetching;
        tracing::info!(
            id = ticket.id,
            variable = ticket.request.variable.id(),
            geometry = %ticket.request.geometry,
            "스윕 요청 시작"
        );
        Ok(ticket)
    }

    /// 작업 스레드를 연결한다. 결과는 [`Self::poll`]로 가져온다.
    pub fn attach_task(&mut self, task: SweepTask) {
        self.task = Some(task);
    }

    /// 작업 결과가 도착했으면 반영한다. 상태가 바뀌었으면 true.
    pub fn poll(&mut self) -> bool {
        let Some(completion) = self.task.as_ref().and_then(SweepTask::try_take) else {
            return false;
        };
        self.task = None;
        self.complete_sweep(completion)
    }

    /// 응답을 반영한다. 대기 중인 요청 id와 다르면 버린다.
    pub fn complete_sweep(&mut self, completion: SweepCompletion) -> bool {
        let is_current = self
            .pending
            .as_ref()
            .is_some_and(|p| p.ticket.id == completion.id);
        if !is_current {
            tracing::warn!(id = completion.id, "오래된 스윕 응답을 무시함");
            return false;
        }
        let Some(pending) = self.pending.take() else {
            return false;
        };
        let outcome = completion
            .outcome
            .and_then(|resp| SweepResult::from_response(resp, &pending.ticket.request));
        match outcome {
            Ok(result) => {
                let view = if result.has_convection() {
                    SecondaryView::Convection
                } else {
                    SecondaryView::None
                };
                let chart =
                    ChartModel::build(&result, &pending.x_title, view, self.policy, &self.labels);
                tracing::info!(
                    id = completion.id,
                    points = result.len(),
                    convection = result.has_convection(),
                    "스윕 결과 반영"
                );
                self.status = Some(SweepStatus::Rendered {
                    points: result.len(),
                });
                self.view_state = Some(ChartViewState {
                    view,
                    synchronized: chart.synchronized,
                    chart,
                });
                self.store.replace(pending.ticket.request, result);
                self.phase = SweepPhase::Rendered;
            }
            Err(e) => {
                tracing::warn!(id = completion.id, error = %e, "스윕 실패");
                self.store.clear();
                self.view_state = None;
                self.status = Some(SweepStatus::Failed(e));
                self.phase = SweepPhase::Error;
            }
        }
        true
    }

    /// 보조 축 계열을 바꾼다. 네트워크 요청 없이 저장된 결과로 다시 그린다.
    pub fn set_secondary_view(&mut self, view: SecondaryView) -> bool {
        if !self.secondary_controls_visible() {
            return false;
        }
        let Some(state) = self.view_state.as_mut() else {
            return false;
        };
        if state.view == view {
            return false;
        }
        state.view = view;
        tracing::debug!(?view, "보조 축 전환");
        self.refresh_secondary();
        true
    }

    fn refresh_secondary(&mut self) {
        if let (Some(stored), Some(state)) = (self.store.get(), self.view_state.as_mut()) {
            state
                .chart
                .set_secondary(&stored.result, state.view, self.policy, &self.labels);
            state.synchronized = state.chart.synchronized;
        }
    }

    /// 내보내기 형식 선택 대화상자를 연다.
    pub fn request_export(
        &mut self,
        host: &mut DialogHost,
        request: DialogRequest,
    ) -> Result<(), ExportError> {
        if self.store.result().map_or(true, SweepResult::is_empty) {
            return Err(ExportError::NoData);
        }
        let request = request.with_options(ExportFormat::ALL.iter().map(|f| f.label()));
        let handle = host.open_choice(request)?;
        self.export_choice = Some(handle);
        Ok(())
    }

    pub fn export_pending(&self) -> bool {
        self.export_choice.is_some()
    }

    /// 내보내기 버튼을 누를 수 있는지. 새 결과를 기다리는 동안에는 막는다.
    pub fn can_export(&self) -> bool {
        !self.export_pending() && self.can_trigger()
    }

    /// 형식이 선택되면 직렬화한 내용을 돌려준다. 취소되면 아무것도 하지 않는다.
    pub fn poll_export(&mut self) -> Option<Result<ExportPayload, ExportError>> {
        let result = self.export_choice.as_mut()?.poll()?;
        self.export_choice = None;
        let DialogResult::Value(index) = result else {
            tracing::debug!("내보내기 취소");
            return None;
        };
        let format = ExportFormat::ALL.get(index).copied()?;
        Some(self.export_as(format))
    }

    /// 선택한 형식으로 바로 직렬화한다.
    pub fn export_as(&self, format: ExportFormat) -> Result<ExportPayload, ExportError> {
        let stored = self.store.get().ok_or(ExportError::NoData)?;
        let x_label = self
            .chart()
            .map(|c| c.x_title.clone())
            .unwrap_or_else(|| stored.request.variable.legend().to_string());
        export::prepare_export(
            Some(&stored.result),
            stored.request.variable,
            &x_label,
            format,
            self.precision,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{Environment, Orientation};
    use crate::sweep::{GeometryKind, SweepResponse};

    fn params() -> ParameterSet {
        ParameterSet {
            geometry: Some(GeometryKind::Cylinder),
            environment: Some(Environment::Exterior),
            orientation: Some(Orientation::Horizontal),
            conductivity: 0.05,
            ..ParameterSet::default()
        }
    }

    fn range() -> RangeInput {
        RangeInput::from_range(1.0, 3.0, 1.0)
    }

    fn response() -> SweepResponse {
        SweepResponse {
            x: Some(vec![1.0, 2.0, 3.0]),
            y: Some(vec![Some(0.03), Some(0.04), Some(0.05)]),
            h_vals: Some(vec![Some(10.0), Some(12.5), Some(20.0)]),
            error: None,
        }
    }

    #[test]
    fn second_begin_while_fetching_is_busy() {
        let mut c = SweepController::default();
        c.begin_sweep(&params(), Some(SweepVariable::WindSpeed), &range(), "v")
            .expect("ticket");
        assert!(!c.can_trigger());
        assert_eq!(
            c.begin_sweep(&params(), Some(SweepVariable::WindSpeed), &range(), "v"),
            Err(SweepError::Busy)
        );
    }

    #[test]
    fn stale_completion_is_dropped() {
        let mut c = SweepController::default();
        let ticket = c
            .begin_sweep(&params(), Some(SweepVariable::WindSpeed), &range(), "v")
            .expect("ticket");
        assert!(!c.complete_sweep(SweepCompletion {
            id: ticket.id + 10,
            outcome: Ok(response()),
        }));
        assert_eq!(c.phase(), SweepPhase::Fetching);
        assert!(c.complete_sweep(SweepCompletion {
            id: ticket.id,
            outcome: Ok(response()),
        }));
        assert_eq!(c.phase(), SweepPhase::Rendered);
    }

    #[test]
    fn rendered_result_derives_critical_and_defaults_to_convection() {
        let mut c = SweepController::default();
        let ticket = c
            .begin_sweep(&params(), Some(SweepVariable::WindSpeed), &range(), "v")
            .expect("ticket");
        c.complete_sweep(SweepCompletion {
            id: ticket.id,
            outcome: Ok(response()),
        });
        let result = c.result().expect("stored");
        let rc = result.rc_vals[0].expect("rc");
        assert!((rc - 0.005).abs() < 1e-12);
        let state = c.view_state().expect("chart");
        assert_eq!(state.view, SecondaryView::Convection);
        assert!(c.secondary_controls_visible());
        assert_eq!(c.status(), Some(&SweepStatus::Rendered { points: 3 }));
    }

    #[test]
    fn validation_error_sets_status_without_fetching() {
        let mut c = SweepController::default();
        let err = c
            .begin_sweep(&params(), None, &range(), "v")
            .unwrap_err();
        assert!(matches!(err, SweepError::InputValidation(_)));
        assert_eq!(c.phase(), SweepPhase::Idle);
        assert!(c.can_trigger());
        assert!(matches!(c.status(), Some(SweepStatus::Failed(_))));
    }

    #[test]
    fn export_requires_data() {
        let mut c = SweepController::default();
        let mut host = DialogHost::new();
        assert!(matches!(
            c.request_export(&mut host, DialogRequest::new("t", "p")),
            Err(ExportError::NoData)
        ));
        assert!(!host.any_open());
    }
}
