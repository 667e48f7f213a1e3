//! 원격 방정식 솔버 클라이언트.
//!
//! 솔버는 `POST {api_base}plot_espesor`로 스윕 한 번을 계산해 `{x, y, h_vals}`를
//! 돌려주고, `POST {api_base}solve_equation`으로 단일 지점의 최적 두께를 푼다.
//! GUI 스레드를 막지 않도록 요청은 작업 스레드에서 실행하고 결과는 mpsc 채널로 넘긴다.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::point::{PointRequest, PointResponse, PointResult, SOLVE_VARIABLE};
use crate::sweep::{SweepError, SweepRequest, SweepResponse};

/// 스윕 계산을 수행하는 주체. 테스트에서는 메모리 스텁으로 대체한다.
pub trait SweepSolver: Send + Sync {
    fn sweep(&self, request: &SweepRequest) -> Result<SweepResponse, SweepError>;

    /// 단일 지점 최적 두께. 지원하지 않는 솔버는 거부 응답을 돌려준다.
    fn solve_point(&self, request: &PointRequest) -> Result<PointResponse, SweepError> {
        let _ = request;
        Err(SweepError::ServerRejection(
            "단일 지점 계산을 지원하지 않는 솔버입니다.".into(),
        ))
    }
}

/// 요청 id가 붙은 스윕 요청.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepTicket {
    pub id: u64,
    pub request: SweepRequest,
}

/// 작업 스레드가 돌려주는 결과.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepCompletion {
    pub id: u64,
    pub outcome: Result<SweepResponse, SweepError>,
}

#[derive(Serialize)]
struct PlotBody<'a> {
    equation_key: &'a str,
    variable: &'a str,
    known_values: &'a BTreeMap<String, Value>,
    min_val: f64,
    max_val: f64,
    step_val: f64,
    flow_type: &'a str,
    orientation: &'a str,
}

#[derive(Serialize)]
struct SolveBody<'a> {
    equation_key: &'a str,
    known_values: &'a BTreeMap<String, Value>,
    variable_to_solve: &'a str,
    flow_type: &'a str,
    orientation: &'a str,
}

impl<'a> SolveBody<'a> {
    fn new(request: &'a PointRequest) -> Self {
        Self {
            equation_key: request.geometry.equation_key(),
            known_values: &request.known_values,
            variable_to_solve: SOLVE_VARIABLE,
            flow_type: &request.flow_type,
            orientation: &request.orientation,
        }
    }
}

impl<'a> PlotBody<'a> {
    fn new(request: &'a SweepRequest) -> Self {
        Self {
            equation_key: request.geometry.equation_key(),
            variable: request.variable.id(),
            known_values: &request.known_values,
            min_val: request.range.min,
            max_val: request.range.max,
            step_val: request.range.step,
            flow_type: &request.flow_type,
            orientation: &request.orientation,
        }
    }
}

/// HTTP(JSON) 솔버.
#[derive(Debug, Clone)]
pub struct HttpSolver {
    endpoint: String,
    point_endpoint: String,
    timeout: Duration,
}

impl HttpSolver {
    pub fn new(api_base: &str, timeout: Duration) -> Self {
        let base = if api_base.ends_with('/') {
            api_base.to_string()
        } else {
            format!("{api_base}/")
        };
        Self {
            endpoint: format!("{base}plot_espesor"),
            point_endpoint: format!("{base}solve_equation"),
            timeout,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(&cfg.api_base, Duration::from_secs(cfg.request_timeout_secs))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn point_endpoint(&self) -> &str {
        &self.point_endpoint
    }

    fn post<B: Serialize, R: DeserializeOwned>(&self, url: &str, body: B) -> Result<R, SweepError> {
        match ureq::post(url).timeout(self.timeout).send_json(body) {
            Ok(r) => r
                .into_json::<R>()
                .map_err(|e| SweepError::MalformedResponse(e.to_string())),
            Err(ureq::Error::Status(code, r)) => {
                let message = r
                    .into_json::<Value>()
                    .ok()
                    .and_then(|body| body.get("error").and_then(Value::as_str).map(str::to_string))
                    .unwrap_or_else(|| format!("서버가 요청을 처리하지 못했습니다 (HTTP {code})."));
                tracing::warn!(status = code, %message, "솔버가 요청을 거부함");
                Err(SweepError::ServerRejection(message))
            }
            Err(ureq::Error::Transport(t)) => {
                tracing::error!(error = %t, "솔버 연결 실패");
                Err(SweepError::TransportFailure(t.to_string()))
            }
        }
    }
}

impl SweepSolver for HttpSolver {
    fn sweep(&self, request: &SweepRequest) -> Result<SweepResponse, SweepError> {
        tracing::debug!(endpoint = %self.endpoint, variable = request.variable.id(), "스윕 요청 전송");
        self.post(&self.endpoint, PlotBody::new(request))
    }

    fn solve_point(&self, request: &PointRequest) -> Result<PointResponse, SweepError> {
        tracing::debug!(endpoint = %self.point_endpoint, geometry = %request.geometry, "단일 지점 요청 전송");
        self.post(&self.point_endpoint, SolveBody::new(request))
    }
}

/// 실행 중인 스윕 작업.
pub struct SweepTask {
    id: u64,
    rx: Receiver<SweepCompletion>,
}

impl SweepTask {
    /// 작업 스레드에서 요청을 실행한다. 완료되면 `notify`를 호출한다(GUI 재그리기 요청).
    pub fn spawn<F>(solver: Arc<dyn SweepSolver>, ticket: SweepTicket, notify: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let id = ticket.id;
        std::thread::spawn(move || {
            let completion = run_blocking(solver.as_ref(), &ticket);
            let _ = tx.send(completion);
            notify();
        });
        Self { id, rx }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// 결과가 도착했으면 꺼낸다. 작업 스레드가 결과 없이 끝났으면 연결 실패로 본다.
    pub fn try_take(&self) -> Option<SweepCompletion> {
        match self.rx.try_recv() {
            Ok(c) => Some(c),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(SweepCompletion {
                id: self.id,
                outcome: Err(SweepError::TransportFailure(
                    "작업 스레드가 결과 없이 종료되었습니다".into(),
                )),
            }),
        }
    }
}

/// 실행 중인 단일 지점 계산.
pub struct PointTask {
    request: PointRequest,
    rx: Receiver<Result<PointResponse, SweepError>>,
}

impl PointTask {
    pub fn spawn<F>(solver: Arc<dyn SweepSolver>, request: PointRequest, notify: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let sent = request.clone();
        std::thread::spawn(move || {
            let _ = tx.send(solver.solve_point(&sent));
            notify();
        });
        Self { request, rx }
    }

    /// 응답이 도착했으면 해석해서 꺼낸다.
    pub fn try_take(&self) -> Option<Result<PointResult, SweepError>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome.and_then(|r| PointResult::from_response(r, &self.request))),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(SweepError::TransportFailure(
                "작업 스레드가 결과 없이 종료되었습니다".into(),
            ))),
        }
    }
}

/// 단일 지점 계산을 현재 스레드에서 실행한다(CLI, 테스트).
pub fn solve_point_blocking(
    solver: &dyn SweepSolver,
    request: &PointRequest,
) -> Result<PointResult, SweepError> {
    let response = solver.solve_point(request)?;
    PointResult::from_response(response, request)
}

/// 현재 스레드에서 요청을 실행한다(CLI, 테스트).
pub fn run_blocking(solver: &dyn SweepSolver, ticket: &SweepTicket) -> SweepCompletion {
    SweepCompletion {
        id: ticket.id,
        outcome: solver.sweep(&ticket.request),
    }
}
