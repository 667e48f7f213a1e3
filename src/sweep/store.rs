use super::{SweepRequest, SweepResult};

/// 마지막으로 성공한 스윕과 그 요청.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSweep {
    pub request: SweepRequest,
    pub result: SweepResult,
}

/// 가장 최근의 스윕 결과를 보관한다. 새 결과는 이전 결과를 통째로 대체한다.
#[derive(Debug, Default)]
pub struct SeriesStore {
    current: Option<StoredSweep>,
}

impl SeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, request: SweepRequest, result: SweepResult) {
        self.current = Some(StoredSweep { request, result });
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn get(&self) -> Option<&StoredSweep> {
        self.current.as_ref()
    }

    pub fn result(&self) -> Option<&SweepResult> {
        self.current.as_ref().map(|s| &s.result)
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }
}
