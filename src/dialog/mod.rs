//! UI 스레드를 막지 않는 일회성 모달 대화상자.
//!
//! `DialogHost::open_*`는 즉시 [`DialogHandle`]을 돌려주고, 호출 측은 이후
//! 프레임에서 `poll`로 결과를 확인한다. 한 번 열린 대화상자는 정확히 한 번만
//! 해결되며, 열릴 때 구독한 트리거는 [`ListenerScope`]에 묶여 해결 시점에 한꺼번에
//! 해제된다. 해결된 세션으로 들어오는 이벤트는 무시된다.

mod view;

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// 대화상자 종류. 종류마다 동시에 하나만 열 수 있다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogKind {
    Message,
    Confirm,
    TextInput,
    Choice,
}

impl DialogKind {
    pub const ALL: [DialogKind; 4] = [
        DialogKind::Message,
        DialogKind::Confirm,
        DialogKind::TextInput,
        DialogKind::Choice,
    ];

    fn triggers(&self) -> &'static [Trigger] {
        use Trigger::*;
        match self {
            DialogKind::Message => &[PrimaryButton, EscapeKey, Backdrop, Visibility],
            DialogKind::Confirm => &[PrimaryButton, CancelButton, EscapeKey, Backdrop, Visibility],
            DialogKind::TextInput => &[
                PrimaryButton,
                CancelButton,
                EscapeKey,
                Backdrop,
                Visibility,
                TextField,
            ],
            DialogKind::Choice => &[OptionList, CancelButton, EscapeKey, Backdrop, Visibility],
        }
    }
}

impl fmt::Display for DialogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DialogKind::Message => "message",
            DialogKind::Confirm => "confirm",
            DialogKind::TextInput => "text_input",
            DialogKind::Choice => "choice",
        };
        f.write_str(s)
    }
}

/// 대화상자 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogResult<T> {
    Value(T),
    Cancelled,
}

impl<T> DialogResult<T> {
    pub fn value(self) -> Option<T> {
        match self {
            DialogResult::Value(v) => Some(v),
            DialogResult::Cancelled => None,
        }
    }
}

/// 대화상자 요청 내용.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DialogRequest {
    pub title: String,
    pub prompt: String,
    /// 텍스트 입력의 초기값
    pub default_value: Option<String>,
    /// 선택 대화상자의 고정 선택지
    pub options: Vec<String>,
}

impl DialogRequest {
    pub fn new(title: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }
}

/// 열린 대화상자로 들어오는 사용자 이벤트.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogEvent {
    Primary,
    PickOption(usize),
    Cancel,
    Escape,
    OutsideClick,
    /// 표면이 해결 없이 닫힘(창 닫기 버튼 등)
    Hidden,
    TextChanged(String),
}

impl DialogEvent {
    fn trigger(&self) -> Trigger {
        match self {
            DialogEvent::Primary => Trigger::PrimaryButton,
            DialogEvent::PickOption(_) => Trigger::OptionList,
            DialogEvent::Cancel => Trigger::CancelButton,
            DialogEvent::Escape => Trigger::EscapeKey,
            DialogEvent::OutsideClick => Trigger::Backdrop,
            DialogEvent::Hidden => Trigger::Visibility,
            DialogEvent::TextChanged(_) => Trigger::TextField,
        }
    }
}

/// 이벤트 전달 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// 열린 세션이 없거나 구독하지 않은 트리거
    Ignored,
    /// 처리했지만 아직 열려 있음
    Pending,
    /// 세션이 해결되어 닫힘
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    PrimaryButton,
    CancelButton,
    EscapeKey,
    Backdrop,
    Visibility,
    TextField,
    OptionList,
}

/// 한 번의 열림 동안 구독한 트리거 묶음.
#[derive(Debug)]
pub struct ListenerScope {
    kind: DialogKind,
    triggers: Vec<Trigger>,
    torn_down: bool,
}

impl ListenerScope {
    fn subscribe(kind: DialogKind) -> Self {
        let triggers = kind.triggers().to_vec();
        tracing::trace!(%kind, listeners = triggers.len(), "대화상자 리스너 등록");
        Self {
            kind,
            triggers,
            torn_down: false,
        }
    }

    fn accepts(&self, trigger: Trigger) -> bool {
        !self.torn_down && self.triggers.contains(&trigger)
    }

    /// 모든 구독을 해제한다. 두 번째 호출부터는 아무 일도 하지 않는다.
    pub fn teardown(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        tracing::trace!(kind = %self.kind, listeners = self.triggers.len(), "대화상자 리스너 해제");
        self.triggers.clear();
        self.torn_down = true;
        true
    }

    pub fn active(&self) -> usize {
        self.triggers.len()
    }
}

/// 결과를 한 번만 보내는 송신측.
struct Resolver<T> {
    tx: Option<Sender<DialogResult<T>>>,
}

impl<T> Resolver<T> {
    fn resolve(&mut self, result: DialogResult<T>) -> bool {
        match self.tx.take() {
            Some(tx) => {
                let _ = tx.send(result);
                true
            }
            None => false,
        }
    }
}

/// 호출 측이 쥐고 있는 결과 수신 핸들.
pub struct DialogHandle<T> {
    rx: Receiver<DialogResult<T>>,
    finished: bool,
}

impl<T> DialogHandle<T> {
    /// 결과가 나왔으면 한 번만 돌려준다. 세션이 결과 없이 사라졌으면 `Cancelled`.
    pub fn poll(&mut self) -> Option<DialogResult<T>> {
        if self.finished {
            return None;
        }
        match self.rx.try_recv() {
            Ok(result) => {
                self.finished = true;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.finished = true;
                Some(DialogResult::Cancelled)
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl<T> fmt::Debug for DialogHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogHandle")
            .field("finished", &self.finished)
            .finish()
    }
}

struct Session<T> {
    id: u64,
    request: DialogRequest,
    scope: ListenerScope,
    resolver: Resolver<T>,
    input: String,
    invalid: bool,
}

impl<T> Session<T> {
    fn open(id: u64, kind: DialogKind, request: DialogRequest) -> (Self, DialogHandle<T>) {
        let (tx, rx) = mpsc::channel();
        let input = request.default_value.clone().unwrap_or_default();
        let session = Self {
            id,
            request,
            scope: ListenerScope::subscribe(kind),
            resolver: Resolver { tx: Some(tx) },
            input,
            invalid: false,
        };
        (
            session,
            DialogHandle {
                rx,
                finished: false,
            },
        )
    }

    fn finish(&mut self, result: DialogResult<T>) {
        self.resolver.resolve(result);
        self.scope.teardown();
    }
}

/// 대화상자 관련 오류.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DialogError {
    #[error("모달 표면을 사용할 수 없습니다: {0}")]
    Unavailable(DialogKind),
    #[error("같은 종류의 대화상자가 이미 열려 있습니다: {0}")]
    AlreadyOpen(DialogKind),
}

/// 열린 대화상자를 소유하고 이벤트를 세션으로 전달한다.
pub struct DialogHost {
    available: bool,
    next_id: u64,
    message: Option<Session<()>>,
    confirm: Option<Session<()>>,
    text_input: Option<Session<String>>,
    choice: Option<Session<usize>>,
    /// 열린 순서. 마지막이 최상단.
    stack: Vec<DialogKind>,
}

impl Default for DialogHost {
    fn default() -> Self {
        Self::new()
    }
}

impl DialogHost {
    pub fn new() -> Self {
        Self {
            available: true,
            next_id: 1,
            message: None,
            confirm: None,
            text_input: None,
            choice: None,
            stack: Vec::new(),
        }
    }

    /// 모달 표면이 없는 호스트(CLI). 모든 열기 요청이 실패한다.
    pub fn headless() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    fn check_open(&self, kind: DialogKind) -> Result<u64, DialogError> {
        if !self.available {
            tracing::error!(%kind, "모달 표면이 없어 대화상자를 열 수 없음");
            return Err(DialogError::Unavailable(kind));
        }
        if self.is_open(kind) {
            tracing::warn!(%kind, "같은 종류의 대화상자가 이미 열려 있음");
            return Err(DialogError::AlreadyOpen(kind));
        }
        Ok(self.next_id)
    }

    fn opened(&mut self, kind: DialogKind, id: u64) {
        self.next_id += 1;
        self.stack.push(kind);
        tracing::debug!(%kind, session = id, "대화상자 열림");
    }

    pub fn open_message(
        &mut self,
        request: DialogRequest,
    ) -> Result<DialogHandle<()>, DialogError> {
        let id = self.check_open(DialogKind::Message)?;
        let (session, handle) = Session::open(id, DialogKind::Message, request);
        self.message = Some(session);
        self.opened(DialogKind::Message, id);
        Ok(handle)
    }

    pub fn open_confirm(
        &mut self,
        request: DialogRequest,
    ) -> Result<DialogHandle<()>, DialogError> {
        let id = self.check_open(DialogKind::Confirm)?;
        let (session, handle) = Session::open(id, DialogKind::Confirm, request);
        self.confirm = Some(session);
        self.opened(DialogKind::Confirm, id);
        Ok(handle)
    }

    /// 텍스트 입력. 결과는 앞뒤 공백을 제거한 비어 있지 않은 문자열이다.
    pub fn open_text_input(
        &mut self,
        request: DialogRequest,
    ) -> Result<DialogHandle<String>, DialogError> {
        let id = self.check_open(DialogKind::TextInput)?;
        let (session, handle) = Session::open(id, DialogKind::TextInput, request);
        self.text_input = Some(session);
        self.opened(DialogKind::TextInput, id);
        Ok(handle)
    }

    /// 고정 선택지 중 하나를 고른다. 결과는 선택지 인덱스.
    pub fn open_choice(
        &mut self,
        request: DialogRequest,
    ) -> Result<DialogHandle<usize>, DialogError> {
        let id = self.check_open(DialogKind::Choice)?;
        let (session, handle) = Session::open(id, DialogKind::Choice, request);
        self.choice = Some(session);
        self.opened(DialogKind::Choice, id);
        Ok(handle)
    }

    pub fn is_open(&self, kind: DialogKind) -> bool {
        match kind {
            DialogKind::Message => self.message.is_some(),
            DialogKind::Confirm => self.confirm.is_some(),
            DialogKind::TextInput => self.text_input.is_some(),
            DialogKind::Choice => self.choice.is_some(),
        }
    }

    pub fn any_open(&self) -> bool {
        !self.stack.is_empty()
    }

    /// 가장 위에 있는 대화상자
    pub fn top(&self) -> Option<DialogKind> {
        self.stack.last().copied()
    }

    /// 열린 세션들이 구독 중인 트리거 수의 합.
    pub fn active_listener_count(&self) -> usize {
        self.message.as_ref().map_or(0, |s| s.scope.active())
            + self.confirm.as_ref().map_or(0, |s| s.scope.active())
            + self.text_input.as_ref().map_or(0, |s| s.scope.active())
            + self.choice.as_ref().map_or(0, |s| s.scope.active())
    }

    /// Escape는 최상단 대화상자에만 전달한다.
    pub fn dispatch_escape(&mut self) -> Dispatch {
        match self.top() {
            Some(kind) => self.dispatch(kind, DialogEvent::Escape),
            None => Dispatch::Ignored,
        }
    }

    /// 종류별 세션으로 이벤트를 전달한다.
    pub fn dispatch(&mut self, kind: DialogKind, event: DialogEvent) -> Dispatch {
        let outcome = match kind {
            DialogKind::Message => route(&mut self.message, kind, event, |_, ev| match ev {
                DialogEvent::Primary => Some(DialogResult::Value(())),
                _ => None,
            }),
            DialogKind::Confirm => route(&mut self.confirm, kind, event, |_, ev| match ev {
                DialogEvent::Primary => Some(DialogResult::Value(())),
                _ => None,
            }),
            DialogKind::TextInput => route(&mut self.text_input, kind, event, |s, ev| match ev {
                DialogEvent::Primary => {
                    let value = s.input.trim();
                    if value.is_empty() {
                        s.invalid = true;
                        None
                    } else {
                        Some(DialogResult::Value(value.to_string()))
                    }
                }
                _ => None,
            }),
            DialogKind::Choice => route(&mut self.choice, kind, event, |s, ev| match ev {
                DialogEvent::PickOption(i) if i < s.request.options.len() => {
                    Some(DialogResult::Value(i))
                }
                _ => None,
            }),
        };
        if outcome == Dispatch::Resolved {
            self.stack.retain(|k| *k != kind);
        }
        outcome
    }

    /// 모든 열린 대화상자를 취소한다(앱 종료 등).
    pub fn cancel_all(&mut self) {
        for kind in DialogKind::ALL {
            if self.is_open(kind) {
                self.dispatch(kind, DialogEvent::Hidden);
            }
        }
    }
}

/// 공통 취소 경로를 처리하고, 나머지 이벤트는 종류별 `primary`에 맡긴다.
fn route<T, F>(
    slot: &mut Option<Session<T>>,
    kind: DialogKind,
    event: DialogEvent,
    primary: F,
) -> Dispatch
where
    F: FnOnce(&mut Session<T>, DialogEvent) -> Option<DialogResult<T>>,
{
    let Some(session) = slot.as_mut() else {
        return Dispatch::Ignored;
    };
    if !session.scope.accepts(event.trigger()) {
        return Dispatch::Ignored;
    }
    let result = match event {
        DialogEvent::Cancel
        | DialogEvent::Escape
        | DialogEvent::OutsideClick
        | DialogEvent::Hidden => Some(DialogResult::Cancelled),
        DialogEvent::TextChanged(text) => {
            session.input = text;
            session.invalid = false;
            None
        }
        other => primary(session, other),
    };
    match result {
        Some(result) => {
            let cancelled = matches!(result, DialogResult::Cancelled);
            session.finish(result);
            tracing::debug!(%kind, session = session.id, cancelled, "대화상자 해결");
            *slot = None;
            Dispatch::Resolved
        }
        None => Dispatch::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_host_reports_unavailable() {
        let mut host = DialogHost::headless();
        assert_eq!(
            host.open_message(DialogRequest::new("t", "p")).unwrap_err(),
            DialogError::Unavailable(DialogKind::Message)
        );
        assert!(!host.any_open());
    }

    #[test]
    fn resolved_session_ignores_late_events() {
        let mut host = DialogHost::new();
        let mut handle = host.open_confirm(DialogRequest::new("t", "p")).expect("open");
        assert_eq!(host.dispatch(DialogKind::Confirm, DialogEvent::Primary), Dispatch::Resolved);
        assert_eq!(host.dispatch(DialogKind::Confirm, DialogEvent::Cancel), Dispatch::Ignored);
        assert_eq!(handle.poll(), Some(DialogResult::Value(())));
        assert_eq!(handle.poll(), None);
    }

    #[test]
    fn unsubscribed_trigger_is_ignored() {
        let mut host = DialogHost::new();
        let _h = host.open_message(DialogRequest::new("t", "p")).expect("open");
        assert_eq!(host.dispatch(DialogKind::Message, DialogEvent::PickOption(0)), Dispatch::Ignored);
        assert!(host.is_open(DialogKind::Message));
    }

    #[test]
    fn scope_teardown_runs_once() {
        let mut scope = ListenerScope::subscribe(DialogKind::TextInput);
        assert_eq!(scope.active(), 6);
        assert!(scope.teardown());
        assert!(!scope.teardown());
        assert_eq!(scope.active(), 0);
    }

    #[test]
    fn escape_goes_to_top_most_only() {
        let mut host = DialogHost::new();
        let mut confirm = host.open_confirm(DialogRequest::new("c", "p")).expect("open");
        let mut message = host.open_message(DialogRequest::new("m", "p")).expect("open");
        assert_eq!(host.top(), Some(DialogKind::Message));
        assert_eq!(host.dispatch_escape(), Dispatch::Resolved);
        assert_eq!(message.poll(), Some(DialogResult::Cancelled));
        assert_eq!(confirm.poll(), None);
        assert_eq!(host.top(), Some(DialogKind::Confirm));
    }

    #[test]
    fn dropping_host_cancels_pending_handles() {
        let mut host = DialogHost::new();
        let mut handle = host.open_text_input(DialogRequest::new("t", "p")).expect("open");
        drop(host);
        assert_eq!(handle.poll(), Some(DialogResult::Cancelled));
    }
}
