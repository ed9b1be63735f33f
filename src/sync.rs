//! View-state synchronizer.
//!
//! Each user gesture goes through three steps:
//!
//! 1. A `request_*` method on [`ViewState`] applies the local guards and returns the
//!    [`Action`] to perform, or `None` when no request should be issued.
//! 2. [`execute`] performs the remote mutation and then always re-fetches the full list,
//!    emitting one [`Event`] per completed call.
//! 3. [`ViewState::apply`] folds each event back into the state.
//!
//! There is no optimistic update and no merge: the list is replaced wholesale by
//! whatever the server last returned. Only the UI thread ever calls `apply`, so the
//! state needs no locking; [`Synchronizer`] moves events from the runtime back to it.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::{info, warn};

use crate::api::{ApiResult, TodoApi};
use crate::notify::{Toast, Toasts};
use crate::todo::{remaining, Todo};
use crate::tui::input::InputField;

const STATUS_OK: u16 = 200;
const STATUS_CREATED: u16 = 201;

/// One user-triggered round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Load,
    Add { title: String },
    Complete { id: String },
    Delete { id: String },
    CompleteAll,
    ClearCompleted,
}

/// In-flight token. Two gestures with the same key never overlap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ActionKey {
    Add,
    Complete(String),
    Delete(String),
    CompleteAll,
    ClearCompleted,
}

impl Action {
    fn key(&self) -> Option<ActionKey> {
        match self {
            Action::Load => None,
            Action::Add { .. } => Some(ActionKey::Add),
            Action::Complete { id } => Some(ActionKey::Complete(id.clone())),
            Action::Delete { id } => Some(ActionKey::Delete(id.clone())),
            Action::CompleteAll => Some(ActionKey::CompleteAll),
            Action::ClearCompleted => Some(ActionKey::ClearCompleted),
        }
    }

    /// Envelope status that counts as success for this action's mutation.
    fn success_status(&self) -> u16 {
        match self {
            Action::Add { .. } => STATUS_CREATED,
            _ => STATUS_OK,
        }
    }
}

/// Result of a mutation as the user sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success,
    Failure(String),
}

/// A completed remote call.
#[derive(Debug)]
pub enum Event {
    /// The mutation part of an action finished, successfully or not.
    Settled { action: Action, notice: Notice },
    /// A list fetch finished.
    Listed(ApiResult),
}

/// Everything the view renders.
#[derive(Debug, Clone)]
pub struct ViewState {
    /// Server order, never sorted locally.
    pub todos: Vec<Todo>,
    pub input: InputField,
    /// Incomplete items in `todos`, recomputed on every successful fetch.
    pub remaining: usize,
    pub toasts: Toasts,
    in_flight: HashSet<ActionKey>,
}

impl ViewState {
    pub fn new(toast_lifetime: Duration) -> Self {
        Self {
            todos: Vec::new(),
            input: InputField::new(),
            remaining: 0,
            toasts: Toasts::new(toast_lifetime),
            in_flight: HashSet::new(),
        }
    }

    pub fn is_completing_all(&self) -> bool {
        self.in_flight.contains(&ActionKey::CompleteAll)
    }

    pub fn is_clearing_completed(&self) -> bool {
        self.in_flight.contains(&ActionKey::ClearCompleted)
    }

    pub fn is_adding(&self) -> bool {
        self.in_flight.contains(&ActionKey::Add)
    }

    /// True while a complete or delete for `id` is in flight.
    pub fn is_item_busy(&self, id: &str) -> bool {
        self.in_flight.contains(&ActionKey::Complete(id.to_string()))
            || self.in_flight.contains(&ActionKey::Delete(id.to_string()))
    }

    pub fn has_completed(&self) -> bool {
        self.todos.len() > self.remaining
    }

    pub fn request_load(&self) -> Action {
        Action::Load
    }

    /// Add the trimmed input text. Empty or whitespace-only input issues nothing.
    pub fn request_add(&mut self) -> Option<Action> {
        let title = self.input.value.trim();
        if title.is_empty() {
            return None;
        }
        let action = Action::Add {
            title: title.to_string(),
        };
        self.claim(action)
    }

    /// Complete an open item. Completed or unknown items are inert.
    pub fn request_complete(&mut self, id: &str) -> Option<Action> {
        let open = self.todos.iter().any(|t| t.id == id && !t.completed);
        if !open {
            return None;
        }
        self.claim(Action::Complete { id: id.to_string() })
    }

    pub fn request_delete(&mut self, id: &str) -> Option<Action> {
        self.claim(Action::Delete { id: id.to_string() })
    }

    /// Only when at least one item is still open.
    pub fn request_complete_all(&mut self) -> Option<Action> {
        if self.remaining == 0 {
            return None;
        }
        self.claim(Action::CompleteAll)
    }

    /// Only when at least one item is completed.
    pub fn request_clear_completed(&mut self) -> Option<Action> {
        if !self.has_completed() {
            return None;
        }
        self.claim(Action::ClearCompleted)
    }

    fn claim(&mut self, action: Action) -> Option<Action> {
        if let Some(key) = action.key() {
            if !self.in_flight.insert(key) {
                info!(?action, "ignoring gesture, identical request in flight");
                return None;
            }
        }
        Some(action)
    }

    /// Fold a completed remote call into the state.
    pub fn apply(&mut self, event: Event) {
        match event {
            Event::Settled { action, notice } => {
                if let Some(key) = action.key() {
                    self.in_flight.remove(&key);
                }
                match notice {
                    Notice::Success => self.toasts.push(Toast::success()),
                    Notice::Failure(message) => {
                        warn!(?action, %message, "action failed");
                        self.toasts.push(Toast::error(message));
                    }
                }
                // Delete shares the add path's input reset.
                if matches!(action, Action::Add { .. } | Action::Delete { .. }) {
                    self.input.clear();
                }
            }
            Event::Listed(Ok(envelope)) if envelope.meta.status == STATUS_OK => {
                match serde_json::from_value::<Vec<Todo>>(envelope.data) {
                    Ok(todos) => {
                        self.remaining = remaining(&todos);
                        self.todos = todos;
                    }
                    Err(e) => {
                        warn!(error = %e, "list payload did not decode");
                        self.toasts
                            .push(Toast::error(format!("could not read todo list: {e}")));
                    }
                }
            }
            Event::Listed(Ok(envelope)) => {
                let message = envelope.error_message();
                warn!(status = envelope.meta.status, %message, "list load rejected");
                self.toasts.push(Toast::error(message));
            }
            Event::Listed(Err(e)) => {
                warn!(error = %e, "list load failed");
                self.toasts.push(Toast::error(e.to_string()));
            }
        }
    }
}

/// Perform one action against the service.
///
/// The mutation (if any) settles first, then the full list is re-fetched regardless of
/// how the mutation went. `emit` is called once per finished call, in that order.
pub async fn execute<F>(api: &dyn TodoApi, action: Action, mut emit: F)
where
    F: FnMut(Event),
{
    let result = match &action {
        Action::Load => None,
        Action::Add { title } => Some(api.create(title).await),
        Action::Complete { id } => Some(api.complete(id).await),
        Action::Delete { id } => Some(api.delete(id).await),
        Action::CompleteAll => Some(api.complete_all().await),
        Action::ClearCompleted => Some(api.clear_completed().await),
    };

    if let Some(result) = result {
        let notice = settle(&action, result);
        emit(Event::Settled { action, notice });
    }

    emit(Event::Listed(api.list().await));
}

/// [`execute`], collecting the events instead of streaming them.
pub async fn run(api: &dyn TodoApi, action: Action) -> Vec<Event> {
    let mut events = Vec::with_capacity(2);
    execute(api, action, |event| events.push(event)).await;
    events
}

fn settle(action: &Action, result: ApiResult) -> Notice {
    match result {
        Ok(envelope) if envelope.meta.status == action.success_status() => Notice::Success,
        Ok(envelope) => Notice::Failure(envelope.error_message()),
        Err(e) => Notice::Failure(e.to_string()),
    }
}

/// Runs actions on a tokio runtime and hands their events back to the UI thread.
pub struct Synchronizer {
    api: Arc<dyn TodoApi>,
    runtime: Handle,
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
}

impl Synchronizer {
    pub fn new(api: Arc<dyn TodoApi>, runtime: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            api,
            runtime,
            tx,
            rx,
        }
    }

    /// Fire an action in the background. `None` is a no-op so gesture results can be
    /// passed straight through.
    pub fn dispatch(&self, action: Option<Action>) {
        let Some(action) = action else {
            return;
        };
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            execute(api.as_ref(), action, |event| {
                // Receiver only goes away on shutdown.
                let _ = tx.send(event);
            })
            .await;
        });
    }

    /// Apply every event that has arrived so far. Returns how many were applied.
    pub fn drain(&mut self, state: &mut ViewState) -> usize {
        let mut applied = 0;
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    state.apply(event);
                    applied += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Envelope, Meta};
    use crate::notify::ToastLevel;
    use serde_json::{json, Value};

    fn envelope(status: u16, data: Value) -> Envelope<Value> {
        Envelope {
            meta: Meta {
                status,
                timestamp: "2024-05-01T10:00:00Z".into(),
            },
            data,
        }
    }

    fn item(id: &str, title: &str, completed: bool) -> Value {
        json!({
            "id": id,
            "title": title,
            "completed": completed,
            "completed_at": if completed { json!("2024-05-01T11:00:00Z") } else { Value::Null },
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-01T10:00:00Z"
        })
    }

    fn state_with(items: Vec<Value>) -> ViewState {
        let mut state = ViewState::new(Duration::from_secs(1));
        state.apply(Event::Listed(Ok(envelope(200, Value::Array(items)))));
        state
    }

    #[test]
    fn successful_list_replaces_state_and_counts_remaining() {
        let state = state_with(vec![item("1", "buy milk", false)]);
        assert_eq!(state.todos.len(), 1);
        assert_eq!(state.remaining, 1);
        assert!(state.toasts.is_empty());
    }

    #[test]
    fn rejected_list_keeps_previous_snapshot() {
        let mut state = state_with(vec![item("1", "a", false), item("2", "b", true)]);
        state.apply(Event::Listed(Ok(envelope(500, json!({ "message": "down" })))));
        assert_eq!(state.todos.len(), 2);
        assert_eq!(state.remaining, 1);
        assert_eq!(state.toasts.latest().unwrap().message, "down");
    }

    #[test]
    fn undecodable_list_payload_keeps_previous_snapshot() {
        let mut state = state_with(vec![item("1", "a", false)]);
        state.apply(Event::Listed(Ok(envelope(200, json!({ "not": "a list" })))));
        assert_eq!(state.todos.len(), 1);
        assert_eq!(state.toasts.latest().unwrap().level, ToastLevel::Error);
    }

    #[test]
    fn blank_input_issues_nothing() {
        let mut state = ViewState::new(Duration::from_secs(1));
        assert_eq!(state.request_add(), None);
        state.input.set("   \t ");
        assert_eq!(state.request_add(), None);
        assert_eq!(state.input.value, "   \t ");
        assert!(!state.is_adding());
    }

    #[test]
    fn add_sends_trimmed_title_and_blocks_duplicates() {
        let mut state = ViewState::new(Duration::from_secs(1));
        state.input.set("  write report ");
        assert_eq!(
            state.request_add(),
            Some(Action::Add {
                title: "write report".into()
            })
        );
        assert!(state.is_adding());
        assert_eq!(state.request_add(), None);

        state.apply(Event::Settled {
            action: Action::Add {
                title: "write report".into(),
            },
            notice: Notice::Success,
        });
        assert!(!state.is_adding());
        assert!(state.input.value.is_empty());
        assert_eq!(state.toasts.latest().unwrap().message, "Success");
    }

    #[test]
    fn completed_items_are_inert() {
        let mut state = state_with(vec![item("1", "a", false), item("2", "b", true)]);
        assert_eq!(state.request_complete("2"), None);
        assert_eq!(state.request_complete("missing"), None);
        assert_eq!(
            state.request_complete("1"),
            Some(Action::Complete { id: "1".into() })
        );
        assert!(state.is_item_busy("1"));
        assert_eq!(state.request_complete("1"), None);
    }

    #[test]
    fn delete_is_keyed_per_item_and_clears_input() {
        let mut state = state_with(vec![item("1", "a", false), item("2", "b", false)]);
        assert!(state.request_delete("1").is_some());
        assert!(state.request_delete("1").is_none());
        assert!(state.request_delete("2").is_some());

        state.input.set("draft");
        state.apply(Event::Settled {
            action: Action::Delete { id: "1".into() },
            notice: Notice::Failure("not found".into()),
        });
        assert!(state.input.value.is_empty());
        assert!(!state.is_item_busy("1"));
        assert!(state.is_item_busy("2"));
        assert_eq!(state.toasts.latest().unwrap().level, ToastLevel::Error);
    }

    #[test]
    fn completing_an_item_keeps_the_input() {
        let mut state = state_with(vec![item("1", "a", false)]);
        state.input.set("draft");
        let action = state.request_complete("1").unwrap();
        state.apply(Event::Settled {
            action,
            notice: Notice::Success,
        });
        assert_eq!(state.input.value, "draft");
    }

    #[test]
    fn bulk_guards_follow_counts() {
        let mut none_open = state_with(vec![item("1", "a", true)]);
        assert_eq!(none_open.request_complete_all(), None);
        assert!(none_open.request_clear_completed().is_some());
        assert!(none_open.is_clearing_completed());
        assert_eq!(none_open.request_clear_completed(), None);

        let mut none_done = state_with(vec![item("1", "a", false)]);
        assert_eq!(none_done.request_clear_completed(), None);
        assert!(none_done.request_complete_all().is_some());
        assert!(none_done.is_completing_all());

        none_done.apply(Event::Settled {
            action: Action::CompleteAll,
            notice: Notice::Success,
        });
        assert!(!none_done.is_completing_all());
    }

    #[test]
    fn empty_list_disables_both_bulk_actions() {
        let mut state = ViewState::new(Duration::from_secs(1));
        assert_eq!(state.request_complete_all(), None);
        assert_eq!(state.request_clear_completed(), None);
    }

    #[test]
    fn settle_matches_expected_status_per_action() {
        let add = Action::Add { title: "x".into() };
        assert_eq!(settle(&add, Ok(envelope(201, Value::Null))), Notice::Success);
        assert_eq!(
            settle(&add, Ok(envelope(200, Value::Null))),
            Notice::Failure("request failed with status 200".into())
        );
        assert_eq!(
            settle(&Action::CompleteAll, Ok(envelope(200, Value::Null))),
            Notice::Success
        );
        assert_eq!(
            settle(
                &Action::Complete { id: "1".into() },
                Ok(envelope(500, json!({ "message": "server error" })))
            ),
            Notice::Failure("server error".into())
        );
    }
}
