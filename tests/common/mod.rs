// ABOUTME: Common utilities and helpers for integration tests
// ABOUTME: Provides stub handlers, failing sinks and executor setup shared by test files

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use autodevops::engine::WorkflowExecutor;
use autodevops::logging::{ExecutionLogger, LogError, LogRecord, LogSink, MemorySink};
use autodevops::parser::{TaskKind, TaskParams, TaskSpec, WorkflowDefinition};
use autodevops::store::InMemoryStore;
use autodevops::tasks::{HandlerError, HandlerTable, TaskHandler};
use autodevops::template::Inputs;

pub enum Behavior {
    /// Return this payload
    Succeed(JsonValue),
    /// Return the resolved params as the payload
    Echo,
    /// Return a handler error with this message
    Fail(String),
    /// Panic with this message
    Panic(String),
}

/// Handler double that counts calls and records the params it received.
pub struct StubHandler {
    kind: TaskKind,
    behavior: Behavior,
    delay: Option<Duration>,
    calls: AtomicUsize,
    seen: Mutex<Vec<TaskParams>>,
}

impl StubHandler {
    pub fn new(kind: TaskKind, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            kind,
            behavior,
            delay: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn succeeding(kind: TaskKind, payload: JsonValue) -> Arc<Self> {
        Self::new(kind, Behavior::Succeed(payload))
    }

    pub fn echo(kind: TaskKind) -> Arc<Self> {
        Self::new(kind, Behavior::Echo)
    }

    pub fn failing(kind: TaskKind, message: &str) -> Arc<Self> {
        Self::new(kind, Behavior::Fail(message.to_string()))
    }

    pub fn panicking(kind: TaskKind, message: &str) -> Arc<Self> {
        Self::new(kind, Behavior::Panic(message.to_string()))
    }

    pub fn slow_echo(kind: TaskKind, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            kind,
            behavior: Behavior::Echo,
            delay: Some(delay),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<TaskParams> {
        self.seen.lock().unwrap().clone()
    }

    pub fn last_params(&self) -> TaskParams {
        self.seen().last().cloned().expect("handler was never called")
    }
}

#[async_trait]
impl TaskHandler for StubHandler {
    fn kind(&self) -> TaskKind {
        self.kind
    }

    async fn execute(&self, params: &TaskParams) -> autodevops::tasks::Result<JsonValue> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(params.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.behavior {
            Behavior::Succeed(payload) => Ok(payload.clone()),
            Behavior::Echo => Ok(serde_json::to_value(params)?),
            Behavior::Fail(message) => Err(HandlerError::Process(message.clone())),
            Behavior::Panic(message) => panic!("{}", message),
        }
    }
}

/// Sink that rejects every record.
pub struct FailingSink {
    pub attempts: AtomicUsize,
}

impl FailingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            attempts: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl LogSink for FailingSink {
    async fn append(&self, _record: &LogRecord) -> autodevops::logging::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(LogError::Sink("sink offline".to_string()))
    }
}

/// Executor over an in-memory store, logging into a memory sink.
pub fn executor_with(
    definitions: Vec<WorkflowDefinition>,
    handlers: Vec<Arc<StubHandler>>,
) -> (WorkflowExecutor, Arc<MemorySink>) {
    let store = definitions
        .into_iter()
        .fold(InMemoryStore::new(), |store, d| store.with_definition(d));

    let mut table = HandlerTable::new();
    for handler in handlers {
        table.register(handler);
    }

    let sink = Arc::new(MemorySink::new());
    let executor = WorkflowExecutor::new(Arc::new(store), table)
        .with_logger(ExecutionLogger::new(sink.clone()));

    (executor, sink)
}

/// Stub handlers for every kind, each echoing its params.
pub fn echo_handlers() -> Vec<Arc<StubHandler>> {
    TaskKind::ALL.into_iter().map(StubHandler::echo).collect()
}

/// `{w1: [t1 HttpRequest url=https://example]}`
pub fn w1() -> WorkflowDefinition {
    WorkflowDefinition::new("w1", "default").with_task(
        TaskSpec::new("t1", TaskKind::HttpRequest).with_param("url", "https://example"),
    )
}

/// Three HTTP tasks, each pointing at the previous task's output.
pub fn chain(id: &str) -> WorkflowDefinition {
    WorkflowDefinition::new(id, "default")
        .with_task(TaskSpec::new("t1", TaskKind::HttpRequest).with_param("url", "https://a"))
        .with_task(
            TaskSpec::new("t2", TaskKind::HttpRequest).with_param("url", "{{results.t1.url}}/b"),
        )
        .with_task(
            TaskSpec::new("t3", TaskKind::HttpRequest).with_param("url", "{{results.t2.url}}/c"),
        )
}

pub fn inputs(pairs: &[(&str, JsonValue)]) -> Inputs {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

pub fn no_inputs() -> Inputs {
    Inputs::new()
}

pub fn processor_output() -> JsonValue {
    json!({
        "output": "Processor Title\nProcessor body",
        "title": "Processor Title",
        "body": "Processor body",
        "model": "stub"
    })
}
