//! Scripted in-memory sessions for tests

use netscope_core::{DeviceDescriptor, NetError, NetResult};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::session::{Connector, ParseOutcome, Session};

/// Canned responses for one device
#[derive(Debug, Clone, Default)]
pub struct MockScript {
    parse: HashMap<String, NetResult<ParseOutcome>>,
    execute: HashMap<String, NetResult<String>>,
    connect_error: Option<NetError>,
    connect_delay: Duration,
    call_delay: Duration,
}

impl MockScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parsed(mut self, command: &str, data: Value) -> Self {
        self.parse
            .insert(command.to_string(), Ok(ParseOutcome::Parsed(data)));
        self
    }

    pub fn with_empty_parse(mut self, command: &str) -> Self {
        self.parse.insert(command.to_string(), Ok(ParseOutcome::Empty));
        self
    }

    pub fn with_parse_error(mut self, command: &str, error: NetError) -> Self {
        self.parse.insert(command.to_string(), Err(error));
        self
    }

    pub fn with_raw(mut self, command: &str, output: &str) -> Self {
        self.execute
            .insert(command.to_string(), Ok(output.to_string()));
        self
    }

    pub fn with_execute_error(mut self, command: &str, error: NetError) -> Self {
        self.execute.insert(command.to_string(), Err(error));
        self
    }

    pub fn with_connect_error(mut self, error: NetError) -> Self {
        self.connect_error = Some(error);
        self
    }

    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    pub fn with_call_delay(mut self, delay: Duration) -> Self {
        self.call_delay = delay;
        self
    }
}

#[derive(Debug, Default)]
struct Counters {
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    parses: AtomicUsize,
    executes: AtomicUsize,
}

/// Session that replays a [`MockScript`]
#[derive(Debug)]
pub struct MockSession {
    device: String,
    script: MockScript,
    counters: Arc<Counters>,
    alive: AtomicBool,
}

impl MockSession {
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Simulate the device dropping the connection
    pub fn kill(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}

impl Session for MockSession {
    fn connect(&self) -> NetResult<()> {
        self.counters.connects.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.script.connect_delay);
        if let Some(err) = &self.script.connect_error {
            return Err(err.clone());
        }
        self.alive.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn disconnect(&self) -> NetResult<()> {
        self.counters.disconnects.fetch_add(1, Ordering::SeqCst);
        self.alive.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn parse(&self, command: &str) -> NetResult<ParseOutcome> {
        self.counters.parses.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.script.call_delay);
        self.script.parse.get(command).cloned().unwrap_or_else(|| {
            Err(NetError::Execution(format!("no parser for '{}'", command)))
        })
    }

    fn execute(&self, command: &str) -> NetResult<String> {
        self.counters.executes.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.script.call_delay);
        self.script.execute.get(command).cloned().unwrap_or_else(|| {
            Err(NetError::Execution(format!("invalid command '{}'", command)))
        })
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

/// Connector handing out [`MockSession`]s and counting every call they see
#[derive(Debug, Default)]
pub struct MockConnector {
    scripts: HashMap<String, MockScript>,
    counters: Arc<Counters>,
    opened: Mutex<Vec<Arc<MockSession>>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(mut self, name: &str, script: MockScript) -> Self {
        self.scripts.insert(name.to_string(), script);
        self
    }

    pub fn connects(&self) -> usize {
        self.counters.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.counters.disconnects.load(Ordering::SeqCst)
    }

    pub fn parses(&self) -> usize {
        self.counters.parses.load(Ordering::SeqCst)
    }

    pub fn executes(&self) -> usize {
        self.counters.executes.load(Ordering::SeqCst)
    }

    /// Number of sessions built so far
    pub fn opened(&self) -> usize {
        self.opened.lock().map(|o| o.len()).unwrap_or_default()
    }

    /// Most recently built session for `name`
    pub fn last_session(&self, name: &str) -> Option<Arc<MockSession>> {
        let opened = self.opened.lock().ok()?;
        opened.iter().rev().find(|s| s.device == name).cloned()
    }
}

impl Connector for MockConnector {
    fn open(&self, device: &DeviceDescriptor) -> Arc<dyn Session> {
        let session = Arc::new(MockSession {
            device: device.name.clone(),
            script: self.scripts.get(&device.name).cloned().unwrap_or_default(),
            counters: Arc::clone(&self.counters),
            alive: AtomicBool::new(false),
        });
        if let Ok(mut opened) = self.opened.lock() {
            opened.push(Arc::clone(&session));
        }
        session
    }
}
