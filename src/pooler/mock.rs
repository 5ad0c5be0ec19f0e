//! Scripted in-memory pooler for tests.
//!
//! A [`MockPooler`] answers commands from a table of canned replies and
//! records every command text it receives. [`MockConnector`] hands out
//! links to one mock pooler per host name.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::{Connector, Link, LinkError, LinkStatus, Reply};
use crate::session::Descriptor;

#[derive(Default)]
struct PoolerState {
    replies: HashMap<String, Result<Reply, String>>,
    sent: Vec<String>,
    password: Option<String>,
    unreachable: bool,
    down: bool,
    connects: usize,
}

/// Shared handle to a scripted pooler. Clones observe the same state.
#[derive(Clone, Default)]
pub struct MockPooler {
    state: Rc<RefCell<PoolerState>>,
}

impl MockPooler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `command` with `reply` from now on.
    pub fn respond(&self, command: &str, reply: Reply) {
        self.state
            .borrow_mut()
            .replies
            .insert(command.to_string(), Ok(reply));
    }

    /// Answers `command` with a server error.
    pub fn fail(&self, command: &str, message: &str) {
        self.state
            .borrow_mut()
            .replies
            .insert(command.to_string(), Err(message.to_string()));
    }

    /// Requires `password` on connect.
    pub fn require_password(&self, password: &str) {
        self.state.borrow_mut().password = Some(password.to_string());
    }

    /// Refuses new connections (and reconnects) while set.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.borrow_mut().unreachable = unreachable;
    }

    /// Simulates the server dropping established connections.
    pub fn drop_connections(&self) {
        self.state.borrow_mut().down = true;
    }

    /// Every command text received so far, in order.
    pub fn sent(&self) -> Vec<String> {
        self.state.borrow().sent.clone()
    }

    /// Number of successful connects and reconnects.
    pub fn connects(&self) -> usize {
        self.state.borrow().connects
    }

    /// Opens a link without going through a connector.
    pub fn link(&self) -> Box<dyn Link> {
        self.state.borrow_mut().connects += 1;
        Box::new(MockLink {
            state: Rc::clone(&self.state),
        })
    }

    fn accept(&self, password: Option<&str>) -> Result<Box<dyn Link>, LinkError> {
        {
            let state = self.state.borrow();
            if state.unreachable {
                return Err(LinkError::Connect("connection refused".to_string()));
            }
            if let Some(required) = &state.password {
                match password {
                    None => return Err(LinkError::NeedsPassword),
                    Some(given) if given != required => {
                        return Err(LinkError::Connect(
                            "password authentication failed".to_string(),
                        ));
                    }
                    Some(_) => {}
                }
            }
        }
        self.state.borrow_mut().down = false;
        Ok(self.link())
    }
}

struct MockLink {
    state: Rc<RefCell<PoolerState>>,
}

impl Link for MockLink {
    fn execute(&mut self, command: &str) -> Result<Reply, LinkError> {
        let mut state = self.state.borrow_mut();
        if state.down {
            return Err(LinkError::Command(
                "server closed the connection unexpectedly".to_string(),
            ));
        }
        state.sent.push(command.to_string());
        match state.replies.get(command) {
            Some(Ok(reply)) => Ok(reply.clone()),
            Some(Err(message)) => Err(LinkError::Command(message.clone())),
            None => Err(LinkError::Command(format!(
                "ERROR: unsupported command: {}",
                command
            ))),
        }
    }

    fn status(&self) -> LinkStatus {
        if self.state.borrow().down {
            LinkStatus::Bad
        } else {
            LinkStatus::Ok
        }
    }

    fn reset(&mut self) -> Result<(), LinkError> {
        let mut state = self.state.borrow_mut();
        if state.unreachable {
            return Err(LinkError::Connect("connection refused".to_string()));
        }
        state.down = false;
        state.connects += 1;
        Ok(())
    }
}

/// Connector routing each descriptor to the mock pooler for its host.
#[derive(Default)]
pub struct MockConnector {
    poolers: RefCell<HashMap<String, MockPooler>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The pooler serving `host`, created on first use.
    pub fn pooler(&self, host: &str) -> MockPooler {
        self.poolers
            .borrow_mut()
            .entry(host.to_string())
            .or_default()
            .clone()
    }
}

impl Connector for MockConnector {
    fn connect(&self, descriptor: &Descriptor) -> Result<Box<dyn Link>, LinkError> {
        self.pooler(&descriptor.host)
            .accept(descriptor.password.as_deref())
    }
}
