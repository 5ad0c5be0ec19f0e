//! Session registry: up to eight monitored poolers.
//!
//! Sessions live in a fixed slot array. Active sessions always occupy a
//! contiguous prefix of the array; closing one shifts every session above
//! it down by one slot.

pub mod bookmarks;
mod descriptor;

pub use descriptor::{DEFAULT_DBNAME, DEFAULT_HOST, DEFAULT_PORT, Descriptor};

use tracing::{debug, info, warn};

use crate::collector::LogCursor;
use crate::pooler::{Connector, Link, LinkError, LinkStatus};

/// Number of session slots.
pub const MAX_SESSIONS: usize = 8;

/// Status line shown when a dropped link is being re-established.
pub const RECONNECT_MESSAGE: &str =
    "The connection to the server was lost. Attempting reconnect.";

/// Error type for registry operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// All slots are taken.
    NoFreeSlot,
    /// Connecting failed; the slot was rolled back.
    ConnectFailed(String),
    /// A password was required and the prompt was cancelled or left empty.
    PasswordRequired,
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::NoFreeSlot => write!(f, "No free consoles."),
            RegistryError::ConnectFailed(msg) => {
                write!(f, "Unable to connect to the pgbouncer: {}", msg)
            }
            RegistryError::PasswordRequired => {
                write!(f, "Unable to connect to the pgbouncer: password required.")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// One monitored pooler.
pub struct Session {
    descriptor: Descriptor,
    link: Option<Box<dyn Link>>,
    log: Option<LogCursor>,
}

impl Session {
    fn new(descriptor: Descriptor) -> Self {
        Self {
            descriptor,
            link: None,
            log: None,
        }
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// Link health; a session without a link counts as down.
    pub fn status(&self) -> LinkStatus {
        self.link
            .as_ref()
            .map_or(LinkStatus::Bad, |link| link.status())
    }

    /// Runs `f` against the live link, if any.
    pub fn with_link<T>(&mut self, f: impl FnOnce(&mut dyn Link) -> T) -> Option<T> {
        self.link.as_mut().map(|link| f(link.as_mut()))
    }

    pub fn log_mut(&mut self) -> Option<&mut LogCursor> {
        self.log.as_mut()
    }

    pub fn has_log(&self) -> bool {
        self.log.is_some()
    }

    pub fn open_log(&mut self, cursor: LogCursor) {
        self.log = Some(cursor);
    }

    /// Closes the log cursor. Returns false if none was open.
    pub fn close_log(&mut self) -> bool {
        self.log.take().is_some()
    }
}

/// Result of closing a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The last session is gone; the program should exit.
    Terminate,
    /// Slot that is current after the close.
    Current(usize),
}

/// Result of a reconnect check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconnect {
    /// The link was healthy; nothing done.
    Healthy,
    /// The link was down and has been re-established.
    Restored,
    /// The link was down and the single attempt failed.
    Failed(LinkError),
}

/// Fixed-capacity slot array of sessions.
pub struct Registry {
    slots: [Option<Session>; MAX_SESSIONS],
    current: usize,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            current: 0,
        }
    }

    /// Number of active sessions (the length of the active prefix).
    pub fn active_count(&self) -> usize {
        self.slots.iter().take_while(|s| s.is_some()).count()
    }

    pub fn is_active(&self, slot: usize) -> bool {
        self.slots.get(slot).is_some_and(Option::is_some)
    }

    /// Index of the session the UI shows.
    pub fn current(&self) -> usize {
        self.current
    }

    pub fn session(&self, slot: usize) -> Option<&Session> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn session_mut(&mut self, slot: usize) -> Option<&mut Session> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    pub fn current_session(&self) -> Option<&Session> {
        self.session(self.current)
    }

    pub fn current_session_mut(&mut self) -> Option<&mut Session> {
        self.session_mut(self.current)
    }

    /// Active sessions in slot order.
    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.slots.iter().map_while(Option::as_ref)
    }

    fn free_slot(&self) -> Result<usize, RegistryError> {
        let slot = self.active_count();
        if slot < MAX_SESSIONS {
            Ok(slot)
        } else {
            Err(RegistryError::NoFreeSlot)
        }
    }

    /// Adds and connects a session in the first free slot.
    ///
    /// When the server wants a password that the descriptor lacks,
    /// `password_prompt` is asked once. Any failure rolls the slot back.
    /// On success the new session becomes current.
    pub fn add_session(
        &mut self,
        connector: &dyn Connector,
        descriptor: Descriptor,
        password_prompt: &mut dyn FnMut(&Descriptor) -> Option<String>,
    ) -> Result<usize, RegistryError> {
        let slot = self.free_slot()?;
        let mut session = Session::new(descriptor);
        session.link = Some(connect(connector, &mut session.descriptor, password_prompt)?);
        info!(slot, pooler = %session.descriptor, "session added");
        self.slots[slot] = Some(session);
        self.current = slot;
        Ok(slot)
    }

    /// Startup variant of [`add_session`](Self::add_session): the slot is
    /// kept even when the server cannot be reached right now, leaving the
    /// engine's reconnect check to retry it.
    pub fn seed(
        &mut self,
        connector: &dyn Connector,
        descriptor: Descriptor,
        password_prompt: &mut dyn FnMut(&Descriptor) -> Option<String>,
    ) -> Result<usize, RegistryError> {
        let slot = self.free_slot()?;
        let mut session = Session::new(descriptor);
        match connect(connector, &mut session.descriptor, password_prompt) {
            Ok(link) => session.link = Some(link),
            Err(e) => warn!(slot, pooler = %session.descriptor, error = %e, "seeded session is not connected"),
        }
        self.slots[slot] = Some(session);
        Ok(slot)
    }

    /// Closes `slot`, compacting the sessions above it.
    pub fn close_session(&mut self, slot: usize) -> CloseOutcome {
        let Some(closed) = self.slots.get_mut(slot).and_then(Option::take) else {
            return CloseOutcome::Current(self.current);
        };
        info!(slot, pooler = %closed.descriptor, "session closed");
        drop(closed);

        let mut i = slot;
        while i + 1 < MAX_SESSIONS && self.slots[i + 1].is_some() {
            self.slots[i] = self.slots[i + 1].take();
            i += 1;
        }

        if self.active_count() == 0 {
            self.current = 0;
            return CloseOutcome::Terminate;
        }

        self.current = slot.saturating_sub(1);
        CloseOutcome::Current(self.current)
    }

    /// Makes `slot` current. Returns false, changing nothing, if it is
    /// not active.
    pub fn switch_to(&mut self, slot: usize) -> bool {
        if self.is_active(slot) {
            self.current = slot;
            true
        } else {
            false
        }
    }

    /// Re-establishes the link of `slot` once if it is down.
    pub fn reconnect_if_down(&mut self, connector: &dyn Connector, slot: usize) -> Reconnect {
        let Some(session) = self.session_mut(slot) else {
            return Reconnect::Healthy;
        };
        if session.status() == LinkStatus::Ok {
            return Reconnect::Healthy;
        }

        debug!(slot, pooler = %session.descriptor, "attempting reconnect");
        let result = match session.link.as_mut() {
            Some(link) => link.reset(),
            None => connector
                .connect(&session.descriptor)
                .map(|link| session.link = Some(link)),
        };
        match result {
            Ok(()) => {
                info!(slot, "reconnected");
                Reconnect::Restored
            }
            Err(e) => {
                warn!(slot, error = %e, "reconnect failed");
                Reconnect::Failed(e)
            }
        }
    }

    /// Drops every session and its link.
    pub fn close_all(&mut self) {
        for slot in self.slots.iter_mut() {
            if let Some(session) = slot.take() {
                debug!(pooler = %session.descriptor, "disconnecting");
            }
        }
        self.current = 0;
    }
}

/// Connects, asking for a password once if the server demands one. A
/// password obtained from the prompt is stored in `descriptor`.
fn connect(
    connector: &dyn Connector,
    descriptor: &mut Descriptor,
    password_prompt: &mut dyn FnMut(&Descriptor) -> Option<String>,
) -> Result<Box<dyn Link>, RegistryError> {
    match connector.connect(descriptor) {
        Ok(link) => Ok(link),
        Err(LinkError::NeedsPassword) if descriptor.password.is_none() => {
            let password = password_prompt(descriptor)
                .filter(|p| !p.is_empty())
                .ok_or(RegistryError::PasswordRequired)?;
            descriptor.password = Some(password);
            connector.connect(descriptor).map_err(|e| {
                descriptor.password = None;
                connect_failed(e)
            })
        }
        Err(LinkError::NeedsPassword) => Err(RegistryError::PasswordRequired),
        Err(e) => Err(connect_failed(e)),
    }
}

fn connect_failed(e: LinkError) -> RegistryError {
    match e {
        LinkError::Connect(msg) | LinkError::Command(msg) => RegistryError::ConnectFailed(msg),
        other => RegistryError::ConnectFailed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pooler::mock::MockConnector;
    use proptest::prelude::*;

    fn desc(host: &str) -> Descriptor {
        Descriptor::new(host, 6432, "admin", "pgbouncer")
    }

    fn no_prompt() -> impl FnMut(&Descriptor) -> Option<String> {
        |_| None
    }

    fn hosts(registry: &Registry) -> Vec<String> {
        registry
            .sessions()
            .map(|s| s.descriptor().host.clone())
            .collect()
    }

    fn assert_contiguous(registry: &Registry) {
        let k = registry.active_count();
        for slot in 0..MAX_SESSIONS {
            assert_eq!(registry.is_active(slot), slot < k, "slot {} breaks prefix", slot);
        }
    }

    fn filled(connector: &MockConnector, n: usize) -> Registry {
        let mut registry = Registry::new();
        for i in 0..n {
            registry
                .add_session(connector, desc(&format!("h{}", i)), &mut no_prompt())
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_add_uses_first_free_slot_and_becomes_current() {
        let connector = MockConnector::new();
        let mut registry = filled(&connector, 2);
        assert_eq!(registry.current(), 1);
        let slot = registry
            .add_session(&connector, desc("h2"), &mut no_prompt())
            .unwrap();
        assert_eq!(slot, 2);
        assert_eq!(registry.current(), 2);
        assert_eq!(registry.active_count(), 3);
    }

    #[test]
    fn test_add_when_full() {
        let connector = MockConnector::new();
        let mut registry = filled(&connector, MAX_SESSIONS);
        let err = registry
            .add_session(&connector, desc("extra"), &mut no_prompt())
            .unwrap_err();
        assert_eq!(err, RegistryError::NoFreeSlot);
        assert_eq!(err.to_string(), "No free consoles.");
    }

    #[test]
    fn test_add_failure_rolls_back() {
        let connector = MockConnector::new();
        connector.pooler("down").set_unreachable(true);
        let mut registry = filled(&connector, 1);
        let err = registry
            .add_session(&connector, desc("down"), &mut no_prompt())
            .unwrap_err();
        assert!(matches!(err, RegistryError::ConnectFailed(_)));
        assert_eq!(registry.active_count(), 1);
        assert_eq!(registry.current(), 0);
    }

    #[test]
    fn test_password_prompt() {
        let connector = MockConnector::new();
        connector.pooler("secure").require_password("pw");
        let mut registry = Registry::new();

        let mut asked = 0;
        let mut prompt = |_: &Descriptor| {
            asked += 1;
            Some("pw".to_string())
        };
        registry
            .add_session(&connector, desc("secure"), &mut prompt)
            .unwrap();
        assert_eq!(asked, 1);
        assert_eq!(
            registry.session(0).unwrap().descriptor().password.as_deref(),
            Some("pw")
        );
    }

    #[test]
    fn test_password_prompt_cancelled_or_wrong() {
        let connector = MockConnector::new();
        connector.pooler("secure").require_password("pw");
        let mut registry = Registry::new();

        let err = registry
            .add_session(&connector, desc("secure"), &mut no_prompt())
            .unwrap_err();
        assert_eq!(err, RegistryError::PasswordRequired);

        let mut empty = |_: &Descriptor| Some(String::new());
        let err = registry
            .add_session(&connector, desc("secure"), &mut empty)
            .unwrap_err();
        assert_eq!(err, RegistryError::PasswordRequired);

        let mut wrong = |_: &Descriptor| Some("nope".to_string());
        let err = registry
            .add_session(&connector, desc("secure"), &mut wrong)
            .unwrap_err();
        assert!(matches!(err, RegistryError::ConnectFailed(_)));
        assert_eq!(registry.active_count(), 0);
    }

    #[test]
    fn test_seed_keeps_unreachable_slot() {
        let connector = MockConnector::new();
        connector.pooler("down").set_unreachable(true);
        let mut registry = Registry::new();
        registry.seed(&connector, desc("down"), &mut no_prompt()).unwrap();
        assert_eq!(registry.active_count(), 1);
        assert_eq!(registry.session(0).unwrap().status(), LinkStatus::Bad);

        connector.pooler("down").set_unreachable(false);
        assert_eq!(registry.reconnect_if_down(&connector, 0), Reconnect::Restored);
        assert_eq!(registry.session(0).unwrap().status(), LinkStatus::Ok);
    }

    #[test]
    fn test_close_only_session_terminates() {
        let connector = MockConnector::new();
        let mut registry = filled(&connector, 1);
        assert_eq!(registry.close_session(0), CloseOutcome::Terminate);
        assert_eq!(registry.active_count(), 0);
    }

    #[test]
    fn test_close_first_shifts_and_stays() {
        let connector = MockConnector::new();
        let mut registry = filled(&connector, 3);
        registry.switch_to(0);
        assert_eq!(registry.close_session(0), CloseOutcome::Current(0));
        assert_eq!(hosts(&registry), vec!["h1", "h2"]);
        assert_contiguous(&registry);
    }

    #[test]
    fn test_close_middle_moves_back() {
        let connector = MockConnector::new();
        let mut registry = filled(&connector, 4);
        registry.switch_to(1);
        assert_eq!(registry.close_session(1), CloseOutcome::Current(0));
        assert_eq!(hosts(&registry), vec!["h0", "h2", "h3"]);
    }

    #[test]
    fn test_close_last_moves_back() {
        let connector = MockConnector::new();
        let mut registry = filled(&connector, 3);
        assert_eq!(registry.close_session(2), CloseOutcome::Current(1));
        assert_eq!(hosts(&registry), vec!["h0", "h1"]);
    }

    #[test]
    fn test_close_top_slot_of_full_registry() {
        let connector = MockConnector::new();
        let mut registry = filled(&connector, MAX_SESSIONS);
        assert_eq!(
            registry.close_session(MAX_SESSIONS - 1),
            CloseOutcome::Current(MAX_SESSIONS - 2)
        );
        assert_eq!(registry.active_count(), MAX_SESSIONS - 1);
    }

    #[test]
    fn test_close_moves_log_cursor_with_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pgbouncer.log");
        std::fs::write(&path, "a\n").unwrap();

        let connector = MockConnector::new();
        let mut registry = filled(&connector, 3);
        registry
            .session_mut(2)
            .unwrap()
            .open_log(LogCursor::open(&path).unwrap());
        registry.close_session(0);
        assert!(registry.session(1).unwrap().has_log());
        assert!(!registry.session(0).unwrap().has_log());
    }

    #[test]
    fn test_switch_to_inactive_is_noop() {
        let connector = MockConnector::new();
        let mut registry = filled(&connector, 2);
        assert!(registry.switch_to(0));
        assert!(!registry.switch_to(5));
        assert_eq!(registry.current(), 0);
    }

    #[test]
    fn test_reconnect_if_down() {
        let connector = MockConnector::new();
        let mut registry = filled(&connector, 1);
        let pooler = connector.pooler("h0");

        assert_eq!(registry.reconnect_if_down(&connector, 0), Reconnect::Healthy);

        pooler.drop_connections();
        pooler.set_unreachable(true);
        assert!(matches!(
            registry.reconnect_if_down(&connector, 0),
            Reconnect::Failed(_)
        ));

        pooler.set_unreachable(false);
        assert_eq!(registry.reconnect_if_down(&connector, 0), Reconnect::Restored);
        assert_eq!(registry.reconnect_if_down(&connector, 0), Reconnect::Healthy);
    }

    #[test]
    fn test_close_all() {
        let connector = MockConnector::new();
        let mut registry = filled(&connector, 5);
        registry.close_all();
        assert_eq!(registry.active_count(), 0);
        assert!(registry.current_session().is_none());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add,
        Close(usize),
    }

    proptest! {
        #[test]
        fn prop_active_sessions_stay_contiguous(
            ops in proptest::collection::vec(
                prop_oneof![
                    Just(Op::Add),
                    (0usize..MAX_SESSIONS).prop_map(Op::Close),
                ],
                0..64,
            )
        ) {
            let connector = MockConnector::new();
            let mut registry = Registry::new();
            let mut n = 0;
            for op in ops {
                match op {
                    Op::Add => {
                        let before = registry.active_count();
                        let result = registry.add_session(&connector, desc(&format!("h{}", n)), &mut no_prompt());
                        n += 1;
                        prop_assert_eq!(result.is_ok(), before < MAX_SESSIONS);
                    }
                    Op::Close(slot) => {
                        let before = registry.active_count();
                        let outcome = registry.close_session(slot);
                        if slot < before {
                            prop_assert_eq!(registry.active_count(), before - 1);
                            prop_assert_eq!(outcome == CloseOutcome::Terminate, before == 1);
                        } else {
                            prop_assert_eq!(registry.active_count(), before);
                        }
                    }
                }
                let k = registry.active_count();
                for slot in 0..MAX_SESSIONS {
                    prop_assert_eq!(registry.is_active(slot), slot < k);
                }
                if k > 0 {
                    prop_assert!(registry.current() < k);
                }
            }
        }
    }
}
