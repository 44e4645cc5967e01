//! Shared action recorder behind every fake typed client

use crate::action::Action;
use crate::reactor::{object_reactor, watch_reactor, Reactor, WatchReactor};
use crate::tracker::ObjectTracker;
use crate::watch::Watcher;
use crate::{Error, Result};
use serde_json::Value;
use std::sync::{Arc, RwLock};
use tracing::{debug, trace};

/// Records actions and answers them through a chain of reactors
///
/// The default chain answers from an [`ObjectTracker`]; reactors prepended
/// to the chain run first and may answer, fail, or defer each action.
pub struct Fake {
    actions: RwLock<Vec<Action>>,
    reactors: RwLock<Vec<Reactor>>,
    watch_reactors: RwLock<Vec<WatchReactor>>,
    tracker: Arc<ObjectTracker>,
}

impl Fake {
    /// A recorder whose default reactions are served by `tracker`
    pub fn new(tracker: Arc<ObjectTracker>) -> Self {
        Self {
            actions: RwLock::new(Vec::new()),
            reactors: RwLock::new(vec![object_reactor(Arc::clone(&tracker))]),
            watch_reactors: RwLock::new(vec![watch_reactor(Arc::clone(&tracker))]),
            tracker,
        }
    }

    /// A recorder with empty reactor chains; every action gets its default reply
    pub fn without_reactors() -> Self {
        Self {
            actions: RwLock::new(Vec::new()),
            reactors: RwLock::new(Vec::new()),
            watch_reactors: RwLock::new(Vec::new()),
            tracker: Arc::new(ObjectTracker::new()),
        }
    }

    pub fn tracker(&self) -> &Arc<ObjectTracker> {
        &self.tracker
    }

    /// Record `action` and return the first reactor answer, or `default` if none answers.
    pub fn invokes(&self, action: Action, default: Value) -> Result<Value> {
        trace!("Invoking action: {}", action);
        self.record(&action);

        // Reactors may call back into the recorder, so the chain is cloned first.
        let chain = self.reactors.read().unwrap().clone();
        for reactor in chain.iter().filter(|r| r.handles(&action)) {
            if let Some(value) = reactor.react(&action)? {
                return Ok(value);
            }
        }

        debug!("No reactor answered {}, returning default object", action);
        Ok(default)
    }

    /// Record a watch action and return the first watch reactor's watcher.
    pub fn invokes_watch(&self, action: Action) -> Result<Watcher> {
        trace!("Invoking watch: {}", action);
        self.record(&action);

        let chain = self.watch_reactors.read().unwrap().clone();
        for reactor in chain.iter().filter(|r| r.handles(&action)) {
            if let Some(watcher) = reactor.react(&action)? {
                return Ok(watcher);
            }
        }

        Err(Error::Internal(format!("unhandled watch: {}", action)))
    }

    /// Recorded actions, in call order
    pub fn actions(&self) -> Vec<Action> {
        self.actions.read().unwrap().clone()
    }

    pub fn clear_actions(&self) {
        self.actions.write().unwrap().clear();
    }

    pub fn prepend_reactor<F>(&self, verb: &str, resource: &str, reaction: F)
    where
        F: Fn(&Action) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        self.reactors
            .write()
            .unwrap()
            .insert(0, Reactor::new(verb, resource, reaction));
    }

    pub fn add_reactor<F>(&self, verb: &str, resource: &str, reaction: F)
    where
        F: Fn(&Action) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        self.reactors
            .write()
            .unwrap()
            .push(Reactor::new(verb, resource, reaction));
    }

    pub fn prepend_watch_reactor<F>(&self, resource: &str, reaction: F)
    where
        F: Fn(&Action) -> Result<Option<Watcher>> + Send + Sync + 'static,
    {
        self.watch_reactors
            .write()
            .unwrap()
            .insert(0, WatchReactor::new(resource, reaction));
    }

    pub fn add_watch_reactor<F>(&self, resource: &str, reaction: F)
    where
        F: Fn(&Action) -> Result<Option<Watcher>> + Send + Sync + 'static,
    {
        self.watch_reactors
            .write()
            .unwrap()
            .push(WatchReactor::new(resource, reaction));
    }

    pub(crate) fn prepend_reactors(&self, reactors: Vec<Reactor>) {
        let mut chain = self.reactors.write().unwrap();
        chain.splice(0..0, reactors);
    }

    pub(crate) fn prepend_watch_reactors(&self, reactors: Vec<WatchReactor>) {
        let mut chain = self.watch_reactors.write().unwrap();
        chain.splice(0..0, reactors);
    }

    fn record(&self, action: &Action) {
        self.actions.write().unwrap().push(action.clone());
    }
}

impl Default for Fake {
    fn default() -> Self {
        Self::new(Arc::new(ObjectTracker::new()))
    }
}
