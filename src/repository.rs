//! Collaborator interfaces: the cloud document repository and the event
//! sink. §6 names these as out-of-scope collaborators with named interfaces;
//! they are expressed here as traits so the processor is generic over its
//! backing implementation, the way `fuel_vm::Interpreter<S>` is generic over
//! an `InterpreterStorage` implementation rather than a concrete store.
//!
//! The in-memory implementations in this module are test doubles, not a
//! production repository — see §6.

use crate::value::{Reference, Value};
use std::collections::{HashMap, VecDeque};
use std::convert::Infallible;
use std::error::Error as StdError;

/// A message dequeued by `LOAD MESSAGE`, or enqueued by `STORE MESSAGE`.
pub type Message = Value;

/// An event published by the processor loop on task termination or
/// suspension, per §4.F/§6.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The task reached `DONE`.
    Completion {
        /// The task's identity.
        task_tag: uuid::Uuid,
        /// The owning account's identity.
        account_tag: uuid::Uuid,
        /// Final gas balance.
        account_balance: u64,
        /// Total executed instructions.
        clock_cycles: u64,
        /// The task's final result, if it completed normally.
        result: Option<Value>,
        /// The task's final exception, if it completed abnormally.
        exception: Option<Value>,
    },
    /// The task's gas was exhausted; it remains `ACTIVE` and is exported for
    /// later resumption.
    Suspension {
        /// The task's identity.
        task_tag: uuid::Uuid,
    },
}

/// The cloud document repository collaborator: content-addressed document
/// fetch/store, drafts, and message queues. §6.
pub trait Repository {
    /// Errors this repository implementation can raise. Routed into
    /// [`crate::error::ExceptionTag::RepositoryFailure`] by the processor.
    type Error: StdError + 'static;

    /// Fetch a committed document by its citation.
    fn retrieve_document(&mut self, citation: &Reference) -> Result<Value, Self::Error>;

    /// Fetch a draft by tag and version.
    fn retrieve_draft(&mut self, tag: &str, version: &str) -> Result<Value, Self::Error>;

    /// Commit a document under the given tag and version, returning its
    /// citation (including the content digest assigned by the repository).
    fn commit_document(&mut self, tag: &str, version: &str, document: Value) -> Result<Reference, Self::Error>;

    /// Save a document as a mutable draft under the given tag and version.
    fn save_draft(&mut self, tag: &str, version: &str, document: Value) -> Result<(), Self::Error>;

    /// Non-blocking dequeue from the named queue.
    fn receive_message(&mut self, queue: &str) -> Result<Option<Message>, Self::Error>;

    /// Enqueue a message onto the named queue.
    fn queue_message(&mut self, queue: &str, message: Message) -> Result<(), Self::Error>;
}

/// The event sink collaborator: publishes completion/suspension events. §6.
pub trait EventSink {
    /// Errors this event sink implementation can raise.
    type Error: StdError + 'static;

    /// Publish an event.
    fn publish_event(&mut self, event: Event) -> Result<(), Self::Error>;
}

/// An in-memory repository used by the unit and scenario tests. Documents
/// and drafts are keyed by `(tag, version)`; committed documents are also
/// content-addressed by a digest computed from an insertion counter (a
/// deterministic stand-in for a real content hash).
#[derive(Debug, Default)]
pub struct MemoryRepository {
    drafts: HashMap<(String, String), Value>,
    committed: HashMap<(String, String), (Reference, Value)>,
    queues: HashMap<String, VecDeque<Message>>,
    next_digest: u64,
}

impl MemoryRepository {
    /// An empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a named queue, e.g. to set up a scenario where
    /// `LOAD MESSAGE` succeeds immediately.
    pub fn seed_queue(&mut self, queue: impl Into<String>, messages: impl IntoIterator<Item = Message>) {
        self.queues.entry(queue.into()).or_default().extend(messages);
    }

    fn fresh_digest(&mut self) -> String {
        self.next_digest += 1;
        format!("digest-{}", self.next_digest)
    }
}

impl Repository for MemoryRepository {
    type Error = Infallible;

    fn retrieve_document(&mut self, citation: &Reference) -> Result<Value, Self::Error> {
        let key = (citation.tag.clone(), citation.version.clone());
        Ok(self
            .committed
            .get(&key)
            .map(|(_, v)| v.clone())
            .or_else(|| self.drafts.get(&key).cloned())
            .unwrap_or_else(Value::none))
    }

    fn retrieve_draft(&mut self, tag: &str, version: &str) -> Result<Value, Self::Error> {
        Ok(self
            .drafts
            .get(&(tag.to_string(), version.to_string()))
            .cloned()
            .unwrap_or_else(Value::none))
    }

    fn commit_document(&mut self, tag: &str, version: &str, document: Value) -> Result<Reference, Self::Error> {
        let digest = self.fresh_digest();
        let citation = Reference::committed(tag, version, digest);
        self.committed
            .insert((tag.to_string(), version.to_string()), (citation.clone(), document));
        Ok(citation)
    }

    fn save_draft(&mut self, tag: &str, version: &str, document: Value) -> Result<(), Self::Error> {
        self.drafts.insert((tag.to_string(), version.to_string()), document);
        Ok(())
    }

    fn receive_message(&mut self, queue: &str) -> Result<Option<Message>, Self::Error> {
        Ok(self.queues.get_mut(queue).and_then(VecDeque::pop_front))
    }

    fn queue_message(&mut self, queue: &str, message: Message) -> Result<(), Self::Error> {
        self.queues.entry(queue.to_string()).or_default().push_back(message);
        Ok(())
    }
}

/// An in-memory event sink that simply records every published event, in
/// order, for tests to assert against.
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    /// Every event published so far, in publish order.
    pub events: Vec<Event>,
}

impl MemoryEventSink {
    /// An empty event sink.
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for MemoryEventSink {
    type Error = Infallible;

    fn publish_event(&mut self, event: Event) -> Result<(), Self::Error> {
        self.events.push(event);
        Ok(())
    }
}
