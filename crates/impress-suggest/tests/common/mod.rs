//! Shared matchers and recording handlers for integration tests

use std::cell::RefCell;
use std::rc::Rc;

use impress_suggest::{
    Controller, CycleOutcome, HandlerKind, MatcherConfig, MatcherHandlers, MatcherSpec, MemoryDocument, MemoryEdit,
    Reason, Session,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Trigger {
    Mention,
    Tag,
}

/// One handler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired {
    pub kind: HandlerKind,
    pub reason: Reason,
    pub from: usize,
    pub text: String,
}

pub type Log = Rc<RefCell<Vec<Fired>>>;

pub fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn mention() -> MatcherConfig<Trigger> {
    MatcherSpec::new("at", "@").build(Trigger::Mention).unwrap()
}

#[allow(dead_code)]
pub fn tag() -> MatcherConfig<Trigger> {
    MatcherSpec::new("tag", "#")
        .mark_kind("tag")
        .build(Trigger::Tag)
        .unwrap()
}

/// Handlers that push every change and exit into `log`.
pub fn recording(log: &Log) -> MatcherHandlers<Trigger> {
    let change = Rc::clone(log);
    let exit = Rc::clone(log);
    MatcherHandlers::new()
        .on_change(move |ctx| {
            change.borrow_mut().push(Fired {
                kind: HandlerKind::Change,
                reason: ctx.matched.reason,
                from: ctx.matched.matched.range.from,
                text: ctx.matched.matched.text.full.clone(),
            })
        })
        .on_exit(move |ctx| {
            exit.borrow_mut().push(Fired {
                kind: HandlerKind::Exit,
                reason: ctx.matched.reason,
                from: ctx.matched.matched.range.from,
                text: ctx.matched.matched.text.full.clone(),
            })
        })
}

#[allow(dead_code)]
pub fn controller(log: &Log) -> Controller<Trigger> {
    Controller::new()
        .with_matcher(mention(), recording(log))
        .unwrap()
}

#[allow(dead_code)]
pub fn session(text: &str, log: &Log) -> Session<Trigger> {
    Session::new(MemoryDocument::new(text), controller(log))
}

#[allow(dead_code)]
pub fn reasons(log: &Log) -> Vec<Reason> {
    log.borrow().iter().map(|fired| fired.reason).collect()
}

/// Run one edit through `controller` and dispatch its handlers.
#[allow(dead_code)]
pub fn step(
    controller: &mut Controller<Trigger>,
    doc: &mut MemoryDocument,
    edit: impl FnOnce(&mut MemoryDocument) -> MemoryEdit,
) -> CycleOutcome<Trigger> {
    let before = doc.clone();
    let edit = edit(&mut *doc);
    let outcome = controller.apply(&edit, &before, &*doc);
    controller.dispatch(doc);
    outcome
}
