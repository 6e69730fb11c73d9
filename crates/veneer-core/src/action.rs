use std::collections::BTreeMap;
use std::rc::Rc;

use crate::value::{Path, Value};

/// What a bound action invocation produced, classified up front.
///
/// The original duck-typed boundary ("has a `then`, so it must be deferred")
/// is replaced by this tagged type: the dispatcher matches on the variant and
/// never probes shape.
pub enum ActionResult {
    /// Partial state, shallow-merged onto the state at the action's path.
    Update(Value),
    /// Action expressed as a function of current state; resolved once with
    /// `(state at path, bound action map)` and the return value takes this
    /// result's place.
    Thunk(Thunk),
    /// Continuation-bearing value. Never applied to state — the continuation
    /// is expected to invoke another bound action when it has something real.
    Deferred(Deferred),
    /// Nothing to apply, nothing to render.
    NoOp,
}

pub type Thunk = Box<dyn FnOnce(Value, &Actions) -> ActionResult>;

impl ActionResult {
    pub fn update(value: impl Into<Value>) -> Self {
        ActionResult::Update(value.into())
    }

    pub fn thunk(f: impl FnOnce(Value, &Actions) -> ActionResult + 'static) -> Self {
        ActionResult::Thunk(Box::new(f))
    }
}

/// A value whose only capability is registering a continuation. The runtime
/// hands it back to the caller untouched; whoever completes it calls the
/// registered continuation, which typically invokes another bound action.
#[derive(Clone)]
pub struct Deferred {
    register: Rc<dyn Fn(Box<dyn FnOnce(Value)>)>,
}

impl Deferred {
    pub fn new(register: impl Fn(Box<dyn FnOnce(Value)>) + 'static) -> Self {
        Deferred {
            register: Rc::new(register),
        }
    }

    pub fn and_then(&self, continuation: impl FnOnce(Value) + 'static) {
        (self.register)(Box::new(continuation));
    }
}

pub type ActionFn = Rc<dyn Fn(Value) -> ActionResult>;

/// Nested action declaration: leaves are payload functions, branches mirror
/// the state tree's shape. Fixed at startup.
pub enum ActionDecl {
    Act(ActionFn),
    Scope(BTreeMap<String, ActionDecl>),
}

impl ActionDecl {
    pub fn act(f: impl Fn(Value) -> ActionResult + 'static) -> Self {
        ActionDecl::Act(Rc::new(f))
    }

    pub fn scope<K: Into<String>>(entries: impl IntoIterator<Item = (K, ActionDecl)>) -> Self {
        ActionDecl::Scope(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

pub type BoundFn = Rc<dyn Fn(Value) -> ActionResult>;

#[derive(Clone)]
pub enum Bound {
    Act(BoundFn),
    Scope(Actions),
}

/// The wired action map handed back to the caller: identical shape to the
/// declaration, every leaf replaced by a dispatcher closed over its path.
#[derive(Clone, Default)]
pub struct Actions(Rc<BTreeMap<String, Bound>>);

impl Actions {
    pub fn get(&self, name: &str) -> Option<&Bound> {
        self.0.get(name)
    }

    pub fn scope(&self, name: &str) -> Option<Actions> {
        match self.0.get(name) {
            Some(Bound::Scope(nested)) => Some(nested.clone()),
            _ => None,
        }
    }

    /// Invoke the action `name` at this level.
    pub fn call(&self, name: &str, payload: Value) -> ActionResult {
        match self.0.get(name) {
            Some(Bound::Act(f)) => f(payload),
            Some(Bound::Scope(_)) => {
                log::warn!("action '{name}' is a scope, not callable");
                ActionResult::NoOp
            }
            None => {
                log::warn!("no action '{name}' at this level");
                ActionResult::NoOp
            }
        }
    }

    /// Dotted-path convenience: `dispatch("list.add", payload)`.
    pub fn dispatch(&self, path: &str, payload: Value) -> ActionResult {
        match path.split_once('.') {
            None => self.call(path, payload),
            Some((head, rest)) => match self.scope(head) {
                Some(nested) => nested.dispatch(rest, payload),
                None => {
                    log::warn!("no action scope '{head}' in dispatch path '{path}'");
                    ActionResult::NoOp
                }
            },
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Runtime surface the dispatchers run against. State is re-fetched through
/// this on every invocation, never captured at wiring time.
pub(crate) trait DispatchCtx {
    fn state_at(&self, path: &[String]) -> Value;
    /// Merge `update` onto the state at `path`, swap the root, request a
    /// render.
    fn apply(&self, path: &[String], update: Value);
    /// Make sure a (possibly empty) state subtree exists at `path`.
    fn ensure_scope(&self, path: &[String]);
    fn bound(&self) -> Actions;
}

/// Recursive wiring walk: every declaration leaf becomes a dispatcher closed
/// over the path of the scope that owns it.
pub(crate) fn wire(ctx: &Rc<dyn DispatchCtx>, path: &Path, decl: ActionDecl) -> Actions {
    let entries = match decl {
        ActionDecl::Scope(entries) => entries,
        ActionDecl::Act(_) => {
            log::warn!("top-level action declaration must be a scope");
            return Actions::default();
        }
    };

    let mut bound = BTreeMap::new();
    for (name, entry) in entries {
        match entry {
            ActionDecl::Act(f) => {
                bound.insert(name, Bound::Act(bind(ctx.clone(), path.clone(), f)));
            }
            ActionDecl::Scope(nested) => {
                let mut nested_path = path.clone();
                nested_path.push(name.clone());
                ctx.ensure_scope(&nested_path);
                bound.insert(
                    name,
                    Bound::Scope(wire(ctx, &nested_path, ActionDecl::Scope(nested))),
                );
            }
        }
    }
    Actions(Rc::new(bound))
}

fn bind(ctx: Rc<dyn DispatchCtx>, path: Path, f: ActionFn) -> BoundFn {
    Rc::new(move |payload| {
        // resolve the thunk form, exactly one level
        let result = match f(payload) {
            ActionResult::Thunk(thunk) => thunk(ctx.state_at(&path), &ctx.bound()),
            other => other,
        };

        if let ActionResult::Update(update) = &result {
            let current = ctx.state_at(&path);
            if !update.is_null() && !update.same(&current) {
                ctx.apply(&path, update.clone());
            }
        }

        result
    })
}
