use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::action::{ActionDecl, Actions, DispatchCtx, wire};
use crate::host::{Host, NodeRef, hydrate};
use crate::patch::patch;
use crate::schedule::{LifecycleStack, TaskQueue};
use crate::value::Value;
use crate::vnode::{AttrValue, VNode};

pub type ViewFn = Box<dyn Fn(&Value, &Actions) -> VNode>;

/// The runtime context: every piece of coordination state the scheduler and
/// the engine share, as explicit fields with one owner. Mutated only from
/// action dispatch and the render pass; never concurrently (single thread,
/// and the pending flag keeps render passes from nesting).
struct Inner<H: Host> {
    weak: Weak<Inner<H>>,
    host: RefCell<Option<H>>,
    /// Host node currently representing the rendered root.
    root: Cell<Option<NodeRef>>,
    /// Node tree the previous render produced (or hydration read).
    previous: RefCell<Option<VNode>>,
    state: RefCell<Value>,
    actions: RefCell<Actions>,
    view: ViewFn,
    /// Render-pending flag; the binary toggle that coalesces requests.
    render_pending: Cell<bool>,
    /// Flips once the first render pass has patched; picks `oncreate` vs
    /// `onupdate` until then.
    first_render_done: Cell<bool>,
    hooks: LifecycleStack,
    tasks: TaskQueue,
}

/// A running veneer instance over one render target.
pub struct App<H: Host> {
    inner: Rc<Inner<H>>,
}

/// Wire `actions` to `state`, hydrate any content already in the render
/// target, and schedule the first render. The returned handle's bound action
/// map is usable immediately; the render itself lands on the next
/// [`App::flush`].
///
/// `host` may be `None` for state-only use: actions, wiring, and coalescing
/// all behave identically, the patch pass is just skipped.
pub fn app<H: Host>(
    state: impl Into<Value>,
    actions: ActionDecl,
    view: impl Fn(&Value, &Actions) -> VNode + 'static,
    host: Option<H>,
) -> App<H> {
    let mut root = None;
    let mut previous = None;
    if let Some(h) = &host
        && let Some(first) = h.children(h.container()).first().copied()
    {
        root = Some(first);
        previous = Some(hydrate(h, first));
    }

    let inner = Rc::new_cyclic(|weak| Inner {
        weak: weak.clone(),
        host: RefCell::new(host),
        root: Cell::new(root),
        previous: RefCell::new(previous),
        state: RefCell::new(state.into()),
        actions: RefCell::new(Actions::default()),
        view: Box::new(view),
        render_pending: Cell::new(false),
        first_render_done: Cell::new(false),
        hooks: LifecycleStack::new(),
        tasks: TaskQueue::new(),
    });

    let ctx: Rc<dyn DispatchCtx> = inner.clone();
    let bound = wire(&ctx, &SmallVec::new(), actions);
    *inner.actions.borrow_mut() = bound;

    inner.schedule_render();

    App { inner }
}

impl<H: Host> App<H> {
    /// The wired action map, identical in shape to the declaration.
    pub fn actions(&self) -> Actions {
        self.inner.actions.borrow().clone()
    }

    /// Current state root.
    pub fn state(&self) -> Value {
        self.inner.state.borrow().clone()
    }

    /// Host node representing the rendered root, once a render has run.
    pub fn root(&self) -> Option<NodeRef> {
        self.inner.root.get()
    }

    /// Run one event-loop turn: every deferred task queued so far, including
    /// any it queues in turn. Returns how many tasks ran.
    pub fn flush(&self) -> usize {
        self.inner.tasks.drain()
    }

    /// Whether a render pass is scheduled and not yet run.
    pub fn render_pending(&self) -> bool {
        self.inner.render_pending.get()
    }

    /// Borrow the render target for inspection.
    pub fn with_host<R>(&self, f: impl FnOnce(&H) -> R) -> Option<R> {
        self.inner.host.borrow().as_ref().map(f)
    }

    /// Fire the function-valued property `event` on `node`, the way user
    /// input would. The handler runs with the host borrow released, so it is
    /// free to invoke bound actions.
    pub fn emit(&self, node: NodeRef, event: &str, payload: Value) -> bool {
        let handler = {
            let host = self.inner.host.borrow();
            match host.as_ref().map(|h| h.property(node, event)) {
                Some(Some(AttrValue::Handler(f))) => Some(f),
                _ => None,
            }
        };
        match handler {
            Some(f) => {
                f(payload);
                true
            }
            None => false,
        }
    }
}

impl<H: Host> Inner<H> {
    fn schedule_render(&self) {
        if !self.render_pending.get() {
            self.render_pending.set(true);
            let weak = self.weak.clone();
            self.tasks.push(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.render();
                }
            }));
        }
    }

    /// One render pass: view, patch, hook drain. The pending flag clears
    /// before the view runs; a state change made *during* the view schedules
    /// a fresh pass and skips this one's patch, so the host never renders a
    /// tree older than the state it reflects.
    fn render(&self) {
        self.render_pending.set(false);
        log::trace!("render pass");

        let state = self.state.borrow().clone();
        let actions = self.actions.borrow().clone();
        let next = (self.view)(&state, &actions);

        if !self.render_pending.get() {
            let mut host_slot = self.host.borrow_mut();
            if let Some(host) = host_slot.as_mut() {
                let container = host.container();
                let previous = self.previous.borrow().clone();
                let root = patch(
                    host,
                    &self.hooks,
                    !self.first_render_done.get(),
                    container,
                    self.root.get(),
                    previous.as_ref(),
                    &next,
                );
                self.root.set(Some(root));
                *self.previous.borrow_mut() = Some(next);
                self.first_render_done.set(true);

                self.hooks.drain(host);
            }
        }
    }
}

impl<H: Host> DispatchCtx for Inner<H> {
    fn state_at(&self, path: &[String]) -> Value {
        self.state.borrow().get_path(path)
    }

    fn apply(&self, path: &[String], update: Value) {
        let merged = self.state_at(path).merge(&update);
        let next = self.state.borrow().set_path(path, merged);
        *self.state.borrow_mut() = next;
        self.schedule_render();
    }

    fn ensure_scope(&self, path: &[String]) {
        let current = self.state_at(path);
        if current.is_null() {
            let next = self.state.borrow().set_path(path, Value::empty_map());
            *self.state.borrow_mut() = next;
        } else if current.as_map().is_none() {
            log::warn!(
                "state at '{}' is a leaf but the action declaration nests there",
                path.join(".")
            );
        }
    }

    fn bound(&self) -> Actions {
        self.actions.borrow().clone()
    }
}
