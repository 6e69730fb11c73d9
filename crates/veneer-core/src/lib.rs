//! # State, actions, and the reconciliation engine
//!
//! Veneer keeps a render target (any tree of host nodes — an in-memory
//! document, a real one, whatever implements [`Host`]) synchronized with a
//! tree description produced from the current application state. There are
//! three moving parts:
//!
//! - an immutable state tree ([`Value`]) plus a wired action map
//!   ([`Actions`]) that is the only way to change it,
//! - a render scheduler that coalesces any number of state changes in one
//!   turn into a single render pass,
//! - the reconciliation engine ([`patch`]) that computes and applies the
//!   least host-tree surgery that takes the previous description to the new
//!   one.
//!
//! ## State
//!
//! State is a nested map of values. Updates go through actions and produce a
//! new tree with structural sharing — siblings of the written path keep
//! their identity:
//!
//! ```rust
//! use veneer_core::Value;
//!
//! let state = Value::map([
//!     ("count", Value::from(0)),
//!     ("user", Value::map([("name", Value::from("jane"))])),
//! ]);
//!
//! let next = state.set_path(&["count".into()], Value::from(1));
//! assert_eq!(next.get("count").as_num(), Some(1.0));
//! // the untouched branch is the same allocation
//! assert!(next.get("user").same(&state.get("user")));
//! ```
//!
//! ## Describing a tree
//!
//! [`h`] builds one normalized node from a tag, an attribute set, and an
//! arbitrarily nested child list. `None` and booleans vanish, nested vectors
//! flatten in order:
//!
//! ```rust
//! use veneer_core::{Attrs, Child, h};
//!
//! let list = h(
//!     "ul",
//!     Attrs::new().set("class", "items"),
//!     vec![
//!         Child::from(h("li", Attrs::new().key("a"), "first")),
//!         Child::from(vec![Child::from(h("li", Attrs::new().key("b"), "second"))]),
//!         Child::from(None::<Child>),
//!     ],
//! );
//! assert_eq!(list.tag(), Some("ul"));
//! ```
//!
//! ## Actions
//!
//! An action declaration mirrors the state tree's shape; wiring replaces
//! every leaf with a dispatcher bound to its path. An action that needs the
//! current state returns the thunk form:
//!
//! ```rust
//! use veneer_core::{ActionDecl, ActionResult, Value};
//!
//! let decl = ActionDecl::scope([(
//!     "increment",
//!     ActionDecl::act(|_payload| {
//!         ActionResult::thunk(|state, _actions| {
//!             let count = state.get("count").as_num().unwrap_or(0.0);
//!             ActionResult::update(Value::map([("count", count + 1.0)]))
//!         })
//!     }),
//! )]);
//! ```
//!
//! Handing initial state, the declaration, a view function and a render
//! target to [`app`] returns a running instance; calling bound actions marks
//! a render pending, and [`App::flush`] runs the deferred pass — view, patch,
//! lifecycle hooks — exactly once no matter how many actions fired.

pub mod action;
pub mod app;
pub mod host;
pub mod patch;
pub mod prelude;
pub mod schedule;
pub mod value;
pub mod vnode;

pub use action::*;
pub use app::*;
pub use host::*;
pub use patch::{Detach, patch};
pub use prelude::*;
pub use schedule::*;
pub use value::*;
pub use vnode::*;
