pub use crate::action::{ActionDecl, ActionResult, Actions, Deferred};
pub use crate::app::{App, app};
pub use crate::host::{Host, NodeKind, NodeRef};
pub use crate::value::Value;
pub use crate::vnode::{Attrs, AttrValue, Child, VNode, component, h, text};
