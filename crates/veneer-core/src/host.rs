use std::rc::Rc;

use crate::vnode::{Attrs, AttrValue, VElement, VNode};

/// Opaque handle to one host tree node. Allocated by the host; the engine
/// treats it as an identity token only.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeRef(u64);

impl NodeRef {
    pub fn new(raw: u64) -> Self {
        NodeRef(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NodeKind {
    Element,
    Text,
}

/// Capability surface the reconciliation engine drives.
///
/// The engine never holds host nodes beyond the [`NodeRef`] tokens it got
/// back from creation or `children`, and it never validates inputs on the
/// host's behalf: a stale token or a text operation on an element is the
/// host's failure to surface however it sees fit.
///
/// `insert_before` with a node that is already attached somewhere in the
/// tree must behave as a *move* — one logical relocation, not a removal
/// followed by a re-creation. The keyed reorder path depends on that.
pub trait Host: 'static {
    /// The mount point the runtime renders into.
    fn container(&self) -> NodeRef;

    fn create_element(&mut self, tag: &str, ns: Option<&str>) -> NodeRef;
    fn create_text(&mut self, value: &str) -> NodeRef;
    fn set_text(&mut self, node: NodeRef, value: &str);

    /// Whether `name` exists as a settable property on this node.
    fn has_property(&self, node: NodeRef, name: &str) -> bool;
    fn property(&self, node: NodeRef, name: &str) -> Option<AttrValue>;
    fn set_property(&mut self, node: NodeRef, name: &str, value: AttrValue);

    fn set_attribute(&mut self, node: NodeRef, name: &str, value: &str);
    fn remove_attribute(&mut self, node: NodeRef, name: &str);

    /// Set one nested style property; empty string clears it.
    fn set_style(&mut self, node: NodeRef, name: &str, value: &str);

    fn append(&mut self, parent: NodeRef, child: NodeRef);
    fn insert_before(&mut self, parent: NodeRef, child: NodeRef, reference: Option<NodeRef>);
    fn remove_child(&mut self, parent: NodeRef, child: NodeRef);

    fn children(&self, node: NodeRef) -> Vec<NodeRef>;
    fn node_kind(&self, node: NodeRef) -> NodeKind;
    fn tag_name(&self, node: NodeRef) -> String;
    fn text_value(&self, node: NodeRef) -> String;
}

/// Read an existing host subtree into a node description: text nodes become
/// leaves, everything else an element with empty attributes. Run once at
/// startup so the first patch over pre-rendered content is an attribute and
/// hook application instead of a full replace.
pub fn hydrate(host: &dyn Host, node: NodeRef) -> VNode {
    match host.node_kind(node) {
        NodeKind::Text => VNode::Text(host.text_value(node).into()),
        NodeKind::Element => {
            let children = host
                .children(node)
                .into_iter()
                .map(|child| hydrate(host, child))
                .collect();
            VNode::Element(Rc::new(VElement {
                tag: host.tag_name(node).to_lowercase().into(),
                attrs: Attrs::new(),
                children,
                key: None,
            }))
        }
    }
}
