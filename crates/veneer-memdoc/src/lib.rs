//! # In-memory document
//!
//! [`MemDoc`] is a host tree that lives entirely in memory: elements with
//! attributes, properties (including function-valued ones, i.e. event
//! handlers), nested style maps, and ordered children, plus text nodes. It
//! implements [`veneer_core::Host`], so the reconciliation engine drives it
//! exactly the way it would drive a real document.
//!
//! Two things make it useful beyond being a stand-in:
//!
//! - **Operation tallies.** Every mutating capability call bumps a counter
//!   in [`Stats`], so a test can assert "this diff touched nothing" or
//!   "reordering moved two nodes and created none".
//! - **Inspection.** [`MemDoc::snapshot`] renders the tree as markup,
//!   [`MemDoc::attr`]/[`MemDoc::text`]/[`MemDoc::child`] read individual
//!   nodes, with stale handles surfacing as [`MemdocError`].
//!
//! ```rust
//! use veneer_core::prelude::*;
//! use veneer_memdoc::MemDoc;
//!
//! let decl = ActionDecl::scope([(
//!     "increment",
//!     ActionDecl::act(|_| {
//!         ActionResult::thunk(|state, _| {
//!             let n = state.get("count").as_num().unwrap_or(0.0);
//!             ActionResult::update(Value::map([("count", n + 1.0)]))
//!         })
//!     }),
//! )]);
//!
//! let instance = app(
//!     Value::map([("count", 0)]),
//!     decl,
//!     |state, _| h("p", Attrs::new(), state.get("count").as_num().unwrap_or(0.0)),
//!     Some(MemDoc::new()),
//! );
//! instance.flush();
//!
//! instance.actions().call("increment", Value::Null);
//! instance.flush();
//!
//! let markup = instance.with_host(|doc| doc.snapshot()).unwrap();
//! assert_eq!(markup, "<body><p>1</p></body>");
//! ```

use std::collections::BTreeMap;

use slotmap::{Key as _, KeyData, SlotMap, new_key_type};
use thiserror::Error;
use veneer_core::{AttrValue, Host, NodeKind, NodeRef};

pub mod tests;

new_key_type! {
    struct DocKey;
}

fn to_ref(key: DocKey) -> NodeRef {
    NodeRef::new(key.data().as_ffi())
}

fn from_ref(node: NodeRef) -> DocKey {
    KeyData::from_ffi(node.raw()).into()
}

#[derive(Debug, Error)]
pub enum MemdocError {
    #[error("stale node reference {0:?}")]
    StaleNode(NodeRef),
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeRef),
    #[error("node {0:?} is not a text node")]
    NotText(NodeRef),
    #[error("node {node:?} has no child at index {index}")]
    NoChild { node: NodeRef, index: usize },
}

/// Tallies of capability calls that mutated the tree. One logical move is
/// one bump of `moves`, not a removal plus an insert.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub creates: u64,
    pub removals: u64,
    pub inserts: u64,
    pub moves: u64,
    pub text_writes: u64,
    pub attr_writes: u64,
    pub attr_removals: u64,
    pub prop_writes: u64,
    pub style_writes: u64,
}

impl Stats {
    /// Every mutation this host saw.
    pub fn total(&self) -> u64 {
        self.creates
            + self.removals
            + self.inserts
            + self.moves
            + self.text_writes
            + self.attr_writes
            + self.attr_removals
            + self.prop_writes
            + self.style_writes
    }
}

/// Names that exist as settable properties on every element, the way a
/// document's IDL attributes do. Anything assigned as a property later also
/// answers true.
const PROPERTY_NAMES: &[&str] = &[
    "value",
    "checked",
    "id",
    "className",
    "title",
    "type",
    "placeholder",
    "disabled",
    "hidden",
    "selected",
    "href",
];

enum NodeData {
    Element {
        tag: String,
        ns: Option<String>,
        attrs: BTreeMap<String, String>,
        props: BTreeMap<String, AttrValue>,
        style: BTreeMap<String, String>,
        children: Vec<DocKey>,
    },
    Text(String),
}

struct Node {
    parent: Option<DocKey>,
    data: NodeData,
}

pub struct MemDoc {
    nodes: SlotMap<DocKey, Node>,
    container: DocKey,
    stats: Stats,
}

impl MemDoc {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let container = nodes.insert(Node {
            parent: None,
            data: NodeData::Element {
                tag: "body".into(),
                ns: None,
                attrs: BTreeMap::new(),
                props: BTreeMap::new(),
                style: BTreeMap::new(),
                children: Vec::new(),
            },
        });
        MemDoc {
            nodes,
            container,
            stats: Stats::default(),
        }
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = Stats::default();
    }

    /// Number of live nodes, the container included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node(&self, node: NodeRef) -> Result<&Node, MemdocError> {
        self.nodes
            .get(from_ref(node))
            .ok_or(MemdocError::StaleNode(node))
    }

    pub fn tag(&self, node: NodeRef) -> Result<String, MemdocError> {
        match &self.node(node)?.data {
            NodeData::Element { tag, .. } => Ok(tag.clone()),
            NodeData::Text(_) => Err(MemdocError::NotAnElement(node)),
        }
    }

    pub fn attr(&self, node: NodeRef, name: &str) -> Result<Option<String>, MemdocError> {
        match &self.node(node)?.data {
            NodeData::Element { attrs, .. } => Ok(attrs.get(name).cloned()),
            NodeData::Text(_) => Err(MemdocError::NotAnElement(node)),
        }
    }

    pub fn style_value(&self, node: NodeRef, name: &str) -> Result<Option<String>, MemdocError> {
        match &self.node(node)?.data {
            NodeData::Element { style, .. } => Ok(style.get(name).cloned()),
            NodeData::Text(_) => Err(MemdocError::NotAnElement(node)),
        }
    }

    pub fn namespace(&self, node: NodeRef) -> Result<Option<String>, MemdocError> {
        match &self.node(node)?.data {
            NodeData::Element { ns, .. } => Ok(ns.clone()),
            NodeData::Text(_) => Err(MemdocError::NotAnElement(node)),
        }
    }

    pub fn text(&self, node: NodeRef) -> Result<String, MemdocError> {
        match &self.node(node)?.data {
            NodeData::Text(value) => Ok(value.clone()),
            NodeData::Element { .. } => Err(MemdocError::NotText(node)),
        }
    }

    pub fn child(&self, node: NodeRef, index: usize) -> Result<NodeRef, MemdocError> {
        match &self.node(node)?.data {
            NodeData::Element { children, .. } => children
                .get(index)
                .copied()
                .map(to_ref)
                .ok_or(MemdocError::NoChild { node, index }),
            NodeData::Text(_) => Err(MemdocError::NotAnElement(node)),
        }
    }

    /// Render the whole tree as markup. Attributes come out sorted, style as
    /// a `style="…"` attribute; properties stay invisible, like on a real
    /// document serialization.
    pub fn snapshot(&self) -> String {
        let mut out = String::new();
        self.write_node(self.container, &mut out);
        out
    }

    fn write_node(&self, key: DocKey, out: &mut String) {
        let Some(node) = self.nodes.get(key) else {
            return;
        };
        match &node.data {
            NodeData::Text(value) => out.push_str(value),
            NodeData::Element {
                tag,
                attrs,
                style,
                children,
                ..
            } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push_str(&format!(" {name}={value:?}"));
                }
                if !style.is_empty() {
                    let body: Vec<String> =
                        style.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                    out.push_str(&format!(" style={:?}", body.join("; ")));
                }
                out.push('>');
                for child in children {
                    self.write_node(*child, out);
                }
                out.push_str(&format!("</{tag}>"));
            }
        }
    }

    fn detach(&mut self, key: DocKey) {
        if let Some(parent) = self.nodes[key].parent
            && let NodeData::Element { children, .. } = &mut self.nodes[parent].data
        {
            children.retain(|c| *c != key);
        }
        self.nodes[key].parent = None;
    }

    fn drop_subtree(&mut self, key: DocKey) {
        let children = match &self.nodes[key].data {
            NodeData::Element { children, .. } => children.clone(),
            NodeData::Text(_) => Vec::new(),
        };
        for child in children {
            self.drop_subtree(child);
        }
        self.nodes.remove(key);
    }

    fn attach(&mut self, parent: DocKey, child: DocKey, reference: Option<DocKey>) {
        let position = match (&self.nodes[parent].data, reference) {
            (NodeData::Element { children, .. }, Some(r)) => {
                children.iter().position(|c| *c == r)
            }
            _ => None,
        };
        let NodeData::Element { children, .. } = &mut self.nodes[parent].data else {
            log::error!("attach target is a text node");
            return;
        };
        match position {
            Some(index) => children.insert(index, child),
            None => children.push(child),
        }
        self.nodes[child].parent = Some(parent);
    }
}

impl Default for MemDoc {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for MemDoc {
    fn container(&self) -> NodeRef {
        to_ref(self.container)
    }

    fn create_element(&mut self, tag: &str, ns: Option<&str>) -> NodeRef {
        self.stats.creates += 1;
        to_ref(self.nodes.insert(Node {
            parent: None,
            data: NodeData::Element {
                tag: tag.into(),
                ns: ns.map(Into::into),
                attrs: BTreeMap::new(),
                props: BTreeMap::new(),
                style: BTreeMap::new(),
                children: Vec::new(),
            },
        }))
    }

    fn create_text(&mut self, value: &str) -> NodeRef {
        self.stats.creates += 1;
        to_ref(self.nodes.insert(Node {
            parent: None,
            data: NodeData::Text(value.into()),
        }))
    }

    fn set_text(&mut self, node: NodeRef, value: &str) {
        let key = from_ref(node);
        match &mut self.nodes[key].data {
            NodeData::Text(current) => {
                self.stats.text_writes += 1;
                *current = value.into();
            }
            NodeData::Element { .. } => log::error!("set_text on an element"),
        }
    }

    fn has_property(&self, node: NodeRef, name: &str) -> bool {
        if PROPERTY_NAMES.contains(&name) {
            return true;
        }
        match &self.nodes[from_ref(node)].data {
            NodeData::Element { props, .. } => props.contains_key(name),
            NodeData::Text(_) => false,
        }
    }

    fn property(&self, node: NodeRef, name: &str) -> Option<AttrValue> {
        match &self.nodes[from_ref(node)].data {
            NodeData::Element { props, .. } => props.get(name).cloned(),
            NodeData::Text(_) => None,
        }
    }

    fn set_property(&mut self, node: NodeRef, name: &str, value: AttrValue) {
        let key = from_ref(node);
        match &mut self.nodes[key].data {
            NodeData::Element { props, .. } => {
                self.stats.prop_writes += 1;
                props.insert(name.into(), value);
            }
            NodeData::Text(_) => log::error!("set_property on a text node"),
        }
    }

    fn set_attribute(&mut self, node: NodeRef, name: &str, value: &str) {
        let key = from_ref(node);
        match &mut self.nodes[key].data {
            NodeData::Element { attrs, .. } => {
                self.stats.attr_writes += 1;
                attrs.insert(name.into(), value.into());
            }
            NodeData::Text(_) => log::error!("set_attribute on a text node"),
        }
    }

    fn remove_attribute(&mut self, node: NodeRef, name: &str) {
        let key = from_ref(node);
        if let NodeData::Element { attrs, .. } = &mut self.nodes[key].data
            && attrs.remove(name).is_some()
        {
            self.stats.attr_removals += 1;
        }
    }

    fn set_style(&mut self, node: NodeRef, name: &str, value: &str) {
        let key = from_ref(node);
        match &mut self.nodes[key].data {
            NodeData::Element { style, .. } => {
                self.stats.style_writes += 1;
                if value.is_empty() {
                    style.remove(name);
                } else {
                    style.insert(name.into(), value.into());
                }
            }
            NodeData::Text(_) => log::error!("set_style on a text node"),
        }
    }

    fn append(&mut self, parent: NodeRef, child: NodeRef) {
        self.insert_before(parent, child, None);
    }

    fn insert_before(&mut self, parent: NodeRef, child: NodeRef, reference: Option<NodeRef>) {
        let child_key = from_ref(child);
        let attached = self.nodes[child_key].parent.is_some();
        if attached {
            // relocation of a live node: one logical move
            self.stats.moves += 1;
            self.detach(child_key);
        } else {
            self.stats.inserts += 1;
        }
        self.attach(from_ref(parent), child_key, reference.map(from_ref));
    }

    fn remove_child(&mut self, parent: NodeRef, child: NodeRef) {
        let child_key = from_ref(child);
        let parent_key = from_ref(parent);
        if self.nodes[child_key].parent != Some(parent_key) {
            log::warn!("remove_child: {child:?} is not a child of {parent:?}");
            return;
        }
        self.stats.removals += 1;
        self.detach(child_key);
        self.drop_subtree(child_key);
    }

    fn children(&self, node: NodeRef) -> Vec<NodeRef> {
        match &self.nodes[from_ref(node)].data {
            NodeData::Element { children, .. } => {
                children.iter().copied().map(to_ref).collect()
            }
            NodeData::Text(_) => Vec::new(),
        }
    }

    fn node_kind(&self, node: NodeRef) -> NodeKind {
        match &self.nodes[from_ref(node)].data {
            NodeData::Element { .. } => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
        }
    }

    fn tag_name(&self, node: NodeRef) -> String {
        match &self.nodes[from_ref(node)].data {
            NodeData::Element { tag, .. } => tag.clone(),
            NodeData::Text(_) => String::new(),
        }
    }

    fn text_value(&self, node: NodeRef) -> String {
        match &self.nodes[from_ref(node)].data {
            NodeData::Text(value) => value.clone(),
            NodeData::Element { .. } => String::new(),
        }
    }
}
