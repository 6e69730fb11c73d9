use std::collections::BTreeMap;
use std::rc::Rc;

use crate::host::{Host, NodeRef};
use crate::patch::Detach;
use crate::value::Value;

/// Child identity token, matched across renders independent of position.
pub type Key = Rc<str>;

pub type StyleMap = BTreeMap<String, String>;

/// Function-valued attribute, stored on the host as a property. The payload
/// is whatever the host's event dispatch hands through.
pub type Handler = Rc<dyn Fn(Value)>;

pub type CreateHook = Rc<dyn Fn(&mut dyn Host, NodeRef)>;
pub type UpdateHook = Rc<dyn Fn(&mut dyn Host, NodeRef, &Attrs)>;
pub type DestroyHook = Rc<dyn Fn(&mut dyn Host, NodeRef)>;
pub type RemoveHook = Rc<dyn Fn(&mut dyn Host, NodeRef, Detach)>;

/// Description of one host tree node and its subtree.
///
/// `clone` is a reference bump for elements, so a view that returns an
/// unchanged subtree hands the engine the *same* element reference it saw
/// last render, and the diff skips the whole branch.
#[derive(Clone)]
pub enum VNode {
    Text(Rc<str>),
    Element(Rc<VElement>),
}

pub struct VElement {
    pub tag: Rc<str>,
    pub attrs: Attrs,
    pub children: Vec<VNode>,
    pub key: Option<Key>,
}

impl VNode {
    pub fn key(&self) -> Option<&Key> {
        match self {
            VNode::Element(e) => e.key.as_ref(),
            VNode::Text(_) => None,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            VNode::Element(e) => Some(&e.tag),
            VNode::Text(_) => None,
        }
    }

    /// Reference identity, the engine's no-op fast path. Text leaves compare
    /// by value, elements by allocation.
    pub fn same_ref(&self, other: &VNode) -> bool {
        match (self, other) {
            (VNode::Text(a), VNode::Text(b)) => a == b,
            (VNode::Element(a), VNode::Element(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Attribute value. `Style` and `Handler` carry the two special application
/// policies; everything else is a plain value written as a property or an
/// attribute depending on what the host answers for the name.
#[derive(Clone)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Num(f64),
    Str(Rc<str>),
    Style(Rc<StyleMap>),
    Handler(Handler),
}

impl AttrValue {
    /// Skip-check identity: scalars by value, style maps and handlers by
    /// allocation. A handler rebuilt on every render therefore re-applies,
    /// same as a fresh closure would on a document.
    pub fn same(&self, other: &AttrValue) -> bool {
        match (self, other) {
            (AttrValue::Null, AttrValue::Null) => true,
            (AttrValue::Bool(a), AttrValue::Bool(b)) => a == b,
            (AttrValue::Num(a), AttrValue::Num(b)) => a == b,
            (AttrValue::Str(a), AttrValue::Str(b)) => a == b,
            (AttrValue::Style(a), AttrValue::Style(b)) => Rc::ptr_eq(a, b),
            (AttrValue::Handler(a), AttrValue::Handler(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn is_cleared(&self) -> bool {
        matches!(self, AttrValue::Null | AttrValue::Bool(false))
    }

    /// Rendering used when the value is written as a host attribute.
    pub fn to_attr_string(&self) -> String {
        match self {
            AttrValue::Null => String::new(),
            AttrValue::Bool(b) => b.to_string(),
            AttrValue::Num(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    (*n as i64).to_string()
                } else {
                    n.to_string()
                }
            }
            AttrValue::Str(s) => s.to_string(),
            AttrValue::Style(_) | AttrValue::Handler(_) => String::new(),
        }
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Num(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Num(v as f64)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        AttrValue::Num(v as f64)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.into())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Str(v.into())
    }
}

/// Attribute set for one element, built by chaining.
///
/// The `key` and the four lifecycle hooks are typed fields rather than map
/// entries, so the attribute patch never has to special-case them by name:
/// the map only ever holds values that may reach the host.
#[derive(Clone, Default)]
pub struct Attrs {
    pub(crate) entries: BTreeMap<String, AttrValue>,
    pub(crate) key: Option<Key>,
    pub oncreate: Option<CreateHook>,
    pub onupdate: Option<UpdateHook>,
    pub ondestroy: Option<DestroyHook>,
    pub onremove: Option<RemoveHook>,
}

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.entries.insert(name.into(), value.into());
        self
    }

    /// One style property; accumulates into the nested `style` mapping.
    pub fn style(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let style = match self.entries.remove("style") {
            Some(AttrValue::Style(m)) => {
                let mut m = (*m).clone();
                m.insert(name.into(), value.into());
                m
            }
            _ => {
                let mut m = StyleMap::new();
                m.insert(name.into(), value.into());
                m
            }
        };
        self.entries.insert("style".into(), AttrValue::Style(Rc::new(style)));
        self
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Event handler, e.g. `on("onclick", ...)`. Handlers always take the
    /// property path on the host.
    pub fn on(mut self, event: impl Into<String>, handler: impl Fn(Value) + 'static) -> Self {
        self.entries
            .insert(event.into(), AttrValue::Handler(Rc::new(handler)));
        self
    }

    pub fn oncreate(mut self, hook: impl Fn(&mut dyn Host, NodeRef) + 'static) -> Self {
        self.oncreate = Some(Rc::new(hook));
        self
    }

    pub fn onupdate(mut self, hook: impl Fn(&mut dyn Host, NodeRef, &Attrs) + 'static) -> Self {
        self.onupdate = Some(Rc::new(hook));
        self
    }

    pub fn ondestroy(mut self, hook: impl Fn(&mut dyn Host, NodeRef) + 'static) -> Self {
        self.ondestroy = Some(Rc::new(hook));
        self
    }

    pub fn onremove(mut self, hook: impl Fn(&mut dyn Host, NodeRef, Detach) + 'static) -> Self {
        self.onremove = Some(Rc::new(hook));
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.entries.get(name)
    }
}

/// A component resolves to the node it returns, eagerly at build time. The
/// engine only ever sees the four-field element shape.
pub type Component = Rc<dyn Fn(Attrs, Vec<VNode>) -> VNode>;

pub enum Tag {
    Name(Rc<str>),
    Component(Component),
}

impl From<&str> for Tag {
    fn from(v: &str) -> Self {
        Tag::Name(v.into())
    }
}

impl From<String> for Tag {
    fn from(v: String) -> Self {
        Tag::Name(v.into())
    }
}

impl From<Component> for Tag {
    fn from(v: Component) -> Self {
        Tag::Component(v)
    }
}

/// Component tag from a plain function.
pub fn component(f: impl Fn(Attrs, Vec<VNode>) -> VNode + 'static) -> Tag {
    Tag::Component(Rc::new(f))
}

/// Child argument to [`h`]: a node, a text leaf, a nested sequence, or a
/// dropped placeholder (`Null` and both booleans vanish during flattening).
pub enum Child {
    Null,
    Bool(bool),
    Node(VNode),
    Many(Vec<Child>),
}

impl From<VNode> for Child {
    fn from(v: VNode) -> Self {
        Child::Node(v)
    }
}

impl From<&str> for Child {
    fn from(v: &str) -> Self {
        Child::Node(VNode::Text(v.into()))
    }
}

impl From<String> for Child {
    fn from(v: String) -> Self {
        Child::Node(VNode::Text(v.into()))
    }
}

impl From<f64> for Child {
    fn from(v: f64) -> Self {
        Child::Node(VNode::Text(fmt_num(v).into()))
    }
}

impl From<i64> for Child {
    fn from(v: i64) -> Self {
        Child::Node(VNode::Text(v.to_string().into()))
    }
}

impl From<i32> for Child {
    fn from(v: i32) -> Self {
        Child::Node(VNode::Text(v.to_string().into()))
    }
}

impl From<bool> for Child {
    fn from(v: bool) -> Self {
        Child::Bool(v)
    }
}

impl From<()> for Child {
    fn from(_: ()) -> Self {
        Child::Null
    }
}

impl<T: Into<Child>> From<Option<T>> for Child {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(c) => c.into(),
            None => Child::Null,
        }
    }
}

impl<T: Into<Child>> From<Vec<T>> for Child {
    fn from(v: Vec<T>) -> Self {
        Child::Many(v.into_iter().map(Into::into).collect())
    }
}

fn fmt_num(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        (n as i64).to_string()
    } else {
        n.to_string()
    }
}

fn flatten(child: Child, out: &mut Vec<VNode>) {
    match child {
        Child::Null | Child::Bool(_) => {}
        Child::Node(n) => out.push(n),
        Child::Many(list) => {
            for c in list {
                flatten(c, out);
            }
        }
    }
}

/// Build one normalized node from a tag-or-component, an attribute set, and
/// an arbitrarily nested child sequence.
pub fn h(tag: impl Into<Tag>, attrs: Attrs, children: impl Into<Child>) -> VNode {
    let mut flat = Vec::new();
    flatten(children.into(), &mut flat);

    match tag.into() {
        Tag::Component(component) => component(attrs, flat),
        Tag::Name(tag) => VNode::Element(Rc::new(VElement {
            key: attrs.key.clone(),
            tag,
            attrs,
            children: flat,
        })),
    }
}

/// Text leaf shorthand.
pub fn text(value: impl Into<Rc<str>>) -> VNode {
    VNode::Text(value.into())
}
