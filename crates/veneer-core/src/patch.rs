use std::collections::{BTreeSet, HashMap, HashSet};

use crate::host::{Host, NodeRef};
use crate::schedule::LifecycleStack;
use crate::vnode::{Attrs, AttrValue, Key, VElement, VNode};

const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Per-pass engine state. Built fresh for every render; the hook stack is
/// the only thing that outlives the walk, drained by the scheduler once the
/// host mutations are done.
struct PatchCtx<'a> {
    host: &'a mut dyn Host,
    hooks: &'a LifecycleStack,
    first_render: bool,
}

/// Patch the host subtree at one position from `old` to `new`.
///
/// `element` is the live host node currently representing `old` (`None` when
/// nothing is mounted there yet). Returns the host node now representing
/// `new`. Runs to completion synchronously; scheduled `oncreate`/`onupdate`
/// hooks land on `hooks` and are not invoked here.
pub fn patch(
    host: &mut dyn Host,
    hooks: &LifecycleStack,
    first_render: bool,
    parent: NodeRef,
    element: Option<NodeRef>,
    old: Option<&VNode>,
    new: &VNode,
) -> NodeRef {
    let mut ctx = PatchCtx {
        host,
        hooks,
        first_render,
    };
    patch_node(&mut ctx, parent, element, old, new, false)
}

fn patch_node(
    ctx: &mut PatchCtx,
    parent: NodeRef,
    element: Option<NodeRef>,
    old: Option<&VNode>,
    new: &VNode,
    is_svg: bool,
) -> NodeRef {
    if let Some(old) = old
        && let Some(el) = element
        && old.same_ref(new)
    {
        // unchanged subtree reference, skip all descendant work
        return el;
    }

    let (Some(old), Some(el)) = (old, element) else {
        // nothing mounted at this position: fresh subtree, inserted before
        // whatever currently sits there (append when nothing does)
        let created = create(ctx, new, is_svg);
        ctx.host.insert_before(parent, created, element);
        return created;
    };

    match (old, new) {
        (VNode::Element(o), VNode::Element(n)) if o.tag == n.tag => {
            let is_svg = is_svg || &*n.tag == "svg";
            update_attributes(ctx, el, &o.attrs, &n.attrs, is_svg);
            reconcile_children(ctx, el, o, n, is_svg);
            el
        }
        (VNode::Text(_), VNode::Text(value)) => {
            ctx.host.set_text(el, value);
            el
        }
        _ => {
            // type mismatch: replace wholesale, nothing carries over
            let created = create(ctx, new, is_svg);
            ctx.host.insert_before(parent, created, Some(el));
            remove_element(ctx, parent, el, old);
            created
        }
    }
}

/// Build a fresh host subtree for `node`. Children are created and appended
/// before the attribute set is applied; `oncreate` is staged before either,
/// so a parent's hook sits below its children's on the stack.
fn create(ctx: &mut PatchCtx, node: &VNode, is_svg: bool) -> NodeRef {
    match node {
        VNode::Text(value) => ctx.host.create_text(value),
        VNode::Element(e) => {
            let is_svg = is_svg || &*e.tag == "svg";
            let el = ctx
                .host
                .create_element(&e.tag, is_svg.then_some(SVG_NS));

            if let Some(hook) = e.attrs.oncreate.clone() {
                ctx.hooks.push(Box::new(move |host| hook(host, el)));
            }

            for child in &e.children {
                let child_el = create(ctx, child, is_svg);
                ctx.host.append(el, child_el);
            }

            for (name, value) in &e.attrs.entries {
                update_attribute(ctx.host, el, name, Some(value), None, is_svg);
            }

            el
        }
    }
}

/// Attribute diff over the union of old and new names, then lifecycle hook
/// staging: `oncreate` while the very first render pass is still underway,
/// `onupdate` afterwards.
fn update_attributes(ctx: &mut PatchCtx, el: NodeRef, old: &Attrs, new: &Attrs, is_svg: bool) {
    let names: BTreeSet<&String> = old.entries.keys().chain(new.entries.keys()).collect();

    for name in names {
        let new_value = new.entries.get(name.as_str());

        // `value` and `checked` drift under user interaction between
        // renders; compare against the live host property for those two
        let effective_old = if name == "value" || name == "checked" {
            ctx.host.property(el, name)
        } else {
            old.entries.get(name.as_str()).cloned()
        };

        let unchanged = match (new_value, &effective_old) {
            (None, None) => true,
            (Some(a), Some(b)) => a.same(b),
            (None, Some(b)) => b.same(&AttrValue::Null),
            (Some(a), None) => a.same(&AttrValue::Null),
        };
        if unchanged {
            continue;
        }

        update_attribute(
            ctx.host,
            el,
            name,
            new_value,
            old.entries.get(name.as_str()),
            is_svg,
        );
    }

    if ctx.first_render {
        if let Some(hook) = new.oncreate.clone() {
            ctx.hooks.push(Box::new(move |host| hook(host, el)));
        }
    } else if let Some(hook) = new.onupdate.clone() {
        let old_attrs = old.clone();
        ctx.hooks
            .push(Box::new(move |host| hook(host, el, &old_attrs)));
    }
}

/// Apply one attribute to the host.
///
/// Policy: `key` never reaches the host; `style` fans out over the union of
/// old and new style properties; handlers always take the property path;
/// otherwise property when the host knows the name (outside the vector
/// namespace), attribute when the value is present and not `false`. A `Null`
/// or `false` value additionally removes the attribute.
fn update_attribute(
    host: &mut dyn Host,
    el: NodeRef,
    name: &str,
    new: Option<&AttrValue>,
    old: Option<&AttrValue>,
    is_svg: bool,
) {
    if name == "key" {
        return;
    }

    if name == "style" {
        let empty = crate::vnode::StyleMap::new();
        let old_style = match old {
            Some(AttrValue::Style(m)) => m,
            _ => &empty,
        };
        let new_style = match new {
            Some(AttrValue::Style(m)) => m,
            _ => &empty,
        };
        let props: BTreeSet<&String> = old_style.keys().chain(new_style.keys()).collect();
        for prop in props {
            let value = new_style.get(prop.as_str()).map(String::as_str).unwrap_or("");
            host.set_style(el, prop, value);
        }
        return;
    }

    let is_handler = matches!(new, Some(AttrValue::Handler(_)));
    if is_handler || (host.has_property(el, name) && !is_svg) {
        let value = match new {
            None | Some(AttrValue::Null) => AttrValue::Str("".into()),
            Some(v) => v.clone(),
        };
        host.set_property(el, name, value);
    } else if let Some(value) = new
        && !value.is_cleared()
    {
        host.set_attribute(el, name, &value.to_attr_string());
    }

    if new.is_none_or(AttrValue::is_cleared) {
        host.remove_attribute(el, name);
    }
}

/// Keyed/unkeyed child walk. Two cursors: `i` over the old children, `j`
/// over the new. Unkeyed children pair up positionally; keyed children match
/// by identity wherever they sit, moving the existing host node when the
/// position changed. Leftover old children go away at the end.
fn reconcile_children(
    ctx: &mut PatchCtx,
    el: NodeRef,
    old: &VElement,
    new: &VElement,
    is_svg: bool,
) {
    // snapshot the live children up front; patching shifts them underneath
    let live = ctx.host.children(el);
    let old_elements: Vec<Option<NodeRef>> = (0..old.children.len())
        .map(|i| live.get(i).copied())
        .collect();

    let mut old_keyed: HashMap<Key, (Option<NodeRef>, VNode)> = HashMap::new();
    for (i, old_child) in old.children.iter().enumerate() {
        if let Some(key) = old_child.key() {
            old_keyed.insert(key.clone(), (old_elements[i], old_child.clone()));
        }
    }

    let mut consumed: HashSet<Key> = HashSet::new();
    let mut i = 0;
    let mut j = 0;

    while j < new.children.len() {
        let old_child = old.children.get(i);
        let old_key = old_child.and_then(|c| c.key().cloned());
        let new_child = &new.children[j];
        let new_key = new_child.key().cloned();

        // old child already matched by an earlier new child this pass
        if let Some(key) = &old_key
            && consumed.contains(key)
        {
            i += 1;
            continue;
        }

        let Some(new_key) = new_key else {
            if old_key.is_none() {
                patch_node(
                    ctx,
                    el,
                    old_elements.get(i).copied().flatten(),
                    old_child,
                    new_child,
                    is_svg,
                );
                j += 1;
            }
            // an unkeyed new child never matches a keyed old child
            i += 1;
            continue;
        };

        let recycled = old_keyed.get(&new_key).cloned();

        if old_key.as_ref() == Some(&new_key) {
            // key already in position: reuse in place
            let (recycled_el, recycled_node) = match &recycled {
                Some((e, n)) => (*e, Some(n)),
                None => (None, None),
            };
            patch_node(ctx, el, recycled_el, recycled_node, new_child, is_svg);
            i += 1;
        } else if let Some((Some(recycled_el), recycled_node)) = recycled {
            // key exists elsewhere: move the host node here, then patch
            ctx.host
                .insert_before(el, recycled_el, old_elements.get(i).copied().flatten());
            patch_node(
                ctx,
                el,
                Some(recycled_el),
                Some(&recycled_node),
                new_child,
                is_svg,
            );
        } else {
            // unseen key: fresh subtree at this position
            patch_node(
                ctx,
                el,
                old_elements.get(i).copied().flatten(),
                None,
                new_child,
                is_svg,
            );
        }

        consumed.insert(new_key);
        j += 1;
    }

    // unkeyed leftovers past the walk
    while i < old.children.len() {
        let old_child = &old.children[i];
        if old_child.key().is_none()
            && let Some(child_el) = old_elements[i]
        {
            remove_element(ctx, el, child_el, old_child);
        }
        i += 1;
    }

    // keyed entries no new child claimed, in old child order
    for old_child in &old.children {
        if let Some(key) = old_child.key()
            && let Some((child_el, node)) = old_keyed.remove(key)
            && !consumed.contains(key)
            && let Some(child_el) = child_el
        {
            remove_element(ctx, el, child_el, &node);
        }
    }
}

/// Deferred detachment token handed to `onremove`. Destroy notifications and
/// the actual removal both wait until `proceed` runs.
pub struct Detach {
    parent: NodeRef,
    node: NodeRef,
    vnode: VNode,
}

impl Detach {
    pub fn node(&self) -> NodeRef {
        self.node
    }

    /// Notify `ondestroy` through the subtree (children before parents),
    /// then detach from the host tree.
    pub fn proceed(self, host: &mut dyn Host) {
        destroy_walk(host, self.node, &self.vnode);
        host.remove_child(self.parent, self.node);
    }
}

fn remove_element(ctx: &mut PatchCtx, parent: NodeRef, element: NodeRef, node: &VNode) {
    let detach = Detach {
        parent,
        node: element,
        vnode: node.clone(),
    };

    let onremove = match node {
        VNode::Element(e) => e.attrs.onremove.clone(),
        VNode::Text(_) => None,
    };

    match onremove {
        Some(hook) => hook(ctx.host, element, detach),
        None => detach.proceed(ctx.host),
    }
}

fn destroy_walk(host: &mut dyn Host, element: NodeRef, node: &VNode) {
    if let VNode::Element(e) = node {
        let children = host.children(element);
        for (i, child) in e.children.iter().enumerate() {
            if let Some(child_el) = children.get(i).copied() {
                destroy_walk(host, child_el, child);
            }
        }
        if let Some(hook) = &e.attrs.ondestroy {
            hook(host, element);
        }
    }
}
