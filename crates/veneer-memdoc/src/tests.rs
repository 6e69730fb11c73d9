#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use veneer_core::{
        ActionDecl, ActionResult, Attrs, AttrValue, Child, Detach, Host, LifecycleStack, NodeRef,
        VNode, Value, app, h, hydrate, patch,
    };

    use crate::MemDoc;

    fn mount(doc: &mut MemDoc, node: &VNode) -> NodeRef {
        let hooks = LifecycleStack::new();
        let container = doc.container();
        patch(doc, &hooks, true, container, None, None, node)
    }

    fn repatch(doc: &mut MemDoc, root: NodeRef, old: &VNode, new: &VNode) -> NodeRef {
        let hooks = LifecycleStack::new();
        let container = doc.container();
        patch(doc, &hooks, false, container, Some(root), Some(old), new)
    }

    fn li(key: &str, label: &str) -> Child {
        Child::from(h("li", Attrs::new().key(key), label))
    }

    #[test]
    fn test_identical_reference_is_a_noop() {
        let mut doc = MemDoc::new();
        let tree = h(
            "div",
            Attrs::new().set("class", "app"),
            vec![Child::from(h("span", Attrs::new(), "hi"))],
        );
        let root = mount(&mut doc, &tree);

        doc.reset_stats();
        let unchanged = tree.clone();
        let root_after = repatch(&mut doc, root, &tree, &unchanged);

        assert_eq!(root_after, root);
        assert_eq!(doc.stats().total(), 0);
    }

    #[test]
    fn test_tag_mismatch_replaces_wholesale() {
        let mut doc = MemDoc::new();
        let old = h("div", Attrs::new().set("class", "stale"), "content");
        let root = mount(&mut doc, &old);
        assert_eq!(doc.attr(root, "class").unwrap(), Some("stale".into()));

        doc.reset_stats();
        let new = h("span", Attrs::new(), "content");
        let root_after = repatch(&mut doc, root, &old, &new);

        assert_ne!(root_after, root);
        assert_eq!(doc.tag(root_after).unwrap(), "span");
        // nothing carried over from the replaced node
        assert_eq!(doc.attr(root_after, "class").unwrap(), None);
        assert_eq!(doc.stats().creates, 2); // span + its text node
        assert_eq!(doc.stats().removals, 1);
        assert!(doc.tag(root).is_err());
    }

    #[test]
    fn test_keyed_reorder_preserves_identity() {
        let mut doc = MemDoc::new();
        let old = h("ul", Attrs::new(), vec![li("1", "A"), li("2", "B")]);
        let root = mount(&mut doc, &old);
        let before = doc.children(root);

        doc.reset_stats();
        let new = h("ul", Attrs::new(), vec![li("2", "B"), li("1", "A")]);
        repatch(&mut doc, root, &old, &new);
        let after = doc.children(root);

        // same underlying host nodes, reordered
        assert_eq!(after, vec![before[1], before[0]]);
        assert_eq!(doc.stats().creates, 0);
        assert_eq!(doc.stats().removals, 0);
        assert_eq!(doc.stats().moves, 1);
    }

    #[test]
    fn test_unkeyed_positional_reuse() {
        let mut doc = MemDoc::new();
        let old = h(
            "div",
            Attrs::new(),
            vec![
                Child::from(h("div", Attrs::new(), "one")),
                Child::from(h("span", Attrs::new(), "two")),
            ],
        );
        let root = mount(&mut doc, &old);
        let before = doc.children(root);

        doc.reset_stats();
        let new = h(
            "div",
            Attrs::new(),
            vec![
                Child::from(h("div", Attrs::new(), "one")),
                Child::from(h("p", Attrs::new(), "two")),
            ],
        );
        repatch(&mut doc, root, &old, &new);
        let after = doc.children(root);

        // same tag at position 0: patched in place
        assert_eq!(after[0], before[0]);
        // differing tag at position 1: recreated
        assert_ne!(after[1], before[1]);
        assert_eq!(doc.tag(after[1]).unwrap(), "p");
        assert_eq!(doc.stats().creates, 2);
        assert_eq!(doc.stats().removals, 1);
    }

    #[test]
    fn test_keyed_removal_in_the_middle() {
        let mut doc = MemDoc::new();
        let old = h(
            "ul",
            Attrs::new(),
            vec![li("a", "A"), li("b", "B"), li("c", "C")],
        );
        let root = mount(&mut doc, &old);
        let before = doc.children(root);

        doc.reset_stats();
        let new = h("ul", Attrs::new(), vec![li("a", "A"), li("c", "C")]);
        repatch(&mut doc, root, &old, &new);
        let after = doc.children(root);

        assert_eq!(after, vec![before[0], before[2]]);
        assert_eq!(doc.stats().creates, 0);
        assert_eq!(doc.stats().removals, 1);
    }

    #[test]
    fn test_unkeyed_append_creates_only_the_tail() {
        let mut doc = MemDoc::new();
        let old = h(
            "div",
            Attrs::new(),
            vec![Child::from(h("div", Attrs::new(), "one"))],
        );
        let root = mount(&mut doc, &old);

        doc.reset_stats();
        let new = h(
            "div",
            Attrs::new(),
            vec![
                Child::from(h("div", Attrs::new(), "one")),
                Child::from(h("span", Attrs::new(), "two")),
            ],
        );
        repatch(&mut doc, root, &old, &new);

        assert_eq!(doc.children(root).len(), 2);
        assert_eq!(doc.stats().creates, 2); // span + text
        assert_eq!(doc.stats().removals, 0);
    }

    #[test]
    fn test_attribute_clearing() {
        let mut doc = MemDoc::new();
        let old = h(
            "div",
            Attrs::new().set("data-level", 5).set("data-flag", true),
            (),
        );
        let root = mount(&mut doc, &old);
        assert_eq!(doc.attr(root, "data-level").unwrap(), Some("5".into()));
        assert_eq!(doc.attr(root, "data-flag").unwrap(), Some("true".into()));

        let new = h(
            "div",
            Attrs::new()
                .set("data-level", AttrValue::Null)
                .set("data-flag", false),
            (),
        );
        repatch(&mut doc, root, &old, &new);

        assert_eq!(doc.attr(root, "data-level").unwrap(), None);
        assert_eq!(doc.attr(root, "data-flag").unwrap(), None);

        // absent from the attribute set entirely clears as well
        let bare = h("div", Attrs::new(), ());
        repatch(&mut doc, root, &new, &bare);
        assert_eq!(doc.attr(root, "data-level").unwrap(), None);
    }

    #[test]
    fn test_value_compares_against_live_property() {
        let mut doc = MemDoc::new();
        let old = h("input", Attrs::new().set("value", "a"), ());
        let root = mount(&mut doc, &old);

        // out-of-band mutation, the way user input drifts a document
        doc.set_property(root, "value", AttrValue::from("typed"));

        doc.reset_stats();
        let synced = h("input", Attrs::new().set("value", "typed"), ());
        repatch(&mut doc, root, &old, &synced);
        // live property already matches: untouched
        assert_eq!(doc.stats().prop_writes, 0);

        let changed = h("input", Attrs::new().set("value", "fresh"), ());
        repatch(&mut doc, root, &synced, &changed);
        match doc.property(root, "value") {
            Some(AttrValue::Str(s)) => assert_eq!(&*s, "fresh"),
            other => panic!("unexpected value property: {:?}", other.is_some()),
        }
    }

    #[test]
    fn test_style_union_patch() {
        let mut doc = MemDoc::new();
        let old = h(
            "div",
            Attrs::new().style("color", "red").style("margin", "1px"),
            (),
        );
        let root = mount(&mut doc, &old);
        assert_eq!(doc.style_value(root, "color").unwrap(), Some("red".into()));
        assert_eq!(doc.style_value(root, "margin").unwrap(), Some("1px".into()));

        let new = h("div", Attrs::new().style("color", "blue"), ());
        repatch(&mut doc, root, &old, &new);

        assert_eq!(doc.style_value(root, "color").unwrap(), Some("blue".into()));
        // absent in the new style: cleared
        assert_eq!(doc.style_value(root, "margin").unwrap(), None);
    }

    #[test]
    fn test_create_hooks_run_children_first() {
        let order: Rc<RefCell<Vec<&str>>> = Rc::new(RefCell::new(Vec::new()));
        let mut doc = MemDoc::new();
        let hooks = LifecycleStack::new();

        let parent_order = order.clone();
        let child_order = order.clone();
        let tree = h(
            "div",
            Attrs::new().oncreate(move |_, _| parent_order.borrow_mut().push("parent")),
            vec![Child::from(h(
                "span",
                Attrs::new().oncreate(move |_, _| child_order.borrow_mut().push("child")),
                (),
            ))],
        );

        let container = doc.container();
        patch(&mut doc, &hooks, true, container, None, None, &tree);
        assert_eq!(hooks.len(), 2);
        hooks.drain(&mut doc);

        assert_eq!(*order.borrow(), ["child", "parent"]);
    }

    #[test]
    fn test_oncreate_then_onupdate() {
        let events: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let mut doc = MemDoc::new();
        let hooks = LifecycleStack::new();
        let container = doc.container();

        let tree_with_hooks = |label: &'static str, class: &'static str, log: Rc<RefCell<Vec<String>>>| {
            let created = log.clone();
            let updated = log.clone();
            h(
                "div",
                Attrs::new()
                    .set("class", class)
                    .oncreate(move |_, _| created.borrow_mut().push(format!("create:{label}")))
                    .onupdate(move |_, _, old_attrs| {
                        let before = match old_attrs.get("class") {
                            Some(AttrValue::Str(s)) => s.to_string(),
                            _ => String::new(),
                        };
                        updated.borrow_mut().push(format!("update:{label}:{before}"));
                    }),
                (),
            )
        };

        let first = tree_with_hooks("a", "one", events.clone());
        let root = patch(&mut doc, &hooks, true, container, None, None, &first);
        hooks.drain(&mut doc);
        assert_eq!(*events.borrow(), vec!["create:a".to_string()]);

        events.borrow_mut().clear();
        let second = tree_with_hooks("b", "two", events.clone());
        patch(
            &mut doc,
            &hooks,
            false,
            container,
            Some(root),
            Some(&first),
            &second,
        );
        hooks.drain(&mut doc);
        // past the first render the update hook fires, with the old attributes
        assert_eq!(*events.borrow(), vec!["update:b:one".to_string()]);
    }

    #[test]
    fn test_destroy_notifications_children_first() {
        let order: Rc<RefCell<Vec<&str>>> = Rc::new(RefCell::new(Vec::new()));
        let mut doc = MemDoc::new();

        let outer = order.clone();
        let inner = order.clone();
        let old = h(
            "div",
            Attrs::new(),
            vec![Child::from(h(
                "p",
                Attrs::new().ondestroy(move |_, _| outer.borrow_mut().push("parent")),
                vec![Child::from(h(
                    "span",
                    Attrs::new().ondestroy(move |_, _| inner.borrow_mut().push("child")),
                    (),
                ))],
            ))],
        );
        let root = mount(&mut doc, &old);

        let new = h("div", Attrs::new(), ());
        repatch(&mut doc, root, &old, &new);

        assert_eq!(*order.borrow(), ["child", "parent"]);
        assert!(doc.children(root).is_empty());
    }

    #[test]
    fn test_onremove_defers_detachment() {
        let parked: Rc<RefCell<Option<Detach>>> = Rc::new(RefCell::new(None));
        let destroyed = Rc::new(RefCell::new(false));
        let mut doc = MemDoc::new();

        let slot = parked.clone();
        let destroyed_flag = destroyed.clone();
        let old = h(
            "div",
            Attrs::new(),
            vec![Child::from(h(
                "p",
                Attrs::new()
                    .ondestroy(move |_, _| *destroyed_flag.borrow_mut() = true)
                    .onremove(move |_, _, detach| *slot.borrow_mut() = Some(detach)),
                "leaving",
            ))],
        );
        let root = mount(&mut doc, &old);

        let new = h("div", Attrs::new(), ());
        repatch(&mut doc, root, &old, &new);

        // still attached: the hook parked the detach token
        assert_eq!(doc.children(root).len(), 1);
        assert!(!*destroyed.borrow());

        let Some(detach) = parked.borrow_mut().take() else {
            panic!("onremove did not run");
        };
        detach.proceed(&mut doc);
        assert!(doc.children(root).is_empty());
        assert!(*destroyed.borrow());
    }

    #[test]
    fn test_hydrate_reads_existing_tree() {
        let mut doc = MemDoc::new();
        let container = doc.container();
        let div = doc.create_element("DIV", None);
        doc.append(container, div);
        let greeting = doc.create_text("hello");
        doc.append(div, greeting);

        let old = hydrate(&doc, div);
        assert_eq!(old.tag(), Some("div"));

        // first patch over hydrated content applies attributes in place
        doc.reset_stats();
        let hooks = LifecycleStack::new();
        let new = h("div", Attrs::new().set("class", "live"), "hello");
        let root = patch(
            &mut doc,
            &hooks,
            true,
            container,
            Some(div),
            Some(&old),
            &new,
        );

        assert_eq!(root, div);
        assert_eq!(doc.stats().creates, 0);
        assert_eq!(doc.attr(div, "class").unwrap(), Some("live".into()));
    }

    #[test]
    fn test_counter_updates_text_in_place() {
        let decl = ActionDecl::scope([(
            "increment",
            ActionDecl::act(|_| {
                ActionResult::thunk(|state, _| {
                    let n = state.get("count").as_num().unwrap_or(0.0);
                    ActionResult::update(Value::map([("count", n + 1.0)]))
                })
            }),
        )]);

        let instance = app(
            Value::map([("count", 0)]),
            decl,
            |state, actions| {
                let actions = actions.clone();
                h(
                    "main",
                    Attrs::new(),
                    vec![
                        Child::from(h(
                            "h1",
                            Attrs::new(),
                            state.get("count").as_num().unwrap_or(0.0),
                        )),
                        Child::from(h(
                            "button",
                            Attrs::new().on("onclick", move |_| {
                                actions.call("increment", Value::Null);
                            }),
                            "+1",
                        )),
                    ],
                )
            },
            Some(MemDoc::new()),
        );
        instance.flush();

        let root = instance.root().unwrap();
        let (heading, button, digits) = instance
            .with_host(|doc| {
                let heading = doc.child(root, 0).unwrap();
                (
                    heading,
                    doc.child(root, 1).unwrap(),
                    doc.child(heading, 0).unwrap(),
                )
            })
            .unwrap();
        assert_eq!(
            instance.with_host(|doc| doc.text(digits).unwrap()).unwrap(),
            "0"
        );

        instance
            .with_host(|doc| assert_eq!(doc.stats().creates, 5))
            .unwrap();

        // one synthetic click, one coalesced render
        assert!(instance.emit(button, "onclick", Value::Null));
        instance.flush();

        let after = instance
            .with_host(|doc| {
                (
                    doc.child(root, 0).unwrap(),
                    doc.child(doc.child(root, 0).unwrap(), 0).unwrap(),
                    doc.text(digits).unwrap(),
                    doc.stats(),
                )
            })
            .unwrap();
        // same heading, same text node, new value
        assert_eq!(after.0, heading);
        assert_eq!(after.1, digits);
        assert_eq!(after.2, "1");
        assert_eq!(after.3.creates, 5); // nothing new since mount
    }

    #[test]
    fn test_svg_subtree_enters_namespace() {
        let mut doc = MemDoc::new();
        let tree = h(
            "svg",
            Attrs::new(),
            vec![Child::from(h("circle", Attrs::new().set("id", "dot"), ()))],
        );
        let root = mount(&mut doc, &tree);
        let circle = doc.child(root, 0).unwrap();

        let ns = "http://www.w3.org/2000/svg";
        assert_eq!(doc.namespace(root).unwrap().as_deref(), Some(ns));
        assert_eq!(doc.namespace(circle).unwrap().as_deref(), Some(ns));

        // inside the vector namespace, names that would otherwise be
        // properties land as attributes
        assert_eq!(doc.attr(circle, "id").unwrap(), Some("dot".into()));
        assert!(doc.property(circle, "id").is_none());
    }

    #[test]
    fn test_insert_before_moves_attached_nodes() {
        let mut doc = MemDoc::new();
        let container = doc.container();
        let list = doc.create_element("ul", None);
        doc.append(container, list);
        let a = doc.create_element("li", None);
        let b = doc.create_element("li", None);
        doc.append(list, a);
        doc.append(list, b);
        let count = doc.node_count();

        doc.insert_before(list, b, Some(a));

        assert_eq!(doc.children(list), vec![b, a]);
        // a move, not a detach-and-recreate
        assert_eq!(doc.node_count(), count);
        assert_eq!(doc.stats().moves, 1);
    }

    #[test]
    fn test_snapshot_markup() {
        let mut doc = MemDoc::new();
        let tree = h(
            "div",
            Attrs::new().set("data-page", "home").style("color", "red"),
            vec![Child::from(h("span", Attrs::new(), "hi"))],
        );
        mount(&mut doc, &tree);

        assert_eq!(
            doc.snapshot(),
            "<body><div data-page=\"home\" style=\"color: red\"><span>hi</span></div></body>"
        );
    }

    #[test]
    fn test_stale_reference_errors() {
        let mut doc = MemDoc::new();
        let old = h("div", Attrs::new(), "gone");
        let root = mount(&mut doc, &old);

        let new = h("span", Attrs::new(), "kept");
        repatch(&mut doc, root, &old, &new);

        assert!(matches!(
            doc.tag(root),
            Err(crate::MemdocError::StaleNode(_))
        ));
    }
}
