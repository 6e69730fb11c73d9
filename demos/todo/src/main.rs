use std::rc::Rc;

use anyhow::Result;
use veneer_core::prelude::*;
use veneer_core::value::Map;
use veneer_memdoc::MemDoc;

fn with_items(state: &Value, f: impl FnOnce(&mut Map)) -> ActionResult {
    let mut items = state
        .get("items")
        .as_map()
        .map(|m| (**m).clone())
        .unwrap_or_default();
    f(&mut items);
    ActionResult::update(Value::map([("items", Value::Map(Rc::new(items)))]))
}

fn actions() -> ActionDecl {
    ActionDecl::scope([
        (
            "add",
            ActionDecl::act(|payload| {
                ActionResult::thunk(move |state, _| {
                    let label = payload.as_str().unwrap_or("untitled").to_string();
                    let next_id = state.get("next_id").as_num().unwrap_or(1.0);
                    let entry = Value::map([
                        ("label", Value::from(label)),
                        ("done", Value::from(false)),
                    ]);
                    let result = with_items(&state, |items| {
                        items.insert(format!("item-{next_id}"), entry);
                    });
                    match result {
                        ActionResult::Update(update) => ActionResult::Update(
                            update.merge(&Value::map([("next_id", next_id + 1.0)])),
                        ),
                        other => other,
                    }
                })
            }),
        ),
        (
            "toggle",
            ActionDecl::act(|payload| {
                ActionResult::thunk(move |state, _| {
                    let id = payload.as_str().unwrap_or_default().to_string();
                    let item = state.get("items").get(&id);
                    let done = item.get("done").as_bool().unwrap_or(false);
                    with_items(&state, |items| {
                        items.insert(id, item.merge(&Value::map([("done", !done)])));
                    })
                })
            }),
        ),
        (
            "remove",
            ActionDecl::act(|payload| {
                ActionResult::thunk(move |state, _| {
                    let id = payload.as_str().unwrap_or_default();
                    with_items(&state, |items| {
                        items.remove(id);
                    })
                })
            }),
        ),
        (
            "filter",
            ActionDecl::act(|payload| {
                let filter = payload.as_str().unwrap_or("all").to_string();
                ActionResult::update(Value::map([("filter", filter)]))
            }),
        ),
        (
            "sort",
            ActionDecl::act(|payload| {
                let order = payload.as_str().unwrap_or("asc").to_string();
                ActionResult::update(Value::map([("sort", order)]))
            }),
        ),
    ])
}

fn item_row(id: &str, item: &Value) -> VNode {
    let done = item.get("done").as_bool().unwrap_or(false);
    let label = item.get("label").as_str().unwrap_or("").to_string();

    h(
        "li",
        Attrs::new()
            .key(id)
            .set("class", if done { "done" } else { "open" })
            .onremove(|host, node, detach| {
                log::info!("item row {node:?} leaving");
                detach.proceed(host);
            }),
        label,
    )
}

fn view(state: &Value, _actions: &Actions) -> VNode {
    let filter = state.get("filter").as_str().unwrap_or("all").to_string();
    let descending = state.get("sort").as_str() == Some("desc");

    let mut visible: Vec<(String, Value)> = state
        .get("items")
        .as_map()
        .map(|items| {
            items
                .iter()
                .filter(|(_, item)| {
                    let done = item.get("done").as_bool().unwrap_or(false);
                    match filter.as_str() {
                        "active" => !done,
                        "done" => done,
                        _ => true,
                    }
                })
                .map(|(id, item)| (id.clone(), item.clone()))
                .collect()
        })
        .unwrap_or_default();
    visible.sort_by(|(_, a), (_, b)| {
        let a = a.get("label").as_str().unwrap_or("").to_string();
        let b = b.get("label").as_str().unwrap_or("").to_string();
        if descending { b.cmp(&a) } else { a.cmp(&b) }
    });
    let rows: Vec<Child> = visible
        .iter()
        .map(|(id, item)| Child::from(item_row(id, item)))
        .collect();

    h(
        "main",
        Attrs::new(),
        vec![
            Child::from(h("h1", Attrs::new(), format!("todo ({filter})"))),
            Child::from(h("ul", Attrs::new(), rows)),
        ],
    )
}

fn main() -> Result<()> {
    env_logger::init();

    let state = Value::map([
        ("items", Value::empty_map()),
        ("filter", Value::from("all")),
        ("sort", Value::from("asc")),
        ("next_id", Value::from(1)),
    ]);
    let instance = app(state, actions(), view, Some(MemDoc::new()));
    instance.flush();

    let actions = instance.actions();

    actions.call("add", Value::from("water the plants"));
    actions.call("add", Value::from("file the report"));
    actions.call("add", Value::from("read the mail"));
    instance.flush();
    println!("{}", instance.with_host(MemDoc::snapshot).unwrap_or_default());

    actions.call("toggle", Value::from("item-2"));
    instance.flush();
    println!("{}", instance.with_host(MemDoc::snapshot).unwrap_or_default());

    actions.call("filter", Value::from("active"));
    instance.flush();
    println!("{}", instance.with_host(MemDoc::snapshot).unwrap_or_default());

    actions.call("remove", Value::from("item-1"));
    actions.call("filter", Value::from("all"));
    instance.flush();
    println!("{}", instance.with_host(MemDoc::snapshot).unwrap_or_default());

    // keyed reorder: same rows, reversed, no recreation
    actions.call("sort", Value::from("desc"));
    instance.flush();
    println!("{}", instance.with_host(MemDoc::snapshot).unwrap_or_default());

    println!("final state: {}", instance.state());
    Ok(())
}
