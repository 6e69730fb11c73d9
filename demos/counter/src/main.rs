use anyhow::{Context, Result};
use veneer_core::prelude::*;
use veneer_memdoc::MemDoc;

fn actions() -> ActionDecl {
    ActionDecl::scope([
        (
            "increment",
            ActionDecl::act(|_| {
                ActionResult::thunk(|state, _| {
                    let count = state.get("count").as_num().unwrap_or(0.0);
                    ActionResult::update(Value::map([("count", count + 1.0)]))
                })
            }),
        ),
        (
            "decrement",
            ActionDecl::act(|_| {
                ActionResult::thunk(|state, _| {
                    let count = state.get("count").as_num().unwrap_or(0.0);
                    ActionResult::update(Value::map([("count", count - 1.0)]))
                })
            }),
        ),
        (
            "add",
            ActionDecl::act(|payload| {
                ActionResult::thunk(move |state, _| {
                    let count = state.get("count").as_num().unwrap_or(0.0);
                    let amount = payload.as_num().unwrap_or(0.0);
                    ActionResult::update(Value::map([("count", count + amount)]))
                })
            }),
        ),
    ])
}

fn view(state: &Value, actions: &Actions) -> VNode {
    let count = state.get("count").as_num().unwrap_or(0.0);
    let increment = actions.clone();
    let decrement = actions.clone();

    h(
        "main",
        Attrs::new().set("class", "counter"),
        vec![
            Child::from(h("h1", Attrs::new(), count)),
            Child::from(h(
                "button",
                Attrs::new().on("onclick", move |_| {
                    increment.call("increment", Value::Null);
                }),
                "+",
            )),
            Child::from(h(
                "button",
                Attrs::new().on("onclick", move |_| {
                    decrement.call("decrement", Value::Null);
                }),
                "-",
            )),
        ],
    )
}

fn main() -> Result<()> {
    env_logger::init();

    let instance = app(Value::map([("count", 0)]), actions(), view, Some(MemDoc::new()));
    instance.flush();
    println!("{}", instance.with_host(MemDoc::snapshot).unwrap_or_default());

    let root = instance.root().context("nothing rendered")?;
    let plus = instance
        .with_host(|doc| doc.child(root, 1))
        .context("no render target")??;
    let minus = instance
        .with_host(|doc| doc.child(root, 2))
        .context("no render target")??;

    // three synthetic clicks in one turn coalesce into a single render
    instance.emit(plus, "onclick", Value::Null);
    instance.emit(plus, "onclick", Value::Null);
    instance.emit(minus, "onclick", Value::Null);
    instance.flush();
    println!("{}", instance.with_host(MemDoc::snapshot).unwrap_or_default());

    instance.actions().call("add", Value::from(10));
    instance.flush();
    println!("{}", instance.with_host(MemDoc::snapshot).unwrap_or_default());

    println!("final state: {}", instance.state());
    Ok(())
}
