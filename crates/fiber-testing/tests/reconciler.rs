use std::cell::{Cell, RefCell};
use std::rc::Rc;

use fiber_core::{
    use_state, Component, Element, HostOp, Properties, ReconcilerConfig, StateSetter,
};
use fiber_testing::{run_test_reconciler, ReconcilerTestRule, UnitBudgetDeadline};

fn menu(items: &[&str]) -> Element {
    Element::host("ul")
        .prop("class", "menu")
        .children(items.iter().map(|item| Element::host("li").child(Element::text(*item))))
}

#[test]
fn rerendering_the_same_tree_is_silent() {
    run_test_reconciler(|rule| {
        rule.set_content(|| menu(&["a", "b"]));
        rule.pump_until_idle().unwrap();
        rule.take_ops();

        rule.rerender();
        let commits = rule.pump_until_idle().unwrap();

        assert!(rule.take_ops().iter().all(|op| !op.is_property_write()));
        assert_eq!(commits[0].placements, 0);
        assert_eq!(commits[0].deletions, 0);
        assert_eq!(commits[0].patches, 0);
    });
}

#[test]
fn changing_the_tag_replaces_the_node() {
    let tag = Rc::new(Cell::new("p"));
    let mut rule = ReconcilerTestRule::new();
    rule.set_content({
        let tag = Rc::clone(&tag);
        move || Element::host("div").child(Element::host(tag.get()))
    });
    rule.pump_until_idle().unwrap();
    let old = rule.node_at(&[0, 0]).unwrap();
    rule.take_ops();

    tag.set("span");
    rule.rerender();
    rule.pump_until_idle().unwrap();

    let div = rule.node_at(&[0]).unwrap();
    let new = rule.node_at(&[0, 0]).unwrap();
    let ops = rule.take_ops();
    assert!(ops.contains(&HostOp::RemoveChild { parent: div, child: old }));
    assert!(ops.contains(&HostOp::AppendChild { parent: div, child: new }));
    assert_eq!(rule.dump(), "<root>\n  <div>\n    <span>\n");
}

#[test]
fn shrinking_and_growing_lists() {
    let items = Rc::new(Cell::new(3));
    let mut rule = ReconcilerTestRule::new();
    rule.set_content({
        let items = Rc::clone(&items);
        move || Element::host("ol").children((0..items.get()).map(|_| Element::host("li")))
    });
    rule.pump_until_idle().unwrap();
    let kept = rule.node_at(&[0, 0]).unwrap();

    items.set(1);
    rule.rerender();
    let shrink = rule.pump_until_idle().unwrap();
    assert_eq!(shrink[0].deletions, 2);
    assert_eq!(rule.host().children(rule.node_at(&[0]).unwrap()).unwrap(), &[kept]);

    items.set(4);
    rule.rerender();
    let grow = rule.pump_until_idle().unwrap();
    assert_eq!(grow[0].placements, 3);
    let ol = rule.node_at(&[0]).unwrap();
    assert_eq!(rule.host().children(ol).unwrap().len(), 4);
    assert_eq!(rule.node_at(&[0, 0]).unwrap(), kept);
}

fn badge(_: &Properties) -> anyhow::Result<Element> {
    Ok(Element::host("span").prop("class", "badge"))
}

#[test]
fn component_output_is_attached_exactly_once() {
    run_test_reconciler(|rule| {
        rule.set_content(|| Element::component(Component::new(badge)));
        rule.pump_until_idle().unwrap();

        let span = rule.node_at(&[0]).unwrap();
        let appends: Vec<_> = rule
            .take_ops()
            .into_iter()
            .filter(|op| matches!(op, HostOp::AppendChild { .. }))
            .collect();
        assert_eq!(
            appends,
            vec![HostOp::AppendChild { parent: rule.container(), child: span }]
        );
    });
}

#[test]
fn state_survives_rerenders() {
    let mut rule = ReconcilerTestRule::new();
    let renders = Rc::new(Cell::new(0));
    let counter = {
        let renders = Rc::clone(&renders);
        Component::new(move |_| {
            let (count, set_count) = use_state(0);
            renders.set(renders.get() + 1);
            Ok(Element::host("button")
                .prop("count", count)
                .on("click", move |_| {
                    set_count.update(|count| count + 1);
                    set_count.update(|count| count + 1);
                }))
        })
    };
    rule.set_content(move || Element::component(counter.clone()));
    rule.pump_until_idle().unwrap();
    let button = rule.node_at(&[0]).unwrap();
    assert_eq!(rule.dump(), "<root>\n  <button count=0 @click>\n");

    assert_eq!(rule.dispatch(button, "click").unwrap(), 1);
    assert_eq!(rule.dump(), "<root>\n  <button count=2 @click>\n");

    rule.rerender();
    rule.pump_until_idle().unwrap();
    assert_eq!(rule.dump(), "<root>\n  <button count=2 @click>\n");
    assert_eq!(rule.node_at(&[0]).unwrap(), button);
    assert_eq!(renders.get(), 3);
}

fn page() -> Element {
    Element::host("main")
        .child(Element::component(Component::new(badge)))
        .child(menu(&["one", "two", "three"]))
        .child(Element::host("footer").prop("year", 2024).child(Element::text("end")))
}

#[test]
fn sliced_rendering_matches_a_single_pass() {
    let mut whole = ReconcilerTestRule::new();
    whole.set_content(page);
    whole.pump_until_idle().unwrap();

    let mut sliced = ReconcilerTestRule::new();
    sliced.set_content(page);
    sliced.pump_with(&UnitBudgetDeadline).unwrap();

    assert_eq!(whole.slices(), 1);
    assert!(sliced.slices() > 10);
    assert_eq!(sliced.dump(), whole.dump());
}

#[test]
fn tight_threshold_with_generous_deadline_finishes_in_one_slice() {
    let config = ReconcilerConfig::default().with_yield_threshold(std::time::Duration::ZERO);
    let mut rule = ReconcilerTestRule::with_config(config);
    rule.set_content(page);
    rule.pump_with(&UnitBudgetDeadline).unwrap();
    assert_eq!(rule.slices(), 1);
}

#[test]
fn replacing_content_mid_pass_keeps_only_the_latest() {
    let mut rule = ReconcilerTestRule::new();
    rule.set_content(page);
    rule.step(&UnitBudgetDeadline).unwrap();
    rule.step(&UnitBudgetDeadline).unwrap();
    assert_eq!(rule.dump(), "<root>\n");

    rule.set_content(|| menu(&["only"]));
    rule.pump_until_idle().unwrap();
    assert_eq!(
        rule.dump(),
        "<root>\n  <ul class=\"menu\">\n    <li>\n      \"only\"\n"
    );
}

thread_local! {
    static FIRST_SETTER: RefCell<Option<StateSetter<i32>>> = const { RefCell::new(None) };
}

fn first(_: &Properties) -> anyhow::Result<Element> {
    let (value, set_value) = use_state(0);
    FIRST_SETTER.with(|slot| *slot.borrow_mut() = Some(set_value));
    Ok(Element::host("first").prop("value", value))
}

fn second(_: &Properties) -> anyhow::Result<Element> {
    let (value, _) = use_state(100);
    Ok(Element::host("second").prop("value", value))
}

#[test]
fn replacing_a_component_drops_its_state() {
    let show_first = Rc::new(Cell::new(true));
    let mut rule = ReconcilerTestRule::new();
    rule.set_content({
        let show_first = Rc::clone(&show_first);
        move || {
            let component = if show_first.get() {
                Component::new(first)
            } else {
                Component::new(second)
            };
            Element::host("div").child(Element::component(component))
        }
    });
    rule.pump_until_idle().unwrap();

    let stale = FIRST_SETTER.with(|slot| slot.borrow().clone()).unwrap();
    stale.set(5);
    rule.pump_until_idle().unwrap();
    assert_eq!(rule.dump(), "<root>\n  <div>\n    <first value=5>\n");

    show_first.set(false);
    rule.rerender();
    rule.pump_until_idle().unwrap();
    assert_eq!(rule.dump(), "<root>\n  <div>\n    <second value=100>\n");
    assert!(!stale.is_mounted());

    show_first.set(true);
    rule.rerender();
    rule.pump_until_idle().unwrap();
    assert_eq!(rule.dump(), "<root>\n  <div>\n    <first value=0>\n");

    stale.set(9);
    assert!(!rule.reconciler().has_pending_work());
}

type RenderPtr = fn(&Properties) -> anyhow::Result<Element>;

fn alpha(_: &Properties) -> anyhow::Result<Element> {
    let (label, _) = use_state(String::from("alpha-state"));
    Ok(Element::host("b").prop("v", label))
}

fn beta(_: &Properties) -> anyhow::Result<Element> {
    let (label, _) = use_state(String::from("beta-state"));
    Ok(Element::host("b").prop("v", label))
}

#[test]
fn function_pointer_components_do_not_share_state() {
    let use_alpha = Rc::new(Cell::new(true));
    let mut rule = ReconcilerTestRule::new();
    rule.set_content({
        let use_alpha = Rc::clone(&use_alpha);
        move || {
            let render: RenderPtr = if use_alpha.get() { alpha } else { beta };
            Element::component(Component::new(render))
        }
    });
    rule.pump_until_idle().unwrap();
    assert_eq!(rule.dump(), "<root>\n  <b v=\"alpha-state\">\n");

    use_alpha.set(false);
    rule.rerender();
    let commits = rule.pump_until_idle().unwrap();

    assert_eq!(rule.dump(), "<root>\n  <b v=\"beta-state\">\n");
    assert_eq!(commits[0].updates, 0);
    assert_eq!(commits[0].deletions, 1);
    assert_eq!(commits[0].placements, 2);
}
