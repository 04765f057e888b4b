use super::*;

fn props(entries: &[(&str, PropValue)]) -> Properties {
    let mut props = Properties::new();
    for (name, value) in entries {
        props.insert(*name, value.clone());
    }
    props
}

#[test]
fn identical_properties_produce_no_patches() {
    let handler = EventHandler::new(|_| {});
    let a = props(&[
        ("id", "main".into()),
        ("width", PropValue::Int(10)),
        ("onClick", handler.clone().into()),
    ]);
    let b = a.clone();
    assert!(diff_properties(&a, &b).is_empty());
}

#[test]
fn patches_follow_the_fixed_sub_order() {
    let old_handler = EventHandler::new(|_| {});
    let new_handler = EventHandler::new(|_| {});
    let prev = props(&[
        ("title", "old".into()),
        ("hidden", true.into()),
        ("onClick", old_handler.clone().into()),
    ]);
    let next = props(&[
        ("title", "new".into()),
        ("onClick", new_handler.clone().into()),
    ]);

    let patches = diff_properties(&prev, &next);
    assert_eq!(
        patches,
        vec![
            PropertyPatch::RemoveListener {
                event: "click".into(),
                handler: old_handler,
            },
            PropertyPatch::RemoveProperty {
                name: "hidden".into()
            },
            PropertyPatch::SetProperty {
                name: "title".into(),
                value: "new".into(),
            },
            PropertyPatch::AddListener {
                event: "click".into(),
                handler: new_handler,
            },
        ]
    );
}

#[test]
fn children_key_is_never_a_host_property() {
    let next = props(&[("children", "ignored".into()), ("id", "x".into())]);
    let patches = diff_properties(&Properties::new(), &next);
    assert_eq!(
        patches,
        vec![PropertyPatch::SetProperty {
            name: "id".into(),
            value: "x".into(),
        }]
    );
}

#[test]
fn non_handler_value_under_event_key_is_a_plain_property() {
    let next = props(&[("onboarding", "done".into())]);
    let patches = diff_properties(&Properties::new(), &next);
    assert!(matches!(
        patches.as_slice(),
        [PropertyPatch::SetProperty { name, .. }] if name == "onboarding"
    ));
}

#[test]
fn event_names_are_lower_cased_without_prefix() {
    assert_eq!(event_name("onClick").as_deref(), Some("click"));
    assert_eq!(event_name("onMouseMove").as_deref(), Some("mousemove"));
    assert_eq!(event_name("on"), None);
    assert_eq!(event_name("title"), None);
}

#[test]
fn handler_equality_is_identity() {
    let a = EventHandler::new(|_| {});
    let b = EventHandler::new(|_| {});
    assert_eq!(a, a.clone());
    assert_ne!(a, b);
}
