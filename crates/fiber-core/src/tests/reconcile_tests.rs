use super::*;
use crate::element::HostTag;
use crate::props::{PropValue, Properties};

struct Harness {
    tree: FiberTree,
    deletions: Vec<FiberId>,
}

impl Harness {
    fn new() -> Self {
        Self {
            tree: FiberTree::new(),
            deletions: Vec::new(),
        }
    }

    /// Builds and "commits" a parent whose children come from `elements`.
    fn committed_parent(&mut self, elements: &[Element]) -> FiberId {
        let parent = self.tree.insert(Fiber::new(FiberKind::Root, Properties::new()));
        self.tree
            .reconcile_children(parent, elements, &mut self.deletions)
            .unwrap();
        for child in self.tree.children(parent).collect::<Vec<_>>() {
            self.tree.fiber_mut(child).unwrap().effect = None;
        }
        parent
    }

    fn rerender(&mut self, previous: FiberId, elements: &[Element]) -> FiberId {
        let mut fiber = Fiber::new(FiberKind::Root, Properties::new());
        fiber.alternate = Some(previous);
        let parent = self.tree.insert(fiber);
        self.deletions.clear();
        self.tree
            .reconcile_children(parent, elements, &mut self.deletions)
            .unwrap();
        parent
    }

    fn effects(&self, parent: FiberId) -> Vec<Option<EffectTag>> {
        self.tree
            .children(parent)
            .map(|id| self.tree.get(id).unwrap().effect())
            .collect()
    }

    fn tags(&self, parent: FiberId) -> Vec<String> {
        self.tree
            .children(parent)
            .map(|id| match self.tree.get(id).unwrap().kind() {
                FiberKind::Host(HostTag::Element(name)) => name.clone(),
                FiberKind::Host(HostTag::Text) => "#text".into(),
                other => format!("{other:?}"),
            })
            .collect()
    }
}

fn hosts(tags: &[&str]) -> Vec<Element> {
    tags.iter().map(|tag| Element::host(*tag)).collect()
}

#[test]
fn first_render_places_every_child_in_order() {
    let mut h = Harness::new();
    let parent = h.tree.insert(Fiber::new(FiberKind::Root, Properties::new()));
    h.tree
        .reconcile_children(parent, &hosts(&["a", "b", "c"]), &mut h.deletions)
        .unwrap();

    assert_eq!(h.tags(parent), vec!["a", "b", "c"]);
    assert_eq!(h.effects(parent), vec![Some(EffectTag::Placement); 3]);
    assert!(h.deletions.is_empty());
    for child in h.tree.children(parent) {
        let fiber = h.tree.get(child).unwrap();
        assert_eq!(fiber.parent(), Some(parent));
        assert!(fiber.alternate().is_none());
        assert!(fiber.node().is_none());
    }
}

#[test]
fn same_tag_reuses_node_and_links_alternate() {
    let mut h = Harness::new();
    let old_parent = h.committed_parent(&hosts(&["div"]));
    let old_child = h.tree.get(old_parent).unwrap().child().unwrap();
    h.tree.fiber_mut(old_child).unwrap().node = Some(42);

    let new_parent = h.rerender(old_parent, &[Element::host("div").prop("id", "x")]);
    let new_child = h.tree.get(new_parent).unwrap().child().unwrap();
    let fiber = h.tree.get(new_child).unwrap();

    assert_eq!(fiber.effect(), Some(EffectTag::Update));
    assert_eq!(fiber.alternate(), Some(old_child));
    assert_eq!(fiber.node(), Some(42));
    assert_eq!(fiber.props().get("id"), Some(&PropValue::from("x")));
}

#[test]
fn type_change_at_a_position_is_delete_plus_place() {
    let mut h = Harness::new();
    let old_parent = h.committed_parent(&hosts(&["a"]));
    let old_child = h.tree.get(old_parent).unwrap().child().unwrap();

    let new_parent = h.rerender(old_parent, &hosts(&["b"]));

    assert_eq!(h.effects(new_parent), vec![Some(EffectTag::Placement)]);
    assert_eq!(h.deletions, vec![old_child]);
    assert_eq!(
        h.tree.get(old_child).unwrap().effect(),
        Some(EffectTag::Deletion)
    );
}

#[test]
fn shrinking_deletes_only_the_trailing_position() {
    let mut h = Harness::new();
    let old_parent = h.committed_parent(&hosts(&["a", "b", "c"]));
    let old_children: Vec<_> = h.tree.children(old_parent).collect();

    let new_parent = h.rerender(old_parent, &hosts(&["a", "b"]));

    assert_eq!(h.effects(new_parent), vec![Some(EffectTag::Update); 2]);
    assert_eq!(h.deletions, vec![old_children[2]]);
}

#[test]
fn growing_places_only_the_new_position() {
    let mut h = Harness::new();
    let old_parent = h.committed_parent(&hosts(&["a", "b", "c"]));

    let new_parent = h.rerender(old_parent, &hosts(&["a", "b", "c", "d"]));

    assert_eq!(
        h.effects(new_parent),
        vec![
            Some(EffectTag::Update),
            Some(EffectTag::Update),
            Some(EffectTag::Update),
            Some(EffectTag::Placement),
        ]
    );
    assert!(h.deletions.is_empty());
}

#[test]
fn reorder_is_seen_as_type_changes() {
    let mut h = Harness::new();
    let old_parent = h.committed_parent(&hosts(&["a", "b"]));

    let new_parent = h.rerender(old_parent, &hosts(&["b", "a"]));

    assert_eq!(h.effects(new_parent), vec![Some(EffectTag::Placement); 2]);
    assert_eq!(h.deletions.len(), 2);
}

#[test]
fn empty_element_list_deletes_every_old_child() {
    let mut h = Harness::new();
    let old_parent = h.committed_parent(&hosts(&["a", "b"]));

    let new_parent = h.rerender(old_parent, &[]);

    assert!(h.tree.get(new_parent).unwrap().child().is_none());
    assert_eq!(h.deletions.len(), 2);
}
