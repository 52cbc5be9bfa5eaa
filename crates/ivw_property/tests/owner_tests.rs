//! Invalidation aggregation across owners and composites

use ivw_property::prelude::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Records every request it receives
#[derive(Default)]
struct RecordingTarget {
    requests: RefCell<Vec<(InvalidationLevel, Option<String>)>>,
}

impl InvalidationTarget for RecordingTarget {
    fn invalidate(&self, level: InvalidationLevel, source: Option<&str>) {
        self.requests
            .borrow_mut()
            .push((level, source.map(str::to_string)));
    }
}

fn owner_with_two() -> (PropertyOwner, Property<i32>, Property<String>) {
    let owner = PropertyOwner::new("volume_raycaster");
    let steps = Property::new("steps", "Steps", 128);
    let shader = Property::new("shader", "Shader", String::from("default.frag"))
        .with_invalidation_level(InvalidationLevel::InvalidResources);
    owner.add_property(&steps).expect("Should add steps");
    owner.add_property(&shader).expect("Should add shader");
    (owner, steps, shader)
}

#[test]
fn test_level_is_max_regardless_of_order() {
    let (owner, steps, shader) = owner_with_two();
    steps.set(256).expect("Should set steps");
    shader.set("fast.frag".into()).expect("Should set shader");
    assert_eq!(owner.invalidation_level(), InvalidationLevel::InvalidResources);

    owner.set_valid();
    assert!(owner.is_valid());

    shader.set("slow.frag".into()).expect("Should set shader");
    steps.set(64).expect("Should set steps");
    assert_eq!(owner.invalidation_level(), InvalidationLevel::InvalidResources);
}

#[test]
fn test_requests_forward_to_parent() {
    let (owner, steps, shader) = owner_with_two();
    let target = Rc::new(RecordingTarget::default());
    let link: Rc<dyn InvalidationTarget> = target.clone();
    owner.set_parent(Some(Rc::downgrade(&link)));

    steps.set(1).expect("Should set steps");
    shader.set("x.frag".into()).expect("Should set shader");

    let requests = target.requests.borrow();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[0],
        (InvalidationLevel::InvalidOutput, Some("steps".to_string()))
    );
    assert_eq!(
        requests[1],
        (InvalidationLevel::InvalidResources, Some("shader".to_string()))
    );
}

#[test]
fn test_dropped_parent_is_ignored() {
    let (owner, steps, _) = owner_with_two();
    {
        let link: Rc<dyn InvalidationTarget> = Rc::new(RecordingTarget::default());
        owner.set_parent(Some(Rc::downgrade(&link)));
    }
    steps.set(7).expect("Should set without a live parent");
    assert!(!owner.is_valid());
}

#[test]
fn test_composite_chain_reaches_processor_level_target() {
    let owner = PropertyOwner::new("proc");
    let target = Rc::new(RecordingTarget::default());
    let link: Rc<dyn InvalidationTarget> = target.clone();
    owner.set_parent(Some(Rc::downgrade(&link)));

    let outer = CompositeProperty::new("lighting", "Lighting");
    let inner = CompositeProperty::new("ambient", "Ambient");
    let intensity = Property::new("intensity", "Intensity", 0.2f32).with_range(0.0, 1.0);
    inner.add_property(&intensity).expect("Should add intensity");
    outer.add_property(&inner).expect("Should add inner");
    owner.add_property(&outer).expect("Should add outer");

    intensity.set(0.8).expect("Should set intensity");
    assert_eq!(target.requests.borrow().len(), 1);
    assert!(!inner.owner().is_valid());
    assert!(!outer.owner().is_valid());
    assert!(!owner.is_valid());

    let found = owner
        .property_by_path("lighting.ambient.intensity")
        .expect("Should resolve nested path");
    assert_eq!(found.display_name(), "Intensity");
}

#[test]
fn test_observer_sets_sibling_inside_owner() {
    let (owner, steps, shader) = owner_with_two();
    let calls = Rc::new(Cell::new(0));
    let (s, c) = (shader.clone(), Rc::clone(&calls));
    steps.on_change(move |v| {
        c.set(c.get() + 1);
        s.set(format!("steps{}.frag", v)).expect("Should set shader");
    });

    steps.set(32).expect("Should set steps");
    assert_eq!(calls.get(), 1);
    assert_eq!(shader.get(), "steps32.frag");
    assert_eq!(owner.invalidation_level(), InvalidationLevel::InvalidResources);
}

#[test]
fn test_blocked_changes_still_invalidate() {
    let (owner, steps, _) = owner_with_two();
    let calls = Rc::new(Cell::new(0));
    let c = Rc::clone(&calls);
    steps.on_change(move |_| c.set(c.get() + 1));

    let blocker = steps.block_on_change();
    steps.set(1).expect("Should set steps");
    steps.set(2).expect("Should set steps");
    assert!(!owner.is_valid());
    assert_eq!(calls.get(), 0);
    blocker.release().expect("Should release blocker");
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_owner_serialization_round_trip() {
    let (owner, steps, shader) = owner_with_two();
    steps.set(512).expect("Should set steps");
    shader.set("hq.frag".into()).expect("Should set shader");
    let text = serde_json::to_string(&owner.serialize().expect("Should serialize"))
        .expect("Should print json");

    let (copy, copy_steps, copy_shader) = owner_with_two();
    let doc: serde_json::Value = serde_json::from_str(&text).expect("Should parse json");
    copy.deserialize(&doc).expect("Should deserialize");
    assert_eq!(copy_steps.get(), 512);
    assert_eq!(copy_shader.get(), "hq.frag");
}

#[test]
fn test_unknown_keys_are_skipped() {
    let (owner, steps, _) = owner_with_two();
    let doc = serde_json::json!({
        "steps": { "value": 9 },
        "removed_in_v2": { "value": true },
    });
    owner.deserialize(&doc).expect("Should skip unknown keys");
    assert_eq!(steps.get(), 9);
}
