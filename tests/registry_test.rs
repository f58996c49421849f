use std::{f32::consts::TAU, sync::Arc};

use cgmath::{Rad, SquareMatrix, Vector3, Vector4};
use matcap_flow::{
    config::TorusConfig,
    data_structures::{
        geometry::Geometry,
        instance::Instance,
        material::MatcapMaterial,
        scene_graph::{NodeKind, SceneNode, SceneRegistry},
    },
    debug::{DebugPanel, DebugValue},
    render::collect_batches,
};

use crate::common::test_utils::assert_close;

mod common;

fn node(kind: NodeKind, x: f32) -> SceneNode {
    SceneNode::new(
        kind,
        Arc::new(Geometry::torus(&TorusConfig::default())),
        Arc::new(MatcapMaterial::new("m")),
        Instance::from(Vector3::new(x, 0.0, 0.0)),
    )
}

#[test]
fn traversal_filters_by_kind() {
    let mut registry = SceneRegistry::new();
    registry.add(node(NodeKind::Bulk, 1.0));
    let text = registry.add_text(node(NodeKind::Bulk, 2.0));
    registry.add(node(NodeKind::Bulk, 3.0));

    assert_eq!(registry.len(), 3);
    assert_eq!(registry.count(NodeKind::Text), 1);
    assert_eq!(registry.count(NodeKind::Bulk), 2);
    assert_eq!(registry.text(text).unwrap().kind, NodeKind::Text);

    let mut bulk_x = Vec::new();
    registry.for_each(NodeKind::Bulk, |n| bulk_x.push(n.transform.position.x));
    bulk_x.sort_by(f32::total_cmp);
    assert_eq!(bulk_x, vec![1.0, 3.0]);

    registry.for_each_mut(NodeKind::Bulk, |n| n.transform.position.y = 5.0);
    assert_eq!(registry.text(text).unwrap().transform.position.y, 0.0);
    registry.for_each(NodeKind::Bulk, |n| assert_eq!(n.transform.position.y, 5.0));
}

#[test]
fn text_handle_addresses_the_text_node() {
    let mut registry = SceneRegistry::new();
    for i in 0..4 {
        registry.add(node(NodeKind::Bulk, i as f32));
    }
    let text = registry.add_text(node(NodeKind::Text, 9.0));
    registry.text_mut(text).unwrap().transform.rotation.y = Rad(1.0);

    let mut texts = 0;
    registry.for_each(NodeKind::Text, |n| {
        assert_eq!(n.transform.rotation.y, Rad(1.0));
        texts += 1;
    });
    assert_eq!(texts, 1);
}

#[test]
fn instance_matrix_scales_then_rotates_then_translates() {
    let mut instance = Instance::from(Vector3::new(1.0, 2.0, 3.0));
    instance.set_uniform_scale(2.0);
    instance.rotation.y = Rad(std::f32::consts::FRAC_PI_2);

    let p = instance.to_matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
    // x scaled to 2, turned onto -z, then moved
    assert_close(p.x, 1.0);
    assert_close(p.y, 2.0);
    assert_close(p.z, 1.0);

    let raw = instance.to_raw();
    let model: [[f32; 4]; 4] = instance.to_matrix().into();
    assert_eq!(raw.model, model);
    assert!(instance.to_matrix().invert().is_some());
}

#[test]
fn rotation_wraps_into_one_turn() {
    let mut instance = Instance::new();
    instance.rotation.x = Rad(TAU + 0.5);
    instance.rotation.y = Rad(-0.25);
    instance.wrap_rotation();
    assert_close(instance.rotation.x.0, 0.5);
    assert_close(instance.rotation.y.0, TAU - 0.25);
}

#[test]
fn debug_panel_counts_effective_writes() {
    let mut panel = DebugPanel::new("tori");
    let start = panel.revision();

    panel.set("count", 3usize);
    panel.set("count", 3usize);
    assert_eq!(panel.revision(), start + 1);

    panel.set("count", 4usize);
    panel.set("paused", false);
    assert_eq!(panel.revision(), start + 3);
    assert_eq!(panel.get("count"), Some(&DebugValue::Number(4.0)));
    assert_eq!(panel.title(), Some("tori"));

    let labels: Vec<&str> = panel.fields().map(|(label, _)| label).collect();
    assert_eq!(labels, vec!["count", "paused", "title"]);
    assert_eq!(panel.summary(), "tori | count: 4 | paused: false");
}

#[test]
fn batches_group_shared_meshes_and_skip_empty_ones() {
    let torus = Arc::new(Geometry::torus(&TorusConfig::default()));
    let material = Arc::new(MatcapMaterial::new("m"));
    let mut registry = SceneRegistry::new();
    // blank text has nothing to upload
    registry.add_text(SceneNode::new(
        NodeKind::Text,
        Arc::new(Geometry::new("text", Vec::new(), Vec::new())),
        Arc::clone(&material),
        Instance::new(),
    ));
    for x in [1.0, 2.0, 3.0] {
        registry.add(SceneNode::new(
            NodeKind::Bulk,
            Arc::clone(&torus),
            Arc::clone(&material),
            Instance::from(Vector3::new(x, 0.0, 0.0)),
        ));
    }

    let batches = collect_batches(&registry);

    assert_eq!(batches.len(), 1);
    assert!(Arc::ptr_eq(batches[0].geometry, &torus));
    assert_eq!(batches[0].instances.len(), 3);
}
