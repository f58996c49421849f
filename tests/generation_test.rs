use std::{f32::consts::PI, sync::Arc};

use matcap_flow::{
    config::TorusConfig,
    data_structures::{
        geometry::Geometry,
        material::MatcapMaterial,
        scene_graph::{NodeKind, SceneRegistry},
    },
    generate::{InstanceGenerator, RandomSource, RngSource, SequenceSource},
};

use crate::common::test_utils::assert_close;

mod common;

fn populate(count: usize, spread: f32, seed: u64) -> SceneRegistry {
    let mut registry = SceneRegistry::new();
    let geometry = Arc::new(Geometry::torus(&TorusConfig::default()));
    let material = Arc::new(MatcapMaterial::new("matcap"));
    let added = InstanceGenerator::new(count, spread).populate(
        &mut registry,
        &geometry,
        &material,
        &mut RngSource::seeded(seed),
    );
    assert_eq!(added, count);
    registry
}

#[test]
fn generated_transforms_stay_in_bounds() {
    let spread = 10.0;
    for count in [0, 1, 7, 400] {
        let registry = populate(count, spread, count as u64 + 1);
        assert_eq!(registry.count(NodeKind::Bulk), count);
        assert_eq!(registry.count(NodeKind::Text), 0);

        registry.for_each(NodeKind::Bulk, |node| {
            let t = &node.transform;
            for axis in [t.position.x, t.position.y, t.position.z] {
                assert!(axis >= -spread / 2.0 && axis <= spread / 2.0, "{axis}");
            }
            assert!(t.rotation.x.0 >= 0.0 && t.rotation.x.0 <= PI);
            assert!(t.rotation.y.0 >= 0.0 && t.rotation.y.0 <= PI);
            assert_eq!(t.rotation.z.0, 0.0);
            assert!(t.is_uniformly_scaled());
            assert!(t.scale.x >= 0.0 && t.scale.x < 1.0);
        });
    }
}

#[test]
fn zero_instances_leave_the_registry_empty() {
    let registry = populate(0, 10.0, 3);
    assert!(registry.is_empty());
}

#[test]
fn every_instance_shares_geometry_and_material() {
    let registry = populate(50, 10.0, 11);
    let first = registry.iter().next().expect("instances were generated");
    registry.for_each(NodeKind::Bulk, |node| {
        assert!(Arc::ptr_eq(&node.geometry, &first.geometry));
        assert!(Arc::ptr_eq(&node.material, &first.material));
    });
    // the generator's caller dropped its handle, the nodes hold the rest
    assert_eq!(Arc::strong_count(&first.geometry), 50);
}

#[test]
fn draws_are_consumed_in_order() {
    let mut rng = SequenceSource::new(vec![0.1, 0.9, 0.5, 0.5, 0.5, 0.3]);
    let instance = InstanceGenerator::new(1, 10.0).sample(&mut rng);

    assert_eq!(rng.drawn(), 6);
    assert_close(instance.position.x, -4.0);
    assert_close(instance.position.y, 4.0);
    assert_close(instance.position.z, 0.0);
    assert_close(instance.rotation.x.0, PI / 2.0);
    assert_close(instance.rotation.y.0, PI / 2.0);
    assert_close(instance.rotation.z.0, 0.0);
    assert_close(instance.scale.x, 0.3);
    assert_close(instance.scale.y, 0.3);
    assert_close(instance.scale.z, 0.3);
}

#[test]
fn same_seed_same_layout() {
    let a = populate(20, 10.0, 42);
    let b = populate(20, 10.0, 42);
    let c = populate(20, 10.0, 43);
    let transforms = |r: &SceneRegistry| r.iter().map(|n| n.transform).collect::<Vec<_>>();
    assert_eq!(transforms(&a), transforms(&b));
    assert_ne!(transforms(&a), transforms(&c));
}

#[test]
fn sequence_source_cycles_and_defaults_to_zero() {
    let mut rng = SequenceSource::new(vec![0.25, 0.75]);
    let drawn: Vec<f32> = (0..5).map(|_| rng.next_unit()).collect();
    assert_eq!(drawn, vec![0.25, 0.75, 0.25, 0.75, 0.25]);

    let mut empty = SequenceSource::default();
    assert_eq!(empty.next_unit(), 0.0);
    assert_eq!(empty.drawn(), 1);
}

#[test]
fn rng_source_samples_the_unit_interval() {
    let mut rng = RngSource::seeded(5);
    for _ in 0..1000 {
        let sample = rng.next_unit();
        assert!((0.0..1.0).contains(&sample));
    }
}
