use std::{f32::consts::PI, sync::Arc};

use matcap_flow::{
    data_structures::{scene_graph::NodeKind, texture::MatcapImage},
    debug::DebugValue,
    error::SceneError,
    resources::{LoadedAssets, font::Typeface},
    schedule::{SchedulerState, TickOutcome},
    session::SceneSession,
};

use crate::common::test_utils::{
    CountingRequester, RING, RecordingRenderer, assert_close, fixture_typeface,
    fixture_typeface_json, loaded_session, sequence_session, small_config,
};

mod common;

fn matcap() -> MatcapImage {
    MatcapImage {
        label: "test matcap".to_string(),
        width: 1,
        height: 1,
        rgba: vec![10, 20, 30, 255],
    }
}

#[test]
fn tick_before_load_does_nothing() {
    let mut session = SceneSession::new(small_config(10)).unwrap();
    let mut renderer = RecordingRenderer::new();
    let mut requester = CountingRequester::new();

    for elapsed in [0.0, 1.0, 2.5] {
        let outcome = session
            .tick_at(elapsed, &mut renderer, &mut requester)
            .unwrap();
        assert_eq!(outcome, TickOutcome::Skipped);
    }

    assert!(!session.is_loaded());
    assert_eq!(session.scheduler_state(), SchedulerState::Waiting);
    assert!(session.registry().is_empty());
    assert!(renderer.frames.is_empty());
    assert_eq!(requester.requests(), 0);
}

#[test]
fn animation_before_load_reports_not_loaded() {
    let mut session = SceneSession::new(small_config(10)).unwrap();
    assert!(matches!(session.animate_text(1.0), Err(SceneError::NotLoaded)));
    assert!(matches!(session.jitter_bulk(), Err(SceneError::NotLoaded)));
    assert!(session.text_node().is_none());
}

#[test]
fn font_completion_populates_and_requests_one_frame() {
    let mut session = SceneSession::new(small_config(25)).unwrap();
    let mut requester = CountingRequester::new();

    session
        .on_font_loaded(&fixture_typeface(), &mut requester)
        .unwrap();

    assert!(session.is_loaded());
    assert_eq!(session.scheduler_state(), SchedulerState::Running);
    assert_eq!(requester.requests(), 1);
    assert_eq!(session.registry().count(NodeKind::Text), 1);
    assert_eq!(session.registry().count(NodeKind::Bulk), 25);
    assert_eq!(session.registry().len(), 26);
}

#[test]
fn second_font_completion_is_rejected() {
    let (mut session, mut requester) = loaded_session(5);
    let before = session.registry().len();

    let again = session.on_font_loaded(&fixture_typeface(), &mut requester);

    assert!(matches!(again, Err(SceneError::AlreadyLoaded)));
    assert_eq!(session.registry().len(), before);
    assert_eq!(requester.requests(), 1);
}

#[test]
fn text_and_tori_share_the_session_material() {
    let (session, _) = loaded_session(8);
    let material = session.material();
    for node in session.registry().iter() {
        assert!(Arc::ptr_eq(&node.material, material));
    }
    let text = session.text_node().unwrap();
    session.registry().for_each(NodeKind::Bulk, |node| {
        assert!(!Arc::ptr_eq(&node.geometry, &text.geometry));
    });
}

#[test]
fn text_mesh_is_centered() {
    let (session, _) = loaded_session(0);
    let bounds = session.text_node().unwrap().geometry.bounding_box().unwrap();
    let center = bounds.center();
    assert_close(center.x, 0.0);
    assert_close(center.y, 0.0);
    assert_close(center.z, 0.0);
}

#[test]
fn text_animation_is_idempotent() {
    let (mut session, _) = loaded_session(3);

    session.animate_text(2.0).unwrap();
    let once = session.text_node().unwrap().transform;
    session.animate_text(2.0).unwrap();
    let twice = session.text_node().unwrap().transform;

    assert_eq!(once, twice);
    let animation = &session.config().animation;
    assert_close(once.rotation.y.0, animation.text_yaw_rate * 2.0);
    assert_close(once.rotation.x.0, animation.text_pitch_rate * 2.0);
}

#[test]
fn bulk_jitter_accumulates() {
    let values = [0.1, 0.9, 0.5, 0.5, 0.5, 0.3, 0.5, 0.5];
    let mut config = small_config(1);
    config.scatter.spread = 10.0;
    let mut session = sequence_session(config, &values);
    let mut requester = CountingRequester::new();
    session
        .on_font_loaded(&fixture_typeface(), &mut requester)
        .unwrap();

    let rotation = |session: &SceneSession<_>| {
        let mut rotation = None;
        session
            .registry()
            .for_each(NodeKind::Bulk, |node| rotation = Some(node.transform.rotation));
        rotation.unwrap()
    };

    let start = rotation(&session);
    assert_eq!(session.jitter_bulk().unwrap(), 1);
    let first = rotation(&session);
    assert_eq!(session.jitter_bulk().unwrap(), 1);
    let second = rotation(&session);

    let jitter = session.config().animation.bulk_jitter;
    assert_close(first.y.0 - start.y.0, 0.5 * jitter);
    assert_close(first.x.0 - start.x.0, 0.5 * jitter);
    assert!(second.y.0 > first.y.0);
    assert_ne!(first, second);
}

#[test]
fn scripted_draws_place_the_single_torus() {
    let mut config = small_config(1);
    config.scatter.spread = 10.0;
    let mut session = sequence_session(config, &[0.1, 0.9, 0.5, 0.5, 0.5, 0.3]);
    let mut requester = CountingRequester::new();

    session
        .on_font_loaded(&fixture_typeface(), &mut requester)
        .unwrap();

    let mut seen = 0;
    session.registry().for_each(NodeKind::Bulk, |node| {
        let t = node.transform;
        assert_close(t.position.x, -4.0);
        assert_close(t.position.y, 4.0);
        assert_close(t.position.z, 0.0);
        assert_close(t.rotation.x.0, PI / 2.0);
        assert_close(t.rotation.y.0, PI / 2.0);
        assert_close(t.scale.x, 0.3);
        seen += 1;
    });
    assert_eq!(seen, 1);
}

#[test]
fn running_ticks_render_and_reschedule() {
    let (mut session, mut requester) = loaded_session(12);
    let mut renderer = RecordingRenderer::new();

    for (i, elapsed) in [0.016, 0.033, 0.05].into_iter().enumerate() {
        let outcome = session
            .tick_at(elapsed, &mut renderer, &mut requester)
            .unwrap();
        assert_eq!(
            outcome,
            TickOutcome::Rendered {
                frame: i as u64 + 1,
                elapsed
            }
        );
    }

    assert_eq!(renderer.frames.len(), 3);
    assert!(renderer.frames.iter().all(|f| f.nodes == 13 && f.bulk == 12));
    // start request plus one per tick
    assert_eq!(requester.requests(), 4);
    assert_eq!(session.scheduler().frames(), 3);
    assert_eq!(session.scheduler().requests(), 4);
}

#[test]
fn render_failure_still_requests_the_next_frame() {
    let (mut session, mut requester) = loaded_session(2);
    let mut renderer = RecordingRenderer::failing();

    let outcome = session.tick_at(0.5, &mut renderer, &mut requester);

    assert!(matches!(outcome, Err(SceneError::Render(_))));
    assert_eq!(requester.requests(), 2);
    assert_eq!(session.scheduler_state(), SchedulerState::Running);
}

#[test]
fn texture_may_arrive_before_or_after_the_font() {
    let mut early = SceneSession::new(small_config(3)).unwrap();
    assert!(early.on_texture_loaded(matcap()));
    early
        .on_font_loaded(&fixture_typeface(), &mut CountingRequester::new())
        .unwrap();
    assert!(early.material().has_matcap());

    let (mut late, _) = loaded_session(3);
    assert!(!late.material().has_matcap());
    assert!(late.on_texture_loaded(matcap()));
    assert!(late.material().has_matcap());
    // set once
    assert!(!late.on_texture_loaded(matcap()));
    assert_eq!(late.material().matcap().unwrap().rgba, vec![10, 20, 30, 255]);
}

#[test]
fn font_failure_keeps_the_scene_waiting() {
    let mut session = SceneSession::new(small_config(3)).unwrap();
    let mut requester = CountingRequester::new();
    let assets = LoadedAssets {
        texture: Ok(matcap()),
        font: Err(SceneError::AssetLoad {
            path: "fonts/missing.typeface.json".to_string(),
            reason: "not found".to_string(),
        }),
    };

    let result = session.apply_assets(assets, &mut requester);

    assert!(matches!(result, Err(SceneError::AssetLoad { .. })));
    assert!(!session.is_loaded());
    assert!(session.load_error().unwrap().contains("missing"));
    assert!(session.material().has_matcap());
    assert_eq!(requester.requests(), 0);
}

#[test]
fn broken_glyph_outline_counts_as_a_font_failure() {
    let json = fixture_typeface_json().replace(RING, "m 0 0 x 1 2");
    // outlines are only read when the text is built
    let font = Typeface::from_slice(json.as_bytes()).unwrap();
    let mut session = SceneSession::new(small_config(3)).unwrap();
    let mut requester = CountingRequester::new();
    let assets = LoadedAssets {
        texture: Ok(matcap()),
        font: Ok(font),
    };

    let result = session.apply_assets(assets, &mut requester);

    assert!(matches!(result, Err(SceneError::Geometry(_))));
    assert!(!session.is_loaded());
    assert!(session.load_error().unwrap().contains("outline command"));
    assert!(session.registry().is_empty());
    assert_eq!(requester.requests(), 0);
    assert!(session.debug().get("error").is_some());
}

#[test]
fn texture_failure_is_not_fatal() {
    let mut session = SceneSession::new(small_config(3)).unwrap();
    let mut requester = CountingRequester::new();
    let assets = LoadedAssets {
        texture: Err(SceneError::AssetLoad {
            path: "textures/matcaps/10.png".to_string(),
            reason: "not found".to_string(),
        }),
        font: Ok(fixture_typeface()),
    };

    session.apply_assets(assets, &mut requester).unwrap();

    assert!(session.is_loaded());
    assert!(!session.material().has_matcap());
    assert_eq!(requester.requests(), 1);
}

#[test]
fn resize_keeps_aspect_in_sync() {
    let (mut session, mut requester) = loaded_session(1);
    let mut renderer = RecordingRenderer::new();

    session.resize(800, 400, &mut renderer);
    session.resize(0, 300, &mut renderer);
    session.tick_at(0.1, &mut renderer, &mut requester).unwrap();

    assert_eq!(renderer.sizes, vec![(800, 400)]);
    assert_eq!(session.viewport().width, 800);
    assert_eq!(session.viewport().height, 400);
    assert_close(session.camera().aspect, 2.0);
    assert_close(renderer.frames[0].aspect, 2.0);
}

#[test]
fn pixel_ratio_is_capped() {
    let mut session = SceneSession::new(small_config(1)).unwrap();
    assert_eq!(session.set_pixel_ratio(3.0), 2.0);
    assert_eq!(session.set_pixel_ratio(1.5), 1.5);
    assert_eq!(session.viewport().pixel_ratio, 1.5);
}

#[test]
fn debug_panel_tracks_the_load() {
    let mut session = SceneSession::new(small_config(4)).unwrap();
    assert_eq!(session.debug().title(), Some("matcap-flow"));
    assert_eq!(session.debug().get("loaded"), Some(&DebugValue::Flag(false)));

    session
        .on_font_loaded(&fixture_typeface(), &mut CountingRequester::new())
        .unwrap();

    let debug = session.debug();
    assert_eq!(debug.get("loaded"), Some(&DebugValue::Flag(true)));
    assert_eq!(debug.get("instances"), Some(&DebugValue::Number(5.0)));
    assert!(debug.summary().starts_with("matcap-flow"));
    assert!(debug.summary().contains("loaded: true"));
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let mut config = small_config(1);
    config.scatter.spread = -1.0;
    assert!(matches!(
        SceneSession::new(config),
        Err(SceneError::Config(_))
    ));
}
