//! Browser-side checks, run with `wasm-pack test --headless --firefox`.
#![cfg(target_arch = "wasm32")]

use arix_signature_tree::config::SceneConfig;
use arix_signature_tree::morph::MorphMode;
use arix_signature_tree::scene::Scene;
use arix_signature_tree::ui::OverlayModel;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn scene_steps_in_browser() {
    let mut config = SceneConfig::default();
    config.particles.count = 64;
    let mut scene = Scene::new(&config, 7, 640.0, 480.0).unwrap();
    scene.controller_mut().assemble();
    assert!(scene.step(1.0 / 60.0, true));
    assert_eq!(scene.particle_scratch().count(), 64);
}

#[wasm_bindgen_test]
fn overlay_model_tracks_mode() {
    let model = OverlayModel::for_mode(MorphMode::TreeShape);
    assert_eq!(model.banner, Some("MERRY"));
}
