use std::path::PathBuf;

use matcap_flow::SceneConfig;

/// `awesome-text [scene.toml]`
fn main() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => SceneConfig::load(&PathBuf::from(path))?,
        None => SceneConfig::default(),
    };
    matcap_flow::run(config)
}
