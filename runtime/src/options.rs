use std::path::PathBuf;

/// Startup parameters the host passes to `Runtime::initialize`. Covers what the
/// recognized `config::Config` doesn't: where the config/catalog files live and the
/// dimensions of the map being loaded for this session.
pub struct RuntimeConfig {
    /// `None` skips `config::init` entirely and runs on built-in defaults.
    pub config_path: Option<PathBuf>,
    pub catalog_path: PathBuf,
    pub grid_width: i32,
    pub grid_height: i32,
    pub cell_size: f32,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub player_faction: catalog::Faction,
}
