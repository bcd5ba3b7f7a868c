//! Exercises the one `Runtime::initialize` path that touches the process-global
//! `config` singleton. Kept in its own test binary (cargo gives every file under
//! `tests/` its own process) so a rejected, already-parsed bad config can't leak into
//! the rest of the suite's test threads.

use catalog::Faction;
use render::software::SoftwareBackend;
use runtime::{Runtime, RuntimeConfig};
use testing::write_test_catalog;

#[test]
fn invalid_zoom_bounds_are_rejected_before_anything_is_built() {
    let catalog_file = write_test_catalog();
    let config_file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(config_file.path(), "(display: (zoom_min: 2.0, zoom_max: 1.0))").unwrap();

    let opts = RuntimeConfig {
        config_path: Some(config_file.path().to_owned()),
        catalog_path: catalog_file.path().to_owned(),
        grid_width: 32,
        grid_height: 32,
        cell_size: 1.0,
        viewport_width: 800,
        viewport_height: 600,
        player_faction: Faction::Gdi,
    };

    let result = Runtime::initialize(opts, Box::new(SoftwareBackend::new(800, 600)));
    assert!(result.is_err(), "zoom_min >= zoom_max must be rejected");
}
