//! INI serialization: `ConfigFile` → commented INI string.

use super::file::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[service]
; Label lookup service (POST /labels/batch, GET /labels?url=)
label_url = {}
; Image metadata service (GET /images/<image_set>/info)
metadata_url = {}
; Tile server; tile urls are <tile_url>/tiles/<image_set>/<level>/<x>/<y>.png
tile_url = {}
; Timeout for every request, in seconds
timeout_secs = {}

[batching]
; Quiet period after the last drawn tile before labels are looked up
debounce_ms = {}
; Number of pending tiles that triggers an immediate lookup
threshold = {}
"#,
        config.service.label_url,
        config.service.metadata_url,
        config.service.tile_url,
        config.service.timeout_secs,
        config.batching.debounce_ms,
        config.batching.threshold,
    )
}
