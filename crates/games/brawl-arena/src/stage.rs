use serde::{Deserialize, Serialize};

/// Stage used when the selected map is unknown.
pub const DEFAULT_STAGE: &str = "dojo";

/// A side-view stage: flat ground at y = 0, horizontal bounds `[0, width]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    pub width: f32,
    /// Visible height above the ground. Bounds the cooperative reticle.
    #[serde(default = "default_height")]
    pub height: f32,
    /// Background texture key handed to the presentation host.
    pub background: String,
    /// Spawn x for fighter 0 and fighter 1.
    pub spawn_x: [f32; 2],
}

/// Load a stage from a JSON file, returning `None` if the file is missing or invalid.
pub fn load_stage_from_file(path: &str) -> Option<Stage> {
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<Stage>(&content) {
            Ok(stage) => Some(stage),
            Err(e) => {
                tracing::warn!("Failed to parse {path}: {e}");
                None
            },
        },
        Err(_) => None,
    }
}

/// Load a stage by map name, preferring a JSON file from the stages directory.
///
/// Checks env var `BRAWL_STAGES_DIR` (default `config/stages`) for `{name}.json`, then
/// the built-in stages, then falls back to the default stage. Names that are not a
/// single path component never reach the filesystem.
pub fn load_stage(name: &str) -> Stage {
    let from_file = if is_plain_map_name(name) {
        let dir =
            std::env::var("BRAWL_STAGES_DIR").unwrap_or_else(|_| "config/stages".to_string());
        load_stage_from_file(&format!("{dir}/{name}.json"))
    } else {
        tracing::debug!(map = name, "Rejected stage name with path components");
        None
    };
    from_file
        .or_else(|| builtin_stage(name))
        .unwrap_or_else(|| {
            tracing::debug!(map = name, "Unknown stage, using default");
            default_stage()
        })
}

fn is_plain_map_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && !name.contains("..")
}

/// Built-in stage definitions.
pub fn builtin_stage(name: &str) -> Option<Stage> {
    let width = match name {
        "dojo" => 1280.0,
        "rooftop" => 1024.0,
        "harbor" => 1600.0,
        _ => return None,
    };
    Some(Stage {
        name: name.to_string(),
        width,
        height: default_height(),
        background: format!("bg_{name}"),
        spawn_x: [width * 0.25, width * 0.75],
    })
}

fn default_height() -> f32 {
    720.0
}

fn default_stage() -> Stage {
    let mut stage = Stage {
        name: String::new(),
        width: 1280.0,
        height: default_height(),
        background: String::new(),
        spawn_x: [320.0, 960.0],
    };
    if let Some(builtin) = builtin_stage(DEFAULT_STAGE) {
        stage = builtin;
    }
    stage
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_stages_spawn_inside_bounds() {
        for name in ["dojo", "rooftop", "harbor"] {
            let stage = builtin_stage(name).unwrap();
            for x in stage.spawn_x {
                assert!(x > 0.0 && x < stage.width, "{name}: spawn {x} out of bounds");
            }
            assert!(stage.spawn_x[0] < stage.spawn_x[1]);
        }
    }

    #[test]
    fn unknown_map_falls_back_to_default() {
        let stage = load_stage("does-not-exist");
        assert_eq!(stage.name, DEFAULT_STAGE);
        assert_eq!(stage.width, 1280.0);
    }

    #[test]
    fn map_names_with_path_components_skip_the_file_lookup() {
        assert!(is_plain_map_name("pier"));
        assert!(!is_plain_map_name("../pier"));
        assert!(!is_plain_map_name("stages/pier"));
        assert!(!is_plain_map_name("..\\pier"));
        assert!(!is_plain_map_name(""));

        let stage = load_stage("../../../../config/stages/pier");
        assert_eq!(stage.name, DEFAULT_STAGE);
    }

    #[test]
    fn stage_json_without_height_uses_default() {
        let stage: Stage = serde_json::from_str(
            r#"{"name":"pier","width":900.0,"background":"bg_pier","spawn_x":[200.0,700.0]}"#,
        )
        .unwrap();
        assert_eq!(stage.height, 720.0);
        assert_eq!(stage.width, 900.0);
    }
}
