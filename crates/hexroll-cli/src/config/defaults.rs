use hexroll::core::presets::DEFAULT_COMPOUND;
use hexroll::engine::config::{ColoringStrategy, DEFAULT_VACUUM};

/// Values used for every batch-plan setting that neither the plan file nor the command
/// line provides.
pub struct DefaultsConfig {
    pub compound: String,
    pub reset: bool,
    pub fail_fast: bool,
    pub vacuum: f64,
    pub coloring: ColoringStrategy,
    pub allow_odd_count: bool,
    pub center: bool,
    pub length: usize,
    pub repeats: [usize; 2],
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            compound: DEFAULT_COMPOUND.to_string(),
            reset: true,
            fail_fast: false,
            vacuum: DEFAULT_VACUUM,
            coloring: ColoringStrategy::default(),
            allow_odd_count: false,
            center: true,
            length: 1,
            repeats: [1, 1],
        }
    }
}
