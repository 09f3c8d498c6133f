use bevy_ecs::prelude::Resource;

/// Simulation clock.
///
/// `elapsed` and `delta` are scaled seconds; `tick` is the scaled elapsed
/// time in whole milliseconds, the unit sprite playback advances in. The
/// tick is rounded from `elapsed_ms`, which is kept in `f64` so it stays
/// millisecond-accurate long after `elapsed` has lost that precision.
#[derive(Resource, Clone, Copy, Debug)]
pub struct WorldTime {
    pub elapsed: f32,
    pub delta: f32,
    pub time_scale: f32,
    pub elapsed_ms: f64,
    pub tick: u64,
}

impl Default for WorldTime {
    fn default() -> Self {
        WorldTime {
            elapsed: 0.0,
            delta: 0.0,
            time_scale: 1.0,
            elapsed_ms: 0.0,
            tick: 0,
        }
    }
}

impl WorldTime {
    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale;
        self
    }
}
