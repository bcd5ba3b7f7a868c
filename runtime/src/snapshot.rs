use render::backend::GpuTier;

/// A point-in-time debugging readout, not a serialization format - the spec requires no
/// persisted state, this exists purely for the host's diagnostic readouts (sampled
/// counters like FPS and draw calls are exposed the same way, at a rate the host
/// controls).
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub tick: u64,
    pub sim_time_secs: f32,
    pub entity_count: usize,
    pub selected_count: usize,
    pub degraded_systems: Vec<&'static str>,
    pub render_tier: GpuTier,
    pub render_suspended: bool,
}
