use log::debug;

use crate::Config;

/// Lifecycle of the temporal anti-aliasing.
///
/// Freshly enabled TAA has no meaningful history, so it spends one frame in
/// `ResetPending`, during which the resolve pass outputs the current frame
/// (and seeds the history with it).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaaState {
    Off,
    ResetPending,
    On,
}

impl TaaState {
    pub fn new(enabled: bool) -> Self {
        if enabled {
            Self::ResetPending
        } else {
            Self::Off
        }
    }

    /// Follows a change of configuration.
    pub fn configure(self, enabled: bool) -> Self {
        let next = match (self, enabled) {
            (_, false) => Self::Off,
            (Self::Off, true) => Self::ResetPending,
            (state, true) => state,
        };

        if next != self {
            debug!("TAA: {self:?} -> {next:?}");
        }

        next
    }

    /// Invalidates history, e.g. after the images have been reallocated.
    pub fn reset(self) -> Self {
        match self {
            Self::Off => Self::Off,
            _ => Self::ResetPending,
        }
    }

    /// Moves to the next frame.
    pub fn advance(self) -> Self {
        match self {
            Self::ResetPending => Self::On,
            state => state,
        }
    }

    pub fn is_enabled(self) -> bool {
        self != Self::Off
    }

    pub fn needs_reset(self) -> bool {
        self == Self::ResetPending
    }
}

/// Progress of the ground-truth accumulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GroundTruthState {
    /// Next frame starts accumulation from scratch
    #[default]
    Reset,

    /// `frame_idx` frames have been accumulated so far
    Accumulating { frame_idx: u32 },
}

impl GroundTruthState {
    /// Returns the index of the frame about to be rendered; the shader
    /// blends it with weight `1 / (frame_idx + 1)`.
    pub fn frame_idx(self) -> u32 {
        match self {
            Self::Reset => 0,
            Self::Accumulating { frame_idx } => frame_idx,
        }
    }

    pub fn reset(&mut self) {
        if *self != Self::Reset {
            debug!("Ground truth: resetting after {} frames", self.frame_idx());
        }

        *self = Self::Reset;
    }

    pub fn advance(&mut self) {
        *self = Self::Accumulating {
            frame_idx: self.frame_idx().saturating_add(1),
        };
    }
}

/// Validity of the images temporal passes read their history from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HistoryState {
    /// Next frame starts with clearing the history images
    #[default]
    Invalid,

    Valid,
}

impl HistoryState {
    pub fn invalidate(&mut self) {
        if *self == Self::Valid {
            debug!("History: invalidating");
        }

        *self = Self::Invalid;
    }

    pub fn needs_clear(self) -> bool {
        self == Self::Invalid
    }

    /// Marks the history as written by the frame that has just been recorded.
    pub fn advance(&mut self) {
        *self = Self::Valid;
    }
}

/// What a renderer has to do after its configuration changes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Reconfiguration {
    pub rebuild_buffers: bool,
    pub rebuild_passes: bool,

    /// Rebuilt passes would otherwise read history written by a different
    /// frame graph (e.g. moments left over from before denoising got
    /// toggled)
    pub reset_history: bool,

    pub reset_ground_truth: bool,
}

impl Reconfiguration {
    pub fn new(prev: &Config, next: &Config) -> Self {
        let rebuild_buffers = prev.invalidates_buffers(next);
        let rebuild_passes = prev.invalidates_passes(next);

        let reset_ground_truth = prev.visualization != next.visualization
            || prev.ground_truth != next.ground_truth;

        Self {
            rebuild_buffers,
            rebuild_passes,
            reset_history: rebuild_buffers || rebuild_passes,
            reset_ground_truth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RayTraceScale;

    #[test]
    fn taa_enable_and_disable() {
        let state = TaaState::new(false);

        assert_eq!(TaaState::Off, state);
        assert!(!state.is_enabled());

        let state = state.configure(true);

        assert_eq!(TaaState::ResetPending, state);
        assert!(state.needs_reset());

        let state = state.advance();

        assert_eq!(TaaState::On, state);
        assert!(!state.needs_reset());
        assert_eq!(TaaState::On, state.configure(true));
        assert_eq!(TaaState::On, state.advance());
        assert_eq!(TaaState::Off, state.configure(false));
    }

    #[test]
    fn taa_reset() {
        assert_eq!(TaaState::ResetPending, TaaState::On.reset());
        assert_eq!(TaaState::Off, TaaState::Off.reset());
        assert_eq!(TaaState::Off, TaaState::Off.advance());
    }

    #[test]
    fn ground_truth_accumulation() {
        let mut state = GroundTruthState::default();

        assert_eq!(0, state.frame_idx());

        state.advance();
        state.advance();
        state.advance();

        assert_eq!(3, state.frame_idx());

        state.reset();

        assert_eq!(GroundTruthState::Reset, state);
        assert_eq!(0, state.frame_idx());

        state.advance();

        assert_eq!(1, state.frame_idx());
    }

    #[test]
    fn history_lifecycle() {
        let mut history = HistoryState::default();

        assert!(history.needs_clear());

        history.advance();

        assert!(!history.needs_clear());

        history.invalidate();

        assert!(history.needs_clear());
    }

    #[test]
    fn toggling_denoising_resets_history() {
        let prev = Config::default();
        let mut next = prev;

        next.shadows.denoise = !prev.shadows.denoise;

        let change = Reconfiguration::new(&prev, &next);

        assert!(change.rebuild_passes);
        assert!(change.reset_history);
        assert!(!change.rebuild_buffers);
        assert!(!change.reset_ground_truth);

        let mut history = HistoryState::Valid;
        let mut taa = TaaState::On;

        if change.reset_history {
            history.invalidate();
            taa = taa.reset();
        }

        assert!(history.needs_clear());
        assert!(taa.needs_reset());
    }

    #[test]
    fn parameter_tweaks_keep_history() {
        let prev = Config::default();
        let mut next = prev;

        next.ao.alpha = prev.ao.alpha * 2.0;

        assert_eq!(
            Reconfiguration::default(),
            Reconfiguration::new(&prev, &next)
        );
    }

    #[test]
    fn rescaling_resets_history() {
        let prev = Config::default();
        let mut next = prev;

        next.ao.scale = RayTraceScale::Quarter;

        let change = Reconfiguration::new(&prev, &next);

        assert!(change.rebuild_buffers);
        assert!(change.rebuild_passes);
        assert!(change.reset_history);
    }

    #[test]
    fn ground_truth_tweaks_restart_accumulation_only() {
        let prev = Config::default();
        let mut next = prev;

        next.ground_truth.max_ray_bounces += 1;

        let change = Reconfiguration::new(&prev, &next);

        assert!(change.reset_ground_truth);
        assert!(!change.reset_history);
    }
}
