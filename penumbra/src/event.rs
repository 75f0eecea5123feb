/// Change of the engine's shared state, propagated to every renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    SceneChanged,
    EnvironmentChanged,
    LightChanged,
}
