// Command types - presentation -> tick loop
// Cancellation does not go through the ring: it is a shared flag checked every poll slice

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCommand {
    Pause,
    Resume,
}
