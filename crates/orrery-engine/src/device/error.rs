/// What the frame loop should do after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering resumes next frame.
    Reconfigured,
    /// Transient error; skip this frame.
    SkipFrame,
    /// Unrecoverable (commonly OOM); shut down.
    Fatal,
}
