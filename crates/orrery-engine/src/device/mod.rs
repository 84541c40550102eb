//! GPU device + surface management: adapter/device/queue creation, surface
//! configuration and frame acquisition.

mod context;
mod error;
mod frame;
mod init;
mod surface;

pub use context::Gpu;
pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use init::GpuInit;
