//! Headless GPU device management (feature `gpu`).
//!
//! Creates the wgpu Instance/Adapter/Device/Queue. No window or surface is
//! involved; the gpu backend renders into its own textures.

mod gpu;
mod init;

pub use gpu::Gpu;
pub use init::GpuInit;
