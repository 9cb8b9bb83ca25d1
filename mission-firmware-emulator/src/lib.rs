#![warn(missing_docs)]

//! In-memory firmware of mission devices and meshes.

mod device;
mod mesh;
mod request;

pub use device::{MissionEmulator, RawSamples};
pub use mesh::MeshEmulator;
pub use request::Request;
