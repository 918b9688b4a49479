pub mod camera;

pub use camera::{CameraConfig, OrbitCamera};
