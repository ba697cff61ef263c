mod handler;
mod model;

pub use handler::{health, root};
pub use model::{HealthResponse, ServiceInfo, UploadDirs};
