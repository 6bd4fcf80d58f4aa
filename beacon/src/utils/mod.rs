pub use tokio;
pub use tokio::time::sleep;

pub mod task;
