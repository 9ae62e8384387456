pub mod instance;
pub mod manager;
pub mod model;

pub use instance::{InstanceDrawArgs, InstanceSelectArgs, WmoInstance};
pub use manager::WmoManager;
pub use model::{Wmo, WmoModel};
