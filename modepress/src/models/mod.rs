pub mod batch;
pub mod model;
pub mod record;
pub mod registry;

pub use batch::BatchResult;
pub use model::{id_selector, Model};
pub use record::{Dependencies, Dependency, DependencyKind, Record};
pub use registry::{ModelRegistry, RegistryStats};
