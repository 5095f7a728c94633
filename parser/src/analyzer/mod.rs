pub mod actions;
pub mod dataset;
pub mod identity;
pub mod snapshot;

pub use actions::*;
pub use dataset::*;
pub use identity::*;
pub use snapshot::*;
