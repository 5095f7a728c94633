pub mod analyzer;
mod error;
pub mod hltreplay;
pub mod types;

pub use error::*;
pub use hltreplay::Replay;
pub use strum;

#[cfg(feature = "arc")]
pub type Rc<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub type Rc<T> = std::rc::Rc<T>;
