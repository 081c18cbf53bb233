//! Secret synchronization between a local file and a bound folder.

mod cancel;
mod engine;

pub use cancel::CancelToken;
pub use engine::Engine;
