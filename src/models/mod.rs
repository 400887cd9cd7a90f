pub mod export;
pub mod invoice;

pub use export::*;
pub use invoice::*;
