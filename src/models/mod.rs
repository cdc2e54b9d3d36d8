pub mod responses;
pub mod risk;

pub use responses::*;
pub use risk::*;
