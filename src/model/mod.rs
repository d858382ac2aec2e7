pub mod common;
pub mod horse;
pub mod owner;

pub use common::*;
pub use horse::*;
pub use owner::*;
