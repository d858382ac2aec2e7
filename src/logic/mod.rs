pub mod ancestry;
pub mod horse_service;
pub mod owner_service;
pub mod validate;

pub use ancestry::*;
pub use horse_service::*;
pub use owner_service::*;
pub use validate::*;
