pub mod aggregate;
pub mod credentials;
pub mod enums;
pub mod hub_module;
pub mod insight;
pub mod record;

pub use aggregate::*;
pub use credentials::*;
pub use enums::*;
pub use hub_module::*;
pub use insight::*;
pub use record::*;
