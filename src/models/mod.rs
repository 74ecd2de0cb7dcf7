pub mod artifact;
pub mod brand;
pub mod copy;
pub mod format;
pub mod request;
pub mod usage;

pub use artifact::*;
pub use brand::*;
pub use copy::*;
pub use format::*;
pub use request::*;
pub use usage::*;
