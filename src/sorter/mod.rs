pub mod core;
pub mod external;
pub mod native;


pub use self::core::*;
pub use self::external::*;
pub use self::native::*;
