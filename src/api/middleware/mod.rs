pub mod trace;
pub mod security;
pub mod timeout;

pub use trace::*;
pub use security::*;
pub use timeout::*;
