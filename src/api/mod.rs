pub mod attendance;
pub mod clock;
pub mod dispatch;
pub mod signature;
pub mod webhook;
