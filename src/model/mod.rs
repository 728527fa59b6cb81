pub mod attendance;
pub mod intent;
