pub mod presence;
pub mod session;
pub mod snapshot;
pub mod user;
