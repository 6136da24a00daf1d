pub mod api;
pub mod dispatch;
pub mod health;
pub mod resolve;

pub use dispatch::dispatch_handler;
pub use health::health_handler;
