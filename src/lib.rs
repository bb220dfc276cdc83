pub mod app;
pub mod config;
pub mod error;
pub mod event;
pub mod gateway;
pub mod session;
pub mod ui;
pub mod util;

pub use app::App;
pub use config::AppConfig;
pub use error::GatewayError;
pub use gateway::{Backend, MemoryGateway};
pub use session::Session;
