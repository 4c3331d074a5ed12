//! Definer hub runtime.
//!
//! Wires the sans-IO [`definer_core::Dispatcher`] to real I/O:
//!
//! - [`tcp`]: TCP transport
//! - [`driver`]: runs dispatcher actions outside the state lock
//! - [`fanout`]: peer broadcast and device delivery with timeouts
//! - [`listener`]: one-frame-per-connection accept loop with graceful drain
//! - [`file_store`]: TOML persistence
//! - [`link`]: emulated wireless link
//! - [`console`]: interactive command source
//! - [`shutdown`]: signal handling

pub mod config;
pub mod console;
pub mod driver;
pub mod error;
pub mod fanout;
pub mod file_store;
pub mod link;
pub mod listener;
pub mod shutdown;
pub mod tcp;

pub use config::DriverConfig;
pub use driver::{ServerDriver, SharedDispatcher};
pub use error::ServerError;
pub use fanout::Timeouts;
pub use file_store::FileStore;
pub use link::EmulatedLink;
pub use listener::{handle_connection, serve};
pub use shutdown::shutdown_signal;
pub use tcp::TcpTransport;
