//! Raw link handles.
//!
//! A `LinkAdapter` is the blocking byte pipe a transport drives from its
//! worker threads: a real serial device, an OS-bound radio socket, or a mock.

pub mod error;
pub mod mock;
pub mod serial_link;
pub mod traits;

pub use error::PortError;
pub use mock::MockLink;
pub use serial_link::SerialLink;
pub use traits::*;
