//! Republic vs. Order session server.
//!
//! One process hosts many rooms. Each room is a [`session::Session`]: a
//! 3-slot faction lobby that becomes an authoritative game once everyone is
//! ready. Sessions process one inbound message at a time and answer with a
//! list of outbound messages, so the renet transport and an in-process
//! hot-seat front end share the same code path.

pub mod channels;
pub mod config;
pub mod protocol;
pub mod rooms;
pub mod session;
pub mod slots;
pub mod transport;

pub use channels::*;
pub use config::ServerConfig;
pub use protocol::*;
pub use rooms::{RoomRegistry, ROOM_CODE_LEN};
pub use session::{Outbound, Session};
pub use slots::{JoinError, SlotLink, SlotTable};
pub use transport::{ServerRunner, TransportConfig, TransportError, PROTOCOL_ID};
