//! Device wire protocol: opcode/status registries and the frame codec.

pub mod codec;
pub mod opcode;
pub mod slot;

pub use codec::{decode, encode, ProtocolCommand, ProtocolResponse, OPCODE_LEN};
pub use opcode::{Opcode, Status};
pub use slot::{Slot, SlotError};
