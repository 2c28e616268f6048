//! Protocol module containing the packet codec, sequence numbering, and
//! display payload types.

pub mod display;
pub mod packet;
pub mod sequence;

pub use display::DisplayConfig;
pub use packet::{Packet, PacketError};
pub use sequence::SequenceCounter;
