mod datum;
mod error;
mod message;
mod outbound;
mod reader;
mod status;
mod table;

pub use datum::{Datum, Text};
pub use error::DecodeError;
pub use message::Message;
pub use outbound::Outbound;
pub use reader::Reader;
pub use status::ResponseStatus;
pub use table::{MessageType, TagTable, DEVICE, MESH, MESH_DEVICE, PRIMARY};
