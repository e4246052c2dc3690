/// Normalized sequence number shared by every stream of a session
pub type Slot = i64;
/// Sender-local sequence number, as carried on the wire
pub type SequenceNumber = u32;
/// Shift, in periods, from a stream's local numbering to the slot domain
pub type SlotOffset = i64;
/// Sender-clock timestamp in microseconds
pub type Micros = i64;
