//! Record persistence: binary codec and the append-only segment log.

pub mod codec;
pub mod segment;

pub use codec::{decode_record, encode_record};
pub use segment::{Location, SegmentLog};
