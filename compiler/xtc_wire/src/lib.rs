//! Byte-level codec of XTC module files.
//!
//! - [`Reader`] / [`Writer`]: big-endian cursor over a whole file, so every
//!   offset it reports is a file offset
//! - [`PackedInt`]: the variable-length "XIP" integer encoding used for
//!   counts, indices and integer literals
//! - [`RawConst`]: one constant pool record with its references still plain
//!   integers; [`decode_const`] reads one, [`RawConst::encode`] writes one
//!
//! Nothing here resolves references. A decoded record is valid in isolation;
//! whether its indices point anywhere is the pool's concern.

mod error;
mod packed;
mod reader;
mod record;
mod writer;

pub use error::{WireError, WireErrorKind};
pub use packed::PackedInt;
pub use reader::Reader;
pub use record::{decode_const, decode_payload, IntWidth, RawConst};
pub use writer::Writer;
