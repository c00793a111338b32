//! Decode-and-present pipeline over the tagged value words of a running
//! register VM: a depth-bounded recursive decoder driven by a memory-read
//! capability, a presenter that renders decoded trees for a host debugger,
//! and the adapter that routes host-declared type names to entry points.

pub mod decode;
pub mod host;
pub mod present;

pub use decode::{DecodeLimits, Decoder};
pub use host::{entry_point_for, EntryPoint, InspectError, Inspector, REGISTRATIONS};
pub use present::{present, DisplayHint, Presentation};
