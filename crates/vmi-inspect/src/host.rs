use thiserror::Error;
use tracing::warn;
use vmi_core::MemoryReader;

use crate::decode::{DecodeLimits, Decoder};
use crate::present::{present, Presentation};

/// Which decoder a host-declared type name routes to. `Value` runs the full
/// tag pipeline; the rest decode a box the host already unwrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPoint {
    Value,
    Struct,
    Type,
    Offset,
    Str,
    IncrArray,
}

/// Registration table at the host boundary: pure configuration, kept out of
/// the decode logic.
pub const REGISTRATIONS: &[(&str, EntryPoint)] = &[
    ("RuntimeValue", EntryPoint::Value),
    ("StructObject", EntryPoint::Struct),
    ("TypeObject", EntryPoint::Type),
    ("OffsetObject", EntryPoint::Offset),
    ("StringObject", EntryPoint::Str),
    ("IncrementalArrayObject", EntryPoint::IncrArray),
];

pub fn entry_point_for(type_name: &str) -> Option<EntryPoint> {
    REGISTRATIONS
        .iter()
        .find(|(name, _)| *name == type_name)
        .map(|(_, entry)| *entry)
}

/// The one fatal condition in the system: the host asked about a type this
/// layer never registered for. Everything else degrades to placeholder
/// nodes inside the presentation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InspectError {
    #[error("no presenter registered for type `{name}`")]
    NoPresenter { name: String },
}

/// Host-facing adapter: one `inspect` call per inspected datum, stateless
/// between calls.
#[derive(Debug, Clone, Default)]
pub struct Inspector {
    limits: DecodeLimits,
}

impl Inspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: DecodeLimits) -> Self {
        Self { limits }
    }

    /// Decode and present one datum. `raw` is the tagged word for
    /// `RuntimeValue`, or the unwrapped box pointer for the direct entry
    /// points.
    pub fn inspect<R: MemoryReader>(
        &self,
        type_name: &str,
        raw: u64,
        reader: &R,
    ) -> Result<Presentation, InspectError> {
        let Some(entry) = entry_point_for(type_name) else {
            warn!(type_name, "inspection requested for unregistered type");
            return Err(InspectError::NoPresenter {
                name: type_name.to_string(),
            });
        };
        let decoder = Decoder::with_limits(reader, self.limits.clone());
        let node = match entry {
            EntryPoint::Value => decoder.decode(raw),
            EntryPoint::Struct => decoder.decode_struct(raw, 0),
            EntryPoint::Type => decoder.decode_type(raw, 0),
            EntryPoint::Offset => decoder.decode_offset(raw, 0),
            EntryPoint::Str => decoder.decode_str(raw),
            EntryPoint::IncrArray => decoder.decode_iarray(raw, 0),
        };
        Ok(present(&node))
    }
}
