use serde::Serialize;

use crate::word::Sentinel;

/// One decoded value. A closed sum over every outcome the pipeline can
/// produce, including the recovery variants: corruption and read failures
/// become labeled nodes here, never errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DecodedNode {
    /// Signed immediate.
    Int { value: i64, bits: u8 },
    /// Unsigned immediate.
    Uint { value: u64, bits: u8 },
    /// Boxed signed integer with an explicit width.
    Long { value: i64, bits: u32 },
    /// Boxed unsigned integer with an explicit width.
    Ulong { value: u64, bits: u32 },
    Str {
        data: String,
    },
    Offset {
        magnitude: Box<DecodedNode>,
        unit: Box<DecodedNode>,
    },
    Array {
        elems: Vec<DecodedNode>,
        /// Elements beyond the presentation limit that were not decoded.
        truncated: u64,
    },
    Struct {
        ty: Box<DecodedNode>,
        nfields: u64,
        nmethods: u64,
        fields: Vec<DecodedNode>,
        methods: Vec<DecodedNode>,
        fields_truncated: u64,
        methods_truncated: u64,
    },
    Type(TypeNode),
    Closure {
        name: Box<DecodedNode>,
        env: Box<DecodedNode>,
        program: Box<DecodedNode>,
    },
    IncrArray {
        nallocated: u64,
        nelem: u64,
        elems: Vec<DecodedNode>,
        truncated: u64,
    },
    Env {
        vars: Box<DecodedNode>,
        parent: Box<DecodedNode>,
    },
    /// Programs are identified, never traversed.
    Program { addr: u64 },
    Sentinel(Sentinel),
    /// A word whose tag bits match no legal pattern.
    Garbage(u64),
    /// A pointer or field address the reader could not service.
    BadPointer(u64),
    /// A box header outside the legal table.
    UnknownBox { code: u64 },
    /// A type descriptor discriminant outside 0..=6.
    UnknownTypeCode { code: u64 },
    /// A broken-heart word seen as a box header: the object was relocated
    /// mid-inspection and its payload is gone.
    Relocated,
    /// The recursion guard tripped before this value could be decoded.
    DepthLimit,
}

/// Payload of a type descriptor, selected by its discriminant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TypeNode {
    Integral { bits: u64, signed: bool },
    Str,
    Array { elem: Box<DecodedNode> },
    Struct { name: Box<DecodedNode> },
    Offset { base: Box<DecodedNode> },
    /// Opaque until the closure type layout is settled; no payload is read.
    Closure,
    Void,
}
