use serde::Serialize;
use strum_macros::Display;

pub const WORD_BYTES: u64 = 8;

/// Box header type codes. The header is the first word of every boxed
/// object; any other value there means a corrupt or foreign object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum BoxKind {
    Long = 0x2,
    Ulong = 0x3,
    Str = 0x8,
    Offset = 0x9,
    Array = 0xa,
    Struct = 0xb,
    Type = 0xc,
    Closure = 0xd,
    IncrArray = 0xe,
    Env = 0xf,
    Program = 0x10,
}

/// The legal box header table, keyed by type code.
pub const BOX_KINDS: &[(u64, BoxKind)] = &[
    (0x2, BoxKind::Long),
    (0x3, BoxKind::Ulong),
    (0x8, BoxKind::Str),
    (0x9, BoxKind::Offset),
    (0xa, BoxKind::Array),
    (0xb, BoxKind::Struct),
    (0xc, BoxKind::Type),
    (0xd, BoxKind::Closure),
    (0xe, BoxKind::IncrArray),
    (0xf, BoxKind::Env),
    (0x10, BoxKind::Program),
];

impl BoxKind {
    pub fn from_code(code: u64) -> Option<BoxKind> {
        BOX_KINDS
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, kind)| *kind)
    }

    pub fn code(self) -> u64 {
        self as u64
    }
}

/// Type descriptor discriminants. A descriptor outside this table is a
/// decoding error, not a crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum TypeCode {
    Integral = 0,
    String = 1,
    Array = 2,
    Struct = 3,
    Offset = 4,
    Closure = 5,
    Void = 6,
}

pub const TYPE_CODES: &[(u64, TypeCode)] = &[
    (0, TypeCode::Integral),
    (1, TypeCode::String),
    (2, TypeCode::Array),
    (3, TypeCode::Struct),
    (4, TypeCode::Offset),
    (5, TypeCode::Closure),
    (6, TypeCode::Void),
];

impl TypeCode {
    pub fn from_code(code: u64) -> Option<TypeCode> {
        TYPE_CODES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, tc)| *tc)
    }
}

/// Word-indexed field slots for each box variant, counting from the header
/// at slot 0. Slots marked "value word" hold a full tagged word and are
/// decoded recursively; the rest are plain integers or pointers.
pub mod slot {
    /// Long/Ulong: value, then declared width minus one.
    pub const LONG_VALUE: u64 = 1;
    pub const LONG_SIZE: u64 = 2;

    /// Str: pointer to NUL-terminated bytes.
    pub const STR_DATA: u64 = 1;

    /// Offset: unit type (value word), then magnitude (value word).
    pub const OFF_UNIT: u64 = 1;
    pub const OFF_MAGNITUDE: u64 = 2;

    /// Array: element count, allocated count, pointer to value words.
    pub const ARR_NELEM: u64 = 1;
    pub const ARR_NALLOCATED: u64 = 2;
    pub const ARR_ELEMS: u64 = 3;

    /// Struct: type (value word), counts, then field/method arrays of
    /// value words.
    pub const SCT_TYPE: u64 = 1;
    pub const SCT_NFIELDS: u64 = 2;
    pub const SCT_NMETHODS: u64 = 3;
    pub const SCT_FIELDS: u64 = 4;
    pub const SCT_METHODS: u64 = 5;

    /// Type descriptor: discriminant, then a code-dependent payload.
    pub const TYP_CODE: u64 = 1;
    pub const TYP_PAYLOAD: u64 = 2;
    pub const TYP_INTEGRAL_SIZE: u64 = 2;
    pub const TYP_INTEGRAL_SIGNED: u64 = 3;

    /// Closure: name, environment, program (all value words).
    pub const CLS_NAME: u64 = 1;
    pub const CLS_ENV: u64 = 2;
    pub const CLS_PROGRAM: u64 = 3;

    /// Incremental array: allocated count, element count, pointer to
    /// value words.
    pub const IAR_NALLOCATED: u64 = 1;
    pub const IAR_NELEM: u64 = 2;
    pub const IAR_ELEMS: u64 = 3;

    /// Environment frame: vars (value word), parent (value word, the Null
    /// sentinel for the top frame).
    pub const ENV_VARS: u64 = 1;
    pub const ENV_PARENT: u64 = 2;
}

/// Address of a field slot. Wraps on overflow: a corrupt box pointer near
/// the top of the address space must produce an unreadable address, not a
/// panic.
pub fn slot_addr(base: u64, slot: u64) -> u64 {
    base.wrapping_add(slot.wrapping_mul(WORD_BYTES))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_table_round_trips_codes() {
        for (code, kind) in BOX_KINDS {
            assert_eq!(BoxKind::from_code(*code), Some(*kind));
            assert_eq!(kind.code(), *code);
        }
    }

    #[test]
    fn codes_outside_the_tables_are_rejected() {
        assert_eq!(BoxKind::from_code(0x0), None);
        assert_eq!(BoxKind::from_code(0x2a), None);
        assert_eq!(BoxKind::from_code(0x11), None);
        assert_eq!(TypeCode::from_code(7), None);
    }

    #[test]
    fn slot_addresses_wrap_instead_of_overflowing() {
        assert_eq!(slot_addr(u64::MAX - 7, 2), 8);
        assert_eq!(slot_addr(0x1000, 3), 0x1018);
    }

    #[test]
    fn type_code_table_covers_all_discriminants() {
        for code in 0..=6u64 {
            assert!(TypeCode::from_code(code).is_some());
        }
    }
}
