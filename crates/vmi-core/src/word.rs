use serde::Serialize;
use strum_macros::Display;

/// A machine word snapshotted from a register or memory slot.
pub type RawWord = u64;

pub const TAG_MASK: u64 = 0x7;
pub const TAG_INT: u64 = 0b000;
pub const TAG_UINT: u64 = 0b001;
pub const TAG_BOX: u64 = 0b110;
pub const TAG_TRAP: u64 = 0b111;

const IMM_BITS_SHIFT: u64 = 3;
const IMM_BITS_MASK: u64 = 0x1f;
const IMM_PAYLOAD_SHIFT: u64 = 32;

/// Fixed tag-7 words with special meaning. `BrokenHeart` is the forwarding
/// marker the collector writes over a relocated object's header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Sentinel {
    Null,
    InvalidObject,
    UninitializedObject,
    BrokenHeart,
}

impl Sentinel {
    pub const NULL: u64 = 0x07;
    pub const INVALID_OBJECT: u64 = 0x17;
    pub const UNINITIALIZED_OBJECT: u64 = 0x27;
    pub const BROKEN_HEART: u64 = 0x37;

    pub fn from_word(word: RawWord) -> Option<Sentinel> {
        match word {
            Self::NULL => Some(Sentinel::Null),
            Self::INVALID_OBJECT => Some(Sentinel::InvalidObject),
            Self::UNINITIALIZED_OBJECT => Some(Sentinel::UninitializedObject),
            Self::BROKEN_HEART => Some(Sentinel::BrokenHeart),
            _ => None,
        }
    }

    pub fn word(self) -> RawWord {
        match self {
            Sentinel::Null => Self::NULL,
            Sentinel::InvalidObject => Self::INVALID_OBJECT,
            Sentinel::UninitializedObject => Self::UNINITIALIZED_OBJECT,
            Sentinel::BrokenHeart => Self::BROKEN_HEART,
        }
    }
}

/// Outcome of classifying one machine word.
///
/// Immediate integers carry their payload in bits [32..64) and the declared
/// bit width (1..=32) in bits [3..8). Boxed words carry a word-aligned
/// pointer with the tag bits cleared. Anything that does not match a legal
/// tag pattern is `Garbage`, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaggedWord {
    Int { value: i64, bits: u8 },
    Uint { value: u64, bits: u8 },
    Boxed { ptr: u64 },
    Sentinel(Sentinel),
    Garbage(u64),
}

/// Classify a raw word. Total over all 2^64 inputs: unknown tag-7 words and
/// impossible tag combinations fall through to `Garbage`.
pub fn classify(word: RawWord) -> TaggedWord {
    match word & TAG_MASK {
        TAG_INT => TaggedWord::Int {
            value: (word >> IMM_PAYLOAD_SHIFT) as u32 as i32 as i64,
            bits: immediate_bits(word),
        },
        TAG_UINT => TaggedWord::Uint {
            value: word >> IMM_PAYLOAD_SHIFT,
            bits: immediate_bits(word),
        },
        TAG_BOX => TaggedWord::Boxed {
            ptr: word & !TAG_MASK,
        },
        TAG_TRAP => match Sentinel::from_word(word) {
            Some(sentinel) => TaggedWord::Sentinel(sentinel),
            None => TaggedWord::Garbage(word),
        },
        _ => TaggedWord::Garbage(word),
    }
}

fn immediate_bits(word: RawWord) -> u8 {
    ((word >> IMM_BITS_SHIFT) & IMM_BITS_MASK) as u8 + 1
}

/// Encode a signed immediate. `bits` must be in 1..=32 and `value` must be
/// representable in that width.
pub fn make_int(value: i32, bits: u8) -> RawWord {
    debug_assert!((1..=32).contains(&bits));
    ((value as u32 as u64) << IMM_PAYLOAD_SHIFT)
        | (((bits as u64 - 1) & IMM_BITS_MASK) << IMM_BITS_SHIFT)
        | TAG_INT
}

/// Encode an unsigned immediate.
pub fn make_uint(value: u32, bits: u8) -> RawWord {
    debug_assert!((1..=32).contains(&bits));
    ((value as u64) << IMM_PAYLOAD_SHIFT)
        | (((bits as u64 - 1) & IMM_BITS_MASK) << IMM_BITS_SHIFT)
        | TAG_UINT
}

/// Encode a boxed reference. The pointer must be word-aligned.
pub fn make_boxed(ptr: u64) -> RawWord {
    debug_assert_eq!(ptr & TAG_MASK, 0, "box pointer must be 8-byte aligned");
    ptr | TAG_BOX
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn classify_is_total_over_every_tag() {
        let highs = [0u64, 1, 5, 0xdead_beef, u64::MAX >> 3];
        for tag in 0..8u64 {
            for high in highs {
                let word = (high << 3) | tag;
                let outcome = classify(word);
                match tag {
                    TAG_INT => assert!(matches!(outcome, TaggedWord::Int { .. })),
                    TAG_UINT => assert!(matches!(outcome, TaggedWord::Uint { .. })),
                    TAG_BOX => assert!(matches!(outcome, TaggedWord::Boxed { .. })),
                    TAG_TRAP => assert!(matches!(
                        outcome,
                        TaggedWord::Sentinel(_) | TaggedWord::Garbage(_)
                    )),
                    _ => assert_eq!(outcome, TaggedWord::Garbage(word)),
                }
            }
        }
    }

    #[test]
    fn signed_immediates_round_trip_across_widths() {
        for bits in 1..=32u8 {
            let max = if bits == 32 {
                i32::MAX
            } else {
                (1i64 << (bits - 1)) as i32 - 1
            };
            let min = if bits == 32 {
                i32::MIN
            } else {
                -((1i64 << (bits - 1)) as i32)
            };
            for value in [min, -1, 0, 1, max] {
                if value < min || value > max {
                    continue;
                }
                let word = make_int(value, bits);
                assert_eq!(
                    classify(word),
                    TaggedWord::Int {
                        value: value as i64,
                        bits
                    }
                );
            }
        }
    }

    #[test]
    fn unsigned_immediates_round_trip_across_widths() {
        for bits in 1..=32u8 {
            let max = if bits == 32 {
                u32::MAX
            } else {
                (1u64 << bits) as u32 - 1
            };
            for value in [0, 1, max] {
                let word = make_uint(value, bits);
                assert_eq!(
                    classify(word),
                    TaggedWord::Uint {
                        value: value as u64,
                        bits
                    }
                );
            }
        }
    }

    #[test]
    fn width_field_matches_bit_layout() {
        // payload 5, width field 24 -> declared width 25
        let word = (5u64 << 32) | (24 << 3);
        assert_eq!(word, make_int(5, 25));
        assert_eq!(classify(word), TaggedWord::Int { value: 5, bits: 25 });
    }

    #[test]
    fn boxed_words_strip_tag_bits() {
        assert_eq!(
            classify(make_boxed(0x1000)),
            TaggedWord::Boxed { ptr: 0x1000 }
        );
    }

    #[test]
    fn sentinel_constants_classify_exactly() {
        for sentinel in [
            Sentinel::Null,
            Sentinel::InvalidObject,
            Sentinel::UninitializedObject,
            Sentinel::BrokenHeart,
        ] {
            assert_eq!(classify(sentinel.word()), TaggedWord::Sentinel(sentinel));
        }
    }

    #[test]
    fn unknown_tag7_words_are_garbage() {
        let word = 0x47;
        assert_eq!(classify(word), TaggedWord::Garbage(word));
        let word = (0xabcd << 3) | TAG_TRAP;
        assert_eq!(classify(word), TaggedWord::Garbage(word));
    }
}
