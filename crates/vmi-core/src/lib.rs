//! Value model for the tagged-word runtime representation: raw word
//! classification, box layout tables, the memory-read capability, and the
//! decoded node tree produced by the inspection pipeline.

pub mod layout;
pub mod mem;
pub mod node;
pub mod word;

pub use layout::{slot_addr, BoxKind, TypeCode, WORD_BYTES};
pub use mem::{MemError, MemImage, MemoryReader};
pub use node::{DecodedNode, TypeNode};
pub use word::{classify, make_boxed, make_int, make_uint, RawWord, Sentinel, TaggedWord};
