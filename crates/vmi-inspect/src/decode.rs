use tracing::debug;
use vmi_core::layout::{slot, slot_addr, BoxKind, TypeCode};
use vmi_core::{classify, DecodedNode, MemoryReader, Sentinel, TaggedWord, TypeNode};

/// Budgets that keep a traversal of arbitrary, possibly corrupt memory
/// bounded. Depth caps recursion through nested boxes and scope chains;
/// the element cap bounds presentation cost independently of depth.
#[derive(Debug, Clone)]
pub struct DecodeLimits {
    pub max_depth: usize,
    pub max_elems: u64,
    pub max_str_bytes: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_elems: 64,
            max_str_bytes: 1024,
        }
    }
}

/// Recursive decoder over one memory-read capability. Stateless between
/// calls; the only traversal state is the depth counter threaded through.
pub struct Decoder<'a, R: MemoryReader> {
    reader: &'a R,
    limits: DecodeLimits,
}

impl<'a, R: MemoryReader> Decoder<'a, R> {
    pub fn new(reader: &'a R) -> Self {
        Self {
            reader,
            limits: DecodeLimits::default(),
        }
    }

    pub fn with_limits(reader: &'a R, limits: DecodeLimits) -> Self {
        Self { reader, limits }
    }

    /// Decode one raw word into a node tree. Total: corruption, unreadable
    /// memory, and budget exhaustion all come back as labeled nodes.
    pub fn decode(&self, word: u64) -> DecodedNode {
        self.decode_value(word, 0)
    }

    fn decode_value(&self, word: u64, depth: usize) -> DecodedNode {
        if depth >= self.limits.max_depth {
            return DecodedNode::DepthLimit;
        }
        match classify(word) {
            TaggedWord::Int { value, bits } => DecodedNode::Int { value, bits },
            TaggedWord::Uint { value, bits } => DecodedNode::Uint { value, bits },
            TaggedWord::Boxed { ptr } => self.decode_box(ptr, depth),
            TaggedWord::Sentinel(sentinel) => DecodedNode::Sentinel(sentinel),
            TaggedWord::Garbage(word) => DecodedNode::Garbage(word),
        }
    }

    /// Read a box header and dispatch on its type code.
    pub fn decode_box(&self, ptr: u64, depth: usize) -> DecodedNode {
        let header = match self.reader.read_word(ptr) {
            Ok(word) => word,
            Err(err) => {
                debug!(ptr, %err, "box header unreadable");
                return DecodedNode::BadPointer(ptr);
            }
        };
        // A forwarding marker in the header slot means the collector moved
        // this object between our pointer read and now. Its payload is gone;
        // do not interpret the remaining words.
        if header == Sentinel::BROKEN_HEART {
            debug!(ptr, "box relocated mid-inspection");
            return DecodedNode::Relocated;
        }
        match BoxKind::from_code(header) {
            Some(BoxKind::Long) => self.decode_long(ptr, true),
            Some(BoxKind::Ulong) => self.decode_long(ptr, false),
            Some(BoxKind::Str) => self.decode_str(ptr),
            Some(BoxKind::Offset) => self.decode_offset(ptr, depth),
            Some(BoxKind::Array) => self.decode_array(ptr, depth),
            Some(BoxKind::Struct) => self.decode_struct(ptr, depth),
            Some(BoxKind::Type) => self.decode_type(ptr, depth),
            Some(BoxKind::Closure) => self.decode_closure(ptr, depth),
            Some(BoxKind::IncrArray) => self.decode_iarray(ptr, depth),
            Some(BoxKind::Env) => self.decode_env(ptr, depth),
            Some(BoxKind::Program) => DecodedNode::Program { addr: ptr },
            None => {
                debug!(ptr, code = header, "unknown box header");
                DecodedNode::UnknownBox { code: header }
            }
        }
    }

    pub fn decode_long(&self, ptr: u64, signed: bool) -> DecodedNode {
        self.long_body(ptr, signed).unwrap_or_else(|bad| bad)
    }

    fn long_body(&self, ptr: u64, signed: bool) -> Result<DecodedNode, DecodedNode> {
        let value = self.scalar_slot(ptr, slot::LONG_VALUE)?;
        let size_minus_one = self.scalar_slot(ptr, slot::LONG_SIZE)?;
        let bits = size_minus_one.wrapping_add(1) as u32;
        Ok(if signed {
            DecodedNode::Long {
                value: value as i64,
                bits,
            }
        } else {
            DecodedNode::Ulong { value, bits }
        })
    }

    pub fn decode_str(&self, ptr: u64) -> DecodedNode {
        self.str_body(ptr).unwrap_or_else(|bad| bad)
    }

    fn str_body(&self, ptr: u64) -> Result<DecodedNode, DecodedNode> {
        let data_ptr = self.scalar_slot(ptr, slot::STR_DATA)?;
        let mut data = Vec::new();
        while data.len() < self.limits.max_str_bytes {
            match self
                .reader
                .read_bytes(data_ptr.wrapping_add(data.len() as u64), 1)
            {
                Ok(byte) if byte[0] == 0 => break,
                Ok(byte) => data.push(byte[0]),
                Err(err) if data.is_empty() => {
                    debug!(data_ptr, %err, "string payload unreadable");
                    return Err(DecodedNode::BadPointer(data_ptr));
                }
                // Keep whatever prefix was readable.
                Err(_) => break,
            }
        }
        Ok(DecodedNode::Str {
            data: String::from_utf8_lossy(&data).into_owned(),
        })
    }

    pub fn decode_offset(&self, ptr: u64, depth: usize) -> DecodedNode {
        DecodedNode::Offset {
            magnitude: Box::new(self.value_slot(ptr, slot::OFF_MAGNITUDE, depth + 1)),
            unit: Box::new(self.value_slot(ptr, slot::OFF_UNIT, depth + 1)),
        }
    }

    pub fn decode_array(&self, ptr: u64, depth: usize) -> DecodedNode {
        self.array_body(ptr, depth).unwrap_or_else(|bad| bad)
    }

    fn array_body(&self, ptr: u64, depth: usize) -> Result<DecodedNode, DecodedNode> {
        let nelem = self.scalar_slot(ptr, slot::ARR_NELEM)?;
        let elems_ptr = self.scalar_slot(ptr, slot::ARR_ELEMS)?;
        let (elems, truncated) = self.walk_values(elems_ptr, nelem, depth + 1);
        Ok(DecodedNode::Array { elems, truncated })
    }

    pub fn decode_struct(&self, ptr: u64, depth: usize) -> DecodedNode {
        self.struct_body(ptr, depth).unwrap_or_else(|bad| bad)
    }

    fn struct_body(&self, ptr: u64, depth: usize) -> Result<DecodedNode, DecodedNode> {
        let ty = self.value_slot(ptr, slot::SCT_TYPE, depth + 1);
        let nfields = self.scalar_slot(ptr, slot::SCT_NFIELDS)?;
        let nmethods = self.scalar_slot(ptr, slot::SCT_NMETHODS)?;
        let fields_ptr = self.scalar_slot(ptr, slot::SCT_FIELDS)?;
        let methods_ptr = self.scalar_slot(ptr, slot::SCT_METHODS)?;
        let (fields, fields_truncated) = self.walk_values(fields_ptr, nfields, depth + 1);
        let (methods, methods_truncated) = self.walk_values(methods_ptr, nmethods, depth + 1);
        Ok(DecodedNode::Struct {
            ty: Box::new(ty),
            nfields,
            nmethods,
            fields,
            methods,
            fields_truncated,
            methods_truncated,
        })
    }

    pub fn decode_type(&self, ptr: u64, depth: usize) -> DecodedNode {
        self.type_body(ptr, depth).unwrap_or_else(|bad| bad)
    }

    fn type_body(&self, ptr: u64, depth: usize) -> Result<DecodedNode, DecodedNode> {
        let code = self.scalar_slot(ptr, slot::TYP_CODE)?;
        let node = match TypeCode::from_code(code) {
            Some(TypeCode::Integral) => TypeNode::Integral {
                bits: self.scalar_slot(ptr, slot::TYP_INTEGRAL_SIZE)?,
                signed: self.scalar_slot(ptr, slot::TYP_INTEGRAL_SIGNED)? != 0,
            },
            Some(TypeCode::String) => TypeNode::Str,
            Some(TypeCode::Array) => TypeNode::Array {
                elem: Box::new(self.value_slot(ptr, slot::TYP_PAYLOAD, depth + 1)),
            },
            Some(TypeCode::Struct) => TypeNode::Struct {
                name: Box::new(self.value_slot(ptr, slot::TYP_PAYLOAD, depth + 1)),
            },
            Some(TypeCode::Offset) => TypeNode::Offset {
                base: Box::new(self.value_slot(ptr, slot::TYP_PAYLOAD, depth + 1)),
            },
            // The closure type payload layout is unsettled; identify it and
            // read nothing further.
            Some(TypeCode::Closure) => TypeNode::Closure,
            Some(TypeCode::Void) => TypeNode::Void,
            None => {
                debug!(ptr, code, "type descriptor code out of range");
                return Ok(DecodedNode::UnknownTypeCode { code });
            }
        };
        Ok(DecodedNode::Type(node))
    }

    pub fn decode_closure(&self, ptr: u64, depth: usize) -> DecodedNode {
        DecodedNode::Closure {
            name: Box::new(self.value_slot(ptr, slot::CLS_NAME, depth + 1)),
            env: Box::new(self.value_slot(ptr, slot::CLS_ENV, depth + 1)),
            program: Box::new(self.value_slot(ptr, slot::CLS_PROGRAM, depth + 1)),
        }
    }

    pub fn decode_iarray(&self, ptr: u64, depth: usize) -> DecodedNode {
        self.iarray_body(ptr, depth).unwrap_or_else(|bad| bad)
    }

    fn iarray_body(&self, ptr: u64, depth: usize) -> Result<DecodedNode, DecodedNode> {
        let nallocated = self.scalar_slot(ptr, slot::IAR_NALLOCATED)?;
        let nelem = self.scalar_slot(ptr, slot::IAR_NELEM)?;
        let elems_ptr = self.scalar_slot(ptr, slot::IAR_ELEMS)?;
        let (elems, truncated) = self.walk_values(elems_ptr, nelem, depth + 1);
        Ok(DecodedNode::IncrArray {
            nallocated,
            nelem,
            elems,
            truncated,
        })
    }

    pub fn decode_env(&self, ptr: u64, depth: usize) -> DecodedNode {
        DecodedNode::Env {
            vars: Box::new(self.value_slot(ptr, slot::ENV_VARS, depth + 1)),
            parent: Box::new(self.value_slot(ptr, slot::ENV_PARENT, depth + 1)),
        }
    }

    /// Read a plain integer/pointer slot. A failure aborts the enclosing
    /// variant with a BadPointer at the slot address.
    fn scalar_slot(&self, base: u64, slot: u64) -> Result<u64, DecodedNode> {
        let addr = slot_addr(base, slot);
        self.reader.read_word(addr).map_err(|err| {
            debug!(addr, %err, "field slot unreadable");
            DecodedNode::BadPointer(addr)
        })
    }

    /// Read a slot holding a full tagged word and decode it. A failure
    /// degrades that sub-value only.
    fn value_slot(&self, base: u64, slot: u64, depth: usize) -> DecodedNode {
        let addr = slot_addr(base, slot);
        match self.reader.read_word(addr) {
            Ok(word) => self.decode_value(word, depth),
            Err(err) => {
                debug!(addr, %err, "value slot unreadable");
                DecodedNode::BadPointer(addr)
            }
        }
    }

    /// Decode up to `max_elems` value words from a contiguous run, returning
    /// the decoded prefix and how many elements were left untouched.
    fn walk_values(&self, elems_ptr: u64, count: u64, depth: usize) -> (Vec<DecodedNode>, u64) {
        let walk = count.min(self.limits.max_elems);
        let elems = (0..walk)
            .map(|index| self.value_slot(elems_ptr, index, depth))
            .collect();
        (elems, count - walk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmi_core::{make_int, make_uint, MemImage};

    #[test]
    fn immediates_decode_without_touching_memory() {
        let image = MemImage::new(0x1000);
        let decoder = Decoder::new(&image);
        assert_eq!(
            decoder.decode(make_int(5, 25)),
            DecodedNode::Int { value: 5, bits: 25 }
        );
        assert_eq!(
            decoder.decode(make_uint(9, 3)),
            DecodedNode::Uint { value: 9, bits: 3 }
        );
    }

    #[test]
    fn sentinels_decode_without_dereference() {
        let image = MemImage::new(0x1000);
        let decoder = Decoder::new(&image);
        assert_eq!(
            decoder.decode(Sentinel::BROKEN_HEART),
            DecodedNode::Sentinel(Sentinel::BrokenHeart)
        );
    }

    #[test]
    fn depth_zero_budget_truncates_immediately() {
        let image = MemImage::new(0x1000);
        let limits = DecodeLimits {
            max_depth: 0,
            ..DecodeLimits::default()
        };
        let decoder = Decoder::with_limits(&image, limits);
        assert_eq!(decoder.decode(make_int(1, 32)), DecodedNode::DepthLimit);
    }
}
