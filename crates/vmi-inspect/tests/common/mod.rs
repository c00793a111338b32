#![allow(dead_code)]

//! Builders for synthetic memory images holding boxed values.

use vmi_core::layout::BoxKind;
use vmi_core::{make_boxed, MemImage, Sentinel};

pub const BASE: u64 = 0x1000;

pub fn image() -> MemImage {
    MemImage::new(BASE)
}

/// Append a box and return the tagged word referencing it.
fn boxed(image: &mut MemImage, words: &[u64]) -> u64 {
    make_boxed(image.append_words(words))
}

pub fn long_box(image: &mut MemImage, value: i64, bits: u64) -> u64 {
    boxed(image, &[BoxKind::Long.code(), value as u64, bits - 1])
}

pub fn ulong_box(image: &mut MemImage, value: u64, bits: u64) -> u64 {
    boxed(image, &[BoxKind::Ulong.code(), value, bits - 1])
}

pub fn str_box(image: &mut MemImage, text: &str) -> u64 {
    let mut data = text.as_bytes().to_vec();
    data.push(0);
    let data_ptr = image.append_bytes(&data);
    boxed(image, &[BoxKind::Str.code(), data_ptr])
}

pub fn offset_box(image: &mut MemImage, unit: u64, magnitude: u64) -> u64 {
    boxed(image, &[BoxKind::Offset.code(), unit, magnitude])
}

pub fn array_box(image: &mut MemImage, elems: &[u64]) -> u64 {
    let elems_ptr = image.append_words(elems);
    boxed(
        image,
        &[
            BoxKind::Array.code(),
            elems.len() as u64,
            elems.len() as u64,
            elems_ptr,
        ],
    )
}

pub fn struct_box(image: &mut MemImage, ty: u64, fields: &[u64], methods: &[u64]) -> u64 {
    let fields_ptr = image.append_words(fields);
    let methods_ptr = image.append_words(methods);
    boxed(
        image,
        &[
            BoxKind::Struct.code(),
            ty,
            fields.len() as u64,
            methods.len() as u64,
            fields_ptr,
            methods_ptr,
        ],
    )
}

pub fn integral_type_box(image: &mut MemImage, bits: u64, signed: bool) -> u64 {
    boxed(image, &[BoxKind::Type.code(), 0, bits, signed as u64])
}

/// A type descriptor with an arbitrary discriminant and one payload slot.
pub fn type_box(image: &mut MemImage, code: u64, payload: u64) -> u64 {
    boxed(image, &[BoxKind::Type.code(), code, payload])
}

pub fn closure_box(image: &mut MemImage, name: u64, env: u64, program: u64) -> u64 {
    boxed(image, &[BoxKind::Closure.code(), name, env, program])
}

/// An incremental array whose claimed element count may exceed the values
/// actually laid out.
pub fn iarray_box(
    image: &mut MemImage,
    nallocated: u64,
    nelem: u64,
    elems: &[u64],
) -> u64 {
    let elems_ptr = image.append_words(elems);
    boxed(
        image,
        &[BoxKind::IncrArray.code(), nallocated, nelem, elems_ptr],
    )
}

pub fn env_box(image: &mut MemImage, vars: u64, parent: u64) -> u64 {
    boxed(image, &[BoxKind::Env.code(), vars, parent])
}

pub fn program_box(image: &mut MemImage) -> u64 {
    boxed(image, &[BoxKind::Program.code()])
}

pub fn null_word() -> u64 {
    Sentinel::NULL
}
