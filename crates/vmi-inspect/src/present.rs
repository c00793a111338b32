use itertools::Itertools;
use serde::Serialize;
use vmi_core::{DecodedNode, TypeNode};

/// How the host should render a presentation: one line, a key/value
/// collection, or an ordered collection. Fixed per variant so host-side
/// rendering is stable across invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayHint {
    Scalar,
    Mapping,
    Sequence,
}

/// The host display contract for one inspected value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Presentation {
    pub summary: String,
    pub fields: Vec<(String, Presentation)>,
    pub hint: DisplayHint,
}

impl Presentation {
    fn scalar(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            fields: Vec::new(),
            hint: DisplayHint::Scalar,
        }
    }

    fn mapping(summary: impl Into<String>, fields: Vec<(String, Presentation)>) -> Self {
        Self {
            summary: summary.into(),
            fields,
            hint: DisplayHint::Mapping,
        }
    }
}

/// Render a decoded node tree. Pure and deterministic: presenting the same
/// tree twice yields identical output, and every node, including the
/// recovery variants, yields a non-empty summary.
pub fn present(node: &DecodedNode) -> Presentation {
    match node {
        DecodedNode::Int { value, bits } => {
            Presentation::scalar(format!("{value} as int<{bits}>"))
        }
        DecodedNode::Uint { value, bits } => {
            Presentation::scalar(format!("{value} as uint<{bits}>"))
        }
        DecodedNode::Long { value, bits } => {
            Presentation::scalar(format!("{value} as long<{bits}>"))
        }
        DecodedNode::Ulong { value, bits } => {
            Presentation::scalar(format!("{value} as ulong<{bits}>"))
        }
        DecodedNode::Str { data } => Presentation {
            summary: data.clone(),
            fields: vec![("data".to_string(), Presentation::scalar(data.clone()))],
            hint: DisplayHint::Scalar,
        },
        DecodedNode::Offset { magnitude, unit } => Presentation::mapping(
            "offset",
            vec![
                ("magnitude".to_string(), present(magnitude)),
                ("unit".to_string(), present(unit)),
            ],
        ),
        DecodedNode::Array { elems, truncated } => present_sequence(
            format!("array[{}]", elems.len() as u64 + truncated),
            elems,
            *truncated,
        ),
        DecodedNode::Struct {
            ty,
            nfields,
            nmethods,
            fields,
            methods,
            fields_truncated,
            methods_truncated,
        } => Presentation::mapping(
            "struct",
            vec![
                ("type".to_string(), present(ty)),
                ("nfields".to_string(), Presentation::scalar(nfields.to_string())),
                ("nmethods".to_string(), Presentation::scalar(nmethods.to_string())),
                (
                    "fields".to_string(),
                    present_sequence(format!("{nfields} fields"), fields, *fields_truncated),
                ),
                (
                    "methods".to_string(),
                    present_sequence(format!("{nmethods} methods"), methods, *methods_truncated),
                ),
            ],
        ),
        DecodedNode::Type(ty) => present_type(ty),
        DecodedNode::Closure { name, env, program } => Presentation::mapping(
            "closure",
            vec![
                ("name".to_string(), present(name)),
                ("env".to_string(), present(env)),
                ("program".to_string(), present(program)),
            ],
        ),
        DecodedNode::IncrArray {
            nallocated,
            nelem,
            elems,
            truncated,
        } => present_sequence(
            format!("iarray (nelem {nelem}, nallocated {nallocated})"),
            elems,
            *truncated,
        ),
        DecodedNode::Env { vars, parent } => Presentation::mapping(
            "environment",
            vec![
                ("vars".to_string(), present(vars)),
                ("parent".to_string(), present(parent)),
            ],
        ),
        DecodedNode::Program { addr } => Presentation::scalar(format!("program@{addr:#x}")),
        DecodedNode::Sentinel(sentinel) => Presentation::scalar(sentinel.to_string()),
        DecodedNode::Garbage(word) => Presentation::scalar(format!("garbage:{word:#x}")),
        DecodedNode::BadPointer(addr) => {
            Presentation::scalar(format!("unreadable memory at {addr:#x}"))
        }
        DecodedNode::UnknownBox { code } => {
            Presentation::scalar(format!("unknown box type {code:#x}"))
        }
        DecodedNode::UnknownTypeCode { code } => {
            Presentation::scalar(format!("unknown type code {code:#x}"))
        }
        DecodedNode::Relocated => Presentation::scalar("relocated by gc (broken heart)"),
        DecodedNode::DepthLimit => Presentation::scalar("... (depth limit reached)"),
    }
}

fn present_type(ty: &TypeNode) -> Presentation {
    match ty {
        TypeNode::Integral { bits, signed } => Presentation::mapping(
            "integral type",
            vec![
                ("size".to_string(), Presentation::scalar(bits.to_string())),
                ("signed".to_string(), Presentation::scalar(signed.to_string())),
            ],
        ),
        TypeNode::Str => Presentation::mapping("string type", Vec::new()),
        TypeNode::Array { elem } => Presentation::mapping(
            "array type",
            vec![("element".to_string(), present(elem))],
        ),
        TypeNode::Struct { name } => {
            Presentation::mapping("struct type", vec![("name".to_string(), present(name))])
        }
        TypeNode::Offset { base } => {
            Presentation::mapping("offset type", vec![("base".to_string(), present(base))])
        }
        TypeNode::Closure => Presentation::mapping("closure type (opaque)", Vec::new()),
        TypeNode::Void => Presentation::mapping("void type", Vec::new()),
    }
}

fn present_sequence(summary: String, elems: &[DecodedNode], truncated: u64) -> Presentation {
    let mut fields = elems
        .iter()
        .enumerate()
        .map(|(index, elem)| (index.to_string(), present(elem)))
        .collect_vec();
    if truncated > 0 {
        fields.push((
            "...".to_string(),
            Presentation::scalar(format!("{truncated} more elements")),
        ));
    }
    Presentation {
        summary,
        fields,
        hint: DisplayHint::Sequence,
    }
}
