//! Error types for the hingeviz core

use thiserror::Error;

use crate::animation::AnimationKind;

/// Errors surfaced by the core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HingevizError {
    #[error("joint {index} does not exist (assembly has {count} joints)")]
    UnknownJoint { index: usize, count: usize },

    #[error("{assembly} does not support the {kind:?} animation")]
    UnsupportedAnimation {
        assembly: &'static str,
        kind: AnimationKind,
    },

    #[error(
        "attribute lengths diverged: {positions} positions, {colors} colors, \
         {normals} normals, {texcoords} texcoords"
    )]
    BufferLengthMismatch {
        positions: usize,
        colors: usize,
        normals: usize,
        texcoords: usize,
    },

    #[error("index {index} at slot {slot} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        slot: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("index count {0} is not a multiple of three")]
    IncompleteTriangle(usize),

    #[error("rendering backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("texture load failed: {0}")]
    TextureLoad(String),

    #[error("unknown {what} {name:?} (expected {expected})")]
    UnknownName {
        what: &'static str,
        name: String,
        expected: &'static str,
    },
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, HingevizError>;
