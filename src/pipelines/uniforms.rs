//! Named uniform blocks.
//!
//! Programs expose their parameters by GL-style names (`"InColor"`,
//! `"pointLight.position"`). A [`UniformBlock`] maps those names onto byte
//! offsets that follow WGSL's uniform address-space layout, so the bytes can
//! be copied verbatim into the program's uniform buffer:
//!
//! - `vec3` is 16-aligned and 12 bytes long, scalars are 4-aligned
//! - a dotted prefix (`pointLight.`) denotes a nested struct, which starts and
//!   ends on a 16 byte boundary
//!
//! Setting a name the block doesn't know, or setting it with the wrong type,
//! does nothing.

use std::{collections::HashMap, ops::Range};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformKind {
    /// Stored as a `u32` (WGSL has no host-shareable `bool`).
    Bool,
    Int,
    Float,
    Vec3,
}

impl UniformKind {
    fn align(self) -> usize {
        match self {
            UniformKind::Vec3 => 16,
            _ => 4,
        }
    }

    fn size(self) -> usize {
        match self {
            UniformKind::Vec3 => 12,
            _ => 4,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct UniformField {
    pub name: &'static str,
    pub kind: UniformKind,
}

pub const fn field(name: &'static str, kind: UniformKind) -> UniformField {
    UniformField { name, kind }
}

const STRUCT_ALIGN: usize = 16;

fn round_up(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}

#[derive(Clone, Debug)]
pub struct UniformBlock {
    slots: HashMap<&'static str, (usize, UniformKind)>,
    data: Vec<u8>,
}

impl UniformBlock {
    pub fn new(fields: &[UniformField]) -> Self {
        let mut slots = HashMap::with_capacity(fields.len());
        let mut offset = 0;
        let mut current_struct = None;
        for field in fields {
            let prefix = field.name.split_once('.').map(|(prefix, _)| prefix);
            if prefix != current_struct {
                offset = round_up(offset, STRUCT_ALIGN);
                current_struct = prefix;
            }
            offset = round_up(offset, field.kind.align());
            if slots.insert(field.name, (offset, field.kind)).is_some() {
                log::warn!("uniform {} is declared twice", field.name);
            }
            offset += field.kind.size();
        }
        // an empty block still needs a bindable buffer
        let size = round_up(offset.max(1), STRUCT_ALIGN);
        Self {
            slots,
            data: vec![0; size],
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn offset_of(&self, name: &str) -> Option<usize> {
        self.slots.get(name).map(|(offset, _)| *offset)
    }

    pub fn set_bool(&mut self, name: &str, value: bool) -> Option<Range<usize>> {
        self.write(name, UniformKind::Bool, bytemuck::bytes_of(&(value as u32)))
    }

    pub fn set_int(&mut self, name: &str, value: i32) -> Option<Range<usize>> {
        self.write(name, UniformKind::Int, bytemuck::bytes_of(&value))
    }

    pub fn set_float(&mut self, name: &str, value: f32) -> Option<Range<usize>> {
        self.write(name, UniformKind::Float, bytemuck::bytes_of(&value))
    }

    pub fn set_vec3(&mut self, name: &str, value: [f32; 3]) -> Option<Range<usize>> {
        self.write(name, UniformKind::Vec3, bytemuck::cast_slice(&value))
    }

    /// Returns the byte range that changed, if any.
    fn write(&mut self, name: &str, kind: UniformKind, bytes: &[u8]) -> Option<Range<usize>> {
        match self.slots.get(name) {
            Some(&(offset, declared)) if declared == kind => {
                let range = offset..offset + bytes.len();
                self.data[range.clone()].copy_from_slice(bytes);
                Some(range)
            }
            Some((_, declared)) => {
                log::debug!("uniform {name} is a {declared:?}, not a {kind:?}");
                None
            }
            None => {
                log::debug!("no uniform named {name}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::phong::PHONG_UNIFORMS;

    #[test]
    fn scalars_pack_after_vec3() {
        let block = UniformBlock::new(&[
            field("color", UniformKind::Vec3),
            field("strength", UniformKind::Float),
            field("enabled", UniformKind::Bool),
        ]);
        assert_eq!(block.offset_of("color"), Some(0));
        assert_eq!(block.offset_of("strength"), Some(12));
        assert_eq!(block.offset_of("enabled"), Some(16));
        assert_eq!(block.size(), 32);
    }

    #[test]
    fn phong_block_matches_wgsl_layout() {
        let block = UniformBlock::new(PHONG_UNIFORMS);
        let expected = [
            ("ViewPos", 0),
            ("paraLight.direction", 16),
            ("paraLight.specular", 64),
            ("pointLight.position", 80),
            ("pointLight.constant", 140),
            ("pointLight.linear", 144),
            ("pointLight.quadratic", 148),
            ("spotLight.position", 160),
            ("spotLight.innerCutOff", 220),
            ("spotLight.outerCutOff", 224),
            ("material.shininess", 240),
        ];
        for (name, offset) in expected {
            assert_eq!(block.offset_of(name), Some(offset), "{name}");
        }
        assert_eq!(block.size(), 256);
    }

    #[test]
    fn setters_write_little_endian_values() {
        let mut block = UniformBlock::new(&[
            field("InColor", UniformKind::Vec3),
            field("count", UniformKind::Int),
            field("enabled", UniformKind::Bool),
        ]);
        assert_eq!(block.set_vec3("InColor", [1.0, 0.5, 0.25]), Some(0..12));
        assert_eq!(block.set_int("count", -3), Some(12..16));
        let floats: Vec<f32> = block.bytes()[0..12]
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        assert_eq!(floats, vec![1.0, 0.5, 0.25]);
        assert_eq!(block.bytes()[12..16], (-3i32).to_le_bytes());
        assert_eq!(block.set_bool("enabled", true), Some(16..20));
        assert_eq!(block.bytes()[16..20], 1u32.to_le_bytes());
        block.set_bool("enabled", false);
        assert_eq!(block.bytes()[16..20], 0u32.to_le_bytes());
    }

    #[test]
    fn unknown_or_mistyped_names_are_ignored() {
        let mut block = UniformBlock::new(&[field("shininess", UniformKind::Float)]);
        let before = block.bytes().to_vec();
        assert_eq!(block.set_float("shine", 32.0), None);
        assert_eq!(block.set_vec3("shininess", [1.0; 3]), None);
        assert_eq!(block.bytes(), before.as_slice());
    }

    #[test]
    fn empty_block_is_still_bindable() {
        let block = UniformBlock::new(&[]);
        assert_eq!(block.size(), 16);
    }
}
