// LayoutNode: evaluation output tree describing decoded binary regions

use crate::ast::Endianness;

/// A node in the evaluation result tree. Each node describes one concrete
/// byte range discovered in the underlying data.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    /// Declaration name of this region.
    pub name: String,
    /// Type name (e.g. "u32", "Header", "Color[4]").
    pub type_name: String,
    /// Absolute byte offset in the byte source.
    pub offset: u64,
    /// Size in bytes.
    pub size: u64,
    /// Byte order the region was decoded with.
    pub endian: Endianness,
    /// Optional display tag.
    pub comment: Option<String>,
    /// Decoded value.
    pub value: LayoutValue,
    /// Child nodes (struct members, union members, array elements,
    /// bitfield sub-fields).
    pub children: Vec<LayoutNode>,
}

/// The decoded value of a layout node.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutValue {
    Unsigned(u128),
    Signed(i128),
    Float(f64),
    Bool(bool),
    Char(char),
    /// Struct region; children hold the members at strictly increasing
    /// offsets.
    Struct,
    /// Union region; every child shares the union's own offset.
    Union,
    /// Enum region: raw underlying value plus the matched constant name,
    /// or `None` when no constant matched.
    Enum { value: u128, name: Option<String> },
    /// Bitfield storage unit; children are `BitfieldField` nodes.
    Bitfield,
    /// One named sub-field of a bitfield.
    BitfieldField {
        bit_offset: u64,
        bit_width: u64,
        value: u128,
    },
    /// Array region; children hold the elements.
    Array,
    /// Pointer region: the stored address value and the owned subtree
    /// evaluated at the target address.
    Pointer {
        address: u64,
        pointee: Box<LayoutNode>,
    },
}

impl LayoutNode {
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        offset: u64,
        size: u64,
        endian: Endianness,
        value: LayoutValue,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            offset,
            size,
            endian,
            comment: None,
            value,
            children: Vec::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_child(mut self, child: LayoutNode) -> Self {
        self.children.push(child);
        self
    }

    /// Resolved enum constant name, or "unmatched" for display purposes.
    pub fn enum_name(&self) -> Option<&str> {
        match &self.value {
            LayoutValue::Enum { name, .. } => {
                Some(name.as_deref().unwrap_or("unmatched"))
            }
            _ => None,
        }
    }
}
