// Evaluator: walks the syntax tree once, front to back, decoding the byte
// source into a tree of layout nodes.

mod builtins;
mod cursor;
mod endian;
mod expr;
mod layout;
mod registry;
mod source;
mod value;

pub use builtins::Arity;
pub use cursor::Cursor;
pub use endian::EndianStack;
pub use layout::{LayoutNode, LayoutValue};
pub use registry::{TypeDef, TypeRegistry};
pub use source::{ByteSource, SliceSource};
pub use value::Value;

use rustc_hash::FxHashMap;

use crate::ast::*;
use crate::console::ConsoleLog;
use crate::error::EvalError;

use builtins::{assemble_unsigned, sign_extend, FunctionTable};

const DEFAULT_MAX_RECURSION: u32 = 64;

/// Walks a parsed template and decodes the byte source it describes.
///
/// One evaluator can run many passes over the same source (e.g. after the
/// template is re-edited); every pass starts from fresh state.
pub struct Evaluator<'a> {
    source: &'a dyn ByteSource,
    cursor: Cursor,
    endian: EndianStack,
    registry: TypeRegistry<'a>,
    functions: FunctionTable,
    /// One frame per composite type currently being evaluated. Member
    /// values land in the innermost frame and vanish when it pops.
    scopes: Vec<FxHashMap<String, Value>>,
    /// Values of top-level declarations, visible everywhere below them.
    globals: FxHashMap<String, Value>,
    console: ConsoleLog,
    default_endian: Endianness,
    recursion_depth: u32,
    max_recursion_depth: u32,
    /// Offset added to every pointer target before following it.
    pointer_base: u64,
}

impl<'a> Evaluator<'a> {
    pub fn new(source: &'a dyn ByteSource, default_endian: Endianness) -> Self {
        Self {
            source,
            cursor: Cursor::new(source.size()),
            endian: EndianStack::new(default_endian),
            registry: TypeRegistry::new(),
            functions: FunctionTable::with_builtins(),
            scopes: Vec::new(),
            globals: FxHashMap::default(),
            console: ConsoleLog::new(),
            default_endian,
            recursion_depth: 0,
            max_recursion_depth: DEFAULT_MAX_RECURSION,
            pointer_base: 0,
        }
    }

    /// Evaluate a whole template. Returns the root layout nodes on success;
    /// on any semantic error the pass yields `None` and the error text is
    /// appended to the console log.
    pub fn evaluate(&mut self, ast: &'a [AstNode]) -> Option<Vec<LayoutNode>> {
        self.reset();
        match self.run_pass(ast) {
            Ok(nodes) => {
                self.console
                    .debug(format!("pass complete: {} root node(s)", nodes.len()));
                Some(nodes)
            }
            Err(err) => {
                self.console.error(err.to_string());
                None
            }
        }
    }

    pub fn console(&self) -> &ConsoleLog {
        &self.console
    }

    pub fn set_max_recursion_depth(&mut self, depth: u32) {
        self.max_recursion_depth = depth;
    }

    pub fn set_pointer_base(&mut self, base: u64) {
        self.pointer_base = base;
    }

    fn reset(&mut self) {
        self.cursor = Cursor::new(self.source.size());
        self.endian = EndianStack::new(self.default_endian);
        self.registry.clear();
        self.scopes.clear();
        self.globals.clear();
        self.console.clear();
        self.recursion_depth = 0;
    }

    fn run_pass(&mut self, ast: &'a [AstNode]) -> Result<Vec<LayoutNode>, EvalError> {
        let mut nodes = Vec::new();
        for node in ast {
            if let Some(result) = self.eval_member(node, true)? {
                self.record_node_value(&result);
                nodes.push(result);
            }
        }
        Ok(nodes)
    }

    /// Evaluate one declaration. `advance` controls whether the cursor keeps
    /// the position reached by the member (struct semantics) or snaps back
    /// to where it was (union semantics). Placed declarations never advance,
    /// whatever the caller asked for.
    fn eval_member(
        &mut self,
        node: &'a AstNode,
        advance: bool,
    ) -> Result<Option<LayoutNode>, EvalError> {
        if let Some(placement) = node.placement() {
            let target = self.eval_operand(placement)?.to_unsigned()? as u64;
            let saved = self.cursor.snapshot();
            self.cursor.jump(target)?;
            let result = self.eval_member_inner(node);
            self.cursor.restore(saved);
            return result;
        }
        if advance {
            self.eval_member_inner(node)
        } else {
            let saved = self.cursor.snapshot();
            let result = self.eval_member_inner(node);
            self.cursor.restore(saved);
            result
        }
    }

    fn eval_member_inner(&mut self, node: &'a AstNode) -> Result<Option<LayoutNode>, EvalError> {
        match node {
            AstNode::Struct(def) => {
                self.registry.register(&def.name, TypeDef::Struct(def))?;
                Ok(None)
            }
            AstNode::Union(def) => {
                self.registry.register(&def.name, TypeDef::Union(def))?;
                Ok(None)
            }
            AstNode::Enum(def) => {
                self.registry.register(&def.name, TypeDef::Enum(def))?;
                Ok(None)
            }
            AstNode::Bitfield(def) => {
                self.registry.register(&def.name, TypeDef::Bitfield(def))?;
                Ok(None)
            }
            AstNode::Typedef { name, ty } => {
                self.registry.register(name, TypeDef::Alias(ty))?;
                Ok(None)
            }
            AstNode::Variable(decl) => self.eval_typed(&decl.name, &decl.ty).map(Some),
            AstNode::Array(decl) => self.eval_array(decl).map(Some),
            AstNode::Pointer(decl) => self.eval_pointer(decl).map(Some),
            AstNode::ExprStmt(expr) => {
                self.eval_statement(expr)?;
                Ok(None)
            }
        }
    }

    /// Expression in statement position: evaluated for its side effects,
    /// any produced value is discarded.
    fn eval_statement(&mut self, expr: &Expr) -> Result<(), EvalError> {
        match expr {
            Expr::Call { name, args } => {
                self.eval_function_call(name, args)?;
            }
            other => {
                self.eval_operand(other)?;
            }
        }
        Ok(())
    }

    /// Evaluate a named region of the given type at the current cursor
    /// position. The recursion guard lives here so it covers every way types
    /// can nest (members, aliases, arrays, pointees).
    fn eval_typed(&mut self, name: &str, ty: &'a TypeExpr) -> Result<LayoutNode, EvalError> {
        if self.recursion_depth >= self.max_recursion_depth {
            return Err(EvalError::RecursionLimit(self.max_recursion_depth));
        }
        self.recursion_depth += 1;
        let result = self.eval_typed_inner(name, ty);
        self.recursion_depth -= 1;
        result
    }

    fn eval_typed_inner(&mut self, name: &str, ty: &'a TypeExpr) -> Result<LayoutNode, EvalError> {
        match ty {
            TypeExpr::Builtin(builtin) => self.eval_builtin_type(name, *builtin),
            TypeExpr::Named(type_name) => match self.registry.resolve(type_name)? {
                TypeDef::Struct(def) => self.eval_struct(name, def),
                TypeDef::Union(def) => self.eval_union(name, def),
                TypeDef::Enum(def) => self.eval_enum(name, def),
                TypeDef::Bitfield(def) => self.eval_bitfield(name, def),
                TypeDef::Alias(inner) => {
                    // The region reports the alias name, not what it unwraps to
                    let mut node = self.eval_typed(name, inner)?;
                    node.type_name = type_name.clone();
                    Ok(node)
                }
            },
            TypeExpr::Endian(endian, inner) => {
                self.endian.push(*endian);
                let result = self.eval_typed(name, inner);
                self.endian.pop();
                result
            }
        }
    }

    fn eval_builtin_type(&mut self, name: &str, ty: BuiltinType) -> Result<LayoutNode, EvalError> {
        let offset = self.cursor.position();
        let size = ty.size();
        let endian = self.endian.current();
        let bytes = self.source.read(offset, size)?;
        let raw = assemble_unsigned(&bytes, endian);
        let value = match ty {
            BuiltinType::U8
            | BuiltinType::U16
            | BuiltinType::U32
            | BuiltinType::U64
            | BuiltinType::U128 => LayoutValue::Unsigned(raw),
            BuiltinType::S8
            | BuiltinType::S16
            | BuiltinType::S32
            | BuiltinType::S64
            | BuiltinType::S128 => LayoutValue::Signed(sign_extend(raw, size * 8)),
            BuiltinType::Float => LayoutValue::Float(f32::from_bits(raw as u32) as f64),
            BuiltinType::Double => LayoutValue::Float(f64::from_bits(raw as u64)),
            BuiltinType::Char => LayoutValue::Char(raw as u8 as char),
            BuiltinType::Bool => LayoutValue::Bool(raw != 0),
        };
        self.cursor.advance(size)?;
        Ok(LayoutNode::new(name, ty.name(), offset, size, endian, value))
    }

    fn eval_struct(&mut self, name: &str, def: &'a StructDef) -> Result<LayoutNode, EvalError> {
        let entry = self.cursor.position();
        let endian = self.endian.current();
        self.scopes.push(FxHashMap::default());
        let mut children = Vec::new();
        let mut outcome = Ok(());
        for member in &def.members {
            match self.eval_member(member, true) {
                Ok(Some(child)) => {
                    self.record_node_value(&child);
                    children.push(child);
                }
                Ok(None) => {}
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            }
        }
        self.scopes.pop();
        outcome?;
        let size = self.cursor.position() - entry;
        let mut node = LayoutNode::new(name, &def.name, entry, size, endian, LayoutValue::Struct);
        node.children = children;
        Ok(node)
    }

    fn eval_union(&mut self, name: &str, def: &'a UnionDef) -> Result<LayoutNode, EvalError> {
        let entry = self.cursor.position();
        let endian = self.endian.current();
        self.scopes.push(FxHashMap::default());
        let mut children = Vec::new();
        let mut max_size = 0u64;
        let mut outcome = Ok(());
        for member in &def.members {
            // Every member starts at the union's own offset
            match self.eval_member(member, false) {
                Ok(Some(child)) => {
                    self.record_node_value(&child);
                    if member.placement().is_none() {
                        max_size = max_size.max(child.size);
                    }
                    children.push(child);
                }
                Ok(None) => {}
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            }
        }
        self.scopes.pop();
        outcome?;
        self.cursor.restore(entry);
        self.cursor.advance(max_size)?;
        let mut node = LayoutNode::new(name, &def.name, entry, max_size, endian, LayoutValue::Union);
        node.children = children;
        Ok(node)
    }

    fn eval_enum(&mut self, name: &str, def: &'a EnumDef) -> Result<LayoutNode, EvalError> {
        let offset = self.cursor.position();
        let size = def.underlying.size();
        let endian = self.endian.current();
        let bytes = self.source.read(offset, size)?;
        let raw = assemble_unsigned(&bytes, endian);
        let normalized = if def.underlying.is_signed() {
            sign_extend(raw, size * 8)
        } else {
            raw as i128
        };
        let mut matched = None;
        for (entry_name, value) in self.enum_entry_values(def)? {
            if value == normalized {
                matched = Some(entry_name);
                break;
            }
        }
        self.cursor.advance(size)?;
        Ok(LayoutNode::new(
            name,
            &def.name,
            offset,
            size,
            endian,
            LayoutValue::Enum {
                value: raw,
                name: matched,
            },
        ))
    }

    fn eval_bitfield(&mut self, name: &str, def: &'a BitfieldDef) -> Result<LayoutNode, EvalError> {
        let offset = self.cursor.position();
        let size = def.storage.size();
        let endian = self.endian.current();
        let bytes = self.source.read(offset, size)?;
        let raw = assemble_unsigned(&bytes, endian);
        let total_bits = size * 8;
        let mut node = LayoutNode::new(name, &def.name, offset, size, endian, LayoutValue::Bitfield);
        let mut bit_offset = 0u64;
        for (field_name, width_expr) in &def.fields {
            let width = self.eval_operand(width_expr)?.to_unsigned()? as u64;
            if width == 0 {
                return Err(EvalError::InvalidSize(format!(
                    "bitfield field '{}' has zero width",
                    field_name
                )));
            }
            if bit_offset + width > total_bits {
                return Err(EvalError::InvalidSize(format!(
                    "bitfield '{}' overflows its {}-bit storage",
                    def.name, total_bits
                )));
            }
            let mask = if width >= 128 {
                u128::MAX
            } else {
                (1u128 << width) - 1
            };
            let field_value = (raw >> bit_offset) & mask;
            node.children.push(LayoutNode::new(
                field_name,
                "bits",
                offset,
                size,
                endian,
                LayoutValue::BitfieldField {
                    bit_offset,
                    bit_width: width,
                    value: field_value,
                },
            ));
            self.record_value(field_name, Value::Unsigned(field_value));
            bit_offset += width;
        }
        self.cursor.advance(size)?;
        Ok(node)
    }

    fn eval_array(&mut self, decl: &'a ArrayDecl) -> Result<LayoutNode, EvalError> {
        let entry = self.cursor.position();
        let endian = self.endian.current();
        let mut children = Vec::new();
        match &decl.size {
            ArraySize::Fixed(expr) => {
                let count = self.eval_operand(expr)?.to_signed()?;
                if count < 0 {
                    return Err(EvalError::InvalidSize(format!(
                        "array '{}' has negative element count {}",
                        decl.name, count
                    )));
                }
                for i in 0..count as u64 {
                    let before = self.cursor.position();
                    let child = self.eval_typed(&format!("[{}]", i), &decl.ty)?;
                    if self.cursor.position() == before {
                        return Err(EvalError::InvalidSize(format!(
                            "array '{}' element has zero size",
                            decl.name
                        )));
                    }
                    children.push(child);
                }
            }
            ArraySize::While(cond) => {
                let mut i = 0u64;
                while self.eval_operand(cond)?.to_bool()? {
                    let before = self.cursor.position();
                    let child = self.eval_typed(&format!("[{}]", i), &decl.ty)?;
                    if self.cursor.position() == before {
                        return Err(EvalError::InvalidSize(format!(
                            "array '{}' element has zero size",
                            decl.name
                        )));
                    }
                    children.push(child);
                    i += 1;
                }
            }
        }
        let size = self.cursor.position() - entry;
        let type_name = format!("{}[{}]", decl.ty.display_name(), children.len());
        let mut node = LayoutNode::new(&decl.name, type_name, entry, size, endian, LayoutValue::Array);
        node.children = children;
        Ok(node)
    }

    fn eval_pointer(&mut self, decl: &'a PointerDecl) -> Result<LayoutNode, EvalError> {
        let storage = self.eval_typed(&decl.name, &decl.size_ty)?;
        let address = match storage.value {
            LayoutValue::Unsigned(v) => v as u64,
            LayoutValue::Signed(v) => v as u64,
            _ => {
                return Err(EvalError::TypeMismatch(format!(
                    "pointer '{}' requires an integer storage type, got {}",
                    decl.name, storage.type_name
                )))
            }
        };
        let target = self.pointer_base.wrapping_add(address);
        let saved = self.cursor.snapshot();
        self.cursor.jump(target)?;
        let pointee = self.eval_typed(&format!("*{}", decl.name), &decl.pointee);
        self.cursor.restore(saved);
        let pointee = pointee?;
        Ok(LayoutNode::new(
            &decl.name,
            format!("{}*", decl.pointee.display_name()),
            storage.offset,
            storage.size,
            storage.endian,
            LayoutValue::Pointer {
                address: target,
                pointee: Box::new(pointee),
            },
        )
        .with_comment(format!("-> {:#x}", target)))
    }

    /// Make a freshly evaluated member addressable by name in later
    /// expressions. Only scalar-valued nodes are recorded.
    fn record_node_value(&mut self, node: &LayoutNode) {
        let value = match &node.value {
            LayoutValue::Unsigned(v) => Value::Unsigned(*v),
            LayoutValue::Signed(v) => Value::Signed(*v),
            LayoutValue::Float(v) => Value::Float(*v),
            LayoutValue::Bool(v) => Value::Bool(*v),
            LayoutValue::Char(v) => Value::Char(*v),
            LayoutValue::Enum { value, .. } => Value::Unsigned(*value),
            LayoutValue::Pointer { address, .. } => Value::Unsigned(*address as u128),
            _ => return,
        };
        self.record_value(&node.name, value);
    }

    fn record_value(&mut self, name: &str, value: Value) {
        match self.scopes.last_mut() {
            Some(frame) => {
                frame.insert(name.to_string(), value);
            }
            None => {
                self.globals.insert(name.to_string(), value);
            }
        }
    }
}
