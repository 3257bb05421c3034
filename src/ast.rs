// Syntax node definitions for the template language.
// The parser collaborator produces these; the evaluator only borrows them.

/// A literal scalar embedded in an expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Unsigned(u128),
    Signed(i128),
    Float(f64),
    Bool(bool),
    Char(char),
}

/// Binary operators usable in scalar expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    LogAnd,
    LogOr,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

/// A scalar expression: sizes, conditions, placements, function arguments.
#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Literal),
    StringLiteral(String),

    /// Reference to a previously evaluated member by name.
    RValue(String),

    /// `Type::Member` access on an enum type.
    ScopeResolution { type_name: String, member: String },

    /// Built-in function call.
    Call { name: String, args: Vec<Expr> },

    Binary {
        op: Operator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// `cond ? then : else` — only the selected branch is evaluated.
    Ternary {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// Built-in fixed-width scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinType {
    U8,
    U16,
    U32,
    U64,
    U128,
    S8,
    S16,
    S32,
    S64,
    S128,
    Float,
    Double,
    Char,
    Bool,
}

impl BuiltinType {
    pub fn size(&self) -> u64 {
        match self {
            BuiltinType::U8 | BuiltinType::S8 | BuiltinType::Char | BuiltinType::Bool => 1,
            BuiltinType::U16 | BuiltinType::S16 => 2,
            BuiltinType::U32 | BuiltinType::S32 | BuiltinType::Float => 4,
            BuiltinType::U64 | BuiltinType::S64 | BuiltinType::Double => 8,
            BuiltinType::U128 | BuiltinType::S128 => 16,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinType::U8 => "u8",
            BuiltinType::U16 => "u16",
            BuiltinType::U32 => "u32",
            BuiltinType::U64 => "u64",
            BuiltinType::U128 => "u128",
            BuiltinType::S8 => "s8",
            BuiltinType::S16 => "s16",
            BuiltinType::S32 => "s32",
            BuiltinType::S64 => "s64",
            BuiltinType::S128 => "s128",
            BuiltinType::Float => "float",
            BuiltinType::Double => "double",
            BuiltinType::Char => "char",
            BuiltinType::Bool => "bool",
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            BuiltinType::S8
                | BuiltinType::S16
                | BuiltinType::S32
                | BuiltinType::S64
                | BuiltinType::S128
        )
    }
}

/// A type reference as it appears in a declaration.
#[derive(Debug, Clone)]
pub enum TypeExpr {
    Builtin(BuiltinType),
    /// Reference to a registered struct/union/enum/bitfield/typedef.
    Named(String),
    /// Endian override scoped to the wrapped type.
    Endian(Endianness, Box<TypeExpr>),
}

#[derive(Debug, Clone)]
pub struct StructDef {
    pub name: String,
    pub members: Vec<AstNode>,
}

#[derive(Debug, Clone)]
pub struct UnionDef {
    pub name: String,
    pub members: Vec<AstNode>,
}

#[derive(Debug, Clone)]
pub struct EnumDef {
    pub name: String,
    pub underlying: BuiltinType,
    /// Entries in declaration order. A `None` value means previous + 1
    /// (or 0 for the first entry).
    pub entries: Vec<(String, Option<Expr>)>,
}

#[derive(Debug, Clone)]
pub struct BitfieldDef {
    pub name: String,
    pub storage: BuiltinType,
    /// (field name, bit width expression), allocated from bit 0 upward.
    pub fields: Vec<(String, Expr)>,
}

#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: String,
    pub ty: TypeExpr,
    /// Explicit placement address. Placed declarations do not advance the
    /// caller's cursor.
    pub placement: Option<Expr>,
}

#[derive(Debug, Clone)]
pub enum ArraySize {
    /// `Type name[count]`
    Fixed(Expr),
    /// `Type name[while(cond)]` — the condition is checked before each element.
    While(Expr),
}

#[derive(Debug, Clone)]
pub struct ArrayDecl {
    pub name: String,
    pub ty: TypeExpr,
    pub size: ArraySize,
    pub placement: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct PointerDecl {
    pub name: String,
    /// Type evaluated at the target address.
    pub pointee: TypeExpr,
    /// Storage type of the address value itself.
    pub size_ty: TypeExpr,
    pub placement: Option<Expr>,
}

/// A top-level or member declaration.
#[derive(Debug, Clone)]
pub enum AstNode {
    Struct(StructDef),
    Union(UnionDef),
    Enum(EnumDef),
    Bitfield(BitfieldDef),
    Typedef { name: String, ty: TypeExpr },
    Variable(VarDecl),
    Array(ArrayDecl),
    Pointer(PointerDecl),
    /// Expression evaluated for its side effects (an `assert`, `warnAssert`
    /// or `print` call); produces no layout node.
    ExprStmt(Expr),
}

impl AstNode {
    /// Explicit placement address, if this declaration carries one.
    pub fn placement(&self) -> Option<&Expr> {
        match self {
            AstNode::Variable(v) => v.placement.as_ref(),
            AstNode::Array(a) => a.placement.as_ref(),
            AstNode::Pointer(p) => p.placement.as_ref(),
            _ => None,
        }
    }

    /// Name under which a definition node registers itself, if any.
    pub fn definition_name(&self) -> Option<&str> {
        match self {
            AstNode::Struct(d) => Some(&d.name),
            AstNode::Union(d) => Some(&d.name),
            AstNode::Enum(d) => Some(&d.name),
            AstNode::Bitfield(d) => Some(&d.name),
            AstNode::Typedef { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl TypeExpr {
    /// Human-readable type name for layout nodes and error messages.
    pub fn display_name(&self) -> String {
        match self {
            TypeExpr::Builtin(b) => b.name().to_string(),
            TypeExpr::Named(n) => n.clone(),
            TypeExpr::Endian(Endianness::Little, inner) => format!("le {}", inner.display_name()),
            TypeExpr::Endian(Endianness::Big, inner) => format!("be {}", inner.display_name()),
        }
    }
}
