use core::fmt;

/// The primitive types of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimKind {
    Int,
    Float,
    String,
    Bool,
    Void,
}

impl PrimKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, PrimKind::Int | PrimKind::Float)
    }

    /// Types accepted by `<`, `>`, `<=` and `>=`.
    pub fn is_comparable(self) -> bool {
        self.is_numeric()
    }

    pub fn has_value(self) -> bool {
        self != PrimKind::Void
    }
}

impl fmt::Display for PrimKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrimKind::Int => "int",
            PrimKind::Float => "float",
            PrimKind::String => "string",
            PrimKind::Bool => "bool",
            PrimKind::Void => "void",
        })
    }
}

/// Structural operator category. Each category has its own typing rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCategory {
    Arithmetic,
    Comparison,
    Equality,
    Logic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    And,
    Or,
}

impl BinaryOp {
    pub fn category(self) -> OpCategory {
        use BinaryOp::*;
        match self {
            Add | Sub | Mul | Div | AddAssign | SubAssign | MulAssign | DivAssign => {
                OpCategory::Arithmetic
            }
            Less | LessEqual | Greater | GreaterEqual => OpCategory::Comparison,
            Equal | NotEqual => OpCategory::Equality,
            And | Or => OpCategory::Logic,
        }
    }

    /// Whether this is a compound-assignment spelling (`+=`, `-=`, ...).
    pub fn is_compound(self) -> bool {
        matches!(
            self,
            BinaryOp::AddAssign | BinaryOp::SubAssign | BinaryOp::MulAssign | BinaryOp::DivAssign
        )
    }

    /// The plain arithmetic operator behind a compound spelling.
    pub fn arithmetic(self) -> BinaryOp {
        match self {
            BinaryOp::AddAssign => BinaryOp::Add,
            BinaryOp::SubAssign => BinaryOp::Sub,
            BinaryOp::MulAssign => BinaryOp::Mul,
            BinaryOp::DivAssign => BinaryOp::Div,
            other => other,
        }
    }

    pub fn symbol(self) -> &'static str {
        use BinaryOp::*;
        match self {
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            AddAssign => "+=",
            SubAssign => "-=",
            MulAssign => "*=",
            DivAssign => "/=",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            Equal => "==",
            NotEqual => "!=",
            And => "&&",
            Or => "||",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Operator of an assignment statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
    Mul,
    Div,
}

impl AssignOp {
    /// The arithmetic applied before storing, `None` for plain `=`.
    pub fn arithmetic(self) -> Option<BinaryOp> {
        match self {
            AssignOp::Set => None,
            AssignOp::Add => Some(BinaryOp::Add),
            AssignOp::Sub => Some(BinaryOp::Sub),
            AssignOp::Mul => Some(BinaryOp::Mul),
            AssignOp::Div => Some(BinaryOp::Div),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Set => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
        }
    }
}

/// Built-in I/O functions, callable like user functions but compiled to a
/// single instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intrinsic {
    Print,
    PrintFloat,
    PrintString,
    Read,
}

impl Intrinsic {
    pub const ALL: [Intrinsic; 4] = [
        Intrinsic::Print,
        Intrinsic::PrintFloat,
        Intrinsic::PrintString,
        Intrinsic::Read,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Intrinsic::Print => "print",
            Intrinsic::PrintFloat => "print_float",
            Intrinsic::PrintString => "print_string",
            Intrinsic::Read => "read",
        }
    }

    pub fn params(self) -> &'static [PrimKind] {
        match self {
            Intrinsic::Print => &[PrimKind::Int],
            Intrinsic::PrintFloat => &[PrimKind::Float],
            Intrinsic::PrintString => &[PrimKind::String],
            Intrinsic::Read => &[],
        }
    }

    pub fn returns(self) -> PrimKind {
        match self {
            Intrinsic::Read => PrimKind::Int,
            _ => PrimKind::Void,
        }
    }
}
