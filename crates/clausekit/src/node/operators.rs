//! Operator tags used by unary, binary and clause-list nodes.

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Is,
    IsNot,
    IsDistinctFrom,
    IsNotDistinctFrom,

    // Pattern / membership
    Like,
    NotLike,
    ILike,
    NotILike,
    In,
    NotIn,
    Between,
    NotBetween,

    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Concat,

    // Bitwise
    BitAnd,
    BitOr,
}

impl BinaryOp {
    /// Generic SQL spelling; dialects may override it.
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Is => "IS",
            Self::IsNot => "IS NOT",
            Self::IsDistinctFrom => "IS DISTINCT FROM",
            Self::IsNotDistinctFrom => "IS NOT DISTINCT FROM",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::ILike => "ILIKE",
            Self::NotILike => "NOT ILIKE",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::Between => "BETWEEN",
            Self::NotBetween => "NOT BETWEEN",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Concat => "||",
            Self::BitAnd => "&",
            Self::BitOr => "|",
        }
    }

    /// Binding strength; higher binds tighter.
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Mul | Self::Div | Self::Mod => 8,
            Self::Add | Self::Sub | Self::Concat => 7,
            Self::BitAnd | Self::BitOr => 6,
            _ => 5,
        }
    }

    /// Whether `a op (b op c)` renders the same as `(a op b) op c`.
    pub const fn is_associative(self) -> bool {
        matches!(
            self,
            Self::Add | Self::Mul | Self::Concat | Self::BitAnd | Self::BitOr
        )
    }

    pub const fn is_comparison(self) -> bool {
        self.precedence() == 5
    }

    /// The operator producing the opposite truth value, where one exists.
    pub const fn negate(self) -> Option<Self> {
        Some(match self {
            Self::Eq => Self::Ne,
            Self::Ne => Self::Eq,
            Self::Lt => Self::Ge,
            Self::Ge => Self::Lt,
            Self::Gt => Self::Le,
            Self::Le => Self::Gt,
            Self::Is => Self::IsNot,
            Self::IsNot => Self::Is,
            Self::IsDistinctFrom => Self::IsNotDistinctFrom,
            Self::IsNotDistinctFrom => Self::IsDistinctFrom,
            Self::Like => Self::NotLike,
            Self::NotLike => Self::Like,
            Self::ILike => Self::NotILike,
            Self::NotILike => Self::ILike,
            Self::In => Self::NotIn,
            Self::NotIn => Self::In,
            Self::Between => Self::NotBetween,
            Self::NotBetween => Self::Between,
            _ => return None,
        })
    }
}

/// Unary operators and modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Logical NOT
    Not,
    /// Arithmetic negation (-)
    Neg,
    /// Bitwise NOT (~)
    BitNot,
    /// DISTINCT modifier inside aggregates
    Distinct,
    /// EXISTS (subquery)
    Exists,
}

impl UnaryOp {
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Not => "NOT",
            Self::Neg => "-",
            Self::BitNot => "~",
            Self::Distinct => "DISTINCT",
            Self::Exists => "EXISTS",
        }
    }

    pub const fn precedence(self) -> u8 {
        match self {
            Self::Neg | Self::BitNot => 9,
            Self::Not => 4,
            Self::Distinct | Self::Exists => 5,
        }
    }
}

/// Separator of a clause list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListOp {
    And,
    Or,
    Comma,
}

impl ListOp {
    pub const fn separator(self) -> &'static str {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
            Self::Comma => ", ",
        }
    }

    pub const fn precedence(self) -> u8 {
        match self {
            Self::And => 3,
            Self::Or => 2,
            Self::Comma => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinKind {
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Inner => "JOIN",
            Self::Left => "LEFT OUTER JOIN",
            Self::Right => "RIGHT OUTER JOIN",
            Self::Full => "FULL OUTER JOIN",
        }
    }
}

/// Set operation combining SELECTs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetOp {
    Union,
    UnionAll,
    Intersect,
    Except,
}

impl SetOp {
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Union => "UNION",
            Self::UnionAll => "UNION ALL",
            Self::Intersect => "INTERSECT",
            Self::Except => "EXCEPT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NullsOrder {
    First,
    Last,
}
