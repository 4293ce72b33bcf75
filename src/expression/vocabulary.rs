use std::fmt::Display;

/// Operation a reserved word or operator symbol stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Where,
    Interp,
    Abs,
    Sqrt,
    Exp,
    Log,
    Log10,
    Sin,
    Cos,
    Tan,
    Floor,
    Ceil,
    Min,
    Max,
    Mean,
    AsArray,
    Map,
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Exactly(expected) => count == *expected,
            Arity::AtLeast(minimum) => count >= *minimum,
        }
    }
}

impl Builtin {
    pub fn arity(&self) -> Arity {
        use Builtin::*;
        match self {
            Div | And | Or => Arity::AtLeast(2),
            Add | Mul | Sub | Min | Max | Mean | AsArray | Partial => Arity::AtLeast(1),
            Map => Arity::AtLeast(2),
            Rem | Pow | Eq | Ne | Lt | Le | Gt | Ge => Arity::Exactly(2),
            Where | Interp => Arity::Exactly(3),
            Abs | Sqrt | Exp | Log | Log10 | Sin | Cos | Tan | Floor | Ceil => Arity::Exactly(1),
        }
    }

    /// Takes other builtins as arguments.
    pub fn is_higher_order(&self) -> bool {
        matches!(self, Builtin::Map | Builtin::Partial)
    }
}

impl Display for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = OPERATORS
            .iter()
            .chain(FUNCTIONS)
            .find_map(|(name, builtin)| (builtin == self).then_some(*name))
            .unwrap_or("?");
        f.write_str(name)
    }
}

pub const OPERATORS: &[(&str, Builtin)] = &[
    ("+", Builtin::Add),
    ("-", Builtin::Sub),
    ("*", Builtin::Mul),
    ("/", Builtin::Div),
    ("%", Builtin::Rem),
    ("**", Builtin::Pow),
    ("==", Builtin::Eq),
    ("!=", Builtin::Ne),
    ("<", Builtin::Lt),
    ("<=", Builtin::Le),
    (">", Builtin::Gt),
    (">=", Builtin::Ge),
    ("&", Builtin::And),
    ("|", Builtin::Or),
];

pub const FUNCTIONS: &[(&str, Builtin)] = &[
    ("where", Builtin::Where),
    ("interp", Builtin::Interp),
    ("abs", Builtin::Abs),
    ("sqrt", Builtin::Sqrt),
    ("exp", Builtin::Exp),
    ("log", Builtin::Log),
    ("log10", Builtin::Log10),
    ("sin", Builtin::Sin),
    ("cos", Builtin::Cos),
    ("tan", Builtin::Tan),
    ("floor", Builtin::Floor),
    ("ceil", Builtin::Ceil),
    ("min", Builtin::Min),
    ("max", Builtin::Max),
    ("mean", Builtin::Mean),
    ("asarray", Builtin::AsArray),
    ("map", Builtin::Map),
    ("partial", Builtin::Partial),
];

pub const CONSTANTS: &[(&str, f64)] = &[
    ("nan", f64::NAN),
    ("inf", f64::INFINITY),
    ("pi", std::f64::consts::PI),
];

/// Enumerable table of everything an expression may contain
/// that is not a band identifier.
#[derive(Debug, Clone, Copy)]
pub struct Vocabulary {
    pub operators: &'static [(&'static str, Builtin)],
    pub functions: &'static [(&'static str, Builtin)],
    pub constants: &'static [(&'static str, f64)],
}

pub const ALGEBRA: Vocabulary = Vocabulary {
    operators: OPERATORS,
    functions: FUNCTIONS,
    constants: CONSTANTS,
};

impl Vocabulary {
    pub fn operator(&self, symbol: &str) -> Option<Builtin> {
        lookup(self.operators, symbol)
    }

    pub fn function(&self, word: &str) -> Option<Builtin> {
        lookup(self.functions, word)
    }

    pub fn constant(&self, word: &str) -> Option<f64> {
        lookup(self.constants, word)
    }

    pub fn is_reserved(&self, word: &str) -> bool {
        self.function(word).is_some() || self.constant(word).is_some()
    }
}

fn lookup<T: Copy>(table: &[(&str, T)], key: &str) -> Option<T> {
    table
        .iter()
        .find_map(|(name, value)| (*name == key).then_some(*value))
}
