//! Opcode table for compiled postfix streams
//!
//! Every token starts with one of these bytes. Three opcodes carry inline
//! operands: `FETCH` and `AFETCH` are followed by a one-byte input index and
//! `LITERAL` by an 8-byte native-endian double.

use std::fmt;

/// Header byte of a stream that may be evaluated
pub const EXPRESSION_OK: u8 = 0x00;

/// Header byte of a stream the compiler rejected
pub const BAD_EXPRESSION: u8 = 0xFF;

/// Number of addressable scalar inputs and of addressable array inputs
pub const MAX_ARGS: usize = 12;

/// Postfix opcodes
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // === Stream structure ===
    /// End of the token stream
    EndStack = 0,

    // === Operand fetches ===
    /// Push scalar input; operand: input index
    Fetch = 1,
    /// Push a copy of array input; operand: input index
    AFetch = 2,
    /// Push embedded double; operand: 8 native-endian bytes
    Literal = 3,
    /// Push scalar input 0
    FetchA = 4,
    /// Push scalar input 1
    FetchB = 5,
    /// Push scalar input 2
    FetchC = 6,
    /// Push scalar input 3
    FetchD = 7,
    /// Push scalar input 4
    FetchE = 8,
    /// Push scalar input 5
    FetchF = 9,
    /// Push scalar input 6
    FetchG = 10,
    /// Push scalar input 7
    FetchH = 11,
    /// Push scalar input 8
    FetchI = 12,
    /// Push scalar input 9
    FetchJ = 13,
    /// Push scalar input 10
    FetchK = 14,
    /// Push scalar input 11
    FetchL = 15,
    /// Assignment; compiled by some front ends but never executable here
    Store = 16,

    // === Constants ===
    /// π
    ConstPi = 17,
    /// Degrees to radians
    ConstD2R = 18,
    /// Radians to degrees
    ConstR2D = 19,
    /// Arcseconds to radians
    ConstS2R = 20,
    /// Radians to arcseconds
    ConstR2S = 21,
    /// Index ramp `[0, 1, ..., n-1]`
    ConstIx = 22,
    /// Pseudo-random scalar
    Random = 23,
    /// Array of pseudo-random values
    ARandom = 24,

    // === Arithmetic ===
    /// Addition
    Add = 30,
    /// Subtraction
    Sub = 31,
    /// Multiplication
    Mult = 32,
    /// Division, fatal on zero divisor
    Div = 33,
    /// Integer modulo, fatal on zero divisor
    Modulo = 34,
    /// Larger of two operands
    Max = 35,
    /// Smaller of two operands
    Min = 36,
    /// Integer-exponent power
    Expon = 37,

    // === Comparison, logic, bitwise ===
    /// `>=`
    GrOrEq = 40,
    /// `>`
    GrThan = 41,
    /// `<=`
    LessOrEq = 42,
    /// `<`
    LessThan = 43,
    /// `!=`
    NotEq = 44,
    /// `==`
    Equal = 45,
    /// Logical or
    RelOr = 46,
    /// Logical and
    RelAnd = 47,
    /// Bitwise or
    BitOr = 48,
    /// Bitwise and
    BitAnd = 49,
    /// Bitwise exclusive or
    BitExclOr = 50,
    /// `atan2(top, second)`
    Atan2 = 51,
    /// Right shift (bits for scalars, slots for arrays)
    RightShift = 52,
    /// Left shift (bits for scalars, slots for arrays)
    LeftShift = 53,

    // === Conditional markers ===
    /// `?`
    CondIf = 60,
    /// `:`
    CondElse = 61,
    /// End of the else branch
    CondEnd = 62,

    // === Unary math ===
    /// Absolute value
    AbsVal = 70,
    /// Negation
    UnaryNeg = 71,
    /// Square root
    SquRt = 72,
    /// Natural exponential
    Exp = 73,
    /// Base-10 logarithm
    Log10 = 74,
    /// Natural logarithm
    LogE = 75,
    /// Arc cosine
    Acos = 76,
    /// Arc sine
    Asin = 77,
    /// Arc tangent
    Atan = 78,
    /// Cosine
    Cos = 79,
    /// Sine
    Sin = 80,
    /// Tangent
    Tan = 81,
    /// Hyperbolic cosine
    Cosh = 82,
    /// Hyperbolic sine
    Sinh = 83,
    /// Hyperbolic tangent
    Tanh = 84,
    /// Ceiling
    Ceil = 85,
    /// Floor
    Floor = 86,
    /// Round half away from zero
    Nint = 87,
    /// Logical not
    RelNot = 88,
    /// Bitwise not
    BitNot = 89,

    // === Reductions (array -> scalar) ===
    /// Largest element
    Amax = 90,
    /// Smallest element
    Amin = 91,
    /// Mean
    Average = 92,
    /// Sample standard deviation
    StdDev = 93,
    /// Full width at half maximum
    Fwhm = 94,
    /// Sum of elements
    Sum = 95,
    /// Index of the largest element
    IxMax = 96,
    /// Index of the smallest element
    IxMin = 97,
    /// Index of the first zero element
    IxZ = 98,
    /// Index of the first non-zero element
    IxNz = 99,
    /// 1 if every element is finite
    Finite = 100,
    /// 1 if any element is NaN
    IsNan = 101,
    /// 1 if any element is infinite
    IsInf = 102,

    // === Array operations ===
    /// Running sum
    Cum = 110,
    /// Concatenation of logical lengths
    Cat = 111,
    /// Extract inclusive slice to the front
    Subrange = 112,
    /// Zero everything outside the inclusive slice
    SubrangeInPlace = 113,
    /// Scalar input selected by the value on the stack
    FetchIndexed = 114,
    /// Array input selected by the value on the stack
    AFetchIndexed = 115,
    /// Coerce to scalar
    ToDouble = 116,
    /// Coerce to array
    ToArray = 117,
}

impl Opcode {
    /// Every opcode, in byte order
    pub const ALL: &'static [Opcode] = &[
        Opcode::EndStack,
        Opcode::Fetch,
        Opcode::AFetch,
        Opcode::Literal,
        Opcode::FetchA,
        Opcode::FetchB,
        Opcode::FetchC,
        Opcode::FetchD,
        Opcode::FetchE,
        Opcode::FetchF,
        Opcode::FetchG,
        Opcode::FetchH,
        Opcode::FetchI,
        Opcode::FetchJ,
        Opcode::FetchK,
        Opcode::FetchL,
        Opcode::Store,
        Opcode::ConstPi,
        Opcode::ConstD2R,
        Opcode::ConstR2D,
        Opcode::ConstS2R,
        Opcode::ConstR2S,
        Opcode::ConstIx,
        Opcode::Random,
        Opcode::ARandom,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mult,
        Opcode::Div,
        Opcode::Modulo,
        Opcode::Max,
        Opcode::Min,
        Opcode::Expon,
        Opcode::GrOrEq,
        Opcode::GrThan,
        Opcode::LessOrEq,
        Opcode::LessThan,
        Opcode::NotEq,
        Opcode::Equal,
        Opcode::RelOr,
        Opcode::RelAnd,
        Opcode::BitOr,
        Opcode::BitAnd,
        Opcode::BitExclOr,
        Opcode::Atan2,
        Opcode::RightShift,
        Opcode::LeftShift,
        Opcode::CondIf,
        Opcode::CondElse,
        Opcode::CondEnd,
        Opcode::AbsVal,
        Opcode::UnaryNeg,
        Opcode::SquRt,
        Opcode::Exp,
        Opcode::Log10,
        Opcode::LogE,
        Opcode::Acos,
        Opcode::Asin,
        Opcode::Atan,
        Opcode::Cos,
        Opcode::Sin,
        Opcode::Tan,
        Opcode::Cosh,
        Opcode::Sinh,
        Opcode::Tanh,
        Opcode::Ceil,
        Opcode::Floor,
        Opcode::Nint,
        Opcode::RelNot,
        Opcode::BitNot,
        Opcode::Amax,
        Opcode::Amin,
        Opcode::Average,
        Opcode::StdDev,
        Opcode::Fwhm,
        Opcode::Sum,
        Opcode::IxMax,
        Opcode::IxMin,
        Opcode::IxZ,
        Opcode::IxNz,
        Opcode::Finite,
        Opcode::IsNan,
        Opcode::IsInf,
        Opcode::Cum,
        Opcode::Cat,
        Opcode::Subrange,
        Opcode::SubrangeInPlace,
        Opcode::FetchIndexed,
        Opcode::AFetchIndexed,
        Opcode::ToDouble,
        Opcode::ToArray,
    ];

    /// Decode a byte, `None` if it names no opcode
    pub fn from_byte(byte: u8) -> Option<Self> {
        // ALL is sorted by discriminant
        Self::ALL
            .binary_search_by_key(&byte, |op| *op as u8)
            .ok()
            .map(|idx| Self::ALL[idx])
    }

    /// Byte value of this opcode
    pub fn byte(self) -> u8 {
        self as u8
    }

    /// Size in bytes of the token including inline operands
    pub fn size(self) -> usize {
        match self {
            Self::Fetch | Self::AFetch => 2,
            Self::Literal => 9,
            _ => 1,
        }
    }

    /// Scalar input addressed by the single-byte `FETCH_A`..`FETCH_L` forms
    pub fn direct_fetch_index(self) -> Option<usize> {
        let byte = self as u8;
        if (Self::FetchA as u8..=Self::FetchL as u8).contains(&byte) {
            Some(usize::from(byte - Self::FetchA as u8))
        } else {
            None
        }
    }

    /// Single-byte fetch opcode for scalar input `index`
    pub fn direct_fetch(index: usize) -> Option<Self> {
        u8::try_from(index)
            .ok()
            .filter(|i| usize::from(*i) < MAX_ARGS)
            .and_then(|i| Self::from_byte(Self::FetchA as u8 + i))
    }

    /// Net stack effect (positive = pushes, negative = pops)
    pub fn stack_effect(self) -> i8 {
        match self {
            // Push operations
            Self::Fetch
            | Self::AFetch
            | Self::Literal
            | Self::FetchA
            | Self::FetchB
            | Self::FetchC
            | Self::FetchD
            | Self::FetchE
            | Self::FetchF
            | Self::FetchG
            | Self::FetchH
            | Self::FetchI
            | Self::FetchJ
            | Self::FetchK
            | Self::FetchL
            | Self::ConstPi
            | Self::ConstD2R
            | Self::ConstR2D
            | Self::ConstS2R
            | Self::ConstR2S
            | Self::ConstIx
            | Self::Random
            | Self::ARandom => 1,

            // Binary operations (pop 2, push 1)
            Self::Add
            | Self::Sub
            | Self::Mult
            | Self::Div
            | Self::Modulo
            | Self::Max
            | Self::Min
            | Self::Expon
            | Self::GrOrEq
            | Self::GrThan
            | Self::LessOrEq
            | Self::LessThan
            | Self::NotEq
            | Self::Equal
            | Self::RelOr
            | Self::RelAnd
            | Self::BitOr
            | Self::BitAnd
            | Self::BitExclOr
            | Self::Atan2
            | Self::RightShift
            | Self::LeftShift
            | Self::Cat => -1,

            // Array, first, last -> array
            Self::Subrange | Self::SubrangeInPlace => -2,

            // Condition is consumed
            Self::CondIf => -1,

            // Value is consumed by the assignment
            Self::Store => -1,

            // Unary operations and markers
            _ => 0,
        }
    }

    /// Short mnemonic used by the disassembler
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::EndStack => "END",
            Self::Fetch => "FETCH",
            Self::AFetch => "AFETCH",
            Self::Literal => "LIT",
            Self::FetchA => "A",
            Self::FetchB => "B",
            Self::FetchC => "C",
            Self::FetchD => "D",
            Self::FetchE => "E",
            Self::FetchF => "F",
            Self::FetchG => "G",
            Self::FetchH => "H",
            Self::FetchI => "I",
            Self::FetchJ => "J",
            Self::FetchK => "K",
            Self::FetchL => "L",
            Self::Store => "STORE",
            Self::ConstPi => "PI",
            Self::ConstD2R => "D2R",
            Self::ConstR2D => "R2D",
            Self::ConstS2R => "S2R",
            Self::ConstR2S => "R2S",
            Self::ConstIx => "IX",
            Self::Random => "RNDM",
            Self::ARandom => "ARNDM",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Mult => "MUL",
            Self::Div => "DIV",
            Self::Modulo => "MOD",
            Self::Max => "MAX",
            Self::Min => "MIN",
            Self::Expon => "POW",
            Self::GrOrEq => "GE",
            Self::GrThan => "GT",
            Self::LessOrEq => "LE",
            Self::LessThan => "LT",
            Self::NotEq => "NE",
            Self::Equal => "EQ",
            Self::RelOr => "OR",
            Self::RelAnd => "AND",
            Self::BitOr => "BITOR",
            Self::BitAnd => "BITAND",
            Self::BitExclOr => "XOR",
            Self::Atan2 => "ATAN2",
            Self::RightShift => "SHR",
            Self::LeftShift => "SHL",
            Self::CondIf => "IF",
            Self::CondElse => "ELSE",
            Self::CondEnd => "ENDIF",
            Self::AbsVal => "ABS",
            Self::UnaryNeg => "NEG",
            Self::SquRt => "SQRT",
            Self::Exp => "EXP",
            Self::Log10 => "LOG",
            Self::LogE => "LN",
            Self::Acos => "ACOS",
            Self::Asin => "ASIN",
            Self::Atan => "ATAN",
            Self::Cos => "COS",
            Self::Sin => "SIN",
            Self::Tan => "TAN",
            Self::Cosh => "COSH",
            Self::Sinh => "SINH",
            Self::Tanh => "TANH",
            Self::Ceil => "CEIL",
            Self::Floor => "FLOOR",
            Self::Nint => "NINT",
            Self::RelNot => "NOT",
            Self::BitNot => "BITNOT",
            Self::Amax => "AMAX",
            Self::Amin => "AMIN",
            Self::Average => "AVG",
            Self::StdDev => "STD",
            Self::Fwhm => "FWHM",
            Self::Sum => "SUM",
            Self::IxMax => "IXMAX",
            Self::IxMin => "IXMIN",
            Self::IxZ => "IXZ",
            Self::IxNz => "IXNZ",
            Self::Finite => "FINITE",
            Self::IsNan => "ISNAN",
            Self::IsInf => "ISINF",
            Self::Cum => "CUM",
            Self::Cat => "CAT",
            Self::Subrange => "SUBRANGE",
            Self::SubrangeInPlace => "SUBRANGE_IP",
            Self::FetchIndexed => "@",
            Self::AFetchIndexed => "@@",
            Self::ToDouble => "TO_DOUBLE",
            Self::ToArray => "TO_ARRAY",
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Self::from_byte(byte).ok_or(byte)
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> Self {
        op as u8
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
