use std::{fmt, str::FromStr};

use fxhash::FxBuildHasher;
use indexmap::IndexMap;

// Symbol table of symbol -> memory address (ROM for labels, RAM for everything else)
type FxMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// First RAM address handed out to variables.
pub const VARIABLE_BASE: u16 = 16;
/// Largest value an address instruction can carry.
pub const MAX_ADDR: u16 = 0x7FFF;
pub const SCREEN: u16 = 0x4000;
pub const KBD: u16 = 0x6000;

/// Platform-reserved names, seeded before any user symbol.
const PREDEFINED: [(&str, u16); 23] = [
    ("SP", 0),
    ("LCL", 1),
    ("ARG", 2),
    ("THIS", 3),
    ("THAT", 4),
    ("R0", 0),
    ("R1", 1),
    ("R2", 2),
    ("R3", 3),
    ("R4", 4),
    ("R5", 5),
    ("R6", 6),
    ("R7", 7),
    ("R8", 8),
    ("R9", 9),
    ("R10", 10),
    ("R11", 11),
    ("R12", 12),
    ("R13", 13),
    ("R14", 14),
    ("R15", 15),
    ("SCREEN", SCREEN),
    ("KBD", KBD),
];

/// Names bound during a single assembly run. A name is bound at most once.
#[derive(Clone, Debug)]
pub struct SymbolTable {
    table: FxMap<String, u16>,
    /// Next free variable slot. Kept as `u32` so exhaustion past `MAX_ADDR` is observable.
    next_var: u32,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut table = IndexMap::with_capacity_and_hasher(PREDEFINED.len(), FxBuildHasher::default());
        for (name, addr) in PREDEFINED {
            table.insert(name.to_string(), addr);
        }
        SymbolTable {
            table,
            next_var: VARIABLE_BASE as u32,
        }
    }

    pub fn get(&self, name: &str) -> Option<u16> {
        self.table.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    pub fn is_predefined(&self, name: &str) -> bool {
        self.table
            .get_index_of(name)
            .is_some_and(|idx| idx < PREDEFINED.len())
    }

    /// Bind `name` to `addr`. Fails with the existing address if the name is already bound.
    pub fn bind(&mut self, name: &str, addr: u16) -> Result<(), u16> {
        if let Some(existing) = self.get(name) {
            return Err(existing);
        }
        self.table.insert(name.to_string(), addr);
        Ok(())
    }

    /// Look up `name`, allocating the next variable slot if it is unbound.
    /// Returns `None` only once variable space above `MAX_ADDR` would be needed.
    pub fn resolve_or_alloc(&mut self, name: &str) -> Option<u16> {
        if let Some(addr) = self.get(name) {
            return Some(addr);
        }
        if self.next_var > MAX_ADDR as u32 {
            return None;
        }
        let addr = self.next_var as u16;
        self.next_var += 1;
        self.table.insert(name.to_string(), addr);
        log::trace!("allocated variable `{name}` at {addr}");
        Some(addr)
    }

    /// Address the next new variable would receive.
    pub fn next_variable(&self) -> u32 {
        self.next_var
    }

    /// User symbols (labels and variables) in the order they were bound.
    pub fn user_symbols(&self) -> impl Iterator<Item = (&str, u16)> {
        self.table
            .iter()
            .skip(PREDEFINED.len())
            .map(|(name, addr)| (name.as_str(), *addr))
    }
}

/// Test if a string is a valid user symbol: letters, digits, `_ . $ :`, not starting with a digit.
pub fn is_symbol(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if is_symbol_start(c) => chars.all(|c| is_symbol_start(c) || c.is_ascii_digit()),
        _ => false,
    }
}

fn is_symbol_start(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '_' | '.' | '$' | ':')
}

/// Destination field of a compute instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Dest {
    Null = 0b000,
    M = 0b001,
    D = 0b010,
    MD = 0b011,
    A = 0b100,
    AM = 0b101,
    AD = 0b110,
    AMD = 0b111,
}

impl Dest {
    pub fn bits(self) -> u16 {
        self as u16
    }
}

impl FromStr for Dest {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" => Ok(Dest::M),
            "D" => Ok(Dest::D),
            "MD" => Ok(Dest::MD),
            "A" => Ok(Dest::A),
            "AM" => Ok(Dest::AM),
            "AD" => Ok(Dest::AD),
            "AMD" => Ok(Dest::AMD),
            _ => Err(()),
        }
    }
}

/// Jump condition of a compute instruction, tested against the computed value.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Jump {
    Null = 0b000,
    /// > 0
    Jgt = 0b001,
    /// == 0
    Jeq = 0b010,
    /// >= 0
    Jge = 0b011,
    /// < 0
    Jlt = 0b100,
    /// != 0
    Jne = 0b101,
    /// <= 0
    Jle = 0b110,
    /// Unconditional
    Jmp = 0b111,
}

impl Jump {
    pub fn bits(self) -> u16 {
        self as u16
    }
}

impl FromStr for Jump {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "JGT" => Ok(Jump::Jgt),
            "JEQ" => Ok(Jump::Jeq),
            "JGE" => Ok(Jump::Jge),
            "JLT" => Ok(Jump::Jlt),
            "JNE" => Ok(Jump::Jne),
            "JLE" => Ok(Jump::Jle),
            "JMP" => Ok(Jump::Jmp),
            _ => Err(()),
        }
    }
}

/// Computation field of a compute instruction. Variants reading `M` set the `a` bit.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Comp {
    Zero,
    One,
    NegOne,
    D,
    A,
    NotD,
    NotA,
    NegD,
    NegA,
    DPlusOne,
    APlusOne,
    DMinusOne,
    AMinusOne,
    DPlusA,
    DMinusA,
    AMinusD,
    DAndA,
    DOrA,
    M,
    NotM,
    NegM,
    MPlusOne,
    MMinusOne,
    DPlusM,
    DMinusM,
    MMinusD,
    DAndM,
    DOrM,
}

impl Comp {
    /// Whether the computation reads the addressed memory cell instead of `A`.
    pub fn reads_memory(self) -> bool {
        use Comp::*;
        matches!(
            self,
            M | NotM | NegM | MPlusOne | MMinusOne | DPlusM | DMinusM | MMinusD | DAndM | DOrM
        )
    }

    /// The six ALU control bits (zx nx zy ny f no).
    pub fn alu_bits(self) -> u16 {
        use Comp::*;
        match self {
            Zero => 0b101010,
            One => 0b111111,
            NegOne => 0b111010,
            D => 0b001100,
            A | M => 0b110000,
            NotD => 0b001101,
            NotA | NotM => 0b110001,
            NegD => 0b001111,
            NegA | NegM => 0b110011,
            DPlusOne => 0b011111,
            APlusOne | MPlusOne => 0b110111,
            DMinusOne => 0b001110,
            AMinusOne | MMinusOne => 0b110010,
            DPlusA | DPlusM => 0b000010,
            DMinusA | DMinusM => 0b010011,
            AMinusD | MMinusD => 0b000111,
            DAndA | DAndM => 0b000000,
            DOrA | DOrM => 0b010101,
        }
    }

    /// `a` bit followed by the ALU control bits.
    pub fn bits(self) -> u16 {
        ((self.reads_memory() as u16) << 6) | self.alu_bits()
    }
}

impl FromStr for Comp {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Comp::*;
        let comp = match s {
            "0" => Zero,
            "1" => One,
            "-1" => NegOne,
            "D" => D,
            "A" => A,
            "!D" => NotD,
            "!A" => NotA,
            "-D" => NegD,
            "-A" => NegA,
            "D+1" | "1+D" => DPlusOne,
            "A+1" | "1+A" => APlusOne,
            "D-1" => DMinusOne,
            "A-1" => AMinusOne,
            "D+A" | "A+D" => DPlusA,
            "D-A" => DMinusA,
            "A-D" => AMinusD,
            "D&A" | "A&D" => DAndA,
            "D|A" | "A|D" => DOrA,
            "M" => M,
            "!M" => NotM,
            "-M" => NegM,
            "M+1" | "1+M" => MPlusOne,
            "M-1" => MMinusOne,
            "D+M" | "M+D" => DPlusM,
            "D-M" => DMinusM,
            "M-D" => MMinusD,
            "D&M" | "M&D" => DAndM,
            "D|M" | "M|D" => DOrM,
            _ => return Err(()),
        };
        Ok(comp)
    }
}

impl fmt::Display for Comp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Comp::*;
        let s = match self {
            Zero => "0",
            One => "1",
            NegOne => "-1",
            D => "D",
            A => "A",
            NotD => "!D",
            NotA => "!A",
            NegD => "-D",
            NegA => "-A",
            DPlusOne => "D+1",
            APlusOne => "A+1",
            DMinusOne => "D-1",
            AMinusOne => "A-1",
            DPlusA => "D+A",
            DMinusA => "D-A",
            AMinusD => "A-D",
            DAndA => "D&A",
            DOrA => "D|A",
            M => "M",
            NotM => "!M",
            NegM => "-M",
            MPlusOne => "M+1",
            MMinusOne => "M-1",
            DPlusM => "D+M",
            DMinusM => "D-M",
            MMinusD => "M-D",
            DAndM => "D&M",
            DOrM => "D|M",
        };
        f.write_str(s)
    }
}
