use miette::{bail, Result};

use crate::symbol::MAX_ADDR;

/// Data memory: 16K of RAM, the screen map and the keyboard word, rounded up to 32K words.
const MEMORY_MAX: usize = 0x8000;

/// Represents complete machine state during runtime.
pub struct RunState {
    /// Instruction memory
    rom: Vec<u16>,
    /// Data memory
    mem: Box<[u16; MEMORY_MAX]>,
    /// Program counter
    pc: u16,
    /// Address register
    a: u16,
    /// Data register
    d: u16,
    /// Instructions executed so far
    cycles: u64,
}

/// Why `run` returned.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RunOutcome {
    /// Reached an `@n` / `0;JMP` loop at `n`
    Halted,
    /// PC moved past the last instruction
    Finished,
    /// Cycle limit reached
    Exhausted,
}

impl RunState {
    pub fn from_raw(rom: &[u16]) -> Result<RunState> {
        if rom.len() > MAX_ADDR as usize + 1 {
            bail!("Program is too long and cannot fit in instruction memory.");
        }
        Ok(RunState {
            rom: rom.to_vec(),
            mem: Box::new([0; MEMORY_MAX]),
            pc: 0,
            a: 0,
            d: 0,
            cycles: 0,
        })
    }

    /// Load the text form of a program, one 16-digit binary word per line.
    pub fn from_hack_text(src: &str) -> Result<RunState> {
        let mut rom = Vec::new();
        for (i, line) in src.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.len() != 16 || !line.bytes().all(|b| b == b'0' || b == b'1') {
                bail!(
                    help = "each line of a .hack file holds exactly 16 binary digits",
                    "Malformed machine word `{line}` on line {}",
                    i + 1
                );
            }
            // Only 0 and 1 are present, so parsing cannot fail
            rom.push(u16::from_str_radix(line, 2).unwrap_or_default());
        }
        RunState::from_raw(&rom)
    }

    /// Run until the program halts, leaves ROM, or `limit` instructions have executed.
    pub fn run(&mut self, limit: u64) -> RunOutcome {
        let start = self.cycles;
        loop {
            if self.pc as usize >= self.rom.len() {
                return RunOutcome::Finished;
            }
            if self.is_halted() {
                return RunOutcome::Halted;
            }
            if self.cycles - start >= limit {
                return RunOutcome::Exhausted;
            }
            self.step();
        }
    }

    /// `@n` at `n` followed by a bare unconditional jump: nothing can change any more.
    fn is_halted(&self) -> bool {
        let pc = self.pc as usize;
        let jumps_back = self.rom.get(pc + 1).is_some_and(|&instr| {
            instr & 0xE000 == 0xE000 && instr & 0b111_000 == 0 && instr & 0b111 == 0b111
        });
        self.rom[pc] == self.pc && jumps_back
    }

    /// Execute one instruction.
    pub fn step(&mut self) {
        let instr = self.rom[self.pc as usize];
        self.cycles += 1;
        if instr & 0x8000 == 0 {
            self.a = instr;
            self.pc = self.pc.wrapping_add(1);
            return;
        }

        let addr = self.a;
        let y = if instr & 0x1000 != 0 { *self.mem(addr) } else { self.a };
        let out = Self::alu(self.d, y, (instr >> 6) & 0b111111);

        // M is written and the jump taken through the address A held before this instruction
        if instr & 0b001_000 != 0 {
            *self.mem(addr) = out;
        }
        if instr & 0b100_000 != 0 {
            self.a = out;
        }
        if instr & 0b010_000 != 0 {
            self.d = out;
        }

        let signed = out as i16;
        let jump = instr & 0b111;
        let taken = (jump & 0b100 != 0 && signed < 0)
            || (jump & 0b010 != 0 && signed == 0)
            || (jump & 0b001 != 0 && signed > 0);
        self.pc = if taken { addr } else { self.pc.wrapping_add(1) };
    }

    /// The Hack ALU, driven by its six control bits (zx nx zy ny f no).
    #[inline]
    fn alu(x: u16, y: u16, control: u16) -> u16 {
        let bit = |n: u16| control & (1 << (5 - n)) != 0;
        let mut x = if bit(0) { 0 } else { x };
        if bit(1) {
            x = !x;
        }
        let mut y = if bit(2) { 0 } else { y };
        if bit(3) {
            y = !y;
        }
        let out = if bit(4) { x.wrapping_add(y) } else { x & y };
        if bit(5) {
            !out
        } else {
            out
        }
    }

    #[inline]
    fn mem(&mut self, addr: u16) -> &mut u16 {
        &mut self.mem[(addr & MAX_ADDR) as usize]
    }

    pub fn ram(&self, addr: u16) -> u16 {
        self.mem[(addr & MAX_ADDR) as usize]
    }

    pub fn set_ram(&mut self, addr: u16, val: u16) {
        *self.mem(addr) = val;
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn a(&self) -> u16 {
        self.a
    }

    pub fn d(&self) -> u16 {
        self.d
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Current stack pointer, RAM[0].
    pub fn sp(&self) -> u16 {
        self.ram(0)
    }

    /// Topmost stack value, if the stack pointer is above its base.
    pub fn stack_top(&self) -> Option<u16> {
        self.sp().checked_sub(1).map(|addr| self.ram(addr))
    }
}
