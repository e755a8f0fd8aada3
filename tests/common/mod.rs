//! Test-only execution oracle for generated assembly.
//!
//! Two pieces, mirroring the external collaborators the translator
//! targets: a two-pass symbolic resolver (labels first, then variables
//! allocated upward from address 16) and an instruction-level executor
//! for the Hack machine. The executor computes every next-state value
//! from a snapshot of the pre-instruction registers and applies all
//! writes together, so mid-instruction mutation order can never skew a
//! result.
//!
//! Verification only; nothing here ships with the crate.

#![allow(dead_code)]

use std::collections::HashMap;

/// RAM cells addressable by the machine (15-bit address space).
const RAM_SIZE: usize = 1 << 15;
/// Generous ceiling; every test program halts long before this.
const MAX_STEPS: usize = 2_000_000;

const SP: usize = 0;
const LCL: usize = 1;
const ARG: usize = 2;
const THIS: usize = 3;
const THAT: usize = 4;

#[derive(Debug, Clone)]
enum Instr {
    /// `@value` after symbol resolution.
    Load(u16),
    /// `dest=comp;jump` decomposed.
    Compute {
        dest_a: bool,
        dest_d: bool,
        dest_m: bool,
        comp: String,
        jump: String,
    },
}

/// Assembled program plus machine state.
pub struct Machine {
    instrs: Vec<Instr>,
    a: i16,
    d: i16,
    pc: usize,
    pub ram: Vec<i16>,
}

impl Machine {
    /// Assemble `asm` text: first pass binds `(label)` declarations to
    /// instruction indices, second pass resolves `@symbol` references,
    /// allocating fresh variables from address 16.
    pub fn load(asm: &str) -> Self {
        let mut symbols: HashMap<String, u16> = HashMap::new();
        for (name, addr) in [
            ("SP", 0),
            ("LCL", 1),
            ("ARG", 2),
            ("THIS", 3),
            ("THAT", 4),
            ("SCREEN", 16384),
            ("KBD", 24576),
        ] {
            symbols.insert(name.to_string(), addr);
        }
        for r in 0..16u16 {
            symbols.insert(format!("R{r}"), r);
        }

        let code_lines: Vec<&str> = asm
            .lines()
            .map(|line| line.split("//").next().unwrap_or("").trim())
            .filter(|line| !line.is_empty())
            .collect();

        // Pass 1: label declarations.
        let mut index = 0u16;
        for line in &code_lines {
            if let Some(label) = line.strip_prefix('(') {
                let label = label.trim_end_matches(')');
                assert!(
                    symbols.insert(label.to_string(), index).is_none(),
                    "label defined twice: {label}"
                );
            } else {
                index += 1;
            }
        }

        // Pass 2: instructions, with variable allocation.
        let mut next_var = 16u16;
        let mut instrs = Vec::with_capacity(code_lines.len());
        for line in &code_lines {
            if line.starts_with('(') {
                continue;
            }
            if let Some(sym) = line.strip_prefix('@') {
                let value = if sym.chars().all(|c| c.is_ascii_digit()) {
                    sym.parse::<u16>().expect("numeric @value")
                } else if let Some(&addr) = symbols.get(sym) {
                    addr
                } else {
                    let addr = next_var;
                    symbols.insert(sym.to_string(), addr);
                    next_var += 1;
                    addr
                };
                instrs.push(Instr::Load(value));
            } else {
                instrs.push(parse_compute(line));
            }
        }

        Self {
            instrs,
            a: 0,
            d: 0,
            pc: 0,
            ram: vec![0; RAM_SIZE],
        }
    }

    /// Number of resolved instructions.
    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    pub fn sp(&self) -> i16 {
        self.ram[SP]
    }

    pub fn lcl(&self) -> i16 {
        self.ram[LCL]
    }

    pub fn arg(&self) -> i16 {
        self.ram[ARG]
    }

    pub fn this(&self) -> i16 {
        self.ram[THIS]
    }

    pub fn that(&self) -> i16 {
        self.ram[THAT]
    }

    /// Value just below the stack pointer.
    pub fn top(&self) -> i16 {
        self.ram[(self.sp() - 1) as usize]
    }

    /// Execute one instruction. Returns `false` once the machine halts:
    /// the program counter fell off the end, or a jump targeted its own
    /// instruction (the generator's halt-loop idiom).
    pub fn step(&mut self) -> bool {
        let Some(instr) = self.instrs.get(self.pc) else {
            return false;
        };

        match instr {
            Instr::Load(value) => {
                self.a = *value as i16;
                self.pc += 1;
            }
            Instr::Compute {
                dest_a,
                dest_d,
                dest_m,
                comp,
                jump,
            } => {
                // Snapshot, compute, then commit every write at once.
                let a0 = self.a;
                let d0 = self.d;
                let addr = (a0 as u16 & 0x7FFF) as usize;
                let m0 = self.ram[addr];

                let out = eval(comp, a0, d0, m0);
                let taken = jump_taken(jump, out);

                if *dest_m {
                    self.ram[addr] = out;
                }
                if *dest_a {
                    self.a = out;
                }
                if *dest_d {
                    self.d = out;
                }

                if taken {
                    let target = (a0 as u16 & 0x7FFF) as usize;
                    if self.is_spin(target) {
                        return false;
                    }
                    self.pc = target;
                } else {
                    self.pc += 1;
                }
            }
        }
        true
    }

    /// A taken jump lands in a terminal spin when it targets the current
    /// instruction, or the `(L)` / `@L` / `0;JMP` idiom: a load of its
    /// own index followed by the jump we are executing.
    fn is_spin(&self, target: usize) -> bool {
        target == self.pc
            || (target + 1 == self.pc
                && matches!(self.instrs.get(target), Some(Instr::Load(v)) if *v as usize == target))
    }

    /// Run to halt, panicking if the program never settles.
    pub fn run(&mut self) {
        for _ in 0..MAX_STEPS {
            if !self.step() {
                return;
            }
        }
        panic!("program did not halt within {MAX_STEPS} steps");
    }

    /// Load, seed RAM cells, and run to halt.
    pub fn execute(asm: &str, seed: &[(usize, i16)]) -> Self {
        let mut machine = Self::load(asm);
        for &(addr, value) in seed {
            machine.ram[addr] = value;
        }
        machine.run();
        machine
    }
}

fn parse_compute(line: &str) -> Instr {
    let (dest, rest) = match line.split_once('=') {
        Some((dest, rest)) => (dest, rest),
        None => ("", line),
    };
    let (comp, jump) = match rest.split_once(';') {
        Some((comp, jump)) => (comp, jump),
        None => (rest, ""),
    };
    Instr::Compute {
        dest_a: dest.contains('A'),
        dest_d: dest.contains('D'),
        dest_m: dest.contains('M'),
        comp: comp.to_string(),
        jump: jump.to_string(),
    }
}

/// The ALU function table, in two's-complement wrapping arithmetic.
fn eval(comp: &str, a: i16, d: i16, m: i16) -> i16 {
    match comp {
        "0" => 0,
        "1" => 1,
        "-1" => -1,
        "D" => d,
        "A" => a,
        "M" => m,
        "!D" => !d,
        "!A" => !a,
        "!M" => !m,
        "-D" => d.wrapping_neg(),
        "-A" => a.wrapping_neg(),
        "-M" => m.wrapping_neg(),
        "D+1" => d.wrapping_add(1),
        "A+1" => a.wrapping_add(1),
        "M+1" => m.wrapping_add(1),
        "D-1" => d.wrapping_sub(1),
        "A-1" => a.wrapping_sub(1),
        "M-1" => m.wrapping_sub(1),
        "D+A" | "A+D" => d.wrapping_add(a),
        "D+M" | "M+D" => d.wrapping_add(m),
        "D-A" => d.wrapping_sub(a),
        "D-M" => d.wrapping_sub(m),
        "A-D" => a.wrapping_sub(d),
        "M-D" => m.wrapping_sub(d),
        "D&A" | "A&D" => d & a,
        "D&M" | "M&D" => d & m,
        "D|A" | "A|D" => d | a,
        "D|M" | "M|D" => d | m,
        other => panic!("unsupported comp field: {other}"),
    }
}

fn jump_taken(jump: &str, out: i16) -> bool {
    match jump {
        "" => false,
        "JGT" => out > 0,
        "JEQ" => out == 0,
        "JGE" => out >= 0,
        "JLT" => out < 0,
        "JNE" => out != 0,
        "JLE" => out <= 0,
        "JMP" => true,
        other => panic!("unsupported jump field: {other}"),
    }
}
