//! The code generator: one classified command in, a stream of Hack
//! instructions out.
//!
//! [`Generator`] is the only mutable state in the pipeline. It owns the
//! label counters (one per comparison kind, plus a per-call-site map for
//! return addresses), the current function name used to scope flow
//! labels, and the current unit name used to namespace statics. One
//! instance lives for a whole program translation, shared across units,
//! so synthesized labels are unique program-wide.

use std::collections::HashMap;

use crate::asm::AsmWriter;
use crate::command::{Command, CommandKind, Op, Segment};

/// First stack cell; SP starts here.
pub const STACK_BASE: u16 = 256;
/// The temp segment occupies RAM[5..=12].
pub const TEMP_BASE: u16 = 5;
/// Scratch cell for indirect-pop address arithmetic and the return
/// frame snapshot.
const SCRATCH: &str = "R13";
/// Holds the captured return address while the frame is torn down.
const RET_ADDR: &str = "R14";
/// Function the bootstrap prologue transfers into.
pub const ENTRY_FUNCTION: &str = "Sys.init";
/// Cells in a call frame: return address + LCL, ARG, THIS, THAT.
const FRAME_WORDS: u16 = 5;

/// Code generator state for one program translation.
#[derive(Debug, Default)]
pub struct Generator {
    eq_count: u32,
    gt_count: u32,
    lt_count: u32,
    /// Occurrences of each (enclosing scope, source line) call site.
    ret_sites: HashMap<(String, usize), u32>,
    current_function: String,
    unit: String,
}

impl Generator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a compilation unit: statics emitted from here on resolve to
    /// `name.i`, and flow labels outside any function scope to `name`.
    pub fn set_unit(&mut self, name: &str) {
        self.unit = name.to_string();
    }

    /// Name of the function currently being emitted, if any.
    pub fn current_function(&self) -> &str {
        &self.current_function
    }

    /// Translate one command, appending its instructions to `asm`.
    ///
    /// Infallible: the classifier has already rejected every command the
    /// generator must not see.
    pub fn emit(&mut self, cmd: &Command, asm: &mut AsmWriter) {
        asm.comment(&cmd.kind);
        match &cmd.kind {
            CommandKind::Arithmetic(op) => self.emit_arithmetic(*op, asm),
            CommandKind::Push { segment, index } => self.emit_push(*segment, *index, asm),
            CommandKind::Pop { segment, index } => self.emit_pop(*segment, *index, asm),
            CommandKind::Label(name) => asm.mark(&self.scoped(name)),
            CommandKind::Goto(name) => asm.jump(&self.scoped(name)),
            CommandKind::IfGoto(name) => {
                asm.pop_d();
                asm.at(&self.scoped(name));
                asm.ins("D;JNE");
            }
            CommandKind::Function { name, locals } => self.emit_function(name, *locals, asm),
            CommandKind::Call { name, args } => {
                let ret = self.ret_label(cmd.line);
                self.emit_call(name, *args, &ret, asm);
            }
            CommandKind::Return => self.emit_return(asm),
        }
    }

    /// The fixed program prologue: SP = 256, then a full `call Sys.init 0`
    /// so no translated code ever runs outside a call frame. A halt loop
    /// follows in case the entry function ever returns.
    ///
    /// Emitted through the generator so the label state is shared with
    /// the translated program; `BOOT$ret.0` cannot collide with call-site
    /// labels because source lines are 1-based.
    pub fn emit_bootstrap(&mut self, asm: &mut AsmWriter) {
        asm.comment("bootstrap");
        asm.at_index(STACK_BASE);
        asm.ins("D=A");
        asm.at("SP");
        asm.ins("M=D");
        self.emit_call(ENTRY_FUNCTION, 0, "BOOT$ret.0", asm);
        asm.mark("BOOT$halt");
        asm.jump("BOOT$halt");
    }

    // ---- arithmetic / logic -----------------------------------------------

    fn emit_arithmetic(&mut self, op: Op, asm: &mut AsmWriter) {
        match op {
            Op::Add => self.emit_binary("M=D+M", asm),
            Op::Sub => self.emit_binary("M=M-D", asm),
            Op::And => self.emit_binary("M=D&M", asm),
            Op::Or => self.emit_binary("M=D|M", asm),
            Op::Neg => self.emit_unary("M=-M", asm),
            Op::Not => self.emit_unary("M=!M", asm),
            Op::Eq | Op::Gt | Op::Lt => self.emit_compare(op, asm),
        }
    }

    /// Pop y into D, then combine into x in place. Net stack delta -1.
    fn emit_binary(&self, combine: &str, asm: &mut AsmWriter) {
        asm.pop_d();
        asm.ins("A=A-1");
        asm.ins(combine);
    }

    /// Rewrite the top cell in place. Net stack delta 0.
    fn emit_unary(&self, rewrite: &str, asm: &mut AsmWriter) {
        asm.at("SP");
        asm.ins("A=M-1");
        asm.ins(rewrite);
    }

    /// Compute d = x - y and branch on the operator's sign/zero test,
    /// leaving all-ones for true and all-zeros for false. Each kind has
    /// its own monotonic counter, so every comparison instance gets a
    /// fresh label pair.
    fn emit_compare(&mut self, op: Op, asm: &mut AsmWriter) {
        let (tag, jump, counter) = match op {
            Op::Eq => ("EQ", "D;JEQ", &mut self.eq_count),
            Op::Gt => ("GT", "D;JGT", &mut self.gt_count),
            Op::Lt => ("LT", "D;JLT", &mut self.lt_count),
            _ => unreachable!("only comparisons reach emit_compare"),
        };
        let n = next(counter);
        let when_true = format!("{tag}_TRUE_{n}");
        let done = format!("{tag}_END_{n}");

        asm.pop_d();
        asm.ins("A=A-1");
        asm.ins("D=M-D");
        asm.at(&when_true);
        asm.ins(jump);
        asm.at("SP");
        asm.ins("A=M-1");
        asm.ins("M=0");
        asm.jump(&done);
        asm.mark(&when_true);
        asm.at("SP");
        asm.ins("A=M-1");
        asm.ins("M=-1");
        asm.mark(&done);
    }

    // ---- memory access -----------------------------------------------------

    fn emit_push(&self, segment: Segment, index: u16, asm: &mut AsmWriter) {
        match segment {
            Segment::Constant => {
                asm.at_index(index);
                asm.ins("D=A");
            }
            Segment::Local | Segment::Argument | Segment::This | Segment::That => {
                if let Some(base) = segment.base_symbol() {
                    asm.at_index(index);
                    asm.ins("D=A");
                    asm.at(base);
                    asm.ins("A=D+M");
                    asm.ins("D=M");
                }
            }
            Segment::Temp => {
                asm.at_index(TEMP_BASE + index);
                asm.ins("D=M");
            }
            // Reads the base register itself, no indirection.
            Segment::Pointer => {
                asm.at(pointer_register(index));
                asm.ins("D=M");
            }
            Segment::Static => {
                asm.at(&self.static_symbol(index));
                asm.ins("D=M");
            }
        }
        asm.push_d();
    }

    fn emit_pop(&self, segment: Segment, index: u16, asm: &mut AsmWriter) {
        match segment {
            // Classifier-rejected; nothing meaningful to emit.
            Segment::Constant => debug_assert!(false, "classifier rejects pop constant"),
            Segment::Local | Segment::Argument | Segment::This | Segment::That => {
                if let Some(base) = segment.base_symbol() {
                    asm.at_index(index);
                    asm.ins("D=A");
                    asm.at(base);
                    asm.ins("D=D+M");
                    asm.at(SCRATCH);
                    asm.ins("M=D");
                    asm.pop_d();
                    asm.at(SCRATCH);
                    asm.ins("A=M");
                    asm.ins("M=D");
                }
            }
            Segment::Temp => {
                asm.pop_d();
                asm.at_index(TEMP_BASE + index);
                asm.ins("M=D");
            }
            // Overwrites the base register itself, no indirection.
            Segment::Pointer => {
                asm.pop_d();
                asm.at(pointer_register(index));
                asm.ins("M=D");
            }
            Segment::Static => {
                asm.pop_d();
                asm.at(&self.static_symbol(index));
                asm.ins("M=D");
            }
        }
    }

    fn static_symbol(&self, index: u16) -> String {
        format!("{}.{}", self.unit, index)
    }

    // ---- functions ----------------------------------------------------------

    fn emit_function(&mut self, name: &str, locals: u16, asm: &mut AsmWriter) {
        self.current_function = name.to_string();
        asm.mark(name);
        for _ in 0..locals {
            asm.at("SP");
            asm.ins("A=M");
            asm.ins("M=0");
            asm.at("SP");
            asm.ins("M=M+1");
        }
    }

    /// Push the return address and the caller's four base registers,
    /// reposition ARG below the arguments, point LCL at the new frame
    /// top, and transfer. The return label lands right after the jump.
    fn emit_call(&self, name: &str, args: u16, ret: &str, asm: &mut AsmWriter) {
        asm.at(ret);
        asm.ins("D=A");
        asm.push_d();
        for reg in ["LCL", "ARG", "THIS", "THAT"] {
            asm.at(reg);
            asm.ins("D=M");
            asm.push_d();
        }
        // ARG = SP - args - 5
        asm.at("SP");
        asm.ins("D=M");
        asm.at_index(args + FRAME_WORDS);
        asm.ins("D=D-A");
        asm.at("ARG");
        asm.ins("M=D");
        // LCL = SP
        asm.at("SP");
        asm.ins("D=M");
        asm.at("LCL");
        asm.ins("M=D");
        asm.jump(name);
        asm.mark(ret);
    }

    /// Return-address label for a call at `line`: `scope$ret.line`. The
    /// per-site map appends `.k` should the same (scope, line) key ever
    /// repeat, so uniqueness holds unconditionally.
    fn ret_label(&mut self, line: usize) -> String {
        let scope = if self.current_function.is_empty() {
            &self.unit
        } else {
            &self.current_function
        };
        let seen = self
            .ret_sites
            .entry((scope.clone(), line))
            .or_insert(0);
        let k = *seen;
        *seen += 1;
        if k == 0 {
            format!("{scope}$ret.{line}")
        } else {
            format!("{scope}$ret.{line}.{k}")
        }
    }

    /// Snapshot the frame first; everything else is read relative to it.
    /// The restore order THAT, THIS, ARG, LCL matters: ARG and LCL are
    /// still needed (ARG for the result slot, the snapshot for the
    /// offsets) until their saved values have been read.
    fn emit_return(&self, asm: &mut AsmWriter) {
        // R13 = LCL (the frame), R14 = *(frame - 5) (return address)
        asm.at("LCL");
        asm.ins("D=M");
        asm.at(SCRATCH);
        asm.ins("M=D");
        asm.at_index(FRAME_WORDS);
        asm.ins("A=D-A");
        asm.ins("D=M");
        asm.at(RET_ADDR);
        asm.ins("M=D");
        // *ARG = pop(); the return value lands where the caller's
        // stack top will be
        asm.pop_d();
        asm.at("ARG");
        asm.ins("A=M");
        asm.ins("M=D");
        // SP = ARG + 1 discards the whole callee frame in one step
        asm.at("ARG");
        asm.ins("D=M+1");
        asm.at("SP");
        asm.ins("M=D");
        // THAT = *(frame-1), THIS = *(frame-2), ARG = *(frame-3),
        // LCL = *(frame-4)
        for reg in ["THAT", "THIS", "ARG", "LCL"] {
            asm.at(SCRATCH);
            asm.ins("AM=M-1");
            asm.ins("D=M");
            asm.at(reg);
            asm.ins("M=D");
        }
        asm.at(RET_ADDR);
        asm.ins("A=M");
        asm.ins("0;JMP");
    }

    /// Flow-label scoping: the innermost enclosing function, else the
    /// unit for top-level code.
    fn scoped(&self, label: &str) -> String {
        if !self.current_function.is_empty() {
            format!("{}${}", self.current_function, label)
        } else if !self.unit.is_empty() {
            format!("{}${}", self.unit, label)
        } else {
            label.to_string()
        }
    }
}

fn next(counter: &mut u32) -> u32 {
    let n = *counter;
    *counter += 1;
    n
}

fn pointer_register(index: u16) -> &'static str {
    if index == 0 { "THIS" } else { "THAT" }
}
