use std::collections::HashMap;

use pixardis_types::Instr;

use crate::error::AssembleError;

/// A resolved program ready for the virtual machine: instructions with every
/// jump/call target turned into an absolute index, plus the global slot
/// count the VM's `globals` array must be sized to.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub instructions: Vec<Instr>,
    pub global_count: u32,
}

/// Two-pass assembly: pass 1 walks the text recording every label's
/// instruction index (labels may be referenced before they're defined, e.g.
/// a `while` loop's forward exit jump); pass 2 re-walks the same text
/// emitting instructions, resolving `jmp`/`jz`/`jnz`/`call` operands against
/// the table pass 1 built.
pub fn assemble(source: &str) -> Result<Program, AssembleError> {
    let lines: Vec<Line> = source.lines().enumerate().map(|(i, l)| classify(i + 1, l)).collect();

    let labels = collect_labels(&lines)?;
    let global_count = collect_global_count(&lines)?;

    let mut instructions = Vec::new();
    for line in &lines {
        if let Line::Instruction { number, mnemonic, rest } = line {
            instructions.push(parse_instruction(*number, mnemonic, rest, &labels)?);
        }
    }

    Ok(Program { instructions, global_count })
}

enum Line<'a> {
    Blank,
    Directive { number: usize, name: &'a str, operand: &'a str },
    Label { number: usize, name: &'a str },
    Instruction { number: usize, mnemonic: &'a str, rest: &'a str },
}

fn classify(number: usize, raw: &str) -> Line<'_> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Line::Blank;
    }
    if let Some(rest) = trimmed.strip_prefix('.') {
        let (name, operand) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        return Line::Directive { number, name, operand: operand.trim() };
    }
    if let Some(name) = trimmed.strip_suffix(':') {
        if !name.contains(char::is_whitespace) {
            return Line::Label { number, name };
        }
    }
    let (mnemonic, rest) = trimmed.split_once(char::is_whitespace).unwrap_or((trimmed, ""));
    Line::Instruction { number, mnemonic, rest: rest.trim() }
}

fn collect_labels(lines: &[Line]) -> Result<HashMap<String, usize>, AssembleError> {
    let mut labels = HashMap::new();
    let mut index = 0usize;
    for line in lines {
        match line {
            Line::Instruction { .. } => index += 1,
            Line::Label { number, name } => {
                if labels.insert(name.to_string(), index).is_some() {
                    return Err(AssembleError::DuplicateLabel { line: *number, label: name.to_string() });
                }
            }
            Line::Blank | Line::Directive { .. } => {}
        }
    }
    Ok(labels)
}

fn collect_global_count(lines: &[Line]) -> Result<u32, AssembleError> {
    for line in lines {
        if let Line::Directive { number, name, operand } = line {
            if *name == "globals" {
                return operand
                    .parse::<u32>()
                    .map_err(|_| AssembleError::InvalidOperand {
                        line: *number,
                        mnemonic: ".globals".to_string(),
                        operand: operand.to_string(),
                    });
            }
        }
    }
    Err(AssembleError::MissingGlobalsDirective)
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Local(u32),
    Indexed(u32),
    Global(u32),
    IndexedGlobal(u32),
}

fn parse_slot(s: &str) -> Option<Slot> {
    if let Some(inner) = s.strip_prefix("+g[").and_then(|s| s.strip_suffix(']')) {
        return inner.parse().ok().map(Slot::IndexedGlobal);
    }
    if let Some(inner) = s.strip_prefix("g[").and_then(|s| s.strip_suffix(']')) {
        return inner.parse().ok().map(Slot::Global);
    }
    if let Some(inner) = s.strip_prefix("+[").and_then(|s| s.strip_suffix(']')) {
        return inner.parse().ok().map(Slot::Indexed);
    }
    if let Some(inner) = s.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        return inner.parse().ok().map(Slot::Local);
    }
    None
}

fn operands(rest: &str) -> Vec<&str> {
    if rest.is_empty() {
        Vec::new()
    } else {
        rest.split(',').map(|s| s.trim()).collect()
    }
}

fn invalid(line: usize, mnemonic: &str, operand: &str) -> AssembleError {
    AssembleError::InvalidOperand { line, mnemonic: mnemonic.to_string(), operand: operand.to_string() }
}

fn wrong_count(line: usize, mnemonic: &str, expected: usize, found: usize) -> AssembleError {
    AssembleError::WrongOperandCount { line, mnemonic: mnemonic.to_string(), expected, found }
}

fn resolve_label(line: usize, label: &str, labels: &HashMap<String, usize>) -> Result<usize, AssembleError> {
    labels.get(label).copied().ok_or_else(|| AssembleError::UnresolvedLabel { line, label: label.to_string() })
}

fn parse_instruction(
    line: usize,
    mnemonic: &str,
    rest: &str,
    labels: &HashMap<String, usize>,
) -> Result<Instr, AssembleError> {
    let ops = operands(rest);
    let one = |n: usize| -> Result<&str, AssembleError> {
        if ops.len() != n {
            Err(wrong_count(line, mnemonic, n, ops.len()))
        } else {
            Ok(ops[0])
        }
    };

    match mnemonic {
        "push" => {
            let operand = one(1)?;
            if let Some(slot) = parse_slot(operand) {
                return Ok(match slot {
                    Slot::Local(n) => Instr::PushLocal(n),
                    Slot::Indexed(n) => Instr::PushIndexed(n),
                    Slot::Global(n) => Instr::PushGlobal(n),
                    Slot::IndexedGlobal(n) => Instr::PushIndexedGlobal(n),
                });
            }
            if operand == "true" {
                return Ok(Instr::PushBool(true));
            }
            if operand == "false" {
                return Ok(Instr::PushBool(false));
            }
            if let Some(hex) = operand.strip_prefix('#') {
                return u32::from_str_radix(hex, 16)
                    .map(Instr::PushColour)
                    .map_err(|_| invalid(line, mnemonic, operand));
            }
            if let Ok(v) = operand.parse::<i32>() {
                return Ok(Instr::PushInt(v));
            }
            if let Ok(v) = operand.parse::<f64>() {
                return Ok(Instr::PushFloat(v));
            }
            Err(invalid(line, mnemonic, operand))
        }
        "pop" => {
            let operand = one(1)?;
            match parse_slot(operand) {
                Some(Slot::Local(n)) => Ok(Instr::PopLocal(n)),
                Some(Slot::Indexed(n)) => Ok(Instr::PopIndexed(n)),
                Some(Slot::Global(n)) => Ok(Instr::PopGlobal(n)),
                Some(Slot::IndexedGlobal(n)) => Ok(Instr::PopIndexedGlobal(n)),
                None => Err(invalid(line, mnemonic, operand)),
            }
        }
        "oframe" => one(1)?.parse().map(Instr::OFrame).map_err(|_| invalid(line, mnemonic, rest)),
        "call" => {
            if ops.len() != 2 {
                return Err(wrong_count(line, mnemonic, 2, ops.len()));
            }
            let target = resolve_label(line, ops[0], labels)?;
            let nargs = ops[1].parse::<u8>().map_err(|_| invalid(line, mnemonic, ops[1]))?;
            Ok(Instr::Call(target, nargs))
        }
        "jmp" => resolve_label(line, one(1)?, labels).map(Instr::Jmp),
        "jz" => resolve_label(line, one(1)?, labels).map(Instr::Jz),
        "jnz" => resolve_label(line, one(1)?, labels).map(Instr::Jnz),
        "dup" => nullary(line, mnemonic, &ops, Instr::Dup),
        "drop" => nullary(line, mnemonic, &ops, Instr::Drop),
        "add" => nullary(line, mnemonic, &ops, Instr::Add),
        "sub" => nullary(line, mnemonic, &ops, Instr::Sub),
        "mul" => nullary(line, mnemonic, &ops, Instr::Mul),
        "div" => nullary(line, mnemonic, &ops, Instr::Div),
        "mod" => nullary(line, mnemonic, &ops, Instr::Mod),
        "neg" => nullary(line, mnemonic, &ops, Instr::Neg),
        "eq" => nullary(line, mnemonic, &ops, Instr::Eq),
        "ne" => nullary(line, mnemonic, &ops, Instr::Ne),
        "lt" => nullary(line, mnemonic, &ops, Instr::Lt),
        "le" => nullary(line, mnemonic, &ops, Instr::Le),
        "gt" => nullary(line, mnemonic, &ops, Instr::Gt),
        "ge" => nullary(line, mnemonic, &ops, Instr::Ge),
        "and" => nullary(line, mnemonic, &ops, Instr::And),
        "or" => nullary(line, mnemonic, &ops, Instr::Or),
        "not" => nullary(line, mnemonic, &ops, Instr::Not),
        "ret" => nullary(line, mnemonic, &ops, Instr::Ret),
        "halt" => nullary(line, mnemonic, &ops, Instr::Halt),
        "cframe" => nullary(line, mnemonic, &ops, Instr::CFrame),
        "itof" => nullary(line, mnemonic, &ops, Instr::ItoF),
        "ftoi" => nullary(line, mnemonic, &ops, Instr::FtoI),
        "itoc" => nullary(line, mnemonic, &ops, Instr::ItoC),
        "ctoi" => nullary(line, mnemonic, &ops, Instr::CtoI),
        "btoi" => nullary(line, mnemonic, &ops, Instr::BtoI),
        "itob" => nullary(line, mnemonic, &ops, Instr::ItoB),
        "clear" => nullary(line, mnemonic, &ops, Instr::Clear),
        "write_pixel" => nullary(line, mnemonic, &ops, Instr::WritePixel),
        "write_box" => nullary(line, mnemonic, &ops, Instr::WriteBox),
        "read_pixel" => nullary(line, mnemonic, &ops, Instr::ReadPixel),
        "width" => nullary(line, mnemonic, &ops, Instr::Width),
        "height" => nullary(line, mnemonic, &ops, Instr::Height),
        "rand" => nullary(line, mnemonic, &ops, Instr::Rand),
        "print" => nullary(line, mnemonic, &ops, Instr::Print),
        "delay" => nullary(line, mnemonic, &ops, Instr::Delay),
        other => Err(AssembleError::UnknownMnemonic { line, mnemonic: other.to_string() }),
    }
}

fn nullary(line: usize, mnemonic: &str, ops: &[&str], instr: Instr) -> Result<Instr, AssembleError> {
    if ops.is_empty() {
        Ok(instr)
    } else {
        Err(wrong_count(line, mnemonic, 0, ops.len()))
    }
}
