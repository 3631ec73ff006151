use std::collections::HashSet;

use primitive_types::U256;

use super::{
    ast::{Block, Expression, Statement},
    interner::{Interner, Symbol},
};
use crate::{opcodes, PlatformVersion, StackTooDeepError};

/// What the compiler knows about one slot of the runtime stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Variable(Symbol),
    /// Intermediate value of the expression being evaluated.
    Temporary,
    /// Held a variable that is no longer live.
    Free,
}

/// Emits code for an analyzed program.
///
/// Every variable lives in a stack slot for as long as it is in scope. With `reuse_slots` set, a
/// variable's slot is released after the statement that last mentions it: released slots on top
/// of the stack are popped, others are taken over by the next declaration in the same block.
pub(super) struct CodeGenerator<'a> {
    interner: &'a Interner,
    version: PlatformVersion,
    reuse_slots: bool,
    code: Vec<u8>,
    /// Bottom to top.
    slots: Vec<Slot>,
}

impl<'a> CodeGenerator<'a> {
    pub(super) fn new(interner: &'a Interner, version: PlatformVersion, reuse_slots: bool) -> Self {
        Self {
            interner,
            version,
            reuse_slots,
            code: vec![],
            slots: vec![],
        }
    }

    pub(super) fn generate(mut self, program: &Block) -> Result<Vec<u8>, StackTooDeepError> {
        self.block(program)?;
        self.code.push(opcodes::STOP);
        Ok(self.code)
    }

    fn block(&mut self, block: &Block) -> Result<(), StackTooDeepError> {
        let base = self.slots.len();
        let mentions: Vec<HashSet<Symbol>> = block
            .statements
            .iter()
            .map(|statement| {
                let mut symbols = HashSet::new();
                collect_statement(statement, &mut symbols);
                symbols
            })
            .collect();

        for (index, statement) in block.statements.iter().enumerate() {
            self.statement(statement, base)?;
            if self.reuse_slots {
                let later = &mentions[index + 1..];
                for slot in &mut self.slots[base..] {
                    if let Slot::Variable(name) = *slot {
                        if !later.iter().any(|symbols| symbols.contains(&name)) {
                            *slot = Slot::Free;
                        }
                    }
                }
                while self.slots.len() > base && self.slots.last() == Some(&Slot::Free) {
                    self.pop();
                }
            }
        }

        while self.slots.len() > base {
            self.pop();
        }
        Ok(())
    }

    fn statement(&mut self, statement: &Statement, base: usize) -> Result<(), StackTooDeepError> {
        match statement {
            Statement::Let { name, value } => {
                match value {
                    Some(value) => self.expression(value)?,
                    None => self.literal(U256::zero()),
                }
                self.declare(*name, base);
            }
            Statement::Assign { name, value } => {
                self.expression(value)?;
                let depth = self.depth_of(*name);
                if !self.store(depth) {
                    return Err(self.too_deep(*name, depth));
                }
            }
            Statement::If { condition, body } => {
                self.expression(condition)?;
                self.code.push(opcodes::ISZERO);
                self.code.push(opcodes::PUSH2);
                let label = self.code.len();
                self.code.extend([0, 0]);
                self.code.push(opcodes::JUMPI);
                self.slots.pop();

                self.block(body)?;

                // Targets beyond the 16-bit range are rejected once the whole program is emitted.
                #[allow(clippy::cast_possible_truncation)]
                let destination = self.code.len() as u16;
                self.code[label..label + 2].copy_from_slice(&destination.to_be_bytes());
                self.code.push(opcodes::JUMPDEST);
            }
            Statement::Expression(expression) => self.expression(expression)?,
            Statement::Block(block) => self.block(block)?,
        }
        Ok(())
    }

    /// Binds the value on top of the stack to `name`.
    fn declare(&mut self, name: Symbol, base: usize) {
        if self.reuse_slots {
            let free = self.slots[base..]
                .iter()
                .rposition(|slot| *slot == Slot::Free)
                .map(|offset| base + offset);
            if let Some(index) = free {
                let depth = self.slots.len() - index;
                if self.store(depth) {
                    self.slots[index] = Slot::Variable(name);
                    return;
                }
            }
        }
        if let Some(top) = self.slots.last_mut() {
            *top = Slot::Variable(name);
        }
    }

    /// Moves the top of the stack into the slot at `depth` and drops the previous value.
    /// Returns `false` without emitting anything if the slot is out of reach.
    fn store(&mut self, depth: usize) -> bool {
        let Some(swap) = depth.checked_sub(1).and_then(opcodes::swap) else {
            return false;
        };
        self.code.push(swap);
        self.pop();
        true
    }

    fn expression(&mut self, expression: &Expression) -> Result<(), StackTooDeepError> {
        match expression {
            Expression::Literal(value) => self.literal(*value),
            Expression::Identifier(name) => {
                let depth = self.depth_of(*name);
                let dup = opcodes::dup(depth).ok_or_else(|| self.too_deep(*name, depth))?;
                self.code.push(dup);
                self.slots.push(Slot::Temporary);
            }
            Expression::Call { builtin, arguments } => {
                for argument in arguments.iter().rev() {
                    self.expression(argument)?;
                }
                self.code.push(builtin.opcode());
                self.slots.truncate(self.slots.len() - arguments.len());
                if builtin.returns_value() {
                    self.slots.push(Slot::Temporary);
                }
            }
        }
        Ok(())
    }

    fn literal(&mut self, value: U256) {
        if value.is_zero() && self.version.has_push0() {
            self.code.push(opcodes::PUSH0);
        } else {
            let mut bytes = [0; 32];
            value.to_big_endian(&mut bytes);
            let len = value.bits().div_ceil(8).max(1);
            // `len` is in `1..=32`, so the opcode always exists.
            self.code.extend(opcodes::push(len));
            self.code.extend_from_slice(&bytes[32 - len..]);
        }
        self.slots.push(Slot::Temporary);
    }

    fn pop(&mut self) {
        self.code.push(opcodes::POP);
        self.slots.pop();
    }

    /// Distance of the variable from the top of the stack, where 1 is the top.
    fn depth_of(&self, name: Symbol) -> usize {
        self.slots
            .iter()
            .rposition(|slot| *slot == Slot::Variable(name))
            .map_or(0, |index| self.slots.len() - index)
    }

    fn too_deep(&self, name: Symbol, depth: usize) -> StackTooDeepError {
        StackTooDeepError {
            variable: self.interner.resolve(name).to_owned(),
            depth,
        }
    }
}

fn collect_statement(statement: &Statement, symbols: &mut HashSet<Symbol>) {
    match statement {
        Statement::Let { name, value } => {
            symbols.insert(*name);
            if let Some(value) = value {
                collect_expression(value, symbols);
            }
        }
        Statement::Assign { name, value } => {
            symbols.insert(*name);
            collect_expression(value, symbols);
        }
        Statement::If { condition, body } => {
            collect_expression(condition, symbols);
            body.statements
                .iter()
                .for_each(|statement| collect_statement(statement, symbols));
        }
        Statement::Expression(expression) => collect_expression(expression, symbols),
        Statement::Block(block) => block
            .statements
            .iter()
            .for_each(|statement| collect_statement(statement, symbols)),
    }
}

fn collect_expression(expression: &Expression, symbols: &mut HashSet<Symbol>) {
    match expression {
        Expression::Literal(_) => {}
        Expression::Identifier(name) => {
            symbols.insert(*name);
        }
        Expression::Call { arguments, .. } => arguments
            .iter()
            .for_each(|argument| collect_expression(argument, symbols)),
    }
}
