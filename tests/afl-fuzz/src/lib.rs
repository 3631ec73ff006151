//! Structured fuzz input for the stack reuse oracle and its rendering to strict-assembly source.

use arbitrary::Arbitrary;
use stack_reuse::{GeneratedProgram, ProgramGenerator};
use stack_reuse_interface::PlatformVersion;

/// Program shape chosen by the fuzzer.
#[derive(Arbitrary, Debug, Clone)]
pub struct FuzzProgram {
    /// Target platform version.
    pub version: PlatformVersion,
    /// Statements of the outermost block.
    pub body: Vec<FuzzStatement>,
}

#[derive(Arbitrary, Debug, Clone)]
#[allow(missing_docs)]
pub enum FuzzStatement {
    Let(Option<FuzzExpression>),
    /// Variables are picked by index among those in scope.
    Assign(u8, FuzzExpression),
    Store(FuzzExpression, FuzzExpression),
    Pop(FuzzExpression),
    If(FuzzExpression, Vec<FuzzStatement>),
    Block(Vec<FuzzStatement>),
}

#[derive(Arbitrary, Debug, Clone)]
#[allow(missing_docs)]
pub enum FuzzExpression {
    Literal(u64),
    Variable(u8),
    Load(Box<FuzzExpression>),
    Unary(UnaryOp, Box<FuzzExpression>),
    Binary(BinaryOp, Box<FuzzExpression>, Box<FuzzExpression>),
}

#[derive(Arbitrary, Debug, Clone, Copy)]
#[allow(missing_docs)]
pub enum UnaryOp {
    IsZero,
    Not,
}

// Shifts are left out since they do not exist on every version, and `revert` since the oracle
// treats reverts as bugs.
#[derive(Arbitrary, Debug, Clone, Copy)]
#[allow(missing_docs)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Gt,
    Eq,
    And,
    Or,
    Xor,
}

impl UnaryOp {
    fn name(self) -> &'static str {
        match self {
            Self::IsZero => "iszero",
            Self::Not => "not",
        }
    }
}

impl BinaryOp {
    fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Mod => "mod",
            Self::Lt => "lt",
            Self::Gt => "gt",
            Self::Eq => "eq",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
        }
    }
}

/// Renders a [`FuzzProgram`] as source text that the reference compiler accepts.
///
/// Every declaration gets a fresh name, so there is no shadowing. References to variables are
/// resolved modulo the variables in scope and fall back to `0` (or are dropped, for assignments)
/// when there are none.
#[derive(Debug, Default)]
pub struct SourceRenderer {
    scopes: Vec<Vec<String>>,
    declared: usize,
    source: String,
}

impl ProgramGenerator for SourceRenderer {
    type Input = FuzzProgram;

    fn generate(&mut self, input: &FuzzProgram) -> GeneratedProgram {
        self.scopes.clear();
        self.declared = 0;
        self.source.clear();

        self.block(&input.body, 0);
        self.source.push('\n');
        GeneratedProgram {
            source: std::mem::take(&mut self.source),
            version: input.version,
        }
    }
}

impl SourceRenderer {
    fn block(&mut self, statements: &[FuzzStatement], indent: usize) {
        self.source.push('{');
        self.scopes.push(vec![]);
        for statement in statements {
            self.statement(statement, indent + 1);
        }
        self.scopes.pop();
        self.newline(indent);
        self.source.push('}');
    }

    fn statement(&mut self, statement: &FuzzStatement, indent: usize) {
        match statement {
            FuzzStatement::Let(value) => {
                let value = value.as_ref().map(|value| self.expression(value));
                let name = format!("x_{}", self.declared);
                self.declared += 1;

                self.newline(indent);
                match value {
                    Some(value) => self.source.push_str(&format!("let {name} := {value}")),
                    None => self.source.push_str(&format!("let {name}")),
                }
                if let Some(scope) = self.scopes.last_mut() {
                    scope.push(name);
                }
            }
            FuzzStatement::Assign(index, value) => {
                let Some(name) = self.variable(*index) else {
                    return;
                };
                let value = self.expression(value);
                self.newline(indent);
                self.source.push_str(&format!("{name} := {value}"));
            }
            FuzzStatement::Store(key, value) => {
                let (key, value) = (self.expression(key), self.expression(value));
                self.newline(indent);
                self.source.push_str(&format!("sstore({key}, {value})"));
            }
            FuzzStatement::Pop(value) => {
                let value = self.expression(value);
                self.newline(indent);
                self.source.push_str(&format!("pop({value})"));
            }
            FuzzStatement::If(condition, body) => {
                let condition = self.expression(condition);
                self.newline(indent);
                self.source.push_str(&format!("if {condition} "));
                self.block(body, indent);
            }
            FuzzStatement::Block(body) => {
                self.newline(indent);
                self.block(body, indent);
            }
        }
    }

    fn expression(&self, expression: &FuzzExpression) -> String {
        match expression {
            FuzzExpression::Literal(value) => value.to_string(),
            FuzzExpression::Variable(index) => self.variable(*index).unwrap_or_else(|| "0".into()),
            FuzzExpression::Load(key) => format!("sload({})", self.expression(key)),
            FuzzExpression::Unary(op, operand) => {
                format!("{}({})", op.name(), self.expression(operand))
            }
            FuzzExpression::Binary(op, left, right) => format!(
                "{}({}, {})",
                op.name(),
                self.expression(left),
                self.expression(right)
            ),
        }
    }

    fn variable(&self, index: u8) -> Option<String> {
        let visible: Vec<&String> = self.scopes.iter().flatten().collect();
        if visible.is_empty() {
            return None;
        }
        Some(visible[usize::from(index) % visible.len()].clone())
    }

    fn newline(&mut self, indent: usize) {
        self.source.push('\n');
        for _ in 0..indent {
            self.source.push_str("    ");
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use stack_reuse::{lang::AssemblyCompiler, Compiler, Configuration};

    use super::*;

    #[test]
    fn renders_nested_scopes() {
        let input = FuzzProgram {
            version: PlatformVersion::Shanghai,
            body: vec![
                FuzzStatement::Assign(0, FuzzExpression::Literal(1)),
                FuzzStatement::Let(Some(FuzzExpression::Variable(3))),
                FuzzStatement::If(
                    FuzzExpression::Load(Box::new(FuzzExpression::Variable(7))),
                    vec![
                        FuzzStatement::Let(None),
                        FuzzStatement::Assign(1, FuzzExpression::Literal(5)),
                    ],
                ),
                FuzzStatement::Store(
                    FuzzExpression::Binary(
                        BinaryOp::Sub,
                        Box::new(FuzzExpression::Variable(0)),
                        Box::new(FuzzExpression::Literal(2)),
                    ),
                    FuzzExpression::Unary(UnaryOp::Not, Box::new(FuzzExpression::Literal(0))),
                ),
            ],
        };
        let program = SourceRenderer::default().generate(&input);

        let expected = "{
    let x_0 := 0
    if sload(x_0) {
        let x_1
        x_1 := 5
    }
    sstore(sub(x_0, 2), not(0))
}
";
        assert_eq!(program.source, expected);
        assert_eq!(program.version, PlatformVersion::Shanghai);
    }

    #[test]
    fn renderer_state_does_not_leak() {
        let input = FuzzProgram {
            version: PlatformVersion::Cancun,
            body: vec![FuzzStatement::Let(None), FuzzStatement::Let(None)],
        };
        let mut renderer = SourceRenderer::default();
        let first = renderer.generate(&input);
        assert_eq!(renderer.generate(&input), first);
    }

    proptest! {
        #[test]
        fn rendered_programs_are_accepted(data in prop::collection::vec(any::<u8>(), 0..2048)) {
            let Ok(input) = arbitrary::Unstructured::new(&data).arbitrary::<FuzzProgram>() else {
                return Ok(());
            };
            let program = SourceRenderer::default().generate(&input);

            for configuration in [Configuration::Unoptimized, Configuration::Optimized] {
                let compilation = AssemblyCompiler::default().compile(
                    program.version,
                    &configuration.settings(),
                    &program.source,
                );
                if let Ok(compilation) = compilation {
                    prop_assert!(
                        compilation.contains_only_warnings(),
                        "{:?}\n{}",
                        compilation.diagnostics,
                        program.source
                    );
                    prop_assert!(compilation.bytecode.is_some());
                }
            }
        }
    }
}
