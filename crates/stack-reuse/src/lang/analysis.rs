use super::{
    ast::{Block, Expression, Statement},
    interner::{Interner, Symbol},
};
use crate::{Diagnostic, PlatformVersion};

/// Scoping and typing checks. Returns every problem found; warnings do not reject the program.
pub(super) fn analyze(
    block: &Block,
    interner: &Interner,
    version: PlatformVersion,
) -> Vec<Diagnostic> {
    let mut analyzer = Analyzer {
        interner,
        version,
        scopes: vec![],
        diagnostics: vec![],
    };
    analyzer.block(block);
    analyzer.diagnostics
}

struct Variable {
    name: Symbol,
    used: bool,
}

struct Analyzer<'a> {
    interner: &'a Interner,
    version: PlatformVersion,
    scopes: Vec<Vec<Variable>>,
    diagnostics: Vec<Diagnostic>,
}

impl Analyzer<'_> {
    fn block(&mut self, block: &Block) {
        self.scopes.push(vec![]);
        for statement in &block.statements {
            self.statement(statement);
        }
        for variable in self.scopes.pop().into_iter().flatten() {
            if !variable.used {
                let name = self.interner.resolve(variable.name);
                self.diagnostics
                    .push(Diagnostic::warning(format!("unused variable `{name}`")));
            }
        }
    }

    fn statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Let { name, value } => {
                if let Some(value) = value {
                    self.value(value);
                }
                if self.lookup(*name).is_some() {
                    let name = self.interner.resolve(*name);
                    self.error(format!("variable `{name}` shadows an existing declaration"));
                }
                if let Some(scope) = self.scopes.last_mut() {
                    scope.push(Variable {
                        name: *name,
                        used: false,
                    });
                }
            }
            Statement::Assign { name, value } => {
                self.value(value);
                if self.lookup(*name).is_none() {
                    let name = self.interner.resolve(*name);
                    self.error(format!("assignment to undeclared variable `{name}`"));
                }
            }
            Statement::If { condition, body } => {
                self.value(condition);
                self.block(body);
            }
            Statement::Expression(expression) => {
                if self.expression(expression) {
                    self.error(format!(
                        "value of {} is discarded, wrap it in `pop`",
                        self.describe(expression)
                    ));
                }
            }
            Statement::Block(block) => self.block(block),
        }
    }

    /// Checks an expression that must produce a value.
    fn value(&mut self, expression: &Expression) {
        if !self.expression(expression) {
            self.error(format!(
                "{} does not return a value",
                self.describe(expression)
            ));
        }
    }

    /// Checks an expression and returns whether it produces a value.
    fn expression(&mut self, expression: &Expression) -> bool {
        match expression {
            Expression::Literal(_) => true,
            Expression::Identifier(name) => {
                if let Some(variable) = self.lookup(*name) {
                    variable.used = true;
                } else {
                    let name = self.interner.resolve(*name);
                    self.error(format!("undeclared identifier `{name}`"));
                }
                true
            }
            Expression::Call { builtin, arguments } => {
                if !builtin.is_available(self.version) {
                    self.error(format!(
                        "function `{}` is not available on {}",
                        builtin.name(),
                        self.version
                    ));
                }
                if arguments.len() != builtin.arity() {
                    self.error(format!(
                        "function `{}` expects {} arguments but {} were given",
                        builtin.name(),
                        builtin.arity(),
                        arguments.len()
                    ));
                }
                for argument in arguments {
                    self.value(argument);
                }
                builtin.returns_value()
            }
        }
    }

    fn lookup(&mut self, name: Symbol) -> Option<&mut Variable> {
        self.scopes
            .iter_mut()
            .rev()
            .flat_map(|scope| scope.iter_mut())
            .find(|variable| variable.name == name)
    }

    fn describe(&self, expression: &Expression) -> String {
        match expression {
            Expression::Literal(value) => format!("literal {value}"),
            Expression::Identifier(name) => format!("`{}`", self.interner.resolve(*name)),
            Expression::Call { builtin, .. } => format!("call to `{}`", builtin.name()),
        }
    }

    fn error(&mut self, message: String) {
        self.diagnostics.push(Diagnostic::error(message));
    }
}
