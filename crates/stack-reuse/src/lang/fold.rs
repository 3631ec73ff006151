use super::ast::{Block, Expression, Statement};

/// Replaces calls of pure builtins on literal arguments with their result.
pub(super) fn fold_block(block: &mut Block) {
    for statement in &mut block.statements {
        match statement {
            Statement::Let { value, .. } => {
                if let Some(value) = value {
                    fold_expression(value);
                }
            }
            Statement::Assign { value, .. } | Statement::Expression(value) => {
                fold_expression(value);
            }
            Statement::If { condition, body } => {
                fold_expression(condition);
                fold_block(body);
            }
            Statement::Block(block) => fold_block(block),
        }
    }
}

fn fold_expression(expression: &mut Expression) {
    let Expression::Call { builtin, arguments } = expression else {
        return;
    };
    arguments.iter_mut().for_each(fold_expression);

    let constants: Option<Vec<_>> = arguments
        .iter()
        .map(|argument| match argument {
            Expression::Literal(value) => Some(*value),
            _ => None,
        })
        .collect();
    if let Some(value) = constants.and_then(|constants| builtin.evaluate(&constants)) {
        *expression = Expression::Literal(value);
    }
}

#[cfg(test)]
mod tests {
    use primitive_types::U256;

    use super::{
        super::{ast::Builtin, interner::Interner, parser::parse},
        *,
    };

    fn folded(source: &str) -> Vec<Statement> {
        let mut block = parse(source, &mut Interner::default()).unwrap();
        fold_block(&mut block);
        block.statements
    }

    #[test]
    fn nested_constants_fold() {
        assert_eq!(
            folded("{ sstore(add(1, mul(2, 3)), sub(0, 1)) }"),
            [Statement::Expression(Expression::Call {
                builtin: Builtin::Sstore,
                arguments: vec![
                    Expression::Literal(U256::from(7)),
                    Expression::Literal(U256::MAX),
                ],
            })]
        );
    }

    #[test]
    fn variables_and_state_are_not_folded() {
        let statements = folded("{ let x := 1 pop(add(x, 1)) pop(sload(2)) }");
        for statement in &statements[1..] {
            let Statement::Expression(Expression::Call { arguments, .. }) = statement else {
                panic!("unexpected statement {statement:?}");
            };
            assert!(matches!(arguments[0], Expression::Call { .. }));
        }
    }
}
