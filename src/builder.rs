//! Builds validated expression trees from declarative rule records.
//!
//! A rule arrives as a JSON object per expression. The shape of the object
//! picks the expression kind: `function` + `arguments` builds a function
//! call, `operator` with one operand builds a unary predicate, `operator`
//! with two operand sides builds a comparison. Operand sides are
//! `<entity>_attribute` keys (`actor_attribute`, `subject_attribute`,
//! `environment_attribute`) or a `value` literal. Anything else fails the
//! build, and with it the enclosing policy load.

use std::str::FromStr;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::PolicyError;
use crate::expr::{BinaryOp, Condition, EntityKind, Expr, FuncOp, Operand, Rule, UnaryOp};

// Entity precedence also fixes binary operand order: the actor side of a
// comparison is always the left operand, a `value` literal always the right.
const ATTRIBUTE_KEYS: [(&str, EntityKind); 3] = [
    ("actor_attribute", EntityKind::Actor),
    ("subject_attribute", EntityKind::Subject),
    ("environment_attribute", EntityKind::Environment),
];

pub fn build_rule(
    policy: &str,
    condition: &str,
    expressions: &[Map<String, Value>],
) -> Result<Rule, PolicyError> {
    let condition = Condition::from_str(condition).map_err(|_| PolicyError::MalformedPolicy {
        policy: policy.to_string(),
        reason: format!("unknown rule condition '{condition}'"),
    })?;

    match condition {
        Condition::Not if expressions.len() != 1 => {
            return Err(PolicyError::MalformedPolicy {
                policy: policy.to_string(),
                reason: format!(
                    "NOT requires exactly one expression, found {}",
                    expressions.len()
                ),
            });
        }
        Condition::All | Condition::Any if expressions.is_empty() => {
            return Err(PolicyError::MalformedPolicy {
                policy: policy.to_string(),
                reason: "rule requires at least one expression".to_string(),
            });
        }
        _ => {}
    }

    let expressions = expressions
        .iter()
        .enumerate()
        .map(|(index, record)| build_expression(policy, index, record))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Rule {
        condition,
        expressions,
    })
}

pub fn build_expression(
    policy: &str,
    index: usize,
    record: &Map<String, Value>,
) -> Result<Expr, PolicyError> {
    let malformed = |reason: String| PolicyError::MalformedExpression {
        policy: policy.to_string(),
        index,
        reason,
    };

    for key in record.keys() {
        let known = key == "operator"
            || key == "function"
            || key == "arguments"
            || key == "value"
            || ATTRIBUTE_KEYS.iter().any(|(name, _)| name == key);
        if !known {
            return Err(malformed(format!("unrecognized key '{key}'")));
        }
    }

    let mut operands = Vec::new();
    for (key, entity) in ATTRIBUTE_KEYS {
        if let Some(value) = record.get(key) {
            let name = value
                .as_str()
                .filter(|name| !name.is_empty())
                .ok_or_else(|| malformed(format!("'{key}' must be a non-empty string")))?;
            operands.push(Operand::attribute(entity, name));
        }
    }
    if let Some(value) = record.get("value") {
        operands.push(Operand::Literal(value.clone().into()));
    }

    match (record.get("function"), record.get("operator")) {
        (Some(_), Some(_)) => Err(malformed(
            "expression cannot name both 'function' and 'operator'".to_string(),
        )),
        (Some(function), None) => {
            let name = function
                .as_str()
                .ok_or_else(|| malformed("'function' must be a string".to_string()))?;
            let func = FuncOp::from_str(name)
                .map_err(|_| malformed(format!("unknown function '{name}'")))?;

            let arguments = record
                .get("arguments")
                .ok_or_else(|| malformed("function expression requires 'arguments'".to_string()))?
                .as_array()
                .ok_or_else(|| malformed("'arguments' must be an array".to_string()))?;
            operands.extend(
                arguments
                    .iter()
                    .map(|value| Operand::Literal(value.clone().into())),
            );

            if operands.len() != func.arity() {
                return Err(malformed(format!(
                    "'{name}' takes {} operands, found {}",
                    func.arity(),
                    operands.len()
                )));
            }
            Ok(Expr::Function {
                func,
                args: operands,
            })
        }
        (None, Some(operator)) => {
            if record.contains_key("arguments") {
                return Err(malformed(
                    "'arguments' is only valid on function expressions".to_string(),
                ));
            }
            let name = operator
                .as_str()
                .ok_or_else(|| malformed("'operator' must be a string".to_string()))?;

            match operands.len() {
                1 => {
                    let op = UnaryOp::from_str(name)
                        .map_err(|_| malformed(format!("unknown unary operator '{name}'")))?;
                    Ok(Expr::Unary {
                        op,
                        operand: operands.remove(0),
                    })
                }
                2 => {
                    let right = operands.pop().expect("two operands");
                    let left = operands.pop().expect("two operands");
                    if name == "matches" {
                        let Operand::Literal(pattern) = &right else {
                            return Err(malformed(
                                "'matches' requires a literal pattern".to_string(),
                            ));
                        };
                        let Some(pattern) = pattern.as_str() else {
                            return Err(malformed(
                                "'matches' pattern must be a string".to_string(),
                            ));
                        };
                        let regex = Regex::new(pattern).map_err(|err| {
                            malformed(format!("invalid regex pattern: {err}"))
                        })?;
                        return Ok(Expr::Match {
                            operand: left,
                            pattern: pattern.to_string(),
                            regex,
                        });
                    }
                    let op = BinaryOp::from_str(name)
                        .map_err(|_| malformed(format!("unknown binary operator '{name}'")))?;
                    Ok(Expr::Binary { op, left, right })
                }
                count => Err(malformed(format!(
                    "operator expression requires one or two operands, found {count}"
                ))),
            }
        }
        (None, None) => Err(malformed(
            "expression names neither 'operator' nor 'function'".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> Map<String, Value> {
        serde_json::from_str(json).unwrap()
    }

    fn build(json: &str) -> Result<Expr, PolicyError> {
        build_expression("test-policy", 0, &record(json))
    }

    #[test]
    fn builds_binary_between_actor_and_subject() {
        let expr = build(r#"{"operator": "eq", "actor_attribute": "id", "subject_attribute": "authorId"}"#)
            .unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Eq,
                left: Operand::attribute(EntityKind::Actor, "id"),
                right: Operand::attribute(EntityKind::Subject, "authorId"),
            }
        );
    }

    #[test]
    fn value_literal_is_always_the_right_side() {
        let expr =
            build(r#"{"operator": "in", "subject_attribute": "status", "value": ["draft", "review"]}"#)
                .unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::In,
                left: Operand::attribute(EntityKind::Subject, "status"),
                right: Operand::literal(vec!["draft", "review"]),
            }
        );
    }

    #[test]
    fn builds_unary_from_single_operand() {
        let expr = build(r#"{"operator": "is_null", "actor_attribute": "deletedAt"}"#).unwrap();
        assert_eq!(
            expr,
            Expr::Unary {
                op: UnaryOp::IsNull,
                operand: Operand::attribute(EntityKind::Actor, "deletedAt"),
            }
        );
    }

    #[test]
    fn builds_function_with_leading_attribute() {
        let expr = build(
            r#"{"function": "isBetween", "environment_attribute": "hour", "arguments": [9, 17]}"#,
        )
        .unwrap();
        assert_eq!(
            expr,
            Expr::Function {
                func: FuncOp::IsBetween,
                args: vec![
                    Operand::attribute(EntityKind::Environment, "hour"),
                    Operand::literal(9),
                    Operand::literal(17),
                ],
            }
        );
    }

    #[test]
    fn compiles_and_caches_regex_at_build_time() {
        let expr = build(
            r#"{"operator": "matches", "subject_attribute": "slug", "value": "^[a-z-]+$"}"#,
        )
        .unwrap();
        assert!(matches!(expr, Expr::Match { ref pattern, .. } if pattern == "^[a-z-]+$"));
    }

    #[yare::parameterized(
        no_operator_or_function = { r#"{"actor_attribute": "id"}"# },
        operator_and_function = { r#"{"operator": "eq", "function": "contains", "arguments": []}"# },
        unknown_key = { r#"{"operator": "eq", "actor_attribute": "id", "value": 1, "extra": true}"# },
        unknown_binary_operator = { r#"{"operator": "like", "actor_attribute": "id", "value": 1}"# },
        unknown_unary_operator = { r#"{"operator": "eq", "actor_attribute": "id"}"# },
        three_operands = { r#"{"operator": "eq", "actor_attribute": "id", "subject_attribute": "x", "value": 1}"# },
        no_operands = { r#"{"operator": "eq"}"# },
        empty_attribute_name = { r#"{"operator": "is_null", "actor_attribute": ""}"# },
        function_without_arguments = { r#"{"function": "isBetween", "environment_attribute": "hour"}"# },
        operator_with_arguments = { r#"{"operator": "eq", "actor_attribute": "id", "value": 1, "arguments": [2]}"# },
        function_wrong_arity = { r#"{"function": "isBetween", "environment_attribute": "hour", "arguments": [9]}"# },
        unknown_function = { r#"{"function": "within", "environment_attribute": "hour", "arguments": [9, 17]}"# },
        invalid_regex = { r#"{"operator": "matches", "subject_attribute": "slug", "value": "("}"# },
        non_literal_regex = { r#"{"operator": "matches", "subject_attribute": "slug", "environment_attribute": "pattern"}"# },
        non_string_regex = { r#"{"operator": "matches", "subject_attribute": "slug", "value": 5}"# },
    )]
    fn malformed_expressions_fail_the_build(json: &str) {
        let err = build(json).unwrap_err();
        assert!(matches!(
            err,
            PolicyError::MalformedExpression { ref policy, .. } if policy == "test-policy"
        ));
    }

    #[test]
    fn rule_condition_arity_is_enforced() {
        let expr = record(r#"{"operator": "is_null", "actor_attribute": "deletedAt"}"#);

        let err = build_rule("p", "NOT", &[expr.clone(), expr.clone()]).unwrap_err();
        assert!(matches!(err, PolicyError::MalformedPolicy { .. }));

        let err = build_rule("p", "AND", &[]).unwrap_err();
        assert!(matches!(err, PolicyError::MalformedPolicy { .. }));

        let err = build_rule("p", "XOR", &[expr.clone()]).unwrap_err();
        assert!(matches!(err, PolicyError::MalformedPolicy { .. }));

        assert!(build_rule("p", "NOT", &[expr]).is_ok());
    }

    #[test]
    fn building_twice_yields_structurally_identical_trees() {
        let records: Vec<Map<String, Value>> = vec![
            record(r#"{"operator": "eq", "actor_attribute": "id", "subject_attribute": "authorId"}"#),
            record(r#"{"operator": "matches", "subject_attribute": "slug", "value": "^[a-z-]+$"}"#),
            record(r#"{"function": "isBetween", "environment_attribute": "hour", "arguments": [9, 17]}"#),
        ];
        let first = build_rule("p", "AND", &records).unwrap();
        let second = build_rule("p", "AND", &records).unwrap();
        assert_eq!(first, second);
    }
}
