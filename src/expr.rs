//! Expression trees and their tri-valued evaluation.
//!
//! A policy rule is an ordered list of expressions joined by a boolean
//! combinator. Each expression resolves its operands through the attribute
//! accessor and produces a [`Truth`]: `True`, `False`, or `Indeterminate`
//! when the rule cannot be soundly evaluated against the provided context
//! (unresolvable attribute, mixed-type comparison, non-string regex
//! subject). Indeterminate propagates through `AND`/`OR`/`NOT` following the
//! Kleene three-valued tables.

use regex::Regex;
use strum_macros::{Display, EnumString};

use crate::accessor::AttributeAccessor;
use crate::cancel::CancelToken;
use crate::error::PolicyError;
use crate::types::AttrValue;

/// The context entity an attribute reference points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum EntityKind {
    Actor,
    Subject,
    Environment,
}

/// One operand of an expression: a symbolic attribute reference or a literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Attribute { entity: EntityKind, path: Vec<String> },
    Literal(AttrValue),
}

impl Operand {
    /// Attribute reference from a dotted name (`"org.id"`).
    pub fn attribute(entity: EntityKind, dotted: &str) -> Self {
        Operand::Attribute {
            entity,
            path: dotted.split('.').map(str::to_string).collect(),
        }
    }

    pub fn literal(value: impl Into<AttrValue>) -> Self {
        Operand::Literal(value.into())
    }
}

/// Kleene tri-valued truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truth {
    True,
    False,
    Indeterminate,
}

impl Truth {
    pub fn and(self, other: Truth) -> Truth {
        use Truth::*;
        match (self, other) {
            (False, _) | (_, False) => False,
            (True, True) => True,
            _ => Indeterminate,
        }
    }

    pub fn or(self, other: Truth) -> Truth {
        use Truth::*;
        match (self, other) {
            (True, _) | (_, True) => True,
            (False, False) => False,
            _ => Indeterminate,
        }
    }

    pub fn not(self) -> Truth {
        match self {
            Truth::True => Truth::False,
            Truth::False => Truth::True,
            Truth::Indeterminate => Truth::Indeterminate,
        }
    }
}

impl From<bool> for Truth {
    fn from(value: bool) -> Self {
        if value {
            Truth::True
        } else {
            Truth::False
        }
    }
}

fn truth_of(checked: Option<bool>) -> Truth {
    match checked {
        Some(b) => b.into(),
        None => Truth::Indeterminate,
    }
}

/// Single-operand predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum UnaryOp {
    IsNull,
    NotNull,
    Truthy,
    Falsy,
    Not,
}

/// Relational and membership comparisons. The `matches` operator is part of
/// the same registry but carries a compiled regex, so it gets its own
/// [`Expr`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
}

/// Named predicates over one leading operand plus declared arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum FuncOp {
    StartsWith,
    EndsWith,
    Contains,
    IsBetween,
    HasAny,
    HasAll,
}

impl FuncOp {
    /// Total operand count, leading attribute included.
    pub fn arity(self) -> usize {
        match self {
            FuncOp::IsBetween => 3,
            _ => 2,
        }
    }
}

/// A validated, evaluable expression node.
#[derive(Debug, Clone)]
pub enum Expr {
    Unary {
        op: UnaryOp,
        operand: Operand,
    },
    Binary {
        op: BinaryOp,
        left: Operand,
        right: Operand,
    },
    /// Regex comparison; the pattern is compiled once at build time.
    Match {
        operand: Operand,
        pattern: String,
        regex: Regex,
    },
    Function {
        func: FuncOp,
        args: Vec<Operand>,
    },
}

// Regex has no equality; two match nodes are equal when their patterns are.
impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Expr::Unary { op: a, operand: x },
                Expr::Unary { op: b, operand: y },
            ) => a == b && x == y,
            (
                Expr::Binary {
                    op: a,
                    left: al,
                    right: ar,
                },
                Expr::Binary {
                    op: b,
                    left: bl,
                    right: br,
                },
            ) => a == b && al == bl && ar == br,
            (
                Expr::Match {
                    operand: x,
                    pattern: p,
                    ..
                },
                Expr::Match {
                    operand: y,
                    pattern: q,
                    ..
                },
            ) => x == y && p == q,
            (
                Expr::Function { func: a, args: x },
                Expr::Function { func: b, args: y },
            ) => a == b && x == y,
            _ => false,
        }
    }
}

impl Expr {
    pub(crate) fn evaluate(&self, accessor: &AttributeAccessor<'_>) -> Truth {
        match self {
            Expr::Unary { op, operand } => {
                let Ok(value) = accessor.resolve(operand) else {
                    return Truth::Indeterminate;
                };
                match op {
                    UnaryOp::IsNull => value.is_null().into(),
                    UnaryOp::NotNull => (!value.is_null()).into(),
                    UnaryOp::Truthy => value.truthy().into(),
                    UnaryOp::Falsy | UnaryOp::Not => (!value.truthy()).into(),
                }
            }
            Expr::Binary { op, left, right } => {
                let (Ok(l), Ok(r)) = (accessor.resolve(left), accessor.resolve(right)) else {
                    return Truth::Indeterminate;
                };
                match op {
                    BinaryOp::Eq => truth_of(l.try_eq(&r)),
                    BinaryOp::Ne => truth_of(l.try_eq(&r)).not(),
                    BinaryOp::Lt => truth_of(l.try_cmp(&r).map(|o| o.is_lt())),
                    BinaryOp::Le => truth_of(l.try_cmp(&r).map(|o| o.is_le())),
                    BinaryOp::Gt => truth_of(l.try_cmp(&r).map(|o| o.is_gt())),
                    BinaryOp::Ge => truth_of(l.try_cmp(&r).map(|o| o.is_ge())),
                    BinaryOp::In => truth_of(l.try_in(&r)),
                    BinaryOp::NotIn => truth_of(l.try_in(&r)).not(),
                }
            }
            Expr::Match { operand, regex, .. } => {
                let Ok(value) = accessor.resolve(operand) else {
                    return Truth::Indeterminate;
                };
                match value.as_str() {
                    Some(subject) => regex.is_match(subject).into(),
                    None => Truth::Indeterminate,
                }
            }
            Expr::Function { func, args } => {
                let mut resolved = Vec::with_capacity(args.len());
                for arg in args {
                    match accessor.resolve(arg) {
                        Ok(value) => resolved.push(value),
                        Err(_) => return Truth::Indeterminate,
                    }
                }
                evaluate_function(*func, &resolved)
            }
        }
    }
}

fn evaluate_function(func: FuncOp, args: &[AttrValue]) -> Truth {
    match (func, args) {
        (FuncOp::StartsWith, [subject, prefix]) => {
            truth_of(match (subject.as_str(), prefix.as_str()) {
                (Some(s), Some(p)) => Some(s.starts_with(p)),
                _ => None,
            })
        }
        (FuncOp::EndsWith, [subject, suffix]) => {
            truth_of(match (subject.as_str(), suffix.as_str()) {
                (Some(s), Some(p)) => Some(s.ends_with(p)),
                _ => None,
            })
        }
        (FuncOp::Contains, [haystack, needle]) => match haystack {
            AttrValue::String(s) => truth_of(needle.as_str().map(|n| s.contains(n))),
            AttrValue::List(_) => truth_of(needle.try_in(haystack)),
            _ => Truth::Indeterminate,
        },
        (FuncOp::IsBetween, [value, low, high]) => {
            let (Some(lo), Some(hi)) = (value.try_cmp(low), value.try_cmp(high)) else {
                return Truth::Indeterminate;
            };
            (lo.is_ge() && hi.is_le()).into()
        }
        (FuncOp::HasAny, [left, right]) => set_overlap(left, right, false),
        (FuncOp::HasAll, [left, right]) => set_overlap(left, right, true),
        _ => Truth::Indeterminate,
    }
}

/// `all = false`: some element of `right` is in `left`; `all = true`: every
/// element of `right` is in `left`. Any element pair that types out makes
/// the whole check indeterminate.
fn set_overlap(left: &AttrValue, right: &AttrValue, all: bool) -> Truth {
    let Some(required) = right.as_list() else {
        return Truth::Indeterminate;
    };
    if !matches!(left, AttrValue::List(_)) {
        return Truth::Indeterminate;
    }
    let mut result = all;
    for item in required {
        match item.try_in(left) {
            Some(found) => {
                if all && !found {
                    result = false;
                } else if !all && found {
                    result = true;
                }
            }
            None => return Truth::Indeterminate,
        }
    }
    result.into()
}

/// Boolean combinator over a rule's expressions. Wire names are `AND`,
/// `OR`, and `NOT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum Condition {
    #[strum(serialize = "AND")]
    All,
    #[strum(serialize = "OR")]
    Any,
    #[strum(serialize = "NOT")]
    Not,
}

/// An ordered sequence of expressions and the combinator joining them.
///
/// Arity is enforced at build time: `NOT` holds exactly one expression,
/// `AND`/`OR` at least one.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub condition: Condition,
    pub expressions: Vec<Expr>,
}

impl Rule {
    /// Combine expression truths left to right, checking the cancellation
    /// token between expressions. Short-circuits only on a dominating value
    /// (`False` for `AND`, `True` for `OR`); indeterminate keeps going.
    pub(crate) fn evaluate(
        &self,
        accessor: &AttributeAccessor<'_>,
        token: &CancelToken,
    ) -> Result<Truth, PolicyError> {
        match self.condition {
            Condition::All => {
                let mut combined = Truth::True;
                for expr in &self.expressions {
                    token.check()?;
                    combined = combined.and(expr.evaluate(accessor));
                    if combined == Truth::False {
                        break;
                    }
                }
                Ok(combined)
            }
            Condition::Any => {
                let mut combined = Truth::False;
                for expr in &self.expressions {
                    token.check()?;
                    combined = combined.or(expr.evaluate(accessor));
                    if combined == Truth::True {
                        break;
                    }
                }
                Ok(combined)
            }
            Condition::Not => {
                token.check()?;
                match self.expressions.first() {
                    Some(expr) => Ok(expr.evaluate(accessor).not()),
                    None => Ok(Truth::Indeterminate),
                }
            }
        }
    }
}
