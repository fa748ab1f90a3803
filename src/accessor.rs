//! Attribute resolution against a request context.

use tracing::trace;

use crate::error::AttributeNotResolvable;
use crate::expr::{EntityKind, Operand};
use crate::traits::AttributeSource;
use crate::types::{AttrValue, PolicyContext};

/// Resolves expression operands into concrete values for one evaluation.
///
/// The accessor is bound to the context and, when the rule is being checked
/// against a particular subject, to that subject. Dotted paths resolve their
/// first segment through the owning [`AttributeSource`] and walk
/// [`AttrValue::Record`] fields for the remaining segments.
pub(crate) struct AttributeAccessor<'a> {
    ctx: &'a PolicyContext,
    subject: Option<&'a dyn AttributeSource>,
}

impl<'a> AttributeAccessor<'a> {
    pub(crate) fn new(ctx: &'a PolicyContext, subject: Option<&'a dyn AttributeSource>) -> Self {
        Self { ctx, subject }
    }

    pub(crate) fn resolve(&self, operand: &Operand) -> Result<AttrValue, AttributeNotResolvable> {
        let resolved = match operand {
            Operand::Literal(value) => Ok(value.clone()),
            Operand::Attribute { entity, path } => match entity {
                EntityKind::Actor => resolve_source(self.ctx.actor(), path, EntityKind::Actor),
                EntityKind::Subject => match self.subject {
                    Some(subject) => resolve_source(subject, path, EntityKind::Subject),
                    None => Err(not_resolvable(EntityKind::Subject, path)),
                },
                EntityKind::Environment => {
                    let (first, rest) = path.split_first().expect("paths are never empty");
                    match self.ctx.environment().get(first) {
                        Some(value) => {
                            walk(value.clone(), rest, EntityKind::Environment, path)
                        }
                        None => Err(not_resolvable(EntityKind::Environment, path)),
                    }
                }
            },
        };
        if let Err(err) = &resolved {
            trace!(event = "Resolve", error = %err);
        }
        resolved
    }
}

fn resolve_source(
    source: &dyn AttributeSource,
    path: &[String],
    entity: EntityKind,
) -> Result<AttrValue, AttributeNotResolvable> {
    let (first, rest) = path.split_first().expect("paths are never empty");
    let value = source
        .attribute(first)
        .ok_or_else(|| not_resolvable(entity, path))?;
    walk(value, rest, entity, path)
}

fn walk(
    mut value: AttrValue,
    segments: &[String],
    entity: EntityKind,
    full_path: &[String],
) -> Result<AttrValue, AttributeNotResolvable> {
    for segment in segments {
        let AttrValue::Record(mut fields) = value else {
            return Err(not_resolvable(entity, full_path));
        };
        value = fields
            .remove(segment)
            .ok_or_else(|| not_resolvable(entity, full_path))?;
    }
    Ok(value)
}

fn not_resolvable(entity: EntityKind, path: &[String]) -> AttributeNotResolvable {
    AttributeNotResolvable {
        entity: entity.to_string(),
        path: path.join("."),
    }
}
