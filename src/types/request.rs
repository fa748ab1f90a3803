//! Authorization request type.

use super::context::PolicyContext;

/// The API-level request: the action the caller wants to perform and the
/// context it should be judged against.
#[derive(Debug, Clone)]
pub struct Request {
    pub action: String,
    pub context: PolicyContext,
}

impl Request {
    pub fn new(action: impl Into<String>, context: PolicyContext) -> Self {
        Self {
            action: action.into(),
            context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::attrs;

    #[test]
    fn request_carries_action_and_context() {
        let request = Request::new("edit-post", PolicyContext::new(attrs([("id", 7)])));
        assert_eq!(request.action, "edit-post");
        assert!(request.context.subjects().is_empty());
    }
}
