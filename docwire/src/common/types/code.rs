use crate::document::Document;
use std::fmt::{Display, Formatter};

/// JavaScript code together with the scope document it is evaluated in.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct CodeWithScope {
    code: String,
    scope: Document,
}

impl CodeWithScope {
    pub fn new(code: impl Into<String>, scope: Document) -> Self {
        CodeWithScope {
            code: code.into(),
            scope,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn scope(&self) -> &Document {
        &self.scope
    }

    pub fn into_parts(self) -> (String, Document) {
        (self.code, self.scope)
    }
}

impl Display for CodeWithScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{\"$code\": \"{}\", \"$scope\": {}}}", self.code, self.scope)
    }
}
