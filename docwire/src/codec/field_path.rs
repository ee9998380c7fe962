use itertools::Itertools;
use smallvec::SmallVec;
use std::fmt::{Debug, Display, Formatter};

/// The position of a document inside the tree being decoded.
///
/// A path is immutable. Entering a container under a named field creates a
/// child path that borrows its parent, so leaving the container simply drops
/// the child and the parent is untouched. Array elements have no names and do
/// not extend the path: a document nested in an array sees the path of the
/// array itself. The root document has the empty path.
///
/// # Examples
///
/// ```rust,ignore
/// let root = FieldPath::root();
/// let address = root.child("address");
/// let zip = address.child("zip");
/// assert_eq!(zip.to_string(), "address.zip");
/// assert!(root.is_root());
/// ```
#[derive(Clone, Copy)]
pub struct FieldPath<'a> {
    parent: Option<&'a FieldPath<'a>>,
    name: &'a str,
    depth: usize,
}

impl<'a> FieldPath<'a> {
    pub fn root() -> FieldPath<'static> {
        FieldPath {
            parent: None,
            name: "",
            depth: 0,
        }
    }

    /// Returns the path of the field `name` below this path.
    pub fn child<'b>(&'b self, name: &'b str) -> FieldPath<'b>
    where
        'a: 'b,
    {
        FieldPath {
            parent: Some(self),
            name,
            depth: self.depth + 1,
        }
    }

    pub fn is_root(&self) -> bool {
        self.depth == 0
    }

    /// Number of named segments.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Name of the last segment, if any.
    pub fn name(&self) -> Option<&'a str> {
        if self.is_root() {
            None
        } else {
            Some(self.name)
        }
    }

    pub fn segments(&self) -> SmallVec<[&'a str; 8]> {
        let mut segments = SmallVec::with_capacity(self.depth);
        let mut current = Some(self);
        while let Some(path) = current {
            if !path.is_root() {
                segments.push(path.name);
            }
            current = path.parent;
        }
        segments.reverse();
        segments
    }
}

impl PartialEq for FieldPath<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.depth == other.depth && self.segments() == other.segments()
    }
}

impl Display for FieldPath<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments().iter().join("."))
    }
}

impl Debug for FieldPath<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "FieldPath({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root() {
        let root = FieldPath::root();
        assert!(root.is_root());
        assert_eq!(root.depth(), 0);
        assert!(root.segments().is_empty());
        assert_eq!(root.name(), None);
        assert_eq!(root.to_string(), "");
    }

    #[test]
    fn test_child_appends_segment() {
        let root = FieldPath::root();
        let a = root.child("a");
        let b = a.child("b");
        assert_eq!(b.depth(), 2);
        assert_eq!(b.name(), Some("b"));
        assert_eq!(b.segments().as_slice(), &["a", "b"]);
        assert_eq!(b.to_string(), "a.b");
    }

    #[test]
    fn test_parent_is_unchanged_by_child() {
        let root = FieldPath::root();
        let a = root.child("a");
        {
            let _inner = a.child("x");
        }
        let c = a.child("c");
        assert_eq!(a.to_string(), "a");
        assert_eq!(c.to_string(), "a.c");
    }

    #[test]
    fn test_equality_by_segments() {
        let root = FieldPath::root();
        let first = root.child("a");
        let second = root.child("a");
        assert_eq!(first.child("b"), second.child("b"));
        assert_ne!(first, root);
        assert_eq!(format!("{:?}", first), "FieldPath(a)");
    }
}
