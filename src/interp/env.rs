//! The environment: a persistent chain of name bindings.
//!
//! Binding never mutates — it returns a new environment whose top frame
//! shadows any older binding of the same name. Cloning an environment is a
//! reference-count bump, so closures snapshot their defining scope for free.

use std::rc::Rc;

use super::value::{Denot, Loc};

#[derive(Debug, Clone, Default)]
pub struct Environment {
    top: Option<Rc<Frame>>,
}

#[derive(Debug)]
struct Frame {
    name: String,
    value: Denot,
    parent: Option<Rc<Frame>>,
}

impl Environment {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Extend with one binding, shadowing any earlier binding of `name`.
    pub fn bind(&self, name: &str, value: Denot) -> Self {
        Self {
            top: Some(Rc::new(Frame {
                name: name.to_string(),
                value,
                parent: self.top.clone(),
            })),
        }
    }

    /// Resolve a name, innermost binding first.
    pub fn lookup(&self, name: &str) -> Option<&Denot> {
        let mut frame = self.top.as_deref();
        while let Some(f) = frame {
            if f.name == name {
                return Some(&f.value);
            }
            frame = f.parent.as_deref();
        }
        None
    }

    /// Whether any binding reachable from this environment denotes a
    /// location at or above `mark`. Used by the store's loop reclamation:
    /// a captured environment can only reference locations older than the
    /// closure holding it, so one pass over the frames is exhaustive.
    pub fn references_location_at_or_above(&self, mark: usize) -> bool {
        let mut frame = self.top.as_deref();
        while let Some(f) = frame {
            if let Denot::Location(Loc(addr)) = &f.value {
                if *addr >= mark {
                    return true;
                }
            }
            frame = f.parent.as_deref();
        }
        false
    }
}
