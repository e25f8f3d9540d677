use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

/// A live screen object owned by the instrumentation layer.
/// The scope tree only ever holds a `Weak` to it.
pub type ViewHandle = Arc<dyn Any + Send + Sync>;

/// Stable identity of a RUM view.
///
/// `Reference` identities are equal only when they point at the same live object,
/// `Value` identities are equal when their strings are equal.
/// Comparing a `Reference` with a `Value` is never equal.
#[derive(Clone)]
pub enum ViewIdentity {
    Reference(Weak<dyn Any + Send + Sync>),
    Value(String),
}

impl ViewIdentity {
    pub fn reference(handle: &ViewHandle) -> Self {
        ViewIdentity::Reference(Arc::downgrade(handle))
    }

    pub fn value(path: impl Into<String>) -> Self {
        ViewIdentity::Value(path.into())
    }

    /// Whether two tokens denote the same logical view.
    pub fn equals(&self, other: &ViewIdentity) -> bool {
        match (self, other) {
            (ViewIdentity::Reference(a), ViewIdentity::Reference(b)) => {
                // Data address only; the vtable half of the fat pointer is not part of identity.
                a.as_ptr() as *const () == b.as_ptr() as *const ()
            }
            (ViewIdentity::Value(a), ViewIdentity::Value(b)) => a == b,
            _ => false,
        }
    }

    /// `false` once the referenced object has been dropped. Value identities are always identifiable.
    pub fn is_identifiable(&self) -> bool {
        match self {
            ViewIdentity::Reference(weak) => weak.strong_count() > 0,
            ViewIdentity::Value(_) => true,
        }
    }

    /// Path used when a start command does not name the view.
    pub fn default_path(&self) -> String {
        match self {
            ViewIdentity::Reference(_) => "view".to_string(),
            ViewIdentity::Value(path) => path.clone(),
        }
    }
}

impl PartialEq for ViewIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl fmt::Debug for ViewIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewIdentity::Reference(weak) => f
                .debug_struct("Reference")
                .field("addr", &(weak.as_ptr() as *const ()))
                .field("alive", &(weak.strong_count() > 0))
                .finish(),
            ViewIdentity::Value(path) => f.debug_tuple("Value").field(path).finish(),
        }
    }
}
