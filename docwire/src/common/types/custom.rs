use std::any::Any;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

type EqFn = fn(&(dyn Any + Send + Sync), &(dyn Any + Send + Sync)) -> bool;
type DebugFn = fn(&(dyn Any + Send + Sync), &mut Formatter<'_>) -> std::fmt::Result;

/// An application defined leaf value.
///
/// A custom value is identified by its type name. The codec never looks
/// inside it; it is written and read only by the leaf codec registered under
/// [`crate::common::ValueType::Custom`] with the same name. Cloning is cheap,
/// the payload is shared.
///
/// # Examples
///
/// ```rust,ignore
/// #[derive(Debug, PartialEq)]
/// struct Money { cents: i64, currency: String }
///
/// let value = CustomValue::new("money", Money { cents: 250, currency: "EUR".into() });
/// assert_eq!(value.type_name(), "money");
/// assert_eq!(value.downcast_ref::<Money>().unwrap().cents, 250);
/// ```
#[derive(Clone)]
pub struct CustomValue {
    type_name: Arc<str>,
    data: Arc<dyn Any + Send + Sync>,
    eq_fn: EqFn,
    debug_fn: DebugFn,
}

impl CustomValue {
    pub fn new<T>(type_name: &str, data: T) -> Self
    where
        T: Any + Send + Sync + PartialEq + Debug,
    {
        CustomValue {
            type_name: Arc::from(type_name),
            data: Arc::new(data),
            eq_fn: eq_impl::<T>,
            debug_fn: debug_impl::<T>,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }
}

fn eq_impl<T: Any + PartialEq>(a: &(dyn Any + Send + Sync), b: &(dyn Any + Send + Sync)) -> bool {
    match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn debug_impl<T: Any + Debug>(data: &(dyn Any + Send + Sync), f: &mut Formatter<'_>) -> std::fmt::Result {
    match data.downcast_ref::<T>() {
        Some(data) => write!(f, "{:?}", data),
        None => write!(f, "?"),
    }
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && (self.eq_fn)(self.data.as_ref(), other.data.as_ref())
    }
}

impl Debug for CustomValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.type_name)?;
        (self.debug_fn)(self.data.as_ref(), f)?;
        write!(f, ")")
    }
}
