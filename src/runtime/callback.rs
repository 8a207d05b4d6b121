use crate::runtime::value::Value;

/// Host code attached to a callback.
///
/// A handler runs on the UI thread, receives the converted call arguments and
/// returns the value the call site observes. No borrow of instance state is
/// held while it runs, so it may read or write properties and invoke other
/// callbacks of the same instance.
///
/// The instance owns its handlers. A handler that needs the instance should
/// capture a [`WeakComponentInstance`]; capturing a strong handle keeps the
/// instance alive forever.
///
/// [`WeakComponentInstance`]: crate::runtime::instance::WeakComponentInstance
pub trait CallbackHandler {
    fn call(&self, args: &[Value]) -> Value;
}

impl<F> CallbackHandler for F
where
    F: Fn(&[Value]) -> Value,
{
    fn call(&self, args: &[Value]) -> Value {
        self(args)
    }
}
