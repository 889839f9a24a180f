use flagforge_core::ProviderEvent;

/// A registered callback for one event type, API- or domain-scoped.
///
/// Implemented for plain closures below so callers can register with a
/// `|event| { ... }` lambda, kept intentionally small.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &ProviderEvent);
}

impl<F> EventHandler for F
where
    F: Fn(&ProviderEvent) + Send + Sync,
{
    fn handle(&self, event: &ProviderEvent) {
        self(event)
    }
}

/// Opaque handle returned by a `register_*` call, used to remove that exact
/// registration later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(pub(crate) u64);
