//! Typed actions pushed through the source stream

/// An action tagged with its kind
///
/// Dispatching plain values works for any action type; `Action` is the
/// `{kind, payload}` shape for callers that want a tagged envelope.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Action<K, P> {
    pub kind: K,
    pub payload: P,
}

impl<K, P> Action<K, P> {
    pub fn new(kind: K, payload: P) -> Self {
        Self { kind, payload }
    }

    /// Check the action's kind
    pub fn is(&self, kind: &K) -> bool
    where
        K: PartialEq,
    {
        self.kind == *kind
    }
}
