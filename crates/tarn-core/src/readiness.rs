//! Readiness state for resources that become usable after startup work

use std::fmt;

/// Lifecycle of a late-bound resource (shader program, texture, uploaded mesh).
///
/// The render loop matches on this rather than assuming a handle is usable.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Readiness<T> {
    /// Creation has not finished yet
    #[default]
    Pending,
    /// The resource is usable
    Ready(T),
    /// Creation failed; the feature stays disabled
    Failed(String),
}

impl<T> Readiness<T> {
    /// Wrap the outcome of a fallible creation step
    pub fn from_result<E: fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Readiness::Ready(value),
            Err(e) => Readiness::Failed(e.to_string()),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Readiness::Failed(_))
    }

    /// Borrow the resource if it is ready
    pub fn get(&self) -> Option<&T> {
        match self {
            Readiness::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Borrow the resource, or `fallback` while pending or after a failure
    pub fn get_or<'a>(&'a self, fallback: &'a T) -> &'a T {
        self.get().unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_pending() {
        let r: Readiness<u32> = Readiness::default();
        assert_eq!(r, Readiness::Pending);
        assert_eq!(r.get(), None);
    }

    #[test]
    fn from_result_tags_outcome() {
        let ok: Readiness<u32> = Readiness::from_result::<String>(Ok(7));
        assert_eq!(ok.get(), Some(&7));

        let err: Readiness<u32> = Readiness::from_result(Err("link failed"));
        assert!(err.is_failed());
        assert_eq!(err, Readiness::Failed("link failed".to_string()));
    }

    #[test]
    fn fallback_used_until_ready() {
        let fallback = 0u32;
        let mut r: Readiness<u32> = Readiness::Pending;
        assert_eq!(*r.get_or(&fallback), 0);

        r = Readiness::Failed("missing".into());
        assert_eq!(*r.get_or(&fallback), 0);

        r = Readiness::Ready(3);
        assert_eq!(*r.get_or(&fallback), 3);
    }
}
