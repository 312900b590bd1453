//! Inbound requirement resolutions and how they are normalized.
//!
//! A producer answers an announced requirement with a [`RequirementMessage`]. Before the
//! message is queued, the dispatcher runs it through a [`Canonicalize`] implementation,
//! which may rewrite the key into its standard form and may reject the message.
//!
//! Canonical forms are a property of the key domain and must be chosen explicitly:
//!
//! - [`Verbatim`] leaves messages untouched and accepts everything
//! - [`SymmetricPairs`] treats [`Pair`] keys as unordered, so a similarity between
//!   `("dog", "cat")` resolves tasks waiting on `("cat", "dog")`
//! - [`CanonicalizeFn`] wraps caller-supplied logic

use std::fmt;

/// A resolved requirement: the key that was asked for and its value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RequirementMessage<K, V> {
    request: K,
    result: V,
}

impl<K, V> RequirementMessage<K, V> {
    pub fn new(request: K, result: V) -> Self {
        Self { request, result }
    }

    /// The requirement key this message resolves.
    pub fn request(&self) -> &K {
        &self.request
    }

    /// The resolved value.
    pub fn result(&self) -> &V {
        &self.result
    }

    pub fn into_parts(self) -> (K, V) {
        (self.request, self.result)
    }

    /// Replace the key, keeping the value.
    pub fn map_request<K2>(self, f: impl FnOnce(K) -> K2) -> RequirementMessage<K2, V> {
        RequirementMessage {
            request: f(self.request),
            result: self.result,
        }
    }
}

impl<K, V> From<(K, V)> for RequirementMessage<K, V> {
    fn from((request, result): (K, V)) -> Self {
        Self::new(request, result)
    }
}

/// Normalizes and validates inbound messages before they are queued.
///
/// Both steps run synchronously on the thread delivering the message and should be cheap.
pub trait Canonicalize<K, V>: Send {
    /// Rewrite the message into its canonical form.
    fn canonicalize(&self, message: RequirementMessage<K, V>) -> RequirementMessage<K, V> {
        message
    }

    /// Accept (`Ok`) or reject (`Err(reason)`) an already-canonical message.
    fn validate(&self, _message: &RequirementMessage<K, V>) -> Result<(), String> {
        Ok(())
    }
}

/// Identity canonicalization; every message is valid.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl<K, V> Canonicalize<K, V> for Verbatim {}

/// A two-element key, e.g. the two phrases of a similarity score.
///
/// [`Pair::unordered`] stores the smaller element first, so both argument orders produce
/// the same key. [`Pair::new`] keeps the order given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pair<T> {
    pub first: T,
    pub second: T,
}

impl<T> Pair<T> {
    pub fn new(first: T, second: T) -> Self {
        Self { first, second }
    }
}

impl<T: Ord> Pair<T> {
    pub fn unordered(a: T, b: T) -> Self {
        if b < a {
            Self::new(b, a)
        } else {
            Self::new(a, b)
        }
    }

    /// This pair with its elements in ascending order.
    pub fn canonical(self) -> Self {
        Self::unordered(self.first, self.second)
    }

    pub fn is_canonical(&self) -> bool {
        self.first <= self.second
    }
}

impl<T: fmt::Display> fmt::Display for Pair<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}

/// Order-independent [`Pair`] keys.
///
/// Tasks must register their keys with [`Pair::unordered`] for inbound messages in
/// either order to match them. Optionally rejects pairs whose two elements are equal.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymmetricPairs {
    reject_reflexive: bool,
}

impl SymmetricPairs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject messages such as `("cat", "cat")`.
    #[must_use]
    pub fn reject_reflexive(mut self) -> Self {
        self.reject_reflexive = true;
        self
    }
}

impl<T, V> Canonicalize<Pair<T>, V> for SymmetricPairs
where
    T: Ord + fmt::Debug,
{
    fn canonicalize(&self, message: RequirementMessage<Pair<T>, V>) -> RequirementMessage<Pair<T>, V> {
        message.map_request(Pair::canonical)
    }

    fn validate(&self, message: &RequirementMessage<Pair<T>, V>) -> Result<(), String> {
        let pair = message.request();
        if self.reject_reflexive && pair.first == pair.second {
            return Err(format!("reflexive pair {:?}", pair.first));
        }
        Ok(())
    }
}

/// Canonicalization from closures.
///
/// # Examples
///
/// ```
/// use reqx::message::{Canonicalize, CanonicalizeFn, RequirementMessage};
///
/// let lowercase = CanonicalizeFn::new(
///     |m: RequirementMessage<String, f64>| m.map_request(|k| k.to_lowercase()),
///     |m: &RequirementMessage<String, f64>| {
///         if (0.0..=1.0).contains(m.result()) {
///             Ok(())
///         } else {
///             Err(format!("similarity {} out of range", m.result()))
///         }
///     },
/// );
///
/// let m = lowercase.canonicalize(RequirementMessage::new("SIM".to_string(), 0.5));
/// assert_eq!(m.request(), "sim");
/// assert!(lowercase.validate(&RequirementMessage::new("sim".into(), 2.0)).is_err());
/// ```
pub struct CanonicalizeFn<C, F> {
    canonicalize: C,
    validate: F,
}

impl<C, F> CanonicalizeFn<C, F> {
    pub fn new(canonicalize: C, validate: F) -> Self {
        Self {
            canonicalize,
            validate,
        }
    }
}

impl<K, V, C, F> Canonicalize<K, V> for CanonicalizeFn<C, F>
where
    C: Fn(RequirementMessage<K, V>) -> RequirementMessage<K, V> + Send,
    F: Fn(&RequirementMessage<K, V>) -> Result<(), String> + Send,
{
    fn canonicalize(&self, message: RequirementMessage<K, V>) -> RequirementMessage<K, V> {
        (self.canonicalize)(message)
    }

    fn validate(&self, message: &RequirementMessage<K, V>) -> Result<(), String> {
        (self.validate)(message)
    }
}
