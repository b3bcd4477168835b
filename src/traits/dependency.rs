//! Typed dependency lists resolved from a request scope.

use std::sync::Arc;

use crate::error::DiResult;
use crate::key::{key_of, Key};
use crate::provider::Scope;

/// A single injectable value.
///
/// Implemented for `Arc<I>`: the interface key is `I`, and resolution goes
/// through the scope's lifetime-aware resolver.
pub trait Dependency: Sized {
    /// Interface key this value is resolved by.
    fn key() -> Key;

    /// Resolves the value against a request scope.
    fn resolve(scope: &Scope) -> DiResult<Self>;
}

impl<I> Dependency for Arc<I>
where
    I: ?Sized + Send + Sync + 'static,
{
    fn key() -> Key {
        key_of::<I>()
    }

    fn resolve(scope: &Scope) -> DiResult<Self> {
        scope.resolve::<I>()
    }
}

/// An ordered list of dependencies, resolved left to right.
///
/// Implemented for `()`, for a bare `Arc<I>`, and for tuples of up to eight
/// [`Dependency`] values. The first resolution failure stops the list.
pub trait Dependencies: Sized {
    /// Declared interface keys, in order.
    fn keys() -> Vec<Key>;

    /// Resolves every dependency against a request scope.
    fn resolve(scope: &Scope) -> DiResult<Self>;
}

impl Dependencies for () {
    fn keys() -> Vec<Key> {
        Vec::new()
    }

    fn resolve(_scope: &Scope) -> DiResult<Self> {
        Ok(())
    }
}

impl<I> Dependencies for Arc<I>
where
    I: ?Sized + Send + Sync + 'static,
{
    fn keys() -> Vec<Key> {
        vec![key_of::<I>()]
    }

    fn resolve(scope: &Scope) -> DiResult<Self> {
        scope.resolve::<I>()
    }
}

macro_rules! impl_dependencies {
    ($($name:ident),+) => {
        impl<$($name: Dependency),+> Dependencies for ($($name,)+) {
            fn keys() -> Vec<Key> {
                vec![$($name::key()),+]
            }

            fn resolve(scope: &Scope) -> DiResult<Self> {
                Ok(($($name::resolve(scope)?,)+))
            }
        }
    };
}

impl_dependencies!(A);
impl_dependencies!(A, B);
impl_dependencies!(A, B, C);
impl_dependencies!(A, B, C, D);
impl_dependencies!(A, B, C, D, E);
impl_dependencies!(A, B, C, D, E, F);
impl_dependencies!(A, B, C, D, E, F, G);
impl_dependencies!(A, B, C, D, E, F, G, H);
