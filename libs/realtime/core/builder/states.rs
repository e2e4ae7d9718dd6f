//! Builder type states
//!
//! `build()` exists only for `RealtimeClientBuilder<HasUrl, HasHandler>`, so
//! a client without a push URL or an event handler does not compile.

use std::marker::PhantomData;

pub trait UrlState {}

pub struct NoUrl;
impl UrlState for NoUrl {}

pub struct HasUrl;
impl UrlState for HasUrl {}

pub trait HandlerState {}

pub struct NoHandler;
impl HandlerState for NoHandler {}

pub struct HasHandler;
impl HandlerState for HasHandler {}

/// Zero-sized carrier of both states
#[derive(Debug, Clone, Copy)]
pub struct TypeState<U, H> {
    _url: PhantomData<U>,
    _handler: PhantomData<H>,
}

impl<U, H> TypeState<U, H> {
    pub(crate) fn new() -> Self {
        Self {
            _url: PhantomData,
            _handler: PhantomData,
        }
    }
}
