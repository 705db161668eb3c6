//! Fill renderers: populate a foreign object instead of producing text.
//!
//! A fill target is anything implementing [`FormTarget`] or [`PagerTarget`].
//! Targets report rejections as plain strings; the populators wrap them in
//! [`RenderError::FillRejected`](crate::RenderError::FillRejected) with the
//! name of the element that was refused.
//!
//! [`Form`] and [`Pager`] are ready in-memory implementors.

mod form;
mod pager;

pub use form::{fill_form, Form, FormElement, FormOptions, FormTarget, SelectOption};
pub use pager::{fill_pager, LinkKind, Pager, PagerLink, PagerOptions, PagerTarget};
