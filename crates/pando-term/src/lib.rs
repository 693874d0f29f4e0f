//! pando-term: terminal presentation for pando.
//!
//! Colour lives only here: the router hands over plain [`Delivery`] values
//! and the [`LineFormatter`] turns them into output lines, styled by a
//! [`Theme`] when colour is enabled.
//!
//! [`Delivery`]: pando_core::Delivery

pub mod banner;
pub mod format;
pub mod theme;

pub use format::LineFormatter;
pub use theme::Theme;
