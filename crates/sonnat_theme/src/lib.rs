//! Theme model for the Sonnat style engine.
//!
//! A [`Theme`] is an immutable bag of design tokens (palette, derived colors,
//! typography, breakpoints, spacing and mixins). Themes are built with
//! [`create_theme`], which deep-merges [`ThemeOverrides`] onto the built-in
//! defaults and then derives every computed field.

mod schema;
pub use schema::*;

mod deserializers;

mod error;
pub use error::*;

mod overrides;
pub use overrides::*;

mod color;
pub use color::*;

mod breakpoints;
pub use breakpoints::*;

mod typography;
pub use typography::*;

mod spacing;
pub use spacing::*;

mod mixins;
pub use mixins::*;
