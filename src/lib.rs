//! Theme-driven, class-name-scoped CSS generation with server-side collection
//! and client-side hydration.

pub mod theme;

pub mod components;

pub mod declaration;
pub use declaration::{Declaration, Rule, RuleMap, Template, Value};

pub mod resolver;

pub mod css;
pub use css::CssOptions;

mod error;
pub use error::*;

mod class_name;
pub use class_name::*;

mod sheet;
pub use sheet::*;

mod registry;
pub use registry::*;

pub mod injector;
pub use injector::{HydrationOutcome, InjectorOptions, InjectorState, StyleDocument, StyleInjector};

mod context;
pub use context::*;

mod make_styles;
pub use make_styles::*;

pub use sonnat_theme::{Theme, ThemeId, ThemeOverrides, create_theme};
