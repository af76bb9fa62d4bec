//! Theme model re-exported from `sonnat_theme`, plus typed token kinds.

pub use sonnat_theme::*;

mod ext;
pub use ext::*;

mod kinds;
pub use kinds::*;
