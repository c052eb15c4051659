//! Server rendering for Isle.
//!
//! Renders component trees to HTML. Island placeholders become their
//! custom element with the resolved props JSON in a data attribute and the
//! island's server-rendered markup as children, so the page is complete
//! before any client code runs.

mod error;
mod escape;
mod props;
mod renderer;
mod shell;

pub use error::*;
pub use escape::*;
pub use props::*;
pub use renderer::*;
pub use shell::*;
