//! Build-time island extraction for Isle.
//!
//! An island is an interactive fragment of an otherwise static page. The
//! extractor finds island call sites in a component tree, emits one client
//! unit per call site, and rewrites the server tree so the renderer emits a
//! placeholder custom element carrying the island's props:
//!
//! ```text
//! <Counter count={1}/>   ->   <island-counter-1a2b3c4d5e6f7a8b data-props="{&quot;count&quot;:1}">
//!                               ...server-rendered markup...
//!                             </island-counter-1a2b3c4d5e6f7a8b>
//! ```
//!
//! Island ids hash the call site's source location, so two uses of the same
//! component are two independent islands.
//!
//! Generated client units import `defineIsland` from `{public_path}/runtime.js`
//! (see [`ClientCodegen::with_runtime_module`]). That browser runtime is not
//! produced here; the external build that bundles the client units supplies
//! it.

mod classify;
mod codegen;
mod error;
mod extract;
mod id;
mod manifest;
mod tree;

pub use classify::*;
pub use codegen::*;
pub use error::*;
pub use extract::*;
pub use id::*;
pub use manifest::*;
pub use tree::*;
