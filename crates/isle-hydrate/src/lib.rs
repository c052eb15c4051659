//! Isle Hydrate
//!
//! Client-side island runtime. Server-rendered island elements are decoded,
//! observed for visibility, and mounted once when they scroll into view.
//!
//! ```ignore
//! let dom = Dom::parse(&html)?;
//! let mut runtime = HydrationRuntime::new(dom, options, observer, loader);
//! runtime.define_all();
//! runtime.on_intersection(&entries).await;
//!
//! // Or keep delivering intersections while modules load:
//! for pending in runtime.handle_intersections(&entries) {
//!     let module = runtime.load(&pending).await;
//!     runtime.complete(pending.element, module);
//! }
//! ```

pub mod dom;
pub mod error;
pub mod reconstruct;
pub mod registry;
pub mod runtime;

pub use dom::{Dom, DomData, DomNode, NodeId};
pub use error::*;
pub use reconstruct::*;
pub use registry::*;
pub use runtime::*;
