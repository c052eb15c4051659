//! Isle Server
//!
//! Request dispatch for Isle applications: page routes render through the
//! island-aware renderer into the document shell, API routes dispatch on the
//! request method.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use isle_server::prelude::*;
//!
//! let app = IsleApp::builder(IsleConfig::default())?
//!     .page("index.page.tsx", PageModule::new(|_| Node::text("Hello")))?
//!     .page(
//!         "blog/$id.page.tsx",
//!         PageModule::new(render_post).with_loader(load_post),
//!     )?
//!     .api("users/$id.ts", ApiModule::new().get(get_user))?
//!     .build();
//!
//! let response = app.handle(RequestContext::new(Method::Get, "/blog/42")).await;
//! ```

pub mod prelude;
mod api;
mod app;
mod error;
mod hooks;
mod logging;
mod page;
mod response;

pub use api::*;
pub use app::*;
pub use error::*;
pub use hooks::*;
pub use logging::*;
pub use page::*;
pub use response::*;

// Re-export the pieces applications build pages from
pub use isle_core::{IsleConfig, Method, RequestContext, RouteParams};
pub use isle_islands::{ComponentCall, Element, Node};
pub use isle_render::HeadContent;
pub use isle_router::RouteLoader;
