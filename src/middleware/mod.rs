pub mod client_ctx;
pub mod csrf;
pub mod htmx;

pub use client_ctx::ClientCtx;
