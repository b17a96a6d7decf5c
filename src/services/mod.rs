pub mod api;
pub mod handoff;
pub mod notify;
pub mod pages;
pub mod reconcile;
pub mod render;
pub mod timefmt;
pub mod validation;
