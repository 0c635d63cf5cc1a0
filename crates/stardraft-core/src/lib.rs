#![deny(warnings)]
pub mod draft;
pub mod model;
pub mod projection;
pub mod session;

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "stardraft"
    }

    pub const fn codename() -> &'static str {
        "Constellation"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
