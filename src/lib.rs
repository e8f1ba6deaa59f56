pub mod config;
pub mod distro;
pub mod logging;
pub mod notify;
pub mod reconcile;
pub mod status;
pub mod store;
pub mod sync;
pub mod upstream;
pub mod version;
