pub mod app;
pub mod contact;
pub mod content;
pub mod error;
pub mod page;
pub mod router;
pub mod settings;
pub mod template;
pub mod theme;

pub use error::{Error, Result};
pub use settings::Settings;
