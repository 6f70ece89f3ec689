pub mod book;
pub mod bookmark;
pub mod bridge;
pub mod document;
pub mod event_source;
pub mod html_to_document;
pub mod main_app;
pub mod notification;
pub mod panic_handler;
pub mod session;
pub mod settings;
pub mod surface;
pub mod table_of_contents;
pub mod theme;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use main_app::{App, FocusedPanel, run_app_with_event_source};
