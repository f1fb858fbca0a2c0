mod navigator;
mod resolver;

pub use navigator::{find_link_by_text, HttpNavigator, Navigator, WebPage};
pub use resolver::{MirrorResolver, ReleaseContext};
