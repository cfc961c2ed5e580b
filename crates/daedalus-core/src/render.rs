//! Renderable components.

use crate::error::Result;

/// Something that renders to an HTML document or fragment.
///
/// Template engines plug in by implementing this for their component type.
pub trait Render: Send + Sync + 'static {
    /// Produces the markup.
    fn render(&self) -> Result<String>;
}

impl Render for String {
    fn render(&self) -> Result<String> {
        Ok(self.clone())
    }
}

impl Render for &'static str {
    fn render(&self) -> Result<String> {
        Ok((*self).to_string())
    }
}
