//! XML body binding

use super::{Bindable, Binding};
use crate::error::Result;

/// Decodes XML bodies; an empty body leaves the destination untouched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XmlBinding;

impl Binding for XmlBinding {
    fn name(&self) -> &'static str {
        "xml"
    }

    fn bind<T: Bindable>(&self, body: &[u8], dest: &mut T) -> Result<()> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(());
        }
        *dest = quick_xml::de::from_reader(body)?;
        Ok(())
    }
}
