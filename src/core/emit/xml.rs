//! Scope-checked XML writer
//!
//! A thin layer over `quick_xml::Writer` that remembers which elements are
//! open. Closing anything but the innermost open element, or finishing with
//! elements still open, is a [`TallyError::MalformedScope`].

use crate::domain::{Result, TallyError};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

fn xml_error(e: impl std::fmt::Display) -> TallyError {
    TallyError::Xml(e.to_string())
}

/// Indented XML writer with an explicit scope stack
pub struct RegistryXmlWriter {
    writer: Writer<Vec<u8>>,
    scopes: Vec<&'static str>,
}

impl RegistryXmlWriter {
    /// Starts a document with an XML declaration
    pub fn new() -> Result<Self> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(xml_error)?;
        Ok(Self {
            writer,
            scopes: Vec::new(),
        })
    }

    /// Opens an element scope
    pub fn open(&mut self, name: &'static str, attributes: &[(&str, &str)]) -> Result<()> {
        let mut start = BytesStart::new(name);
        for attribute in attributes {
            start.push_attribute(*attribute);
        }
        self.writer
            .write_event(Event::Start(start))
            .map_err(xml_error)?;
        self.scopes.push(name);
        Ok(())
    }

    /// Closes the innermost scope, which must be `name`
    pub fn close(&mut self, name: &'static str) -> Result<()> {
        match self.scopes.last() {
            Some(open) if *open == name => {}
            Some(open) => {
                return Err(TallyError::MalformedScope(format!(
                    "cannot close <{name}> while <{open}> is open"
                )))
            }
            None => {
                return Err(TallyError::MalformedScope(format!(
                    "cannot close <{name}>, no element is open"
                )))
            }
        }
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_error)?;
        self.scopes.pop();
        Ok(())
    }

    /// Writes a text-only element inside the current scope
    pub fn element(&mut self, name: &str, text: &str) -> Result<()> {
        self.writer
            .write_event(Event::Start(BytesStart::new(name)))
            .map_err(xml_error)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_error)?;
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_error)?;
        Ok(())
    }

    /// Currently open scopes, outermost first
    pub fn open_scopes(&self) -> &[&'static str] {
        &self.scopes
    }

    /// Returns the document bytes; every scope must be closed
    pub fn finish(self) -> Result<Vec<u8>> {
        if let Some(open) = self.scopes.last() {
            return Err(TallyError::MalformedScope(format!(
                "document finished with <{open}> still open"
            )));
        }
        let mut bytes = self.writer.into_inner();
        bytes.push(b'\n');
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_elements() {
        let mut writer = RegistryXmlWriter::new().unwrap();
        writer.open("submission", &[("type", "PQRI-REGISTRY")]).unwrap();
        writer.open("measure-group", &[("ID", "X")]).unwrap();
        writer.element("npi", "1234567893").unwrap();
        assert_eq!(writer.open_scopes(), &["submission", "measure-group"]);
        writer.close("measure-group").unwrap();
        writer.close("submission").unwrap();

        let xml = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains("<submission type=\"PQRI-REGISTRY\">"));
        assert!(xml.contains("    <npi>1234567893</npi>"));
        assert!(xml.trim_end().ends_with("</submission>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let mut writer = RegistryXmlWriter::new().unwrap();
        writer.open("registry", &[]).unwrap();
        writer.element("registry-name", "Smith & Sons <Registry>").unwrap();
        writer.close("registry").unwrap();
        let xml = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert!(xml.contains("Smith &amp; Sons &lt;Registry&gt;"));
    }

    #[test]
    fn test_mismatched_close() {
        let mut writer = RegistryXmlWriter::new().unwrap();
        writer.open("submission", &[]).unwrap();
        writer.open("registry", &[]).unwrap();
        assert!(matches!(
            writer.close("submission"),
            Err(TallyError::MalformedScope(_))
        ));
    }

    #[test]
    fn test_close_without_open() {
        let mut writer = RegistryXmlWriter::new().unwrap();
        assert!(matches!(
            writer.close("provider"),
            Err(TallyError::MalformedScope(_))
        ));
    }

    #[test]
    fn test_finish_with_open_scope() {
        let mut writer = RegistryXmlWriter::new().unwrap();
        writer.open("submission", &[]).unwrap();
        assert!(matches!(
            writer.finish(),
            Err(TallyError::MalformedScope(_))
        ));
    }
}
