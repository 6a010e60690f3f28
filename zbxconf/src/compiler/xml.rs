use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::compiler::tree::Node;
use crate::errors::{ConfigError, ConfigResult};

pub const DEFAULT_INDENT: usize = 2;

fn serialize_error(err: impl std::fmt::Display) -> ConfigError {
    ConfigError::Serialize {
        message: err.to_string(),
    }
}

/// Render `root` as an indented XML document with a declaration.
pub fn dumps(root: &Node) -> ConfigResult<String> {
    dumps_with_indent(root, DEFAULT_INDENT)
}

pub fn dumps_with_indent(root: &Node, indent: usize) -> ConfigResult<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', indent);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(serialize_error)?;
    write_node(&mut writer, root)?;
    let mut text = String::from_utf8(writer.into_inner()).map_err(serialize_error)?;
    text.push('\n');
    Ok(text)
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> ConfigResult<()> {
    let text = node.text.as_deref().filter(|text| !text.is_empty());
    if text.is_none() && node.children.is_empty() {
        return writer
            .write_event(Event::Empty(BytesStart::new(node.tag.as_str())))
            .map_err(serialize_error);
    }
    writer
        .write_event(Event::Start(BytesStart::new(node.tag.as_str())))
        .map_err(serialize_error)?;
    if let Some(text) = text {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(serialize_error)?;
    }
    for child in &node.children {
        write_node(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(node.tag.as_str())))
        .map_err(serialize_error)
}
