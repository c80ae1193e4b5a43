//! `xml`: vocations and conversion between XML and Lua tables.
//!
//! Documents map to a tree of nodes:
//!
//! ```lua
//! local doc = xml:unmarshal('<town id="1">Thais</town>')
//! -- doc = { name = "town", attrs = { id = "1" }, children = {}, text = "Thais" }
//! ```

use ember_runtime::convert::{from_lua, to_lua};
use ember_runtime::{host, CapabilityModule};
use mlua::Value;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;

/// One XML element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XmlNode {
    pub name: String,
    pub attrs: BTreeMap<String, String>,
    pub children: Vec<XmlNode>,
    pub text: String,
}

pub fn module() -> CapabilityModule {
    CapabilityModule::namespace("xml")
        .function("vocationList", |lua, ()| {
            to_lua(lua, &host(lua)?.game_data().vocations)
        })
        .function("vocationByName", |lua, name: String| {
            to_lua(lua, &host(lua)?.game_data().vocation_by_name(&name))
        })
        .function("vocationByID", |lua, id: i64| {
            to_lua(lua, &host(lua)?.game_data().vocation_by_id(id))
        })
        .function("marshal", |lua, node: Value| {
            let node: XmlNode = from_lua(lua, node)?;
            marshal(&node)
        })
        .function("unmarshal", |lua, source: String| {
            to_lua(lua, &unmarshal(&source)?)
        })
        .function("unmarshalFile", |lua, path: String| {
            let source = fs::read_to_string(&path)
                .map_err(|e| mlua::Error::runtime(format!("xml: cannot read {path}: {e}")))?;
            to_lua(lua, &unmarshal(&source)?)
        })
}

/// Parse a document into its root node. Whitespace-only text is dropped.
pub fn unmarshal(source: &str) -> mlua::Result<XmlNode> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(true);

    let mut open: Vec<XmlNode> = Vec::new();
    let mut root = None;
    loop {
        match reader.read_event().map_err(mlua::Error::external)? {
            Event::Start(start) => open.push(element(&start)?),
            Event::Empty(start) => attach(&mut open, &mut root, element(&start)?)?,
            Event::End(_) => {
                let node = open
                    .pop()
                    .ok_or_else(|| mlua::Error::runtime("xml: unexpected closing tag"))?;
                attach(&mut open, &mut root, node)?;
            }
            Event::Text(text) => {
                if let Some(node) = open.last_mut() {
                    node.text
                        .push_str(&text.unescape().map_err(mlua::Error::external)?);
                }
            }
            Event::CData(data) => {
                if let Some(node) = open.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(node) = open.last() {
        return Err(mlua::Error::runtime(format!(
            "xml: element <{}> is not closed",
            node.name
        )));
    }
    root.ok_or_else(|| mlua::Error::runtime("xml: document has no root element"))
}

/// Serialize a node tree.
pub fn marshal(node: &XmlNode) -> mlua::Result<String> {
    let mut writer = Writer::new(Vec::new());
    write_node(&mut writer, node)?;
    String::from_utf8(writer.into_inner()).map_err(mlua::Error::external)
}

fn element(start: &BytesStart) -> mlua::Result<XmlNode> {
    let mut node = XmlNode {
        name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        ..XmlNode::default()
    };
    for attr in start.attributes() {
        let attr = attr.map_err(mlua::Error::external)?;
        let value = attr.unescape_value().map_err(mlua::Error::external)?;
        node.attrs.insert(
            String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            value.into_owned(),
        );
    }
    Ok(node)
}

fn attach(open: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) -> mlua::Result<()> {
    match open.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_none() => *root = Some(node),
        None => return Err(mlua::Error::runtime("xml: more than one root element")),
    }
    Ok(())
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> mlua::Result<()> {
    if node.name.is_empty() {
        return Err(mlua::Error::runtime("xml: element without a name"));
    }

    let start = BytesStart::new(node.name.as_str())
        .with_attributes(node.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    if node.children.is_empty() && node.text.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(mlua::Error::external);
    }

    writer
        .write_event(Event::Start(start))
        .map_err(mlua::Error::external)?;
    if !node.text.is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(&node.text)))
            .map_err(mlua::Error::external)?;
    }
    for child in &node.children {
        write_node(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(node.name.as_str())))
        .map_err(mlua::Error::external)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::lua_for;
    use ember_runtime::services::{GameData, Vocation};
    use ember_runtime::{AppConfig, HostContext};
    use std::io::Write;

    fn lua() -> mlua::Lua {
        let data = GameData {
            vocations: vec![
                Vocation { id: 1, name: "Sorcerer".into(), description: "a sorcerer".into() },
                Vocation { id: 4, name: "Knight".into(), description: "a knight".into() },
            ],
            ..GameData::default()
        };
        lua_for(module(), HostContext::new(AppConfig::default()).with_game_data(data))
    }

    #[test]
    fn test_unmarshal_tree() {
        let doc = unmarshal(
            r#"<?xml version="1.0"?>
            <towns>
                <town id="1" name="Thais &amp; Co"/>
                <town id="2">Carlin</town>
            </towns>"#,
        )
        .unwrap();

        assert_eq!(doc.name, "towns");
        assert_eq!(doc.children.len(), 2);
        assert_eq!(doc.children[0].attrs["name"], "Thais & Co");
        assert_eq!(doc.children[1].text, "Carlin");
    }

    #[test]
    fn test_unmarshal_rejects_broken_documents() {
        assert!(unmarshal("<a><b></a>").is_err());
        assert!(unmarshal("<a>").is_err());
        assert!(unmarshal("<a/><b/>").is_err());
        assert!(unmarshal("").is_err());
    }

    #[test]
    fn test_marshal_escapes() {
        let node = XmlNode {
            name: "motd".into(),
            attrs: BTreeMap::from([("lang".to_string(), "en".to_string())]),
            children: vec![XmlNode { name: "br".into(), ..XmlNode::default() }],
            text: "a < b".into(),
        };
        assert_eq!(
            marshal(&node).unwrap(),
            r#"<motd lang="en">a &lt; b<br/></motd>"#
        );
    }

    #[test]
    fn test_script_round_trip() {
        let out: String = lua()
            .load(
                r#"
                local doc = xml:unmarshal('<stats><online count="5"/></stats>')
                doc.children[1].attrs.count = "6"
                return xml:marshal(doc)
                "#,
            )
            .eval()
            .unwrap();
        assert_eq!(out, r#"<stats><online count="6"/></stats>"#);
    }

    #[test]
    fn test_unmarshal_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"<config><rate>5</rate></config>").unwrap();

        let lua = lua();
        lua.globals()
            .set("path", file.path().to_string_lossy().into_owned())
            .unwrap();
        let rate: String = lua
            .load("return xml:unmarshalFile(path).children[1].text")
            .eval()
            .unwrap();
        assert_eq!(rate, "5");
    }

    #[test]
    fn test_vocations() {
        let ok: bool = lua()
            .load(
                r#"
                return #xml:vocationList() == 2
                    and xml:vocationByName("knight").id == 4
                    and xml:vocationByID(1).name == "Sorcerer"
                    and xml:vocationByID(9) == nil
                "#,
            )
            .eval()
            .unwrap();
        assert!(ok);
    }
}
