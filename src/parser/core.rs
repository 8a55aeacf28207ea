//! Core 3MF element parsing
//!
//! This module handles parsing of objects, vertices, triangles, components and
//! build items.

use std::collections::HashMap;

use quick_xml::events::BytesStart;

use crate::error::{Error, Result};
use crate::geometry::Transform;
use crate::model::*;

use super::{get_attr_by_local_name, parse_attributes};

/// Parse object element attributes
pub fn parse_object(e: &BytesStart) -> Result<Object> {
    let attrs = parse_attributes(e)?;

    let id = required_usize(&attrs, "object", "id")?;

    let mut object = Object::new(id);
    object.name = attrs.get("name").cloned();
    if let Some(type_str) = attrs.get("type") {
        object.object_type = ObjectType::from_attribute(type_str);
    }

    Ok(object)
}

/// Parse vertex element attributes
pub fn parse_vertex(e: &BytesStart) -> Result<Vertex> {
    let mut x_opt: Option<f64> = None;
    let mut y_opt: Option<f64> = None;
    let mut z_opt: Option<f64> = None;

    let parse_f64 = |name: &str, value: &[u8]| -> Result<f64> {
        let value_str = std::str::from_utf8(value).map_err(|e| Error::InvalidXml(e.to_string()))?;
        let parsed = value_str.trim().parse::<f64>().map_err(|_| {
            Error::parse_error_with_context(name, value_str, "floating-point number")
        })?;
        if !parsed.is_finite() {
            return Err(Error::parse_error_with_context(
                name,
                value_str,
                "finite number",
            ));
        }
        Ok(parsed)
    };

    for attr_result in e.attributes() {
        let attr = attr_result?;
        match attr.key.as_ref() {
            b"x" => x_opt = Some(parse_f64("vertex x coordinate", &attr.value)?),
            b"y" => y_opt = Some(parse_f64("vertex y coordinate", &attr.value)?),
            b"z" => z_opt = Some(parse_f64("vertex z coordinate", &attr.value)?),
            _ => {}
        }
    }

    let x = x_opt.ok_or_else(|| Error::missing_attribute("vertex", "x"))?;
    let y = y_opt.ok_or_else(|| Error::missing_attribute("vertex", "y"))?;
    let z = z_opt.ok_or_else(|| Error::missing_attribute("vertex", "z"))?;

    Ok(Vertex::new(x, y, z))
}

/// Parse triangle element attributes
pub fn parse_triangle(e: &BytesStart) -> Result<Triangle> {
    let mut v1: Option<usize> = None;
    let mut v2: Option<usize> = None;
    let mut v3: Option<usize> = None;

    let parse_usize = |name: &str, value: &[u8]| -> Result<usize> {
        let value_str = std::str::from_utf8(value).map_err(|e| Error::InvalidXml(e.to_string()))?;
        value_str
            .trim()
            .parse::<usize>()
            .map_err(|_| Error::parse_error_with_context(name, value_str, "vertex index"))
    };

    for attr_result in e.attributes() {
        let attr = attr_result?;
        match attr.key.as_ref() {
            b"v1" => v1 = Some(parse_usize("triangle v1", &attr.value)?),
            b"v2" => v2 = Some(parse_usize("triangle v2", &attr.value)?),
            b"v3" => v3 = Some(parse_usize("triangle v3", &attr.value)?),
            _ => {}
        }
    }

    Ok(Triangle::new(
        v1.ok_or_else(|| Error::missing_attribute("triangle", "v1"))?,
        v2.ok_or_else(|| Error::missing_attribute("triangle", "v2"))?,
        v3.ok_or_else(|| Error::missing_attribute("triangle", "v3"))?,
    ))
}

/// A component with its optional production-extension path
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedComponent {
    /// The component itself
    pub component: Component,
    /// Model part holding the referenced object, when not the root model
    pub path: Option<String>,
}

/// Parse component element attributes
pub fn parse_component(e: &BytesStart) -> Result<ParsedComponent> {
    let attrs = parse_attributes(e)?;
    let objectid = required_usize(&attrs, "component", "objectid")?;

    let mut component = Component::new(objectid);
    if let Some(transform) = attrs.get("transform") {
        component.transform = Some(transform.parse::<Transform>()?);
    }

    Ok(ParsedComponent {
        component,
        path: get_attr_by_local_name(&attrs, "path"),
    })
}

/// Parse build item element attributes
pub fn parse_build_item(e: &BytesStart) -> Result<BuildItem> {
    let attrs = parse_attributes(e)?;
    let objectid = required_usize(&attrs, "item", "objectid")?;

    let mut item = BuildItem::new(objectid);
    if let Some(transform) = attrs.get("transform") {
        item.transform = Some(transform.parse::<Transform>()?);
    }
    if let Some(printable) = attrs.get("printable") {
        item.printable = Some(parse_bool("item printable", printable)?);
    }

    Ok(item)
}

pub(crate) fn parse_bool(field: &str, value: &str) -> Result<bool> {
    match value.trim() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        other => Err(Error::parse_error_with_context(field, other, "boolean")),
    }
}

pub(crate) fn required_usize(
    attrs: &HashMap<String, String>,
    element: &str,
    attribute: &str,
) -> Result<usize> {
    let value = attrs
        .get(attribute)
        .ok_or_else(|| Error::missing_attribute(element, attribute))?;
    value.trim().parse::<usize>().map_err(|_| {
        Error::parse_error_with_context(
            &format!("{} {}", element, attribute),
            value,
            "non-negative integer",
        )
    })
}
