//! Descriptor writer
//!
//! Output follows the engine's own layout: two-space indentation, payloads
//! split into one string literal per source line closed by an empty
//! literal, and transform axes left out when they hold their default.

use std::fmt::Write;

use super::lexer::escape;
use crate::components::{ComponentReference, EmbeddedComponent};
use crate::entity::EntityDescriptor;
use crate::foundation::math::Transform;

const INDENT: &str = "  ";

/// Render a descriptor as text
pub fn serialize(descriptor: &EntityDescriptor) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_descriptor(&mut out, descriptor);
    out
}

fn write_descriptor(out: &mut String, descriptor: &EntityDescriptor) -> std::fmt::Result {
    writeln!(out, "id: \"{}\"", escape(&descriptor.id))?;

    for component in &descriptor.components {
        write_component(out, component)?;
    }
    for embedded in &descriptor.embedded_components {
        write_embedded(out, embedded)?;
    }
    Ok(())
}

fn write_component(out: &mut String, component: &ComponentReference) -> std::fmt::Result {
    writeln!(out, "components {{")?;
    writeln!(out, "{INDENT}id: \"{}\"", escape(&component.id))?;
    writeln!(out, "{INDENT}component: \"{}\"", escape(&component.component_path))?;
    write_transform(out, &component.local_transform)?;

    for property in &component.properties {
        writeln!(out, "{INDENT}properties {{")?;
        writeln!(out, "{INDENT}{INDENT}id: \"{}\"", escape(&property.id))?;
        writeln!(out, "{INDENT}{INDENT}value: \"{}\"", escape(&property.value))?;
        writeln!(out, "{INDENT}{INDENT}type: {}", property.property_type.as_str())?;
        writeln!(out, "{INDENT}}}")?;
    }

    writeln!(out, "}}")
}

fn write_embedded(out: &mut String, embedded: &EmbeddedComponent) -> std::fmt::Result {
    writeln!(out, "embedded_components {{")?;
    writeln!(out, "{INDENT}id: \"{}\"", escape(&embedded.id))?;
    writeln!(out, "{INDENT}type: \"{}\"", escape(embedded.component_type.as_str()))?;

    write!(out, "{INDENT}data: ")?;
    for line in embedded.payload.as_str().split_inclusive('\n') {
        writeln!(out, "\"{}\"", escape(line))?;
        write!(out, "{INDENT}")?;
    }
    writeln!(out, "\"\"")?;

    write_transform(out, &embedded.local_transform)?;
    writeln!(out, "}}")
}

fn write_transform(out: &mut String, transform: &Transform) -> std::fmt::Result {
    let position = &transform.position;
    write_axes(out, "position", &[("x", position.x), ("y", position.y), ("z", position.z)], 0.0)?;

    let rotation = &transform.rotation.coords;
    let rotation_axes = [("x", rotation.x, 0.0), ("y", rotation.y, 0.0), ("z", rotation.z, 0.0), ("w", rotation.w, 1.0)];
    if rotation_axes.iter().any(|(_, value, default)| value != default) {
        writeln!(out, "{INDENT}rotation {{")?;
        for (axis, value, default) in rotation_axes {
            if value != default {
                writeln!(out, "{INDENT}{INDENT}{axis}: {value}")?;
            }
        }
        writeln!(out, "{INDENT}}}")?;
    }

    let scale = &transform.scale;
    write_axes(out, "scale", &[("x", scale.x), ("y", scale.y), ("z", scale.z)], 1.0)
}

fn write_axes(out: &mut String, name: &str, axes: &[(&str, f32)], default: f32) -> std::fmt::Result {
    if axes.iter().all(|(_, value)| *value == default) {
        return Ok(());
    }

    writeln!(out, "{INDENT}{name} {{")?;
    for (axis, value) in axes {
        if *value != default {
            writeln!(out, "{INDENT}{INDENT}{axis}: {value}")?;
        }
    }
    writeln!(out, "{INDENT}}}")
}
