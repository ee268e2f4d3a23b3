//! Recursive descent reader for entity descriptors
//!
//! Reading happens in two passes: the text is parsed into raw records that
//! keep every transform axis optional, then the records are turned into an
//! [`EntityDescriptor`] once the entity id is known, so validation errors
//! can name both the entity and the failing child.

use std::path::Path;

use super::error::{ParseError, ParseErrorKind};
use super::lexer::{Lexer, Spanned, Token};
use crate::components::{ComponentReference, ComponentType, EmbeddedComponent, PropertyOverride, PropertyType, SchemaRegistry};
use crate::entity::EntityDescriptor;
use crate::error::DescriptorError;
use crate::foundation::math::{normalize_rotation, Transform, Vec3, MIN_ROTATION_NORM};

/// Reads descriptors against a schema registry
#[derive(Debug, Clone, Copy)]
pub struct Deserializer<'r> {
    registry: &'r SchemaRegistry,
    rotation_epsilon: f32,
}

impl<'r> Deserializer<'r> {
    /// Reader checking payloads against `registry`
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self {
            registry,
            rotation_epsilon: MIN_ROTATION_NORM,
        }
    }

    /// Reject rotations whose norm is below `epsilon`
    pub fn with_rotation_epsilon(mut self, epsilon: f32) -> Self {
        self.rotation_epsilon = epsilon;
        self
    }

    /// Parse and validate a descriptor that carries its own `id`
    pub fn deserialize(&self, text: &str) -> Result<EntityDescriptor, DescriptorError> {
        self.read(text, None)
    }

    /// Parse and validate, using `fallback_id` when the text has no `id`
    pub fn deserialize_with_id(&self, text: &str, fallback_id: &str) -> Result<EntityDescriptor, DescriptorError> {
        self.read(text, Some(fallback_id))
    }

    /// Read a descriptor file; the file stem is the fallback id
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<EntityDescriptor, DescriptorError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DescriptorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let stem = path.file_stem().and_then(|s| s.to_str());

        log::debug!("Loading descriptor {}", path.display());
        self.read(&text, stem)
    }

    fn read(&self, text: &str, fallback_id: Option<&str>) -> Result<EntityDescriptor, DescriptorError> {
        let document = DescriptorParser::new(text)?.document()?;

        let id = match (document.id, fallback_id) {
            (Some(id), _) => id,
            (None, Some(fallback)) => fallback.to_string(),
            (None, None) => {
                let (line, column) = document.end;
                return Err(ParseError::new(
                    line,
                    column,
                    ParseErrorKind::MissingField {
                        field: "id".to_string(),
                        context: "descriptor".to_string(),
                    },
                )
                .into());
            }
        };

        let mut descriptor = EntityDescriptor::new(id);

        for raw in document.components {
            let transform = raw.transform.build(self.rotation_epsilon).ok_or_else(|| {
                DescriptorError::validation(&descriptor.id, Some(&raw.id), raw.transform.rotation_message())
            })?;
            descriptor.components.push(ComponentReference {
                id: raw.id,
                component_path: raw.component,
                local_transform: transform,
                properties: raw.properties,
            });
        }

        for raw in document.embedded {
            let transform = raw.transform.build(self.rotation_epsilon).ok_or_else(|| {
                DescriptorError::validation(&descriptor.id, Some(&raw.id), raw.transform.rotation_message())
            })?;
            descriptor.embedded_components.push(EmbeddedComponent {
                id: raw.id,
                component_type: ComponentType::from_tag(&raw.type_tag),
                payload: raw.data.into(),
                local_transform: transform,
            });
        }

        descriptor.validate(self.registry)?;
        Ok(descriptor)
    }
}

/// Transform with every axis optional, as written
#[derive(Debug, Default)]
struct RawTransform {
    position: [Option<f32>; 3],
    rotation: [Option<f32>; 4],
    scale: [Option<f32>; 3],
}

impl RawTransform {
    fn build(&self, min_norm: f32) -> Option<Transform> {
        let [px, py, pz] = self.position.map(|axis| axis.unwrap_or(0.0));
        let [rx, ry, rz] = [self.rotation[0], self.rotation[1], self.rotation[2]].map(|axis| axis.unwrap_or(0.0));
        let rw = self.rotation[3].unwrap_or(1.0);
        let [sx, sy, sz] = self.scale.map(|axis| axis.unwrap_or(1.0));

        let rotation = normalize_rotation(rx, ry, rz, rw, min_norm)?;
        Some(Transform::new(Vec3::new(px, py, pz), rotation, Vec3::new(sx, sy, sz)))
    }

    fn rotation_message(&self) -> String {
        let axes = self.rotation.map(|axis| axis.unwrap_or(0.0));
        format!("rotation {axes:?} cannot be normalized")
    }
}

#[derive(Debug)]
struct RawComponent {
    id: String,
    component: String,
    transform: RawTransform,
    properties: Vec<PropertyOverride>,
}

#[derive(Debug)]
struct RawEmbedded {
    id: String,
    type_tag: String,
    data: String,
    transform: RawTransform,
}

#[derive(Debug)]
struct RawDocument {
    id: Option<String>,
    components: Vec<RawComponent>,
    embedded: Vec<RawEmbedded>,
    /// Position of end of input
    end: (usize, usize),
}

const POSITION_AXES: [&str; 3] = ["x", "y", "z"];
const ROTATION_AXES: [&str; 4] = ["x", "y", "z", "w"];

struct DescriptorParser<'a> {
    lexer: Lexer<'a>,
    current: Spanned,
}

impl<'a> DescriptorParser<'a> {
    fn new(text: &'a str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(text);
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next).token)
    }

    fn position(&self) -> (usize, usize) {
        (self.current.line, self.current.column)
    }

    fn error_at(&self, (line, column): (usize, usize), kind: ParseErrorKind) -> ParseError {
        ParseError::new(line, column, kind)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        self.error_at(
            self.position(),
            ParseErrorKind::UnexpectedToken {
                expected: expected.to_string(),
                found: self.current.token.to_string(),
            },
        )
    }

    fn expect(&mut self, token: Token, expected: &str) -> Result<(), ParseError> {
        if self.current.token != token {
            return Err(self.unexpected(expected));
        }
        self.advance()?;
        Ok(())
    }

    /// `: "a" "b" ...`, adjacent literals concatenated
    fn string_value(&mut self) -> Result<String, ParseError> {
        self.expect(Token::Colon, "':'")?;
        if !matches!(self.current.token, Token::Str(_)) {
            return Err(self.unexpected("string literal"));
        }

        let mut value = String::new();
        while let Token::Str(part) = &self.current.token {
            value.push_str(part);
            self.advance()?;
        }
        Ok(value)
    }

    /// `: <number>`
    fn number_value(&mut self) -> Result<f32, ParseError> {
        self.expect(Token::Colon, "':'")?;
        let at = self.position();
        match self.advance()? {
            Token::Number(lexeme) => match lexeme.parse::<f32>() {
                Ok(value) if value.is_finite() => Ok(value),
                _ => Err(self.error_at(at, ParseErrorKind::InvalidNumber(lexeme))),
            },
            found => Err(self.error_at(
                at,
                ParseErrorKind::UnexpectedToken {
                    expected: "number".to_string(),
                    found: found.to_string(),
                },
            )),
        }
    }

    /// `: IDENT`
    fn ident_value(&mut self) -> Result<(String, (usize, usize)), ParseError> {
        self.expect(Token::Colon, "':'")?;
        let at = self.position();
        match &self.current.token {
            Token::Ident(word) => {
                let word = word.clone();
                self.advance()?;
                Ok((word, at))
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// `{` or `: {`
    fn open_block(&mut self) -> Result<(), ParseError> {
        if self.current.token == Token::Colon {
            self.advance()?;
        }
        self.expect(Token::LBrace, "'{'")
    }

    /// Run `field` for every field name until the closing brace, returning
    /// the position of that brace
    fn fields<F>(&mut self, mut field: F) -> Result<(usize, usize), ParseError>
    where
        F: FnMut(&mut Self, String, (usize, usize)) -> Result<(), ParseError>,
    {
        loop {
            let at = self.position();
            match &self.current.token {
                Token::RBrace => {
                    self.advance()?;
                    return Ok(at);
                }
                Token::Ident(name) => {
                    let name = name.clone();
                    self.advance()?;
                    field(self, name, at)?;
                }
                _ => return Err(self.unexpected("field name or '}'")),
            }
        }
    }

    fn unknown(&self, at: (usize, usize), field: String, context: &str) -> ParseError {
        self.error_at(
            at,
            ParseErrorKind::UnknownField {
                field,
                context: context.to_string(),
            },
        )
    }

    fn duplicate(&self, at: (usize, usize), field: &str, context: &str) -> ParseError {
        self.error_at(
            at,
            ParseErrorKind::DuplicateField {
                field: field.to_string(),
                context: context.to_string(),
            },
        )
    }

    fn missing(&self, at: (usize, usize), field: &str, context: &str) -> ParseError {
        self.error_at(
            at,
            ParseErrorKind::MissingField {
                field: field.to_string(),
                context: context.to_string(),
            },
        )
    }

    fn document(mut self) -> Result<RawDocument, ParseError> {
        let mut id = None;
        let mut components = Vec::new();
        let mut embedded = Vec::new();

        loop {
            let at = self.position();
            let name = match &self.current.token {
                Token::Eof => break,
                Token::Ident(name) => name.clone(),
                _ => return Err(self.unexpected("field name")),
            };
            self.advance()?;

            match name.as_str() {
                "id" => {
                    if id.is_some() {
                        return Err(self.duplicate(at, "id", "descriptor"));
                    }
                    id = Some(self.string_value()?);
                }
                "components" => {
                    let context = format!("components[{}]", components.len());
                    self.open_block()?;
                    components.push(self.component(&context)?);
                }
                "embedded_components" => {
                    let context = format!("embedded_components[{}]", embedded.len());
                    self.open_block()?;
                    embedded.push(self.embedded(&context)?);
                }
                _ => return Err(self.unknown(at, name, "descriptor")),
            }
        }

        Ok(RawDocument {
            id,
            components,
            embedded,
            end: self.position(),
        })
    }

    fn component(&mut self, context: &str) -> Result<RawComponent, ParseError> {
        let mut id = None;
        let mut component = None;
        let mut transform = RawTransform::default();
        let mut seen_blocks = [false; 3];
        let mut properties = Vec::new();

        let end = self.fields(|parser, name, at| {
            match name.as_str() {
                "id" | "component" => {
                    let slot = if name == "id" { &mut id } else { &mut component };
                    if slot.is_some() {
                        return Err(parser.duplicate(at, &name, context));
                    }
                    *slot = Some(parser.string_value()?);
                }
                "position" | "rotation" | "scale" => {
                    parser.transform_block(&name, at, &mut transform, &mut seen_blocks, context)?;
                }
                "properties" => {
                    let context = format!("{context}.properties[{}]", properties.len());
                    parser.open_block()?;
                    properties.push(parser.property(&context)?);
                }
                _ => return Err(parser.unknown(at, name, context)),
            }
            Ok(())
        })?;

        Ok(RawComponent {
            id: id.ok_or_else(|| self.missing(end, "id", context))?,
            component: component.ok_or_else(|| self.missing(end, "component", context))?,
            transform,
            properties,
        })
    }

    fn embedded(&mut self, context: &str) -> Result<RawEmbedded, ParseError> {
        let mut id = None;
        let mut type_tag = None;
        let mut data = None;
        let mut transform = RawTransform::default();
        let mut seen_blocks = [false; 3];

        let end = self.fields(|parser, name, at| {
            match name.as_str() {
                "id" | "type" | "data" => {
                    let slot = match name.as_str() {
                        "id" => &mut id,
                        "type" => &mut type_tag,
                        _ => &mut data,
                    };
                    if slot.is_some() {
                        return Err(parser.duplicate(at, &name, context));
                    }
                    *slot = Some(parser.string_value()?);
                }
                "position" | "rotation" | "scale" => {
                    parser.transform_block(&name, at, &mut transform, &mut seen_blocks, context)?;
                }
                _ => return Err(parser.unknown(at, name, context)),
            }
            Ok(())
        })?;

        Ok(RawEmbedded {
            id: id.ok_or_else(|| self.missing(end, "id", context))?,
            type_tag: type_tag.ok_or_else(|| self.missing(end, "type", context))?,
            data: data.unwrap_or_default(),
            transform,
        })
    }

    fn transform_block(
        &mut self,
        name: &str,
        at: (usize, usize),
        transform: &mut RawTransform,
        seen: &mut [bool; 3],
        context: &str,
    ) -> Result<(), ParseError> {
        let (index, axes, slots): (usize, &[&str], &mut [Option<f32>]) = match name {
            "position" => (0, &POSITION_AXES[..], &mut transform.position[..]),
            "rotation" => (1, &ROTATION_AXES[..], &mut transform.rotation[..]),
            _ => (2, &POSITION_AXES[..], &mut transform.scale[..]),
        };
        if seen[index] {
            return Err(self.duplicate(at, name, context));
        }
        seen[index] = true;

        let block = format!("{context}.{name}");
        self.open_block()?;
        self.fields(|parser, axis, at| {
            let Some(slot) = axes.iter().position(|a| *a == axis) else {
                return Err(parser.unknown(at, axis, &block));
            };
            if slots[slot].is_some() {
                return Err(parser.duplicate(at, &axis, &block));
            }
            slots[slot] = Some(parser.number_value()?);
            Ok(())
        })?;
        Ok(())
    }

    fn property(&mut self, context: &str) -> Result<PropertyOverride, ParseError> {
        let mut id = None;
        let mut value = None;
        let mut property_type = None;

        let end = self.fields(|parser, name, at| {
            match name.as_str() {
                "id" | "value" => {
                    let slot = if name == "id" { &mut id } else { &mut value };
                    if slot.is_some() {
                        return Err(parser.duplicate(at, &name, context));
                    }
                    *slot = Some(parser.string_value()?);
                }
                "type" => {
                    if property_type.is_some() {
                        return Err(parser.duplicate(at, &name, context));
                    }
                    let (tag, tag_at) = parser.ident_value()?;
                    let parsed = PropertyType::from_tag(&tag).ok_or_else(|| {
                        parser.error_at(
                            tag_at,
                            ParseErrorKind::InvalidValue {
                                field: "type".to_string(),
                                value: tag.clone(),
                            },
                        )
                    })?;
                    property_type = Some(parsed);
                }
                _ => return Err(parser.unknown(at, name, context)),
            }
            Ok(())
        })?;

        Ok(PropertyOverride {
            id: id.ok_or_else(|| self.missing(end, "id", context))?,
            value: value.ok_or_else(|| self.missing(end, "value", context))?,
            property_type: property_type.ok_or_else(|| self.missing(end, "type", context))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use approx::assert_relative_eq;

    fn read(text: &str) -> Result<EntityDescriptor, DescriptorError> {
        Deserializer::new(SchemaRegistry::builtin()).deserialize(text)
    }

    fn parse_error(text: &str) -> ParseError {
        match read(text) {
            Err(DescriptorError::Parse(err)) => err,
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_minimal_descriptor() {
        let descriptor = read("id: \"empty\"").unwrap();

        assert_eq!(descriptor.id, "empty");
        assert!(descriptor.components.is_empty());
        assert!(descriptor.embedded_components.is_empty());
    }

    #[test]
    fn test_partial_transform_blocks() {
        let descriptor = read(
            "id: \"e\"\n\
             components {\n  id: \"script\"\n  component: \"/s.script\"\n  position { z: 2.0 }\n  scale: { x: 3 }\n}",
        )
        .unwrap();

        let transform = &descriptor.components[0].local_transform;
        assert_relative_eq!(transform.position, Vec3::new(0.0, 0.0, 2.0));
        assert_relative_eq!(transform.scale, Vec3::new(3.0, 1.0, 1.0));
        assert_eq!(transform.rotation, crate::foundation::math::Quat::identity());
    }

    #[test]
    fn test_properties_are_read_in_order() {
        let descriptor = read(
            "id: \"e\"\n\
             components {\n  id: \"script\"\n  component: \"/s.script\"\n\
               properties { id: \"speed\" value: \"2.5\" type: PROPERTY_TYPE_NUMBER }\n\
               properties { id: \"team\" value: \"{{TEAM}}\" type: PROPERTY_TYPE_HASH }\n}",
        )
        .unwrap();

        let properties = &descriptor.components[0].properties;
        assert_eq!(properties.len(), 2);
        assert_eq!(properties[0].id, "speed");
        assert_eq!(properties[1].property_type, PropertyType::Hash);
    }

    #[test]
    fn test_unknown_fields_are_structural_errors() {
        let err = parse_error("id: \"e\"\nprototype: \"/x.go\"");
        assert_eq!((err.line, err.column), (2, 1));
        assert!(matches!(err.kind, ParseErrorKind::UnknownField { ref field, .. } if field == "prototype"));

        let err = parse_error("id: \"e\" components { id: \"a\" component: \"/a.script\" colour: \"red\" }");
        assert!(matches!(err.kind, ParseErrorKind::UnknownField { ref context, .. } if context == "components[0]"));

        let err = parse_error("id: \"e\" components { id: \"a\" component: \"/a.script\" position { q: 1 } }");
        assert!(matches!(err.kind, ParseErrorKind::UnknownField { ref field, .. } if field == "q"));
    }

    #[test]
    fn test_missing_and_duplicate_fields() {
        let err = parse_error("components { id: \"a\" component: \"/a.script\" }");
        assert!(matches!(err.kind, ParseErrorKind::MissingField { ref field, .. } if field == "id"));

        let err = parse_error("id: \"e\" embedded_components { id: \"m\" data: \"\" }");
        assert!(matches!(err.kind, ParseErrorKind::MissingField { ref field, .. } if field == "type"));

        let err = parse_error("id: \"e\" id: \"f\"");
        assert!(matches!(err.kind, ParseErrorKind::DuplicateField { .. }));

        let err = parse_error("id: \"e\" components { id: \"a\" component: \"/a.script\" position { x: 1 x: 2 } }");
        assert!(matches!(err.kind, ParseErrorKind::DuplicateField { ref field, .. } if field == "x"));
    }

    #[test]
    fn test_bad_tokens() {
        assert!(matches!(parse_error("id \"e\"").kind, ParseErrorKind::UnexpectedToken { .. }));
        assert!(matches!(
            parse_error("id: \"e\" components { id: \"a\" component: \"/a\" position { x: abc } }").kind,
            ParseErrorKind::UnexpectedToken { .. }
        ));
        assert!(matches!(
            parse_error("id: \"e\" components { id: \"a\" component: \"/a\" position { x: 1.2.3 } }").kind,
            ParseErrorKind::InvalidNumber(_)
        ));
        assert!(matches!(parse_error("id: \"e\" components { id: \"a\"").kind, ParseErrorKind::UnexpectedToken { .. }));
    }

    #[test]
    fn test_invalid_property_type() {
        let err = parse_error(
            "id: \"e\" components { id: \"a\" component: \"/a.script\" \
             properties { id: \"p\" value: \"1\" type: PROPERTY_TYPE_STRING } }",
        );
        assert!(matches!(err.kind, ParseErrorKind::InvalidValue { ref value, .. } if value == "PROPERTY_TYPE_STRING"));
    }

    #[test]
    fn test_fallback_id() {
        let deserializer = Deserializer::new(SchemaRegistry::builtin());

        assert_eq!(deserializer.deserialize_with_id("", "boat").unwrap().id, "boat");
        assert_eq!(deserializer.deserialize_with_id("id: \"raft\"", "boat").unwrap().id, "raft");
        assert_eq!(deserializer.deserialize("").unwrap_err().kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_zero_rotation_is_validation_error() {
        let err = read(
            "id: \"e\" embedded_components { id: \"m\" type: \"factory\" data: \"prototype: \\\"/p.go\\\"\" \
             rotation { w: 0 } }",
        )
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.component(), Some("m"));
    }

    #[test]
    fn test_custom_rotation_epsilon() {
        let text = "id: \"e\" components { id: \"a\" component: \"/a.script\" rotation { w: 0.001 } }";
        let registry = SchemaRegistry::builtin();

        assert!(Deserializer::new(registry).deserialize(text).is_ok());
        assert!(Deserializer::new(registry).with_rotation_epsilon(0.01).deserialize(text).is_err());
    }

    #[test]
    fn test_load_file_uses_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raft.go");
        std::fs::write(&path, "components { id: \"script\" component: \"/raft.script\" }").unwrap();

        let descriptor = Deserializer::new(SchemaRegistry::builtin()).load_file(&path).unwrap();
        assert_eq!(descriptor.id, "raft");

        let missing = Deserializer::new(SchemaRegistry::builtin()).load_file(dir.path().join("nope.go"));
        assert_eq!(missing.unwrap_err().kind(), ErrorKind::Io);
    }
}
