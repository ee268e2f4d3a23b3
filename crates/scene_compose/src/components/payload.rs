//! Embedded payloads
//!
//! A payload is stored as text and parsed into a [`PayloadBlock`] tree
//! against its type's schema. String and resource leaves are the only
//! places placeholders are substituted.

use std::collections::HashMap;
use std::fmt;

use super::schema::{Cardinality, FieldKind, PayloadSchema};
use crate::error::ComponentError;
use crate::format::lexer::{escape, Lexer, Spanned, Token};
use crate::format::ParseError;
use crate::template::{self, Substitutions};

/// Raw payload text of an embedded component
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Payload(String);

impl Payload {
    /// Wrap payload text
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Raw text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Unwrap the text
    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether there is no text at all
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Substitute placeholders in the raw text
    pub fn resolve(&self, substitutions: &Substitutions) -> Result<Payload, template::TemplateError> {
        template::resolve(&self.0, substitutions).map(Payload)
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self(text)
    }
}

/// Value of one payload field
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadValue {
    /// String literal
    Str(String),
    /// Resource locator
    Resource(String),
    /// Floating point number
    Number(f32),
    /// Integer
    Integer(i64),
    /// Boolean
    Bool(bool),
    /// Enum identifier
    Enum(String),
    /// Nested block
    Block(PayloadBlock),
}

/// One `name: value` or `name { ... }` entry
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadField {
    /// Field name
    pub name: String,
    /// Field value
    pub value: PayloadValue,
    /// Field is declared repeated, so its path carries an index
    pub repeated: bool,
}

/// Parsed payload block, fields in source order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PayloadBlock {
    /// Fields in source order
    pub fields: Vec<PayloadField>,
}

impl PayloadBlock {
    /// First value of a field
    pub fn get(&self, name: &str) -> Option<&PayloadValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    /// All values of a (repeated) field in order
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a PayloadValue> + 'a {
        self.fields.iter().filter(move |f| f.name == name).map(|f| &f.value)
    }

    /// Text of a string or resource field
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            PayloadValue::Str(s) | PayloadValue::Resource(s) => Some(s),
            _ => None,
        }
    }

    /// Fields paired with their path, e.g. `materials[1].name`
    fn labelled<'a>(&'a self, prefix: &str) -> Vec<(String, &'a PayloadField)> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        self.fields
            .iter()
            .map(|field| {
                let path = if field.repeated {
                    let index = seen.entry(field.name.as_str()).or_insert(0);
                    let path = format!("{prefix}{}[{index}]", field.name);
                    *index += 1;
                    path
                } else {
                    format!("{prefix}{}", field.name)
                };
                (path, field)
            })
            .collect()
    }

    /// Copy of the tree with placeholders substituted in string and
    /// resource leaves
    pub fn resolve_templates(&self, substitutions: &Substitutions) -> Result<PayloadBlock, ComponentError> {
        self.resolve_at("", substitutions)
    }

    fn resolve_at(&self, prefix: &str, substitutions: &Substitutions) -> Result<PayloadBlock, ComponentError> {
        let mut fields = Vec::with_capacity(self.fields.len());
        for (path, field) in self.labelled(prefix) {
            let substitute = |text: &str| {
                template::resolve(text, substitutions).map_err(|source| ComponentError::UnresolvedPlaceholder {
                    field: path.clone(),
                    source,
                })
            };
            let value = match &field.value {
                PayloadValue::Str(s) => PayloadValue::Str(substitute(s)?),
                PayloadValue::Resource(s) => PayloadValue::Resource(substitute(s)?),
                PayloadValue::Block(block) => PayloadValue::Block(block.resolve_at(&format!("{path}."), substitutions)?),
                other => other.clone(),
            };
            fields.push(PayloadField {
                name: field.name.clone(),
                value,
                repeated: field.repeated,
            });
        }
        Ok(PayloadBlock { fields })
    }

    /// Resource locators in document order as `(field path, locator)`.
    /// Empty locators mean "unset" and are skipped.
    pub fn resources(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        self.collect_resources("", &mut out);
        out
    }

    fn collect_resources(&self, prefix: &str, out: &mut Vec<(String, String)>) {
        for (path, field) in self.labelled(prefix) {
            match &field.value {
                PayloadValue::Resource(locator) if !locator.is_empty() => out.push((path, locator.clone())),
                PayloadValue::Block(block) => block.collect_resources(&format!("{path}."), out),
                _ => {}
            }
        }
    }

    /// Render as payload text in the engine's layout
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out, 0);
        out
    }

    fn write_text(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        for field in &self.fields {
            out.push_str(&indent);
            out.push_str(&field.name);
            match &field.value {
                PayloadValue::Block(block) => {
                    out.push_str(" {\n");
                    block.write_text(out, depth + 1);
                    out.push_str(&indent);
                    out.push('}');
                }
                PayloadValue::Str(s) | PayloadValue::Resource(s) => {
                    out.push_str(&format!(": \"{}\"", escape(s)));
                }
                PayloadValue::Number(n) => out.push_str(&format!(": {n}")),
                PayloadValue::Integer(i) => out.push_str(&format!(": {i}")),
                PayloadValue::Bool(b) => out.push_str(&format!(": {b}")),
                PayloadValue::Enum(e) => out.push_str(&format!(": {e}")),
            }
            out.push('\n');
        }
    }
}

pub(crate) fn parse_payload(schema: &PayloadSchema, text: &str) -> Result<PayloadBlock, ComponentError> {
    let mut parser = PayloadParser::new(text).map_err(|e| malformed("", e))?;
    parser.block(schema, "", true)
}

fn malformed(path: &str, error: ParseError) -> ComponentError {
    let field = if path.is_empty() { "data" } else { path };
    ComponentError::schema(field, format!("malformed payload at {error}"))
}

struct PayloadParser<'a> {
    lexer: Lexer<'a>,
    current: Spanned,
}

impl<'a> PayloadParser<'a> {
    fn new(text: &'a str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(text);
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    fn advance(&mut self, path: &str) -> Result<Token, ComponentError> {
        let next = self.lexer.next_token().map_err(|e| malformed(path, e))?;
        Ok(std::mem::replace(&mut self.current, next).token)
    }

    fn unexpected(&self, path: &str, expected: &str) -> ComponentError {
        let field = if path.is_empty() { "data" } else { path };
        ComponentError::schema(
            field,
            format!(
                "expected {expected}, found {} at line {}, column {}",
                self.current.token, self.current.line, self.current.column
            ),
        )
    }

    fn block(&mut self, schema: &PayloadSchema, prefix: &str, top_level: bool) -> Result<PayloadBlock, ComponentError> {
        let mut block = PayloadBlock::default();
        let mut counts: HashMap<String, usize> = HashMap::new();

        loop {
            let name = match &self.current.token {
                Token::Eof if top_level => break,
                Token::RBrace if !top_level => {
                    self.advance(prefix)?;
                    break;
                }
                Token::Ident(name) => name.clone(),
                _ => {
                    let expected = if top_level { "field name" } else { "field name or '}'" };
                    return Err(self.unexpected(prefix, expected));
                }
            };

            let Some(spec) = schema.field(&name) else {
                return Err(ComponentError::schema(format!("{prefix}{name}"), "unknown field"));
            };

            let count = counts.entry(name.clone()).or_insert(0);
            let repeated = spec.cardinality == Cardinality::Repeated;
            if !repeated && *count > 0 {
                return Err(ComponentError::schema(format!("{prefix}{name}"), "field given more than once"));
            }
            let path = if repeated {
                format!("{prefix}{name}[{count}]")
            } else {
                format!("{prefix}{name}")
            };
            *count += 1;

            self.advance(&path)?;
            let value = self.value(&spec.kind, &path)?;
            block.fields.push(PayloadField { name, value, repeated });
        }

        for spec in schema.fields() {
            if spec.cardinality == Cardinality::Required && !counts.contains_key(&spec.name) {
                return Err(ComponentError::schema(
                    format!("{prefix}{}", spec.name),
                    "missing required field",
                ));
            }
        }

        Ok(block)
    }

    fn value(&mut self, kind: &FieldKind, path: &str) -> Result<PayloadValue, ComponentError> {
        if let FieldKind::Block(schema) = kind {
            if self.current.token == Token::Colon {
                self.advance(path)?;
            }
            if self.current.token != Token::LBrace {
                return Err(self.unexpected(path, "'{'"));
            }
            self.advance(path)?;
            return self.block(schema, &format!("{path}."), false).map(PayloadValue::Block);
        }

        if self.current.token != Token::Colon {
            return Err(self.unexpected(path, "':'"));
        }
        self.advance(path)?;

        let token = self.current.token.clone();
        let value = match (kind, &token) {
            (FieldKind::String | FieldKind::Resource, Token::Str(_)) => {
                let mut text = String::new();
                while let Token::Str(s) = &self.current.token {
                    text.push_str(s);
                    self.advance(path)?;
                }
                return Ok(if *kind == FieldKind::Resource {
                    PayloadValue::Resource(text)
                } else {
                    PayloadValue::Str(text)
                });
            }
            (FieldKind::Number, Token::Number(lexeme)) => match lexeme.parse::<f32>() {
                Ok(n) if n.is_finite() => PayloadValue::Number(n),
                _ => return Err(ComponentError::schema(path, format!("invalid number '{lexeme}'"))),
            },
            (FieldKind::Integer, Token::Number(lexeme)) => match lexeme.parse::<i64>() {
                Ok(i) => PayloadValue::Integer(i),
                Err(_) => return Err(ComponentError::schema(path, format!("invalid integer '{lexeme}'"))),
            },
            (FieldKind::Bool, Token::Ident(word)) => match word.as_str() {
                "true" => PayloadValue::Bool(true),
                "false" => PayloadValue::Bool(false),
                _ => return Err(ComponentError::schema(path, format!("invalid boolean '{word}'"))),
            },
            (FieldKind::Enum(allowed), Token::Ident(word)) => {
                if !allowed.iter().any(|a| a == word) {
                    return Err(ComponentError::schema(path, format!("invalid value '{word}'")));
                }
                PayloadValue::Enum(word.clone())
            }
            _ => return Err(self.unexpected(path, kind.describe())),
        };

        self.advance(path)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::schema::{ComponentType, SchemaRegistry};

    const MODEL: &str = "mesh: \"/assets/models/ship_dark.glb\"\n\
        name: \"{{NAME}}\"\n\
        materials {\n\
          name: \"colormap\"\n\
          material: \"/builtins/materials/model.material\"\n\
          textures {\n\
            sampler: \"tex0\"\n\
            texture: \"/assets/models/Textures/colormap.png\"\n\
          }\n\
        }\n\
        skeleton: \"\"\n\
        animations: \"\"\n\
        default_animation: \"\"\n\
        create_go_bones: false\n";

    fn model(text: &str) -> Result<PayloadBlock, ComponentError> {
        SchemaRegistry::builtin().validate(&ComponentType::Model, text)
    }

    fn subs(pairs: &[(&str, &str)]) -> Substitutions {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_parses_model_payload() {
        let block = model(MODEL).unwrap();

        assert_eq!(block.get_str("mesh"), Some("/assets/models/ship_dark.glb"));
        assert_eq!(block.get_str("name"), Some("{{NAME}}"));
        assert_eq!(block.get("create_go_bones"), Some(&PayloadValue::Bool(false)));
        assert_eq!(block.get_all("materials").count(), 1);
    }

    #[test]
    fn test_lookup_outlives_field_name() {
        let block = model(MODEL).unwrap();

        let (value, mesh) = {
            let key = String::from("create_go_bones");
            let mesh_key = format!("{}h", "mes");
            (block.get(&key), block.get_str(&mesh_key))
        };

        assert_eq!(value, Some(&PayloadValue::Bool(false)));
        assert_eq!(mesh, Some("/assets/models/ship_dark.glb"));
    }

    #[test]
    fn test_resources_in_document_order_with_paths() {
        let block = model(MODEL).unwrap();

        assert_eq!(
            block.resources(),
            vec![
                ("mesh".to_string(), "/assets/models/ship_dark.glb".to_string()),
                (
                    "materials[0].material".to_string(),
                    "/builtins/materials/model.material".to_string()
                ),
                (
                    "materials[0].textures[0].texture".to_string(),
                    "/assets/models/Textures/colormap.png".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_resolve_templates_substitutes_strings() {
        let resolved = model(MODEL).unwrap().resolve_templates(&subs(&[("NAME", "Boat1")])).unwrap();
        assert_eq!(resolved.get_str("name"), Some("Boat1"));
    }

    #[test]
    fn test_resolve_templates_reports_field() {
        let err = model(MODEL).unwrap().resolve_templates(&Substitutions::new()).unwrap_err();

        match err {
            ComponentError::UnresolvedPlaceholder { field, source } => {
                assert_eq!(field, "name");
                assert_eq!(source.token(), Some("NAME"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_nested_error_path_is_indexed() {
        let text = "mesh: \"/m.glb\"\n\
            materials { name: \"a\" material: \"/a.material\" }\n\
            materials { name: \"b\" material: \"/b.material\" textures { sampler: \"tex0\" texture: 12 } }\n";

        match model(text).unwrap_err() {
            ComponentError::Schema { field, .. } => assert_eq!(field, "materials[1].textures[0].texture"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_unknown_and_missing_fields() {
        let unknown = model("mesh: \"/m.glb\" colour: \"red\"").unwrap_err();
        assert!(matches!(unknown, ComponentError::Schema { ref field, .. } if field == "colour"));

        let missing = model("name: \"x\"").unwrap_err();
        assert!(matches!(missing, ComponentError::Schema { ref field, .. } if field == "mesh"));

        let duplicate = model("mesh: \"/a.glb\" mesh: \"/b.glb\"").unwrap_err();
        assert!(matches!(duplicate, ComponentError::Schema { ref field, .. } if field == "mesh"));
    }

    #[test]
    fn test_enum_and_number_fields() {
        let registry = SchemaRegistry::builtin();
        let block = registry
            .validate(
                &ComponentType::CollisionObject,
                "type: COLLISION_OBJECT_TYPE_KINEMATIC\nmass: 2.5\nmask: \"enemy\"\nmask: \"rock\"",
            )
            .unwrap();

        assert_eq!(block.get("type"), Some(&PayloadValue::Enum("COLLISION_OBJECT_TYPE_KINEMATIC".into())));
        assert_eq!(block.get("mass"), Some(&PayloadValue::Number(2.5)));
        assert_eq!(block.get_all("mask").count(), 2);

        assert!(registry
            .validate(&ComponentType::CollisionObject, "type: COLLISION_OBJECT_TYPE_WOBBLY")
            .is_err());
        assert!(registry
            .validate(&ComponentType::CollisionObject, "type: COLLISION_OBJECT_TYPE_STATIC mass: \"{{M}}\"")
            .is_err());
    }

    #[test]
    fn test_unbalanced_payload() {
        let err = model("mesh: \"/m.glb\" materials { name: \"a\" material: \"/a\"").unwrap_err();
        assert!(matches!(err, ComponentError::Schema { .. }));

        let err = model("mesh: \"/m.glb\" }").unwrap_err();
        assert!(matches!(err, ComponentError::Schema { .. }));
    }

    #[test]
    fn test_to_text_reads_back() {
        let block = model(MODEL).unwrap();
        assert_eq!(model(&block.to_text()).unwrap(), block);
    }

    #[test]
    fn test_empty_resource_is_unset() {
        let block = model("mesh: \"/m.glb\" skeleton: \"\"").unwrap();
        assert_eq!(block.resources().len(), 1);
    }
}
