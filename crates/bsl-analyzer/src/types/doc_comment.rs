//! Parser for structured doc-comment annotations ("strict types").
//!
//! The accepted grammar is the conventional comment layout:
//!
//! ```text
//! // Does the thing.
//! //
//! // Parameters:
//! //  Amount - Number - value to post
//! //  Target - CatalogRef.Products, Undefined - receiver
//! //  Options - Structure:
//! //   * Currency - String - ISO code
//! //
//! // Returns:
//! //  Boolean - True when posted
//! ```
//!
//! Missing sections are not an error: anything unannotated is `Unknown`.
//! A line that attempts a declaration but cannot be parsed degrades the
//! affected entry to `Unknown` and is recorded as malformed; the
//! `doc-comment-format` rule surfaces those records. Parsing never fails.

use std::collections::HashMap;

use crate::ast::DocComment;

use super::model::Type;

/// Parsed annotation for one method declaration. Produced once per
/// declaration during the type pass and cached in `TypeInfo`.
#[derive(Debug, Clone, Default)]
pub struct MethodAnnotation {
    /// Declared parameter types by parameter name.
    pub params: HashMap<String, Type>,
    /// Declared return type, when a `Returns:` section is present.
    pub returns: Option<Type>,
    /// Lines that attempted a declaration but did not parse.
    pub malformed: Vec<MalformedLine>,
}

impl MethodAnnotation {
    /// Declared type of `param`, defaulting to `Unknown`.
    pub fn param_type(&self, param: &str) -> Type {
        self.params.get(param).cloned().unwrap_or(Type::Unknown)
    }

    pub fn return_type(&self) -> Type {
        self.returns.clone().unwrap_or(Type::Unknown)
    }
}

/// A doc-comment line that failed to parse as a declaration.
#[derive(Debug, Clone)]
pub struct MalformedLine {
    /// Offset of the line within the doc-comment block.
    pub line_offset: usize,
    pub text: String,
}

#[derive(PartialEq)]
enum Section {
    Prose,
    Parameters,
    Returns,
}

/// Parse a doc-comment block into a method annotation.
pub fn parse(doc: &DocComment) -> MethodAnnotation {
    let mut annotation = MethodAnnotation::default();
    let mut section = Section::Prose;

    for (offset, raw) in doc.lines.iter().enumerate() {
        let line = raw.trim();
        match line {
            "Parameters:" => {
                section = Section::Parameters;
                continue;
            }
            "Returns:" => {
                section = Section::Returns;
                continue;
            }
            // Any other section header ends type-bearing content.
            _ if line.ends_with(':') && !line.contains(' ') && !line.starts_with('*') => {
                section = Section::Prose;
                continue;
            }
            "" => continue,
            _ => {}
        }

        match section {
            Section::Prose => {}
            Section::Parameters => parse_parameter_line(line, offset, &mut annotation),
            Section::Returns => parse_returns_line(line, offset, &mut annotation),
        }
    }

    annotation
}

fn parse_parameter_line(line: &str, offset: usize, annotation: &mut MethodAnnotation) {
    if let Some(field) = line.strip_prefix('*') {
        // Nested field of a structure/collection parameter. Field-level
        // types do not take part in call-site intersection; the line is
        // only validated for shape.
        if !is_field_decl(field) {
            annotation.malformed.push(MalformedLine {
                line_offset: offset,
                text: line.to_string(),
            });
        }
        return;
    }

    let Some((name, rest)) = line.split_once(" - ") else {
        // Description continuation, tolerated.
        return;
    };
    let name = name.trim();
    if name.is_empty() || name.contains(' ') {
        annotation.malformed.push(MalformedLine {
            line_offset: offset,
            text: line.to_string(),
        });
        return;
    }

    // `Types - description`; the description itself may contain dashes,
    // so only the first segment is the type list.
    let type_list = rest.split(" - ").next().unwrap_or(rest);
    let type_list = type_list.strip_suffix(':').unwrap_or(type_list);
    match parse_type_list(type_list) {
        Some(ty) => {
            annotation.params.insert(name.to_string(), ty);
        }
        None => {
            annotation.params.insert(name.to_string(), Type::Unknown);
            annotation.malformed.push(MalformedLine {
                line_offset: offset,
                text: line.to_string(),
            });
        }
    }
}

fn parse_returns_line(line: &str, offset: usize, annotation: &mut MethodAnnotation) {
    if line.starts_with('*') {
        if !is_field_decl(&line[1..]) {
            annotation.malformed.push(MalformedLine {
                line_offset: offset,
                text: line.to_string(),
            });
        }
        return;
    }
    if annotation.returns.is_some() {
        // Description continuation after the type line.
        return;
    }
    let type_list = line.split(" - ").next().unwrap_or(line);
    let type_list = type_list.strip_suffix(':').unwrap_or(type_list);
    match parse_type_list(type_list) {
        Some(ty) => annotation.returns = Some(ty),
        None => {
            annotation.returns = Some(Type::Unknown);
            annotation.malformed.push(MalformedLine {
                line_offset: offset,
                text: line.to_string(),
            });
        }
    }
}

/// Parse a comma-separated list of type names into a (possibly union) type.
fn parse_type_list(text: &str) -> Option<Type> {
    let mut members = Vec::new();
    for piece in text.split(',') {
        members.push(Type::parse_name(piece)?);
    }
    Some(Type::union(members))
}

fn is_field_decl(text: &str) -> bool {
    match text.trim().split_once(" - ") {
        Some((name, _)) => !name.trim().is_empty() && !name.trim().contains(' '),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::doc_comment;
    use crate::types::model::Primitive;

    #[test]
    fn parses_params_and_returns() {
        let doc = doc_comment(&[
            " Posts the document.",
            "",
            " Parameters:",
            "  Amount - Number - value to post",
            "  Target - CatalogRef.Products, Undefined - receiver",
            "",
            " Returns:",
            "  Boolean - True when posted",
        ]);
        let ann = parse(&doc);
        assert_eq!(ann.param_type("Amount"), Type::Primitive(Primitive::Number));
        assert_eq!(
            ann.param_type("Target"),
            Type::union([
                Type::reference("CatalogRef", "Products"),
                Type::Primitive(Primitive::Undefined),
            ])
        );
        assert_eq!(ann.returns, Some(Type::Primitive(Primitive::Boolean)));
        assert!(ann.malformed.is_empty());
    }

    #[test]
    fn missing_sections_are_unknown_not_errors() {
        let doc = doc_comment(&[" Just a description."]);
        let ann = parse(&doc);
        assert!(ann.params.is_empty());
        assert!(ann.returns.is_none());
        assert!(ann.malformed.is_empty());
        assert_eq!(ann.param_type("Anything"), Type::Unknown);
    }

    #[test]
    fn nested_fields_are_tolerated() {
        let doc = doc_comment(&[
            " Parameters:",
            "  Options - Structure:",
            "   * Currency - String - ISO code",
            "   * Rate - Number - conversion rate",
        ]);
        let ann = parse(&doc);
        assert_eq!(ann.param_type("Options"), Type::collection("Structure"));
        assert!(ann.malformed.is_empty());
    }

    #[test]
    fn malformed_type_degrades_to_unknown_and_is_recorded() {
        let doc = doc_comment(&[
            " Parameters:",
            "  Amount - !!not-a-type!! - broken",
        ]);
        let ann = parse(&doc);
        assert_eq!(ann.param_type("Amount"), Type::Unknown);
        assert_eq!(ann.malformed.len(), 1);
        assert_eq!(ann.malformed[0].line_offset, 1);
    }

    #[test]
    fn malformed_nested_field_is_recorded() {
        let doc = doc_comment(&[
            " Parameters:",
            "  Options - Structure:",
            "   * no dash here",
        ]);
        let ann = parse(&doc);
        assert_eq!(ann.malformed.len(), 1);
    }

    #[test]
    fn description_continuations_are_tolerated() {
        let doc = doc_comment(&[
            " Parameters:",
            "  Amount - Number - value to post,",
            "   spread over several lines of prose.",
        ]);
        let ann = parse(&doc);
        assert_eq!(ann.param_type("Amount"), Type::Primitive(Primitive::Number));
        assert!(ann.malformed.is_empty());
    }

    #[test]
    fn other_sections_end_type_content() {
        let doc = doc_comment(&[
            " Parameters:",
            "  Amount - Number",
            " Example:",
            "  Post(10) - typical usage",
        ]);
        let ann = parse(&doc);
        assert_eq!(ann.params.len(), 1);
        assert!(ann.malformed.is_empty());
    }

    #[test]
    fn union_return_type() {
        let doc = doc_comment(&[" Returns:", "  String, Number - code or index"]);
        let ann = parse(&doc);
        assert_eq!(
            ann.returns,
            Some(Type::union([
                Type::Primitive(Primitive::String),
                Type::Primitive(Primitive::Number),
            ]))
        );
    }
}
