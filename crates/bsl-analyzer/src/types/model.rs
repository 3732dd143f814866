/// Internal type representation for semantic analysis ("strict types").
///
/// Types come from doc-comment annotations and structural inference.
/// `Unknown` is the bottom element: it intersects with everything, so
/// missing annotations can never produce a false positive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Type {
    Primitive(Primitive),
    /// A configuration object reference, e.g. `CatalogRef.Products`.
    Ref { class: String, name: String },
    /// A platform collection (`Array`, `Structure`, `Map`, ...). The
    /// element type is `Unknown` unless the annotation narrows it.
    Collection { kind: String, element: Box<Type> },
    /// A union of alternatives. Invariant: flattened, sorted, deduplicated,
    /// and holding at least two members. Construct via `Type::union`.
    Union(Vec<Type>),
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Primitive {
    Boolean,
    Date,
    Number,
    String,
    Undefined,
    Null,
}

/// Collection kinds recognized structurally (from `New X` and annotations).
const COLLECTION_KINDS: &[&str] = &[
    "Array",
    "Structure",
    "Map",
    "FixedArray",
    "FixedStructure",
    "FixedMap",
    "ValueList",
    "ValueTable",
    "ValueTree",
];

impl Type {
    pub fn primitive(p: Primitive) -> Type {
        Type::Primitive(p)
    }

    pub fn reference(class: impl Into<String>, name: impl Into<String>) -> Type {
        Type::Ref {
            class: class.into(),
            name: name.into(),
        }
    }

    pub fn collection(kind: impl Into<String>) -> Type {
        Type::Collection {
            kind: kind.into(),
            element: Box::new(Type::Unknown),
        }
    }

    pub fn collection_of(kind: impl Into<String>, element: Type) -> Type {
        Type::Collection {
            kind: kind.into(),
            element: Box::new(element),
        }
    }

    /// Build a union from alternatives, flattening nested unions,
    /// deduplicating, and collapsing trivial cases. Idempotent:
    /// `union(union(ts)) == union(ts)`.
    pub fn union(types: impl IntoIterator<Item = Type>) -> Type {
        let mut members = Vec::new();
        for ty in types {
            match ty {
                Type::Union(inner) => members.extend(inner),
                other => members.push(other),
            }
        }
        // A union containing Unknown is Unknown: the bottom element
        // already intersects with everything.
        if members.iter().any(|t| *t == Type::Unknown) {
            return Type::Unknown;
        }
        members.sort();
        members.dedup();
        match members.len() {
            0 => Type::Unknown,
            1 => members.pop().unwrap(),
            _ => Type::Union(members),
        }
    }

    /// Non-empty set intersection between two types. Symmetric and
    /// reflexive; `Unknown` intersects with anything.
    pub fn intersects(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Unknown, _) | (_, Type::Unknown) => true,
            (Type::Union(members), other) => members.iter().any(|t| t.intersects(other)),
            (this, Type::Union(members)) => members.iter().any(|t| this.intersects(t)),
            (Type::Primitive(a), Type::Primitive(b)) => a == b,
            // Reference types intersect only on exact (class, name) match.
            (
                Type::Ref { class: c1, name: n1 },
                Type::Ref { class: c2, name: n2 },
            ) => c1 == c2 && n1 == n2,
            (
                Type::Collection {
                    kind: k1,
                    element: e1,
                },
                Type::Collection {
                    kind: k2,
                    element: e2,
                },
            ) => k1 == k2 && e1.intersects(e2),
            _ => false,
        }
    }

    /// Structural type of a `New X` constructor expression.
    pub fn from_constructor(type_name: &str) -> Type {
        if COLLECTION_KINDS.contains(&type_name) {
            Type::collection(type_name)
        } else {
            Type::Unknown
        }
    }

    /// Parse a single type name from an annotation, e.g. `String`,
    /// `CatalogRef.Products`, `Array of Number`. Returns `None` for text
    /// that does not form a type name (the caller records it as malformed).
    pub fn parse_name(text: &str) -> Option<Type> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if let Some(element) = text.strip_prefix("Array of ") {
            return Type::parse_name(element)
                .map(|e| Type::collection_of("Array", e));
        }
        match text {
            "Boolean" => return Some(Type::Primitive(Primitive::Boolean)),
            "Date" => return Some(Type::Primitive(Primitive::Date)),
            "Number" => return Some(Type::Primitive(Primitive::Number)),
            "String" => return Some(Type::Primitive(Primitive::String)),
            "Undefined" => return Some(Type::Primitive(Primitive::Undefined)),
            "Null" => return Some(Type::Primitive(Primitive::Null)),
            // `Arbitrary` is the annotation spelling of "anything".
            "Arbitrary" => return Some(Type::Unknown),
            _ => {}
        }
        if COLLECTION_KINDS.contains(&text) {
            return Some(Type::collection(text));
        }
        if let Some((class, name)) = text.split_once('.') {
            if is_identifier(class) && is_identifier(name) {
                return Some(Type::reference(class, name));
            }
            return None;
        }
        if is_identifier(text) {
            // A bare name we cannot classify (platform type, undocumented
            // alias). Degrade to Unknown rather than guessing.
            return Some(Type::Unknown);
        }
        None
    }

    /// Human-readable name for messages.
    pub fn display_name(&self) -> String {
        match self {
            Type::Primitive(Primitive::Boolean) => "Boolean".into(),
            Type::Primitive(Primitive::Date) => "Date".into(),
            Type::Primitive(Primitive::Number) => "Number".into(),
            Type::Primitive(Primitive::String) => "String".into(),
            Type::Primitive(Primitive::Undefined) => "Undefined".into(),
            Type::Primitive(Primitive::Null) => "Null".into(),
            Type::Ref { class, name } => format!("{}.{}", class, name),
            Type::Collection { kind, element } => {
                if **element == Type::Unknown {
                    kind.clone()
                } else {
                    format!("{} of {}", kind, element.display_name())
                }
            }
            Type::Union(members) => {
                let names: Vec<_> = members.iter().map(|t| t.display_name()).collect();
                names.join(", ")
            }
            Type::Unknown => "Unknown".into(),
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}
