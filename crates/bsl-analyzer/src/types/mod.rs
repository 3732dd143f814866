pub mod doc_comment;
pub mod infer;
pub mod model;

pub use doc_comment::{MalformedLine, MethodAnnotation};
pub use infer::{infer_module, TypeInfo};
pub use model::{Primitive, Type};
