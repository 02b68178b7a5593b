//! Type shape to Cap'n Proto type expression.

use crate::ir::TypeShape;
use crate::naming;

/// Go predeclared types with a fixed Cap'n Proto scalar.
///
/// `error` travels as its message text.
pub const PRIMITIVES: &[(&str, &str)] = &[
    ("int", "Int32"),
    ("int32", "Int32"),
    ("rune", "Int32"),
    ("int64", "Int64"),
    ("int8", "Int8"),
    ("int16", "Int16"),
    ("uint", "UInt32"),
    ("uint32", "UInt32"),
    ("uint8", "UInt8"),
    ("byte", "UInt8"),
    ("uint16", "UInt16"),
    ("uint64", "UInt64"),
    ("float32", "Float32"),
    ("float64", "Float64"),
    ("string", "Text"),
    ("bool", "Bool"),
    ("error", "Text"),
];

/// Scalar name for a predeclared Go type, if it has one.
pub fn scalar_for(go_name: &str) -> Option<&'static str> {
    PRIMITIVES
        .iter()
        .find(|(go, _)| *go == go_name)
        .map(|(_, capnp)| *capnp)
}

/// Render a type shape as a Cap'n Proto type expression.
pub fn capnp_type(shape: &TypeShape) -> String {
    match shape {
        TypeShape::Primitive(name) => scalar_for(name)
            .map(str::to_string)
            .unwrap_or_else(|| name.clone()),
        TypeShape::Slice(element) => format!("List({})", capnp_type(element)),
        TypeShape::Pointer(target) => capnp_type(target),
        TypeShape::Named(name) => name.clone(),
        qualified @ TypeShape::Qualified { .. } => {
            naming::flatten(&qualified.to_string()).to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slice(inner: TypeShape) -> TypeShape {
        TypeShape::Slice(Box::new(inner))
    }

    #[test]
    fn test_every_primitive_has_scalar() {
        for (go, capnp) in PRIMITIVES {
            assert_eq!(capnp_type(&TypeShape::ident(go)), *capnp);
            let first = capnp.chars().next().unwrap();
            assert!(first.is_ascii_uppercase(), "{capnp} is not capitalised");
        }
    }

    #[test]
    fn test_slices() {
        assert_eq!(capnp_type(&slice(TypeShape::ident("string"))), "List(Text)");
        assert_eq!(
            capnp_type(&slice(slice(TypeShape::ident("int")))),
            "List(List(Int32))"
        );
        assert_eq!(
            capnp_type(&slice(TypeShape::ident("Item"))),
            "List(Item)"
        );
    }

    #[test]
    fn test_named_and_qualified() {
        assert_eq!(capnp_type(&TypeShape::ident("SimpleStruct")), "SimpleStruct");
        assert_eq!(
            capnp_type(&TypeShape::qualified(
                "github.com/acme/mypkg",
                "ImportedStruct"
            )),
            "ImportedStruct"
        );
    }

    #[test]
    fn test_pointer_renders_target() {
        let shape = TypeShape::Pointer(Box::new(TypeShape::ident("int64")));
        assert_eq!(capnp_type(&shape), "Int64");
    }

    #[test]
    fn test_unmapped_primitive_verbatim() {
        assert_eq!(capnp_type(&TypeShape::ident("complex128")), "complex128");
        assert!(scalar_for("uintptr").is_none());
    }
}
