// obfmap_classfile - class file reading, rewriting and assembly

mod builder;
mod class;
mod error;
mod hierarchy;
mod pool;
mod reader;
mod rewrite;
mod structure;

pub use builder::ClassFileBuilder;
pub use class::{AttributeInfo, ClassFile, MemberInfo, MemberReference, ReferenceKind};
pub use error::ClassParseError;
pub use hierarchy::ClassHierarchy;
pub use pool::{Constant, ConstantPool};
pub use rewrite::{rewrite_class, rewrite_class_with};
pub use structure::{
    parse_class, ClassStructure, DynamicCallSite, FieldDecl, MethodDecl, ACC_ABSTRACT, ACC_FINAL,
    ACC_INTERFACE, ACC_PRIVATE, ACC_PUBLIC, ACC_STATIC, ACC_SUPER, ACC_SYNTHETIC,
    CONSTRUCTOR_NAME, STATIC_INITIALIZER_NAME,
};
