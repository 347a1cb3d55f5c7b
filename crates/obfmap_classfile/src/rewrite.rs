//! Applies a mapping table to the binary form of a class.
//!
//! Utf8 and NameAndType entries are never modified in place because several
//! other entries (and bytecode operands) may share them. Renamed strings are
//! appended as new entries and only Class, member reference, MethodType and
//! InvokeDynamic entries are repointed, so every index the bytecode holds
//! stays valid.

use crate::class::{read_attributes, write_attributes, AttributeInfo, ClassFile, ReferenceKind};
use crate::error::ClassParseError;
use crate::hierarchy::ClassHierarchy;
use crate::pool::{Constant, ConstantPool, PoolInterner};
use crate::reader::{ClassReader, ClassWrite};
use crate::structure::read_inner_classes;
use obfmap_map::{MappingTable, Symbol};
use std::collections::HashMap;

/// Debug information the rewriter strips, since it would leak original names.
const DEBUG_ATTRIBUTES: [&str; 5] = [
    "SourceFile",
    "SourceDebugExtension",
    "LineNumberTable",
    "LocalVariableTable",
    "LocalVariableTypeTable",
];

/// Rewrites one class file, replacing every type, field, method and dynamic
/// call reference with its mapped name. Unmapped symbols keep their names.
pub fn rewrite_class(bytes: &[u8], table: &MappingTable) -> Result<Vec<u8>, ClassParseError> {
    rewrite_class_with(bytes, table, &ClassHierarchy::new())
}

/// Like [`rewrite_class`], but a field or method reference that is unmapped
/// under its named owner takes the mapping of the nearest supertype in
/// `hierarchy` that has one.
pub fn rewrite_class_with(
    bytes: &[u8],
    table: &MappingTable,
    hierarchy: &ClassHierarchy,
) -> Result<Vec<u8>, ClassParseError> {
    let mut class = ClassFile::parse(bytes)?;
    let this_name = class.name()?.to_string();
    tracing::trace!(class = %this_name, "rewriting class file");

    let mut interner = PoolInterner::new(&class.pool);
    let original: Vec<(u16, Constant)> = class
        .pool
        .iter()
        .map(|(index, entry)| (index, entry.clone()))
        .collect();

    let mut class_names = HashMap::new();
    for (index, entry) in &original {
        if let Constant::Class { name_index } = entry {
            class_names.insert(*index, class.pool.utf8(*name_index)?.to_string());
        }
    }

    let rewriter = Rewriter {
        table,
        hierarchy,
        this_name,
        class_names,
    };

    let pool = &mut class.pool;
    for (index, entry) in original {
        let replacement = match entry {
            Constant::Class { .. } => rewriter.class_entry(pool, &mut interner, index)?,
            Constant::FieldRef {
                class_index,
                name_and_type_index,
            } => Some(Constant::FieldRef {
                class_index,
                name_and_type_index: rewriter.member_reference(
                    pool,
                    &mut interner,
                    ReferenceKind::Field,
                    class_index,
                    name_and_type_index,
                )?,
            }),
            Constant::MethodRef {
                class_index,
                name_and_type_index,
            } => Some(Constant::MethodRef {
                class_index,
                name_and_type_index: rewriter.member_reference(
                    pool,
                    &mut interner,
                    ReferenceKind::Method,
                    class_index,
                    name_and_type_index,
                )?,
            }),
            Constant::InterfaceMethodRef {
                class_index,
                name_and_type_index,
            } => Some(Constant::InterfaceMethodRef {
                class_index,
                name_and_type_index: rewriter.member_reference(
                    pool,
                    &mut interner,
                    ReferenceKind::InterfaceMethod,
                    class_index,
                    name_and_type_index,
                )?,
            }),
            Constant::InvokeDynamic {
                bootstrap_method_attr_index,
                name_and_type_index,
            } => Some(Constant::InvokeDynamic {
                bootstrap_method_attr_index,
                name_and_type_index: rewriter.dynamic_call(
                    pool,
                    &mut interner,
                    name_and_type_index,
                    true,
                )?,
            }),
            Constant::Dynamic {
                bootstrap_method_attr_index,
                name_and_type_index,
            } => Some(Constant::Dynamic {
                bootstrap_method_attr_index,
                name_and_type_index: rewriter.dynamic_call(
                    pool,
                    &mut interner,
                    name_and_type_index,
                    false,
                )?,
            }),
            Constant::MethodType { descriptor_index } => Some(Constant::MethodType {
                descriptor_index: rewriter.descriptor(pool, &mut interner, descriptor_index)?,
            }),
            _ => None,
        };
        if let Some(replacement) = replacement {
            *pool.get_mut(index)? = replacement;
        }
    }

    for field in &mut class.fields {
        let name = pool.utf8(field.name_index)?.to_string();
        let descriptor = pool.utf8(field.descriptor_index)?.to_string();
        let mapped = table
            .map_field_name(&rewriter.this_name, &name, &descriptor)
            .to_string();
        field.name_index = interner.utf8(pool, &mapped)?;
        field.descriptor_index = rewriter.descriptor(pool, &mut interner, field.descriptor_index)?;
        rewriter.attributes(pool, &mut interner, &mut field.attributes)?;
    }

    for method in &mut class.methods {
        let name = pool.utf8(method.name_index)?.to_string();
        let descriptor = pool.utf8(method.descriptor_index)?.to_string();
        let mapped = table
            .map_method_name(&rewriter.this_name, &name, &descriptor)
            .to_string();
        method.name_index = interner.utf8(pool, &mapped)?;
        method.descriptor_index =
            rewriter.descriptor(pool, &mut interner, method.descriptor_index)?;
        rewriter.attributes(pool, &mut interner, &mut method.attributes)?;
    }

    rewriter.attributes(pool, &mut interner, &mut class.attributes)?;

    class.to_bytes()
}

struct Rewriter<'t> {
    table: &'t MappingTable,
    hierarchy: &'t ClassHierarchy,
    this_name: String,
    /// Class entry index to the name it had before rewriting.
    class_names: HashMap<u16, String>,
}

impl Rewriter<'_> {
    fn original_class(&self, index: u16) -> Result<&str, ClassParseError> {
        self.class_names
            .get(&index)
            .map(String::as_str)
            .ok_or(ClassParseError::InvalidConstantIndex { index })
    }

    fn class_entry(
        &self,
        pool: &mut ConstantPool,
        interner: &mut PoolInterner,
        index: u16,
    ) -> Result<Option<Constant>, ClassParseError> {
        let name = self.original_class(index)?;
        let mapped = self.table.map_class_reference(name);
        if mapped == name {
            return Ok(None);
        }
        let name_index = interner.utf8(pool, &mapped)?;
        Ok(Some(Constant::Class { name_index }))
    }

    fn member_reference(
        &self,
        pool: &mut ConstantPool,
        interner: &mut PoolInterner,
        kind: ReferenceKind,
        class_index: u16,
        name_and_type_index: u16,
    ) -> Result<u16, ClassParseError> {
        let owner = self.original_class(class_index)?;
        let (name, descriptor) = pool.name_and_type(name_and_type_index)?;
        let symbol = |class: &str| match kind {
            ReferenceKind::Field => Symbol::field(class, name, descriptor),
            ReferenceKind::Method | ReferenceKind::InterfaceMethod => {
                Symbol::method(class, name, descriptor)
            }
        };
        let mapped_name = self
            .hierarchy
            .lineage(owner)
            .into_iter()
            .find_map(|class| self.table.lookup(&symbol(class)))
            .map_or(name, Symbol::name)
            .to_string();
        if mapped_name != name {
            tracing::trace!(owner, name, mapped = %mapped_name, "resolved member reference");
        }
        let mapped_descriptor = self.table.map_descriptor(descriptor);
        if mapped_name == name && mapped_descriptor == descriptor {
            return Ok(name_and_type_index);
        }
        interner.name_and_type(pool, &mapped_name, &mapped_descriptor)
    }

    /// Invokedynamic targets are renamed by (name, descriptor); condy entries
    /// only get their descriptor remapped.
    fn dynamic_call(
        &self,
        pool: &mut ConstantPool,
        interner: &mut PoolInterner,
        name_and_type_index: u16,
        rename: bool,
    ) -> Result<u16, ClassParseError> {
        let (name, descriptor) = pool.name_and_type(name_and_type_index)?;
        let mapped_name = if rename {
            self.table.map_dynamic_call_name(name, descriptor)
        } else {
            name
        }
        .to_string();
        let mapped_descriptor = self.table.map_descriptor(descriptor);
        if mapped_name == name && mapped_descriptor == descriptor {
            return Ok(name_and_type_index);
        }
        interner.name_and_type(pool, &mapped_name, &mapped_descriptor)
    }

    fn descriptor(
        &self,
        pool: &mut ConstantPool,
        interner: &mut PoolInterner,
        index: u16,
    ) -> Result<u16, ClassParseError> {
        let descriptor = pool.utf8(index)?;
        let mapped = self.table.map_descriptor(descriptor);
        if mapped == descriptor {
            return Ok(index);
        }
        interner.utf8(pool, &mapped)
    }

    fn attributes(
        &self,
        pool: &mut ConstantPool,
        interner: &mut PoolInterner,
        attributes: &mut Vec<AttributeInfo>,
    ) -> Result<(), ClassParseError> {
        let mut kept = Vec::with_capacity(attributes.len());
        for mut attribute in attributes.drain(..) {
            let name = pool.utf8(attribute.name_index)?.to_string();
            if DEBUG_ATTRIBUTES.contains(&name.as_str()) {
                continue;
            }
            match name.as_str() {
                "Signature" => attribute.data = self.signature(pool, interner, &attribute.data)?,
                "Code" => attribute.data = self.code(pool, interner, &attribute.data)?,
                "InnerClasses" => {
                    attribute.data = self.inner_classes(pool, interner, &attribute.data)?
                }
                "EnclosingMethod" => {
                    attribute.data = self.enclosing_method(pool, interner, &attribute.data)?
                }
                _ => {}
            }
            kept.push(attribute);
        }
        *attributes = kept;
        Ok(())
    }

    fn signature(
        &self,
        pool: &mut ConstantPool,
        interner: &mut PoolInterner,
        data: &[u8],
    ) -> Result<Vec<u8>, ClassParseError> {
        let mut reader = ClassReader::new(data);
        let index = reader.read_u2()?;
        if !reader.is_empty() {
            return Err(invalid("Signature"));
        }
        let mut out = Vec::with_capacity(2);
        out.put_u2(self.descriptor(pool, interner, index)?);
        Ok(out)
    }

    /// Rewrites the attributes nested in a Code attribute; the bytecode is
    /// copied untouched.
    fn code(
        &self,
        pool: &mut ConstantPool,
        interner: &mut PoolInterner,
        data: &[u8],
    ) -> Result<Vec<u8>, ClassParseError> {
        let mut reader = ClassReader::new(data);
        let max_stack = reader.read_u2()?;
        let max_locals = reader.read_u2()?;
        let code_length = reader.read_u4()? as usize;
        let code = reader.read_slice(code_length)?;
        let exception_table_length = reader.read_u2()?;
        let exception_table = reader.read_slice(exception_table_length as usize * 8)?;
        let mut attributes = read_attributes(&mut reader)?;
        if !reader.is_empty() {
            return Err(invalid("Code"));
        }

        self.attributes(pool, interner, &mut attributes)?;

        let mut out = Vec::with_capacity(data.len());
        out.put_u2(max_stack);
        out.put_u2(max_locals);
        out.put_u4(code.len() as u32);
        out.extend_from_slice(code);
        out.put_u2(exception_table_length);
        out.extend_from_slice(exception_table);
        write_attributes(&mut out, &attributes);
        Ok(out)
    }

    /// Simple names follow the mapped type name: everything after its last
    /// package or nesting separator.
    fn inner_classes(
        &self,
        pool: &mut ConstantPool,
        interner: &mut PoolInterner,
        data: &[u8],
    ) -> Result<Vec<u8>, ClassParseError> {
        let mut entries = read_inner_classes(data)?;
        for entry in &mut entries {
            if entry.inner_name == 0 {
                continue;
            }
            let original = self.original_class(entry.inner_class)?;
            let Some(mapped) = self.table.lookup(&Symbol::type_name(original)) else {
                continue;
            };
            let simple = mapped
                .name()
                .rsplit(|ch: char| ch == '/' || ch == '$')
                .next()
                .unwrap_or(mapped.name());
            entry.inner_name = interner.utf8(pool, simple)?;
        }

        let mut out = Vec::with_capacity(data.len());
        out.put_u2(entries.len() as u16);
        for entry in entries {
            out.put_u2(entry.inner_class);
            out.put_u2(entry.outer_class);
            out.put_u2(entry.inner_name);
            out.put_u2(entry.access);
        }
        Ok(out)
    }

    fn enclosing_method(
        &self,
        pool: &mut ConstantPool,
        interner: &mut PoolInterner,
        data: &[u8],
    ) -> Result<Vec<u8>, ClassParseError> {
        let mut reader = ClassReader::new(data);
        let class_index = reader.read_u2()?;
        let method_index = reader.read_u2()?;
        if !reader.is_empty() {
            return Err(invalid("EnclosingMethod"));
        }
        let method_index = if method_index == 0 {
            0
        } else {
            self.member_reference(
                pool,
                interner,
                ReferenceKind::Method,
                class_index,
                method_index,
            )?
        };

        let mut out = Vec::with_capacity(4);
        out.put_u2(class_index);
        out.put_u2(method_index);
        Ok(out)
    }
}

fn invalid(name: &str) -> ClassParseError {
    ClassParseError::InvalidAttribute {
        name: name.to_string(),
    }
}
