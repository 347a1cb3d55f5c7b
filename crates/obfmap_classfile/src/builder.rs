use crate::class::{AttributeInfo, ClassFile, MemberInfo};
use crate::error::ClassParseError;
use crate::pool::{Constant, ConstantPool, PoolInterner};
use crate::reader::ClassWrite;
use crate::structure::{ACC_ABSTRACT, ACC_PUBLIC, ACC_SUPER};

const JAVA_8: u16 = 52;
const RETURN: u8 = 0xB1;

struct InnerClass {
    inner: String,
    outer: Option<String>,
    simple_name: Option<String>,
    access: u16,
}

struct Reference {
    interface: bool,
    owner: String,
    name: String,
    descriptor: String,
}

/// Assembles small class files from declarations.
///
/// Non-abstract methods get a one-instruction body with a line number table,
/// so the output carries the same attribute nesting as compiler output. The
/// bodies are not meant to pass verification and bootstrap methods for
/// invokedynamic entries are not emitted.
pub struct ClassFileBuilder {
    name: String,
    super_name: Option<String>,
    interfaces: Vec<String>,
    access: u16,
    fields: Vec<(u16, String, String)>,
    methods: Vec<(u16, String, String)>,
    inner_classes: Vec<InnerClass>,
    field_refs: Vec<Reference>,
    method_refs: Vec<Reference>,
    dynamic_calls: Vec<(String, String)>,
    signature: Option<String>,
    source_file: Option<String>,
}

impl ClassFileBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            super_name: Some("java/lang/Object".to_string()),
            interfaces: Vec::new(),
            access: ACC_PUBLIC | ACC_SUPER,
            fields: Vec::new(),
            methods: Vec::new(),
            inner_classes: Vec::new(),
            field_refs: Vec::new(),
            method_refs: Vec::new(),
            dynamic_calls: Vec::new(),
            signature: None,
            source_file: None,
        }
    }

    pub fn super_class(mut self, name: Option<&str>) -> Self {
        self.super_name = name.map(str::to_string);
        self
    }

    pub fn interface(mut self, name: impl Into<String>) -> Self {
        self.interfaces.push(name.into());
        self
    }

    pub fn access(mut self, access: u16) -> Self {
        self.access = access;
        self
    }

    pub fn field(mut self, access: u16, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        self.fields.push((access, name.into(), descriptor.into()));
        self
    }

    pub fn method(mut self, access: u16, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        self.methods.push((access, name.into(), descriptor.into()));
        self
    }

    pub fn inner_class(
        mut self,
        inner: impl Into<String>,
        outer: Option<&str>,
        simple_name: Option<&str>,
        access: u16,
    ) -> Self {
        self.inner_classes.push(InnerClass {
            inner: inner.into(),
            outer: outer.map(str::to_string),
            simple_name: simple_name.map(str::to_string),
            access,
        });
        self
    }

    pub fn field_ref(
        mut self,
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        self.field_refs.push(Reference {
            interface: false,
            owner: owner.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        });
        self
    }

    pub fn method_ref(
        mut self,
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        self.method_refs.push(Reference {
            interface: false,
            owner: owner.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        });
        self
    }

    pub fn interface_method_ref(
        mut self,
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        self.method_refs.push(Reference {
            interface: true,
            owner: owner.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        });
        self
    }

    pub fn invoke_dynamic(mut self, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        self.dynamic_calls.push((name.into(), descriptor.into()));
        self
    }

    pub fn signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn source_file(mut self, name: impl Into<String>) -> Self {
        self.source_file = Some(name.into());
        self
    }

    pub fn build(self) -> Result<Vec<u8>, ClassParseError> {
        let mut pool = ConstantPool::new();
        let mut interner = PoolInterner::new(&pool);

        let this_class = interner.class(&mut pool, &self.name)?;
        let super_class = match &self.super_name {
            Some(name) => interner.class(&mut pool, name)?,
            None => 0,
        };
        let interfaces = self
            .interfaces
            .iter()
            .map(|name| interner.class(&mut pool, name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut fields = Vec::with_capacity(self.fields.len());
        for (access, name, descriptor) in &self.fields {
            fields.push(MemberInfo {
                access_flags: *access,
                name_index: interner.utf8(&mut pool, name)?,
                descriptor_index: interner.utf8(&mut pool, descriptor)?,
                attributes: Vec::new(),
            });
        }

        let mut methods = Vec::with_capacity(self.methods.len());
        for (access, name, descriptor) in &self.methods {
            let mut attributes = Vec::new();
            if access & ACC_ABSTRACT == 0 {
                attributes.push(code_attribute(&mut pool, &mut interner)?);
            }
            methods.push(MemberInfo {
                access_flags: *access,
                name_index: interner.utf8(&mut pool, name)?,
                descriptor_index: interner.utf8(&mut pool, descriptor)?,
                attributes,
            });
        }

        for reference in &self.field_refs {
            let class_index = interner.class(&mut pool, &reference.owner)?;
            let name_and_type_index =
                interner.name_and_type(&mut pool, &reference.name, &reference.descriptor)?;
            pool.push(Constant::FieldRef {
                class_index,
                name_and_type_index,
            })?;
        }
        for reference in &self.method_refs {
            let class_index = interner.class(&mut pool, &reference.owner)?;
            let name_and_type_index =
                interner.name_and_type(&mut pool, &reference.name, &reference.descriptor)?;
            pool.push(if reference.interface {
                Constant::InterfaceMethodRef {
                    class_index,
                    name_and_type_index,
                }
            } else {
                Constant::MethodRef {
                    class_index,
                    name_and_type_index,
                }
            })?;
        }
        for (bootstrap, (name, descriptor)) in self.dynamic_calls.iter().enumerate() {
            let name_and_type_index = interner.name_and_type(&mut pool, name, descriptor)?;
            pool.push(Constant::InvokeDynamic {
                bootstrap_method_attr_index: bootstrap as u16,
                name_and_type_index,
            })?;
        }

        let mut attributes = Vec::new();
        if let Some(signature) = &self.signature {
            let index = interner.utf8(&mut pool, signature)?;
            attributes.push(attribute(&mut pool, &mut interner, "Signature", |out| {
                out.put_u2(index)
            })?);
        }
        if let Some(source_file) = &self.source_file {
            let index = interner.utf8(&mut pool, source_file)?;
            attributes.push(attribute(&mut pool, &mut interner, "SourceFile", |out| {
                out.put_u2(index)
            })?);
        }
        if !self.inner_classes.is_empty() {
            let mut rows = Vec::with_capacity(self.inner_classes.len());
            for inner in &self.inner_classes {
                let inner_index = interner.class(&mut pool, &inner.inner)?;
                let outer_index = match &inner.outer {
                    Some(outer) => interner.class(&mut pool, outer)?,
                    None => 0,
                };
                let name_index = match &inner.simple_name {
                    Some(name) => interner.utf8(&mut pool, name)?,
                    None => 0,
                };
                rows.push([inner_index, outer_index, name_index, inner.access]);
            }
            attributes.push(attribute(&mut pool, &mut interner, "InnerClasses", |out| {
                out.put_u2(rows.len() as u16);
                for row in &rows {
                    for value in row {
                        out.put_u2(*value);
                    }
                }
            })?);
        }

        let class = ClassFile {
            minor_version: 0,
            major_version: JAVA_8,
            pool,
            access_flags: self.access,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        };
        class.to_bytes()
    }
}

fn attribute(
    pool: &mut ConstantPool,
    interner: &mut PoolInterner,
    name: &str,
    write: impl FnOnce(&mut Vec<u8>),
) -> Result<AttributeInfo, ClassParseError> {
    let name_index = interner.utf8(pool, name)?;
    let mut data = Vec::new();
    write(&mut data);
    Ok(AttributeInfo { name_index, data })
}

fn code_attribute(
    pool: &mut ConstantPool,
    interner: &mut PoolInterner,
) -> Result<AttributeInfo, ClassParseError> {
    let line_numbers = attribute(pool, interner, "LineNumberTable", |out| {
        out.put_u2(1);
        out.put_u2(0); // start_pc
        out.put_u2(1); // line
    })?;
    attribute(pool, interner, "Code", |out| {
        out.put_u2(1); // max_stack
        out.put_u2(8); // max_locals
        out.put_u4(1);
        out.put_u1(RETURN);
        out.put_u2(0); // exception table
        crate::class::write_attributes(out, &[line_numbers]);
    })
}
