use crate::class::ClassFile;
use crate::error::ClassParseError;
use crate::pool::Constant;
use crate::reader::ClassReader;
use std::collections::HashSet;

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_PRIVATE: u16 = 0x0002;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_FINAL: u16 = 0x0010;
pub const ACC_SUPER: u16 = 0x0020;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;
pub const ACC_SYNTHETIC: u16 = 0x1000;

pub const CONSTRUCTOR_NAME: &str = "<init>";
pub const STATIC_INITIALIZER_NAME: &str = "<clinit>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: String,
    pub descriptor: String,
    pub access: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub name: String,
    pub descriptor: String,
    pub access: u16,
}

impl MethodDecl {
    pub fn is_final(&self) -> bool {
        self.access & ACC_FINAL != 0
    }

    /// Constructors and static initializers.
    pub fn is_initializer(&self) -> bool {
        self.name == CONSTRUCTOR_NAME || self.name == STATIC_INITIALIZER_NAME
    }
}

/// Target of one invokedynamic call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DynamicCallSite {
    pub name: String,
    pub descriptor: String,
}

/// Declaration-level view of one compiled class: everything renaming needs,
/// nothing about bytecode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassStructure {
    pub name: String,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub access: u16,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
    /// Types declared inside this one, in `InnerClasses` order.
    pub nested_types: Vec<String>,
    pub dynamic_calls: Vec<DynamicCallSite>,
}

impl ClassStructure {
    pub fn is_interface(&self) -> bool {
        self.access & ACC_INTERFACE != 0
    }

    pub fn from_class_file(class: &ClassFile) -> Result<Self, ClassParseError> {
        let pool = &class.pool;
        let name = class.name()?.to_string();
        let super_name = class.super_name()?.map(str::to_string);

        let interfaces = class
            .interfaces
            .iter()
            .map(|index| pool.class_name(*index).map(str::to_string))
            .collect::<Result<Vec<_>, _>>()?;

        let fields = class
            .fields
            .iter()
            .map(|field| {
                Ok(FieldDecl {
                    name: pool.utf8(field.name_index)?.to_string(),
                    descriptor: pool.utf8(field.descriptor_index)?.to_string(),
                    access: field.access_flags,
                })
            })
            .collect::<Result<Vec<_>, ClassParseError>>()?;

        let methods = class
            .methods
            .iter()
            .map(|method| {
                Ok(MethodDecl {
                    name: pool.utf8(method.name_index)?.to_string(),
                    descriptor: pool.utf8(method.descriptor_index)?.to_string(),
                    access: method.access_flags,
                })
            })
            .collect::<Result<Vec<_>, ClassParseError>>()?;

        let nested_types = nested_types(class, &name)?;

        let mut seen = HashSet::new();
        let mut dynamic_calls = Vec::new();
        for (_, entry) in pool.iter() {
            if let Constant::InvokeDynamic {
                name_and_type_index,
                ..
            } = entry
            {
                let (call_name, descriptor) = pool.name_and_type(*name_and_type_index)?;
                let site = DynamicCallSite {
                    name: call_name.to_string(),
                    descriptor: descriptor.to_string(),
                };
                if seen.insert(site.clone()) {
                    dynamic_calls.push(site);
                }
            }
        }

        Ok(Self {
            name,
            super_name,
            interfaces,
            access: class.access_flags,
            fields,
            methods,
            nested_types,
            dynamic_calls,
        })
    }
}

/// Reads the declaration-level structure of a class file.
pub fn parse_class(bytes: &[u8]) -> Result<ClassStructure, ClassParseError> {
    let class = ClassFile::parse(bytes)?;
    ClassStructure::from_class_file(&class)
}

/// One row of an `InnerClasses` attribute.
#[derive(Debug, Clone, Copy)]
pub(crate) struct InnerClassEntry {
    pub inner_class: u16,
    pub outer_class: u16,
    pub inner_name: u16,
    pub access: u16,
}

pub(crate) fn read_inner_classes(data: &[u8]) -> Result<Vec<InnerClassEntry>, ClassParseError> {
    let mut reader = ClassReader::new(data);
    let count = reader.read_u2()?;
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        entries.push(InnerClassEntry {
            inner_class: reader.read_u2()?,
            outer_class: reader.read_u2()?,
            inner_name: reader.read_u2()?,
            access: reader.read_u2()?,
        });
    }
    if !reader.is_empty() {
        return Err(ClassParseError::InvalidAttribute {
            name: "InnerClasses".to_string(),
        });
    }
    Ok(entries)
}

/// `InnerClasses` also lists every foreign nested type the class refers to;
/// only members of this class (declared directly, or local and anonymous
/// classes carrying this class's name as prefix) count as nested here.
fn nested_types(class: &ClassFile, this_name: &str) -> Result<Vec<String>, ClassParseError> {
    let Some(attribute) = class.find_attribute("InnerClasses") else {
        return Ok(Vec::new());
    };

    let local_prefix = format!("{this_name}$");
    let mut nested = Vec::new();
    for entry in read_inner_classes(&attribute.data)? {
        let inner = class.pool.class_name(entry.inner_class)?;
        let declared_here = if entry.outer_class != 0 {
            class.pool.class_name(entry.outer_class)? == this_name
        } else {
            inner.starts_with(&local_prefix)
        };
        if declared_here && inner != this_name && !nested.iter().any(|name| name == inner) {
            nested.push(inner.to_string());
        }
    }
    Ok(nested)
}
