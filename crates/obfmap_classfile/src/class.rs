use crate::error::ClassParseError;
use crate::pool::{Constant, ConstantPool};
use crate::reader::{ClassReader, ClassWrite};

/// Raw attribute: name index plus the undecoded payload.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInfo {
    pub name_index: u16,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberInfo {
    pub access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<AttributeInfo>,
}

/// Kind of a member reference constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Field,
    Method,
    InterfaceMethod,
}

/// A resolved field or method reference from the constant pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberReference {
    pub kind: ReferenceKind,
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

/// A class file decoded down to its constant pool, member tables and raw
/// attributes. Bytecode is never interpreted.
#[derive(Debug, Clone)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub pool: ConstantPool,
    pub access_flags: u16,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<MemberInfo>,
    pub methods: Vec<MemberInfo>,
    pub attributes: Vec<AttributeInfo>,
}

impl ClassFile {
    pub fn parse(bytes: &[u8]) -> Result<Self, ClassParseError> {
        let mut reader = ClassReader::new(bytes);
        reader.expect_magic()?;
        let minor_version = reader.read_u2()?;
        let major_version = reader.read_u2()?;
        let pool = ConstantPool::parse(&mut reader)?;

        let access_flags = reader.read_u2()?;
        let this_class = reader.read_u2()?;
        let super_class = reader.read_u2()?;

        let interfaces_count = reader.read_u2()?;
        let mut interfaces = Vec::with_capacity(interfaces_count as usize);
        for _ in 0..interfaces_count {
            interfaces.push(reader.read_u2()?);
        }

        let fields = read_members(&mut reader)?;
        let methods = read_members(&mut reader)?;
        let attributes = read_attributes(&mut reader)?;

        Ok(Self {
            minor_version,
            major_version,
            pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    /// Fails when a constant pool string no longer fits its length field.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ClassParseError> {
        let mut out = Vec::new();
        out.put_u4(0xCAFEBABE);
        out.put_u2(self.minor_version);
        out.put_u2(self.major_version);
        self.pool.write(&mut out)?;
        out.put_u2(self.access_flags);
        out.put_u2(self.this_class);
        out.put_u2(self.super_class);
        out.put_u2(self.interfaces.len() as u16);
        for interface in &self.interfaces {
            out.put_u2(*interface);
        }
        write_members(&mut out, &self.fields);
        write_members(&mut out, &self.methods);
        write_attributes(&mut out, &self.attributes);
        Ok(out)
    }

    /// Internal name of the class, e.g. `com/example/Test`.
    pub fn name(&self) -> Result<&str, ClassParseError> {
        self.pool.class_name(self.this_class)
    }

    /// Superclass name; `None` only for `java/lang/Object` and module-info.
    pub fn super_name(&self) -> Result<Option<&str>, ClassParseError> {
        if self.super_class == 0 {
            return Ok(None);
        }
        self.pool.class_name(self.super_class).map(Some)
    }

    pub fn attribute_name(&self, attribute: &AttributeInfo) -> Result<&str, ClassParseError> {
        self.pool.utf8(attribute.name_index)
    }

    pub fn find_attribute(&self, name: &str) -> Option<&AttributeInfo> {
        self.attributes
            .iter()
            .find(|attribute| self.pool.utf8(attribute.name_index).ok() == Some(name))
    }

    /// Every field, method and interface-method reference in the pool.
    pub fn member_references(&self) -> Result<Vec<MemberReference>, ClassParseError> {
        let mut references = Vec::new();
        for (_, entry) in self.pool.iter() {
            let (kind, class_index, name_and_type_index) = match entry {
                Constant::FieldRef {
                    class_index,
                    name_and_type_index,
                } => (ReferenceKind::Field, *class_index, *name_and_type_index),
                Constant::MethodRef {
                    class_index,
                    name_and_type_index,
                } => (ReferenceKind::Method, *class_index, *name_and_type_index),
                Constant::InterfaceMethodRef {
                    class_index,
                    name_and_type_index,
                } => (
                    ReferenceKind::InterfaceMethod,
                    *class_index,
                    *name_and_type_index,
                ),
                _ => continue,
            };
            let (name, descriptor) = self.pool.name_and_type(name_and_type_index)?;
            references.push(MemberReference {
                kind,
                owner: self.pool.class_name(class_index)?.to_string(),
                name: name.to_string(),
                descriptor: descriptor.to_string(),
            });
        }
        Ok(references)
    }
}

fn read_members(reader: &mut ClassReader<'_>) -> Result<Vec<MemberInfo>, ClassParseError> {
    let count = reader.read_u2()?;
    let mut members = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let access_flags = reader.read_u2()?;
        let name_index = reader.read_u2()?;
        let descriptor_index = reader.read_u2()?;
        let attributes = read_attributes(reader)?;
        members.push(MemberInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        });
    }
    Ok(members)
}

pub(crate) fn read_attributes(
    reader: &mut ClassReader<'_>,
) -> Result<Vec<AttributeInfo>, ClassParseError> {
    let count = reader.read_u2()?;
    let mut attributes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name_index = reader.read_u2()?;
        let length = reader.read_u4()? as usize;
        let data = reader.read_slice(length)?.to_vec();
        attributes.push(AttributeInfo { name_index, data });
    }
    Ok(attributes)
}

fn write_members(out: &mut Vec<u8>, members: &[MemberInfo]) {
    out.put_u2(members.len() as u16);
    for member in members {
        out.put_u2(member.access_flags);
        out.put_u2(member.name_index);
        out.put_u2(member.descriptor_index);
        write_attributes(out, &member.attributes);
    }
}

pub(crate) fn write_attributes(out: &mut Vec<u8>, attributes: &[AttributeInfo]) {
    out.put_u2(attributes.len() as u16);
    for attribute in attributes {
        out.put_u2(attribute.name_index);
        out.put_u4(attribute.data.len() as u32);
        out.extend_from_slice(&attribute.data);
    }
}
