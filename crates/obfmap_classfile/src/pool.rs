use crate::error::ClassParseError;
use crate::reader::{decode_modified_utf8, encode_modified_utf8, ClassReader, ClassWrite};
use std::collections::HashMap;

const MAX_POOL_ENTRIES: usize = u16::MAX as usize;

/// One constant pool entry. Operands are kept verbatim so a parsed pool can be
/// written back byte for byte.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Utf8(String),
    Integer(u32),
    Float(u32),
    Long(u64),
    Double(u64),
    Class { name_index: u16 },
    String { string_index: u16 },
    FieldRef { class_index: u16, name_and_type_index: u16 },
    MethodRef { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodRef { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { reference_kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    Module { name_index: u16 },
    Package { name_index: u16 },
    /// Index 0 and the slot following a long or double.
    Unusable,
}

impl Constant {
    fn is_wide(&self) -> bool {
        matches!(self, Constant::Long(_) | Constant::Double(_))
    }
}

#[derive(Debug, Clone)]
pub struct ConstantPool {
    entries: Vec<Constant>,
}

impl Default for ConstantPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstantPool {
    pub fn new() -> Self {
        Self {
            entries: vec![Constant::Unusable],
        }
    }

    pub(crate) fn parse(reader: &mut ClassReader<'_>) -> Result<Self, ClassParseError> {
        let count = reader.read_u2()? as usize;
        let mut entries = Vec::with_capacity(count);
        entries.push(Constant::Unusable); // index 0 unused

        while entries.len() < count {
            let tag = reader.read_u1()?;
            let entry = match tag {
                1 => {
                    let length = reader.read_u2()? as usize;
                    let bytes = reader.read_slice(length)?;
                    Constant::Utf8(decode_modified_utf8(bytes)?)
                }
                3 => Constant::Integer(reader.read_u4()?),
                4 => Constant::Float(reader.read_u4()?),
                5 => Constant::Long(reader.read_u8()?),
                6 => Constant::Double(reader.read_u8()?),
                7 => Constant::Class {
                    name_index: reader.read_u2()?,
                },
                8 => Constant::String {
                    string_index: reader.read_u2()?,
                },
                9 => Constant::FieldRef {
                    class_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                10 => Constant::MethodRef {
                    class_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                11 => Constant::InterfaceMethodRef {
                    class_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                12 => Constant::NameAndType {
                    name_index: reader.read_u2()?,
                    descriptor_index: reader.read_u2()?,
                },
                15 => Constant::MethodHandle {
                    reference_kind: reader.read_u1()?,
                    reference_index: reader.read_u2()?,
                },
                16 => Constant::MethodType {
                    descriptor_index: reader.read_u2()?,
                },
                17 => Constant::Dynamic {
                    bootstrap_method_attr_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                18 => Constant::InvokeDynamic {
                    bootstrap_method_attr_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                19 => Constant::Module {
                    name_index: reader.read_u2()?,
                },
                20 => Constant::Package {
                    name_index: reader.read_u2()?,
                },
                other => return Err(ClassParseError::UnsupportedConstant { tag: other }),
            };

            let wide = entry.is_wide();
            entries.push(entry);
            if wide {
                entries.push(Constant::Unusable);
            }
        }

        Ok(Self { entries })
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) -> Result<(), ClassParseError> {
        out.put_u2(self.entries.len() as u16);
        for entry in &self.entries {
            match entry {
                Constant::Unusable => {}
                Constant::Utf8(value) => {
                    let bytes = encode_modified_utf8(value);
                    let length = u16::try_from(bytes.len()).map_err(|_| ClassParseError::StringTooLong {
                        length: bytes.len(),
                        max: u16::MAX as usize,
                    })?;
                    out.put_u1(1);
                    out.put_u2(length);
                    out.extend_from_slice(&bytes);
                }
                Constant::Integer(value) => {
                    out.put_u1(3);
                    out.put_u4(*value);
                }
                Constant::Float(value) => {
                    out.put_u1(4);
                    out.put_u4(*value);
                }
                Constant::Long(value) => {
                    out.put_u1(5);
                    out.put_u8(*value);
                }
                Constant::Double(value) => {
                    out.put_u1(6);
                    out.put_u8(*value);
                }
                Constant::Class { name_index } => {
                    out.put_u1(7);
                    out.put_u2(*name_index);
                }
                Constant::String { string_index } => {
                    out.put_u1(8);
                    out.put_u2(*string_index);
                }
                Constant::FieldRef {
                    class_index,
                    name_and_type_index,
                } => write_pair(out, 9, *class_index, *name_and_type_index),
                Constant::MethodRef {
                    class_index,
                    name_and_type_index,
                } => write_pair(out, 10, *class_index, *name_and_type_index),
                Constant::InterfaceMethodRef {
                    class_index,
                    name_and_type_index,
                } => write_pair(out, 11, *class_index, *name_and_type_index),
                Constant::NameAndType {
                    name_index,
                    descriptor_index,
                } => write_pair(out, 12, *name_index, *descriptor_index),
                Constant::MethodHandle {
                    reference_kind,
                    reference_index,
                } => {
                    out.put_u1(15);
                    out.put_u1(*reference_kind);
                    out.put_u2(*reference_index);
                }
                Constant::MethodType { descriptor_index } => {
                    out.put_u1(16);
                    out.put_u2(*descriptor_index);
                }
                Constant::Dynamic {
                    bootstrap_method_attr_index,
                    name_and_type_index,
                } => write_pair(out, 17, *bootstrap_method_attr_index, *name_and_type_index),
                Constant::InvokeDynamic {
                    bootstrap_method_attr_index,
                    name_and_type_index,
                } => write_pair(out, 18, *bootstrap_method_attr_index, *name_and_type_index),
                Constant::Module { name_index } => {
                    out.put_u1(19);
                    out.put_u2(*name_index);
                }
                Constant::Package { name_index } => {
                    out.put_u1(20);
                    out.put_u2(*name_index);
                }
            }
        }
        Ok(())
    }

    /// Number of slots, including the unusable index 0.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    pub fn get(&self, index: u16) -> Result<&Constant, ClassParseError> {
        match self.entries.get(index as usize) {
            Some(Constant::Unusable) | None => Err(ClassParseError::InvalidConstantIndex { index }),
            Some(entry) => Ok(entry),
        }
    }

    pub(crate) fn get_mut(&mut self, index: u16) -> Result<&mut Constant, ClassParseError> {
        match self.entries.get_mut(index as usize) {
            Some(Constant::Unusable) | None => Err(ClassParseError::InvalidConstantIndex { index }),
            Some(entry) => Ok(entry),
        }
    }

    /// Iterates usable entries with their pool index.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| !matches!(entry, Constant::Unusable))
            .map(|(index, entry)| (index as u16, entry))
    }

    pub fn utf8(&self, index: u16) -> Result<&str, ClassParseError> {
        match self.get(index)? {
            Constant::Utf8(value) => Ok(value.as_str()),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }

    pub fn class_name(&self, index: u16) -> Result<&str, ClassParseError> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8(*name_index),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }

    /// `(name, descriptor)` of a NameAndType entry.
    pub fn name_and_type(&self, index: u16) -> Result<(&str, &str), ClassParseError> {
        match self.get(index)? {
            Constant::NameAndType {
                name_index,
                descriptor_index,
            } => Ok((self.utf8(*name_index)?, self.utf8(*descriptor_index)?)),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }

    /// Appends an entry and returns its index.
    pub fn push(&mut self, entry: Constant) -> Result<u16, ClassParseError> {
        let needed = if entry.is_wide() { 2 } else { 1 };
        if self.entries.len() + needed > MAX_POOL_ENTRIES {
            return Err(ClassParseError::PoolOverflow {
                max: MAX_POOL_ENTRIES,
            });
        }
        let index = self.entries.len() as u16;
        let wide = entry.is_wide();
        self.entries.push(entry);
        if wide {
            self.entries.push(Constant::Unusable);
        }
        Ok(index)
    }
}

/// Deduplicating front for appending UTF-8, Class and NameAndType entries.
pub(crate) struct PoolInterner {
    utf8: HashMap<String, u16>,
    classes: HashMap<u16, u16>,
    name_and_types: HashMap<(u16, u16), u16>,
}

impl PoolInterner {
    pub(crate) fn new(pool: &ConstantPool) -> Self {
        let mut interner = Self {
            utf8: HashMap::new(),
            classes: HashMap::new(),
            name_and_types: HashMap::new(),
        };
        for (index, entry) in pool.iter() {
            match entry {
                Constant::Utf8(value) => {
                    interner.utf8.entry(value.clone()).or_insert(index);
                }
                Constant::Class { name_index } => {
                    interner.classes.entry(*name_index).or_insert(index);
                }
                Constant::NameAndType {
                    name_index,
                    descriptor_index,
                } => {
                    interner
                        .name_and_types
                        .entry((*name_index, *descriptor_index))
                        .or_insert(index);
                }
                _ => {}
            }
        }
        interner
    }

    pub(crate) fn utf8(&mut self, pool: &mut ConstantPool, value: &str) -> Result<u16, ClassParseError> {
        if let Some(index) = self.utf8.get(value) {
            return Ok(*index);
        }
        let index = pool.push(Constant::Utf8(value.to_string()))?;
        self.utf8.insert(value.to_string(), index);
        Ok(index)
    }

    pub(crate) fn class(&mut self, pool: &mut ConstantPool, name: &str) -> Result<u16, ClassParseError> {
        let name_index = self.utf8(pool, name)?;
        if let Some(index) = self.classes.get(&name_index) {
            return Ok(*index);
        }
        let index = pool.push(Constant::Class { name_index })?;
        self.classes.insert(name_index, index);
        Ok(index)
    }

    pub(crate) fn name_and_type(
        &mut self,
        pool: &mut ConstantPool,
        name: &str,
        descriptor: &str,
    ) -> Result<u16, ClassParseError> {
        let name_index = self.utf8(pool, name)?;
        let descriptor_index = self.utf8(pool, descriptor)?;
        if let Some(index) = self.name_and_types.get(&(name_index, descriptor_index)) {
            return Ok(*index);
        }
        let index = pool.push(Constant::NameAndType {
            name_index,
            descriptor_index,
        })?;
        self.name_and_types
            .insert((name_index, descriptor_index), index);
        Ok(index)
    }
}

fn write_pair(out: &mut Vec<u8>, tag: u8, first: u16, second: u16) {
    out.put_u1(tag);
    out.put_u2(first);
    out.put_u2(second);
}
