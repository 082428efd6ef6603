//! The bytecode container and its on-disk encoding.
//!
//! A container file is a 4-byte little-endian header length, a bincode
//! encoded [`ContainerHeader`] (magic bytes, format version, producer version
//! and a checksum over the payload), followed by the bincode encoded
//! [`Container`] payload.

use std::path::{Path, PathBuf};

use dexon_common::ContentHash;
use serde::{Deserialize, Serialize};

use crate::body::MethodBody;
use crate::error::DexError;
use crate::prototype::Prototype;
use crate::types::{ClassRef, TypeRef};

/// Magic bytes identifying a dexon container file.
const CONTAINER_MAGIC: [u8; 4] = *b"DXON";

/// Current container format version. Increment on breaking changes to
/// the header or payload format.
const CONTAINER_FORMAT_VERSION: u32 = 1;

/// Header prepended to every container file for validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerHeader {
    /// Magic bytes: must be `b"DXON"`.
    pub magic: [u8; 4],

    /// Container format version.
    pub format_version: u32,

    /// Version of the compiler that produced the container.
    pub producer_version: String,

    /// Content hash of the payload data (for integrity checks).
    pub checksum: ContentHash,
}

/// A field declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name.
    pub name: String,
    /// Field type.
    pub field_type: TypeRef,
    /// Access flags.
    pub access_flags: u32,
}

/// A method declaration with its optional body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDef {
    /// Method name.
    pub name: String,
    /// Method prototype.
    pub prototype: Prototype,
    /// Access flags.
    pub access_flags: u32,
    /// The body, absent for abstract and native methods.
    pub body: Option<MethodBody>,
}

/// A class declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDef {
    /// The class itself.
    pub class: ClassRef,
    /// Superclass, absent only for the root class.
    pub superclass: Option<ClassRef>,
    /// Implemented interfaces.
    pub interfaces: Vec<ClassRef>,
    /// Access flags.
    pub access_flags: u32,
    /// Name of the source file the class was compiled from.
    pub source_file: Option<String>,
    /// Declared fields.
    pub fields: Vec<FieldDef>,
    /// Declared methods.
    pub methods: Vec<MethodDef>,
}

impl ClassDef {
    /// Creates an empty class declaration.
    pub fn new(class: ClassRef) -> Self {
        Self {
            class,
            superclass: None,
            interfaces: Vec::new(),
            access_flags: 0,
            source_file: None,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }
}

/// A bytecode container: the unit the compiler emits and the target runtime
/// loads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    /// All classes in the container.
    pub classes: Vec<ClassDef>,
}

impl Container {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes the container to `path` with a validated header.
    pub fn write(&self, path: &Path, producer_version: &str) -> Result<(), DexError> {
        let payload = bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| DexError::Serialization {
                reason: e.to_string(),
            })?;

        let header = ContainerHeader {
            magic: CONTAINER_MAGIC,
            format_version: CONTAINER_FORMAT_VERSION,
            producer_version: producer_version.to_string(),
            checksum: ContentHash::from_bytes(&payload),
        };
        let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
            .map_err(|e| DexError::Serialization {
                reason: e.to_string(),
            })?;

        // Write: 4-byte header length (little-endian) + header + payload
        let header_len = header_bytes.len() as u32;
        let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
        output.extend_from_slice(&header_len.to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(&payload);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DexError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(path, &output).map_err(|e| DexError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Reads a container from `path`, validating its header and checksum.
    pub fn read(path: &Path) -> Result<Self, DexError> {
        let raw = std::fs::read(path).map_err(|e| DexError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_file_bytes(path, &raw)
    }

    fn from_file_bytes(path: &Path, raw: &[u8]) -> Result<Self, DexError> {
        let invalid = |reason: &str| DexError::InvalidHeader {
            path: PathBuf::from(path),
            reason: reason.to_string(),
        };

        if raw.len() < 4 {
            return Err(invalid("file too short for header length"));
        }
        let header_len = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize;
        let header_end = match header_len.checked_add(4) {
            Some(end) if end <= raw.len() => end,
            _ => return Err(invalid("truncated header")),
        };

        let (header, _): (ContainerHeader, usize) =
            bincode::serde::decode_from_slice(&raw[4..header_end], bincode::config::standard())
                .map_err(|e| invalid(&e.to_string()))?;

        if header.magic != CONTAINER_MAGIC {
            return Err(invalid("missing magic bytes"));
        }
        if header.format_version != CONTAINER_FORMAT_VERSION {
            return Err(DexError::VersionMismatch {
                path: path.to_path_buf(),
                expected: CONTAINER_FORMAT_VERSION,
                actual: header.format_version,
            });
        }

        let payload = &raw[header_end..];
        let actual = ContentHash::from_bytes(payload);
        if actual != header.checksum {
            return Err(DexError::ChecksumMismatch {
                path: path.to_path_buf(),
                expected: header.checksum.to_string(),
                actual: actual.to_string(),
            });
        }

        let (container, _): (Container, usize) =
            bincode::serde::decode_from_slice(payload, bincode::config::standard()).map_err(
                |e| DexError::Serialization {
                    reason: e.to_string(),
                },
            )?;
        Ok(container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{Instruction, Opcode, Operand};
    use crate::reference::FieldRef;
    use crate::types::PrimitiveType;

    fn sample() -> Container {
        let foo = ClassRef::new("Lcom/x/Foo;");
        let mut class = ClassDef::new(foo.clone());
        class.source_file = Some("Foo.cs".to_string());
        class.fields.push(FieldDef {
            name: "count".to_string(),
            field_type: PrimitiveType::Int.into(),
            access_flags: 0,
        });
        class.methods.push(MethodDef {
            name: "bar".to_string(),
            prototype: Prototype::new(PrimitiveType::Void, vec![]),
            access_flags: 0x1,
            body: Some(MethodBody::new(
                1,
                vec![
                    Instruction::new(
                        Opcode::Iget,
                        vec![0, 0],
                        Operand::Field(FieldRef::new(foo, "count", PrimitiveType::Int)),
                    ),
                    Instruction::new(Opcode::ReturnVoid, vec![], Operand::None),
                ],
            )),
        });
        Container {
            classes: vec![class],
        }
    }

    fn write_raw(path: &Path, header: &ContainerHeader, payload: &[u8]) {
        let header_bytes =
            bincode::serde::encode_to_vec(header, bincode::config::standard()).unwrap();
        let mut output = Vec::new();
        output.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(payload);
        std::fs::write(path, output).unwrap();
    }

    #[test]
    fn write_and_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classes.dex");
        let container = sample();
        container.write(&path, "0.1.0").unwrap();

        let back = Container::read(&path).unwrap();
        assert_eq!(back, container);
        assert_eq!(back.classes[0].source_file.as_deref(), Some("Foo.cs"));
    }

    #[test]
    fn write_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("obj").join("cache").join("classes.dex");
        Container::new().write(&path, "0.1.0").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn read_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Container::read(&dir.path().join("classes.dex")).unwrap_err();
        assert!(matches!(err, DexError::Io { .. }));
    }

    #[test]
    fn read_garbage_is_invalid_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classes.dex");
        std::fs::write(&path, b"ga").unwrap();
        assert!(matches!(Container::read(&path), Err(DexError::InvalidHeader { .. })));
    }

    #[test]
    fn read_wrong_magic_is_invalid_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classes.dex");
        let header = ContainerHeader {
            magic: *b"BAAD",
            format_version: CONTAINER_FORMAT_VERSION,
            producer_version: "0.1.0".to_string(),
            checksum: ContentHash::from_bytes(b"data"),
        };
        write_raw(&path, &header, b"data");
        assert!(matches!(Container::read(&path), Err(DexError::InvalidHeader { .. })));
    }

    #[test]
    fn read_wrong_version_is_version_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classes.dex");
        let header = ContainerHeader {
            magic: CONTAINER_MAGIC,
            format_version: 999,
            producer_version: "0.1.0".to_string(),
            checksum: ContentHash::from_bytes(b"data"),
        };
        write_raw(&path, &header, b"data");
        match Container::read(&path) {
            Err(DexError::VersionMismatch { expected, actual, .. }) => {
                assert_eq!(expected, CONTAINER_FORMAT_VERSION);
                assert_eq!(actual, 999);
            }
            other => panic!("expected version mismatch, got {other:?}"),
        }
    }

    #[test]
    fn read_corrupt_payload_is_checksum_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classes.dex");
        sample().write(&path, "0.1.0").unwrap();

        let mut raw = std::fs::read(&path).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xff;
        std::fs::write(&path, raw).unwrap();

        assert!(matches!(Container::read(&path), Err(DexError::ChecksumMismatch { .. })));
    }

    #[test]
    fn oversized_header_length_is_invalid_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classes.dex");
        let mut raw = u32::MAX.to_le_bytes().to_vec();
        raw.extend_from_slice(b"payload");
        std::fs::write(&path, raw).unwrap();

        match Container::read(&path) {
            Err(DexError::InvalidHeader { reason, .. }) => assert_eq!(reason, "truncated header"),
            other => panic!("expected invalid header, got {other:?}"),
        }
    }
}
