//! The `QMOD` module image format.
//!
//! Both emitted programs and reference libraries are module images:
//!
//! ```text
//! +--------+-----------+------------------------------+
//! | "QMOD" | u16 (LE)  | bincode(ModuleImage)         |
//! | magic  | version   | payload                      |
//! +--------+-----------+------------------------------+
//! ```
//!
//! Programs publish types; libraries publish constants. The emitter inlines
//! library constants into the program, so a loaded program never needs its
//! references at run time.

use serde::{Deserialize, Serialize};

use crate::{BinaryModule, Value};

/// Leading bytes of every module image.
pub const MAGIC: [u8; 4] = *b"QMOD";

/// Current image format version.
pub const FORMAT_VERSION: u16 = 1;

const HEADER_LEN: usize = MAGIC.len() + 2;

/// Failure to encode or decode a module image.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("module image is truncated ({0} bytes)")]
    Truncated(usize),
    #[error("not a module image (bad magic)")]
    BadMagic,
    #[error("unsupported module image version {found} (expected {FORMAT_VERSION})")]
    UnsupportedVersion { found: u16 },
    #[error("module image payload is malformed: {0}")]
    Payload(#[from] bincode::Error),
}

/// A decoded module image.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleImage {
    pub name: String,
    pub types: Vec<TypeDef>,
    pub constants: Vec<ConstantDef>,
}

/// A type defined by a program image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDef {
    pub name: String,
    pub exported: bool,
    pub constructors: Vec<MethodDef>,
    pub methods: Vec<MethodDef>,
}

/// A constructor or method body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    pub arity: u8,
    pub body: Vec<Stmt>,
}

/// A named constant published by a library image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantDef {
    pub name: String,
    pub value: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stmt {
    Return(Option<Expr>),
    Fail(Expr),
    Loop(Vec<Stmt>),
    SetField { field: String, value: Expr },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expr {
    Literal(Value),
    /// Positional parameter of the enclosing method.
    Param(u8),
    /// Instance field read.
    Field(String),
    Add(Box<Expr>, Box<Expr>),
}

impl ModuleImage {
    pub fn new(name: impl Into<String>) -> Self {
        ModuleImage {
            name: name.into(),
            types: Vec::new(),
            constants: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_type(mut self, ty: TypeDef) -> Self {
        self.types.push(ty);
        self
    }

    #[must_use]
    pub fn with_constant(mut self, name: impl Into<String>, value: Value) -> Self {
        self.constants.push(ConstantDef {
            name: name.into(),
            value,
        });
        self
    }

    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.constants
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.value)
    }

    pub fn exported_types(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.iter().filter(|t| t.exported)
    }

    /// Serialize to the `QMOD` wire format.
    pub fn encode(&self) -> Result<BinaryModule, ImageError> {
        let payload = bincode::serialize(self)?;
        let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
        bytes.extend_from_slice(&MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&payload);
        Ok(BinaryModule::from(bytes))
    }

    /// Parse the `QMOD` wire format.
    pub fn decode(bytes: &[u8]) -> Result<Self, ImageError> {
        if bytes.len() < HEADER_LEN {
            return Err(ImageError::Truncated(bytes.len()));
        }
        let (magic, rest) = bytes.split_at(MAGIC.len());
        if magic != MAGIC {
            return Err(ImageError::BadMagic);
        }
        let (version, payload) = rest.split_at(2);
        let found = u16::from_le_bytes([version[0], version[1]]);
        if found != FORMAT_VERSION {
            return Err(ImageError::UnsupportedVersion { found });
        }
        Ok(bincode::deserialize(payload)?)
    }
}

impl TypeDef {
    pub fn new(name: impl Into<String>, exported: bool) -> Self {
        TypeDef {
            name: name.into(),
            exported,
            constructors: Vec::new(),
            methods: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_constructor(mut self, ctor: MethodDef) -> Self {
        self.constructors.push(ctor);
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    pub fn constructor(&self, arity: u8) -> Option<&MethodDef> {
        self.constructors.iter().find(|c| c.arity == arity)
    }

    pub fn method(&self, name: &str, arity: u8) -> Option<&MethodDef> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.arity == arity)
    }
}

impl MethodDef {
    pub fn new(name: impl Into<String>, arity: u8, body: Vec<Stmt>) -> Self {
        MethodDef {
            name: name.into(),
            arity,
            body,
        }
    }
}
