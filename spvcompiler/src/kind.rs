//! Shader stage selection

use crate::Error;
use std::fmt;
use std::str::FromStr;

/// Raw shader kind as it crosses the C ABI.
#[allow(non_camel_case_types)]
pub type spvc_shader_kind = std::ffi::c_int;

/// Pipeline stage a source is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ShaderKind {
    /// Vertex shader
    Vertex = 0,
    /// Fragment shader
    Fragment = 1,
}

impl ShaderKind {
    /// Returns the conventional short name (vert, frag)
    pub fn name(&self) -> &'static str {
        match self {
            ShaderKind::Vertex => "vert",
            ShaderKind::Fragment => "frag",
        }
    }

    /// Returns the raw value passed across the C ABI
    pub fn raw(&self) -> spvc_shader_kind {
        *self as spvc_shader_kind
    }

    pub(crate) fn stage(&self) -> naga::ShaderStage {
        match self {
            ShaderKind::Vertex => naga::ShaderStage::Vertex,
            ShaderKind::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl TryFrom<spvc_shader_kind> for ShaderKind {
    type Error = Error;

    fn try_from(value: spvc_shader_kind) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ShaderKind::Vertex),
            1 => Ok(ShaderKind::Fragment),
            other => Err(Error::UnknownShaderKind(other)),
        }
    }
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShaderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vert" | "vertex" => Ok(ShaderKind::Vertex),
            "frag" | "fragment" => Ok(ShaderKind::Fragment),
            other => Err(Error::UnknownShaderName(other.to_string())),
        }
    }
}
