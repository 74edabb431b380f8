//! Input types: raw frames, binary images and the report that carries them.
//!
//! These mirror the JSON shape error-tracking SDKs send, so every optional
//! field defaults when it is absent.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::utils::{parse_opt_addr, AddrError};

/// One line of source context around a frame: `[line number, text]`.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct ContextLine(pub u32, pub String);

/// A single stack frame as reported by the instrumented program.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct RawFrame {
    pub line_no: Option<u32>,
    pub col_no: Option<u32>,
    pub instruction_addr: Option<String>,
    pub symbol_addr: Option<String>,
    pub package: Option<String>,
    pub module: Option<String>,
    pub function: Option<String>,
    pub raw_function: Option<String>,
    pub filename: Option<String>,
    pub abs_path: Option<String>,
    pub in_app: bool,
    pub trust: Option<String>,
    pub context: Vec<ContextLine>,
}

impl RawFrame {
    /// Two frames are repeats of each other when they point at the same code
    /// location: line, address, package, module and function all match.
    pub fn is_repeat_of(&self, other: &RawFrame) -> bool {
        self.line_no == other.line_no
            && self.instruction_addr == other.instruction_addr
            && self.package == other.package
            && self.module == other.module
            && self.function == other.function
    }

    pub fn instruction_addr(&self) -> Result<u64, AddrError> {
        parse_opt_addr(self.instruction_addr.as_deref())
    }

    /// Basename of the package path, `/usr/lib/libc.so.6` -> `libc.so.6`.
    pub fn package_name(&self) -> Option<&str> {
        self.package.as_deref().map(basename)
    }
}

/// A loaded executable or library with a known address range.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct BinaryImage {
    pub image_addr: Option<String>,
    pub image_size: Option<u64>,
    pub image_end_addr: Option<String>,
    pub code_file: Option<String>,
    pub debug_id: Option<String>,
    pub arch: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl BinaryImage {
    pub fn start_addr(&self) -> Result<u64, AddrError> {
        parse_opt_addr(self.image_addr.as_deref())
    }

    /// Exclusive end of the image. An explicit end address wins over
    /// start + size.
    pub fn end_addr(&self) -> Result<u64, AddrError> {
        if self.image_end_addr.is_some() {
            return parse_opt_addr(self.image_end_addr.as_deref());
        }
        let size = self.image_size.ok_or(AddrError::Missing)?;
        let start = self.start_addr()?;
        start
            .checked_add(size)
            .ok_or_else(|| AddrError::Overflow(format!("{start:#x}+{size:#x}")))
    }

    /// `[start, end)` of the image, if both ends parse.
    pub fn range(&self) -> Result<(u64, u64), AddrError> {
        Ok((self.start_addr()?, self.end_addr()?))
    }

    pub fn name(&self) -> Option<&str> {
        self.code_file.as_deref().map(basename)
    }
}

/// A captured call stack, stored oldest call first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct StackTrace {
    pub frames: Vec<RawFrame>,
    pub registers: Option<BTreeMap<String, String>>,
    /// Inclusive `[first, last]` index range of frames that were dropped
    /// before the trace was sent.
    pub frames_omitted: Option<(usize, usize)>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct DebugMeta {
    pub images: Vec<BinaryImage>,
}

/// The subset of an error report the formatter needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct EventReport {
    pub platform: Option<String>,
    pub stacktrace: StackTrace,
    pub debug_meta: DebugMeta,
}

fn basename(path: &str) -> &str {
    // Windows paths show up in reports from any host, so split on both.
    let tail = path.rsplit(['/', '\\']).next().unwrap_or(path);
    if tail.is_empty() {
        Path::new(path)
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(path)
    } else {
        tail
    }
}
