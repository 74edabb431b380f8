//! Text rendering of [`RenderEntry`] rows, plus the two display toggles a
//! viewer can flip: absolute vs. image-relative addresses and full vs.
//! abbreviated function names.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};

use crate::render::{RenderEntry, RenderFrame, RenderedTrace};
use crate::utils::{format_hex_padded, parse_addr, parse_opt_addr};

const ADDR_WIDTH: usize = 16;
const UNKNOWN_FUNCTION: &str = "<unknown>";

/// Local display state owned by whoever shows the trace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewState {
    pub absolute_addresses: bool,
    pub full_function_names: bool,
}

impl ViewState {
    pub fn toggle_addressing(&mut self) {
        self.absolute_addresses = !self.absolute_addresses;
    }

    pub fn toggle_function_names(&mut self) {
        self.full_function_names = !self.full_function_names;
    }
}

/// Platform family of the reporting SDK. Picks the icon and whether frames
/// are shown native style (package + address) or source style (file + line).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Native,
    Cocoa,
    JavaScript,
    Python,
    Java,
    CSharp,
    Go,
    Php,
    Ruby,
    Elixir,
    Other,
}

impl Platform {
    /// Map a free-form platform tag to a family. Unknown tags become
    /// [`Platform::Other`].
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "native" | "c" | "cpp" | "rust" => Self::Native,
            "cocoa" | "objc" | "swift" => Self::Cocoa,
            "javascript" | "node" | "js" => Self::JavaScript,
            "python" => Self::Python,
            "java" | "kotlin" => Self::Java,
            "csharp" | "dotnet" => Self::CSharp,
            "go" => Self::Go,
            "php" => Self::Php,
            "ruby" => Self::Ruby,
            "elixir" => Self::Elixir,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Cocoa => "cocoa",
            Self::JavaScript => "javascript",
            Self::Python => "python",
            Self::Java => "java",
            Self::CSharp => "csharp",
            Self::Go => "go",
            Self::Php => "php",
            Self::Ruby => "ruby",
            Self::Elixir => "elixir",
            Self::Other => "other",
        }
    }

    /// Name of the decorative icon shown next to the trace.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Cocoa => "apple",
            Self::JavaScript => "javascript",
            Self::Python => "python",
            Self::Java => "java",
            Self::CSharp => "csharp",
            Self::Go => "go",
            Self::Php => "php",
            Self::Ruby => "ruby",
            Self::Elixir => "elixir",
            Self::Other => "generic",
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native | Self::Cocoa)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How `stackview render` prints its result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => bail!("Invalid output format: {s}. Must be one of: text, json"),
        }
    }
}

/// Strip template arguments and the trailing parameter list from a
/// demangled name: `ns::Foo<int>::bar(char const*)` -> `ns::Foo::bar`.
///
/// Operator overloads are left alone since their `<`/`(` are part of the
/// name.
pub fn abbreviate_function(name: &str) -> String {
    if is_operator(name) {
        return name.to_string();
    }

    let mut out = String::with_capacity(name.len());
    let mut angle = 0usize;
    let mut paren = 0usize;
    for c in name.chars() {
        match c {
            '<' => angle += 1,
            '>' if angle > 0 => angle -= 1,
            '(' if angle == 0 => paren += 1,
            ')' if angle == 0 && paren > 0 => paren -= 1,
            _ if angle == 0 && paren == 0 => out.push(c),
            _ => {}
        }
    }

    let out = out.trim();
    if out.is_empty() {
        name.to_string()
    } else {
        out.to_string()
    }
}

/// Whether any `::`-separated segment is an `operator` overload, e.g.
/// `Foo::operator<<` but not `cooperator::run`.
fn is_operator(name: &str) -> bool {
    name.split("::").any(|segment| {
        segment.strip_prefix("operator").is_some_and(|rest| {
            !rest
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric() || c == '_')
        })
    })
}

fn function_name(frame: &RenderFrame<'_>, view: &ViewState) -> String {
    let raw = &frame.frame;
    match (raw.function.as_deref(), raw.raw_function.as_deref()) {
        (_, Some(full)) if view.full_function_names => full.to_string(),
        (Some(name), _) if view.full_function_names => name.to_string(),
        (Some(name), _) => abbreviate_function(name),
        (None, Some(full)) => abbreviate_function(full),
        (None, None) => UNKNOWN_FUNCTION.to_string(),
    }
}

fn absolute_address(frame: &RenderFrame<'_>) -> String {
    match frame.frame.instruction_addr.as_deref() {
        Some(s) => match parse_addr(s) {
            Ok(addr) => format!("{addr:#0width$x}", width = ADDR_WIDTH + 2),
            Err(_) => format!("{s:>width$}", width = ADDR_WIDTH + 2),
        },
        None => " ".repeat(ADDR_WIDTH + 2),
    }
}

fn address_column(frame: &RenderFrame<'_>, view: &ViewState, address_width: usize) -> String {
    match frame.relative_addr {
        Some(rel) if !view.absolute_addresses => {
            let padded = format_hex_padded(rel, address_width);
            // Keep the column as wide as an absolute address so toggling does
            // not shift everything after it.
            format!("{padded:>width$}", width = ADDR_WIDTH + 2)
        }
        _ => absolute_address(frame),
    }
}

/// `+ N` offset of the instruction within its symbol, when both addresses
/// parse.
fn symbol_offset(frame: &RenderFrame<'_>) -> Option<u64> {
    let raw = &frame.frame;
    let addr = raw.instruction_addr().ok()?;
    let sym = parse_opt_addr(raw.symbol_addr.as_deref()).ok()?;
    addr.checked_sub(sym)
}

fn source_location(frame: &RenderFrame<'_>) -> Option<String> {
    let raw = &frame.frame;
    let file = raw
        .filename
        .as_deref()
        .or(raw.abs_path.as_deref())
        .or(raw.module.as_deref())?;
    Some(match (raw.line_no, raw.col_no) {
        (Some(line), Some(col)) => format!("{file}:{line}:{col}"),
        (Some(line), None) => format!("{file}:{line}"),
        (None, _) => file.to_string(),
    })
}

/// Format one frame as a single line, without registers or context.
pub fn format_frame_line(
    frame: &RenderFrame<'_>,
    platform: Platform,
    view: &ViewState,
    address_width: usize,
    package_width: usize,
) -> String {
    let marker = if frame.frame.in_app { '*' } else { ' ' };
    let function = function_name(frame, view);

    let mut line = if platform.is_native() {
        let package = frame
            .image
            .and_then(|image| image.name())
            .or(frame.frame.package_name())
            .unwrap_or("<unknown>");
        let offset = symbol_offset(frame)
            .map(|offset| format!(" + {offset}"))
            .unwrap_or_default();
        format!(
            "{marker} {package:<package_width$}  {addr}  {function}{offset}",
            addr = address_column(frame, view, address_width),
        )
    } else {
        match source_location(frame) {
            Some(location) => format!("{marker} {function} ({location})"),
            None => format!("{marker} {function}"),
        }
    };

    match frame.times_repeated {
        0 => {}
        1 => line.push_str(" (repeated 1 time)"),
        n => line.push_str(&format!(" (repeated {n} times)")),
    }
    line
}

pub fn omitted_message(first: usize, last: usize) -> String {
    format!("Frames {first} until {last} were omitted and not available.")
}

fn push_frame_details(out: &mut Vec<String>, frame: &RenderFrame<'_>) {
    if frame.is_expanded || frame.is_only_frame {
        let line_no = frame.frame.line_no;
        for ctx in &frame.frame.context {
            let cursor = if Some(ctx.0) == line_no { '>' } else { ' ' };
            out.push(format!("    {cursor}{:>5} | {}", ctx.0, ctx.1));
        }
    }

    if let Some(registers) = frame.registers {
        let name_width = registers.keys().map(String::len).max().unwrap_or(0);
        for (name, value) in registers {
            out.push(format!("      {name:>name_width$} = {value}"));
        }
    }
}

/// Lay out a whole rendered trace as text lines.
pub fn format_trace(
    rendered: &RenderedTrace<'_>,
    platform: Platform,
    view: &ViewState,
) -> Vec<String> {
    let package_width = rendered
        .frames()
        .map(|frame| {
            frame
                .image
                .and_then(|image| image.name())
                .or(frame.frame.package_name())
                .unwrap_or("<unknown>")
                .len()
        })
        .max()
        .unwrap_or(0);

    let mut out = Vec::new();
    for entry in &rendered.entries {
        match entry {
            RenderEntry::Frame(frame) => {
                out.push(format_frame_line(
                    frame,
                    platform,
                    view,
                    rendered.address_width,
                    package_width,
                ));
                push_frame_details(&mut out, frame);
            }
            RenderEntry::Omitted { first, last } => {
                out.push(format!("  {}", omitted_message(*first, *last)));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BinaryImage, ContextLine, RawFrame};

    fn render_frame<'a>(
        raw: &'a RawFrame,
        image: Option<&'a BinaryImage>,
        rel: Option<u64>,
    ) -> RenderFrame<'a> {
        RenderFrame {
            frame_idx: 0,
            frame: raw,
            times_repeated: 0,
            image,
            relative_addr: rel,
            is_expanded: false,
            is_only_frame: false,
            is_context_empty: raw.context.is_empty(),
            registers: None,
        }
    }

    #[test]
    fn test_toggles() {
        let mut view = ViewState::default();
        view.toggle_addressing();
        assert!(view.absolute_addresses);
        view.toggle_addressing();
        assert!(!view.absolute_addresses);
        view.toggle_function_names();
        assert!(view.full_function_names);
    }

    #[test]
    fn test_platform_tags() {
        assert_eq!(Platform::from_tag("cocoa"), Platform::Cocoa);
        assert_eq!(Platform::from_tag(" Native "), Platform::Native);
        assert_eq!(Platform::from_tag("brainfuck"), Platform::Other);
        assert_eq!(Platform::Cocoa.icon(), "apple");
        assert_eq!(Platform::Other.icon(), "generic");
        assert!(Platform::Native.is_native());
        assert!(!Platform::Python.is_native());
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::default().to_string(), "text");
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_abbreviate_function() {
        assert_eq!(
            abbreviate_function("ns::Foo<int, std::vector<int>>::bar(char const*) const"),
            "ns::Foo::bar const"
        );
        assert_eq!(abbreviate_function("main"), "main");
        assert_eq!(abbreviate_function("operator<<"), "operator<<");
        assert_eq!(
            abbreviate_function("std::ostream::operator<<(int)"),
            "std::ostream::operator<<(int)"
        );
        assert_eq!(abbreviate_function("cooperator::run(int)"), "cooperator::run");
        assert_eq!(abbreviate_function("ns::operators_table()"), "ns::operators_table");
        assert_eq!(abbreviate_function("<lambda>"), "<lambda>");
    }

    #[test]
    fn test_native_line_relative_and_absolute() {
        let image = BinaryImage {
            image_addr: Some("0x2000".to_string()),
            image_size: Some(0x1000),
            code_file: Some("/usr/lib/libfoo.so".to_string()),
            ..Default::default()
        };
        let raw = RawFrame {
            function: Some("foo::bar(int)".to_string()),
            instruction_addr: Some("0x2500".to_string()),
            symbol_addr: Some("0x24f0".to_string()),
            in_app: true,
            ..Default::default()
        };
        let frame = render_frame(&raw, Some(&image), Some(0x500));

        let mut view = ViewState::default();
        let line = format_frame_line(&frame, Platform::Native, &view, 4, 9);
        assert_eq!(
            line,
            format!("* libfoo.so  {:>18}  foo::bar + 16", "0x0500")
        );

        view.toggle_addressing();
        view.toggle_function_names();
        let line = format_frame_line(&frame, Platform::Native, &view, 4, 9);
        assert_eq!(line, "* libfoo.so  0x0000000000002500  foo::bar(int) + 16");
    }

    #[test]
    fn test_native_line_falls_back_to_absolute() {
        let raw = RawFrame {
            function: Some("lost".to_string()),
            instruction_addr: Some("0x9999".to_string()),
            package: Some("/lib/liblost.so".to_string()),
            ..Default::default()
        };
        let frame = render_frame(&raw, None, None);
        let line = format_frame_line(&frame, Platform::Cocoa, &ViewState::default(), 3, 0);
        assert_eq!(line, "  liblost.so  0x0000000000009999  lost");
    }

    #[test]
    fn test_source_line_with_repeats() {
        let raw = RawFrame {
            function: Some("handle".to_string()),
            filename: Some("app/views.py".to_string()),
            line_no: Some(42),
            ..Default::default()
        };
        let mut frame = render_frame(&raw, None, None);
        frame.times_repeated = 2;
        let line = format_frame_line(&frame, Platform::Python, &ViewState::default(), 0, 0);
        assert_eq!(line, "  handle (app/views.py:42) (repeated 2 times)");
    }

    #[test]
    fn test_unknown_function() {
        let raw = RawFrame::default();
        let frame = render_frame(&raw, None, None);
        let line = format_frame_line(&frame, Platform::Other, &ViewState::default(), 0, 0);
        assert_eq!(line, "  <unknown>");
    }

    #[test]
    fn test_trace_with_marker_context_and_registers() {
        let raw = RawFrame {
            function: Some("main".to_string()),
            filename: Some("main.c".to_string()),
            line_no: Some(2),
            in_app: true,
            context: vec![
                ContextLine(1, "int main() {".to_string()),
                ContextLine(2, "    abort();".to_string()),
            ],
            ..Default::default()
        };
        let mut registers = std::collections::BTreeMap::new();
        registers.insert("pc".to_string(), "0x10".to_string());
        registers.insert("rsp".to_string(), "0x20".to_string());

        let mut frame = render_frame(&raw, None, None);
        frame.is_expanded = true;
        frame.registers = Some(&registers);

        let rendered = RenderedTrace {
            entries: vec![
                RenderEntry::Omitted { first: 0, last: 1 },
                RenderEntry::Frame(frame),
            ],
            address_width: 0,
        };
        let lines = format_trace(&rendered, Platform::Other, &ViewState::default());
        assert_eq!(
            lines,
            vec![
                "  Frames 0 until 1 were omitted and not available.".to_string(),
                "* main (main.c:2)".to_string(),
                "         1 | int main() {".to_string(),
                "    >    2 |     abort();".to_string(),
                "       pc = 0x10".to_string(),
                "      rsp = 0x20".to_string(),
            ]
        );
    }
}
