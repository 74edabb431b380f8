//! Turn a stack trace into the ordered list of rows a viewer displays.
//!
//! Frames are walked oldest first as stored. Runs of identical frames
//! collapse into their last member, library frames are hidden unless they
//! lead into app code, and an omitted range becomes a single marker row.
//! Only the finished list is reversed for newest-first display, so none of
//! those decisions depend on display order.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::model::{BinaryImage, RawFrame, StackTrace};
use crate::symbolize::ImageResolver;

/// Display switches supplied by the hosting view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub include_system_frames: bool,
    pub expand_first_frame: bool,
    pub newest_first: bool,
}

/// One frame, annotated for display.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RenderFrame<'a> {
    /// Index of the frame in the original trace.
    pub frame_idx: usize,
    pub frame: &'a RawFrame,
    /// How many identical frames directly before this one were folded into it.
    pub times_repeated: usize,
    pub image: Option<&'a BinaryImage>,
    pub relative_addr: Option<u64>,
    pub is_expanded: bool,
    pub is_only_frame: bool,
    pub is_context_empty: bool,
    /// Only set on the chronologically last rendered frame.
    pub registers: Option<&'a BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderEntry<'a> {
    Frame(RenderFrame<'a>),
    Omitted { first: usize, last: usize },
}

impl<'a> RenderEntry<'a> {
    pub fn as_frame(&self) -> Option<&RenderFrame<'a>> {
        match self {
            RenderEntry::Frame(frame) => Some(frame),
            RenderEntry::Omitted { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RenderedTrace<'a> {
    pub entries: Vec<RenderEntry<'a>>,
    /// Hex digits of the widest relative address across the whole trace,
    /// used to right-align the address column. 0 when nothing resolved.
    pub address_width: usize,
}

impl<'a> RenderedTrace<'a> {
    pub fn frames(&self) -> impl Iterator<Item = &RenderFrame<'a>> {
        self.entries.iter().filter_map(RenderEntry::as_frame)
    }
}

/// A frame is shown when system frames are on, when it is app code, or when
/// the frame right after it is app code. The last case keeps the call into
/// user code visible.
pub fn is_frame_visible(frame: &RawFrame, next: Option<&RawFrame>, include_system: bool) -> bool {
    include_system || frame.in_app || next.is_some_and(|next| next.in_app)
}

/// Index of the frame that gets expanded by default: the last app frame, or
/// the last frame when there is no app code at all.
pub fn last_frame_idx(frames: &[RawFrame]) -> Option<usize> {
    frames
        .iter()
        .rposition(|frame| frame.in_app)
        .or_else(|| frames.len().checked_sub(1))
}

pub fn render_frames<'a>(
    trace: &'a StackTrace,
    images: &'a [BinaryImage],
    opts: &RenderOptions,
) -> RenderedTrace<'a> {
    let frames = &trace.frames;
    let resolver = ImageResolver::new(images);
    let address_width = resolver.max_relative_width(frames);

    let Some(last_idx) = last_frame_idx(frames) else {
        return RenderedTrace {
            entries: Vec::new(),
            address_width,
        };
    };

    let omitted = match trace.frames_omitted {
        Some((first, last)) if first > last => {
            debug!("Ignoring inverted omitted range {first}..{last}");
            None
        }
        other => other,
    };
    let is_omitted =
        |idx: usize| omitted.is_some_and(|(first, last)| (first..=last).contains(&idx));

    let mut entries = Vec::new();
    let mut n_repeats = 0;

    for (idx, frame) in frames.iter().enumerate() {
        if let Some((first, last)) = omitted {
            if idx == first {
                entries.push(RenderEntry::Omitted { first, last });
            }
        }
        if is_omitted(idx) {
            n_repeats = 0;
            continue;
        }

        let next = frames.get(idx + 1);

        // Repeat runs stop at the gap; visibility still looks at the raw
        // successor.
        if !is_omitted(idx + 1) && next.is_some_and(|next| frame.is_repeat_of(next)) {
            n_repeats += 1;
            continue;
        }

        if is_frame_visible(frame, next, opts.include_system_frames) {
            let resolved = resolver.resolve_frame(frame);
            entries.push(RenderEntry::Frame(RenderFrame {
                frame_idx: idx,
                frame,
                times_repeated: n_repeats,
                image: resolved.map(|r| r.image),
                relative_addr: resolved.map(|r| r.relative_addr),
                is_expanded: opts.expand_first_frame && idx == last_idx,
                is_only_frame: frames.len() == 1,
                is_context_empty: frame.context.is_empty(),
                registers: None,
            }));
        }
        n_repeats = 0;
    }

    if let Some(registers) = trace.registers.as_ref() {
        if let Some(RenderEntry::Frame(last)) = entries
            .iter_mut()
            .rev()
            .find(|entry| matches!(entry, RenderEntry::Frame(_)))
        {
            last.registers = Some(registers);
        }
    }

    if opts.newest_first {
        entries.reverse();
    }

    RenderedTrace {
        entries,
        address_width,
    }
}
