use tracing::debug;

use crate::model::{BinaryImage, RawFrame};
use crate::utils::hex_width;

/// Address ranges of the images loaded when the trace was captured.
///
/// Images whose range cannot be parsed are dropped up front so lookups never
/// have to deal with them. Traces rarely carry more than a few dozen images,
/// so lookups are a linear scan.
pub struct ImageResolver<'a> {
    images: Vec<(u64, u64, &'a BinaryImage)>,
}

/// Where an instruction address landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved<'a> {
    pub image: &'a BinaryImage,
    pub relative_addr: u64,
}

impl<'a> ImageResolver<'a> {
    pub fn new(images: &'a [BinaryImage]) -> Self {
        let images = images
            .iter()
            .filter_map(|image| match image.range() {
                Ok((start, end)) if start < end => Some((start, end, image)),
                Ok((start, end)) => {
                    debug!("Skipping image with empty range {start:#x}..{end:#x}");
                    None
                }
                Err(e) => {
                    debug!(
                        "Skipping image {}: {e}",
                        image.code_file.as_deref().unwrap_or("<unnamed>")
                    );
                    None
                }
            })
            .collect();
        ImageResolver { images }
    }

    /// The image whose `[start, end)` range contains `addr`, with its start
    /// address.
    pub fn find_image(&self, addr: u64) -> Option<(u64, &'a BinaryImage)> {
        self.images
            .iter()
            .find(|(start, end, _)| *start <= addr && addr < *end)
            .map(|&(start, _, image)| (start, image))
    }

    /// Resolve a frame's instruction address. Any failure along the way
    /// (no address, bad address, no covering image) just means the frame is
    /// shown without image data.
    pub fn resolve_frame(&self, frame: &RawFrame) -> Option<Resolved<'a>> {
        let addr = match frame.instruction_addr() {
            Ok(addr) => addr,
            Err(e) => {
                debug!(
                    "Cannot resolve frame {}: {e}",
                    frame.function.as_deref().unwrap_or("<unknown>")
                );
                return None;
            }
        };

        let Some((start, image)) = self.find_image(addr) else {
            debug!("No image covers address {addr:#x}");
            return None;
        };

        Some(Resolved {
            image,
            relative_addr: addr - start,
        })
    }

    /// Widest relative address, in hex digits, across `frames`. Frames that
    /// do not resolve are left out. Returns 0 when nothing resolves.
    pub fn max_relative_width<'f, I>(&self, frames: I) -> usize
    where
        I: IntoIterator<Item = &'f RawFrame>,
    {
        frames
            .into_iter()
            .filter_map(|frame| self.resolve_frame(frame))
            .map(|resolved| hex_width(resolved.relative_addr))
            .max()
            .unwrap_or(0)
    }
}
