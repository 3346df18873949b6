// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Result rendering — draws recognised block outlines over a copy of the
// upright image, or hands back the recognised text.

use image::{DynamicImage, Rgba};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use snapfind_core::config::AppConfig;
use snapfind_core::types::{BoundingBox, Granularity, RecognitionResult, RecognizedBlock, SearchFilter};
use tracing::{debug, instrument};

/// Turns a [`RecognitionResult`] into something a screen can show.
#[derive(Debug, Clone, Copy)]
pub struct ResultRenderer {
    color: Rgba<u8>,
    granularity: Granularity,
}

impl Default for ResultRenderer {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl ResultRenderer {
    pub fn new(color: [u8; 4], granularity: Granularity) -> Self {
        Self {
            color: Rgba(color),
            granularity,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.overlay_color, config.overlay_granularity)
    }

    /// Blocks the overlay would outline for `filter`.
    ///
    /// Uses the configured granularity; an engine that reports nothing at
    /// that level has all of its blocks considered instead.
    pub fn matching_blocks<'a>(
        &self,
        result: &'a RecognitionResult,
        filter: &'a SearchFilter,
    ) -> Vec<&'a RecognizedBlock> {
        let mut candidates: Vec<&RecognizedBlock> = result.blocks_of(self.granularity).collect();
        if candidates.is_empty() {
            candidates = result.blocks.iter().collect();
        }
        candidates.retain(|block| filter.matches(&block.text));
        candidates
    }

    pub fn count_matches(&self, result: &RecognitionResult, filter: &SearchFilter) -> usize {
        self.matching_blocks(result, filter).len()
    }

    /// Copy of `base` with a one-pixel outline around every matching block.
    ///
    /// Boxes are mapped from the recognition coordinate space onto `base`.
    /// With nothing to draw the copy is pixel-identical to `base`.
    #[instrument(skip_all, fields(query = filter.query(), blocks = result.blocks.len()))]
    pub fn render_boxes(
        &self,
        base: &DynamicImage,
        result: &RecognitionResult,
        filter: &SearchFilter,
    ) -> DynamicImage {
        let blocks = self.matching_blocks(result, filter);
        if blocks.is_empty() || result.source_width == 0 || result.source_height == 0 {
            debug!("Nothing to outline");
            return base.clone();
        }

        let sx = base.width() as f32 / result.source_width as f32;
        let sy = base.height() as f32 / result.source_height as f32;

        let mut canvas = base.to_rgba8();
        for block in &blocks {
            if let Some(rect) = to_rect(block.bounds.scaled(sx, sy)) {
                draw_hollow_rect_mut(&mut canvas, rect, self.color);
            }
        }
        debug!(drawn = blocks.len(), "Overlay rendered");
        DynamicImage::ImageRgba8(canvas)
    }

    /// The recognised text, verbatim.
    pub fn render_text<'a>(&self, result: &'a RecognitionResult) -> &'a str {
        &result.text
    }
}

fn to_rect(bounds: BoundingBox) -> Option<Rect> {
    if bounds.is_empty() {
        return None;
    }
    let width = bounds.width.round().max(1.0) as u32;
    let height = bounds.height.round().max(1.0) as u32;
    Some(Rect::at(bounds.left.round() as i32, bounds.top.round() as i32).of_size(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use snapfind_core::types::ImageId;

    const RED: [u8; 4] = [255, 0, 0, 255];

    fn block(text: &str, left: f32, top: f32, width: f32, height: f32) -> RecognizedBlock {
        RecognizedBlock {
            bounds: BoundingBox::new(left, top, width, height),
            granularity: Granularity::Word,
            text: text.into(),
        }
    }

    fn result_with(blocks: Vec<RecognizedBlock>, w: u32, h: u32) -> RecognitionResult {
        RecognitionResult {
            image_id: ImageId::new(),
            text: blocks.iter().map(|b| b.text.as_str()).collect::<Vec<_>>().join(" "),
            blocks,
            source_width: w,
            source_height: h,
        }
    }

    fn gray_base() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(40, 20, Luma([200u8])))
    }

    #[test]
    fn empty_result_returns_identical_image() {
        let base = gray_base();
        let renderer = ResultRenderer::new(RED, Granularity::Word);
        let result = RecognitionResult::empty(ImageId::new(), 40, 20);
        let out = renderer.render_boxes(&base, &result, &SearchFilter::default());
        assert_eq!(out, base);
    }

    #[test]
    fn no_matches_returns_identical_image() {
        let base = gray_base();
        let renderer = ResultRenderer::new(RED, Granularity::Word);
        let result = result_with(vec![block("invoice", 2.0, 2.0, 10.0, 5.0)], 40, 20);
        let out = renderer.render_boxes(&base, &result, &SearchFilter::new("receipt"));
        assert_eq!(out, base);
    }

    #[test]
    fn filter_limits_outlines() {
        let base = gray_base();
        let renderer = ResultRenderer::new(RED, Granularity::Word);
        let result = result_with(
            vec![
                block("Total", 2.0, 2.0, 10.0, 5.0),
                block("date", 20.0, 10.0, 10.0, 5.0),
            ],
            40,
            20,
        );
        let out = renderer
            .render_boxes(&base, &result, &SearchFilter::new("TOTAL"))
            .to_rgba8();

        assert_eq!(out.get_pixel(2, 2).0, RED);
        assert_ne!(out.get_pixel(20, 10).0, RED);
        assert_eq!(renderer.count_matches(&result, &SearchFilter::new("total")), 1);
        assert_eq!(renderer.count_matches(&result, &SearchFilter::default()), 2);
    }

    #[test]
    fn boxes_scale_onto_larger_base() {
        let base = DynamicImage::ImageLuma8(GrayImage::from_pixel(80, 40, Luma([200u8])));
        let renderer = ResultRenderer::new(RED, Granularity::Word);
        // Recognised at half resolution.
        let result = result_with(vec![block("word", 5.0, 5.0, 10.0, 5.0)], 40, 20);
        let out = renderer
            .render_boxes(&base, &result, &SearchFilter::default())
            .to_rgba8();

        assert_eq!(out.get_pixel(10, 10).0, RED);
        assert_eq!(out.get_pixel(29, 19).0, RED);
        assert_ne!(out.get_pixel(5, 5).0, RED);
    }

    #[test]
    fn inputs_are_untouched() {
        let base = gray_base();
        let snapshot = base.clone();
        let renderer = ResultRenderer::new(RED, Granularity::Word);
        let result = result_with(vec![block("x", 0.0, 0.0, 40.0, 20.0)], 40, 20);
        let before = result.clone();
        let _ = renderer.render_boxes(&base, &result, &SearchFilter::default());
        assert_eq!(base, snapshot);
        assert_eq!(result, before);
    }

    #[test]
    fn falls_back_to_available_granularity() {
        let renderer = ResultRenderer::new(RED, Granularity::Symbol);
        let result = result_with(vec![block("word", 0.0, 0.0, 4.0, 4.0)], 10, 10);
        assert_eq!(renderer.matching_blocks(&result, &SearchFilter::default()).len(), 1);
    }

    #[test]
    fn text_is_verbatim() {
        let renderer = ResultRenderer::default();
        let mut result = RecognitionResult::empty(ImageId::new(), 1, 1);
        result.text = "  Line one\nLine two  ".into();
        assert_eq!(renderer.render_text(&result), "  Line one\nLine two  ");
    }
}
