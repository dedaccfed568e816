//! Scripted collaborators shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use anpr_rs::prelude::*;
use image::{DynamicImage, GrayImage};

/// Region tagged by its `x1`, which the cropper turns into the crop width.
pub fn region(tag: i32, confidence: f64) -> Region {
    Region::new(BoundingBox::new(tag, 0, tag + 50, 20), confidence)
}

/// Region whose crop comes back empty.
pub fn empty_region(tag: i32) -> Region {
    Region::new(BoundingBox::new(tag, 0, tag, 20), 0.9)
}

pub struct ScriptedDetector {
    pub regions: Result<Vec<Region>, String>,
}

impl RegionDetector for ScriptedDetector {
    fn detect(&self, _image: &DynamicImage) -> Result<Vec<Region>, VisionError> {
        self.regions.clone().map_err(VisionError::EngineError)
    }
}

/// Negative tags fail, zero-width boxes are empty, everything else yields a
/// `(tag + 1) x 1` crop.
pub struct TaggingCropper;

impl PlateCropper for TaggingCropper {
    fn crop(&self, _image: &DynamicImage, bbox: &BoundingBox) -> Result<Option<GrayImage>, VisionError> {
        if bbox.x1 < 0 {
            return Err(VisionError::InvalidInput("crop outside image".into()));
        }
        if bbox.width() <= 0 {
            return Ok(None);
        }
        Ok(Some(GrayImage::new(bbox.x1 as u32 + 1, 1)))
    }
}

#[derive(Clone)]
pub enum Reading {
    Fragments(Vec<TextFragment>),
    Fail,
}

impl Reading {
    pub fn text(text: &str) -> Self {
        Reading::Fragments(vec![TextFragment::new(text, 0.9)])
    }

    pub fn nothing() -> Self {
        Reading::Fragments(Vec::new())
    }
}

/// Answers by crop width, i.e. by region tag.
#[derive(Default)]
pub struct ScriptedReader {
    pub by_tag: HashMap<u32, Reading>,
}

impl ScriptedReader {
    pub fn with(mut self, tag: u32, reading: Reading) -> Self {
        self.by_tag.insert(tag, reading);
        self
    }
}

impl TextReader for ScriptedReader {
    fn read_fragments(&self, crop: &GrayImage) -> Result<Vec<TextFragment>, VisionError> {
        let tag = crop.width() - 1;
        match self.by_tag.get(&tag) {
            Some(Reading::Fragments(fragments)) => Ok(fragments.clone()),
            Some(Reading::Fail) => Err(VisionError::EngineError("reader crashed".into())),
            None => Ok(Vec::new()),
        }
    }
}

pub fn pipeline(regions: Vec<Region>, reader: ScriptedReader, debug: bool) -> AnprPipeline {
    AnprPipeline::new(
        Arc::new(ScriptedDetector { regions: Ok(regions) }),
        Arc::new(TaggingCropper),
        Arc::new(reader),
        PipelineOptions { debug: Some(debug) },
    )
}

pub fn blank_image() -> DynamicImage {
    DynamicImage::new_rgb8(64, 32)
}
