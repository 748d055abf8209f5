//! SketchRoom Render Library
//!
//! Renderer abstraction and implementations for SketchRoom.
//! The default implementation uses Vello for GPU-accelerated rendering.

mod renderer;

#[cfg(feature = "vello-renderer")]
mod vello_impl;

pub use renderer::{DisplayList, DrawOp, RenderContext, Renderer, RendererError, StrokeStyle};

#[cfg(feature = "vello-renderer")]
pub use vello_impl::VelloRenderer;
