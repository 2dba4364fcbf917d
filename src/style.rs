//! Declarative presentation parameters
//!
//! The core never inspects pixels; these values are carried alongside a
//! loaded image and handed to an external renderer as-is.

use serde::{Deserialize, Serialize};

/// Fixed edges of a resizable-stretch image, in points
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeInsets {
    /// Fixed region at the top edge
    pub top: f32,
    /// Fixed region at the left edge
    pub left: f32,
    /// Fixed region at the bottom edge
    pub bottom: f32,
    /// Fixed region at the right edge
    pub right: f32,
}

/// Size of the busy indicator shown while a load is in flight
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndicatorStyle {
    /// Small spinner
    Small,
    /// Medium spinner
    #[default]
    Medium,
    /// Large spinner
    Large,
}

/// Presentation transforms applied by the renderer
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageStyle {
    /// Convert to grayscale
    pub gray: bool,
    /// Crop to a circle
    pub round: bool,
    /// Stretch with fixed edge insets instead of uniform scaling
    pub stretch: bool,
    /// Insets used when `stretch` is set
    pub stretch_insets: EdgeInsets,
}
