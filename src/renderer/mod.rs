//! GPU helpers shared by the occlusion passes.

pub mod readback;
