//! The optical objects a scene is made of, and the scene file format tying them together.

mod dynamic;
mod glass;
mod path;
mod segment;
mod source;

pub use dynamic::*;
pub use glass::*;
pub use path::*;
pub use segment::*;
pub use source::*;

use nalgebra::Unit;
use prisme::*;
use prisme_json::*;
use prisme_random::*;
