pub mod interaction;
pub mod item;
pub mod navigation;
pub mod recommendation;
