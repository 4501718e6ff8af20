pub mod collision;
pub mod knockback;
pub mod physics;
