pub mod catalog;
pub mod core;
pub mod entries;
pub mod roster;
pub mod scope;
pub mod submit;
