pub mod commands;
pub mod constants;
pub mod entity;
pub mod fields;
pub mod game_loop;
pub mod object;
pub mod performance;
pub mod spatial;
pub mod systems;
pub mod world;
