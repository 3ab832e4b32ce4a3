pub mod brightness;
pub mod cell_table;
pub mod frame;
pub mod grid;
pub mod grid_model;
pub mod motion_analyzer;
pub mod pixel;
pub mod reveal_event;
