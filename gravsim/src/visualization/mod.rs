pub mod field_grid;
