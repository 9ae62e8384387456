pub mod models {
    pub mod geometry;
    pub mod wmo_placement;
}
