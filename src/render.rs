pub mod pdf;
pub mod raster;
