pub mod driver;
pub mod plotter;
pub mod recorder;
pub mod response;
