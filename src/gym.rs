pub mod blob;
pub mod mountain_car;

pub use blob::BlobWorld;
pub use mountain_car::MountainCar;
